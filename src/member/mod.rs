//! Member records
//!
//! The persisted entity that form steps read from and write to, along with
//! its two one-to-one sub-entities.

mod store;

pub use store::MemberStore;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Result;
use crate::kennelish::FormRecord;

/// One club member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberRecord {
    pub id: Uuid,
    pub discord_id: String,

    // Identifiers
    #[serde(default, deserialize_with = "lenient::option_i64")]
    pub ucf_id: Option<i64>,
    #[serde(default)]
    pub nid: Option<String>,
    #[serde(default)]
    pub ops_email: Option<String>,
    #[serde(default)]
    pub infra_email: Option<String>,

    #[serde(default)]
    pub minecraft: String,
    #[serde(default)]
    pub github: String,

    // PII
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub is_returning: bool,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub major: String,
    #[serde(default)]
    pub class_standing: String,
    #[serde(default)]
    pub shirt_size: String,
    #[serde(default)]
    pub did_get_shirt: bool,
    #[serde(default)]
    pub time_availability: String,
    #[serde(default, deserialize_with = "lenient::option_i64")]
    pub phone_number: Option<i64>,

    // Permissions and membership status
    #[serde(default)]
    pub sudo: bool,
    #[serde(default)]
    pub did_pay_dues: bool,
    #[serde(default, deserialize_with = "lenient::option_i64")]
    pub join_date: Option<i64>,
    #[serde(default)]
    pub mentor_name: Option<String>,
    #[serde(default)]
    pub is_full_member: bool,
    #[serde(default)]
    pub can_vote: bool,

    #[serde(default, deserialize_with = "lenient::option_i64")]
    pub experience: Option<i64>,
    #[serde(default)]
    pub curiosity: Option<String>,
    #[serde(default)]
    pub c3_interest: bool,

    #[serde(default)]
    pub attending: String,
    #[serde(default)]
    pub comments: String,

    #[serde(default)]
    pub discord: Option<DiscordProfile>,
    #[serde(default)]
    pub ethics_form: Option<EthicsForm>,
}

/// Account details reported by Discord at login
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscordProfile {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mfa: Option<bool>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    #[serde(default, deserialize_with = "lenient::option_i64")]
    pub color: Option<i64>,
    #[serde(default, deserialize_with = "lenient::option_i64")]
    pub nitro: Option<i64>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub username: String,
}

/// Answers to the ethics agreement step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EthicsForm {
    #[serde(default)]
    pub hack_others: bool,
    #[serde(default)]
    pub hack_ucf: bool,
    #[serde(default)]
    pub interrupt_ucf: bool,
    #[serde(default)]
    pub manip_traffic: bool,
    #[serde(default)]
    pub bypass_dhcp: bool,
    #[serde(default)]
    pub pirate: bool,
    #[serde(default)]
    pub host_at_ucf: bool,
    #[serde(default)]
    pub cloud_aup: bool,
    /// Unix time the agreement was signed, 0 when unsigned
    #[serde(default, deserialize_with = "lenient::i64_or_zero")]
    pub signtime: i64,
}

impl MemberRecord {
    /// Fresh record for a first login. Every other field is empty.
    pub fn new(discord_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            discord_id: discord_id.into(),
            ucf_id: None,
            nid: None,
            ops_email: None,
            infra_email: None,
            minecraft: String::new(),
            github: String::new(),
            first_name: String::new(),
            surname: String::new(),
            email: String::new(),
            is_returning: false,
            gender: String::new(),
            major: String::new(),
            class_standing: String::new(),
            shirt_size: String::new(),
            did_get_shirt: false,
            time_availability: String::new(),
            phone_number: None,
            sudo: false,
            did_pay_dues: false,
            join_date: None,
            mentor_name: None,
            is_full_member: false,
            can_vote: false,
            experience: None,
            curiosity: None,
            c3_interest: false,
            attending: String::new(),
            comments: String::new(),
            discord: None,
            ethics_form: None,
        }
    }

    /// Name shown in page chrome and session tokens.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name, self.surname);
        let full = full.trim();
        if !full.is_empty() {
            return full.to_string();
        }

        match &self.discord {
            Some(discord) if !discord.username.is_empty() => discord.username.clone(),
            _ => format!("Member #{}", self.id),
        }
    }

    /// CDN URL of the Discord avatar, if one is set.
    pub fn avatar_url(&self) -> Option<String> {
        let avatar = self.discord.as_ref()?.avatar.as_deref()?;
        Some(format!(
            "https://cdn.discordapp.com/avatars/{}/{}.png",
            self.discord_id, avatar
        ))
    }

    /// The record as the JSON value forms render against.
    pub fn to_form_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self)?)
    }
}

impl FormRecord for MemberRecord {
    fn nested_default(relation: &str) -> Option<Value> {
        match relation {
            "discord" => serde_json::to_value(DiscordProfile::default()).ok(),
            "ethics_form" => serde_json::to_value(EthicsForm::default()).ok(),
            _ => None,
        }
    }
}

/// Integer fields arrive from HTML inputs as text.
mod lenient {
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn option_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Number(n)) => n
                .as_i64()
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("{} is not an integer", n))),
            Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
            Some(Value::String(s)) => s.trim().parse().map(Some).map_err(D::Error::custom),
            Some(other) => Err(D::Error::custom(format!("expected an integer, got {}", other))),
        }
    }

    pub fn i64_or_zero<'de, D>(deserializer: D) -> Result<i64, D::Error>
    where
        D: Deserializer<'de>,
    {
        option_i64(deserializer).map(Option::unwrap_or_default)
    }
}
