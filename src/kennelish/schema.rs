//! Typed view over operator-authored schema nodes
//!
//! A form document is kept as raw JSON and each node is decoded on its own,
//! so one malformed node never poisons its siblings.

use serde::Deserialize;
use serde_json::Value;

/// Lowest value of a slider scale
pub const SLIDER_MIN: i64 = 1;
/// Highest value of a slider scale
pub const SLIDER_MAX: i64 = 5;

/// NID format: two lowercase letters followed by six digits.
pub const NID_PATTERN: &str = "^[a-z]{2}[0-9]{6}$";

const EMAIL_LOCAL_PART: &str = r"^[A-Za-z0-9._%+\-]+@";
const EMAIL_ANY_DOMAIN: &str = r"[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$";

/// Pattern for the email kind, pinned to `domain` when the node sets one.
///
/// Shared by the `pattern` attribute of the rendered input and the server
/// side validator so both sides agree.
pub fn email_pattern(domain: Option<&str>) -> String {
    match domain {
        Some(domain) => format!(
            "{}{}$",
            EMAIL_LOCAL_PART,
            regex::escape(&domain.to_lowercase())
        ),
        None => format!("{}{}", EMAIL_LOCAL_PART, EMAIL_ANY_DOMAIN),
    }
}

/// The `input` discriminator of a raw node, if it has one.
pub fn discriminator(raw: &Value) -> Option<&str> {
    raw.get("input").and_then(Value::as_str)
}

/// One form element, decoded from its `input` discriminator.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "input", rename_all = "lowercase")]
pub enum SchemaNode {
    H1(Section),
    H2(Section),
    H3(Section),
    P(Section),
    Text(FieldAttrs),
    Email(EmailField),
    Nid(FieldAttrs),
    Radio(ChoiceField),
    Checkbox(ChoiceField),
    Dropdown(DropdownField),
    Slider(SliderField),
    Signature(FieldAttrs),
    Navigation(Navigation),
}

impl SchemaNode {
    /// Decode a single raw node.
    pub fn parse(raw: &Value) -> Result<Self, serde_json::Error> {
        Self::deserialize(raw)
    }

    /// Child nodes of a section, `None` for every other kind.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::H1(s) | Self::H2(s) | Self::H3(s) | Self::P(s) => Some(&s.elements),
            _ => None,
        }
    }

    /// Shared field attributes, `None` for sections and navigation.
    pub fn attrs(&self) -> Option<&FieldAttrs> {
        match self {
            Self::Text(attrs) | Self::Nid(attrs) | Self::Signature(attrs) => Some(attrs),
            Self::Email(f) => Some(&f.attrs),
            Self::Radio(f) | Self::Checkbox(f) => Some(&f.attrs),
            Self::Dropdown(f) => Some(&f.attrs),
            Self::Slider(f) => Some(&f.attrs),
            _ => None,
        }
    }

    /// Target field path. Empty keys count as absent.
    pub fn key(&self) -> Option<&str> {
        self.attrs()
            .and_then(|attrs| attrs.key.as_deref())
            .filter(|key| !key.is_empty())
    }
}

/// Heading or paragraph wrapping nested nodes.
#[derive(Debug, Clone, Deserialize)]
pub struct Section {
    #[serde(default)]
    pub label: String,
    pub elements: Vec<Value>,
}

/// Attributes common to every field kind
#[derive(Debug, Clone, Deserialize)]
pub struct FieldAttrs {
    /// Dotted path of the record field this input reads and writes
    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub label: String,

    #[serde(default)]
    pub caption: String,

    #[serde(default)]
    pub required: bool,

    /// Read the current record value into the control
    #[serde(default = "default_true")]
    pub prefill: bool,
}

impl FieldAttrs {
    pub fn key_or_empty(&self) -> &str {
        self.key.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmailField {
    #[serde(flatten)]
    pub attrs: FieldAttrs,

    /// Restricts addresses to this domain
    #[serde(default)]
    pub domain: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceField {
    #[serde(flatten)]
    pub attrs: FieldAttrs,

    pub options: Vec<String>,
}

impl ChoiceField {
    /// True when the options are exactly Yes and No, in any order.
    pub fn is_yes_no(&self) -> bool {
        self.options.len() == 2
            && self.options.iter().any(|o| o == "Yes")
            && self.options.iter().any(|o| o == "No")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DropdownField {
    #[serde(flatten)]
    pub attrs: FieldAttrs,

    pub options: Vec<String>,

    /// Allow a free-text answer next to the listed options
    #[serde(default)]
    pub other: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SliderField {
    #[serde(flatten)]
    pub attrs: FieldAttrs,

    #[serde(default = "default_novice_label")]
    pub novice_label: String,

    #[serde(default = "default_expert_label")]
    pub expert_label: String,
}

/// Back/forward controls between steps
#[derive(Debug, Clone, Deserialize)]
pub struct Navigation {
    #[serde(default)]
    pub prev: Option<String>,

    #[serde(default = "default_next")]
    pub next: String,

    #[serde(default = "default_prev_label")]
    pub prev_label: String,

    #[serde(default = "default_next_label")]
    pub next_label: String,
}

fn default_true() -> bool { true }
fn default_next() -> String { "#".to_string() }
fn default_prev_label() -> String { "Back".to_string() }
fn default_next_label() -> String { "Next".to_string() }
fn default_novice_label() -> String { "Novice".to_string() }
fn default_expert_label() -> String { "Expert".to_string() }
