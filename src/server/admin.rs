//! Admin API
//!
//! Plain reads and edits of member records, for sudo sessions only.

use axum::{
    body::Bytes,
    extract::{Query, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{routes::json_object, Admin, SharedState};
use crate::error::{OnboardError, Result};
use crate::kennelish::{merge, reconcile, ValidationErrors};
use crate::member::MemberRecord;

/// Admin API response envelope
#[derive(Debug, Serialize)]
pub struct AdminResponse<T> {
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub msg: Option<&'static str>,
}

impl<T> AdminResponse<T> {
    fn data(data: T) -> Json<Self> {
        Json(Self { data, msg: None })
    }
}

#[derive(Debug, Deserialize)]
pub struct MemberQuery {
    pub member_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct SnowflakeQuery {
    pub discord_id: String,
}

/// GET /admin/get?member_id=
pub async fn get_member(
    State(state): State<SharedState>,
    Admin(_): Admin,
    Query(query): Query<MemberQuery>,
) -> Result<Json<AdminResponse<MemberRecord>>> {
    let record = state
        .store
        .lock()
        .await
        .get(query.member_id)?
        .ok_or_else(|| OnboardError::NotFound(format!("member {}", query.member_id)))?;

    Ok(AdminResponse::data(record))
}

/// GET /admin/get_by_snowflake?discord_id=
pub async fn get_by_snowflake(
    State(state): State<SharedState>,
    Admin(_): Admin,
    Query(query): Query<SnowflakeQuery>,
) -> Result<Json<AdminResponse<MemberRecord>>> {
    let record = state
        .store
        .lock()
        .await
        .get_by_discord_id(&query.discord_id)?
        .ok_or_else(|| OnboardError::NotFound(format!("discord id {}", query.discord_id)))?;

    Ok(AdminResponse::data(record))
}

/// GET /admin/list
pub async fn list_members(
    State(state): State<SharedState>,
    Admin(admin): Admin,
) -> Result<Json<AdminResponse<Vec<MemberRecord>>>> {
    let members = state.store.lock().await.list()?;
    info!(admin = %admin.sub, count = members.len(), "Listed members");

    Ok(AdminResponse::data(members))
}

/// POST /admin/get - merge an edit onto the member named by `id`
///
/// The body is a partial record. Nested objects and dotted keys both reach
/// the sub-entities, and nulls leave stored values alone.
pub async fn edit_member(
    State(state): State<SharedState>,
    Admin(admin): Admin,
    body: Bytes,
) -> Result<Json<AdminResponse<MemberRecord>>> {
    let mut payload = json_object(&body)?;
    let id = payload
        .remove("id")
        .and_then(|id| id.as_str().and_then(|id| Uuid::parse_str(id).ok()))
        .ok_or_else(|| {
            OnboardError::MalformedInput(ValidationErrors::single("id", "expected a member id"))
        })?;
    let patch = reconcile(payload);

    let store = state.store.lock().await;
    let record = store
        .get(id)?
        .ok_or_else(|| OnboardError::NotFound(format!("member {}", id)))?;

    let updated = merge(&record, &patch)?;
    store.save(&updated)?;

    info!(admin = %admin.sub, member = %id, fields = patch.len(), "Admin edited member");
    Ok(Json(AdminResponse {
        data: updated,
        msg: Some("Updated successfully!"),
    }))
}
