//! HTTP routes
//!
//! Handlers for onboarding pages and form API endpoints

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::{Html, IntoResponse, Json, Redirect, Response},
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info};

use super::{page, Member, SharedState};
use crate::auth::{Claims, SESSION_COOKIE};
use crate::error::{OnboardError, Result};
use crate::kennelish::{compile, merge, reconcile, render, ValidationErrors};
use crate::member::MemberRecord;

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    "OK"
}

/// Service info response
#[derive(Serialize)]
pub struct InfoResponse {
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
}

/// GET /api
pub async fn api_info() -> Json<InfoResponse> {
    Json(InfoResponse {
        name: env!("CARGO_PKG_NAME"),
        description: env!("CARGO_PKG_DESCRIPTION"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

// === Pages ===

/// GET /join - sign-up landing page, or straight to the first step
pub async fn join_start(
    State(state): State<SharedState>,
    member: Option<Member>,
) -> Response {
    match member {
        Some(_) => Redirect::to(&format!("/join/{}", state.config.forms.first_step)).into_response(),
        None => Html(page::landing_page(&state.config.auth.login_url).into_string()).into_response(),
    }
}

/// GET /join/:step - one onboarding step rendered against the member record
pub async fn join_page(
    State(state): State<SharedState>,
    Path(step): Path<String>,
    Member(claims): Member,
) -> Response {
    if step == "1" {
        return Redirect::to("/join").into_response();
    }

    match render_step(&state, &step, &claims).await {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            let status = e.status_code();
            let essay = match &e {
                OnboardError::NotFound(_) => "This form does not exist.".to_string(),
                _ if status.is_server_error() => {
                    error!(step = %step, error = %e, "Failed to render form page");
                    "Something went wrong loading this form.".to_string()
                }
                other => other.to_string(),
            };
            (status, Html(page::error_page(status, &essay).into_string())).into_response()
        }
    }
}

async fn render_step(state: &SharedState, step: &str, claims: &Claims) -> Result<String> {
    let schema = state.forms.load(step).await?;
    let record = load_member(state, claims).await?;

    let body = render(&schema, &record.to_form_value()?);
    Ok(page::form_page(claims, &body).into_string())
}

async fn load_member(state: &SharedState, claims: &Claims) -> Result<MemberRecord> {
    let id = claims.member_id()?;
    state
        .store
        .lock()
        .await
        .get(id)?
        .ok_or_else(|| OnboardError::NotFound(format!("member {}", id)))
}

/// GET /profile - the member's own record and membership status
pub async fn profile(State(state): State<SharedState>, Member(claims): Member) -> Response {
    match load_member(&state, &claims).await {
        Ok(record) => Html(page::profile_page(&record).into_string()).into_response(),
        Err(e) => {
            let status = e.status_code();
            if status.is_server_error() {
                error!(member = %claims.sub, error = %e, "Failed to load profile");
            }
            let essay = "We could not find your membership record. Try logging in again.";
            (status, Html(page::error_page(status, essay).into_string())).into_response()
        }
    }
}

/// GET /final
pub async fn final_page() -> Html<String> {
    Html(page::final_page().into_string())
}

/// GET /logout - drop the session cookie
pub async fn logout() -> Response {
    let expired = format!("{}=; Path=/; Max-Age=0", SESSION_COOKIE);
    ([(header::SET_COOKIE, expired)], Redirect::to("/join")).into_response()
}

// === Form API ===

/// GET /api/form/:step - the raw form document
pub async fn form_document(
    State(state): State<SharedState>,
    Path(step): Path<String>,
) -> Result<Json<Value>> {
    let schema = state.forms.load(&step).await?;
    Ok(Json(Value::Array(schema)))
}

/// Parse a request body that must be a JSON object.
pub(super) fn json_object(body: &[u8]) -> Result<Map<String, Value>> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|e| OnboardError::MalformedJson(e.to_string()))?;

    match payload {
        Value::Object(payload) => Ok(payload),
        _ => Err(OnboardError::MalformedInput(ValidationErrors::single(
            "body",
            "expected a JSON object",
        ))),
    }
}

/// POST /api/form/:step - validate a submission and merge it onto the member
pub async fn submit_form(
    State(state): State<SharedState>,
    Path(step): Path<String>,
    Member(claims): Member,
    body: Bytes,
) -> Result<Json<MemberRecord>> {
    let schema = state.forms.load(&step).await?;

    let payload = json_object(&body)?;

    let validated = compile(&schema)
        .validate(&payload)
        .map_err(OnboardError::MalformedInput)?;
    let patch = reconcile(validated);

    let id = claims.member_id()?;
    let store = state.store.lock().await;
    let record = store
        .get(id)?
        .ok_or_else(|| OnboardError::NotFound(format!("member {}", id)))?;

    let updated = merge(&record, &patch)?;
    store.save(&updated)?;

    info!(member = %id, step = %step, fields = patch.len(), "Saved form submission");
    Ok(Json(updated))
}
