//! Session extractor
//!
//! Handlers that take `Member` only run for requests carrying a valid
//! session token. API paths answer 401; pages redirect to the login flow.
//! `Admin` additionally requires a fresh sudo session.

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use tracing::{debug, warn};

use super::SharedState;
use crate::auth::{extract_token_from_header, token_from_cookies, Claims};
use crate::error::OnboardError;

/// The signed-in member
#[derive(Debug, Clone)]
pub struct Member(pub Claims);

/// A signed-in member allowed to use the admin API
#[derive(Debug, Clone)]
pub struct Admin(pub Claims);

/// Paths that answer with a status instead of a login redirect.
fn is_api_path(path: &str) -> bool {
    path.starts_with("/api/") || path.starts_with("/admin/")
}

/// Session token from the cookie, or failing that the Authorization header.
pub fn session_token(headers: &HeaderMap) -> Option<&str> {
    let cookies = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok());
    let authorization = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    token_from_cookies(cookies).or_else(|| extract_token_from_header(authorization))
}

/// Login URL that returns the visitor to `path` afterwards.
pub fn login_redirect(login_url: &str, path: &str) -> String {
    let separator = if login_url.contains('?') { '&' } else { '?' };
    format!(
        "{}{}redir={}",
        login_url,
        separator,
        path.replace('&', "%26").replace('+', "%2B")
    )
}

#[axum::async_trait]
impl FromRequestParts<SharedState> for Member {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let err = match session_token(&parts.headers) {
            Some(token) => match state.sessions.verify(token) {
                Ok(claims) => return Ok(Member(claims)),
                Err(e) => e,
            },
            None => OnboardError::Unauthorized("missing session token".into()),
        };

        let path = parts.uri.path();
        debug!(path, error = %err, "Rejected request without a valid session");

        if is_api_path(path) {
            Err(err.into_response())
        } else {
            let target = login_redirect(&state.config.auth.login_url, path);
            Err(Redirect::to(&target).into_response())
        }
    }
}

#[axum::async_trait]
impl FromRequestParts<SharedState> for Admin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let Member(claims) = Member::from_request_parts(parts, state).await?;

        if let Err(e) = state.sessions.authorize_sudo(&claims) {
            warn!(member = %claims.sub, path = parts.uri.path(), error = %e, "Rejected admin request");
            return Err(e.into_response());
        }

        Ok(Admin(claims))
    }
}
