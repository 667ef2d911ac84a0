use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderValue;
use uuid::Uuid;

use super::{ApiError, AppState};

/// The signed-in user, resolved from `Authorization: Bearer <token>`.
///
/// Rejects with 401 `Unauthorized` when the header is missing or the token
/// has no live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(parts.headers.get(AUTHORIZATION)).ok_or_else(ApiError::unauthorized)?;
        state
            .store
            .session_user(token)
            .await?
            .map(Self)
            .ok_or_else(ApiError::unauthorized)
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer session-1");
        assert_eq!(extract_bearer_token(Some(&header)), Some("session-1"));
    }

    #[test]
    fn extract_bearer_token_rejects_other_schemes() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
        assert_eq!(extract_bearer_token(Some(&HeaderValue::from_static("Bearer  "))), None);
    }
}
