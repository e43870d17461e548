use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use crate::{AppState, error::AppError};

/// Identity behind a bearer token: either the bootstrap admin token from the
/// environment or a row in `api_token`.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub email: String,
    pub is_staff: bool,
}

impl AuthUser {
    pub fn require_staff(&self) -> Result<(), AppError> {
        if self.is_staff { Ok(()) } else { Err(AppError::Forbidden("staff access required")) }
    }

    /// Reviews belong to the email address they were posted under.
    pub fn may_edit_review(&self, review_email: &str) -> bool {
        self.is_staff || self.email == review_email
    }
}

/// Ratings belong to the address that submitted them, so deleting one needs
/// no token at all when the addresses match.
pub fn may_delete_rating(user: Option<&AuthUser>, requester_ip: &str, rating_ip: &str) -> bool {
    requester_ip == rating_ip || user.is_some_and(|u| u.is_staff)
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        resolve(state, token).await?.ok_or(AppError::Unauthorized)
    }
}

/// Like `AuthUser` but absent instead of rejecting when no valid token was
/// sent.
#[derive(Clone, Debug)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl FromRequestParts<Arc<AppState>> for MaybeAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(&parts.headers) {
            Some(token) => Ok(MaybeAuthUser(resolve(state, token).await?)),
            None => Ok(MaybeAuthUser(None)),
        }
    }
}

async fn resolve(state: &AppState, token: &str) -> Result<Option<AuthUser>, AppError> {
    let config = &state.config;
    if !config.admin_token.is_empty() && token == config.admin_token {
        return Ok(Some(AuthUser { email: config.admin_email.clone(), is_staff: true }));
    }
    let row = state.tokens.lookup(token).await?;
    Ok(row.map(|t| AuthUser { email: t.email, is_staff: t.is_staff }))
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn user(email: &str, is_staff: bool) -> AuthUser {
        AuthUser { email: email.to_string(), is_staff }
    }

    #[test]
    fn bearer_token_is_extracted() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc123"));
        assert_eq!(bearer_token(&headers), Some("abc123"));
    }

    #[test]
    fn non_bearer_schemes_are_ignored() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc123"));
        assert_eq!(bearer_token(&headers), None);
    }

    #[test]
    fn review_ownership_requires_matching_email_or_staff() {
        let owner = user("a@example.com", false);
        let stranger = user("b@example.com", false);
        let staff = user("mod@example.com", true);
        assert!(owner.may_edit_review("a@example.com"));
        assert!(!stranger.may_edit_review("a@example.com"));
        assert!(staff.may_edit_review("a@example.com"));
    }

    #[test]
    fn rating_ownership_requires_matching_ip_or_staff() {
        let staff = user("mod@example.com", true);
        let plain = user("a@example.com", false);
        assert!(may_delete_rating(None, "1.2.3.4", "1.2.3.4"));
        assert!(!may_delete_rating(None, "9.9.9.9", "1.2.3.4"));
        assert!(!may_delete_rating(Some(&plain), "9.9.9.9", "1.2.3.4"));
        assert!(may_delete_rating(Some(&staff), "9.9.9.9", "1.2.3.4"));
    }
}
