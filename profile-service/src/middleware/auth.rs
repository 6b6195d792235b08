//! Credential extraction and the capability guard called at the top of every
//! protected handler.

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::OffsetDateTime;

use crate::models::Capability;
use crate::services::{Credential, Principal, ProfileError, TokenService};

/// Cookie carrying the bearer credential.
pub const TOKEN_COOKIE: &str = "token";

/// The credential presented with a request: the `token` cookie, or an
/// `Authorization: Bearer` header when no cookie is set.
pub fn presented_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
}

/// Verify the presented credential and require every capability in
/// `required`.
pub fn authorize(
    tokens: &TokenService,
    jar: &CookieJar,
    headers: &HeaderMap,
    required: &[Capability],
) -> Result<Principal, ProfileError> {
    let token = presented_token(jar, headers);
    let principal = tokens.verify(token.as_deref(), required).map_err(|e| {
        tracing::debug!(error = %e, "Request not authorized");
        ProfileError::from(e)
    })?;
    Ok(principal)
}

/// HttpOnly cookie holding `credential`, expiring with it.
pub fn credential_cookie(credential: &Credential, secure: bool) -> Cookie<'static> {
    let builder = Cookie::build((TOKEN_COOKIE, credential.token.clone()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax);

    match OffsetDateTime::from_unix_timestamp(credential.claims.exp) {
        Ok(expires) => builder.expires(expires).build(),
        Err(_) => builder
            .max_age(time::Duration::seconds(
                credential.claims.exp - credential.claims.iat,
            ))
            .build(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PROFILE_ACCESS;
    use axum::http::HeaderValue;
    use chrono::Duration;
    use uuid::Uuid;

    fn tokens() -> TokenService {
        TokenService::from_secret(b"middleware-test-secret-0123456789", Duration::minutes(30))
    }

    #[test]
    fn test_cookie_preferred_over_header() {
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, "from-cookie"));
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );

        assert_eq!(presented_token(&jar, &headers).as_deref(), Some("from-cookie"));
        assert_eq!(
            presented_token(&CookieJar::new(), &headers).as_deref(),
            Some("from-header")
        );
        assert_eq!(presented_token(&CookieJar::new(), &HeaderMap::new()), None);
    }

    #[test]
    fn test_authorize_maps_failures() {
        let tokens = tokens();
        assert!(matches!(
            authorize(&tokens, &CookieJar::new(), &HeaderMap::new(), &PROFILE_ACCESS),
            Err(ProfileError::Unauthenticated(_))
        ));

        let credential = tokens
            .issue_default(Uuid::new_v4(), ["can_view_dashboard"], None)
            .unwrap();
        let jar = CookieJar::new().add(Cookie::new(TOKEN_COOKIE, credential.token));
        assert!(matches!(
            authorize(&tokens, &jar, &HeaderMap::new(), &PROFILE_ACCESS),
            Err(ProfileError::Unauthorized(Capability::CanViewProfile))
        ));
    }

    #[test]
    fn test_credential_cookie_attributes() {
        let credential = tokens()
            .issue_default(Uuid::new_v4(), ["can_view_profile"], None)
            .unwrap();
        let cookie = credential_cookie(&credential, true);

        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.value(), credential.token);
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(
            cookie.expires_datetime().map(|t| t.unix_timestamp()),
            Some(credential.claims.exp)
        );
    }
}
