use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;

use crate::dtos::profile::ProfileRequest;
use crate::dtos::MessageResponse;
use crate::middleware::{authorize, credential_cookie};
use crate::models::PROFILE_ACCESS;
use crate::utils::parse_json;
use crate::AppState;

pub const PROFILE_PATH: &str = "/studyhub/user-profile/user-information/";

/// Fetch the caller's profile
#[utoipa::path(
    get,
    path = "/studyhub/user-profile/user-information/",
    responses(
        (status = 200, description = "Stored profile", body = UserProfile),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Credential lacks a required capability", body = ErrorResponse),
        (status = 404, description = "No profile for this account", body = ErrorResponse)
    ),
    tag = "Profile",
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let principal = authorize(&state.tokens, &jar, &headers, &PROFILE_ACCESS)?;
    let profile = state.profiles.get(&principal).await?;
    Ok((StatusCode::OK, Json(profile)))
}

/// Create the caller's profile and re-issue their credential
///
/// On success the `token` cookie is replaced by a credential that also
/// carries the study-preference and availability capabilities.
#[utoipa::path(
    post,
    path = "/studyhub/user-profile/user-information/",
    request_body = ProfileRequest,
    responses(
        (status = 201, description = "Profile created; new credential set in the token cookie", body = UserProfile),
        (status = 400, description = "Validation or address verification failed", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Credential lacks a required capability", body = ErrorResponse),
        (status = 409, description = "Profile already exists", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Profile",
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let principal = authorize(&state.tokens, &jar, &headers, &PROFILE_ACCESS)?;
    let request: ProfileRequest = parse_json(&body)?;

    let created = state.profiles.create(&principal, &request).await?;
    let jar = jar.add(credential_cookie(
        &created.credential,
        state.config.security.cookie_secure,
    ));

    Ok((StatusCode::CREATED, jar, Json(created.profile)))
}

/// Partially update the caller's profile
#[utoipa::path(
    patch,
    path = "/studyhub/user-profile/user-information/",
    request_body = ProfileRequest,
    responses(
        (status = 201, description = "Profile updated", body = UserProfile),
        (status = 400, description = "Validation or address verification failed", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Credential lacks a required capability", body = ErrorResponse),
        (status = 404, description = "No profile for this account", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Profile",
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let principal = authorize(&state.tokens, &jar, &headers, &PROFILE_ACCESS)?;
    let request: ProfileRequest = parse_json(&body)?;

    let profile = state.profiles.update(&principal, &request).await?;
    // Existing clients expect 201 here.
    Ok((StatusCode::CREATED, Json(profile)))
}

/// Delete the caller's profile
#[utoipa::path(
    delete,
    path = "/studyhub/user-profile/user-information/",
    responses(
        (status = 201, description = "Profile deleted", body = MessageResponse),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Credential lacks a required capability", body = ErrorResponse),
        (status = 404, description = "No profile for this account", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Profile",
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_profile(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let principal = authorize(&state.tokens, &jar, &headers, &PROFILE_ACCESS)?;
    state.profiles.delete(&principal).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User information has been successfully deleted!".to_string(),
        }),
    ))
}
