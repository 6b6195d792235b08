use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use axum_extra::extract::cookie::CookieJar;
use service_core::error::AppError;

use crate::dtos::study_preferences::StudyPreferencesRequest;
use crate::dtos::MessageResponse;
use crate::middleware::authorize;
use crate::models::Capability;
use crate::utils::parse_json;
use crate::AppState;

pub const STUDY_PREFERENCES_PATH: &str = "/studyhub/user-profile/study-preferences/";

const VIEW: [Capability; 1] = [Capability::CanViewStudyPreferences];
const CHANGE: [Capability; 1] = [Capability::CanChangeStudyPreferences];

/// Fetch the caller's study preferences
#[utoipa::path(
    get,
    path = "/studyhub/user-profile/study-preferences/",
    responses(
        (status = 200, description = "Stored study preferences", body = StudyPreferences),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Credential lacks can_view_study_preferences", body = ErrorResponse),
        (status = 404, description = "No study preferences for this account", body = ErrorResponse)
    ),
    tag = "Study Preferences",
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn get_study_preferences(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let principal = authorize(&state.tokens, &jar, &headers, &VIEW)?;
    let prefs = state.study_preferences.get(&principal).await?;
    Ok((StatusCode::OK, Json(prefs)))
}

/// Record the caller's study preferences
#[utoipa::path(
    post,
    path = "/studyhub/user-profile/study-preferences/",
    request_body = StudyPreferencesRequest,
    responses(
        (status = 201, description = "Study preferences created", body = StudyPreferences),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Credential lacks can_change_study_preferences", body = ErrorResponse),
        (status = 409, description = "Study preferences already exist", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Study Preferences",
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn create_study_preferences(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let principal = authorize(&state.tokens, &jar, &headers, &CHANGE)?;
    let request: StudyPreferencesRequest = parse_json(&body)?;
    let prefs = state.study_preferences.create(&principal, &request).await?;
    Ok((StatusCode::CREATED, Json(prefs)))
}

/// Partially update the caller's study preferences
#[utoipa::path(
    patch,
    path = "/studyhub/user-profile/study-preferences/",
    request_body = StudyPreferencesRequest,
    responses(
        (status = 201, description = "Study preferences updated", body = StudyPreferences),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Credential lacks can_change_study_preferences", body = ErrorResponse),
        (status = 404, description = "No study preferences for this account", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Study Preferences",
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn update_study_preferences(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let principal = authorize(&state.tokens, &jar, &headers, &CHANGE)?;
    let request: StudyPreferencesRequest = parse_json(&body)?;
    let prefs = state.study_preferences.update(&principal, &request).await?;
    Ok((StatusCode::CREATED, Json(prefs)))
}

/// Delete the caller's study preferences
#[utoipa::path(
    delete,
    path = "/studyhub/user-profile/study-preferences/",
    responses(
        (status = 201, description = "Study preferences deleted", body = MessageResponse),
        (status = 401, description = "Missing, invalid or expired credential", body = ErrorResponse),
        (status = 403, description = "Credential lacks can_change_study_preferences", body = ErrorResponse),
        (status = 404, description = "No study preferences for this account", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Study Preferences",
    security(("cookie_auth" = []), ("bearer_auth" = []))
)]
pub async fn delete_study_preferences(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let principal = authorize(&state.tokens, &jar, &headers, &CHANGE)?;
    state.study_preferences.delete(&principal).await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Study preferences have been successfully deleted!".to_string(),
        }),
    ))
}
