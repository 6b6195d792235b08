mod common;

use axum::http::{Method, StatusCode};
use common::{valid_study_preferences_body, TestApp, STUDY_PREFERENCES_URI};
use serde_json::json;

#[tokio::test]
async fn test_study_preferences_locked_until_profile_completed() {
    let app = TestApp::new();
    let token = app.sign_in_token();

    let response = app
        .request(Method::GET, STUDY_PREFERENCES_URI, Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request(
            Method::POST,
            STUDY_PREFERENCES_URI,
            Some(&token),
            Some(valid_study_preferences_body()),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_study_preferences_lifecycle_with_reissued_credential() {
    let app = TestApp::new();
    let sign_in = app.sign_in_token();

    let created = app.create_profile(&sign_in).await;
    assert_eq!(created.status, StatusCode::CREATED);
    let token = created.token_cookie().expect("re-issued credential");

    let response = app
        .request(Method::GET, STUDY_PREFERENCES_URI, Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Study preferences not found");

    let response = app
        .request(
            Method::POST,
            STUDY_PREFERENCES_URI,
            Some(&token),
            Some(valid_study_preferences_body()),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["study_mode"], "hybrid");
    assert_eq!(response.body["group_size"], 4);

    let response = app
        .request(
            Method::POST,
            STUDY_PREFERENCES_URI,
            Some(&token),
            Some(valid_study_preferences_body()),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "Study preferences already exist");

    let response = app
        .request(
            Method::PATCH,
            STUDY_PREFERENCES_URI,
            Some(&token),
            Some(json!({ "study_mode": "online", "group_size": 2 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["study_mode"], "online");
    assert_eq!(response.body["group_size"], 2);
    assert_eq!(response.body["preferred_subjects"], "linear algebra, statistics");

    let response = app
        .request(Method::GET, STUDY_PREFERENCES_URI, Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["study_mode"], "online");

    let response = app
        .request(Method::DELETE, STUDY_PREFERENCES_URI, Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(
        response.body["message"],
        "Study preferences have been successfully deleted!"
    );

    let response = app
        .request(Method::GET, STUDY_PREFERENCES_URI, Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_study_preferences_validation() {
    let app = TestApp::new();
    let token = app.token_with(&["can_view_study_preferences", "can_change_study_preferences"]);

    let response = app
        .request(
            Method::POST,
            STUDY_PREFERENCES_URI,
            Some(&token),
            Some(json!({ "preferred_subjects": "chemistry", "study_mode": "telepathy", "group_size": 40 })),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["details"]["study_mode"],
        "Study mode must be one of: in_person, online, hybrid"
    );
    assert!(response.body["details"]["group_size"].is_string());

    let response = app
        .request(Method::POST, STUDY_PREFERENCES_URI, Some(&token), Some(json!({})))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["details"]["study_mode"], "Study mode is required");
    assert_eq!(response.body["details"]["group_size"], "Group size is required");
}

#[tokio::test]
async fn test_update_missing_study_preferences() {
    let app = TestApp::new();
    let token = app.token_with(&["can_view_study_preferences", "can_change_study_preferences"]);

    let response = app
        .request(
            Method::PATCH,
            STUDY_PREFERENCES_URI,
            Some(&token),
            Some(json!({ "group_size": 3 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(Method::DELETE, STUDY_PREFERENCES_URI, Some(&token), None)
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_uniqueness_constraint_rejects_duplicate_preferences() {
    let app = TestApp::new();
    let token = app.token_with(&["can_view_study_preferences", "can_change_study_preferences"]);

    let response = app
        .request(
            Method::POST,
            STUDY_PREFERENCES_URI,
            Some(&token),
            Some(valid_study_preferences_body()),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    app.store.miss_next_lookup();
    let response = app
        .request(
            Method::POST,
            STUDY_PREFERENCES_URI,
            Some(&token),
            Some(json!({ "preferred_subjects": "history", "study_mode": "online", "group_size": 2 })),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "Study preferences already exist");

    let response = app
        .request(Method::GET, STUDY_PREFERENCES_URI, Some(&token), None)
        .await;
    assert_eq!(response.body["study_mode"], "hybrid");
}
