use serde::de::DeserializeOwned;
use service_core::error::AppError;

/// Decode a JSON request body. Bodies are read as raw bytes so that the
/// credential is checked before the payload; an empty body decodes as `{}`.
pub fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, AppError> {
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        body
    };

    serde_json::from_slice(body)
        .map_err(|e| AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::profile::ProfileRequest;

    #[test]
    fn test_empty_body_is_empty_object() {
        let req: ProfileRequest = parse_json(b"  ").unwrap();
        assert!(req.first_name.is_none());
    }

    #[test]
    fn test_aliases_accepted() {
        let req: ProfileRequest =
            parse_json(br#"{"mid_name":"Byron","birth_day":"2003-05-14","user_interest":"looms"}"#)
                .unwrap();
        assert_eq!(req.middle_name.as_deref(), Some("Byron"));
        assert_eq!(req.date_of_birth.as_deref(), Some("2003-05-14"));
        assert_eq!(req.interests.as_deref(), Some("looms"));
    }

    #[test]
    fn test_malformed_body_is_bad_request() {
        let err = parse_json::<ProfileRequest>(b"{\"age\": \"twenty\"}").unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
    }
}
