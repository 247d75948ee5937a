use std::collections::BTreeMap;

use axum::{
    async_trait,
    body::Bytes,
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::{header::CONTENT_TYPE, HeaderMap},
    Json,
};
use lazy_static::lazy_static;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::AppError;

pub type FieldErrors = BTreeMap<String, String>;

/// Request bodies that carry per-field constraints.
pub trait Validate {
    fn validate(&self) -> Result<(), FieldErrors>;
}

/// `Json<T>` that reports structural and field errors through [`AppError`].
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(from_json_rejection)?;
        value.validate().map_err(AppError::Validation)?;
        Ok(Self(value))
    }
}

/// JSON body that may be left out entirely.
///
/// An empty body yields `None`. A body that is present must be well-formed
/// JSON sent as `application/json`, otherwise the request is rejected.
pub struct OptionalJson<T>(pub Option<T>);

#[async_trait]
impl<S, T> FromRequest<S> for OptionalJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = has_json_content_type(req.headers());
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self(None));
        }
        if !is_json {
            debug!("non-json body rejected");
            return Err(AppError::BadRequest(
                "Expected Content-Type: application/json".into(),
            ));
        }

        let Json(value) = Json::<T>::from_bytes(&bytes).map_err(from_json_rejection)?;
        Ok(Self(Some(value)))
    }
}

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(value) = headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) else {
        return false;
    };
    let essence = value.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || (essence.starts_with("application/") && essence.ends_with("+json"))
}

fn from_json_rejection(rejection: JsonRejection) -> AppError {
    lazy_static! {
        static ref MISSING_FIELD_RE: Regex = Regex::new(r"missing field `([^`]+)`").unwrap();
    }
    let text = rejection.body_text();
    debug!(reason = %text, "json body rejected");
    match rejection {
        JsonRejection::JsonDataError(_) => {
            let missing = MISSING_FIELD_RE
                .captures(&text)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string());
            match missing {
                Some(field) => AppError::field(&field, "is required"),
                None => AppError::field("body", &text),
            }
        }
        JsonRejection::JsonSyntaxError(_) => {
            AppError::BadRequest("Malformed JSON request body".into())
        }
        JsonRejection::MissingJsonContentType(_) => {
            AppError::BadRequest("Expected Content-Type: application/json".into())
        }
        _ => AppError::BadRequest(text),
    }
}

/// Collects field errors in declaration order of the checks.
#[derive(Default)]
pub struct Checks(FieldErrors);

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok && !self.0.contains_key(field) {
            self.0.insert(field.to_string(), message.to_string());
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), FieldErrors> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(std::mem::take(&mut self.0))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Named {
        name: String,
    }

    impl Validate for Named {
        fn validate(&self) -> Result<(), FieldErrors> {
            Checks::new()
                .check(!self.name.trim().is_empty(), "name", "Name is required")
                .finish()
        }
    }

    fn json_request(body: &str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_body() {
        let ValidatedJson(body) =
            ValidatedJson::<Named>::from_request(json_request(r#"{"name":"x"}"#), &())
                .await
                .ok()
                .unwrap();
        assert_eq!(body.name, "x");
    }

    #[tokio::test]
    async fn missing_field_is_reported_by_name() {
        let err = ValidatedJson::<Named>::from_request(json_request("{}"), &())
            .await
            .err()
            .unwrap();
        match err {
            AppError::Validation(errors) => assert_eq!(errors["name"], "is required"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn blank_field_fails_validation() {
        let err = ValidatedJson::<Named>::from_request(json_request(r#"{"name":"  "}"#), &())
            .await
            .err()
            .unwrap();
        match err {
            AppError::Validation(errors) => assert_eq!(errors["name"], "Name is required"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn syntax_error_is_bad_request() {
        let err = ValidatedJson::<Named>::from_request(json_request("{not json"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[derive(Debug, Deserialize)]
    struct Flag {
        #[serde(default)]
        on: Option<bool>,
    }

    fn raw_request(content_type: Option<&str>, body: &str) -> Request {
        let mut req = Request::builder().method("PUT").uri("/");
        if let Some(ct) = content_type {
            req = req.header(CONTENT_TYPE, ct);
        }
        req.body(Body::from(body.to_string())).unwrap()
    }

    async fn optional_flag(
        content_type: Option<&str>,
        body: &str,
    ) -> Result<Option<Flag>, AppError> {
        OptionalJson::<Flag>::from_request(raw_request(content_type, body), &())
            .await
            .map(|OptionalJson(v)| v)
    }

    #[tokio::test]
    async fn optional_json_treats_empty_body_as_absent() {
        assert!(optional_flag(None, "").await.unwrap().is_none());
        assert!(optional_flag(Some("application/json"), "").await.unwrap().is_none());
        assert!(optional_flag(Some("application/json"), " \n").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn optional_json_reads_present_body() {
        let flag = optional_flag(Some("application/json; charset=utf-8"), r#"{"on":true}"#)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(flag.on, Some(true));

        let flag = optional_flag(Some("application/json"), "{}")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(flag.on, None);
    }

    #[tokio::test]
    async fn optional_json_rejects_unreadable_body() {
        let err = optional_flag(Some("text/plain"), r#"{"on":true}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = optional_flag(None, r#"{"on":true}"#).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err = optional_flag(Some("application/json"), r#"{"on":"yes"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = optional_flag(Some("application/json"), "{not json")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn checks_keep_first_message_per_field() {
        let errors = Checks::new()
            .check(false, "email", "Email is required")
            .check(false, "email", "Invalid email")
            .check(true, "password", "unused")
            .finish()
            .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors["email"], "Email is required");
    }
}
