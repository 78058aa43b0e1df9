//! Error envelope module
//!
//! Every failure that should not redirect ends up here as a JSON body of the form
//! `{"errorCode": -9, "errorMsg": "..."}`, always sent with HTTP 200.

use crate::logger;
use hyper::body::Bytes;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Code and message used when the configured template cannot be used
pub const FALLBACK_CODE: i64 = -1;
pub const FALLBACK_MESSAGE: &str = "Internal Server Error";

/// Request-level failures, each carrying a client-visible error code
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("failed to read request body: {0}")]
    BodyUnreadable(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),

    #[error("missing msg_id")]
    MissingMsgId,

    #[error("route file not found: {}", .0.display())]
    RouteManifestMissing(PathBuf),

    #[error("failed to read route file {}: {source}", .path.display())]
    RouteFileUnreadable { path: PathBuf, source: io::Error },

    #[error("route file is empty: {}", .0.display())]
    RouteManifestEmpty(PathBuf),

    #[error("failed to read version file {}: {source}", .path.display())]
    VersionFileUnreadable { path: PathBuf, source: io::Error },

    #[error("version file too short: {} ({len} bytes, need {min})", .path.display())]
    VersionFileTooShort { path: PathBuf, len: usize, min: usize },

    #[error("file not found: {}", .0.display())]
    PayloadNotFound(PathBuf),

    #[error("failed to read payload {}: {source}", .path.display())]
    PayloadUnreadable { path: PathBuf, source: io::Error },
}

impl GatewayError {
    /// Client-visible `errorCode`
    pub const fn code(&self) -> i64 {
        match self {
            Self::BodyUnreadable(_) => -2,
            Self::MalformedBody(_) => -3,
            Self::RouteManifestMissing(_) => -5,
            Self::RouteFileUnreadable { .. } => -6,
            Self::RouteManifestEmpty(_) => -7,
            Self::VersionFileUnreadable { .. } => -8,
            Self::MissingMsgId => -9,
            Self::VersionFileTooShort { .. } => -10,
            Self::PayloadNotFound(_) | Self::PayloadUnreadable { .. } => -13,
        }
    }
}

/// JSON error body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    #[serde(rename = "errorCode")]
    pub error_code: i64,
    #[serde(rename = "errorMsg", default, skip_serializing_if = "Option::is_none")]
    pub error_msg: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error_code: i64, error_msg: impl Into<String>) -> Self {
        Self {
            error_code,
            error_msg: Some(error_msg.into()),
        }
    }

    pub fn fallback() -> Self {
        Self::new(FALLBACK_CODE, FALLBACK_MESSAGE)
    }

    pub fn from_error(err: &GatewayError) -> Self {
        Self::new(err.code(), err.to_string())
    }

    pub fn to_bytes(&self) -> Bytes {
        // A two-field struct of integer and string cannot fail to serialize
        serde_json::to_vec(self).map_or_else(|_| Bytes::new(), Bytes::from)
    }
}

/// Renders [`GatewayError`]s into envelope bytes
///
/// The template is re-read on every failure so operators can edit it without a restart.
#[derive(Debug, Clone)]
pub struct ErrorResponder {
    template: Option<PathBuf>,
}

impl ErrorResponder {
    pub const fn new(template: Option<PathBuf>) -> Self {
        Self { template }
    }

    /// Envelope bytes for `err`
    pub async fn render(&self, err: &GatewayError) -> (Bytes, i64) {
        let Some(template) = &self.template else {
            let envelope = ErrorEnvelope::from_error(err);
            return (envelope.to_bytes(), envelope.error_code);
        };

        match load_template(template).await {
            Some(mut base) => {
                base.insert("errorCode".to_string(), err.code().into());
                base.insert("errorMsg".to_string(), err.to_string().into());
                let body = serde_json::to_vec(&base).map_or_else(
                    |_| ErrorEnvelope::fallback().to_bytes(),
                    Bytes::from,
                );
                (body, err.code())
            }
            None => (ErrorEnvelope::fallback().to_bytes(), FALLBACK_CODE),
        }
    }
}

/// Read the template as a JSON object; `None` when missing or unparsable
async fn load_template(path: &Path) -> Option<serde_json::Map<String, serde_json::Value>> {
    let content = match tokio::fs::read(path).await {
        Ok(c) => c,
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to read error template '{}': {e}",
                path.display()
            ));
            return None;
        }
    };

    match serde_json::from_slice::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Object(map)) => Some(map),
        Ok(_) => {
            logger::log_warning(&format!(
                "Error template '{}' is not a JSON object",
                path.display()
            ));
            None
        }
        Err(e) => {
            logger::log_warning(&format!(
                "Failed to parse error template '{}': {e}",
                path.display()
            ));
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(body: &[u8]) -> serde_json::Value {
        serde_json::from_slice(body).unwrap()
    }

    #[test]
    fn test_envelope_omits_missing_message() {
        let envelope = ErrorEnvelope {
            error_code: -9,
            error_msg: None,
        };
        assert_eq!(&envelope.to_bytes()[..], br#"{"errorCode":-9}"#);
    }

    #[test]
    fn test_codes_are_negative_and_distinct_per_kind() {
        assert_eq!(GatewayError::MissingMsgId.code(), -9);
        assert_eq!(GatewayError::PayloadNotFound(PathBuf::from("x")).code(), -13);
        assert_eq!(
            GatewayError::VersionFileTooShort {
                path: PathBuf::from("v"),
                len: 3,
                min: 15
            }
            .code(),
            -10
        );
    }

    #[tokio::test]
    async fn test_render_without_template() {
        let responder = ErrorResponder::new(None);
        let (body, code) = responder.render(&GatewayError::MissingMsgId).await;
        assert_eq!(code, -9);
        assert_eq!(
            decode(&body),
            serde_json::json!({"errorCode": -9, "errorMsg": "missing msg_id"})
        );
    }

    #[tokio::test]
    async fn test_render_overrides_template_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.json");
        std::fs::write(
            &path,
            r#"{"errorCode": 500, "errorMsg": "placeholder", "serverTime": 0}"#,
        )
        .unwrap();

        let responder = ErrorResponder::new(Some(path));
        let (body, code) = responder.render(&GatewayError::MissingMsgId).await;
        let value = decode(&body);
        assert_eq!(code, -9);
        assert_eq!(value["errorCode"], -9);
        assert_eq!(value["errorMsg"], "missing msg_id");
        assert_eq!(value["serverTime"], 0);
    }

    #[tokio::test]
    async fn test_render_falls_back_when_template_missing() {
        let dir = tempfile::tempdir().unwrap();
        let responder = ErrorResponder::new(Some(dir.path().join("error.json")));
        let (body, code) = responder.render(&GatewayError::MissingMsgId).await;
        assert_eq!(code, FALLBACK_CODE);
        assert_eq!(
            decode(&body),
            serde_json::json!({"errorCode": -1, "errorMsg": "Internal Server Error"})
        );
    }

    #[tokio::test]
    async fn test_render_falls_back_when_template_unparsable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("error.json");
        std::fs::write(&path, "not json").unwrap();

        let responder = ErrorResponder::new(Some(path));
        let (_, code) = responder.render(&GatewayError::MissingMsgId).await;
        assert_eq!(code, FALLBACK_CODE);
    }
}
