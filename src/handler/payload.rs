//! Message payload module
//!
//! POST bodies are `key=value` pairs joined by `&`. `msg_id` selects the
//! pre-generated `{http_dir}/{msg_id}.json` file, which is returned byte for byte.

use crate::handler::error::GatewayError;
use crate::handler::resolver::FileResolver;
use http_body_util::{BodyExt, Limited};
use hyper::body::{Body, Bytes};
use percent_encoding::percent_decode_str;

/// Fields recognized in a message request body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageRequest {
    pub msg_id: i64,
    /// Decoded free-form text, only ever logged
    pub msg: String,
}

impl MessageRequest {
    /// One log line; control characters in `msg` are escaped so it cannot split the line
    pub fn log_line(&self) -> String {
        format!("[Message] msg_id={} msg={}", self.msg_id, self.msg.escape_debug())
    }
}

/// Collect the request body, refusing anything larger than `limit` bytes
pub async fn read_body<B>(body: B, limit: usize) -> Result<Bytes, GatewayError>
where
    B: Body<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    Limited::new(body, limit)
        .collect()
        .await
        .map(http_body_util::Collected::to_bytes)
        .map_err(|e| GatewayError::BodyUnreadable(e.to_string()))
}

/// Parse a form-encoded message body
///
/// Pairs without `=` are skipped and unknown keys ignored. When a key repeats, the last one wins.
pub fn parse_body(raw: &[u8]) -> Result<MessageRequest, GatewayError> {
    let body = std::str::from_utf8(raw)
        .map_err(|e| GatewayError::MalformedBody(format!("body is not UTF-8: {e}")))?;

    let mut msg_id = None;
    let mut msg = String::new();

    for pair in body.split('&') {
        let Some((key, value)) = pair.split_once('=') else {
            continue;
        };
        match key {
            "msg_id" => {
                let id = value.parse::<i64>().map_err(|e| {
                    GatewayError::MalformedBody(format!("invalid msg_id '{value}': {e}"))
                })?;
                msg_id = Some(id);
            }
            "msg" => msg = decode_form_value(value),
            _ => {}
        }
    }

    let msg_id = msg_id.ok_or(GatewayError::MissingMsgId)?;
    Ok(MessageRequest { msg_id, msg })
}

/// URL-decode a form value, treating `+` as a space
fn decode_form_value(value: &str) -> String {
    let spaced = value.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Load the payload file for `msg_id`
pub async fn load_payload(resolver: &FileResolver, msg_id: i64) -> Result<Bytes, GatewayError> {
    let resolved = resolver.resolve_payload(msg_id).await;
    if !resolved.exists {
        return Err(GatewayError::PayloadNotFound(resolved.path));
    }

    match tokio::fs::read(&resolved.path).await {
        Ok(content) => Ok(Bytes::from(content)),
        Err(source) => Err(GatewayError::PayloadUnreadable {
            path: resolved.path,
            source,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::Full;

    #[test]
    fn test_parse_body_extracts_fields() {
        let req = parse_body(b"msg_id=1042&msg=hello+world%21&token=abc").unwrap();
        assert_eq!(req.msg_id, 1042);
        assert_eq!(req.msg, "hello world!");
    }

    #[test]
    fn test_log_line_escapes_control_characters() {
        let req = parse_body(b"msg_id=9&msg=ok%0A[Message] msg_id=1%0D%09").unwrap();
        let line = req.log_line();
        assert_eq!(line, r"[Message] msg_id=9 msg=ok\n[Message] msg_id=1\r\t");
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_parse_body_skips_malformed_pairs() {
        let req = parse_body(b"garbage&&msg_id=7&=x").unwrap();
        assert_eq!(req.msg_id, 7);
        assert_eq!(req.msg, "");
    }

    #[test]
    fn test_parse_body_last_msg_id_wins() {
        assert_eq!(parse_body(b"msg_id=1&msg_id=2").unwrap().msg_id, 2);
    }

    #[test]
    fn test_parse_body_accepts_negative_id() {
        assert_eq!(parse_body(b"msg_id=-1").unwrap().msg_id, -1);
    }

    #[test]
    fn test_parse_body_missing_msg_id() {
        let err = parse_body(b"msg=hi").unwrap_err();
        assert!(matches!(err, GatewayError::MissingMsgId));
        assert_eq!(err.code(), -9);

        assert!(matches!(parse_body(b""), Err(GatewayError::MissingMsgId)));
    }

    #[test]
    fn test_parse_body_invalid_msg_id() {
        let err = parse_body(b"msg_id=12a").unwrap_err();
        assert_eq!(err.code(), -3);

        let err = parse_body(b"msg_id=").unwrap_err();
        assert_eq!(err.code(), -3);
    }

    #[test]
    fn test_parse_body_rejects_non_utf8() {
        let err = parse_body(&[b'm', 0xff, b'=']).unwrap_err();
        assert_eq!(err.code(), -3);
    }

    #[tokio::test]
    async fn test_read_body_within_limit() {
        let body = Full::new(Bytes::from_static(b"msg_id=3"));
        assert_eq!(&read_body(body, 64).await.unwrap()[..], b"msg_id=3");
    }

    #[tokio::test]
    async fn test_read_body_over_limit() {
        let body = Full::new(Bytes::from(vec![b'a'; 128]));
        let err = read_body(body, 64).await.unwrap_err();
        assert_eq!(err.code(), -2);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_load_payload_unreadable() {
        use crate::config::GatewayConfig;

        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("http")).unwrap();
        let target = std::path::Path::new("/proc/self/mem");
        if !target.is_file() {
            return;
        }
        // Stats as a regular file, but reading at offset 0 fails with EIO
        std::os::unix::fs::symlink(target, dir.path().join("http/31.json")).unwrap();
        let resolver = FileResolver::new(&GatewayConfig {
            root_dir: dir.path().to_string_lossy().into_owned(),
            ..GatewayConfig::default()
        });

        let err = load_payload(&resolver, 31).await.unwrap_err();
        assert!(matches!(err, GatewayError::PayloadUnreadable { .. }));
        assert_eq!(err.code(), -13);

        let err = load_payload(&resolver, 32).await.unwrap_err();
        assert!(matches!(err, GatewayError::PayloadNotFound(_)));
    }
}
