//! HTTP response building module
//!
//! Provides builders for every response shape the gateway emits, decoupled from dispatch.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use hyper::{Response, StatusCode};

pub const XML_CONTENT_TYPE: &str = "application/xml";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Build 302 redirect response
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, target)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(b"Redirecting...")))
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(CONTENT_TYPE, "text/plain")
        .body(Full::new(Bytes::from_static(b"404 Not Found")))
        .unwrap_or_else(|e| {
            log_build_error("404", &e);
            Response::new(Full::new(Bytes::from_static(b"404 Not Found")))
        })
}

/// Build 200 response carrying a route or version document
pub fn build_xml_response(data: Bytes) -> Response<Full<Bytes>> {
    build_ok_response(data, XML_CONTENT_TYPE)
}

/// Build 200 response carrying JSON bytes as-is
///
/// Used for message payloads and error envelopes alike; errors are never signalled by status.
pub fn build_json_response(data: Bytes) -> Response<Full<Bytes>> {
    build_ok_response(data, JSON_CONTENT_TYPE)
}

fn build_ok_response(data: Bytes, content_type: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, content_type)
        .header(CONTENT_LENGTH, data.len())
        .body(Full::new(data))
        .unwrap_or_else(|e| {
            log_build_error("200", &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    #[tokio::test]
    async fn test_xml_response_passes_bytes_through() {
        let resp = build_xml_response(Bytes::from_static(b"<v>1.0.3</v>"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], XML_CONTENT_TYPE);
        assert_eq!(resp.headers()[CONTENT_LENGTH], "12");
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"<v>1.0.3</v>");
    }

    #[test]
    fn test_redirect_sets_location() {
        let resp = build_redirect_response("https://example.com/landing");
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(resp.headers()[LOCATION], "https://example.com/landing");
    }

    #[test]
    fn test_json_response_is_ok_status() {
        let resp = build_json_response(Bytes::from_static(b"{\"errorCode\":-9}"));
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[CONTENT_TYPE], JSON_CONTENT_TYPE);
    }
}
