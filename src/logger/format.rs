//! Access log format module
//!
//! Supports multiple log formats:
//! - `combined` (Apache/Nginx combined format plus dispatch details)
//! - `common` (Common Log Format - CLF)
//! - `json` (JSON structured logging)
//! - Custom patterns with `$variable` substitution

use chrono::{DateTime, Local};
use std::net::SocketAddr;
use std::time::Duration;

const CLF_TIME: &str = "%d/%b/%Y:%H:%M:%S %z";

/// One completed request, written after the response is built
#[derive(Debug, Clone)]
pub struct AccessLogEntry {
    pub remote_addr: SocketAddr,
    /// Time the request arrived
    pub time: DateTime<Local>,
    pub method: String,
    pub path: String,
    /// Query string (without leading ?)
    pub query: Option<String>,
    /// Dispatch category label, e.g. `version_file`
    pub category: &'static str,
    pub status: u16,
    pub body_bytes: u64,
    /// `errorCode` of the envelope, when the response is one
    pub error_code: Option<i64>,
    pub user_agent: Option<String>,
    pub elapsed: Duration,
}

impl AccessLogEntry {
    /// Create an entry stamped with the current time
    pub fn new(remote_addr: SocketAddr, method: &str, path: &str) -> Self {
        Self {
            remote_addr,
            time: Local::now(),
            method: method.to_string(),
            path: path.to_string(),
            query: None,
            category: "unmatched",
            status: 200,
            body_bytes: 0,
            error_code: None,
            user_agent: None,
            elapsed: Duration::ZERO,
        }
    }

    /// Format the log entry according to the specified format
    pub fn format(&self, format: &str) -> String {
        match format {
            "combined" => self.format_combined(),
            "common" => self.format_common(),
            "json" => self.format_json(),
            custom => self.format_custom(custom),
        }
    }

    fn request_uri(&self) -> String {
        match &self.query {
            Some(q) => format!("{}?{q}", self.path),
            None => self.path.clone(),
        }
    }

    fn error_code_field(&self) -> String {
        self.error_code
            .map_or_else(|| "-".to_string(), |c| c.to_string())
    }

    /// `$remote_addr - - [$time_local] "$request" $status $body_bytes_sent`
    fn format_common(&self) -> String {
        format!(
            "{} - - [{}] \"{} {}\" {} {}",
            self.remote_addr.ip(),
            self.time.format(CLF_TIME),
            self.method,
            self.request_uri(),
            self.status,
            self.body_bytes,
        )
    }

    /// Common format followed by user agent, category, error code and elapsed time
    fn format_combined(&self) -> String {
        format!(
            "{} \"{}\" {} {} {:.3}",
            self.format_common(),
            self.user_agent.as_deref().unwrap_or("-"),
            self.category,
            self.error_code_field(),
            self.elapsed.as_secs_f64(),
        )
    }

    fn format_json(&self) -> String {
        serde_json::json!({
            "remote_addr": self.remote_addr.to_string(),
            "time": self.time.to_rfc3339(),
            "method": self.method,
            "path": self.path,
            "query": self.query,
            "category": self.category,
            "status": self.status,
            "body_bytes": self.body_bytes,
            "error_code": self.error_code,
            "user_agent": self.user_agent,
            "request_time_us": u64::try_from(self.elapsed.as_micros()).unwrap_or(u64::MAX),
        })
        .to_string()
    }

    /// Custom format with variable substitution
    ///
    /// Supported variables: `$remote_addr`, `$time_local`, `$time_iso8601`,
    /// `$request_time`, `$request_method`, `$request_uri`, `$status`,
    /// `$body_bytes_sent`, `$category`, `$error_code`, `$http_user_agent`.
    fn format_custom(&self, pattern: &str) -> String {
        // $request_time must be replaced before anything prefixed `$request`
        pattern
            .replace("$remote_addr", &self.remote_addr.ip().to_string())
            .replace("$time_local", &self.time.format(CLF_TIME).to_string())
            .replace("$time_iso8601", &self.time.to_rfc3339())
            .replace(
                "$request_time",
                &format!("{:.3}", self.elapsed.as_secs_f64()),
            )
            .replace("$request_method", &self.method)
            .replace("$request_uri", &self.request_uri())
            .replace("$status", &self.status.to_string())
            .replace("$body_bytes_sent", &self.body_bytes.to_string())
            .replace("$category", self.category)
            .replace("$error_code", &self.error_code_field())
            .replace(
                "$http_user_agent",
                self.user_agent.as_deref().unwrap_or("-"),
            )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_entry() -> AccessLogEntry {
        let mut entry = AccessLogEntry::new(
            "192.168.1.1:40000".parse().unwrap(),
            "POST",
            "/hide/msg",
        );
        entry.query = Some("v=2".to_string());
        entry.category = "message_payload";
        entry.body_bytes = 57;
        entry.error_code = Some(-13);
        entry.user_agent = Some("UnityPlayer/2021".to_string());
        entry.elapsed = Duration::from_micros(1600);
        entry
    }

    #[test]
    fn test_format_common() {
        let log = create_test_entry().format("common");
        assert!(log.starts_with("192.168.1.1 - - ["));
        assert!(log.contains("\"POST /hide/msg?v=2\" 200 57"));
        assert!(!log.contains("UnityPlayer"));
    }

    #[test]
    fn test_format_combined() {
        let log = create_test_entry().format("combined");
        assert!(log.contains("\"POST /hide/msg?v=2\" 200 57"));
        assert!(log.contains("\"UnityPlayer/2021\""));
        assert!(log.contains("message_payload -13 0.002"));
    }

    #[test]
    fn test_format_json() {
        let log = create_test_entry().format("json");
        let value: serde_json::Value = serde_json::from_str(&log).unwrap();
        assert_eq!(value["remote_addr"], "192.168.1.1:40000");
        assert_eq!(value["error_code"], -13);
        assert_eq!(value["request_time_us"], 1600);
        assert_eq!(value["query"], "v=2");
    }

    #[test]
    fn test_format_custom() {
        let mut entry = create_test_entry();
        entry.error_code = None;
        let log = entry.format("$request_method $request_uri -> $status ($error_code) $request_time");
        assert_eq!(log, "POST /hide/msg?v=2 -> 200 (-) 0.002");
    }
}
