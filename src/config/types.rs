// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Built once at startup and shared read-only with every connection.
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub gateway: GatewayConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8089,
            workers: None,
        }
    }
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    /// Minimum level: error, warn, info or debug
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    pub error_log_file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            access_log: true,
            access_log_format: "combined".to_string(),
            access_log_file: None,
            error_log_file: None,
        }
    }
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PerformanceConfig {
    /// Seconds a keep-alive connection may stay open; 0 disables keep-alive
    pub keep_alive_timeout: u64,
    pub read_timeout: u64,
    pub write_timeout: u64,
    pub max_connections: Option<u64>,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            keep_alive_timeout: 75,
            read_timeout: 30,
            write_timeout: 30,
            max_connections: None,
        }
    }
}

pub const DEFAULT_REDIRECT_URL: &str =
    "https://update.version.brmyx.com/dmm_share/index.html?bundle=com.bairimeng.dmmdzz.betazone";

/// Content sources and dispatch behaviour
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GatewayConfig {
    /// Base for every relative directory below
    pub root_dir: String,
    pub versions_dir: String,
    pub route_dir: String,
    pub http_dir: String,
    /// File served for `/hide/route.*`
    pub route_file: String,
    /// Error envelope template relative to `root_dir`; empty disables it
    pub error_template: String,
    pub redirect_url: String,
    /// Version files shorter than this are rejected
    pub min_version_bytes: usize,
    pub max_body_size: usize,
    /// Create the content directories at startup
    pub create_dirs: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            root_dir: ".".to_string(),
            versions_dir: "versions".to_string(),
            route_dir: "route".to_string(),
            http_dir: "http".to_string(),
            route_file: "http/route/route.xml".to_string(),
            error_template: String::new(),
            redirect_url: DEFAULT_REDIRECT_URL.to_string(),
            min_version_bytes: 15,
            max_body_size: 1_048_576,
            create_dirs: true,
        }
    }
}

impl GatewayConfig {
    fn under_root(&self, rel: &str) -> PathBuf {
        Path::new(&self.root_dir).join(rel)
    }

    pub fn versions_path(&self) -> PathBuf {
        self.under_root(&self.versions_dir)
    }

    pub fn route_path(&self) -> PathBuf {
        self.under_root(&self.route_dir)
    }

    pub fn http_path(&self) -> PathBuf {
        self.under_root(&self.http_dir)
    }

    pub fn route_file_path(&self) -> PathBuf {
        self.under_root(&self.route_file)
    }

    pub fn error_template_path(&self) -> Option<PathBuf> {
        if self.error_template.is_empty() {
            None
        } else {
            Some(self.under_root(&self.error_template))
        }
    }

    /// Directories created at startup when `create_dirs` is set
    pub fn content_dirs(&self) -> Vec<PathBuf> {
        let mut dirs = vec![self.versions_path(), self.route_path(), self.http_path()];
        if let Some(parent) = self.route_file_path().parent() {
            let parent = parent.to_path_buf();
            if !dirs.contains(&parent) {
                dirs.push(parent);
            }
        }
        dirs
    }
}
