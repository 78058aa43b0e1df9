// Configuration module entry point
// Loads the immutable gateway configuration at startup

mod types;

use std::net::SocketAddr;

// Re-export public types
pub use types::{Config, GatewayConfig, PerformanceConfig};

/// Default config file name (without extension)
const DEFAULT_CONFIG_PATH: &str = "config";

/// Environment variable prefix, e.g. `GATEWAY_SERVER__PORT=9000`
const ENV_PREFIX: &str = "GATEWAY";

impl Config {
    /// Load configuration, taking the file path from the first CLI argument
    pub fn load() -> Result<Self, config::ConfigError> {
        let path = std::env::args()
            .nth(1)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(&path)
    }

    /// Load configuration from specified file path (extension optional)
    ///
    /// A missing file is not an error; every key has a default.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::types::DEFAULT_REDIRECT_URL;
    use super::*;
    use std::path::Path;

    #[test]
    fn test_missing_file_uses_defaults() {
        let cfg = Config::load_from("/nonexistent/gateway-config").unwrap();
        assert_eq!(cfg.gateway.min_version_bytes, 15);
        assert_eq!(cfg.gateway.redirect_url, DEFAULT_REDIRECT_URL);
        assert_eq!(cfg.gateway.versions_dir, "versions");
        assert!(cfg.logging.access_log);
    }

    #[test]
    fn test_load_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gateway.toml");
        std::fs::write(
            &path,
            "[server]\nport = 9100\n\n[gateway]\nroot_dir = \"/srv/hide\"\nmin_version_bytes = 32\n",
        )
        .unwrap();

        let cfg = Config::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.server.port, 9100);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.gateway.min_version_bytes, 32);
        assert_eq!(cfg.gateway.versions_path(), Path::new("/srv/hide/versions"));
        assert_eq!(cfg.gateway.http_dir, "http");
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::default();
        cfg.server.host = "127.0.0.1".to_string();
        assert_eq!(cfg.get_socket_addr().unwrap().port(), 8089);

        cfg.server.host = "not an ip".to_string();
        assert!(cfg.get_socket_addr().is_err());
    }

    #[test]
    fn test_error_template_disabled_by_default() {
        let mut gateway = GatewayConfig::default();
        assert_eq!(gateway.error_template_path(), None);

        gateway.error_template = "http/error.json".to_string();
        assert_eq!(
            gateway.error_template_path(),
            Some(Path::new(".").join("http/error.json"))
        );
    }

    #[test]
    fn test_content_dirs_include_route_file_parent() {
        let gateway = GatewayConfig {
            root_dir: "/data".to_string(),
            ..GatewayConfig::default()
        };
        let dirs = gateway.content_dirs();
        assert!(dirs.contains(&Path::new("/data/versions").to_path_buf()));
        assert!(dirs.contains(&Path::new("/data/http/route").to_path_buf()));
        assert_eq!(dirs.len(), 4);
    }
}
