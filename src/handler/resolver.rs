//! File resolution module
//!
//! Maps a request path and dispatch category to a file under one of the fixed
//! content directories. The path is percent-decoded first, then only its last
//! segment is ever used, so no request can name a file outside its base directory.

use crate::config::GatewayConfig;
use crate::handler::router::RouteCategory;
use percent_encoding::percent_decode_str;
use std::path::{Path, PathBuf};

/// Result of resolving a request against the filesystem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    pub path: PathBuf,
    /// True only for an existing regular file
    pub exists: bool,
}

impl ResolvedFile {
    const fn missing(path: PathBuf) -> Self {
        Self {
            path,
            exists: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FileResolver {
    versions_dir: PathBuf,
    route_dir: PathBuf,
    http_dir: PathBuf,
    route_file: PathBuf,
}

impl FileResolver {
    pub fn new(config: &GatewayConfig) -> Self {
        Self {
            versions_dir: config.versions_path(),
            route_dir: config.route_path(),
            http_dir: config.http_path(),
            route_file: config.route_file_path(),
        }
    }

    /// Compute the target path without touching the filesystem
    ///
    /// For [`RouteCategory::MessagePayload`] `request_path` is the message id.
    /// Returns `None` when the request names no usable file, including paths
    /// that are not valid UTF-8 once decoded.
    pub fn locate(&self, category: RouteCategory, request_path: &str) -> Option<PathBuf> {
        match category {
            RouteCategory::VersionFile => {
                decoded_basename(request_path).map(|n| self.versions_dir.join(n))
            }
            RouteCategory::RouteFile => {
                decoded_basename(request_path).map(|n| self.route_dir.join(n))
            }
            RouteCategory::RouteManifest => Some(self.route_file.clone()),
            RouteCategory::MessagePayload => {
                decoded_basename(request_path).map(|id| self.http_dir.join(format!("{id}.json")))
            }
            RouteCategory::Unmatched => None,
        }
    }

    /// Locate and stat the target
    pub async fn resolve(&self, category: RouteCategory, request_path: &str) -> ResolvedFile {
        let Some(path) = self.locate(category, request_path) else {
            return ResolvedFile::missing(self.base_dir(category).to_path_buf());
        };

        let exists = tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_file());
        ResolvedFile { path, exists }
    }

    /// Payload file for a parsed message id
    pub async fn resolve_payload(&self, msg_id: i64) -> ResolvedFile {
        self.resolve(RouteCategory::MessagePayload, &msg_id.to_string())
            .await
    }

    fn base_dir(&self, category: RouteCategory) -> &Path {
        match category {
            RouteCategory::VersionFile => &self.versions_dir,
            RouteCategory::RouteFile => &self.route_dir,
            RouteCategory::RouteManifest => &self.route_file,
            RouteCategory::MessagePayload => &self.http_dir,
            RouteCategory::Unmatched => Path::new(""),
        }
    }
}

/// Percent-decode `path`, then take its [`basename`]
///
/// Decoding happens before the split, so `..%2F..%2Fx` still reduces to `x`.
fn decoded_basename(path: &str) -> Option<String> {
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    basename(&decoded).map(ToString::to_string)
}

/// Final path segment of a request path
///
/// Trailing slashes are dropped first, so `/hide/versions/` yields `versions`.
/// Both `/` and `\` count as separators. Empty, `.` and `..` yield `None`.
pub fn basename(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches(['/', '\\']);
    let name = trimmed.rsplit(['/', '\\']).next()?;
    match name {
        "" | "." | ".." => None,
        name if name.contains('\0') => None,
        name => Some(name),
    }
}
