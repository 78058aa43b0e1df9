//! Static file serving module
//!
//! Loads version descriptors and route documents. A missing version or route
//! file is `Ok(None)`, which the router turns into a redirect; everything else
//! that goes wrong is a [`GatewayError`].

use crate::handler::error::GatewayError;
use crate::handler::resolver::FileResolver;
use crate::handler::router::RouteCategory;
use crate::logger;
use hyper::body::Bytes;

/// Load `versions/<basename>`, rejecting content shorter than `min_len`
pub async fn load_version_file(
    resolver: &FileResolver,
    request_path: &str,
    min_len: usize,
) -> Result<Option<Bytes>, GatewayError> {
    let resolved = resolver
        .resolve(RouteCategory::VersionFile, request_path)
        .await;
    if !resolved.exists {
        logger::log_debug(&format!("Version file not found: {}", resolved.path.display()));
        return Ok(None);
    }

    let content = tokio::fs::read(&resolved.path).await.map_err(|source| {
        GatewayError::VersionFileUnreadable {
            path: resolved.path.clone(),
            source,
        }
    })?;

    if content.len() < min_len {
        return Err(GatewayError::VersionFileTooShort {
            path: resolved.path,
            len: content.len(),
            min: min_len,
        });
    }

    Ok(Some(Bytes::from(content)))
}

/// Load `route/<basename>`
pub async fn load_route_file(
    resolver: &FileResolver,
    request_path: &str,
) -> Result<Option<Bytes>, GatewayError> {
    let resolved = resolver.resolve(RouteCategory::RouteFile, request_path).await;
    if !resolved.exists {
        logger::log_debug(&format!("Route file not found: {}", resolved.path.display()));
        return Ok(None);
    }

    match tokio::fs::read(&resolved.path).await {
        Ok(content) => Ok(Some(Bytes::from(content))),
        Err(source) => Err(GatewayError::RouteFileUnreadable {
            path: resolved.path,
            source,
        }),
    }
}

/// Load the dedicated route file served for `/hide/route.*`
///
/// Unlike other route files, a missing manifest is an error envelope, not a redirect.
pub async fn load_route_manifest(
    resolver: &FileResolver,
    request_path: &str,
) -> Result<Bytes, GatewayError> {
    let resolved = resolver
        .resolve(RouteCategory::RouteManifest, request_path)
        .await;
    if !resolved.exists {
        return Err(GatewayError::RouteManifestMissing(resolved.path));
    }

    let content = tokio::fs::read(&resolved.path).await.map_err(|source| {
        GatewayError::RouteFileUnreadable {
            path: resolved.path.clone(),
            source,
        }
    })?;

    if content.is_empty() {
        return Err(GatewayError::RouteManifestEmpty(resolved.path));
    }
    Ok(Bytes::from(content))
}
