//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: classifies each request by method
//! and path prefix, loads the matching content, and shapes the response.
//!
//! | Method | Path                                  | Category        |
//! |--------|---------------------------------------|-----------------|
//! | GET    | `/hide/version/*`, `/hide/versions/*` | `VersionFile`   |
//! | GET    | `/hide/route.*`                       | `RouteManifest` |
//! | GET    | `/hide/*`                             | `RouteFile`     |
//! | POST   | any                                   | `MessagePayload`|
//! | other  | any                                   | `Unmatched`     |

use crate::config::Config;
use crate::handler::error::{ErrorResponder, GatewayError};
use crate::handler::resolver::FileResolver;
use crate::handler::{payload, static_files};
use crate::http;
use crate::logger::{self, AccessLogEntry};
use http_body_util::Full;
use hyper::body::{Body, Bytes};
use hyper::{Method, Request, Response};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

const VERSION_PREFIXES: [&str; 2] = ["/hide/version/", "/hide/versions/"];
const ROUTE_MANIFEST_PREFIX: &str = "/hide/route.";
const HIDE_PREFIX: &str = "/hide/";

/// What a request is asking for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteCategory {
    VersionFile,
    RouteFile,
    RouteManifest,
    MessagePayload,
    Unmatched,
}

impl RouteCategory {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::VersionFile => "version_file",
            Self::RouteFile => "route_file",
            Self::RouteManifest => "route_manifest",
            Self::MessagePayload => "message_payload",
            Self::Unmatched => "unmatched",
        }
    }
}

/// Classify a request; first match wins
pub fn classify(method: &Method, path: &str) -> RouteCategory {
    if *method == Method::POST {
        return RouteCategory::MessagePayload;
    }
    if *method != Method::GET {
        return RouteCategory::Unmatched;
    }

    if VERSION_PREFIXES.iter().any(|p| path.starts_with(p)) {
        RouteCategory::VersionFile
    } else if path.starts_with(ROUTE_MANIFEST_PREFIX) {
        RouteCategory::RouteManifest
    } else if path.starts_with(HIDE_PREFIX) {
        RouteCategory::RouteFile
    } else {
        RouteCategory::Unmatched
    }
}

/// Outcome of a dispatched request, before it becomes a response
enum Reply {
    Xml(Bytes),
    Json(Bytes),
    Redirect,
    NotFound,
    Failed(GatewayError),
}

/// Top-level request handler, shared by every connection
pub struct Dispatcher {
    config: Arc<Config>,
    resolver: FileResolver,
    errors: ErrorResponder,
}

impl Dispatcher {
    pub fn new(config: Arc<Config>) -> Self {
        let resolver = FileResolver::new(&config.gateway);
        let errors = ErrorResponder::new(config.gateway.error_template_path());
        Self {
            config,
            resolver,
            errors,
        }
    }

    /// Handle one request; never fails, every error becomes a response
    pub async fn handle<B>(&self, req: Request<B>, remote: SocketAddr) -> Response<Full<Bytes>>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let started = Instant::now();
        let (parts, body) = req.into_parts();
        let path = parts.uri.path();
        logger::log_request_received(parts.method.as_str(), path, &remote);

        let mut entry = AccessLogEntry::new(remote, parts.method.as_str(), path);
        entry.query = parts.uri.query().map(ToString::to_string);
        entry.user_agent = parts
            .headers
            .get(hyper::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string);

        let category = classify(&parts.method, path);
        logger::log_debug(&format!("Classified {path} as {}", category.as_str()));

        let reply = self.dispatch(category, &parts.method, path, body).await;
        let (response, error_code) = self.render(reply).await;

        if self.config.logging.access_log {
            entry.category = category.as_str();
            entry.status = response.status().as_u16();
            entry.body_bytes = response.body().size_hint().exact().unwrap_or(0);
            entry.error_code = error_code;
            entry.elapsed = started.elapsed();
            logger::log_access(&entry, &self.config.logging.access_log_format);
        }

        response
    }

    async fn dispatch<B>(
        &self,
        category: RouteCategory,
        method: &Method,
        path: &str,
        body: B,
    ) -> Reply
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let gateway = &self.config.gateway;
        match category {
            RouteCategory::VersionFile => {
                match static_files::load_version_file(&self.resolver, path, gateway.min_version_bytes)
                    .await
                {
                    Ok(Some(content)) => Reply::Xml(content),
                    Ok(None) => Reply::Redirect,
                    Err(e) => Reply::Failed(e),
                }
            }
            RouteCategory::RouteFile => {
                match static_files::load_route_file(&self.resolver, path).await {
                    Ok(Some(content)) => Reply::Xml(content),
                    Ok(None) => Reply::Redirect,
                    Err(e) => Reply::Failed(e),
                }
            }
            RouteCategory::RouteManifest => {
                match static_files::load_route_manifest(&self.resolver, path).await {
                    Ok(content) => Reply::Xml(content),
                    Err(e) => Reply::Failed(e),
                }
            }
            RouteCategory::MessagePayload => match self.message_payload(body).await {
                Ok(content) => Reply::Json(content),
                Err(e) => Reply::Failed(e),
            },
            // Only GET falls through to the landing page
            RouteCategory::Unmatched if *method == Method::GET => Reply::Redirect,
            RouteCategory::Unmatched => Reply::NotFound,
        }
    }

    async fn message_payload<B>(&self, body: B) -> Result<Bytes, GatewayError>
    where
        B: Body<Data = Bytes>,
        B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        let raw = payload::read_body(body, self.config.gateway.max_body_size).await?;
        let message = payload::parse_body(&raw)?;
        logger::log_info(&message.log_line());
        payload::load_payload(&self.resolver, message.msg_id).await
    }

    async fn render(&self, reply: Reply) -> (Response<Full<Bytes>>, Option<i64>) {
        match reply {
            Reply::Xml(content) => (http::build_xml_response(content), None),
            Reply::Json(content) => (http::build_json_response(content), None),
            Reply::Redirect => (
                http::build_redirect_response(&self.config.gateway.redirect_url),
                None,
            ),
            Reply::NotFound => (http::build_404_response(), None),
            Reply::Failed(err) => {
                logger::log_warning(&err.to_string());
                let (body, code) = self.errors.render(&err).await;
                (http::build_json_response(body), Some(code))
            }
        }
    }
}
