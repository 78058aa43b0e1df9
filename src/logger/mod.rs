//! Logger module
//!
//! Provides logging utilities for the gateway including:
//! - Server lifecycle logging
//! - Per-request logging before dispatch and access logging after it
//! - Error and warning logging with a minimum level
//! - File-based logging support

mod format;
pub mod writer;

pub use format::AccessLogEntry;

use crate::config::Config;
use chrono::Local;
use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::OnceLock;

static LOG_LEVEL: OnceLock<Level> = OnceLock::new();

/// Log severity, ordered from most to least severe
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error,
    Warn,
    Info,
    Debug,
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" | "trace" => Ok(Self::Debug),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = config
        .logging
        .level
        .parse::<Level>()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let _ = LOG_LEVEL.set(level);

    writer::init(
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

fn enabled(level: Level) -> bool {
    level <= *LOG_LEVEL.get().unwrap_or(&Level::Info)
}

fn stamp(tag: &str, message: &str) -> String {
    format!("{} [{tag}] {message}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
}

/// Write to info/access log
fn write_info(message: &str) {
    match writer::get() {
        Some(w) => w.write_access(message),
        None => println!("{message}"),
    }
}

/// Write to error log
fn write_error(message: &str) {
    match writer::get() {
        Some(w) => w.write_error(message),
        None => eprintln!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    let gateway = &config.gateway;
    log_info("======================================");
    log_info("Gateway started successfully");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    log_info(&format!("Versions dir: {}", gateway.versions_path().display()));
    log_info(&format!("Route dir: {}", gateway.route_path().display()));
    log_info(&format!("Payload dir: {}", gateway.http_path().display()));
    log_info(&format!("Redirect URL: {}", gateway.redirect_url));
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    log_info("======================================");
}

pub fn log_info(message: &str) {
    if enabled(Level::Info) {
        write_info(&stamp("INFO", message));
    }
}

pub fn log_debug(message: &str) {
    if enabled(Level::Debug) {
        write_info(&stamp("DEBUG", message));
    }
}

pub fn log_warning(message: &str) {
    if enabled(Level::Warn) {
        write_error(&stamp("WARN", message));
    }
}

pub fn log_error(message: &str) {
    write_error(&stamp("ERROR", message));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Display) {
    log_warning(&format!("Failed to serve connection: {err}"));
}

/// Logged as soon as a request arrives, before dispatch
pub fn log_request_received(method: &str, path: &str, remote: &SocketAddr) {
    log_info(&format!("[Request] {method} {path} from {remote}"));
}

/// Log formatted access log entry
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    match writer::get() {
        Some(w) => w.write_access(&entry.format(format)),
        None => println!("{}", entry.format(format)),
    }
}
