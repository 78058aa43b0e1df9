//! Request handler module
//!
//! Responsible for request classification, content lookup and error envelopes.

pub mod error;
pub mod payload;
pub mod resolver;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::Dispatcher;
