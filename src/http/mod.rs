//! HTTP protocol layer module
//!
//! Provides response construction, decoupled from the dispatch rules in `handler`.

pub mod response;

// Re-export commonly used builders
pub use response::{
    build_404_response, build_json_response, build_redirect_response, build_xml_response,
};
