//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from file
//! resolution: the response header layer, MIME guessing, HTTP dates and
//! response builders.

pub mod cors;
pub mod date;
pub mod mime;
pub mod response;

// Re-export commonly used types
pub use cors::{append_cors_headers, CorsHeaders};
pub use response::{
    build_304_response, build_404_response, build_501_response, build_error_response,
    build_file_response, build_html_response, build_redirect_response,
};
