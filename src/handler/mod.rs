//! Request handler module
//!
//! Maps requests onto the served directory: dispatch, path translation,
//! file serving and directory listings.

pub mod listing;
pub mod path;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
