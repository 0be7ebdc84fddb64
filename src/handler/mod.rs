//! Request handler module
//!
//! Routes requests to the listing and record handlers and wraps them in the
//! middleware chain: panic recovery, request logging, header decoration.

pub mod middleware;
pub mod records;
pub mod router;

// Re-export main entry point
pub use router::handle_request;
