//! HTTP protocol layer module
//!
//! Response builders and the header decorators applied to every response,
//! decoupled from the record handlers.

pub mod headers;
pub mod response;

// Re-export commonly used types
pub use headers::{decorate, Decorator, DECORATORS};
pub use response::{
    build_400_response, build_404_response, build_405_response, build_500_response,
    build_json_response, build_json_value_response, Body,
};
