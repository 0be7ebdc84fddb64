//! Response header decorators
//!
//! Each decorator is a plain function that takes the response by value and
//! returns it with extra headers. `decorate` applies them left to right.

use hyper::header::{
    HeaderName, HeaderValue, CONNECTION, CONTENT_SECURITY_POLICY, REFERRER_POLICY, SERVER,
    X_CONTENT_TYPE_OPTIONS, X_FRAME_OPTIONS, X_XSS_PROTECTION,
};
use hyper::Response;

use super::response::Body;
use crate::config::HttpConfig;

pub const CONTENT_SECURITY_POLICY_VALUE: &str =
    "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com";

/// Static security headers set on every response
pub const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (CONTENT_SECURITY_POLICY, CONTENT_SECURITY_POLICY_VALUE),
    (REFERRER_POLICY, "origin-when-cross-origin"),
    (X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (X_FRAME_OPTIONS, "deny"),
    (X_XSS_PROTECTION, "0"),
];

/// A response decorator
pub type Decorator = fn(&HttpConfig, Response<Body>) -> Response<Body>;

/// Decorators applied to every response, in order
pub const DECORATORS: &[Decorator] = &[security_headers, server_header];

/// Apply every decorator in `DECORATORS` to `response`
pub fn decorate(config: &HttpConfig, response: Response<Body>) -> Response<Body> {
    DECORATORS
        .iter()
        .fold(response, |response, decorator| decorator(config, response))
}

pub fn security_headers(_config: &HttpConfig, mut response: Response<Body>) -> Response<Body> {
    let headers = response.headers_mut();
    for (name, value) in SECURITY_HEADERS {
        headers.insert(name, HeaderValue::from_static(value));
    }
    response
}

pub fn server_header(config: &HttpConfig, mut response: Response<Body>) -> Response<Body> {
    if let Ok(value) = HeaderValue::from_str(&config.server_name) {
        response.headers_mut().insert(SERVER, value);
    }
    response
}

/// Mark the connection for closing after this response
pub fn connection_close(mut response: Response<Body>) -> Response<Body> {
    response
        .headers_mut()
        .insert(CONNECTION, HeaderValue::from_static("close"));
    response
}
