//! HTTP response building module
//!
//! Provides builders for the JSON success bodies and the plain-text error
//! bodies, decoupled from specific business logic.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE};
use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::error::RequestError;

/// Response body type used throughout the server
pub type Body = Full<Bytes>;

const JSON_CONTENT_TYPE: &str = "application/json";
const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Build a JSON response from bytes that are already valid JSON
pub fn build_json_response(
    status: StatusCode,
    data: impl Into<Bytes>,
    is_head: bool,
) -> Response<Body> {
    let data = data.into();
    let content_length = data.len();
    let body = if is_head { Bytes::new() } else { data };

    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
        .header(CONTENT_LENGTH, content_length)
        .body(Full::new(body))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            Response::new(Full::new(Bytes::new()))
        })
}

/// Serialize `value` and build a JSON response
///
/// The body ends with a newline. Serialization happens before anything is
/// written, so a failure never produces a partial body.
pub fn build_json_value_response<T: Serialize>(
    status: StatusCode,
    value: &T,
    is_head: bool,
) -> Result<Response<Body>, RequestError> {
    let mut json = serde_json::to_vec(value)?;
    json.push(b'\n');
    Ok(build_json_response(status, json, is_head))
}

fn build_text_response(status: StatusCode, message: &str) -> Response<Body> {
    let body = format!("{message}\n");
    Response::builder()
        .status(status)
        .header(CONTENT_TYPE, TEXT_CONTENT_TYPE)
        .header(CONTENT_LENGTH, body.len())
        .body(Full::new(Bytes::from(body)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            let mut fallback = Response::new(Full::new(Bytes::from(message.to_string())));
            *fallback.status_mut() = status;
            fallback
        })
}

/// Build 400 Bad Request response
pub fn build_400_response(message: &str) -> Response<Body> {
    build_text_response(StatusCode::BAD_REQUEST, message)
}

/// Build 404 Not Found response
pub fn build_404_response() -> Response<Body> {
    build_text_response(StatusCode::NOT_FOUND, "404 page not found")
}

/// Build 405 Method Not Allowed response
pub fn build_405_response() -> Response<Body> {
    let mut response = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed");
    response
        .headers_mut()
        .insert(ALLOW, hyper::header::HeaderValue::from_static("GET, HEAD"));
    response
}

/// Build the generic 500 response; error details stay in the logs
pub fn build_500_response() -> Response<Body> {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
