//! Record endpoints
//!
//! Each handler returns the finished response or the `RequestError` that
//! prevented it; the router turns errors into a generic 500.

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::router::RequestContext;
use crate::config::AppState;
use crate::error::RequestError;
use crate::files;
use crate::http::{build_json_response, build_json_value_response, Body};

/// Body of `GET /`
#[derive(Debug, Serialize)]
struct FileListing {
    status: &'static str,
    files: Vec<String>,
    count: usize,
}

/// `GET /`: names of the regular files in the data root
pub async fn list_files(
    ctx: &RequestContext,
    state: &AppState,
) -> Result<Response<Body>, RequestError> {
    let files = files::list_files_in_directory(state.store.root()).await?;
    let listing = FileListing {
        status: "success",
        count: files.len(),
        files,
    };
    build_json_value_response(StatusCode::OK, &listing, ctx.is_head)
}

/// `GET /{filename}`: the file's bytes, unchanged
pub async fn all_records(
    ctx: &RequestContext,
    state: &AppState,
    filename: &str,
) -> Result<Response<Body>, RequestError> {
    let raw = state.store.get_all_records(filename).await?;
    Ok(build_json_response(StatusCode::OK, raw, ctx.is_head))
}

/// `GET /{filename}/{id}`: the first record whose id matches, or `{}`
pub async fn record_by_id(
    ctx: &RequestContext,
    state: &AppState,
    filename: &str,
    id: &str,
) -> Result<Response<Body>, RequestError> {
    let lookup = state.store.get_record_by_id(filename, id).await?;
    let status = if lookup.is_found() || !state.config.http.record_not_found_status {
        StatusCode::OK
    } else {
        StatusCode::NOT_FOUND
    };
    build_json_value_response(status, &lookup.into_record(), ctx.is_head)
}
