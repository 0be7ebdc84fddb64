//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: method validation, route
//! matching and dispatching.
//!
//! | Method   | Path               | Handler             |
//! |----------|--------------------|---------------------|
//! | GET/HEAD | `/`                | list files          |
//! | GET/HEAD | `/{filename}`      | all records in file |
//! | GET/HEAD | `/{filename}/{id}` | one record by id    |

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hyper::{Method, Request, Response};

use crate::config::AppState;
use crate::handler::{middleware, records};
use crate::http::{self, Body};

/// Request context encapsulating information needed for request processing
#[derive(Debug, Clone)]
pub struct RequestContext {
    pub method: Method,
    pub path: String,
    /// Path and query, as received
    pub uri: String,
    pub proto: String,
    pub remote_addr: SocketAddr,
    pub is_head: bool,
}

impl RequestContext {
    pub fn from_request<B>(req: &Request<B>, remote_addr: SocketAddr) -> Self {
        let uri = req
            .uri()
            .path_and_query()
            .map_or_else(|| req.uri().path().to_string(), ToString::to_string);
        Self {
            method: req.method().clone(),
            path: req.uri().path().to_string(),
            uri,
            proto: format!("{:?}", req.version()),
            remote_addr,
            is_head: req.method() == Method::HEAD,
        }
    }
}

/// A matched route with its decoded path parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    ListFiles,
    AllRecords { filename: String },
    RecordById { filename: String, id: String },
}

/// Outcome of matching a method and path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    Matched(Route),
    BadRequest(&'static str),
    MethodNotAllowed,
    NotFound,
}

/// Main entry point for HTTP request handling
///
/// Every response, including those produced by panic recovery, passes
/// through the header decorators before it is returned.
pub async fn handle_request<B>(
    req: Request<B>,
    remote_addr: SocketAddr,
    state: Arc<AppState>,
) -> Result<Response<Body>, Infallible> {
    let ctx = RequestContext::from_request(&req, remote_addr);
    let write_timeout = Duration::from_secs(state.config.performance.write_timeout);

    let handler = {
        let ctx = ctx.clone();
        let state = Arc::clone(&state);
        async move {
            middleware::log_request(&ctx, &state);
            route_request(&ctx, &state).await
        }
    };

    let response = middleware::recover_panic(&ctx, write_timeout, handler).await;
    Ok(http::decorate(&state.config.http, response))
}

/// Dispatch a request to its handler
pub async fn route_request(ctx: &RequestContext, state: &AppState) -> Response<Body> {
    let route = match match_route(&ctx.method, &ctx.path) {
        RouteMatch::Matched(route) => route,
        RouteMatch::BadRequest(message) => return http::build_400_response(message),
        RouteMatch::MethodNotAllowed => return http::build_405_response(),
        RouteMatch::NotFound => return http::build_404_response(),
    };

    let result = match route {
        Route::ListFiles => records::list_files(ctx, state).await,
        Route::AllRecords { filename } => records::all_records(ctx, state, &filename).await,
        Route::RecordById { filename, id } => {
            records::record_by_id(ctx, state, &filename, &id).await
        }
    };

    result.unwrap_or_else(|err| middleware::server_error(ctx, &err))
}

/// Match a method and path against the three routes
pub fn match_route(method: &Method, path: &str) -> RouteMatch {
    let Some(rest) = path.strip_prefix('/') else {
        return RouteMatch::NotFound;
    };
    let segments: Vec<&str> = rest.split('/').collect();
    if segments.len() > 2 {
        return RouteMatch::NotFound;
    }

    if method != Method::GET && method != Method::HEAD {
        return RouteMatch::MethodNotAllowed;
    }

    match segments.as_slice() {
        [""] => RouteMatch::Matched(Route::ListFiles),
        [filename] => match decode_filename(filename) {
            Ok(filename) => RouteMatch::Matched(Route::AllRecords { filename }),
            Err(message) => RouteMatch::BadRequest(message),
        },
        [filename, id] => {
            let filename = match decode_filename(filename) {
                Ok(filename) => filename,
                Err(message) => return RouteMatch::BadRequest(message),
            };
            if id.is_empty() {
                return RouteMatch::BadRequest("Missing record ID");
            }
            match percent_decode(id) {
                Some(id) => RouteMatch::Matched(Route::RecordById { filename, id }),
                None => RouteMatch::BadRequest("Invalid record ID"),
            }
        }
        _ => RouteMatch::NotFound,
    }
}

/// Decode a file name segment and refuse anything that could leave the data root
fn decode_filename(segment: &str) -> Result<String, &'static str> {
    if segment.is_empty() {
        return Err("Missing file name");
    }
    let name = percent_decode(segment).ok_or("Invalid file name")?;
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err("Invalid file name");
    }
    Ok(name)
}

/// Decode `%XX` escapes; `None` for malformed escapes or non UTF-8 results
fn percent_decode(segment: &str) -> Option<String> {
    let bytes = segment.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = bytes.get(i + 1..i + 3)?;
            if !hex.iter().all(u8::is_ascii_hexdigit) {
                return None;
            }
            let hex = std::str::from_utf8(hex).ok()?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use http_body_util::BodyExt;
    use hyper::body::Bytes;
    use hyper::header::HeaderMap;
    use hyper::StatusCode;
    use tempfile::TempDir;

    const ITEMS: &str = r#"{"items":[{"id":1,"name":"a"},{"id":2,"name":"b"}]}"#;

    fn test_state(files: &[(&str, &str)]) -> (TempDir, Arc<AppState>) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let mut config = Config::defaults().unwrap();
        config.logging.access_log = false;
        let state = Arc::new(AppState::new(config, dir.path().to_path_buf()));
        (dir, state)
    }

    async fn send(
        state: &Arc<AppState>,
        method: Method,
        uri: &str,
    ) -> (StatusCode, HeaderMap, Bytes) {
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap();
        let addr: SocketAddr = "127.0.0.1:40000".parse().unwrap();
        let response = handle_request(req, addr, Arc::clone(state)).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, headers, body)
    }

    #[test]
    fn test_match_route() {
        let get = Method::GET;
        assert_eq!(match_route(&get, "/"), RouteMatch::Matched(Route::ListFiles));
        assert_eq!(
            match_route(&get, "/users"),
            RouteMatch::Matched(Route::AllRecords {
                filename: "users".to_string()
            })
        );
        assert_eq!(
            match_route(&Method::HEAD, "/users/7"),
            RouteMatch::Matched(Route::RecordById {
                filename: "users".to_string(),
                id: "7".to_string()
            })
        );
        assert_eq!(match_route(&get, "/a/b/c"), RouteMatch::NotFound);
        assert_eq!(match_route(&Method::POST, "/users"), RouteMatch::MethodNotAllowed);
        assert_eq!(match_route(&Method::POST, "/a/b/c"), RouteMatch::NotFound);
    }

    #[test]
    fn test_match_route_rejects_missing_segments() {
        let get = Method::GET;
        assert_eq!(
            match_route(&get, "/users/"),
            RouteMatch::BadRequest("Missing record ID")
        );
        assert_eq!(
            match_route(&get, "//7"),
            RouteMatch::BadRequest("Missing file name")
        );
    }

    #[test]
    fn test_match_route_decodes_and_guards_names() {
        let get = Method::GET;
        assert_eq!(
            match_route(&get, "/my%20data/a%2Fb"),
            RouteMatch::Matched(Route::RecordById {
                filename: "my data".to_string(),
                id: "a/b".to_string()
            })
        );
        assert_eq!(
            match_route(&get, "/..%2Fsecret"),
            RouteMatch::BadRequest("Invalid file name")
        );
        assert_eq!(match_route(&get, "/.."), RouteMatch::BadRequest("Invalid file name"));
        assert_eq!(match_route(&get, "/bad%zz"), RouteMatch::BadRequest("Invalid file name"));
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("plain"), Some("plain".to_string()));
        assert_eq!(percent_decode("%C3%BC"), Some("ü".to_string()));
        assert_eq!(percent_decode("%"), None);
        assert_eq!(percent_decode("%4"), None);
        assert_eq!(percent_decode("%FF"), None);
    }

    #[tokio::test]
    async fn test_list_files() {
        let (dir, state) = test_state(&[("items.json", ITEMS), (".hidden", "")]);
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let (status, headers, body) = send(&state, Method::GET, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-type"], "application/json");
        let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": "success", "files": [".hidden", "items.json"], "count": 2})
        );
    }

    #[tokio::test]
    async fn test_all_records_passthrough() {
        let raw = "{ \"items\" : [ {\"id\": 1} ] }\n";
        let (_dir, state) = test_state(&[("raw.json", raw)]);
        for uri in ["/raw", "/raw.json"] {
            let (status, headers, body) = send(&state, Method::GET, uri).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(headers["content-type"], "application/json");
            assert_eq!(body, raw.as_bytes());
        }
    }

    #[tokio::test]
    async fn test_record_by_id() {
        let (_dir, state) = test_state(&[("items.json", ITEMS)]);
        let (status, _, body) = send(&state, Method::GET, "/items/2").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{\"id\":2,\"name\":\"b\"}\n");

        let (status, _, body) = send(&state, Method::GET, "/items/99").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "{}\n");
    }

    #[tokio::test]
    async fn test_record_miss_status_is_configurable() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("items.json"), ITEMS).unwrap();
        let mut config = Config::defaults().unwrap();
        config.logging.access_log = false;
        config.http.record_not_found_status = true;
        let state = Arc::new(AppState::new(config, dir.path().to_path_buf()));

        let (status, _, body) = send(&state, Method::GET, "/items/99").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "{}\n");
        let (status, _, _) = send(&state, Method::GET, "/items/1").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_errors_are_generic_500() {
        let (_dir, state) = test_state(&[("broken.json", "{not valid}"), ("list.json", "[1]")]);
        for uri in ["/missing", "/missing/1", "/broken", "/broken/1", "/list/1"] {
            let (status, headers, body) = send(&state, Method::GET, uri).await;
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR, "uri {uri}");
            assert_eq!(body, "Internal Server Error\n");
            assert_eq!(headers["x-content-type-options"], "nosniff");
        }
    }

    #[tokio::test]
    async fn test_client_errors() {
        let (_dir, state) = test_state(&[("items.json", ITEMS)]);
        let (status, _, body) = send(&state, Method::GET, "/items/").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "Missing record ID\n");

        let (status, headers, _) = send(&state, Method::DELETE, "/items").await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(headers["allow"], "GET, HEAD");

        let (status, headers, body) = send(&state, Method::GET, "/a/b/c").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "404 page not found\n");
        assert_eq!(headers["server"], "getter");
    }

    #[tokio::test]
    async fn test_head_has_no_body() {
        let (_dir, state) = test_state(&[("items.json", ITEMS)]);
        let (status, headers, body) = send(&state, Method::HEAD, "/items").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(headers["content-length"], ITEMS.len().to_string());
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_security_headers_on_success() {
        let (_dir, state) = test_state(&[]);
        let (_, headers, _) = send(&state, Method::GET, "/").await;
        assert_eq!(headers["referrer-policy"], "origin-when-cross-origin");
        assert_eq!(headers["x-frame-options"], "deny");
        assert_eq!(headers["x-xss-protection"], "0");
        assert!(headers.contains_key("content-security-policy"));
    }
}
