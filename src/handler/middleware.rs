//! Request middleware
//!
//! Panic recovery, request logging and error-to-response conversion
//! wrapped around every route handler.

use std::any::Any;
use std::future::Future;
use std::time::Duration;

use hyper::Response;

use super::router::RequestContext;
use crate::config::AppState;
use crate::error::RequestError;
use crate::http::{build_500_response, headers::connection_close, Body};
use crate::logger::{self, RequestLogEntry};

/// Run `handler` on its own task so a panic cannot take the connection's
/// task down with it.
///
/// A panic or a handler running past `limit` becomes a 500. After a panic
/// the connection is closed, since the handler may have stopped midway.
pub async fn recover_panic<F>(ctx: &RequestContext, limit: Duration, handler: F) -> Response<Body>
where
    F: Future<Output = Response<Body>> + Send + 'static,
{
    let mut task = tokio::spawn(handler);
    match tokio::time::timeout(limit, &mut task).await {
        Ok(Ok(response)) => response,
        Ok(Err(join_err)) => {
            let message = if join_err.is_panic() {
                panic_message(join_err.into_panic().as_ref())
            } else {
                "handler task cancelled".to_string()
            };
            server_error(ctx, &RequestError::Panic(message));
            connection_close(build_500_response())
        }
        Err(_) => {
            task.abort();
            server_error(ctx, &RequestError::Timeout(limit.as_secs()))
        }
    }
}

/// Extract the message from a panic payload
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Write the access log line for a received request
pub fn log_request(ctx: &RequestContext, state: &AppState) {
    if !state.access_log() {
        return;
    }
    let entry = RequestLogEntry::new(
        ctx.remote_addr.to_string(),
        ctx.method.to_string(),
        ctx.uri.clone(),
        ctx.proto.clone(),
    );
    logger::log_request(&entry, &state.config.logging.request_log_format);
}

/// Log `err` with its request context and build the generic 500
pub fn server_error(ctx: &RequestContext, err: &RequestError) -> Response<Body> {
    logger::log_request_error(ctx.method.as_str(), &ctx.uri, err);
    build_500_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use hyper::header::CONNECTION;
    use hyper::{Method, StatusCode};

    fn context() -> RequestContext {
        RequestContext {
            method: Method::GET,
            path: "/boom".to_string(),
            uri: "/boom".to_string(),
            proto: "HTTP/1.1".to_string(),
            remote_addr: "127.0.0.1:1".parse().unwrap(),
            is_head: false,
        }
    }

    async fn exploding_handler() -> Response<Body> {
        panic!("handler exploded");
    }

    #[tokio::test]
    async fn test_panic_becomes_500_and_next_request_succeeds() {
        let ctx = context();
        let limit = Duration::from_secs(5);

        let response = recover_panic(&ctx, limit, exploding_handler()).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[CONNECTION], "close");
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(body, "Internal Server Error\n");

        let response = recover_panic(&ctx, limit, async {
            crate::http::build_json_response(StatusCode::OK, "{}", false)
        })
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(CONNECTION).is_none());
    }

    #[tokio::test]
    async fn test_slow_handler_times_out() {
        let response = recover_panic(&context(), Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            crate::http::build_json_response(StatusCode::OK, "{}", false)
        })
        .await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("static message");
        assert_eq!(panic_message(payload.as_ref()), "static message");
        let payload: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(payload.as_ref()), "owned");
        let payload: Box<dyn Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }
}
