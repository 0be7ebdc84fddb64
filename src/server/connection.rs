// Connection handling module
// Accepts a single TCP connection and serves HTTP/1.1 on it

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::{TokioIo, TokioTimer};
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::config::AppState;
use crate::handler;
use crate::logger;

/// Accept a connection, enforcing `performance.max_connections`.
///
/// Returns `false` when the connection was rejected.
pub fn accept_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: &Arc<AppState>,
    conn_counter: &Arc<AtomicUsize>,
) -> bool {
    // Increment first, then check, so concurrent accepts cannot overshoot
    let prev_count = conn_counter.fetch_add(1, Ordering::SeqCst);

    if let Some(max_conn) = state.config.performance.max_connections {
        if prev_count >= usize::try_from(max_conn).unwrap_or(usize::MAX) {
            conn_counter.fetch_sub(1, Ordering::SeqCst);
            logger::log_warning(&format!(
                "Max connections reached: {prev_count}/{max_conn}. \
                 Connection from {peer_addr} rejected."
            ));
            drop(stream);
            return false;
        }
    }

    logger::log_connection_accepted(&peer_addr);
    handle_connection(stream, peer_addr, Arc::clone(state), Arc::clone(conn_counter));
    true
}

/// Request activity on one connection, used to find when it went idle
struct Activity {
    in_flight: AtomicUsize,
    last_active: Mutex<Instant>,
}

impl Activity {
    fn new() -> Self {
        Self {
            in_flight: AtomicUsize::new(0),
            last_active: Mutex::new(Instant::now()),
        }
    }

    fn begin(self: &Arc<Self>) -> ActivityGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        self.touch();
        ActivityGuard(Arc::clone(self))
    }

    fn touch(&self) {
        if let Ok(mut last) = self.last_active.lock() {
            *last = Instant::now();
        }
    }

    fn last_active(&self) -> Instant {
        self.last_active
            .lock()
            .map_or_else(|_| Instant::now(), |last| *last)
    }

    /// When the connection becomes idle for `idle_timeout` if nothing else happens
    fn idle_deadline(&self, idle_timeout: Duration) -> Instant {
        if self.in_flight.load(Ordering::SeqCst) > 0 {
            Instant::now() + idle_timeout
        } else {
            self.last_active() + idle_timeout
        }
    }

    fn is_idle_for(&self, idle_timeout: Duration) -> bool {
        self.in_flight.load(Ordering::SeqCst) == 0
            && self.last_active().elapsed() >= idle_timeout
    }
}

/// Marks one request as in flight until dropped
struct ActivityGuard(Arc<Activity>);

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.0.touch();
        self.0.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Serve a connection on its own task.
///
/// Header reads are bounded by `read_timeout` and each handler by
/// `write_timeout`. A connection with no request in flight for
/// `idle_timeout` is shut down gracefully; busy keep-alive connections
/// are never cut off. An `idle_timeout` of zero disables the idle bound.
fn handle_connection(
    stream: TcpStream,
    peer_addr: SocketAddr,
    state: Arc<AppState>,
    conn_counter: Arc<AtomicUsize>,
) {
    tokio::spawn(async move {
        let io = TokioIo::new(stream);
        let performance = &state.config.performance;
        let read_timeout = Duration::from_secs(performance.read_timeout);
        let idle_timeout = Duration::from_secs(performance.idle_timeout);

        let mut builder = http1::Builder::new();
        builder
            .timer(TokioTimer::new())
            .header_read_timeout(read_timeout)
            .keep_alive(true);

        let activity = Arc::new(Activity::new());
        let service_state = Arc::clone(&state);
        let service_activity = Arc::clone(&activity);
        let conn = builder.serve_connection(
            io,
            service_fn(move |req| {
                let guard = service_activity.begin();
                let response =
                    handler::handle_request(req, peer_addr, Arc::clone(&service_state));
                async move {
                    let response = response.await;
                    drop(guard);
                    response
                }
            }),
        );
        tokio::pin!(conn);

        // Zero disables the idle bound
        let result = loop {
            if idle_timeout.is_zero() {
                break conn.as_mut().await;
            }
            let deadline = activity.idle_deadline(idle_timeout);
            tokio::select! {
                result = conn.as_mut() => break result,
                () = tokio::time::sleep_until(deadline) => {
                    if activity.is_idle_for(idle_timeout) {
                        logger::log_debug(&format!(
                            "Closing connection from {peer_addr} after {} idle seconds",
                            idle_timeout.as_secs()
                        ));
                        conn.as_mut().graceful_shutdown();
                        break conn.as_mut().await;
                    }
                }
            }
        };

        if let Err(err) = result {
            logger::log_connection_error(&err);
        }

        conn_counter.fetch_sub(1, Ordering::SeqCst);
    });
}
