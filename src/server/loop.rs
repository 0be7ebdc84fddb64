// Server loop module
// Accepts connections until a shutdown signal arrives

use std::future::Future;
use std::io;
use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use super::connection::accept_connection;
use crate::config::AppState;
use crate::error::StartupError;
use crate::logger;

/// Back-off after an accept error the listener can recover from
const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(50);

/// Run the accept loop until `shutdown` resolves.
///
/// Returns the shutdown reason on a clean stop, or the error that made the
/// listener unusable.
pub async fn start_server_loop<S>(
    listener: TcpListener,
    state: Arc<AppState>,
    shutdown: S,
) -> Result<&'static str, StartupError>
where
    S: Future<Output = io::Result<&'static str>>,
{
    let active_connections = Arc::new(AtomicUsize::new(0));
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, peer_addr)) => {
                        accept_connection(stream, peer_addr, &state, &active_connections);
                    }
                    Err(e) if is_transient(&e) => {
                        logger::log_warning(&format!("Failed to accept connection: {e}"));
                        tokio::time::sleep(ACCEPT_RETRY_DELAY).await;
                    }
                    Err(e) => return Err(StartupError::Listener(e)),
                }
            }

            reason = &mut shutdown => {
                let reason = reason.map_err(StartupError::Listener)?;
                logger::log_shutdown(reason);
                return Ok(reason);
            }
        }
    }
}

/// Accept errors tied to a single connection or to momentary resource limits
fn is_transient(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionRefused
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    ) || matches!(err.raw_os_error(), Some(23 | 24))
}
