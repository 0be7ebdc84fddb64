// Listener module
// Creates the TCP listener through socket2 so socket options can be set before bind

use std::net::SocketAddr;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::net::TcpListener;

use crate::error::StartupError;

/// Pending connection queue length passed to `listen(2)`
pub const BACKLOG: i32 = 128;

/// Create a `TcpListener` bound to `addr` with `SO_REUSEADDR` enabled.
///
/// Must be called from within a Tokio runtime.
pub fn create_listener(addr: SocketAddr) -> Result<TcpListener, StartupError> {
    bind(addr).map_err(|source| StartupError::Bind { addr, source })
}

fn bind(addr: SocketAddr) -> std::io::Result<TcpListener> {
    let domain = if addr.is_ipv4() {
        Domain::IPV4
    } else {
        Domain::IPV6
    };

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;

    // Allow rebinding while old connections sit in TIME_WAIT
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(BACKLOG)?;

    let std_listener: std::net::TcpListener = socket.into();
    TcpListener::from_std(std_listener)
}
