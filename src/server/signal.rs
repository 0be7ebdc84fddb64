// Signal handling module
//
// Supported signals:
// - SIGTERM: shutdown
// - SIGINT:  shutdown (Ctrl+C)

/// Wait until the process is asked to stop and return the signal's name.
#[cfg(unix)]
pub async fn wait_for_shutdown() -> std::io::Result<&'static str> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => Ok("SIGTERM"),
        _ = sigint.recv() => Ok("SIGINT"),
    }
}

/// Windows fallback: only Ctrl+C is delivered
#[cfg(not(unix))]
pub async fn wait_for_shutdown() -> std::io::Result<&'static str> {
    tokio::signal::ctrl_c().await?;
    Ok("Ctrl+C")
}
