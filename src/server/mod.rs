// Server module entry point
// Listener setup, the accept loop, per-connection serving and shutdown signals

pub mod connection;
pub mod listener;
pub mod signal;

// `loop` is a keyword, so the module is named server_loop
#[path = "loop.rs"]
pub mod server_loop;

pub use listener::create_listener;
pub use server_loop::start_server_loop;
pub use signal::wait_for_shutdown;
