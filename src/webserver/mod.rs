/// HTTP + WebSocket surface over the holder service
///
/// - `routes`: REST endpoints, webhook receiver, `/ws` upgrade
/// - `ws`: per-connection loop and heartbeat tracking
/// - `utils`: response helpers and error-to-status mapping
mod server;

pub mod routes;
pub mod state;
pub mod utils;
pub mod ws;

// Public API for starting/stopping the webserver
pub use server::{shutdown, start_server};
