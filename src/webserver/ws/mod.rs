/// Per-connection subscriber handling
///
/// Fan-out and queues live in `crate::broadcast`; this module only bridges a
/// hub subscription onto one WebSocket.
pub mod connection;
pub mod health;
