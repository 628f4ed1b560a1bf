/// Real-time subscriber fan-out
///
/// - `hub`: subscriber registry, bounded per-subscriber queues
/// - `message`: `{type, data}` envelope and typed payloads
/// - `metrics`: delivery counters
pub mod hub;
pub mod message;
pub mod metrics;

pub use hub::{BroadcastHub, SubscriberId};
pub use message::{Envelope, MessageType};
pub use metrics::HubMetricsSnapshot;
