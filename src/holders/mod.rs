/// Holder tracking core
///
/// Snapshot path: fetcher -> ledger reconcile -> projector -> broadcast
/// Incremental path: webhook events -> ledger -> projector -> broadcast
///
/// ## Key Components
/// - `fetcher`: provider fallback chain and capability traits
/// - `ledger`: holder/seller state, reconciliation and event application
/// - `events`: webhook transaction model and buy/sell classification
/// - `projector`: nice/naughty lists, stats, full state view
/// - `scheduler`: rate gate, single-flight guard, periodic timer
/// - `service`: owns everything above and the broadcast hub
pub mod events;
pub mod fetcher;
pub mod ledger;
pub mod projector;
pub mod scheduler;
pub mod service;
pub mod shame;
pub mod types;

#[cfg(test)]
mod tests;

pub use events::{HolderEvent, WebhookTransaction};
pub use fetcher::{FetchReport, FetchResult, HolderFetcher, HolderProvider, PoolResolver};
pub use ledger::{IngestOutcome, Ledger, ReconcileSummary};
pub use projector::{NaughtyListEntry, NiceListEntry, StateView, Stats};
pub use scheduler::RefreshScheduler;
pub use service::{Clock, HolderService, IngestReport, RefreshOutcome, ServiceOptions, TrackedRefs};
pub use shame::ShameTitle;
pub use types::{
    now_ms, ActivityItem, ActivityKind, AddressReport, AddressStatus, Holder, HolderRecord, Seller,
};
