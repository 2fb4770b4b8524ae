//! Offline submission cache.
//!
//! Scrobbles that could not be delivered are persisted here and replayed
//! once the service is reachable again.

pub mod submissions;

pub use submissions::{DrainReport, OfflineCache};
