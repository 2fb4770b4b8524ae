//! AutoDJ: keeps the playlist topped up with local tracks the remote service
//! considers similar to what is playing.
//!
//! The work is split in three steps:
//!
//! - [`engine`]: the cascading remote search ([`AutoDj::run`])
//! - [`matcher`]: cross-referencing remote candidates with the local catalog
//! - [`selector`]: choosing which matches go on the playlist

pub mod engine;
pub mod matcher;
pub mod selector;

pub use engine::{AutoDj, AutoDjOutcome, SearchStage, TOP_TRACK_LIMIT};
pub use matcher::cross_reference;
pub use selector::{add_recommendations, RESERVE_SIZE};
