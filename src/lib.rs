// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod collect;
pub mod config;
pub mod deliver;
pub mod engine;
pub mod listing;
pub mod relevance;
pub mod scheduler;
pub mod sources;
pub mod store;
pub mod subscribers;

// Digest composition & mail transport
pub mod notify;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::engine::{run_tick, TickOutcome};
pub use crate::listing::{Listing, RawListing};
pub use crate::notify::{DeliveryReport, Mailer};
pub use crate::sources::SourceAdapter;
