//! Turns raw platform records into per-day summaries and keeps them in memory.
//!  - [aggregator::UsageAggregator] queries a single local calendar day.
//!  - [store::UsageStore] keeps at most one summary per day, newest first.
//!  - Nothing here is written to disk.

pub mod aggregator;
pub mod entities;
pub mod store;
