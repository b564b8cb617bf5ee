//! `partscope-ai`
//!
//! **Responsibility:** derived recommendations over inventory records.
//!
//! This crate is intentionally **not** part of the domain model:
//! - It consumes read-only snapshots, never the records themselves.
//! - It must not mutate domain state.
//! - It emits **insights**, not domain events.

pub mod insight;

pub use insight::{build_insight, Insight, ItemSnapshot, Priority};
