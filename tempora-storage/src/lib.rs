//! Temporal record store for Tempora documents
//!
//! Node existence and depth-wide document order are kept as interval-versioned rows in SQLite.
//! Nothing is overwritten: a change effective from a cut truncates the open version and adds
//! a new one.

pub mod clock;
pub mod context;
pub mod dictionary;
pub mod nodes;
pub mod order;
pub mod ordering;
pub mod schema;
pub mod store;

pub use context::SqlContext;
pub use order::{OrderRecord, OrderSequence};
pub use store::{NodeRow, Sequence, StoreView, TemporalStore};
