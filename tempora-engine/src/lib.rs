//! Bitemporal XML document engine
//!
//! Documents live in a [`TemporalStore`](tempora_storage::TemporalStore) as interval-versioned
//! node and order records. This crate builds the working layer on top:
//!
//! - **Navigation**: [`Session`], [`NodeHandle`] and [`NodeSet`] resolve children, attributes
//!   and parents lazily, at any instant
//! - **Document order**: [`DocumentOrder`] sorts handles drawn from any depth and time
//! - **Updates**: [`Mutation`] inserts, soft-deletes and reparents subtrees at one cut
//! - **Loading and output**: [`Engine::load`] and subtree rendering

pub mod cache;
pub mod engine;
pub mod handle;
pub mod loader;
pub mod order;
pub mod render;
pub mod session;
pub mod set;
pub mod tree;
pub mod update;

pub use engine::Engine;
pub use handle::NodeHandle;
pub use loader::LoadSummary;
pub use order::DocumentOrder;
pub use render::RenderOptions;
pub use session::Session;
pub use set::NodeSet;
pub use tree::{DocumentTree, NamespaceBinding, TreeNode};
pub use update::Mutation;
