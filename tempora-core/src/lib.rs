//! Core utilities and types shared across all Tempora crates

pub mod config;
pub mod error;
pub mod logging;
pub mod system;
pub mod types;

// Re-export commonly used types
pub use config::{load_config, save_config, Config};
pub use error::{TemporaError, TemporaResult};

// Re-export core types
pub use types::{
    Document, DocumentId, Interval, Namespace, NamespaceId, NodeClass, NodeClassId, NodeId,
    NodeKey, NodeKind, NodeRecord, OrderClass, OrderClassId, ParentLink, SiblingGroup, TimeFilter, Timestamp,
};

// Re-export system utilities
pub use system::{default_database_path, tempora_data_dir, tempora_home};

/// Version information for the Tempora project
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHORS: &str = env!("CARGO_PKG_AUTHORS");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
