/// Core types shared across all Tempora modules
pub mod ids;
pub mod kind;
pub mod records;
pub mod time;

// Re-export commonly used types at module level
pub use ids::{DocumentId, NamespaceId, NodeClassId, NodeId, OrderClassId};
pub use kind::{NodeKind, SiblingGroup};
pub use records::{Document, Namespace, NodeClass, NodeKey, NodeRecord, OrderClass, ParentLink};
pub use time::{Interval, TimeFilter, Timestamp};
