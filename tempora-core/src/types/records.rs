/// Persisted record shapes for documents, dictionaries and node existence
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{DocumentId, NamespaceId, NodeClassId, NodeId, OrderClassId};
use super::kind::NodeKind;
use super::time::{Interval, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub name: String,
    pub header: String,
}

/// Unique per `(uri, prefix, document_id)`. The default namespace has an empty prefix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Namespace {
    pub id: NamespaceId,
    pub uri: String,
    pub prefix: String,
    pub document_id: DocumentId,
}

impl Namespace {
    pub fn is_default(&self) -> bool {
        self.prefix.is_empty()
    }
}

/// One row per distinct node shape; never deleted
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeClass {
    pub id: NodeClassId,
    pub kind: NodeKind,
    pub local_name: String,
    pub namespace_id: Option<NamespaceId>,
    pub depth: u32,
    pub parent_class_id: Option<NodeClassId>,
    pub document_id: DocumentId,
}

/// One depth-wide ordering sequence. Looked up by `(depth, document_id)` only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderClass {
    pub id: OrderClassId,
    pub depth: u32,
    pub parent_class_id: Option<NodeClassId>,
    pub document_id: DocumentId,
}

/// Identity of one temporal record of a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeKey {
    pub id: NodeId,
    pub valid: Interval,
}

impl NodeKey {
    pub fn new(id: NodeId, valid: Interval) -> Self {
        Self { id, valid }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.valid)
    }
}

/// The parent edge a node record is attached to: `(parentId, parentValidFrom, parentValidTo)`.
/// The edge resolves to the parent record whose interval covers `valid.from`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentLink {
    pub id: NodeId,
    pub valid: Interval,
}

impl From<NodeKey> for ParentLink {
    fn from(key: NodeKey) -> Self {
        Self {
            id: key.id,
            valid: key.valid,
        }
    }
}

/// Existence and parent-link history of a node over one interval. The root element has no
/// parent link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub node_id: NodeId,
    pub valid: Interval,
    pub parent: Option<ParentLink>,
    pub value: Option<String>,
    pub node_class_id: NodeClassId,
}

impl NodeRecord {
    pub fn key(&self) -> NodeKey {
        NodeKey::new(self.node_id, self.valid)
    }

    pub fn covers(&self, t: Timestamp) -> bool {
        self.valid.covers(t)
    }
}
