//! Lightweight proxy for one temporal record of a node

use std::fmt;
use std::hash::{Hash, Hasher};

use tempora_core::{
    DocumentId, Interval, NamespaceId, NodeClassId, NodeId, NodeKey, NodeKind, ParentLink,
    TemporaError, TemporaResult, Timestamp,
};
use tempora_storage::NodeRow;

/// One `(nodeId, validFrom, validTo)` record with the shape fields of its class
///
/// Handles are plain values; their neighbours are resolved through a
/// [`Session`](crate::Session), which owns the cache. Two handles are equal when they name the
/// same record with the same kind, so a node and its synthetic facets stay distinct.
#[derive(Debug, Clone)]
pub struct NodeHandle {
    key: NodeKey,
    kind: NodeKind,
    local_name: String,
    namespace_id: Option<NamespaceId>,
    depth: u32,
    class_id: NodeClassId,
    document_id: DocumentId,
    parent: Option<ParentLink>,
    value: Option<String>,
    /// The node a synthetic facet was taken from
    owner: Option<Box<NodeHandle>>,
}

impl NodeHandle {
    pub fn from_row(row: NodeRow) -> Self {
        let NodeRow { record, class } = row;
        Self {
            key: record.key(),
            kind: class.kind,
            local_name: class.local_name,
            namespace_id: class.namespace_id,
            depth: class.depth,
            class_id: class.id,
            document_id: class.document_id,
            parent: record.parent,
            value: record.value,
            owner: None,
        }
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn id(&self) -> NodeId {
        self.key.id
    }

    pub fn valid(&self) -> Interval {
        self.key.valid
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    pub fn namespace_id(&self) -> Option<NamespaceId> {
        self.namespace_id
    }

    pub fn depth(&self) -> u32 {
        self.depth
    }

    pub fn class_id(&self) -> NodeClassId {
        self.class_id
    }

    pub fn document_id(&self) -> DocumentId {
        self.document_id
    }

    pub fn parent_link(&self) -> Option<ParentLink> {
        self.parent
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.key.valid.is_open()
    }

    pub fn covers(&self, t: Timestamp) -> bool {
        self.key.valid.covers(t)
    }

    pub fn is_synthetic(&self) -> bool {
        self.owner.is_some()
    }

    /// Expose the node's identifier or one of its validity bounds as a synthetic node whose
    /// value is the text of that field
    pub fn synthetic(&self, kind: NodeKind) -> TemporaResult<NodeHandle> {
        let (name, value) = match kind {
            NodeKind::SyntheticId => ("id", self.key.id.to_string()),
            NodeKind::SyntheticFrom => ("from", self.key.valid.from.to_string()),
            NodeKind::SyntheticTo => ("to", self.key.valid.to.to_string()),
            other => {
                return Err(TemporaError::InvalidInput(format!(
                    "{} is not a synthetic kind",
                    other
                )))
            }
        };
        let owner = self.owner().unwrap_or_else(|| self.clone());
        Ok(NodeHandle {
            kind,
            local_name: name.to_string(),
            value: Some(value),
            owner: Some(Box::new(owner.clone())),
            ..owner
        })
    }

    /// The node a synthetic facet was taken from
    pub fn owner(&self) -> Option<NodeHandle> {
        self.owner.as_deref().cloned()
    }

    /// Rank used to place facets right after their owner in document order
    pub(crate) fn facet_rank(&self) -> u8 {
        match self.kind {
            NodeKind::SyntheticId => 1,
            NodeKind::SyntheticFrom => 2,
            NodeKind::SyntheticTo => 3,
            _ => 0,
        }
    }
}

impl PartialEq for NodeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.kind == other.kind
    }
}

impl Eq for NodeHandle {}

impl Hash for NodeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.kind.hash(state);
    }
}

impl fmt::Display for NodeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} '{}' {}", self.kind, self.local_name, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use tempora_core::{NodeClass, NodeRecord};

    fn handle(id: i64, from: i64, kind: NodeKind) -> NodeHandle {
        NodeHandle::from_row(NodeRow {
            record: NodeRecord {
                node_id: NodeId(id),
                valid: Interval::open_from(Timestamp(from)),
                parent: None,
                value: None,
                node_class_id: NodeClassId(1),
            },
            class: NodeClass {
                id: NodeClassId(1),
                kind,
                local_name: "book".to_string(),
                namespace_id: None,
                depth: 2,
                parent_class_id: None,
                document_id: DocumentId(1),
            },
        })
    }

    #[test]
    fn test_identity_is_the_record() {
        let a = handle(7, 1, NodeKind::Element);
        let b = handle(7, 1, NodeKind::Element);
        let later = handle(7, 3, NodeKind::Element);

        let set: HashSet<_> = [a.clone(), b, later.clone()].into_iter().collect();
        assert_eq!(set.len(), 2);
        assert_ne!(a, later);
    }

    #[test]
    fn test_synthetic_facets() {
        let node = handle(7, 3, NodeKind::Element);

        let id = node.synthetic(NodeKind::SyntheticId).unwrap();
        let from = node.synthetic(NodeKind::SyntheticFrom).unwrap();
        let to = node.synthetic(NodeKind::SyntheticTo).unwrap();
        assert_eq!(id.value(), Some("7"));
        assert_eq!(from.value(), Some("3"));
        assert_eq!(to.value(), Some("OPEN"));
        assert_eq!(to.local_name(), "to");
        assert!(id.is_synthetic() && !node.is_synthetic());
        assert_ne!(id, node);
        assert!(id.facet_rank() < from.facet_rank());

        // Facets of facets still point at the real node
        let again = id.synthetic(NodeKind::SyntheticFrom).unwrap();
        assert_eq!(again.owner().unwrap(), node);
        assert_eq!(again.owner().unwrap().local_name(), "book");

        assert!(matches!(
            node.synthetic(NodeKind::Text),
            Err(TemporaError::InvalidInput(_))
        ));
    }
}
