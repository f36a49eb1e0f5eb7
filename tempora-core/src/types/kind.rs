/// Node kinds and the sibling groups used for position resolution
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{TemporaError, TemporaResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Element,
    Attribute,
    Text,
    SyntheticId,
    SyntheticFrom,
    SyntheticTo,
}

/// Which siblings a node is counted among when an ordinal position is resolved.
/// Attributes count only among attributes; elements and text count together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiblingGroup {
    Attributes,
    Content,
}

impl NodeKind {
    /// Stable code persisted in the node class dictionary
    pub fn code(&self) -> i64 {
        match self {
            NodeKind::Element => 1,
            NodeKind::Attribute => 2,
            NodeKind::Text => 3,
            NodeKind::SyntheticId => 4,
            NodeKind::SyntheticFrom => 5,
            NodeKind::SyntheticTo => 6,
        }
    }

    pub fn from_code(code: i64) -> TemporaResult<Self> {
        match code {
            1 => Ok(NodeKind::Element),
            2 => Ok(NodeKind::Attribute),
            3 => Ok(NodeKind::Text),
            4 => Ok(NodeKind::SyntheticId),
            5 => Ok(NodeKind::SyntheticFrom),
            6 => Ok(NodeKind::SyntheticTo),
            other => Err(TemporaError::Database(format!("unknown node kind code {}", other))),
        }
    }

    /// Synthetic kinds are never stored as nodes and belong to no sibling group
    pub fn sibling_group(&self) -> Option<SiblingGroup> {
        match self {
            NodeKind::Attribute => Some(SiblingGroup::Attributes),
            NodeKind::Element | NodeKind::Text => Some(SiblingGroup::Content),
            NodeKind::SyntheticId | NodeKind::SyntheticFrom | NodeKind::SyntheticTo => None,
        }
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeKind::Element)
    }

    pub fn is_attribute(&self) -> bool {
        matches!(self, NodeKind::Attribute)
    }

    pub fn is_synthetic(&self) -> bool {
        matches!(
            self,
            NodeKind::SyntheticId | NodeKind::SyntheticFrom | NodeKind::SyntheticTo
        )
    }

    /// Kinds that appear among an element's children (everything but attributes)
    pub fn is_child(&self) -> bool {
        matches!(self.sibling_group(), Some(SiblingGroup::Content))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Element => "element",
            NodeKind::Attribute => "attribute",
            NodeKind::Text => "text",
            NodeKind::SyntheticId => "synthetic-id",
            NodeKind::SyntheticFrom => "synthetic-from",
            NodeKind::SyntheticTo => "synthetic-to",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SiblingGroup {
    pub fn includes(&self, kind: NodeKind) -> bool {
        kind.sibling_group() == Some(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [NodeKind; 6] = [
        NodeKind::Element,
        NodeKind::Attribute,
        NodeKind::Text,
        NodeKind::SyntheticId,
        NodeKind::SyntheticFrom,
        NodeKind::SyntheticTo,
    ];

    #[test]
    fn test_codes_are_stable() {
        for kind in ALL {
            assert_eq!(NodeKind::from_code(kind.code()).unwrap(), kind);
        }
        assert!(NodeKind::from_code(0).is_err());
        assert!(NodeKind::from_code(7).is_err());
    }

    #[test]
    fn test_sibling_groups() {
        assert!(SiblingGroup::Content.includes(NodeKind::Element));
        assert!(SiblingGroup::Content.includes(NodeKind::Text));
        assert!(!SiblingGroup::Content.includes(NodeKind::Attribute));
        assert!(SiblingGroup::Attributes.includes(NodeKind::Attribute));
        for kind in ALL.iter().filter(|k| k.is_synthetic()) {
            assert_eq!(kind.sibling_group(), None);
            assert!(!kind.is_child());
        }
    }
}
