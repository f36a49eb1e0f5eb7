//! In-memory document trees handed over by an XML loader
//!
//! The shapes serialize with serde, so a tree produced elsewhere can be stored as JSON and
//! loaded later.

use serde::{Deserialize, Serialize};

use tempora_core::NodeKind;

/// Local name given to text nodes
pub const TEXT_NAME: &str = "#text";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentTree {
    pub name: String,
    #[serde(default)]
    pub header: String,
    pub root: TreeNode,
}

impl DocumentTree {
    pub fn new(name: impl Into<String>, root: TreeNode) -> Self {
        Self {
            name: name.into(),
            header: String::new(),
            root,
        }
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = header.into();
        self
    }

    pub fn from_json(json: &str) -> tempora_core::TemporaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> tempora_core::TemporaResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceBinding {
    /// Empty for the default namespace
    #[serde(default)]
    pub prefix: String,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Possibly prefixed (`p:name`) for elements and attributes
    pub name: String,
    #[serde(default = "default_kind")]
    pub kind: NodeKind,
    /// Bindings declared on this element
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub namespaces: Vec<NamespaceBinding>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<TreeNode>,
}

fn default_kind() -> NodeKind {
    NodeKind::Element
}

impl TreeNode {
    pub fn element(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Element,
            namespaces: Vec::new(),
            value: None,
            children: Vec::new(),
        }
    }

    pub fn attribute(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Attribute,
            value: Some(value.into()),
            ..Self::element(name)
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Self {
            kind: NodeKind::Text,
            value: Some(value.into()),
            ..Self::element(TEXT_NAME)
        }
    }

    pub fn with_child(mut self, child: TreeNode) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_attribute(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_child(TreeNode::attribute(name, value))
    }

    pub fn with_text(self, value: impl Into<String>) -> Self {
        self.with_child(TreeNode::text(value))
    }

    pub fn with_namespace(mut self, prefix: impl Into<String>, uri: impl Into<String>) -> Self {
        self.namespaces.push(NamespaceBinding {
            prefix: prefix.into(),
            uri: uri.into(),
        });
        self
    }

    /// `<name>value</name>` shorthand
    pub fn leaf(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::element(name).with_text(value)
    }

    pub fn count(&self) -> usize {
        1 + self.children.iter().map(TreeNode::count).sum::<usize>()
    }
}

/// Split `p:local` into its prefix and local name
pub fn split_qualified(name: &str) -> (Option<&str>, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_json_shape() {
        let tree = DocumentTree::new(
            "catalog",
            TreeNode::element("catalog").with_child(
                TreeNode::element("book")
                    .with_attribute("category", "web")
                    .with_child(TreeNode::leaf("title", "Learning XML")),
            ),
        );
        let json = tree.to_json().unwrap();
        assert!(json.contains("\"kind\": \"attribute\""));
        assert!(!json.contains("namespaces"));
        assert_eq!(DocumentTree::from_json(&json).unwrap(), tree);
        assert_eq!(tree.root.count(), 5);
    }

    #[test]
    fn test_kind_defaults_to_element() {
        let tree = DocumentTree::from_json(
            r##"{"name": "d", "root": {"name": "a", "children": [{"name": "#text", "kind": "text", "value": "x"}]}}"##,
        )
        .unwrap();
        assert_eq!(tree.root.kind, NodeKind::Element);
        assert_eq!(tree.root.children[0].value.as_deref(), Some("x"));
        assert_eq!(tree.header, "");
    }

    #[test]
    fn test_split_qualified() {
        assert_eq!(split_qualified("b:book"), (Some("b"), "book"));
        assert_eq!(split_qualified("book"), (None, "book"));
    }
}
