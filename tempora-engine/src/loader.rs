//! One-shot load of a document tree
//!
//! The tree is walked once, depth first, with attributes ahead of content at every element,
//! so the members collected per depth come out in document order. Every record shares the
//! load's single cut.

use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

use tempora_core::{
    Document, Interval, Namespace, NamespaceId, NodeClassId, NodeId, NodeKind, NodeRecord,
    OrderClassId, ParentLink, TemporaError, TemporaResult, Timestamp,
};
use tempora_storage::{OrderRecord, OrderSequence, StoreView};

use crate::tree::{split_qualified, DocumentTree, TreeNode, TEXT_NAME};

/// What a load created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadSummary {
    pub document: Document,
    pub cut: Timestamp,
    pub nodes: usize,
    pub depth: u32,
}

struct Loader<'c> {
    view: StoreView<'c>,
    document: Document,
    cut: Timestamp,
    scopes: Vec<HashMap<String, Namespace>>,
    levels: BTreeMap<u32, (OrderClassId, Vec<NodeId>)>,
    nodes: usize,
}

/// Create the document and every record of `tree` inside the caller's transaction
pub fn load_tree(view: StoreView<'_>, tree: &DocumentTree) -> TemporaResult<LoadSummary> {
    if tree.root.kind != NodeKind::Element {
        return Err(TemporaError::InvalidInput(format!(
            "document root must be an element, not {}",
            tree.root.kind
        )));
    }

    let document = view.create_document(&tree.name, &tree.header)?;
    let cut = view.advance_cut(document.id)?;
    let mut loader = Loader {
        view,
        document,
        cut,
        scopes: Vec::new(),
        levels: BTreeMap::new(),
        nodes: 0,
    };

    loader.visit(&tree.root, None, 1)?;

    for (depth, (class, members)) in &loader.levels {
        let members = OrderSequence::from_vec(members.clone())?;
        debug!("Depth {} holds {} node(s)", depth, members.len());
        view.insert_order_record(&OrderRecord::new(*class, Interval::open_from(cut), members))?;
    }

    let summary = LoadSummary {
        depth: loader.levels.keys().next_back().copied().unwrap_or(0),
        document: loader.document,
        cut,
        nodes: loader.nodes,
    };
    info!(
        "Loaded document '{}' ({} nodes, depth {}) at cut {}",
        summary.document.name, summary.nodes, summary.depth, cut
    );
    Ok(summary)
}

impl<'c> Loader<'c> {
    fn visit(
        &mut self,
        node: &TreeNode,
        parent: Option<(ParentLink, NodeClassId)>,
        depth: u32,
    ) -> TemporaResult<()> {
        if node.kind.is_synthetic() {
            return Err(TemporaError::InvalidInput(format!(
                "cannot load a {} node",
                node.kind
            )));
        }
        if node.kind != NodeKind::Element && !node.children.is_empty() {
            return Err(TemporaError::InvalidInput(format!(
                "{} '{}' cannot have children",
                node.kind, node.name
            )));
        }

        let declares = node.kind == NodeKind::Element;
        if declares {
            let mut scope = HashMap::new();
            for binding in &node.namespaces {
                let namespace = self.view.find_or_create_namespace(
                    self.document.id,
                    &binding.uri,
                    &binding.prefix,
                )?;
                scope.insert(binding.prefix.clone(), namespace);
            }
            self.scopes.push(scope);
        }

        let (local_name, namespace_id) = self.resolve_name(node)?;
        let value = match node.kind {
            NodeKind::Element => None,
            _ => node.value.clone(),
        };
        let (id, class) = self.bind(node.kind, &local_name, namespace_id, value, parent, depth)?;

        if node.kind == NodeKind::Element {
            let link = ParentLink {
                id,
                valid: Interval::open_from(self.cut),
            };
            let below = Some((link, class));

            for attribute in node.children.iter().filter(|c| c.kind == NodeKind::Attribute) {
                self.visit(attribute, below, depth + 1)?;
            }
            // An element value is its leading text
            if let Some(text) = &node.value {
                self.bind(NodeKind::Text, TEXT_NAME, None, Some(text.clone()), below, depth + 1)?;
            }
            for child in node.children.iter().filter(|c| c.kind != NodeKind::Attribute) {
                self.visit(child, below, depth + 1)?;
            }
        }

        if declares {
            self.scopes.pop();
        }
        Ok(())
    }

    fn resolve_name(&self, node: &TreeNode) -> TemporaResult<(String, Option<NamespaceId>)> {
        if node.kind == NodeKind::Text {
            return Ok((TEXT_NAME.to_string(), None));
        }
        let (prefix, local) = split_qualified(&node.name);
        if local.is_empty() {
            return Err(TemporaError::InvalidInput(format!("empty name '{}'", node.name)));
        }
        let namespace = match prefix {
            Some(prefix) => Some(
                self.lookup(prefix)
                    .ok_or_else(|| TemporaError::UnknownNamespacePrefix(prefix.to_string()))?,
            ),
            // Unprefixed attributes are never in a namespace
            None if node.kind == NodeKind::Attribute => None,
            None => self.lookup(""),
        };
        Ok((local.to_string(), namespace.map(|ns| ns.id)))
    }

    fn lookup(&self, prefix: &str) -> Option<&Namespace> {
        self.scopes.iter().rev().find_map(|scope| scope.get(prefix))
    }

    fn bind(
        &mut self,
        kind: NodeKind,
        local_name: &str,
        namespace_id: Option<NamespaceId>,
        value: Option<String>,
        parent: Option<(ParentLink, NodeClassId)>,
        depth: u32,
    ) -> TemporaResult<(NodeId, NodeClassId)> {
        let parent_class = parent.map(|(_, class)| class);
        let class = self.view.find_or_create_node_class(
            self.document.id,
            kind,
            local_name,
            namespace_id,
            depth,
            parent_class,
        )?;
        let order = self
            .view
            .find_or_create_order_class(self.document.id, depth, parent_class)?;

        let id = self.view.allocate_node_id()?;
        self.view.insert_node_record(&NodeRecord {
            node_id: id,
            valid: Interval::open_from(self.cut),
            parent: parent.map(|(link, _)| link),
            value,
            node_class_id: class.id,
        })?;

        self.levels
            .entry(depth)
            .or_insert_with(|| (order.id, Vec::new()))
            .1
            .push(id);
        self.nodes += 1;
        Ok((id, class.id))
    }
}
