//! Navigation over one document through a store view
//!
//! A [`Session`] is the per-call-tree context: it owns the node cache and resolves children,
//! attributes and parents of [`NodeHandle`]s on demand. Sessions are never shared between
//! requests; a mutation holds its own.

use std::collections::HashMap;

use tempora_core::config::RenderConfig;
use tempora_core::{
    Document, Namespace, NamespaceId, NodeClassId, NodeId, NodeKey, NodeKind, SiblingGroup,
    TemporaError, TemporaResult, TimeFilter, Timestamp,
};
use tempora_storage::{NodeRow, StoreView};

use crate::cache::NodeCache;
use crate::handle::NodeHandle;
use crate::order::DocumentOrder;
use crate::render::{RenderOptions, Renderer};
use crate::set::NodeSet;

pub struct Session<'c> {
    view: StoreView<'c>,
    document: Document,
    cache: NodeCache,
    namespaces: HashMap<NamespaceId, Namespace>,
    render: RenderConfig,
}

impl<'c> Session<'c> {
    pub fn new(view: StoreView<'c>, document: Document, render: RenderConfig) -> Self {
        Self {
            view,
            document,
            cache: NodeCache::new(),
            namespaces: HashMap::new(),
            render,
        }
    }

    pub fn view(&self) -> StoreView<'c> {
        self.view
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn render_config(&self) -> &RenderConfig {
        &self.render
    }

    pub fn cache(&self) -> &NodeCache {
        &self.cache
    }

    /// The latest cut taken for this document
    pub fn current_cut(&self) -> TemporaResult<Timestamp> {
        self.view.current_cut(self.document.id)
    }

    pub(crate) fn adopt(&mut self, row: NodeRow) -> NodeHandle {
        let handle = NodeHandle::from_row(row);
        self.cache.insert(handle.clone());
        handle
    }

    fn adopt_all(&mut self, rows: Vec<NodeRow>) -> NodeSet {
        rows.into_iter().map(|row| self.adopt(row)).collect()
    }

    /// Drop a record and its resolved neighbours from the cache
    pub fn invalidate(&mut self, key: &NodeKey) {
        self.cache.invalidate(key);
    }

    pub fn invalidate_node(&mut self, id: NodeId) {
        self.cache.invalidate_node(id);
    }

    // Lookups

    pub fn node(&mut self, key: NodeKey) -> TemporaResult<NodeHandle> {
        if let Some(handle) = self.cache.get(&key) {
            return Ok(handle.clone());
        }
        let row = self
            .view
            .node_row(key)?
            .ok_or_else(|| TemporaError::UnknownNode(key.to_string()))?;
        Ok(self.adopt(row))
    }

    pub fn node_at(&mut self, id: NodeId, t: Timestamp) -> TemporaResult<Option<NodeHandle>> {
        Ok(self.view.node_row_at(id, t)?.map(|row| self.adopt(row)))
    }

    /// The document element valid at `t`
    pub fn root_at(&mut self, t: Timestamp) -> TemporaResult<Option<NodeHandle>> {
        let mut roots = self.view.root_rows(self.document.id, TimeFilter::At(t))?;
        Ok(roots.pop().map(|row| self.adopt(row)))
    }

    pub fn roots(&mut self, filter: TimeFilter) -> TemporaResult<NodeSet> {
        let rows = self.view.root_rows(self.document.id, filter)?;
        Ok(self.adopt_all(rows))
    }

    pub fn nodes_by_label(
        &mut self,
        local_name: &str,
        kind: Option<NodeKind>,
        filter: TimeFilter,
    ) -> TemporaResult<NodeSet> {
        let rows = self
            .view
            .node_rows_by_label(self.document.id, local_name, kind, filter)?;
        Ok(self.adopt_all(rows))
    }

    pub fn nodes_by_class(&mut self, class: NodeClassId, filter: TimeFilter) -> TemporaResult<NodeSet> {
        let rows = self.view.node_rows_by_class(class, filter)?;
        Ok(self.adopt_all(rows))
    }

    pub fn nodes_at_depth(&mut self, depth: u32, filter: TimeFilter) -> TemporaResult<NodeSet> {
        let rows = self.view.node_rows_at_depth(self.document.id, depth, filter)?;
        Ok(self.adopt_all(rows))
    }

    /// Every record of one node, oldest first
    pub fn history(&mut self, id: NodeId) -> TemporaResult<NodeSet> {
        let mut set = NodeSet::new();
        for record in self.view.node_history(id)? {
            set.push(self.node(record.key())?);
        }
        Ok(set)
    }

    /// Records that stopped being valid before `before`, reported once per removed subtree:
    /// a record is left out when its parent record ended at the same instant
    pub fn expired_nodes(&mut self, before: Timestamp) -> TemporaResult<NodeSet> {
        let rows = self.view.expired_rows(self.document.id, before)?;
        let mut expired = NodeSet::new();
        for row in rows {
            let ended = row.record.valid.to;
            if let Some(link) = row.record.parent {
                let parent_ended_too = self
                    .view
                    .parent_row(&link)?
                    .map(|parent| parent.record.valid.to == ended)
                    .unwrap_or(false);
                if parent_ended_too {
                    continue;
                }
            }
            expired.push(self.adopt(row));
        }
        Ok(expired)
    }

    // Neighbours

    /// Element and text records ever bound to this record, in store order
    pub fn children(&mut self, node: &NodeHandle) -> TemporaResult<NodeSet> {
        let key = node.key();
        if let Some(children) = self.cache.children(&key) {
            return Ok(children.into_iter().collect());
        }
        self.load_neighbours(node)?;
        Ok(self.cache.children(&key).unwrap_or_default().into_iter().collect())
    }

    /// Attribute records ever bound to this record, in store order
    pub fn attributes(&mut self, node: &NodeHandle) -> TemporaResult<NodeSet> {
        let key = node.key();
        if let Some(attributes) = self.cache.attributes(&key) {
            return Ok(attributes.into_iter().collect());
        }
        self.load_neighbours(node)?;
        Ok(self.cache.attributes(&key).unwrap_or_default().into_iter().collect())
    }

    fn load_neighbours(&mut self, node: &NodeHandle) -> TemporaResult<()> {
        let mut children = Vec::new();
        let mut attributes = Vec::new();
        if !node.is_synthetic() && node.kind().is_element() {
            for row in self.view.child_rows(node.key())? {
                let handle = NodeHandle::from_row(row);
                match handle.kind().sibling_group() {
                    Some(SiblingGroup::Attributes) => attributes.push(handle),
                    Some(SiblingGroup::Content) => children.push(handle),
                    None => {}
                }
            }
        }
        self.cache.insert(node.clone());
        self.cache.set_children(node.key(), &children);
        self.cache.set_attributes(node.key(), &attributes);
        Ok(())
    }

    /// Children valid at `t`, in document order
    pub fn children_at(&mut self, node: &NodeHandle, t: Timestamp) -> TemporaResult<NodeSet> {
        let children = self.children(node)?.at(t);
        self.sort(children)
    }

    /// Attributes valid at `t`, in document order
    pub fn attributes_at(&mut self, node: &NodeHandle, t: Timestamp) -> TemporaResult<NodeSet> {
        let attributes = self.attributes(node)?.at(t);
        self.sort(attributes)
    }

    /// The parent record this record is bound to; `None` for the document element
    pub fn parent(&mut self, node: &NodeHandle) -> TemporaResult<Option<NodeHandle>> {
        if let Some(owner) = node.owner() {
            return Ok(Some(owner));
        }
        let key = node.key();
        if let Some(parent) = self.cache.parent(&key) {
            return Ok(parent);
        }
        let parent = match node.parent_link() {
            Some(link) => {
                let row = self.view.parent_row(&link)?.ok_or_else(|| {
                    TemporaError::UnknownNode(format!("parent {} of {}", link.id, key))
                })?;
                Some(NodeHandle::from_row(row))
            }
            None => None,
        };
        self.cache.insert(node.clone());
        self.cache.set_parent(key, parent.as_ref());
        Ok(parent)
    }

    /// Re-read a handle that may have been superseded
    ///
    /// An open handle is replaced by the node's latest record. Cached neighbours of the old
    /// record are dropped either way.
    pub fn refresh(&mut self, node: &NodeHandle) -> TemporaResult<NodeHandle> {
        if let Some(owner) = node.owner() {
            let owner = self.refresh(&owner)?;
            return owner.synthetic(node.kind());
        }

        self.cache.invalidate(&node.key());
        if !node.is_open() {
            return self.node(node.key());
        }
        let row = self
            .view
            .latest_node_row(node.id())?
            .ok_or_else(|| TemporaError::UnknownNode(node.key().to_string()))?;
        self.cache.invalidate(&row.record.key());
        Ok(self.adopt(row))
    }

    // Ordering and output

    pub fn sort(&mut self, nodes: NodeSet) -> TemporaResult<NodeSet> {
        let mut order = DocumentOrder::new(self.view, self.document.id);
        Ok(order.sort(nodes.into_vec())?.into())
    }

    pub fn namespace(&mut self, id: NamespaceId) -> TemporaResult<Namespace> {
        if let Some(namespace) = self.namespaces.get(&id) {
            return Ok(namespace.clone());
        }
        let namespace = self.view.namespace(id)?;
        self.namespaces.insert(id, namespace.clone());
        Ok(namespace)
    }

    /// `prefix:local` for namespaced nodes with a prefix, the local name otherwise
    pub fn qualified_name(&mut self, node: &NodeHandle) -> TemporaResult<String> {
        match node.namespace_id() {
            Some(id) if !node.is_synthetic() => {
                let namespace = self.namespace(id)?;
                if namespace.is_default() {
                    Ok(node.local_name().to_string())
                } else {
                    Ok(format!("{}:{}", namespace.prefix, node.local_name()))
                }
            }
            _ => Ok(node.local_name().to_string()),
        }
    }

    pub fn render(&mut self, nodes: &NodeSet, options: &RenderOptions) -> TemporaResult<String> {
        Renderer::new(self, options).render_set(nodes)
    }

    /// The whole document as valid at `at`, with its header and namespace declarations
    pub fn render_document(&mut self, options: &RenderOptions) -> TemporaResult<String> {
        let at = match options.at {
            Some(at) => at,
            None => self.current_cut()?,
        };
        let root = self.root_at(at)?;
        let options = RenderOptions {
            at: Some(at),
            ..options.clone()
        };
        Renderer::new(self, &options).render_document(root.as_ref())
    }
}
