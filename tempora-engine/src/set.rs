//! Ordered collections of node handles

use std::ops::Index;

use tempora_core::{NodeId, NodeKind, TemporaResult, Timestamp};

use crate::handle::NodeHandle;
use crate::render::RenderOptions;
use crate::session::Session;

/// Handles in the order they were produced; [`NodeSet::sort`] puts them in document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeSet {
    nodes: Vec<NodeHandle>,
}

impl NodeSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&NodeHandle> {
        self.nodes.get(index)
    }

    pub fn first(&self) -> Option<&NodeHandle> {
        self.nodes.first()
    }

    pub fn last(&self) -> Option<&NodeHandle> {
        self.nodes.last()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NodeHandle> {
        self.nodes.iter()
    }

    pub fn push(&mut self, node: NodeHandle) {
        self.nodes.push(node);
    }

    pub fn into_vec(self) -> Vec<NodeHandle> {
        self.nodes
    }

    pub fn contains(&self, node: &NodeHandle) -> bool {
        self.nodes.contains(node)
    }

    /// Whether any record of node `id` is in the set
    pub fn contains_node(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id() == id)
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id()).collect()
    }

    /// Members valid at `t`
    pub fn at(&self, t: Timestamp) -> NodeSet {
        self.filter(|n| n.covers(t))
    }

    pub fn of_kind(&self, kind: NodeKind) -> NodeSet {
        self.filter(|n| n.kind() == kind)
    }

    pub fn filter<P>(&self, mut predicate: P) -> NodeSet
    where
        P: FnMut(&NodeHandle) -> bool,
    {
        self.nodes.iter().filter(|n| predicate(n)).cloned().collect()
    }

    /// Put the members in document order
    pub fn sort(&mut self, session: &mut Session<'_>) -> TemporaResult<()> {
        let nodes = std::mem::take(&mut self.nodes);
        self.nodes = session.sort(NodeSet { nodes })?.into_vec();
        Ok(())
    }

    pub fn sorted(mut self, session: &mut Session<'_>) -> TemporaResult<NodeSet> {
        self.sort(session)?;
        Ok(self)
    }

    /// Element and text children of every member
    pub fn children(&self, session: &mut Session<'_>) -> TemporaResult<NodeSet> {
        let mut out = NodeSet::new();
        for node in &self.nodes {
            out.extend(session.children(node)?);
        }
        Ok(out)
    }

    pub fn attributes(&self, session: &mut Session<'_>) -> TemporaResult<NodeSet> {
        let mut out = NodeSet::new();
        for node in &self.nodes {
            out.extend(session.attributes(node)?);
        }
        Ok(out)
    }

    /// Attributes and children of every member, transitively. With `at`, only records valid
    /// at that instant are followed.
    pub fn descendants(
        &self,
        session: &mut Session<'_>,
        at: Option<Timestamp>,
    ) -> TemporaResult<NodeSet> {
        let mut out = NodeSet::new();
        let mut pending: Vec<NodeHandle> = self.nodes.clone();
        while let Some(node) = pending.pop() {
            let mut below = session.attributes(&node)?;
            below.extend(session.children(&node)?);
            for child in below {
                if at.map_or(true, |t| child.covers(t)) {
                    pending.push(child.clone());
                    out.push(child);
                }
            }
        }
        Ok(out)
    }

    pub fn render(&self, session: &mut Session<'_>, options: &RenderOptions) -> TemporaResult<String> {
        session.render(self, options)
    }
}

impl Index<usize> for NodeSet {
    type Output = NodeHandle;

    fn index(&self, index: usize) -> &NodeHandle {
        &self.nodes[index]
    }
}

impl From<Vec<NodeHandle>> for NodeSet {
    fn from(nodes: Vec<NodeHandle>) -> Self {
        Self { nodes }
    }
}

impl FromIterator<NodeHandle> for NodeSet {
    fn from_iter<I: IntoIterator<Item = NodeHandle>>(iter: I) -> Self {
        Self {
            nodes: iter.into_iter().collect(),
        }
    }
}

impl Extend<NodeHandle> for NodeSet {
    fn extend<I: IntoIterator<Item = NodeHandle>>(&mut self, iter: I) {
        self.nodes.extend(iter);
    }
}

impl IntoIterator for NodeSet {
    type Item = NodeHandle;
    type IntoIter = std::vec::IntoIter<NodeHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.into_iter()
    }
}

impl<'a> IntoIterator for &'a NodeSet {
    type Item = &'a NodeHandle;
    type IntoIter = std::slice::Iter<'a, NodeHandle>;

    fn into_iter(self) -> Self::IntoIter {
        self.nodes.iter()
    }
}
