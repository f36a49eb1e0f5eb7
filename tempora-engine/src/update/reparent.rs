//! Reparent with history
//!
//! The moving subtree is listed top-down in document order, unbound bottom-up, then bound
//! again top-down at the cut under its new parents. Node ids and values survive the move;
//! every record gets a new class at its new depth.

use tracing::debug;

use tempora_core::{Interval, NodeRecord, TemporaError, TemporaResult};
use tempora_storage::NodeRow;

use super::Mutation;
use crate::handle::NodeHandle;
use crate::set::NodeSet;

/// A node to bind again, with the index of its new parent in the same list (`None` for the
/// subtree root, which goes under the target)
type Pair = (Option<usize>, NodeHandle);

impl<'c> Mutation<'c> {
    /// Move `node` and its subtree below `target`, at `position` among the target's children
    /// (or attributes, when moving an attribute). Returns the new record of `node`.
    pub fn set_parent_in_document(
        &mut self,
        node: &NodeHandle,
        target: &NodeHandle,
        position: Option<i64>,
    ) -> TemporaResult<NodeHandle> {
        if node.is_synthetic() {
            return Err(TemporaError::InvalidInput(format!("cannot move {}", node)));
        }
        let node = self.live(node)?;
        let target = self.live(target)?;
        if !target.kind().is_element() || target.is_synthetic() {
            return Err(TemporaError::NotAnElement(target.id(), target.kind()));
        }

        let cycle = TemporaError::CycleDetected {
            node: node.id(),
            target: target.id(),
        };
        if target.id() == node.id() {
            return Err(cycle);
        }
        let below = NodeSet::from(vec![node.clone()]).descendants(&mut self.session, Some(self.cut))?;
        if below.contains_node(target.id()) {
            return Err(cycle);
        }

        let mut pairs: Vec<Pair> = vec![(None, node.clone())];
        self.collect_pairs(&node, 0, &mut pairs)?;

        for (_, moving) in pairs.iter().rev() {
            self.unbind(moving)?;
        }

        let mut placed: Vec<NodeHandle> = Vec::with_capacity(pairs.len());
        for (parent, moving) in &pairs {
            let (parent, slot) = match parent {
                None => (target.clone(), position),
                Some(index) => (placed[*index].clone(), None),
            };
            placed.push(self.rebind(moving, &parent, slot)?);
        }

        debug!(
            "Moved {} node(s) under {} at cut {}",
            placed.len(),
            target.key(),
            self.cut
        );
        placed
            .into_iter()
            .next()
            .ok_or_else(|| TemporaError::UnknownNode(node.key().to_string()))
    }

    // Pre-order, attributes ahead of children, each group in document order
    fn collect_pairs(
        &mut self,
        node: &NodeHandle,
        index: usize,
        pairs: &mut Vec<Pair>,
    ) -> TemporaResult<()> {
        let attributes = self.session.attributes_at(node, self.cut)?;
        let children = self.session.children_at(node, self.cut)?;
        for below in attributes.into_iter().chain(children) {
            pairs.push((Some(index), below.clone()));
            let own = pairs.len() - 1;
            self.collect_pairs(&below, own, pairs)?;
        }
        Ok(())
    }

    fn rebind(
        &mut self,
        moving: &NodeHandle,
        parent: &NodeHandle,
        position: Option<i64>,
    ) -> TemporaResult<NodeHandle> {
        let group = moving.kind().sibling_group().ok_or_else(|| {
            TemporaError::InvalidInput(format!("cannot move {}", moving))
        })?;
        let view = self.view();
        let document = parent.document_id();
        let depth = parent.depth() + 1;
        let class = view.find_or_create_node_class(
            document,
            moving.kind(),
            moving.local_name(),
            moving.namespace_id(),
            depth,
            Some(parent.class_id()),
        )?;
        let order = view.find_or_create_order_class(document, depth, Some(parent.class_id()))?;
        let current = view.order_record_for_cut(order.id, self.cut)?;
        let slot = self.resolve_slot(parent, group, &current.members, position)?;

        let record = NodeRecord {
            node_id: moving.id(),
            valid: Interval::open_from(self.cut),
            parent: Some(parent.key().into()),
            value: moving.value().map(str::to_string),
            node_class_id: class.id,
        };
        view.insert_node_record(&record)?;
        view.write_members_at_cut(order.id, self.cut, &current.members.inserted(slot, record.node_id)?)?;

        self.session.invalidate(&parent.key());
        Ok(self.session.adopt(NodeRow { record, class }))
    }
}
