//! Insert at a position

use tracing::debug;

use tempora_core::{
    Interval, NamespaceId, NodeKind, NodeRecord, SiblingGroup, TemporaError, TemporaResult,
};
use tempora_storage::{NodeRow, OrderSequence};

use super::path::parse_path;
use super::Mutation;
use crate::handle::NodeHandle;
use crate::tree::TEXT_NAME;

/// Index among `siblings` same-group siblings at which a node inserted at `position` ends up.
/// Positions are 1-based, negative ones count from the end, 0 is invalid; `None` appends.
pub fn ordinal_index(position: Option<i64>, siblings: usize) -> TemporaResult<usize> {
    let invalid = |position: i64| TemporaError::InvalidPosition { position, siblings };
    match position {
        None => Ok(siblings),
        Some(0) => Err(invalid(0)),
        Some(p) => {
            let magnitude = usize::try_from(p.unsigned_abs()).map_err(|_| invalid(p))?;
            if magnitude > siblings + 1 {
                Err(invalid(p))
            } else if p > 0 {
                Ok(magnitude - 1)
            } else {
                Ok(siblings + 1 - magnitude)
            }
        }
    }
}

impl<'c> Mutation<'c> {
    /// Create the nodes named by `path` below `parent`, the first at `position` among its
    /// siblings and each further segment as the last child of the one before. A value goes on
    /// a trailing attribute, or into a text child of a trailing element.
    ///
    /// Returns the first node created.
    pub fn insert_node(
        &mut self,
        parent: &NodeHandle,
        path: &str,
        value: Option<&str>,
        position: Option<i64>,
    ) -> TemporaResult<NodeHandle> {
        let segments = parse_path(path)?;
        let document = self.session.document().id;
        let mut current = self.live(parent)?;
        let mut first: Option<NodeHandle> = None;

        for (i, segment) in segments.iter().enumerate() {
            let namespace = segment.namespace(self.view(), document)?;
            let leaf = i + 1 == segments.len();
            let stored = match segment.kind {
                NodeKind::Attribute if leaf => Some(value.unwrap_or_default().to_string()),
                _ => None,
            };
            let slot = if i == 0 { position } else { None };
            let node = self.insert_one(
                &current,
                segment.kind,
                &segment.local_name,
                namespace,
                stored,
                slot,
            )?;
            if first.is_none() {
                first = Some(node.clone());
            }
            current = node;
        }

        if let Some(value) = value {
            if current.kind() == NodeKind::Element {
                self.insert_one(&current, NodeKind::Text, TEXT_NAME, None, Some(value.to_string()), None)?;
            }
        }

        first.ok_or_else(|| TemporaError::InvalidInput(format!("empty path '{}'", path)))
    }

    /// Insert a text node below `parent`
    pub fn insert_text(
        &mut self,
        parent: &NodeHandle,
        value: &str,
        position: Option<i64>,
    ) -> TemporaResult<NodeHandle> {
        let parent = self.live(parent)?;
        self.insert_one(&parent, NodeKind::Text, TEXT_NAME, None, Some(value.to_string()), position)
    }

    /// Bind a new node to a live parent record and splice it into its depth's order
    fn insert_one(
        &mut self,
        parent: &NodeHandle,
        kind: NodeKind,
        local_name: &str,
        namespace_id: Option<NamespaceId>,
        value: Option<String>,
        position: Option<i64>,
    ) -> TemporaResult<NodeHandle> {
        if !parent.kind().is_element() || parent.is_synthetic() {
            return Err(TemporaError::NotAnElement(parent.id(), parent.kind()));
        }
        let group = kind.sibling_group().ok_or_else(|| {
            TemporaError::InvalidInput(format!("cannot insert a {} node", kind))
        })?;

        let view = self.view();
        let document = parent.document_id();
        let depth = parent.depth() + 1;
        let class = view.find_or_create_node_class(
            document,
            kind,
            local_name,
            namespace_id,
            depth,
            Some(parent.class_id()),
        )?;
        let order = view.find_or_create_order_class(document, depth, Some(parent.class_id()))?;
        let current = view.order_record_for_cut(order.id, self.cut)?;
        let slot = self.resolve_slot(parent, group, &current.members, position)?;

        let record = NodeRecord {
            node_id: view.allocate_node_id()?,
            valid: Interval::open_from(self.cut),
            parent: Some(parent.key().into()),
            value,
            node_class_id: class.id,
        };
        view.insert_node_record(&record)?;
        view.write_members_at_cut(order.id, self.cut, &current.members.inserted(slot, record.node_id)?)?;

        self.session.invalidate(&parent.key());
        debug!("Inserted {} '{}' {} at slot {}", kind, local_name, record.key(), slot);
        Ok(self.session.adopt(NodeRow { record, class }))
    }

    /// Index in the child depth's array (`members`, the version at the cut) where a node of
    /// `group` inserted at `position` below `parent` goes
    pub(super) fn resolve_slot(
        &mut self,
        parent: &NodeHandle,
        group: SiblingGroup,
        members: &OrderSequence,
        position: Option<i64>,
    ) -> TemporaResult<usize> {
        let mut same = Vec::new();
        let mut other = Vec::new();
        for row in self.live_children(parent)? {
            let index = members.position(row.record.node_id).ok_or_else(|| {
                TemporaError::InconsistentOrderingState(format!(
                    "live child {} is missing from its depth order",
                    row.record.key()
                ))
            })?;
            if group.includes(row.class.kind) {
                same.push(index);
            } else {
                other.push(index);
            }
        }
        same.sort_unstable();
        other.sort_unstable();

        let index = ordinal_index(position, same.len())?;
        if let Some(&last) = same.last() {
            return Ok(same.get(index).copied().unwrap_or(last + 1));
        }
        match (group, other.first(), other.last()) {
            (SiblingGroup::Attributes, Some(&first_content), _) => Ok(first_content),
            (SiblingGroup::Content, _, Some(&last_attribute)) => Ok(last_attribute + 1),
            _ => self.anchor_slot(parent, members),
        }
    }

    /// Slot for the first child of a parent without any: right before the first child of the
    /// nearest later depth-sibling that has children, else the end of the array
    fn anchor_slot(&mut self, parent: &NodeHandle, members: &OrderSequence) -> TemporaResult<usize> {
        let view = self.view();
        let class = self.order_class_at(parent.depth())?;
        let level = view.order_record_at(class, self.cut)?.ok_or_else(|| {
            TemporaError::InconsistentOrderingState(format!(
                "no order record for depth {} at {}",
                parent.depth(),
                self.cut
            ))
        })?;
        let at = level.members.position(parent.id()).ok_or_else(|| {
            TemporaError::InconsistentOrderingState(format!(
                "node {} is missing from the depth {} order",
                parent.id(),
                parent.depth()
            ))
        })?;

        for sibling in level.members.iter().skip(at + 1) {
            let Some(row) = view.node_row_at(sibling, self.cut)? else {
                continue;
            };
            let sibling = NodeHandle::from_row(row);
            let first = self
                .live_children(&sibling)?
                .iter()
                .filter_map(|child| members.position(child.record.node_id))
                .min();
            if let Some(first) = first {
                return Ok(first);
            }
        }
        Ok(members.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinal_index() {
        assert_eq!(ordinal_index(None, 3).unwrap(), 3);
        assert_eq!(ordinal_index(Some(1), 3).unwrap(), 0);
        assert_eq!(ordinal_index(Some(4), 3).unwrap(), 3);
        assert_eq!(ordinal_index(Some(-1), 3).unwrap(), 3);
        assert_eq!(ordinal_index(Some(-4), 3).unwrap(), 0);
        assert_eq!(ordinal_index(Some(1), 0).unwrap(), 0);
        assert_eq!(ordinal_index(Some(-1), 0).unwrap(), 0);
    }

    #[test]
    fn test_ordinal_index_out_of_range() {
        for position in [0, 5, -5, i64::MIN] {
            assert!(matches!(
                ordinal_index(Some(position), 3),
                Err(TemporaError::InvalidPosition { siblings: 3, .. })
            ));
        }
    }
}
