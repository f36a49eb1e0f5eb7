//! Leaf value changes

use tempora_core::{NodeKind, TemporaError, TemporaResult};
use tempora_storage::NodeRow;

use super::Mutation;
use crate::handle::NodeHandle;

impl<'c> Mutation<'c> {
    /// Give a text or attribute node a new value from the cut on
    pub fn replace_value(&mut self, node: &NodeHandle, value: &str) -> TemporaResult<NodeHandle> {
        let node = self.live(node)?;
        if node.is_synthetic() || !matches!(node.kind(), NodeKind::Text | NodeKind::Attribute) {
            return Err(TemporaError::InvalidInput(format!(
                "{} does not carry a value",
                node
            )));
        }

        let view = self.view();
        let stored = view
            .node_record(node.key())?
            .ok_or_else(|| TemporaError::UnknownNode(node.key().to_string()))?;
        let record = view.set_node_value(&stored, self.cut, Some(value.to_string()))?;
        let class = view.node_class(record.node_class_id)?;

        self.session.invalidate_node(node.id());
        Ok(self.session.adopt(NodeRow { record, class }))
    }
}
