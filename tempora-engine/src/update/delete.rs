//! Soft delete

use tracing::debug;

use tempora_core::{TemporaError, TemporaResult};

use super::Mutation;
use crate::handle::NodeHandle;

impl<'c> Mutation<'c> {
    /// End the validity of `node` and everything below it at the cut. Returns `false` without
    /// writing anything when the node is not valid at the cut.
    pub fn delete_subtree(&mut self, node: &NodeHandle) -> TemporaResult<bool> {
        if node.is_synthetic() {
            return Err(TemporaError::InvalidInput(format!("cannot delete {}", node)));
        }
        let node = self.session.refresh(node)?;
        if !node.covers(self.cut) {
            debug!("{} is not valid at cut {}, nothing to delete", node, self.cut);
            return Ok(false);
        }
        self.delete_below(&node)?;
        Ok(true)
    }

    fn delete_below(&mut self, node: &NodeHandle) -> TemporaResult<()> {
        let mut rows = self.live_children(node)?;
        // Attributes before content
        rows.sort_by_key(|row| !row.class.kind.is_attribute());
        for row in rows {
            self.delete_below(&NodeHandle::from_row(row))?;
        }
        self.unbind(node)
    }
}
