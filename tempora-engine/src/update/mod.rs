//! Structural updates that version the store instead of overwriting it
//!
//! A [`Mutation`] is one externally visible edit: it takes a single cut when it begins and
//! every operation run through it writes at that cut, inside the caller's transaction.

mod delete;
mod insert;
mod path;
mod reparent;
mod value;

pub use insert::ordinal_index;
pub use path::{parse_path, PathSegment};

use tracing::debug;

use tempora_core::config::RenderConfig;
use tempora_core::{Document, OrderClassId, TemporaError, TemporaResult, Timestamp};
use tempora_storage::{NodeRow, StoreView};

use crate::handle::NodeHandle;
use crate::session::Session;

pub struct Mutation<'c> {
    session: Session<'c>,
    cut: Timestamp,
}

impl<'c> Mutation<'c> {
    /// Advance the document clock and open a mutation at the new cut
    pub fn begin(
        view: StoreView<'c>,
        document: Document,
        render: RenderConfig,
    ) -> TemporaResult<Self> {
        let cut = view.advance_cut(document.id)?;
        debug!("Mutation of '{}' at cut {}", document.name, cut);
        Ok(Self {
            session: Session::new(view, document, render),
            cut,
        })
    }

    pub fn cut(&self) -> Timestamp {
        self.cut
    }

    /// Navigation sees the writes made so far
    pub fn session(&mut self) -> &mut Session<'c> {
        &mut self.session
    }

    fn view(&self) -> StoreView<'c> {
        self.session.view()
    }

    /// The record of `node` valid at the cut
    fn live(&mut self, node: &NodeHandle) -> TemporaResult<NodeHandle> {
        let fresh = self.session.refresh(node)?;
        if fresh.covers(self.cut) {
            Ok(fresh)
        } else {
            Err(TemporaError::UnknownNode(format!(
                "{} is not valid at cut {}",
                fresh, self.cut
            )))
        }
    }

    /// Records bound to `parent` that are valid at the cut
    fn live_children(&self, parent: &NodeHandle) -> TemporaResult<Vec<NodeRow>> {
        let cut = self.cut;
        Ok(self
            .view()
            .child_rows(parent.key())?
            .into_iter()
            .filter(|row| row.record.covers(cut))
            .collect())
    }

    fn order_class_at(&self, depth: u32) -> TemporaResult<OrderClassId> {
        let document = self.session.document().id;
        self.view()
            .order_class_at_depth(document, depth)?
            .map(|class| class.id)
            .ok_or_else(|| {
                TemporaError::InconsistentOrderingState(format!(
                    "no order class for depth {}",
                    depth
                ))
            })
    }

    /// Remove a live node from its depth's order and end its record at the cut
    fn unbind(&mut self, node: &NodeHandle) -> TemporaResult<()> {
        let view = self.view();
        let class = self.order_class_at(node.depth())?;
        let order = view.order_record_for_cut(class, self.cut)?;
        view.write_members_at_cut(class, self.cut, &order.members.removed(node.id())?)?;

        let stored = view
            .node_record(node.key())?
            .ok_or_else(|| TemporaError::UnknownNode(node.key().to_string()))?;
        view.close_node_record(&stored, self.cut)?;

        self.session.invalidate_node(node.id());
        debug!("Unbound {} at cut {}", node, self.cut);
        Ok(())
    }
}
