//! Document-order comparator
//!
//! [`DocumentOrder`] orders node handles drawn from any mix of depths and times. Handles whose
//! intervals share an instant are compared at that instant: the deeper one is lifted through
//! its ancestors until both sit at one depth, then their positions in that depth's order
//! record decide. Handles that never coexisted fall back to their historical positions, or to
//! depth.
//!
//! All caches live on the comparator value and are dropped with it, so one instance serves
//! exactly one sort.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

use tempora_core::{
    DocumentId, Interval, NodeId, OrderClassId, ParentLink, TemporaError, TemporaResult,
    Timestamp,
};
use tempora_storage::{OrderRecord, StoreView};

use crate::handle::NodeHandle;

/// The fields of a handle the comparator needs, cheap to copy while walking ancestors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Place {
    id: NodeId,
    valid: Interval,
    depth: u32,
    parent: Option<ParentLink>,
    facet: u8,
}

impl From<&NodeHandle> for Place {
    fn from(handle: &NodeHandle) -> Self {
        Self {
            id: handle.id(),
            valid: handle.valid(),
            depth: handle.depth(),
            parent: handle.parent_link(),
            facet: handle.facet_rank(),
        }
    }
}

pub struct DocumentOrder<'c> {
    view: StoreView<'c>,
    document: DocumentId,
    classes: HashMap<u32, Option<OrderClassId>>,
    /// `(depth, node) -> validFrom -> (validTo, position)`
    levels: HashMap<(u32, NodeId), BTreeMap<Timestamp, (Timestamp, usize)>>,
    loaded: HashSet<(OrderClassId, Timestamp)>,
    ancestors: HashMap<ParentLink, Place>,
}

impl<'c> DocumentOrder<'c> {
    pub fn new(view: StoreView<'c>, document: DocumentId) -> Self {
        Self {
            view,
            document,
            classes: HashMap::new(),
            levels: HashMap::new(),
            loaded: HashSet::new(),
            ancestors: HashMap::new(),
        }
    }

    /// Sort handles into document order
    pub fn sort(&mut self, nodes: Vec<NodeHandle>) -> TemporaResult<Vec<NodeHandle>> {
        self.prepare(&nodes)?;
        self.merge_sort(nodes)
    }

    /// Load every order record intersecting each node's own interval at its own depth
    pub fn prepare(&mut self, nodes: &[NodeHandle]) -> TemporaResult<()> {
        for node in nodes {
            let Some(class) = self.class_at(node.depth())? else {
                continue;
            };
            for record in self.view.order_records_between(class, node.valid())? {
                self.absorb(node.depth(), &record);
            }
        }
        Ok(())
    }

    pub fn compare(&mut self, a: &NodeHandle, b: &NodeHandle) -> TemporaResult<Ordering> {
        self.compare_places(Place::from(a), Place::from(b))
    }

    fn compare_places(&mut self, a: Place, b: Place) -> TemporaResult<Ordering> {
        if a.id == b.id && a.valid == b.valid {
            return Ok(a.facet.cmp(&b.facet));
        }
        match a.valid.intersection(&b.valid) {
            Some(shared) => self.compare_at(a, b, shared.from),
            None => self.compare_apart(a, b),
        }
    }

    /// Both places exist at `t`
    fn compare_at(&mut self, a: Place, b: Place, t: Timestamp) -> TemporaResult<Ordering> {
        let mut x = a;
        let mut y = b;
        while x.depth > y.depth {
            x = self.parent_of(&x, t)?;
        }
        while y.depth > x.depth {
            y = self.parent_of(&y, t)?;
        }

        // One was an ancestor of the other
        if x.id == y.id {
            return Ok(a.depth.cmp(&b.depth).then(a.facet.cmp(&b.facet)));
        }

        let px = self.position_at(x.depth, x.id, t)?;
        let py = self.position_at(y.depth, y.id, t)?;
        match px.cmp(&py) {
            Ordering::Equal => {
                warn!(
                    "Nodes {} and {} share position {} at depth {} (t={})",
                    x.id, y.id, px, x.depth, t
                );
                Ok(a.depth.cmp(&b.depth).then(a.id.cmp(&b.id)))
            }
            order => Ok(order),
        }
    }

    /// The places never coexisted: use historical positions at one depth, depth otherwise
    fn compare_apart(&mut self, a: Place, b: Place) -> TemporaResult<Ordering> {
        if a.depth != b.depth {
            return Ok(a.depth.cmp(&b.depth));
        }
        let pa = self.position_at(a.depth, a.id, a.valid.from)?;
        let pb = self.position_at(b.depth, b.id, b.valid.from)?;
        Ok(pa
            .cmp(&pb)
            .then(a.valid.from.cmp(&b.valid.from))
            .then(a.id.cmp(&b.id))
            .then(a.facet.cmp(&b.facet)))
    }

    fn parent_of(&mut self, place: &Place, t: Timestamp) -> TemporaResult<Place> {
        let link = place.parent.ok_or_else(|| {
            TemporaError::UnknownNode(format!("node {} at depth {} has no parent", place.id, place.depth))
        })?;
        if let Some(parent) = self.ancestors.get(&link) {
            if parent.valid.covers(t) {
                return Ok(*parent);
            }
        }

        let row = match self.view.parent_row(&link)? {
            Some(row) if row.record.covers(t) => Some(row),
            _ => self.view.node_row_at(link.id, t)?,
        };
        let row = row.ok_or_else(|| {
            TemporaError::UnknownNode(format!("parent {} of node {} at {}", link.id, place.id, t))
        })?;
        let parent = Place::from(&NodeHandle::from_row(row));
        self.ancestors.insert(link, parent);
        Ok(parent)
    }

    fn position_at(&mut self, depth: u32, id: NodeId, t: Timestamp) -> TemporaResult<usize> {
        if let Some(position) = self.cached_position(depth, id, t) {
            return Ok(position);
        }

        let class = self.class_at(depth)?.ok_or_else(|| {
            TemporaError::InconsistentOrderingState(format!("no order class for depth {}", depth))
        })?;
        let record = self.view.order_record_at(class, t)?.ok_or_else(|| {
            TemporaError::InconsistentOrderingState(format!(
                "no order record for depth {} at {}",
                depth, t
            ))
        })?;
        self.absorb(depth, &record);

        self.cached_position(depth, id, t).ok_or_else(|| {
            TemporaError::InconsistentOrderingState(format!(
                "node {} is missing from the depth {} order at {}",
                id, depth, t
            ))
        })
    }

    fn cached_position(&self, depth: u32, id: NodeId, t: Timestamp) -> Option<usize> {
        let versions = self.levels.get(&(depth, id))?;
        let (_, (to, position)) = versions.range(..=t).next_back()?;
        (*to >= t).then_some(*position)
    }

    fn absorb(&mut self, depth: u32, record: &OrderRecord) {
        if !self.loaded.insert((record.order_class_id, record.valid.from)) {
            return;
        }
        for (position, id) in record.members.iter().enumerate() {
            self.levels
                .entry((depth, id))
                .or_default()
                .insert(record.valid.from, (record.valid.to, position));
        }
    }

    fn class_at(&mut self, depth: u32) -> TemporaResult<Option<OrderClassId>> {
        if let Some(class) = self.classes.get(&depth) {
            return Ok(*class);
        }
        let class = self
            .view
            .order_class_at_depth(self.document, depth)?
            .map(|c| c.id);
        self.classes.insert(depth, class);
        Ok(class)
    }

    // Stable merge sort that stops on the first failed comparison. History sets mix records
    // from different snapshots, which are not transitively ordered, and `sort_by` may panic
    // on such a comparator.
    fn merge_sort(&mut self, mut nodes: Vec<NodeHandle>) -> TemporaResult<Vec<NodeHandle>> {
        if nodes.len() <= 1 {
            return Ok(nodes);
        }
        let right = nodes.split_off(nodes.len() / 2);
        let left = self.merge_sort(nodes)?;
        let right = self.merge_sort(right)?;

        let mut merged = Vec::with_capacity(left.len() + right.len());
        let mut left = left.into_iter().peekable();
        let mut right = right.into_iter().peekable();
        while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
            if self.compare(r, l)? == Ordering::Less {
                merged.extend(right.next());
            } else {
                merged.extend(left.next());
            }
        }
        merged.extend(left);
        merged.extend(right);
        Ok(merged)
    }
}
