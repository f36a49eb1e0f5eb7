//! Versioned depth-wide ordering sequences
//!
//! An [`OrderSequence`] is an immutable, duplicate-free list of node ids in document order.
//! Every edit returns a new version, so the store can keep the old version on a truncated
//! record while the edited one becomes current at the cut.

use im::Vector;
use serde::{Deserialize, Serialize};
use std::fmt;

use tempora_core::{Interval, NodeId, OrderClassId, TemporaError, TemporaResult, Timestamp};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderSequence {
    members: Vector<NodeId>,
}

impl OrderSequence {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a sequence, rejecting duplicate ids
    pub fn from_vec(ids: Vec<NodeId>) -> TemporaResult<Self> {
        let mut seen = std::collections::HashSet::with_capacity(ids.len());
        for id in &ids {
            if !seen.insert(*id) {
                return Err(TemporaError::InconsistentOrderingState(format!(
                    "node {} appears twice in an order sequence",
                    id
                )));
            }
        }
        Ok(Self {
            members: ids.into_iter().collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<NodeId> {
        self.members.get(index).copied()
    }

    pub fn position(&self, id: NodeId) -> Option<usize> {
        self.members.index_of(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.position(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.members.iter().copied()
    }

    pub fn to_vec(&self) -> Vec<NodeId> {
        self.iter().collect()
    }

    /// New version with `id` spliced in at `index`
    pub fn inserted(&self, index: usize, id: NodeId) -> TemporaResult<Self> {
        if self.contains(id) {
            return Err(TemporaError::InconsistentOrderingState(format!(
                "node {} is already ordered at this depth",
                id
            )));
        }
        if index > self.len() {
            return Err(TemporaError::InconsistentOrderingState(format!(
                "slot {} is past the end of a sequence of {}",
                index,
                self.len()
            )));
        }
        let mut members = self.members.clone();
        members.insert(index, id);
        Ok(Self { members })
    }

    pub fn appended(&self, id: NodeId) -> TemporaResult<Self> {
        self.inserted(self.len(), id)
    }

    /// New version without `id`
    pub fn removed(&self, id: NodeId) -> TemporaResult<Self> {
        let index = self.position(id).ok_or_else(|| {
            TemporaError::InconsistentOrderingState(format!(
                "node {} is not ordered at this depth",
                id
            ))
        })?;
        let mut members = self.members.clone();
        members.remove(index);
        Ok(Self { members })
    }

    pub fn encode(&self) -> TemporaResult<Vec<u8>> {
        let raw: Vec<i64> = self.iter().map(i64::from).collect();
        bincode::serialize(&raw).map_err(|e| TemporaError::Serialization(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> TemporaResult<Self> {
        let raw: Vec<i64> =
            bincode::deserialize(bytes).map_err(|e| TemporaError::Serialization(e.to_string()))?;
        Self::from_vec(raw.into_iter().map(NodeId).collect())
    }
}

impl fmt::Display for OrderSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, id) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", id)?;
        }
        write!(f, "]")
    }
}

impl Serialize for OrderSequence {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

impl<'de> Deserialize<'de> for OrderSequence {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids = Vec::<NodeId>::deserialize(deserializer)?;
        Self::from_vec(ids).map_err(serde::de::Error::custom)
    }
}

/// Document order of every node alive at one depth throughout `valid`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRecord {
    pub valid: Interval,
    pub members: OrderSequence,
    pub order_class_id: OrderClassId,
}

impl OrderRecord {
    pub fn new(order_class_id: OrderClassId, valid: Interval, members: OrderSequence) -> Self {
        Self {
            valid,
            members,
            order_class_id,
        }
    }

    pub fn covers(&self, t: Timestamp) -> bool {
        self.valid.covers(t)
    }
}
