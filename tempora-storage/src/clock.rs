//! Document clocks and id sequences

use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use tracing::debug;

use crate::context::SqlContext;
use crate::store::{Sequence, StoreView};
use tempora_core::config::ClockMode;
use tempora_core::{DocumentId, NodeId, TemporaResult, Timestamp};

impl<'c> StoreView<'c> {
    /// Next value of an id sequence (values start at 1)
    pub fn next_id(&self, sequence: Sequence) -> TemporaResult<i64> {
        self.conn
            .query_row(
                "INSERT INTO id_sequence (name, next_value) VALUES (?1, 1) \
                 ON CONFLICT(name) DO UPDATE SET next_value = next_value + 1 \
                 RETURNING next_value",
                params![sequence.name()],
                |row| row.get(0),
            )
            .sql("advance id sequence")
    }

    pub fn allocate_node_id(&self) -> TemporaResult<NodeId> {
        self.next_id(Sequence::Node).map(NodeId)
    }

    /// The latest cut taken for the document, or ORIGIN before the first mutation
    pub fn current_cut(&self, document: DocumentId) -> TemporaResult<Timestamp> {
        let cut: Option<i64> = self
            .conn
            .query_row(
                "SELECT current_cut FROM document_clock WHERE document_id = ?1",
                params![document.0],
                |row| row.get(0),
            )
            .optional()
            .sql("read document clock")?;
        Ok(cut.map(Timestamp).unwrap_or(Timestamp::ORIGIN))
    }

    /// Take a new cut for one externally visible mutation
    pub fn advance_cut(&self, document: DocumentId) -> TemporaResult<Timestamp> {
        let previous = self.current_cut(document)?;
        let next = match self.clock {
            ClockMode::Logical => previous.succ(),
            ClockMode::Wall => previous.succ().max(Timestamp(Utc::now().timestamp_millis())),
        };

        self.conn
            .execute(
                "INSERT INTO document_clock (document_id, current_cut) VALUES (?1, ?2) \
                 ON CONFLICT(document_id) DO UPDATE SET current_cut = excluded.current_cut",
                params![document.0, next.0],
            )
            .sql("advance document clock")?;

        debug!("Document {} advanced cut {} -> {}", document, previous, next);
        Ok(next)
    }
}
