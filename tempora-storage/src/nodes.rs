//! Node record primitives: existence, parent links and leaf values over time

use rusqlite::{params, OptionalExtension, Row, ToSql};
use tracing::debug;

use crate::context::SqlContext;
use crate::dictionary::{node_class_from_row, NODE_CLASS_COLUMNS};
use crate::store::{NodeRow, StoreView};
use tempora_core::{
    DocumentId, Interval, NodeClassId, NodeId, NodeKey, NodeKind, NodeRecord, ParentLink,
    TemporaError, TemporaResult, TimeFilter, Timestamp,
};

const RECORD_COLUMNS: &str = "r.node_id, r.valid_from, r.valid_to, r.parent_id, \
     r.parent_valid_from, r.parent_valid_to, r.value, r.node_class_id";

fn node_record_from_row(row: &Row<'_>) -> rusqlite::Result<NodeRecord> {
    let parent_id: Option<i64> = row.get(3)?;
    let parent = match parent_id {
        Some(id) => Some(ParentLink {
            id: NodeId(id),
            valid: Interval::new(Timestamp(row.get(4)?), Timestamp(row.get(5)?)),
        }),
        None => None,
    };
    Ok(NodeRecord {
        node_id: NodeId(row.get(0)?),
        valid: Interval::new(Timestamp(row.get(1)?), Timestamp(row.get(2)?)),
        parent,
        value: row.get(6)?,
        node_class_id: NodeClassId(row.get(7)?),
    })
}

fn node_row_from_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
    Ok(NodeRow {
        record: node_record_from_row(row)?,
        class: node_class_from_row(row, 8)?,
    })
}

fn joined(condition: &str) -> String {
    format!(
        "SELECT {}, {} FROM node_record r JOIN node_class c ON c.id = r.node_class_id WHERE {} \
         ORDER BY r.valid_from, r.node_id",
        RECORD_COLUMNS, NODE_CLASS_COLUMNS, condition
    )
}

impl<'c> StoreView<'c> {
    pub fn insert_node_record(&self, record: &NodeRecord) -> TemporaResult<()> {
        let parent = record.parent.as_ref();
        self.conn
            .execute(
                "INSERT INTO node_record (node_id, valid_from, valid_to, parent_id, \
                 parent_valid_from, parent_valid_to, value, node_class_id) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.node_id.0,
                    record.valid.from.0,
                    record.valid.to.0,
                    parent.map(|p| p.id.0),
                    parent.map(|p| p.valid.from.0),
                    parent.map(|p| p.valid.to.0),
                    record.value,
                    record.node_class_id.0
                ],
            )
            .sql("insert node record")?;
        debug!("Node record {} written", record.key());
        Ok(())
    }

    pub fn node_record(&self, key: NodeKey) -> TemporaResult<Option<NodeRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM node_record r \
                     WHERE r.node_id = ?1 AND r.valid_from = ?2 AND r.valid_to = ?3",
                    RECORD_COLUMNS
                ),
                params![key.id.0, key.valid.from.0, key.valid.to.0],
                node_record_from_row,
            )
            .optional()
            .sql("load node record")
    }

    /// The record of `id` whose interval covers `t`
    pub fn node_record_at(&self, id: NodeId, t: Timestamp) -> TemporaResult<Option<NodeRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM node_record r \
                     WHERE r.node_id = ?1 AND r.valid_from <= ?2 AND r.valid_to >= ?2",
                    RECORD_COLUMNS
                ),
                params![id.0, t.0],
                node_record_from_row,
            )
            .optional()
            .sql("load node record at instant")
    }

    pub fn latest_node_record(&self, id: NodeId) -> TemporaResult<Option<NodeRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM node_record r WHERE r.node_id = ?1 \
                     ORDER BY r.valid_from DESC LIMIT 1",
                    RECORD_COLUMNS
                ),
                params![id.0],
                node_record_from_row,
            )
            .optional()
            .sql("load latest node record")
    }

    /// Every record of `id`, oldest first
    pub fn node_history(&self, id: NodeId) -> TemporaResult<Vec<NodeRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {} FROM node_record r WHERE r.node_id = ?1 ORDER BY r.valid_from",
                RECORD_COLUMNS
            ))
            .sql("prepare node history")?;
        let rows = stmt
            .query_map(params![id.0], node_record_from_row)
            .sql("load node history")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().sql("load node history")
    }

    /// End a record's validity at `cut - 1`. A record that starts at or after the cut was
    /// never visible and is deleted outright; `None` is returned in that case.
    pub fn close_node_record(
        &self,
        record: &NodeRecord,
        cut: Timestamp,
    ) -> TemporaResult<Option<NodeRecord>> {
        let key = record.key();
        match record.valid.truncated_at(cut) {
            None => {
                self.conn
                    .execute(
                        "DELETE FROM node_record \
                         WHERE node_id = ?1 AND valid_from = ?2 AND valid_to = ?3",
                        params![key.id.0, key.valid.from.0, key.valid.to.0],
                    )
                    .sql("delete node record")?;
                debug!("Node record {} deleted at cut {}", key, cut);
                Ok(None)
            }
            Some(valid) => {
                self.conn
                    .execute(
                        "UPDATE node_record SET valid_to = ?4 \
                         WHERE node_id = ?1 AND valid_from = ?2 AND valid_to = ?3",
                        params![key.id.0, key.valid.from.0, key.valid.to.0, valid.to.0],
                    )
                    .sql("truncate node record")?;
                debug!("Node record {} truncated to {}", key, valid);
                Ok(Some(NodeRecord {
                    valid,
                    ..record.clone()
                }))
            }
        }
    }

    /// Close `record` at the cut and carry the node forward from the cut with new content
    pub fn split_node_record(
        &self,
        record: &NodeRecord,
        cut: Timestamp,
        parent: Option<ParentLink>,
        value: Option<String>,
        node_class_id: NodeClassId,
    ) -> TemporaResult<NodeRecord> {
        self.close_node_record(record, cut)?;
        let next = NodeRecord {
            node_id: record.node_id,
            valid: Interval::open_from(cut),
            parent,
            value,
            node_class_id,
        };
        self.insert_node_record(&next)?;
        Ok(next)
    }

    /// Overwrite the value of a record in place
    pub fn replace_node_value(&self, key: NodeKey, value: Option<&str>) -> TemporaResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE node_record SET value = ?4 \
                 WHERE node_id = ?1 AND valid_from = ?2 AND valid_to = ?3",
                params![key.id.0, key.valid.from.0, key.valid.to.0, value],
            )
            .sql("replace node value")?;
        if changed == 0 {
            return Err(TemporaError::UnknownNode(key.to_string()));
        }
        Ok(())
    }

    /// Give the node a new value from `cut` on. Splits unless the record already starts at
    /// the cut, in which case the value is replaced in place.
    pub fn set_node_value(
        &self,
        record: &NodeRecord,
        cut: Timestamp,
        value: Option<String>,
    ) -> TemporaResult<NodeRecord> {
        if record.valid.from == cut {
            self.replace_node_value(record.key(), value.as_deref())?;
            return Ok(NodeRecord {
                value,
                ..record.clone()
            });
        }
        self.split_node_record(record, cut, record.parent, value, record.node_class_id)
    }

    // Joined reads

    pub fn node_row(&self, key: NodeKey) -> TemporaResult<Option<NodeRow>> {
        self.conn
            .query_row(
                &joined("r.node_id = ?1 AND r.valid_from = ?2 AND r.valid_to = ?3"),
                params![key.id.0, key.valid.from.0, key.valid.to.0],
                node_row_from_row,
            )
            .optional()
            .sql("load node")
    }

    pub fn node_row_at(&self, id: NodeId, t: Timestamp) -> TemporaResult<Option<NodeRow>> {
        self.conn
            .query_row(
                &joined("r.node_id = ?1 AND r.valid_from <= ?2 AND r.valid_to >= ?2"),
                params![id.0, t.0],
                node_row_from_row,
            )
            .optional()
            .sql("load node at instant")
    }

    pub fn latest_node_row(&self, id: NodeId) -> TemporaResult<Option<NodeRow>> {
        let latest = match self.latest_node_record(id)? {
            Some(record) => record,
            None => return Ok(None),
        };
        self.node_row(latest.key())
    }

    /// The parent record a link was bound to: the record of the parent node whose interval
    /// covers the start of the link
    pub fn parent_row(&self, link: &ParentLink) -> TemporaResult<Option<NodeRow>> {
        self.node_row_at(link.id, link.valid.from)
    }

    /// Every record, at any time, that was bound to the given parent record
    pub fn child_rows(&self, parent: NodeKey) -> TemporaResult<Vec<NodeRow>> {
        self.rows(
            &joined("r.parent_id = ?1 AND r.parent_valid_from BETWEEN ?2 AND ?3"),
            &[&parent.id.0, &parent.valid.from.0, &parent.valid.to.0],
        )
    }

    /// Root element records (no parent link) of a document
    pub fn root_rows(&self, document: DocumentId, filter: TimeFilter) -> TemporaResult<Vec<NodeRow>> {
        let window = filter.window();
        self.rows(
            &joined(
                "c.document_id = ?1 AND r.parent_id IS NULL \
                 AND r.valid_from <= ?3 AND r.valid_to >= ?2",
            ),
            &[&document.0, &window.from.0, &window.to.0],
        )
    }

    pub fn node_rows(&self, document: DocumentId, filter: TimeFilter) -> TemporaResult<Vec<NodeRow>> {
        let window = filter.window();
        self.rows(
            &joined("c.document_id = ?1 AND r.valid_from <= ?3 AND r.valid_to >= ?2"),
            &[&document.0, &window.from.0, &window.to.0],
        )
    }

    /// Records by local name, optionally restricted to one kind
    pub fn node_rows_by_label(
        &self,
        document: DocumentId,
        local_name: &str,
        kind: Option<NodeKind>,
        filter: TimeFilter,
    ) -> TemporaResult<Vec<NodeRow>> {
        let window = filter.window();
        let code = kind.map(|k| k.code());
        self.rows(
            &joined(
                "c.document_id = ?1 AND c.local_name = ?2 AND (?3 IS NULL OR c.kind = ?3) \
                 AND r.valid_from <= ?5 AND r.valid_to >= ?4",
            ),
            &[&document.0, &local_name, &code, &window.from.0, &window.to.0],
        )
    }

    pub fn node_rows_by_class(
        &self,
        class: NodeClassId,
        filter: TimeFilter,
    ) -> TemporaResult<Vec<NodeRow>> {
        let window = filter.window();
        self.rows(
            &joined("r.node_class_id = ?1 AND r.valid_from <= ?3 AND r.valid_to >= ?2"),
            &[&class.0, &window.from.0, &window.to.0],
        )
    }

    pub fn node_rows_at_depth(
        &self,
        document: DocumentId,
        depth: u32,
        filter: TimeFilter,
    ) -> TemporaResult<Vec<NodeRow>> {
        let window = filter.window();
        let depth = depth as i64;
        self.rows(
            &joined("c.document_id = ?1 AND c.depth = ?2 AND r.valid_from <= ?4 AND r.valid_to >= ?3"),
            &[&document.0, &depth, &window.from.0, &window.to.0],
        )
    }

    /// Records whose validity ended strictly before `before`
    pub fn expired_rows(&self, document: DocumentId, before: Timestamp) -> TemporaResult<Vec<NodeRow>> {
        self.rows(
            &joined("c.document_id = ?1 AND r.valid_to < ?2"),
            &[&document.0, &before.0],
        )
    }

    fn rows(&self, sql: &str, params: &[&dyn ToSql]) -> TemporaResult<Vec<NodeRow>> {
        let mut stmt = self.conn.prepare_cached(sql).sql("prepare node query")?;
        let rows = stmt
            .query_map(params, node_row_from_row)
            .sql("query nodes")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().sql("query nodes")
    }
}

#[cfg(test)]
mod tests {
    use crate::store::{StoreView, TemporalStore};
    use pretty_assertions::assert_eq;
    use tempora_core::{
        DocumentId, Interval, NodeClass, NodeId, NodeKind, NodeRecord, ParentLink, TemporaResult,
        TimeFilter, Timestamp,
    };

    fn iv(from: i64, to: i64) -> Interval {
        Interval::new(Timestamp(from), Timestamp(to))
    }

    struct Fixture {
        doc: DocumentId,
        root_class: NodeClass,
        child_class: NodeClass,
    }

    fn fixture(view: StoreView<'_>) -> TemporaResult<Fixture> {
        let doc = view.create_document("catalog", "")?.id;
        let root_class = view.find_or_create_node_class(doc, NodeKind::Element, "catalog", None, 1, None)?;
        let child_class =
            view.find_or_create_node_class(doc, NodeKind::Element, "book", None, 2, Some(root_class.id))?;
        Ok(Fixture { doc, root_class, child_class })
    }

    fn record(id: i64, valid: Interval, parent: Option<ParentLink>, class: &NodeClass) -> NodeRecord {
        NodeRecord {
            node_id: NodeId(id),
            valid,
            parent,
            value: None,
            node_class_id: class.id,
        }
    }

    #[test]
    fn test_close_truncates_or_deletes() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let fx = fixture(view)?;
                let old = record(1, Interval::open_from(Timestamp(1)), None, &fx.root_class);
                let fresh = record(2, Interval::open_from(Timestamp(5)), None, &fx.root_class);
                view.insert_node_record(&old)?;
                view.insert_node_record(&fresh)?;

                let closed = view.close_node_record(&old, Timestamp(5))?.unwrap();
                assert_eq!(closed.valid, iv(1, 4));
                assert_eq!(view.node_history(NodeId(1))?, vec![closed]);

                assert!(view.close_node_record(&fresh, Timestamp(5))?.is_none());
                assert!(view.node_history(NodeId(2))?.is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_children_resolve_through_truncated_parent() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let fx = fixture(view)?;
                let root = record(1, Interval::open_from(Timestamp(1)), None, &fx.root_class);
                view.insert_node_record(&root)?;
                let link = ParentLink::from(root.key());
                view.insert_node_record(&record(2, Interval::open_from(Timestamp(1)), Some(link), &fx.child_class))?;
                view.insert_node_record(&record(3, Interval::open_from(Timestamp(2)), Some(link), &fx.child_class))?;

                let closed = view.close_node_record(&root, Timestamp(4))?.unwrap();
                let children = view.child_rows(closed.key())?;
                assert_eq!(children.len(), 2);
                assert_eq!(children[0].class.local_name, "book");

                let parent = view.parent_row(&children[1].record.parent.unwrap())?.unwrap();
                assert_eq!(parent.record, closed);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_value_split_and_in_place_replace() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let fx = fixture(view)?;
                let mut text = record(1, Interval::open_from(Timestamp(1)), None, &fx.child_class);
                text.value = Some("old".to_string());
                view.insert_node_record(&text)?;

                let split = view.set_node_value(&text, Timestamp(3), Some("new".to_string()))?;
                assert_eq!(split.valid, Interval::open_from(Timestamp(3)));
                let replaced = view.set_node_value(&split, Timestamp(3), Some("newer".to_string()))?;
                assert_eq!(replaced.valid, split.valid);

                let history = view.node_history(NodeId(1))?;
                assert_eq!(history.len(), 2);
                assert_eq!(history[0].value.as_deref(), Some("old"));
                assert_eq!(history[0].valid, iv(1, 2));
                assert_eq!(history[1].value.as_deref(), Some("newer"));
                assert_eq!(view.node_record_at(NodeId(1), Timestamp(2))?.unwrap().value.as_deref(), Some("old"));
                assert_eq!(view.latest_node_record(NodeId(1))?.unwrap(), history[1]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_filtered_queries() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let fx = fixture(view)?;
                let root = record(1, Interval::open_from(Timestamp(1)), None, &fx.root_class);
                view.insert_node_record(&root)?;
                let link = ParentLink::from(root.key());
                view.insert_node_record(&record(2, iv(1, 4), Some(link), &fx.child_class))?;
                view.insert_node_record(&record(3, Interval::open_from(Timestamp(3)), Some(link), &fx.child_class))?;

                let at = |t| TimeFilter::At(Timestamp(t));
                assert_eq!(view.node_rows_by_label(fx.doc, "book", None, at(2))?.len(), 1);
                assert_eq!(view.node_rows_by_label(fx.doc, "book", Some(NodeKind::Element), at(4))?.len(), 2);
                assert_eq!(view.node_rows_by_label(fx.doc, "book", Some(NodeKind::Attribute), TimeFilter::All)?.len(), 0);
                assert_eq!(view.node_rows_by_class(fx.child_class.id, at(9))?.len(), 1);
                assert_eq!(view.node_rows_at_depth(fx.doc, 2, TimeFilter::Between(iv(0, 3)))?.len(), 2);
                assert_eq!(view.root_rows(fx.doc, at(1))?.len(), 1);
                assert_eq!(view.node_rows(fx.doc, TimeFilter::All)?.len(), 3);

                let expired = view.expired_rows(fx.doc, Timestamp(6))?;
                assert_eq!(expired.len(), 1);
                assert_eq!(expired[0].record.node_id, NodeId(2));
                Ok(())
            })
            .unwrap();
    }
}
