//! Order record primitives
//!
//! Every depth of a document has one ordering sequence whose versions tile time. Writes always
//! go to the version starting at the current cut: [`StoreView::order_record_for_cut`] splits the
//! open version when needed, and [`StoreView::write_members_at_cut`] stores the edited members,
//! merging the cut version back into its predecessor when the edit turned out to be a no-op.

use rusqlite::{params, OptionalExtension, Row};
use tracing::debug;

use crate::context::{row_error, SqlContext};
use crate::order::{OrderRecord, OrderSequence};
use crate::store::StoreView;
use tempora_core::{Interval, NodeId, OrderClassId, TemporaError, TemporaResult, Timestamp};

const ORDER_COLUMNS: &str = "valid_from, valid_to, members, order_class_id";

fn order_record_from_row(row: &Row<'_>) -> rusqlite::Result<OrderRecord> {
    let blob: Vec<u8> = row.get(2)?;
    let members = OrderSequence::decode(&blob).map_err(|e| row_error(2, e))?;
    Ok(OrderRecord {
        valid: Interval::new(Timestamp(row.get(0)?), Timestamp(row.get(1)?)),
        members,
        order_class_id: OrderClassId(row.get(3)?),
    })
}

impl<'c> StoreView<'c> {
    /// The version covering `t`
    pub fn order_record_at(
        &self,
        class: OrderClassId,
        t: Timestamp,
    ) -> TemporaResult<Option<OrderRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM order_record \
                     WHERE order_class_id = ?1 AND valid_from <= ?2 AND valid_to >= ?2",
                    ORDER_COLUMNS
                ),
                params![class.0, t.0],
                order_record_from_row,
            )
            .optional()
            .sql("load order record")
    }

    /// Every version intersecting `window`, oldest first
    pub fn order_records_between(
        &self,
        class: OrderClassId,
        window: Interval,
    ) -> TemporaResult<Vec<OrderRecord>> {
        let mut stmt = self
            .conn
            .prepare_cached(&format!(
                "SELECT {} FROM order_record \
                 WHERE order_class_id = ?1 AND valid_from <= ?3 AND valid_to >= ?2 \
                 ORDER BY valid_from",
                ORDER_COLUMNS
            ))
            .sql("prepare order records")?;
        let rows = stmt
            .query_map(params![class.0, window.from.0, window.to.0], order_record_from_row)
            .sql("load order records")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().sql("load order records")
    }

    pub fn order_records(&self, class: OrderClassId) -> TemporaResult<Vec<OrderRecord>> {
        self.order_records_between(class, Interval::new(Timestamp(i64::MIN), Timestamp::OPEN))
    }

    /// The version that is valid until further notice
    pub fn open_order_record(&self, class: OrderClassId) -> TemporaResult<Option<OrderRecord>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM order_record WHERE order_class_id = ?1 AND valid_to = ?2",
                    ORDER_COLUMNS
                ),
                params![class.0, Timestamp::OPEN.0],
                order_record_from_row,
            )
            .optional()
            .sql("load open order record")
    }

    pub fn insert_order_record(&self, record: &OrderRecord) -> TemporaResult<()> {
        self.conn
            .execute(
                "INSERT INTO order_record (valid_from, valid_to, members, order_class_id) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    record.valid.from.0,
                    record.valid.to.0,
                    record.members.encode()?,
                    record.order_class_id.0
                ],
            )
            .sql("insert order record")?;
        debug!(
            "Order record {} {} = {}",
            record.order_class_id, record.valid, record.members
        );
        Ok(())
    }

    /// Truncate the version at `old` to end before the cut (deleting it if it starts at the
    /// cut) and store `members` as the version valid from the cut on
    pub fn split_order_interval(
        &self,
        class: OrderClassId,
        old: Interval,
        cut: Timestamp,
        members: OrderSequence,
    ) -> TemporaResult<OrderRecord> {
        match old.truncated_at(cut) {
            None => {
                self.conn
                    .execute(
                        "DELETE FROM order_record \
                         WHERE order_class_id = ?1 AND valid_from = ?2 AND valid_to = ?3",
                        params![class.0, old.from.0, old.to.0],
                    )
                    .sql("delete order record")?;
            }
            Some(truncated) => {
                self.conn
                    .execute(
                        "UPDATE order_record SET valid_to = ?4 \
                         WHERE order_class_id = ?1 AND valid_from = ?2 AND valid_to = ?3",
                        params![class.0, old.from.0, old.to.0, truncated.to.0],
                    )
                    .sql("truncate order record")?;
            }
        }

        let next = OrderRecord::new(class, Interval::open_from(cut), members);
        self.insert_order_record(&next)?;
        Ok(next)
    }

    /// Replace the members of one version in place
    pub fn replace_order_members(
        &self,
        class: OrderClassId,
        interval: Interval,
        members: &OrderSequence,
    ) -> TemporaResult<()> {
        let changed = self
            .conn
            .execute(
                "UPDATE order_record SET members = ?4 \
                 WHERE order_class_id = ?1 AND valid_from = ?2 AND valid_to = ?3",
                params![class.0, interval.from.0, interval.to.0, members.encode()?],
            )
            .sql("replace order members")?;
        if changed == 0 {
            return Err(TemporaError::InconsistentOrderingState(format!(
                "no order record {} for class {}",
                interval, class
            )));
        }
        debug!("Order record {} {} := {}", class, interval, members);
        Ok(())
    }

    /// Fetch or create the version starting at `cut`. An earlier open version is split with its
    /// members carried over; a class without any version gets an empty one.
    pub fn order_record_for_cut(
        &self,
        class: OrderClassId,
        cut: Timestamp,
    ) -> TemporaResult<OrderRecord> {
        match self.open_order_record(class)? {
            Some(open) if open.valid.from == cut => Ok(open),
            Some(open) if open.valid.from < cut => {
                let members = open.members.clone();
                self.split_order_interval(class, open.valid, cut, members)
            }
            Some(open) => Err(TemporaError::InconsistentOrderingState(format!(
                "order class {} already has a version from {} after cut {}",
                class, open.valid.from, cut
            ))),
            None => {
                let record = OrderRecord::new(class, Interval::open_from(cut), OrderSequence::new());
                self.insert_order_record(&record)?;
                Ok(record)
            }
        }
    }

    /// Store `members` as the version starting at `cut`, which must already exist. When the
    /// result equals the version just before the cut, the two are merged back into one.
    pub fn write_members_at_cut(
        &self,
        class: OrderClassId,
        cut: Timestamp,
        members: &OrderSequence,
    ) -> TemporaResult<()> {
        let current = Interval::open_from(cut);
        let previous = if cut > Timestamp(i64::MIN) {
            self.order_record_at(class, cut.pred())?
        } else {
            None
        };

        match previous {
            Some(prev) if prev.valid.to == cut.pred() && prev.members == *members => {
                self.delete_order_record(class, current)?;
                self.conn
                    .execute(
                        "UPDATE order_record SET valid_to = ?3 \
                         WHERE order_class_id = ?1 AND valid_from = ?2",
                        params![class.0, prev.valid.from.0, Timestamp::OPEN.0],
                    )
                    .sql("reopen order record")?;
                debug!("Order record {} {} reopened", class, prev.valid);
                Ok(())
            }
            None if members.is_empty() => self.delete_order_record(class, current),
            _ => self.replace_order_members(class, current, members),
        }
    }

    fn delete_order_record(&self, class: OrderClassId, interval: Interval) -> TemporaResult<()> {
        let changed = self
            .conn
            .execute(
                "DELETE FROM order_record \
                 WHERE order_class_id = ?1 AND valid_from = ?2 AND valid_to = ?3",
                params![class.0, interval.from.0, interval.to.0],
            )
            .sql("delete order record")?;
        if changed == 0 {
            return Err(TemporaError::InconsistentOrderingState(format!(
                "no order record {} for class {}",
                interval, class
            )));
        }
        Ok(())
    }

    /// Position of `id` in the version covering `t`
    pub fn order_position(
        &self,
        class: OrderClassId,
        id: NodeId,
        t: Timestamp,
    ) -> TemporaResult<Option<usize>> {
        Ok(self
            .order_record_at(class, t)?
            .and_then(|record| record.members.position(id)))
    }
}

#[cfg(test)]
mod tests {
    use crate::order::OrderSequence;
    use crate::store::{StoreView, TemporalStore};
    use pretty_assertions::assert_eq;
    use tempora_core::{Interval, NodeId, OrderClassId, TemporaError, TemporaResult, Timestamp};

    fn seq(ids: &[i64]) -> OrderSequence {
        OrderSequence::from_vec(ids.iter().copied().map(NodeId).collect()).unwrap()
    }

    fn iv(from: i64, to: i64) -> Interval {
        Interval::new(Timestamp(from), Timestamp(to))
    }

    fn order_class(view: StoreView<'_>) -> TemporaResult<OrderClassId> {
        let doc = view.create_document("catalog", "")?;
        Ok(view.find_or_create_order_class(doc.id, 2, None)?.id)
    }

    fn intervals(view: StoreView<'_>, class: OrderClassId) -> Vec<(Interval, Vec<NodeId>)> {
        view.order_records(class)
            .unwrap()
            .into_iter()
            .map(|r| (r.valid, r.members.to_vec()))
            .collect()
    }

    #[test]
    fn test_cut_record_is_created_then_split() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let class = order_class(view)?;
                let first = view.order_record_for_cut(class, Timestamp(1))?;
                assert!(first.members.is_empty());
                view.write_members_at_cut(class, Timestamp(1), &seq(&[1, 2]))?;

                let again = view.order_record_for_cut(class, Timestamp(1))?;
                assert_eq!(again.members, seq(&[1, 2]));

                let split = view.order_record_for_cut(class, Timestamp(4))?;
                assert_eq!(split.members, seq(&[1, 2]));
                view.write_members_at_cut(class, Timestamp(4), &seq(&[2]))?;

                assert_eq!(
                    intervals(view, class),
                    vec![
                        (iv(1, 3), vec![NodeId(1), NodeId(2)]),
                        (Interval::open_from(Timestamp(4)), vec![NodeId(2)]),
                    ]
                );
                assert_eq!(view.order_position(class, NodeId(2), Timestamp(3))?, Some(1));
                assert_eq!(view.order_position(class, NodeId(2), Timestamp(9))?, Some(0));
                assert_eq!(view.order_position(class, NodeId(1), Timestamp(9))?, None);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_no_op_edit_coalesces() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let class = order_class(view)?;
                view.order_record_for_cut(class, Timestamp(1))?;
                view.write_members_at_cut(class, Timestamp(1), &seq(&[1]))?;

                let cut = view.order_record_for_cut(class, Timestamp(3))?;
                let inserted = cut.members.appended(NodeId(2))?;
                view.write_members_at_cut(class, Timestamp(3), &inserted)?;
                view.write_members_at_cut(class, Timestamp(3), &inserted.removed(NodeId(2))?)?;

                assert_eq!(
                    intervals(view, class),
                    vec![(Interval::open_from(Timestamp(1)), vec![NodeId(1)])]
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_first_version_emptied_is_removed() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let class = order_class(view)?;
                view.order_record_for_cut(class, Timestamp(2))?;
                view.write_members_at_cut(class, Timestamp(2), &OrderSequence::new())?;
                assert!(view.order_records(class)?.is_empty());
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_split_at_record_start_replaces_it() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let class = order_class(view)?;
                let record = view.order_record_for_cut(class, Timestamp(5))?;
                view.split_order_interval(class, record.valid, Timestamp(5), seq(&[3]))?;
                assert_eq!(
                    intervals(view, class),
                    vec![(Interval::open_from(Timestamp(5)), vec![NodeId(3)])]
                );
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_stale_cut_and_missing_record_are_inconsistent() {
        let mut store = TemporalStore::open_in_memory().unwrap();
        store.bootstrap().unwrap();
        store
            .write(|view| {
                let class = order_class(view)?;
                view.order_record_for_cut(class, Timestamp(5))?;
                assert!(matches!(
                    view.order_record_for_cut(class, Timestamp(3)),
                    Err(TemporaError::InconsistentOrderingState(_))
                ));
                assert!(matches!(
                    view.replace_order_members(class, iv(1, 2), &seq(&[1])),
                    Err(TemporaError::InconsistentOrderingState(_))
                ));
                Ok(())
            })
            .unwrap();
    }
}
