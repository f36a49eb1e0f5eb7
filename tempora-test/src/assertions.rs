//! Invariant assertions over the raw store
//!
//! These read records directly rather than through the engine, so they catch a mutation
//! that leaves the store inconsistent even when navigation happens to look right.

use std::collections::{BTreeSet, HashSet};

use tempora_core::{DocumentId, NodeId, TemporaResult, TimeFilter};
use tempora_storage::StoreView;

/// Describe every instant at which a depth's order record disagrees with the node records
/// valid at that depth. Instants checked are every record boundary in the document.
pub fn order_violations(view: StoreView<'_>, document: DocumentId) -> TemporaResult<Vec<String>> {
    let mut violations = Vec::new();
    let rows = view.node_rows(document, TimeFilter::All)?;
    let depths: BTreeSet<u32> = rows.iter().map(|r| r.class.depth).collect();

    for depth in depths {
        let Some(class) = view.order_class_at_depth(document, depth)? else {
            violations.push(format!("depth {} has nodes but no order class", depth));
            continue;
        };
        let at_depth: Vec<_> = rows.iter().filter(|r| r.class.depth == depth).collect();
        let orders = view.order_records(class.id)?;

        let mut instants = BTreeSet::new();
        for valid in at_depth
            .iter()
            .map(|r| r.record.valid)
            .chain(orders.iter().map(|o| o.valid))
        {
            instants.insert(valid.from);
            if !valid.is_open() {
                instants.insert(valid.to.succ());
            }
        }

        for t in instants {
            let expected: HashSet<NodeId> = at_depth
                .iter()
                .filter(|r| r.record.covers(t))
                .map(|r| r.record.node_id)
                .collect();
            let covering: Vec<_> = orders.iter().filter(|o| o.covers(t)).collect();
            if covering.len() > 1 {
                violations.push(format!("depth {} has {} order records at {}", depth, covering.len(), t));
                continue;
            }
            let actual: HashSet<NodeId> = covering
                .first()
                .map(|o| o.members.iter().collect())
                .unwrap_or_default();
            if actual != expected {
                violations.push(format!(
                    "depth {} at {}: ordered {:?}, valid {:?}",
                    depth,
                    t,
                    sorted(&actual),
                    sorted(&expected)
                ));
            }
        }
    }
    Ok(violations)
}

/// Assert order-array completeness for every depth and recorded instant of a document
pub fn assert_order_complete(view: StoreView<'_>, document: DocumentId) -> TemporaResult<()> {
    let violations = order_violations(view, document)?;
    assert!(
        violations.is_empty(),
        "Order records disagree with node records:\n{}",
        violations.join("\n")
    );
    Ok(())
}

fn sorted(ids: &HashSet<NodeId>) -> Vec<i64> {
    let mut ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
    ids.sort_unstable();
    ids
}

