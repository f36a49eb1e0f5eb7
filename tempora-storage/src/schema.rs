//! Table layout of the temporal store
//!
//! Six record tables (document, namespace, node_class, order_class, node_record,
//! order_record) plus the id sequences and the per-document clock.

use rusqlite::Connection;
use tracing::info;

use crate::context::SqlContext;
use tempora_core::TemporaResult;

const CREATE: &str = r#"
CREATE TABLE IF NOT EXISTS document (
    id          INTEGER PRIMARY KEY,
    name        TEXT NOT NULL UNIQUE,
    header      TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS namespace (
    id          INTEGER PRIMARY KEY,
    uri         TEXT NOT NULL,
    prefix      TEXT NOT NULL,
    document_id INTEGER NOT NULL REFERENCES document(id),
    UNIQUE (uri, prefix, document_id)
);

CREATE TABLE IF NOT EXISTS node_class (
    id              INTEGER PRIMARY KEY,
    kind            INTEGER NOT NULL,
    local_name      TEXT NOT NULL,
    namespace_id    INTEGER REFERENCES namespace(id),
    depth           INTEGER NOT NULL,
    parent_class_id INTEGER REFERENCES node_class(id),
    document_id     INTEGER NOT NULL REFERENCES document(id)
);
CREATE INDEX IF NOT EXISTS node_class_shape
    ON node_class (document_id, local_name, kind, depth);

CREATE TABLE IF NOT EXISTS order_class (
    id              INTEGER PRIMARY KEY,
    depth           INTEGER NOT NULL,
    parent_class_id INTEGER REFERENCES node_class(id),
    document_id     INTEGER NOT NULL REFERENCES document(id)
);
CREATE INDEX IF NOT EXISTS order_class_depth
    ON order_class (document_id, depth);

CREATE TABLE IF NOT EXISTS node_record (
    node_id           INTEGER NOT NULL,
    valid_from        INTEGER NOT NULL,
    valid_to          INTEGER NOT NULL,
    parent_id         INTEGER,
    parent_valid_from INTEGER,
    parent_valid_to   INTEGER,
    value             TEXT,
    node_class_id     INTEGER NOT NULL REFERENCES node_class(id),
    PRIMARY KEY (node_id, valid_from, valid_to)
);
CREATE INDEX IF NOT EXISTS node_record_parent
    ON node_record (parent_id, parent_valid_from);
CREATE INDEX IF NOT EXISTS node_record_class
    ON node_record (node_class_id);

CREATE TABLE IF NOT EXISTS order_record (
    valid_from     INTEGER NOT NULL,
    valid_to       INTEGER NOT NULL,
    members        BLOB NOT NULL,
    order_class_id INTEGER NOT NULL REFERENCES order_class(id),
    PRIMARY KEY (valid_from, valid_to, order_class_id)
);
CREATE INDEX IF NOT EXISTS order_record_class
    ON order_record (order_class_id, valid_from);

CREATE TABLE IF NOT EXISTS document_clock (
    document_id INTEGER PRIMARY KEY REFERENCES document(id),
    current_cut INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS id_sequence (
    name       TEXT PRIMARY KEY,
    next_value INTEGER NOT NULL
);
"#;

const DROP: &str = r#"
DROP TABLE IF EXISTS order_record;
DROP TABLE IF EXISTS node_record;
DROP TABLE IF EXISTS order_class;
DROP TABLE IF EXISTS node_class;
DROP TABLE IF EXISTS namespace;
DROP TABLE IF EXISTS document_clock;
DROP TABLE IF EXISTS id_sequence;
DROP TABLE IF EXISTS document;
"#;

/// Create every table and index. Safe to run against an existing store.
pub fn create(conn: &Connection) -> TemporaResult<()> {
    conn.execute_batch(CREATE).sql("create schema")?;
    info!("Temporal store schema ready");
    Ok(())
}

/// Drop every table owned by the store
pub fn drop(conn: &Connection) -> TemporaResult<()> {
    conn.execute_batch(DROP).sql("drop schema")?;
    info!("Temporal store schema dropped");
    Ok(())
}

/// Whether the record tables exist
pub fn exists(conn: &Connection) -> TemporaResult<bool> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('document', 'namespace', 'node_class', 'order_class', 'node_record', 'order_record')",
            [],
            |row| row.get(0),
        )
        .sql("inspect schema")?;
    Ok(count == 6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_is_idempotent_and_droppable() {
        let conn = Connection::open_in_memory().unwrap();
        assert!(!exists(&conn).unwrap());

        create(&conn).unwrap();
        create(&conn).unwrap();
        assert!(exists(&conn).unwrap());

        drop(&conn).unwrap();
        assert!(!exists(&conn).unwrap());
    }
}
