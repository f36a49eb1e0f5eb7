//! SQLite-backed temporal store
//!
//! [`TemporalStore`] owns the connection. Every primitive operation lives on [`StoreView`],
//! a cheap copyable borrow of either the plain connection (reads) or an open transaction
//! (writes), so the same code serves snapshot reads and transactional mutations.

use rusqlite::{Connection, OpenFlags, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::context::SqlContext;
use crate::schema;
use tempora_core::config::{ClockMode, StorageConfig};
use tempora_core::{NodeClass, NodeRecord, TemporaError, TemporaResult};

pub struct TemporalStore {
    conn: Connection,
    clock: ClockMode,
}

impl TemporalStore {
    /// Open (or create) the database described by the storage configuration
    pub fn open(config: &StorageConfig) -> TemporaResult<Self> {
        let path = config.resolved_database_path();
        Self::open_path(&path, config)
    }

    pub fn open_path(path: &Path, config: &StorageConfig) -> TemporaResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .sql("open database")?;
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))
            .sql("set busy timeout")?;
        // journal_mode returns a row, so it cannot go through execute
        let mode: String = conn
            .query_row(
                &format!("PRAGMA journal_mode = {}", config.journal_mode),
                [],
                |row| row.get(0),
            )
            .sql("set journal mode")?;
        conn.execute_batch("PRAGMA foreign_keys = ON; PRAGMA synchronous = NORMAL;")
            .sql("set pragmas")?;

        info!("Opened temporal store at {} (journal={})", path.display(), mode);
        Ok(Self {
            conn,
            clock: config.clock,
        })
    }

    /// Private in-memory store with the default logical clock
    pub fn open_in_memory() -> TemporaResult<Self> {
        let conn = Connection::open_in_memory().sql("open in-memory database")?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")
            .sql("set pragmas")?;
        Ok(Self {
            conn,
            clock: ClockMode::Logical,
        })
    }

    pub fn with_clock(mut self, clock: ClockMode) -> Self {
        self.clock = clock;
        self
    }

    pub fn clock(&self) -> ClockMode {
        self.clock
    }

    /// Create the record tables if they are missing
    pub fn bootstrap(&self) -> TemporaResult<()> {
        schema::create(&self.conn)
    }

    pub fn teardown(&self) -> TemporaResult<()> {
        schema::drop(&self.conn)
    }

    /// Read view outside any explicit transaction
    pub fn view(&self) -> StoreView<'_> {
        StoreView::new(&self.conn, self.clock)
    }

    /// Run `f` inside one IMMEDIATE transaction. The transaction commits when `f` returns
    /// `Ok` and rolls back otherwise, so a failed mutation leaves no partial version behind.
    pub fn write<T, F>(&mut self, f: F) -> TemporaResult<T>
    where
        F: FnOnce(StoreView<'_>) -> TemporaResult<T>,
    {
        let clock = self.clock;
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .sql("begin transaction")?;

        match f(StoreView::new(&tx, clock)) {
            Ok(value) => {
                tx.commit().sql("commit transaction")?;
                debug!("Transaction committed");
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback) = tx.rollback() {
                    warn!("Rollback after '{}' failed: {}", err, rollback);
                } else {
                    debug!("Transaction rolled back: {}", err);
                }
                Err(err)
            }
        }
    }
}

/// Borrowed handle on which every temporal-store primitive is implemented
#[derive(Clone, Copy)]
pub struct StoreView<'c> {
    pub(crate) conn: &'c Connection,
    pub(crate) clock: ClockMode,
}

impl<'c> StoreView<'c> {
    pub fn new(conn: &'c Connection, clock: ClockMode) -> Self {
        Self { conn, clock }
    }

    pub fn connection(&self) -> &'c Connection {
        self.conn
    }

    pub fn clock(&self) -> ClockMode {
        self.clock
    }
}

/// A node record joined with its class, i.e. everything a node handle needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRow {
    pub record: NodeRecord,
    pub class: NodeClass,
}

/// The id spaces backed by sequence generators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sequence {
    Document,
    Node,
    Namespace,
    NodeClass,
    OrderClass,
}

impl Sequence {
    pub fn name(&self) -> &'static str {
        match self {
            Sequence::Document => "document",
            Sequence::Node => "node",
            Sequence::Namespace => "namespace",
            Sequence::NodeClass => "node_class",
            Sequence::OrderClass => "order_class",
        }
    }
}

pub(crate) fn unknown_document(id: impl std::fmt::Display) -> TemporaError {
    TemporaError::UnknownDocument(id.to_string())
}
