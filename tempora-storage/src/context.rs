//! Mapping of SQLite failures into the Tempora error type

use tempora_core::{TemporaError, TemporaResult};

/// Attach a description of the failed statement to a `rusqlite` error, the way
/// `anyhow::Context` is used elsewhere in the workspace.
pub trait SqlContext<T> {
    fn sql(self, what: &str) -> TemporaResult<T>;
}

impl<T> SqlContext<T> for rusqlite::Result<T> {
    fn sql(self, what: &str) -> TemporaResult<T> {
        self.map_err(|err| match err {
            // Row decoders smuggle Tempora errors through FromSqlConversionFailure
            rusqlite::Error::FromSqlConversionFailure(_, _, inner) => {
                match inner.downcast::<TemporaError>() {
                    Ok(tempora) => *tempora,
                    Err(other) => TemporaError::Database(format!("{}: {}", what, other)),
                }
            }
            other => TemporaError::Database(format!("{}: {}", what, other)),
        })
    }
}

/// Wrap a Tempora error so it can be returned from a `rusqlite` row mapper
pub(crate) fn row_error(column: usize, err: TemporaError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Integer, Box::new(err))
}
