use thiserror::Error;

use crate::normalization::taxonomy::TaxonomyParseError;

/// Errors surfaced by the catalog library.
///
/// A query that matches nothing is not an error: it yields an empty
/// [`crate::recommend::Recommendation`]. Malformed taxonomy cells are only
/// errors when strict taxonomy handling is requested; otherwise they become
/// [`crate::normalization::ParseWarning`]s.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("search query is required")]
    EmptyQuery,

    /// The persistence layer rejected a read or write. `stage` names the
    /// pipeline step and, for writes, the movie being written.
    #[error("catalog store failed during {stage}")]
    Store {
        stage: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("row at line {line}: {reason}")]
    Row { line: u64, reason: String },

    #[error("row at line {line}: malformed {field} taxonomy")]
    Taxonomy {
        line: u64,
        field: &'static str,
        #[source]
        source: TaxonomyParseError,
    },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl CatalogError {
    pub fn row(line: u64, reason: impl Into<String>) -> Self {
        Self::Row {
            line,
            reason: reason.into(),
        }
    }
}

/// Attaches a pipeline stage to raw `sqlx` failures.
pub trait StoreStage<T> {
    fn stage(self, stage: impl Into<String>) -> Result<T, CatalogError>;
}

impl<T> StoreStage<T> for Result<T, sqlx::Error> {
    fn stage(self, stage: impl Into<String>) -> Result<T, CatalogError> {
        self.map_err(|source| CatalogError::Store {
            stage: stage.into(),
            source,
        })
    }
}
