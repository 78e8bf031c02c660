use thiserror::Error;

use crate::types::Dialect;

/// Top-level error returned by every [`Database`](crate::Database) operation.
#[derive(Debug, Error)]
pub enum SqlPortableError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Caller-side mistake caught before any backend interaction.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Backend rejected a statement; carries the diagnostic payload.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// The connection is in its terminal failed state.
    #[error("Database unavailable: {0}")]
    Unavailable(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Schema error: {0}")]
    Schema(String),
}

/// Errors that can be detected locally, without asking the backend.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error(
        "LIMIT and OFFSET are forbidden for portability reasons, pass a statement spec with `limit` and `offset` instead"
    )]
    InlineLimit,

    #[error("statement descriptor must at least contain key 'sql'")]
    MissingSql,

    #[error("expected a prepared statement, descriptor or SQL string, got {0}")]
    UnexpectedShape(String),

    #[error("{name} = {value} is out of range, the maximum is {}", i64::MAX)]
    PagingOutOfRange { name: &'static str, value: u64 },

    #[error("a conditional insert needs at least one field")]
    EmptyFields,

    #[error("statement prepared for {found} cannot run on a {expected} connection")]
    ForeignStatement { expected: Dialect, found: Dialect },
}

/// Structured database failure: message, backend code and the offending SQL.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct DatabaseError {
    message: String,
    code: Option<String>,
    query: Option<String>,
}

impl DatabaseError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
            query: None,
        }
    }

    #[must_use]
    pub fn with_code(mut self, code: Option<String>) -> Self {
        self.code = code;
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = Some(query.into());
        self
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Backend error code, when the driver supplied one.
    #[must_use]
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    /// SQL text that failed.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }
}

/// Raw driver errors, before translation into a [`DatabaseError`].
#[derive(Debug, Error)]
pub enum BackendError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[cfg(feature = "postgres")]
    #[error(transparent)]
    Postgres(#[from] tokio_postgres::Error),

    #[cfg(feature = "mysql")]
    #[error(transparent)]
    Mysql(#[from] sqlx::Error),

    #[cfg(feature = "mssql")]
    #[error(transparent)]
    Mssql(#[from] tiberius::error::Error),

    #[cfg(feature = "oracle")]
    #[error(transparent)]
    Oracle(#[from] oracle::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Driver(String),
}

impl From<tokio::task::JoinError> for BackendError {
    fn from(err: tokio::task::JoinError) -> Self {
        BackendError::Driver(format!("blocking driver task failed: {err}"))
    }
}
