//! Statement preparation.

use std::sync::Arc;

use crate::database::Database;
use crate::error::{SqlPortableError, ValidationError};
use crate::translation::rewrite_statement;
use crate::translator;
use crate::types::Dialect;

/// Backend-side state kept with a [`StatementHandle`].
#[derive(Debug, Clone)]
pub(crate) enum Prepared {
    /// The driver prepares (or fetches from its cache) at execution time.
    Deferred,
    #[cfg(feature = "postgres")]
    Postgres(tokio_postgres::Statement),
}

/// A statement compiled by the backend, plus its resolved SQL.
///
/// The SQL already carries the dialect's quoting, placeholders and
/// limit/offset rewrite. Handles are bound to the dialect they were prepared
/// for and can be executed any number of times.
#[derive(Debug, Clone)]
pub struct StatementHandle {
    sql: Arc<str>,
    dialect: Dialect,
    returns_rows: bool,
    prepared: Prepared,
}

impl StatementHandle {
    pub(crate) fn new(sql: String, dialect: Dialect, returns_rows: bool, prepared: Prepared) -> Self {
        Self {
            sql: Arc::from(sql),
            dialect,
            returns_rows,
            prepared,
        }
    }

    /// Resolved SQL text as sent to the backend.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Whether executing the statement yields a result set.
    #[must_use]
    pub fn returns_rows(&self) -> bool {
        self.returns_rows
    }

    pub(crate) fn prepared(&self) -> &Prepared {
        &self.prepared
    }
}

impl Database {
    /// Prepare `sql`, connecting first if needed.
    ///
    /// `sql` is written in the portable form (backtick identifiers,
    /// `*PREFIX*` table names, `?` placeholders) and must not contain a
    /// `LIMIT` clause; `limit` and `offset` are applied with the dialect's
    /// own syntax instead.
    ///
    /// # Errors
    /// Returns `Validation(PagingOutOfRange)` for a `limit` or `offset` above
    /// `i64::MAX`, `SqlPortableError::Database` carrying the resolved SQL if
    /// the backend rejects the statement, or `Unavailable` after a failed
    /// connect.
    pub async fn prepare(
        &mut self,
        sql: &str,
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<StatementHandle, SqlPortableError> {
        check_paging("limit", limit)?;
        check_paging("offset", offset)?;
        let profile = self.ensure_connected().await?;
        let rewritten = rewrite_statement(sql, profile, &self.config.dbtableprefix);
        let resolved = profile.apply_limit_offset(&rewritten, limit, offset);
        tracing::debug!(sql = %resolved, "preparing statement");

        let conn = self.live_connection()?;
        let (returns_rows, prepared) = conn
            .describe(&resolved)
            .await
            .map_err(|e| translator::prepare_failure(&e, &resolved))?;

        Ok(StatementHandle::new(
            resolved,
            profile.dialect(),
            returns_rows,
            prepared,
        ))
    }
}

// Signed 64-bit is the widest row count every backend accepts.
fn check_paging(name: &'static str, value: Option<u64>) -> Result<(), ValidationError> {
    match value {
        Some(value) if i64::try_from(value).is_err() => {
            Err(ValidationError::PagingOutOfRange { name, value })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paging_is_bounded_by_i64() {
        assert!(check_paging("limit", None).is_ok());
        assert!(check_paging("limit", Some(i64::MAX as u64)).is_ok());
        assert_eq!(
            check_paging("offset", Some(u64::MAX)),
            Err(ValidationError::PagingOutOfRange {
                name: "offset",
                value: u64::MAX
            })
        );
    }
}
