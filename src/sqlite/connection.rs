use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use crate::error::BackendError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::Params;
use super::query::{build_result_set, execute_dml};

pub(crate) type SharedSqliteConnection = Arc<Mutex<rusqlite::Connection>>;

/// Owned `rusqlite` connection; every call runs on the blocking pool.
pub struct SqliteConnection {
    conn: SharedSqliteConnection,
    caching: bool,
}

impl SqliteConnection {
    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    /// Returns the driver error if the file cannot be opened, e.g. because
    /// its directory does not exist.
    pub async fn open(path: PathBuf) -> Result<Self, BackendError> {
        let conn = spawn_blocking(move || rusqlite::Connection::open(&path)).await??;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            caching: true,
        })
    }

    /// Compile `sql` and report whether it produces rows.
    ///
    /// # Errors
    /// Returns the driver error if the statement does not compile.
    pub async fn describe(&mut self, sql: &str) -> Result<bool, BackendError> {
        let sql_owned = sql.to_owned();
        let caching = self.caching;
        run_blocking(self.conn_handle(), move |guard| {
            with_statement(guard, &sql_owned, caching, |stmt| Ok(stmt.column_count() > 0))
        })
        .await
    }

    /// Run `sql` with `params`.
    ///
    /// # Errors
    /// Returns the driver error from preparing, binding or stepping.
    pub async fn run(
        &mut self,
        sql: &str,
        returns_rows: bool,
        params: &[RowValues],
    ) -> Result<ResultSet, BackendError> {
        let sql_owned = sql.to_owned();
        let params = Params::convert(params);
        let caching = self.caching;
        run_blocking(self.conn_handle(), move |guard| {
            with_statement(guard, &sql_owned, caching, |stmt| {
                if returns_rows {
                    build_result_set(stmt, params.as_values())
                } else {
                    execute_dml(stmt, params.as_values())
                }
            })
        })
        .await
    }

    /// Execute one or more statements without parameters.
    ///
    /// # Errors
    /// Returns the driver error if any statement fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), BackendError> {
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle(), move |guard| guard.execute_batch(&sql_owned)).await
    }

    /// Row id of the most recent successful insert on this connection.
    ///
    /// # Errors
    /// Returns an error if the blocking task fails.
    pub async fn last_insert_id(&mut self) -> Result<i64, BackendError> {
        run_blocking(self.conn_handle(), |guard| Ok(guard.last_insert_rowid())).await
    }

    /// Toggle the prepared-statement cache; disabling it also flushes it.
    pub async fn set_caching(&mut self, enabled: bool) -> Result<(), BackendError> {
        self.caching = enabled;
        if !enabled {
            run_blocking(self.conn_handle(), |guard| {
                guard.flush_prepared_statement_cache();
                Ok(())
            })
            .await?;
        }
        Ok(())
    }

    /// Close the underlying handle, surfacing any error from finalization.
    ///
    /// # Errors
    /// Returns the driver error if `SQLite` refuses to close.
    pub async fn close(self) -> Result<(), BackendError> {
        let Ok(mutex) = Arc::try_unwrap(self.conn) else {
            return Ok(());
        };
        spawn_blocking(move || mutex.into_inner().close().map_err(|(_, e)| e)).await??;
        Ok(())
    }

    fn conn_handle(&self) -> SharedSqliteConnection {
        Arc::clone(&self.conn)
    }
}

impl fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteConnection")
            .field("caching", &self.caching)
            .finish_non_exhaustive()
    }
}

fn with_statement<R>(
    conn: &rusqlite::Connection,
    sql: &str,
    caching: bool,
    func: impl FnOnce(&mut rusqlite::Statement<'_>) -> rusqlite::Result<R>,
) -> rusqlite::Result<R> {
    if caching {
        let mut stmt = conn.prepare_cached(sql)?;
        func(&mut stmt)
    } else {
        let mut stmt = conn.prepare(sql)?;
        func(&mut stmt)
    }
}

async fn run_blocking<F, R>(conn: SharedSqliteConnection, func: F) -> Result<R, BackendError>
where
    F: FnOnce(&mut rusqlite::Connection) -> rusqlite::Result<R> + Send + 'static,
    R: Send + 'static,
{
    let result = spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await?;
    Ok(result?)
}
