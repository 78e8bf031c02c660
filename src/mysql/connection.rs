use std::fmt;

use sqlx::mysql::{MySqlConnectOptions, MySqlConnection as SqlxMySqlConnection};
use sqlx::{ConnectOptions, Connection, Executor};

use crate::config::ConnectionParameters;
use crate::error::BackendError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::query::{bind_query_params, build_result_set};

/// A single `sqlx` MySQL connection.
pub struct MysqlConnection {
    conn: SqlxMySqlConnection,
    caching: bool,
    last_insert_id: u64,
}

impl MysqlConnection {
    /// # Errors
    /// Returns the driver error if the server cannot be reached or rejects
    /// the credentials.
    pub async fn open(params: &ConnectionParameters) -> Result<Self, BackendError> {
        let mut options = MySqlConnectOptions::new()
            .host(params.host_or_default())
            .database(&params.dbname)
            .username(&params.user)
            .password(&params.password);
        if let Some(port) = params.port {
            options = options.port(port);
        }
        if let Some(charset) = params.charset {
            options = options.charset(&charset.to_ascii_lowercase());
        }

        let conn = options.connect().await?;
        Ok(Self {
            conn,
            caching: true,
            last_insert_id: 0,
        })
    }

    /// Prepare `sql` on the server and report whether it produces rows.
    ///
    /// # Errors
    /// Returns the driver error if the server rejects the statement.
    pub async fn describe(&mut self, sql: &str) -> Result<bool, BackendError> {
        let stmt = (&mut self.conn).prepare(sql).await?;
        Ok(!sqlx::Statement::columns(&stmt).is_empty())
    }

    /// # Errors
    /// Returns the driver error from binding, execution or decoding.
    pub async fn run(
        &mut self,
        sql: &str,
        returns_rows: bool,
        params: &[RowValues],
    ) -> Result<ResultSet, BackendError> {
        let query = bind_query_params(sqlx::query(sql).persistent(self.caching), params);
        if returns_rows {
            let rows = query.fetch_all(&mut self.conn).await?;
            return Ok(build_result_set(&rows)?);
        }
        let done = query.execute(&mut self.conn).await?;
        self.last_insert_id = done.last_insert_id();
        let affected = usize::try_from(done.rows_affected()).map_err(|e| {
            BackendError::Driver(format!("mysql affected rows conversion error: {e}"))
        })?;
        Ok(ResultSet::affected(affected))
    }

    /// Text-protocol execution, used for transaction control.
    ///
    /// # Errors
    /// Returns the driver error if the statement fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), BackendError> {
        (&mut self.conn).execute(sql).await?;
        Ok(())
    }

    /// Id generated by the last insert run through [`run`](Self::run).
    ///
    /// # Errors
    /// Returns `Driver` if the id does not fit an `i64`.
    pub fn last_insert_id(&self) -> Result<i64, BackendError> {
        i64::try_from(self.last_insert_id).map_err(|e| {
            BackendError::Driver(format!("mysql insert id conversion error: {e}"))
        })
    }

    /// # Errors
    /// Returns the driver error if the server-side statements cannot be closed.
    pub async fn set_caching(&mut self, enabled: bool) -> Result<(), BackendError> {
        self.caching = enabled;
        if !enabled {
            self.conn.clear_cached_statements().await?;
        }
        Ok(())
    }

    /// # Errors
    /// Returns the driver error if the session cannot be closed cleanly.
    pub async fn close(self) -> Result<(), BackendError> {
        self.conn.close().await?;
        Ok(())
    }
}

impl fmt::Debug for MysqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MysqlConnection")
            .field("caching", &self.caching)
            .field("last_insert_id", &self.last_insert_id)
            .finish_non_exhaustive()
    }
}
