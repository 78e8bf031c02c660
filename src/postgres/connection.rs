use std::collections::HashMap;
use std::fmt;

use tokio_postgres::{Client, NoTls, Statement};

use crate::config::ConnectionParameters;
use crate::error::BackendError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::params::as_refs;
use super::query::build_result_set_from_statement;

/// A single `tokio-postgres` client plus its statement cache.
pub struct PostgresConnection {
    client: Client,
    cache: HashMap<String, Statement>,
    caching: bool,
}

impl PostgresConnection {
    /// Connect and spawn the connection driver task.
    ///
    /// # Errors
    /// Returns the driver error if the server cannot be reached or rejects
    /// the credentials.
    pub async fn open(params: &ConnectionParameters) -> Result<Self, BackendError> {
        let mut config = tokio_postgres::Config::new();
        config
            .host(params.host_or_default())
            .dbname(&params.dbname)
            .user(&params.user)
            .password(params.password.as_bytes());
        if let Some(port) = params.port {
            config.port(port);
        }

        let (client, connection) = config.connect(NoTls).await?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(error = %e, "postgres connection closed with error");
            }
        });

        Ok(Self {
            client,
            cache: HashMap::new(),
            caching: true,
        })
    }

    /// Prepare `sql` on the server, reusing a cached statement when allowed.
    ///
    /// # Errors
    /// Returns the driver error if the server rejects the statement.
    pub async fn prepare(&mut self, sql: &str) -> Result<Statement, BackendError> {
        if let Some(stmt) = self.cache.get(sql) {
            return Ok(stmt.clone());
        }
        let stmt = self.client.prepare(sql).await?;
        if self.caching {
            self.cache.insert(sql.to_string(), stmt.clone());
        }
        Ok(stmt)
    }

    /// Run a prepared statement.
    ///
    /// # Errors
    /// Returns the driver error from binding or execution.
    pub async fn run(
        &mut self,
        stmt: &Statement,
        params: &[RowValues],
    ) -> Result<ResultSet, BackendError> {
        let refs = as_refs(params);
        if stmt.columns().is_empty() {
            let affected = self.client.execute(stmt, &refs).await?;
            let affected = usize::try_from(affected).map_err(|e| {
                BackendError::Driver(format!("postgres affected rows conversion error: {e}"))
            })?;
            return Ok(ResultSet::affected(affected));
        }
        let rows = self.client.query(stmt, &refs).await?;
        Ok(build_result_set_from_statement(stmt, &rows)?)
    }

    /// # Errors
    /// Returns the driver error if any statement fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), BackendError> {
        self.client.batch_execute(sql).await?;
        Ok(())
    }

    /// Run a single-value lookup such as `SELECT lastval()`.
    ///
    /// # Errors
    /// Returns the driver error if the query fails or yields no row.
    pub async fn query_scalar_i64(&mut self, sql: &str) -> Result<i64, BackendError> {
        let row = self.client.query_one(sql, &[]).await?;
        Ok(row.try_get::<_, i64>(0)?)
    }

    pub fn set_caching(&mut self, enabled: bool) {
        self.caching = enabled;
        if !enabled {
            self.cache.clear();
        }
    }
}

impl fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("cached_statements", &self.cache.len())
            .field("caching", &self.caching)
            .finish_non_exhaustive()
    }
}
