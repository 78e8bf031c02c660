use std::fmt;
use std::sync::Arc;

use ::oracle::sql_type::ToSql;
use tokio::sync::Mutex;
use tokio::task::spawn_blocking;

use crate::config::ConnectionParameters;
use crate::error::BackendError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::query::{build_result_set, convert_params};

pub(crate) type SharedOracleConnection = Arc<Mutex<::oracle::Connection>>;

const STMT_CACHE_SIZE: u32 = 20;

/// Owned Oracle session; autocommit is on outside explicit transactions.
pub struct OracleConnection {
    conn: SharedOracleConnection,
}

impl OracleConnection {
    /// Connect with an easy-connect string built from host, port and name.
    ///
    /// # Errors
    /// Returns the driver error if the session cannot be established.
    pub async fn open(params: &ConnectionParameters) -> Result<Self, BackendError> {
        let connect_string = connect_string(params);
        let user = params.user.clone();
        let password = params.password.clone();
        let conn = spawn_blocking(move || {
            let mut conn = ::oracle::Connection::connect(&user, &password, &connect_string)?;
            conn.set_autocommit(true);
            Ok::<_, ::oracle::Error>(conn)
        })
        .await??;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// # Errors
    /// Returns the driver error if the statement does not parse.
    pub async fn describe(&mut self, sql: &str) -> Result<bool, BackendError> {
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle(), move |conn| {
            Ok(conn.statement(&sql_owned).build()?.is_query())
        })
        .await
    }

    /// # Errors
    /// Returns the driver error from binding or execution.
    pub async fn run(
        &mut self,
        sql: &str,
        returns_rows: bool,
        params: &[RowValues],
    ) -> Result<ResultSet, BackendError> {
        let sql_owned = sql.to_owned();
        let params = params.to_vec();
        run_blocking(self.conn_handle(), move |conn| {
            let boxed = convert_params(&params);
            let refs: Vec<&dyn ToSql> = boxed.iter().map(AsRef::as_ref).collect();
            let mut stmt = conn.statement(&sql_owned).build()?;
            if returns_rows {
                return build_result_set(&mut stmt, &refs);
            }
            stmt.execute(&refs)?;
            let affected = usize::try_from(stmt.row_count()?).unwrap_or(usize::MAX);
            Ok(ResultSet::affected(affected))
        })
        .await
    }

    /// Leave autocommit mode until [`commit`](Self::commit).
    pub async fn begin(&mut self) -> Result<(), BackendError> {
        run_blocking(self.conn_handle(), |conn| {
            conn.set_autocommit(false);
            Ok(())
        })
        .await
    }

    /// # Errors
    /// Returns the driver error if the commit fails.
    pub async fn commit(&mut self) -> Result<(), BackendError> {
        run_blocking(self.conn_handle(), |conn| {
            conn.commit()?;
            conn.set_autocommit(true);
            Ok(())
        })
        .await
    }

    /// # Errors
    /// Returns the driver error if the lookup fails.
    pub async fn query_scalar_i64(&mut self, sql: &str) -> Result<i64, BackendError> {
        let sql_owned = sql.to_owned();
        run_blocking(self.conn_handle(), move |conn| {
            conn.query_row_as::<i64>(&sql_owned, &[])
        })
        .await
    }

    /// # Errors
    /// Returns the driver error if the cache size cannot be changed.
    pub async fn set_caching(&mut self, enabled: bool) -> Result<(), BackendError> {
        let size = if enabled { STMT_CACHE_SIZE } else { 0 };
        run_blocking(self.conn_handle(), move |conn| conn.set_stmt_cache_size(size)).await
    }

    /// # Errors
    /// Returns the driver error if the session cannot be closed cleanly.
    pub async fn close(self) -> Result<(), BackendError> {
        run_blocking(self.conn_handle(), |conn| conn.close()).await
    }

    fn conn_handle(&self) -> SharedOracleConnection {
        Arc::clone(&self.conn)
    }
}

impl fmt::Debug for OracleConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OracleConnection").finish_non_exhaustive()
    }
}

/// `//host[:port]/name`, or the bare name (a TNS alias) without a host.
fn connect_string(params: &ConnectionParameters) -> String {
    match (params.host.as_deref(), params.port) {
        (Some(host), Some(port)) if !host.is_empty() => {
            format!("//{host}:{port}/{}", params.dbname)
        }
        (Some(host), None) if !host.is_empty() => format!("//{host}/{}", params.dbname),
        _ => params.dbname.clone(),
    }
}

async fn run_blocking<F, R>(conn: SharedOracleConnection, func: F) -> Result<R, BackendError>
where
    F: FnOnce(&mut ::oracle::Connection) -> Result<R, ::oracle::Error> + Send + 'static,
    R: Send + 'static,
{
    let result = spawn_blocking(move || {
        let mut guard = conn.blocking_lock();
        func(&mut guard)
    })
    .await?;
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DbConfig;
    use crate::types::Dialect;

    #[test]
    fn easy_connect_strings() {
        let profile = Dialect::Oracle.profile();
        let with_port = DbConfig::builder(Dialect::Oracle).host("ora:1521").name("XE").finish();
        let params = ConnectionParameters::build(&with_port, profile).unwrap();
        assert_eq!(connect_string(&params), "//ora:1521/XE");

        let alias = DbConfig::builder(Dialect::Oracle).name("PROD").finish();
        let params = ConnectionParameters::build(&alias, profile).unwrap();
        assert_eq!(connect_string(&params), "PROD");
    }
}
