use crate::config::ConnectionParameters;
use crate::dialect::DialectProfile;
use crate::error::BackendError;
use crate::results::ResultSet;
use crate::statement::{Prepared, StatementHandle};
use crate::types::{Dialect, RowValues};

#[cfg(feature = "mssql")]
use crate::mssql::MssqlConnection;
#[cfg(feature = "mysql")]
use crate::mysql::MysqlConnection;
#[cfg(feature = "oracle")]
use crate::oracle::OracleConnection;
#[cfg(feature = "postgres")]
use crate::postgres::PostgresConnection;
#[cfg(feature = "sqlite")]
use crate::sqlite::SqliteConnection;

/// The live driver connection, one variant per compiled-in backend.
#[derive(Debug)]
pub(crate) enum BackendConnection {
    #[cfg(feature = "sqlite")]
    Sqlite(SqliteConnection),
    #[cfg(feature = "postgres")]
    Postgres(PostgresConnection),
    #[cfg(feature = "mysql")]
    Mysql(MysqlConnection),
    #[cfg(feature = "oracle")]
    Oracle(OracleConnection),
    #[cfg(feature = "mssql")]
    Mssql(MssqlConnection),
}

impl BackendConnection {
    /// Open a connection for `params.dialect`.
    pub(crate) async fn open(params: &ConnectionParameters) -> Result<Self, BackendError> {
        match params.dialect {
            #[cfg(feature = "sqlite")]
            Dialect::Sqlite => {
                let path = params.path.clone().ok_or_else(|| {
                    BackendError::Driver("sqlite connection needs a database path".into())
                })?;
                Ok(Self::Sqlite(SqliteConnection::open(path).await?))
            }
            #[cfg(feature = "postgres")]
            Dialect::Postgres => {
                Ok(Self::Postgres(PostgresConnection::open(params).await?))
            }
            #[cfg(feature = "mysql")]
            Dialect::Mysql => Ok(Self::Mysql(MysqlConnection::open(params).await?)),
            #[cfg(feature = "oracle")]
            Dialect::Oracle => {
                Ok(Self::Oracle(OracleConnection::open(params).await?))
            }
            #[cfg(feature = "mssql")]
            Dialect::Mssql => Ok(Self::Mssql(MssqlConnection::open(params).await?)),
            #[allow(unreachable_patterns)]
            other => Err(BackendError::Driver(format!(
                "no driver for '{other}' compiled in"
            ))),
        }
    }

    /// Compile `sql` and report whether it yields rows.
    pub(crate) async fn describe(&mut self, sql: &str) -> Result<(bool, Prepared), BackendError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => Ok((conn.describe(sql).await?, Prepared::Deferred)),
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => {
                let stmt = conn.prepare(sql).await?;
                Ok((!stmt.columns().is_empty(), Prepared::Postgres(stmt)))
            }
            #[cfg(feature = "mysql")]
            Self::Mysql(conn) => Ok((conn.describe(sql).await?, Prepared::Deferred)),
            #[cfg(feature = "oracle")]
            Self::Oracle(conn) => Ok((conn.describe(sql).await?, Prepared::Deferred)),
            // tiberius has no describe step; statements are compiled on first run.
            #[cfg(feature = "mssql")]
            Self::Mssql(_) => Ok((crate::translation::returns_rows(sql), Prepared::Deferred)),
        }
    }

    pub(crate) async fn run(
        &mut self,
        handle: &StatementHandle,
        params: &[RowValues],
    ) -> Result<ResultSet, BackendError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.run(handle.sql(), handle.returns_rows(), params).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => match handle.prepared() {
                Prepared::Postgres(stmt) => conn.run(stmt, params).await,
                Prepared::Deferred => {
                    let stmt = conn.prepare(handle.sql()).await?;
                    conn.run(&stmt, params).await
                }
            },
            #[cfg(feature = "mysql")]
            Self::Mysql(conn) => conn.run(handle.sql(), handle.returns_rows(), params).await,
            #[cfg(feature = "oracle")]
            Self::Oracle(conn) => conn.run(handle.sql(), handle.returns_rows(), params).await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.run(handle.sql(), handle.returns_rows(), params).await,
        }
    }

    pub(crate) async fn begin(&mut self, profile: &dyn DialectProfile) -> Result<(), BackendError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.execute_batch(profile.begin_sql()).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.execute_batch(profile.begin_sql()).await,
            #[cfg(feature = "mysql")]
            Self::Mysql(conn) => conn.execute_batch(profile.begin_sql()).await,
            // OCI has no BEGIN; leaving autocommit opens the transaction.
            #[cfg(feature = "oracle")]
            Self::Oracle(conn) => conn.begin().await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.execute_batch(profile.begin_sql()).await,
        }
    }

    pub(crate) async fn commit(&mut self, profile: &dyn DialectProfile) -> Result<(), BackendError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.execute_batch(profile.commit_sql()).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => conn.execute_batch(profile.commit_sql()).await,
            #[cfg(feature = "mysql")]
            Self::Mysql(conn) => conn.execute_batch(profile.commit_sql()).await,
            #[cfg(feature = "oracle")]
            Self::Oracle(conn) => conn.commit().await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.execute_batch(profile.commit_sql()).await,
        }
    }

    /// Last generated key: from the driver when `lookup` is `None`, otherwise
    /// from the first column of `lookup`.
    pub(crate) async fn last_insert_id(&mut self, lookup: Option<&str>) -> Result<i64, BackendError> {
        match (self, lookup) {
            #[cfg(feature = "sqlite")]
            (Self::Sqlite(conn), None) => conn.last_insert_id().await,
            #[cfg(feature = "mysql")]
            (Self::Mysql(conn), None) => conn.last_insert_id(),
            #[cfg(feature = "postgres")]
            (Self::Postgres(conn), Some(sql)) => conn.query_scalar_i64(sql).await,
            #[cfg(feature = "oracle")]
            (Self::Oracle(conn), Some(sql)) => conn.query_scalar_i64(sql).await,
            #[cfg(feature = "mssql")]
            (Self::Mssql(conn), Some(sql)) => conn.query_scalar_i64(sql).await,
            #[allow(unreachable_patterns)]
            _ => Err(BackendError::Driver(
                "driver cannot resolve the last insert id this way".into(),
            )),
        }
    }

    pub(crate) async fn set_caching(&mut self, enabled: bool) -> Result<(), BackendError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.set_caching(enabled).await,
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => {
                conn.set_caching(enabled);
                Ok(())
            }
            #[cfg(feature = "mysql")]
            Self::Mysql(conn) => conn.set_caching(enabled).await,
            #[cfg(feature = "oracle")]
            Self::Oracle(conn) => conn.set_caching(enabled).await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => {
                conn.set_caching(enabled);
                Ok(())
            }
        }
    }

    pub(crate) async fn close(self) -> Result<(), BackendError> {
        match self {
            #[cfg(feature = "sqlite")]
            Self::Sqlite(conn) => conn.close().await,
            // Dropping the client ends the spawned connection task.
            #[cfg(feature = "postgres")]
            Self::Postgres(conn) => {
                drop(conn);
                Ok(())
            }
            #[cfg(feature = "mysql")]
            Self::Mysql(conn) => conn.close().await,
            #[cfg(feature = "oracle")]
            Self::Oracle(conn) => conn.close().await,
            #[cfg(feature = "mssql")]
            Self::Mssql(conn) => conn.close().await,
        }
    }
}
