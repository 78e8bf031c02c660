//! The owned connection and its lifecycle.

mod backend;
mod scope;

pub(crate) use backend::BackendConnection;
pub use scope::{ProcessScope, RequestScope};

use std::fmt;

use crate::config::{ConnectionParameters, DbConfig};
use crate::dialect::{DialectProfile, LastInsertId};
use crate::error::{DatabaseError, SqlPortableError};
use crate::translation::replace_table_prefix;
use crate::types::Dialect;

const CONNECT_FAILURE: &str = "Failed to connect to database";

#[derive(Debug)]
enum ConnectionState {
    Unconnected,
    Connected(BackendConnection),
    /// Terminal: a connect attempt failed fatally.
    Failed,
}

/// One connection to one database, owned by the request that uses it.
///
/// Nothing is opened until the first operation that needs the backend (or an
/// explicit [`connect`](Self::connect)). Every operation takes `&mut self`, so
/// statements run strictly in call order.
pub struct Database {
    pub(crate) config: DbConfig,
    scope: Box<dyn RequestScope>,
    profile: Option<&'static dyn DialectProfile>,
    state: ConnectionState,
    pub(crate) in_transaction: bool,
}

impl Database {
    /// A database using [`ProcessScope`] for the fatal connect path.
    #[must_use]
    pub fn new(config: DbConfig) -> Self {
        Self::with_scope(config, ProcessScope)
    }

    #[must_use]
    pub fn with_scope(config: DbConfig, scope: impl RequestScope + 'static) -> Self {
        Self {
            config,
            scope: Box::new(scope),
            profile: None,
            state: ConnectionState::Unconnected,
            in_transaction: false,
        }
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Open the connection if it is not open yet.
    ///
    /// Returns `false` for an unknown or not compiled-in database type, and
    /// after a previous fatal failure. A failure to open the connection is
    /// reported to the [`RequestScope`] (identity invalidated, 503 emitted,
    /// processing terminated) and never surfaces as an error.
    pub async fn connect(&mut self) -> bool {
        match self.state {
            ConnectionState::Connected(_) => return true,
            ConnectionState::Failed => return false,
            ConnectionState::Unconnected => {}
        }

        let dialect = match self.config.dbtype.parse::<Dialect>() {
            Ok(dialect) if dialect.is_available() => dialect,
            Ok(dialect) => {
                tracing::warn!(%dialect, "database type not compiled into this build");
                return false;
            }
            Err(e) => {
                tracing::warn!(dbtype = %self.config.dbtype, error = %e, "unsupported database type");
                return false;
            }
        };
        let profile = dialect.profile();

        let opened = match ConnectionParameters::build(&self.config, profile) {
            Ok(params) => {
                tracing::debug!(?params, "connecting");
                BackendConnection::open(&params)
                    .await
                    .map_err(|e| e.to_string())
            }
            Err(e) => Err(e.to_string()),
        };

        let mut conn = match opened {
            Ok(conn) => conn,
            Err(reason) => {
                self.fail_connect(dialect, &reason);
                return false;
            }
        };

        if !profile.statement_caching_safe() {
            if let Err(e) = conn.set_caching(false).await {
                tracing::warn!(error = %e, "could not disable statement caching");
            }
        }

        tracing::debug!(%dialect, "connected");
        self.profile = Some(profile);
        self.state = ConnectionState::Connected(conn);
        true
    }

    fn fail_connect(&mut self, dialect: Dialect, reason: &str) {
        tracing::error!(%dialect, error = %reason, "{CONNECT_FAILURE}");
        self.state = ConnectionState::Failed;
        self.scope.invalidate_identity();
        self.scope.service_unavailable(CONNECT_FAILURE);
        self.scope.terminate();
    }

    /// Close the connection if one is open. Always safe to call.
    ///
    /// Returns `true` when there is no open connection afterwards; a close
    /// error from the driver is logged and reported as `false`.
    pub async fn disconnect(&mut self) -> bool {
        let state = std::mem::replace(&mut self.state, ConnectionState::Unconnected);
        self.in_transaction = false;
        match state {
            ConnectionState::Connected(conn) => match conn.close().await {
                Ok(()) => {
                    tracing::debug!("disconnected");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "error while closing connection");
                    false
                }
            },
            ConnectionState::Failed => {
                self.state = ConnectionState::Failed;
                true
            }
            ConnectionState::Unconnected => true,
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    /// Dialect of the live connection.
    #[must_use]
    pub fn dialect(&self) -> Option<Dialect> {
        self.profile.map(|p| p.dialect())
    }

    #[must_use]
    pub fn table_prefix(&self) -> &str {
        &self.config.dbtableprefix
    }

    /// Replace `*PREFIX*` in `name` with the configured table prefix.
    #[must_use]
    pub fn replace_table_prefix(&self, name: &str) -> String {
        replace_table_prefix(name, &self.config.dbtableprefix)
    }

    /// Toggle statement caching on the live connection.
    ///
    /// # Errors
    /// Returns `Unavailable` if no connection has been opened, or
    /// `Database` if the driver refuses.
    pub async fn enable_caching(&mut self, enabled: bool) -> Result<(), SqlPortableError> {
        let ConnectionState::Connected(conn) = &mut self.state else {
            return Err(SqlPortableError::Unavailable(
                "enable_caching requires an open connection".into(),
            ));
        };
        conn.set_caching(enabled)
            .await
            .map_err(|e| DatabaseError::new(e.to_string()).into())
    }

    /// Key generated by the most recent insert on this connection.
    ///
    /// `table` (portable, may contain `*PREFIX*`) is needed by dialects that
    /// read the value from a per-table sequence. Without a prior insert the
    /// result is whatever the backend reports.
    ///
    /// # Errors
    /// Returns `Unsupported` if the dialect needs a table and none was given,
    /// or `Database` if the lookup fails.
    pub async fn insert_id(&mut self, table: Option<&str>) -> Result<i64, SqlPortableError> {
        let profile = self.ensure_connected().await?;
        let table = table.map(|t| self.replace_table_prefix(t));
        let lookup = match profile.last_insert_id(table.as_deref()) {
            LastInsertId::Driver => None,
            LastInsertId::Query(sql) => Some(sql),
            LastInsertId::Unavailable(reason) => {
                return Err(SqlPortableError::Unsupported(reason.to_string()));
            }
        };

        let conn = self.live_connection()?;
        conn.last_insert_id(lookup.as_deref()).await.map_err(|e| {
            let err = DatabaseError::new(e.to_string());
            match lookup {
                Some(sql) => err.with_query(sql).into(),
                None => err.into(),
            }
        })
    }

    /// Connect if needed and return the active dialect profile.
    pub(crate) async fn ensure_connected(
        &mut self,
    ) -> Result<&'static dyn DialectProfile, SqlPortableError> {
        if let ConnectionState::Failed = self.state {
            return Err(SqlPortableError::Unavailable(CONNECT_FAILURE.into()));
        }
        if !self.connect().await {
            return Err(match self.state {
                ConnectionState::Failed => SqlPortableError::Unavailable(CONNECT_FAILURE.into()),
                _ => SqlPortableError::Unsupported(format!(
                    "database type '{}' is not supported",
                    self.config.dbtype
                )),
            });
        }
        self.profile
            .ok_or_else(|| SqlPortableError::Unavailable(CONNECT_FAILURE.into()))
    }

    pub(crate) fn live_connection(&mut self) -> Result<&mut BackendConnection, SqlPortableError> {
        match &mut self.state {
            ConnectionState::Connected(conn) => Ok(conn),
            _ => Err(SqlPortableError::Unavailable(CONNECT_FAILURE.into())),
        }
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("dbtype", &self.config.dbtype)
            .field("dialect", &self.dialect())
            .field("state", &self.state)
            .field("in_transaction", &self.in_transaction)
            .finish_non_exhaustive()
    }
}
