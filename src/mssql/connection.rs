use std::fmt;
use std::net::ToSocketAddrs;

use tiberius::Client;
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::config::ConnectionParameters;
use crate::error::BackendError;
use crate::results::ResultSet;
use crate::types::RowValues;

use super::query::{build_result_set, execute_dml};

pub type MssqlClient = Client<Compat<TcpStream>>;

/// A single `tiberius` client.
///
/// `tiberius` executes through `sp_executesql` and keeps no client-side
/// statement cache, so the caching toggle is recorded but has no effect.
pub struct MssqlConnection {
    client: MssqlClient,
    caching: bool,
}

impl MssqlConnection {
    /// Resolve the host, open a TCP stream and log in with SQL authentication.
    ///
    /// # Errors
    /// Returns an I/O error if the host cannot be resolved or reached, or the
    /// driver error if the login fails.
    pub async fn open(params: &ConnectionParameters) -> Result<Self, BackendError> {
        let server = params.host_or_default();
        let port = params.port.unwrap_or(1433);

        let mut config = tiberius::Config::new();
        config.host(server);
        config.port(port);
        config.database(&params.dbname);
        config.authentication(tiberius::AuthMethod::sql_server(
            &params.user,
            &params.password,
        ));
        config.trust_cert();

        let server_addr = (server, port).to_socket_addrs()?.next().ok_or_else(|| {
            BackendError::Driver(format!("No valid address found for {server}"))
        })?;
        let tcp = TcpStream::connect(server_addr).await?;
        tcp.set_nodelay(true)?;

        let client = Client::connect(config, tcp.compat_write()).await?;
        Ok(Self {
            client,
            caching: true,
        })
    }

    /// # Errors
    /// Returns the driver error from execution.
    pub async fn run(
        &mut self,
        sql: &str,
        returns_rows: bool,
        params: &[RowValues],
    ) -> Result<ResultSet, BackendError> {
        let result = if returns_rows {
            build_result_set(&mut self.client, sql, params).await?
        } else {
            execute_dml(&mut self.client, sql, params).await?
        };
        Ok(result)
    }

    /// # Errors
    /// Returns the driver error if any statement fails.
    pub async fn execute_batch(&mut self, sql: &str) -> Result<(), BackendError> {
        self.client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }

    /// Run a single-value lookup such as `SELECT CAST(@@IDENTITY AS BIGINT)`.
    ///
    /// # Errors
    /// Returns the driver error, or `Driver` if the lookup yields nothing.
    pub async fn query_scalar_i64(&mut self, sql: &str) -> Result<i64, BackendError> {
        let row = self.client.simple_query(sql).await?.into_row().await?;
        row.and_then(|r| r.try_get::<i64, _>(0).ok().flatten())
            .ok_or_else(|| BackendError::Driver(format!("no value returned by '{sql}'")))
    }

    pub fn set_caching(&mut self, enabled: bool) {
        self.caching = enabled;
    }

    /// # Errors
    /// Returns the driver error if the session cannot be closed cleanly.
    pub async fn close(self) -> Result<(), BackendError> {
        self.client.close().await?;
        Ok(())
    }
}

impl fmt::Debug for MssqlConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MssqlConnection")
            .field("caching", &self.caching)
            .finish_non_exhaustive()
    }
}
