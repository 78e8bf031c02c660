use postgresql_embedded::PostgreSQL;

use crate::config::DbConfig;
use crate::types::Dialect;

/// A running embedded `PostgreSQL` instance.
pub struct EmbeddedPostgres {
    pub postgresql: PostgreSQL,
    pub port: u16,
    /// Points at the test database with the server's generated credentials.
    pub config: DbConfig,
}

/// Set up and start an embedded `PostgreSQL` instance, then create `dbname`.
///
/// The returned config uses the `oc_` table prefix.
///
/// # Errors
/// Returns an error if the bundled binaries cannot be installed, the server
/// does not start, or the database cannot be created.
pub async fn setup_postgres_embedded(
    dbname: &str,
) -> Result<EmbeddedPostgres, Box<dyn std::error::Error>> {
    let mut postgresql = PostgreSQL::default();
    postgresql.setup().await?;
    postgresql.start().await?;
    postgresql.create_database(dbname).await?;

    let settings = postgresql.settings();
    let port = settings.port;
    let config = DbConfig::builder(Dialect::Postgres)
        .host(format!("{}:{port}", settings.host))
        .name(dbname)
        .user(settings.username.clone())
        .password(settings.password.clone())
        .table_prefix("oc_")
        .finish();

    tracing::debug!(port, dbname, "embedded postgres started");
    Ok(EmbeddedPostgres {
        postgresql,
        port,
        config,
    })
}

/// Stop a previously started embedded `PostgreSQL` instance.
pub async fn stop_postgres_embedded(postgres: EmbeddedPostgres) {
    if let Err(e) = postgres.postgresql.stop().await {
        tracing::warn!(error = %e, "embedded postgres did not stop cleanly");
    }
}
