//! PostgreSQL backend on `tokio-postgres`.

pub mod connection;
pub mod params;
pub mod query;

pub use connection::PostgresConnection;
