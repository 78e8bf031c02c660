//! MySQL / MariaDB backend on `sqlx`.

pub mod connection;
pub mod query;

pub use connection::MysqlConnection;
