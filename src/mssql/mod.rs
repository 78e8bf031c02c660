//! SQL Server backend on `tiberius`.

pub mod connection;
pub mod query;

pub use connection::MssqlConnection;
