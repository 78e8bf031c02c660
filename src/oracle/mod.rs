//! Oracle backend on the `oracle` crate (ODPI-C), driven on the blocking pool.

pub mod connection;
pub mod query;

pub use connection::OracleConnection;
