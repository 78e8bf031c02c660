//! Embedded SQLite backend, driven through `rusqlite` on the blocking pool.

pub mod connection;
pub mod params;
pub mod query;

pub use connection::SqliteConnection;
