//! Portable, single-connection SQL access.
//!
//! A [`Database`] owns one connection to one of several backends and exposes a
//! uniform surface over it: lazy connect, prepared statements with structural
//! limit/offset, audited execution, a single transaction flag and a
//! conditional insert that works on every dialect.
//!
//! ```rust,no_run
//! use sql_portable::prelude::*;
//!
//! # async fn run() -> Result<(), SqlPortableError> {
//! let config = DbConfig::builder(Dialect::Sqlite)
//!     .name("owncloud")
//!     .data_directory("/var/lib/app")
//!     .finish();
//! let mut db = Database::new(config);
//!
//! let rows = db
//!     .execute_audited(
//!         AuditedStatementSpec::new("SELECT `configkey` FROM `*PREFIX*appconfig` WHERE `appid` = ?")
//!             .with_limit(10),
//!         &[RowValues::Text("core".into())],
//!     )
//!     .await?;
//! # let _ = rows;
//! # Ok(())
//! # }
//! ```

#[cfg(not(any(
    feature = "sqlite",
    feature = "postgres",
    feature = "mysql",
    feature = "mssql",
    feature = "oracle"
)))]
compile_error!("enable at least one backend feature: sqlite, postgres, mysql, mssql or oracle");

pub mod config;
pub mod database;
pub mod dialect;
pub mod error;
pub mod executor;
pub mod prelude;
pub mod results;
pub mod schema;
pub mod statement;
pub mod translation;
pub mod translator;
pub mod types;

mod transaction;
mod upsert;

#[cfg(feature = "mssql")]
pub mod mssql;
#[cfg(feature = "mysql")]
pub mod mysql;
#[cfg(feature = "oracle")]
pub mod oracle;
#[cfg(feature = "postgres")]
pub mod postgres;
#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "test-utils-postgres")]
pub mod test_utils;

pub use config::{ConfigProvider, ConnectionParameters, DbConfig, DbConfigBuilder};
pub use database::{Database, ProcessScope, RequestScope};
pub use dialect::{DialectProfile, PlaceholderStyle};
pub use error::{BackendError, DatabaseError, SqlPortableError, ValidationError};
pub use executor::{AuditedStatement, AuditedStatementSpec};
pub use results::{ResultSet, Row};
pub use schema::SchemaEngine;
pub use statement::StatementHandle;
pub use translator::ErrorDetail;
pub use types::{Dialect, RowValues};
