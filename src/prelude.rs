//! Convenient imports for common functionality.
//!
//! This module re-exports the types most callers need to open a
//! [`Database`](crate::Database) and run statements through it.

pub use crate::config::{ConfigProvider, DbConfig, DbConfigBuilder};
pub use crate::database::{Database, ProcessScope, RequestScope};
pub use crate::error::{DatabaseError, SqlPortableError, ValidationError};
pub use crate::executor::{AuditedStatement, AuditedStatementSpec};
pub use crate::results::{ResultSet, Row};
pub use crate::schema::SchemaEngine;
pub use crate::statement::StatementHandle;
pub use crate::types::{Dialect, RowValues};
