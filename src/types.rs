use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::dialect::{self, DialectProfile};
use crate::error::SqlPortableError;

/// Values that can be stored in a database row or used as query parameters.
///
/// The same enum is bound on every backend, so callers never branch on driver
/// types:
/// ```rust
/// use sql_portable::prelude::*;
///
/// let params = vec![
///     RowValues::Int(1),
///     RowValues::Text("alice".into()),
///     RowValues::Bool(true),
/// ];
/// # let _ = params;
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum RowValues {
    /// Integer value (64-bit)
    Int(i64),
    /// Floating point value (64-bit)
    Float(f64),
    /// Text/string value
    Text(String),
    /// Boolean value
    Bool(bool),
    /// Timestamp value
    Timestamp(NaiveDateTime),
    /// NULL value
    Null,
    /// JSON value
    JSON(JsonValue),
    /// Binary data
    Blob(Vec<u8>),
}

impl RowValues {
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_int(&self) -> Option<&i64> {
        if let RowValues::Int(value) = self {
            Some(value)
        } else {
            None
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        if let RowValues::Text(value) = self {
            Some(value)
        } else {
            None
        }
    }

    /// Booleans come back as integers from several backends; 0 and 1 are accepted.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            RowValues::Bool(value) => Some(*value),
            RowValues::Int(1) => Some(true),
            RowValues::Int(0) => Some(false),
            _ => None,
        }
    }
}

impl From<i64> for RowValues {
    fn from(value: i64) -> Self {
        RowValues::Int(value)
    }
}

impl From<f64> for RowValues {
    fn from(value: f64) -> Self {
        RowValues::Float(value)
    }
}

impl From<bool> for RowValues {
    fn from(value: bool) -> Self {
        RowValues::Bool(value)
    }
}

impl From<&str> for RowValues {
    fn from(value: &str) -> Self {
        RowValues::Text(value.to_owned())
    }
}

impl From<String> for RowValues {
    fn from(value: String) -> Self {
        RowValues::Text(value)
    }
}

/// The backend SQL engine a [`Database`](crate::Database) talks to.
///
/// Parsed from the `dbtype` configuration key, which accepts the historical
/// aliases `sqlite3`, `pgsql` and `oci`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded file-based engine
    Sqlite,
    /// MySQL / MariaDB
    Mysql,
    /// `PostgreSQL`
    Postgres,
    /// Oracle
    Oracle,
    /// SQL Server
    Mssql,
}

impl Dialect {
    /// Canonical configuration name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Mysql => "mysql",
            Dialect::Postgres => "pgsql",
            Dialect::Oracle => "oci",
            Dialect::Mssql => "mssql",
        }
    }

    /// Static per-dialect behavior.
    #[must_use]
    pub fn profile(self) -> &'static dyn DialectProfile {
        dialect::profile_for(self)
    }

    /// Whether a driver for this dialect was compiled into the crate.
    #[must_use]
    pub fn is_available(self) -> bool {
        match self {
            Dialect::Sqlite => cfg!(feature = "sqlite"),
            Dialect::Mysql => cfg!(feature = "mysql"),
            Dialect::Postgres => cfg!(feature = "postgres"),
            Dialect::Oracle => cfg!(feature = "oracle"),
            Dialect::Mssql => cfg!(feature = "mssql"),
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = SqlPortableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mysql" => Ok(Dialect::Mysql),
            "pgsql" | "postgres" | "postgresql" => Ok(Dialect::Postgres),
            "oci" | "oracle" => Ok(Dialect::Oracle),
            "mssql" | "sqlsrv" => Ok(Dialect::Mssql),
            other => Err(SqlPortableError::Unsupported(format!(
                "unknown database type '{other}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialect_aliases_parse() {
        assert_eq!("sqlite3".parse::<Dialect>().unwrap(), Dialect::Sqlite);
        assert_eq!("pgsql".parse::<Dialect>().unwrap(), Dialect::Postgres);
        assert_eq!("OCI".parse::<Dialect>().unwrap(), Dialect::Oracle);
        assert_eq!("mssql".parse::<Dialect>().unwrap(), Dialect::Mssql);
        assert!(matches!(
            "db2".parse::<Dialect>(),
            Err(SqlPortableError::Unsupported(_))
        ));
    }

    #[test]
    fn dialect_display_round_trips_through_config_name() {
        for dialect in [
            Dialect::Sqlite,
            Dialect::Mysql,
            Dialect::Postgres,
            Dialect::Oracle,
            Dialect::Mssql,
        ] {
            assert_eq!(dialect.to_string().parse::<Dialect>().unwrap(), dialect);
        }
    }

    #[test]
    fn integer_booleans() {
        assert_eq!(RowValues::Int(1).as_bool(), Some(true));
        assert_eq!(RowValues::Int(0).as_bool(), Some(false));
        assert_eq!(RowValues::Int(2).as_bool(), None);
        assert_eq!(RowValues::Bool(true).as_bool(), Some(true));
    }
}
