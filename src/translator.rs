//! Backend error decoding.
//!
//! Driver errors are turned into a [`DatabaseError`] carrying a readable
//! message, the backend code when one exists, and the SQL that failed.

use crate::error::{BackendError, DatabaseError};

/// Decoded driver diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetail {
    pub sqlstate: Option<String>,
    pub driver_code: Option<String>,
    pub driver_message: String,
}

impl ErrorDetail {
    /// Decode `err` into state code, driver code and message.
    #[must_use]
    pub fn decode(err: &BackendError) -> Self {
        match err {
            #[cfg(feature = "sqlite")]
            BackendError::Sqlite(e) => decode_sqlite(e),
            #[cfg(feature = "postgres")]
            BackendError::Postgres(e) => decode_postgres(e),
            #[cfg(feature = "mysql")]
            BackendError::Mysql(e) => decode_mysql(e),
            #[cfg(feature = "mssql")]
            BackendError::Mssql(e) => decode_mssql(e),
            #[cfg(feature = "oracle")]
            BackendError::Oracle(e) => decode_oracle(e),
            BackendError::Io(e) => Self::message_only(e.to_string()),
            BackendError::Driver(msg) => Self::message_only(msg.clone()),
        }
    }

    fn message_only(driver_message: String) -> Self {
        Self {
            driver_message,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sqlstate.is_none() && self.driver_code.is_none() && self.driver_message.is_empty()
    }

    /// `SQLSTATE = .., Driver Code = .., Driver Message = ..`, or an empty
    /// string when nothing could be decoded.
    #[must_use]
    pub fn render(&self) -> String {
        if self.is_empty() {
            return String::new();
        }
        format!(
            "SQLSTATE = {}, Driver Code = {}, Driver Message = {}",
            self.sqlstate.as_deref().unwrap_or_default(),
            self.driver_code.as_deref().unwrap_or_default(),
            self.driver_message
        )
    }

    /// Most specific code available.
    #[must_use]
    pub fn code(&self) -> Option<String> {
        self.driver_code.clone().or_else(|| self.sqlstate.clone())
    }
}

/// A statement the backend refused to prepare.
pub(crate) fn prepare_failure(err: &BackendError, sql: &str) -> DatabaseError {
    let detail = ErrorDetail::decode(err);
    DatabaseError::new(err.to_string())
        .with_code(detail.code())
        .with_query(sql)
}

/// A statement that failed while running: `context` plus the decoded detail.
pub(crate) fn execute_failure(context: &str, err: &BackendError, sql: &str) -> DatabaseError {
    let detail = ErrorDetail::decode(err);
    DatabaseError::new(format!("{context}, Root cause:{}", detail.render()))
        .with_code(detail.code())
        .with_query(sql)
}

#[cfg(feature = "sqlite")]
fn decode_sqlite(err: &rusqlite::Error) -> ErrorDetail {
    match err {
        rusqlite::Error::SqliteFailure(failure, message) => ErrorDetail {
            sqlstate: None,
            driver_code: Some(failure.extended_code.to_string()),
            driver_message: message.clone().unwrap_or_else(|| failure.to_string()),
        },
        // Syntax errors caught while compiling carry the code here.
        rusqlite::Error::SqlInputError { error, msg, .. } => ErrorDetail {
            sqlstate: None,
            driver_code: Some(error.extended_code.to_string()),
            driver_message: msg.clone(),
        },
        other => ErrorDetail::message_only(other.to_string()),
    }
}

#[cfg(feature = "postgres")]
fn decode_postgres(err: &tokio_postgres::Error) -> ErrorDetail {
    match err.as_db_error() {
        Some(db) => ErrorDetail {
            sqlstate: Some(db.code().code().to_string()),
            driver_code: None,
            driver_message: db.message().to_string(),
        },
        None => ErrorDetail {
            sqlstate: err.code().map(|c| c.code().to_string()),
            driver_code: None,
            driver_message: err.to_string(),
        },
    }
}

#[cfg(feature = "mysql")]
fn decode_mysql(err: &sqlx::Error) -> ErrorDetail {
    match err {
        sqlx::Error::Database(db) => ErrorDetail {
            sqlstate: db.code().map(|c| c.into_owned()),
            driver_code: db
                .try_downcast_ref::<sqlx::mysql::MySqlDatabaseError>()
                .map(|e| e.number().to_string()),
            driver_message: db.message().to_string(),
        },
        other => ErrorDetail::message_only(other.to_string()),
    }
}

#[cfg(feature = "mssql")]
fn decode_mssql(err: &tiberius::error::Error) -> ErrorDetail {
    match err {
        tiberius::error::Error::Server(token) => ErrorDetail {
            sqlstate: Some(token.state().to_string()),
            driver_code: Some(token.code().to_string()),
            driver_message: token.message().to_string(),
        },
        other => ErrorDetail::message_only(other.to_string()),
    }
}

#[cfg(feature = "oracle")]
fn decode_oracle(err: &oracle::Error) -> ErrorDetail {
    match err.db_error() {
        Some(db) => ErrorDetail {
            sqlstate: None,
            driver_code: Some(db.code().to_string()),
            driver_message: db.message().to_string(),
        },
        None => ErrorDetail::message_only(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_includes_all_parts() {
        let detail = ErrorDetail {
            sqlstate: Some("23000".into()),
            driver_code: Some("1062".into()),
            driver_message: "Duplicate entry".into(),
        };
        assert_eq!(
            detail.render(),
            "SQLSTATE = 23000, Driver Code = 1062, Driver Message = Duplicate entry"
        );
        assert_eq!(detail.code().as_deref(), Some("1062"));
    }

    #[test]
    fn empty_detail_renders_empty() {
        let err = BackendError::Driver(String::new());
        let db_err = execute_failure("Could not execute statement", &err, "SELECT 1");
        assert_eq!(db_err.message(), "Could not execute statement, Root cause:");
        assert_eq!(db_err.query(), Some("SELECT 1"));
        assert_eq!(db_err.code(), None);
    }

    #[test]
    fn prepare_failure_keeps_query() {
        let err = BackendError::Driver("no such table: t".into());
        let db_err = prepare_failure(&err, "SELECT * FROM t");
        assert_eq!(db_err.message(), "no such table: t");
        assert_eq!(db_err.query(), Some("SELECT * FROM t"));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_failures_carry_extended_code() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.prepare("SELECT * FROM missing").unwrap_err();
        let detail = ErrorDetail::decode(&BackendError::Sqlite(err));
        assert!(detail.driver_code.is_some());
        assert!(detail.driver_message.contains("missing"));
    }

    #[cfg(feature = "sqlite")]
    #[test]
    fn sqlite_syntax_errors_carry_code() {
        let conn = rusqlite::Connection::open_in_memory().unwrap();
        let err = conn.prepare("SELECT 1 OFFSET 5").unwrap_err();
        let db_err = prepare_failure(&BackendError::Sqlite(err), "SELECT 1 OFFSET 5");
        assert_eq!(db_err.code(), Some("1"));
    }
}
