//! Per-dialect strategy.
//!
//! Every dialect-specific decision (identifier quoting, placeholder syntax,
//! limit/offset rewriting, conditional insert strategy, last-insert-id
//! lookup) lives behind [`DialectProfile`]. A profile is selected once, when
//! the connection is opened, so call sites never branch on the dialect.

mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod sqlite;

use std::fmt;

pub use mssql::MssqlProfile;
pub use mysql::MysqlProfile;
pub use oracle::OracleProfile;
pub use postgres::PostgresProfile;
pub use sqlite::SqliteProfile;

use crate::types::Dialect;

/// Parameter placeholder syntax expected by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// Anonymous positional `?`.
    Question,
    /// Numbered `?1`.
    NumberedQuestion,
    /// Numbered `$1`.
    Dollar,
    /// Numbered `:1`.
    Colon,
    /// Named `@P1`.
    AtP,
}

impl PlaceholderStyle {
    /// Render the placeholder for the 1-based parameter `index`.
    #[must_use]
    pub fn render(self, index: usize) -> String {
        match self {
            PlaceholderStyle::Question => "?".to_string(),
            PlaceholderStyle::NumberedQuestion => format!("?{index}"),
            PlaceholderStyle::Dollar => format!("${index}"),
            PlaceholderStyle::Colon => format!(":{index}"),
            PlaceholderStyle::AtP => format!("@P{index}"),
        }
    }
}

/// How the last auto-generated key is read back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LastInsertId {
    /// The driver reports it directly.
    Driver,
    /// A follow-up query returns it in the first column.
    Query(String),
    /// Not resolvable with the given arguments.
    Unavailable(&'static str),
}

/// Static behavior of one SQL dialect.
pub trait DialectProfile: fmt::Debug + Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Opening and closing identifier quote characters.
    fn identifier_quotes(&self) -> (char, char) {
        ('"', '"')
    }

    /// Quote an identifier, escaping embedded closing quotes.
    fn quote_identifier(&self, name: &str) -> String {
        let (open, close) = self.identifier_quotes();
        let mut out = String::with_capacity(name.len() + 2);
        out.push(open);
        for c in name.chars() {
            if c == close {
                out.push(close);
            }
            out.push(c);
        }
        out.push(close);
        out
    }

    fn placeholder_style(&self) -> PlaceholderStyle;

    /// Whether `INSERT .. SELECT .. HAVING COUNT(*) = 0` suppresses the insert
    /// in one round trip. Dialects without it probe first, then insert.
    fn has_native_conditional_insert(&self) -> bool {
        true
    }

    /// Whether the driver may keep prepared statements across schema changes.
    fn statement_caching_safe(&self) -> bool {
        true
    }

    fn charset(&self) -> Option<&'static str> {
        None
    }

    fn default_port(&self) -> Option<u16>;

    /// Append the dialect's equivalent of `LIMIT limit OFFSET offset` to `sql`.
    fn apply_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String;

    /// Replacement for portable zero-argument functions such as `NOW()`.
    /// `name` is upper-case and excludes the parentheses.
    fn rewrite_function(&self, _name: &str) -> Option<&'static str> {
        None
    }

    fn begin_sql(&self) -> &'static str {
        "BEGIN"
    }

    fn commit_sql(&self) -> &'static str {
        "COMMIT"
    }

    /// `table` is already prefix-substituted.
    fn last_insert_id(&self, table: Option<&str>) -> LastInsertId;
}

static SQLITE: SqliteProfile = SqliteProfile;
static MYSQL: MysqlProfile = MysqlProfile;
static POSTGRES: PostgresProfile = PostgresProfile;
static ORACLE: OracleProfile = OracleProfile;
static MSSQL: MssqlProfile = MssqlProfile;

/// Look up the profile for `dialect`.
#[must_use]
pub fn profile_for(dialect: Dialect) -> &'static dyn DialectProfile {
    match dialect {
        Dialect::Sqlite => &SQLITE,
        Dialect::Mysql => &MYSQL,
        Dialect::Postgres => &POSTGRES,
        Dialect::Oracle => &ORACLE,
        Dialect::Mssql => &MSSQL,
    }
}

/// Shared `LIMIT n OFFSET m` rendering.
///
/// `unbounded` is the literal used as LIMIT when only an offset is given; with
/// `None` a bare `OFFSET m` is emitted.
pub(crate) fn limit_offset_clause(
    sql: &str,
    limit: Option<u64>,
    offset: Option<u64>,
    unbounded: Option<&str>,
) -> String {
    let sql = strip_terminator(sql);
    match (limit, offset.filter(|o| *o > 0)) {
        (None, None) => sql.to_string(),
        (Some(limit), None) => format!("{sql} LIMIT {limit}"),
        (Some(limit), Some(offset)) => format!("{sql} LIMIT {limit} OFFSET {offset}"),
        (None, Some(offset)) => match unbounded {
            Some(max) => format!("{sql} LIMIT {max} OFFSET {offset}"),
            None => format!("{sql} OFFSET {offset}"),
        },
    }
}

pub(crate) fn strip_terminator(sql: &str) -> &str {
    sql.trim_end().trim_end_matches(';').trim_end()
}
