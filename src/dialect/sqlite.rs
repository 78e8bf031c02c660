use super::{DialectProfile, LastInsertId, PlaceholderStyle, limit_offset_clause};
use crate::types::Dialect;

/// Embedded file-based engine.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteProfile;

impl DialectProfile for SqliteProfile {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::NumberedQuestion
    }

    fn has_native_conditional_insert(&self) -> bool {
        false
    }

    // Cached statements go stale when another process alters the schema.
    fn statement_caching_safe(&self) -> bool {
        false
    }

    fn default_port(&self) -> Option<u16> {
        None
    }

    fn apply_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        limit_offset_clause(sql, limit, offset, Some("-1"))
    }

    fn rewrite_function(&self, name: &str) -> Option<&'static str> {
        match name {
            "NOW" => Some("datetime('now')"),
            "UNIX_TIMESTAMP" => Some("strftime('%s','now')"),
            _ => None,
        }
    }

    fn last_insert_id(&self, _table: Option<&str>) -> LastInsertId {
        LastInsertId::Driver
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_and_offset() {
        let p = SqliteProfile;
        assert_eq!(p.apply_limit_offset("SELECT * FROM t", Some(5), None), "SELECT * FROM t LIMIT 5");
        assert_eq!(
            p.apply_limit_offset("SELECT * FROM t", Some(5), Some(10)),
            "SELECT * FROM t LIMIT 5 OFFSET 10"
        );
        assert_eq!(
            p.apply_limit_offset("SELECT * FROM t", None, Some(10)),
            "SELECT * FROM t LIMIT -1 OFFSET 10"
        );
    }
}
