use super::{DialectProfile, LastInsertId, PlaceholderStyle, limit_offset_clause};
use crate::types::Dialect;

#[derive(Debug, Default, Clone, Copy)]
pub struct PostgresProfile;

impl DialectProfile for PostgresProfile {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Dollar
    }

    fn default_port(&self) -> Option<u16> {
        Some(5432)
    }

    fn apply_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        limit_offset_clause(sql, limit, offset, None)
    }

    fn rewrite_function(&self, name: &str) -> Option<&'static str> {
        match name {
            "UNIX_TIMESTAMP" => Some("cast(extract(epoch from current_timestamp) as integer)"),
            _ => None,
        }
    }

    fn last_insert_id(&self, _table: Option<&str>) -> LastInsertId {
        LastInsertId::Query("SELECT lastval()".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_only_has_no_limit() {
        assert_eq!(
            PostgresProfile.apply_limit_offset("SELECT a FROM t", None, Some(3)),
            "SELECT a FROM t OFFSET 3"
        );
    }
}
