use super::{DialectProfile, LastInsertId, PlaceholderStyle, limit_offset_clause};
use crate::types::Dialect;

#[derive(Debug, Default, Clone, Copy)]
pub struct MysqlProfile;

impl DialectProfile for MysqlProfile {
    fn dialect(&self) -> Dialect {
        Dialect::Mysql
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('`', '`')
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }

    fn charset(&self) -> Option<&'static str> {
        Some("UTF8")
    }

    fn default_port(&self) -> Option<u16> {
        Some(3306)
    }

    // MySQL has no "no limit" keyword; the documented idiom is the largest BIGINT UNSIGNED.
    fn apply_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        limit_offset_clause(sql, limit, offset, Some("18446744073709551615"))
    }

    fn begin_sql(&self) -> &'static str {
        "START TRANSACTION"
    }

    fn last_insert_id(&self, _table: Option<&str>) -> LastInsertId {
        LastInsertId::Driver
    }
}
