use super::{DialectProfile, LastInsertId, PlaceholderStyle, strip_terminator};
use crate::types::Dialect;

/// Oracle has no LIMIT clause; rows are cut with ROWNUM around a subquery.
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleProfile;

/// Column added to offset queries to carry the row number.
pub const ROWNUM_ALIAS: &str = "portable_rownum";

impl DialectProfile for OracleProfile {
    fn dialect(&self) -> Dialect {
        Dialect::Oracle
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Colon
    }

    fn charset(&self) -> Option<&'static str> {
        Some("AL32UTF8")
    }

    fn default_port(&self) -> Option<u16> {
        None
    }

    fn apply_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        let sql = strip_terminator(sql);
        match (limit, offset.filter(|o| *o > 0)) {
            (None, None) => sql.to_string(),
            (Some(limit), None) => format!("SELECT a.* FROM ({sql}) a WHERE ROWNUM <= {limit}"),
            (limit, Some(offset)) => {
                let numbered = match limit {
                    Some(limit) => format!(
                        "SELECT a.*, ROWNUM AS {ROWNUM_ALIAS} FROM ({sql}) a WHERE ROWNUM <= {}",
                        offset.saturating_add(limit)
                    ),
                    None => format!("SELECT a.*, ROWNUM AS {ROWNUM_ALIAS} FROM ({sql}) a"),
                };
                format!(
                    "SELECT * FROM ({numbered}) WHERE {ROWNUM_ALIAS} >= {}",
                    offset.saturating_add(1)
                )
            }
        }
    }

    fn rewrite_function(&self, name: &str) -> Option<&'static str> {
        match name {
            "NOW" => Some("CURRENT_TIMESTAMP"),
            "UNIX_TIMESTAMP" => Some(
                "((CAST(SYS_EXTRACT_UTC(systimestamp) AS DATE))-TO_DATE('1970101000000','YYYYMMDDHH24MiSS'))*24*3600",
            ),
            _ => None,
        }
    }

    fn last_insert_id(&self, table: Option<&str>) -> LastInsertId {
        match table {
            Some(table) => LastInsertId::Query(format!(
                "SELECT {}.CURRVAL FROM DUAL",
                self.quote_identifier(&format!("{table}_SEQ"))
            )),
            None => LastInsertId::Unavailable("oracle needs a table name to locate its sequence"),
        }
    }
}
