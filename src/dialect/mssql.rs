use super::{DialectProfile, LastInsertId, PlaceholderStyle, strip_terminator};
use crate::translation::has_order_by;
use crate::types::Dialect;

const EMPTY_PAGE_ALIAS: &str = "portable_page";

/// SQL Server pages with `OFFSET .. ROWS FETCH NEXT .. ROWS ONLY`, which requires an ORDER BY.
#[derive(Debug, Default, Clone, Copy)]
pub struct MssqlProfile;

impl DialectProfile for MssqlProfile {
    fn dialect(&self) -> Dialect {
        Dialect::Mssql
    }

    fn identifier_quotes(&self) -> (char, char) {
        ('[', ']')
    }

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::AtP
    }

    fn charset(&self) -> Option<&'static str> {
        Some("UTF8")
    }

    fn default_port(&self) -> Option<u16> {
        Some(1433)
    }

    fn apply_limit_offset(&self, sql: &str, limit: Option<u64>, offset: Option<u64>) -> String {
        let sql = strip_terminator(sql);
        let offset = offset.unwrap_or(0);
        if limit.is_none() && offset == 0 {
            return sql.to_string();
        }
        let mut out = if has_order_by(sql) {
            sql.to_string()
        } else {
            format!("{sql} ORDER BY (SELECT 0)")
        };
        out.push_str(&format!(" OFFSET {offset} ROWS"));
        match limit {
            // FETCH NEXT must be positive; an empty page comes from TOP 0.
            Some(0) => format!("SELECT TOP 0 * FROM ({out}) {EMPTY_PAGE_ALIAS}"),
            Some(limit) => {
                out.push_str(&format!(" FETCH NEXT {limit} ROWS ONLY"));
                out
            }
            None => out,
        }
    }

    fn rewrite_function(&self, name: &str) -> Option<&'static str> {
        match name {
            "NOW" => Some("CURRENT_TIMESTAMP"),
            "UNIX_TIMESTAMP" => Some("DATEDIFF(second,{d '1970-01-01'},GETDATE())"),
            _ => None,
        }
    }

    fn begin_sql(&self) -> &'static str {
        "BEGIN TRANSACTION"
    }

    fn commit_sql(&self) -> &'static str {
        "COMMIT TRANSACTION"
    }

    fn last_insert_id(&self, _table: Option<&str>) -> LastInsertId {
        LastInsertId::Query("SELECT CAST(@@IDENTITY AS BIGINT)".to_string())
    }
}
