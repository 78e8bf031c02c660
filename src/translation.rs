//! Portable SQL to dialect SQL.
//!
//! Statements are written once, in a portable form: identifiers quoted with
//! backticks, table names prefixed with `*PREFIX*`, anonymous `?`
//! placeholders and the zero-argument functions `NOW()` and
//! `UNIX_TIMESTAMP()`. [`rewrite_statement`] turns that into the target
//! dialect's SQL. String literals and comments are never touched.

use std::sync::LazyLock;

use regex::Regex;

use crate::dialect::DialectProfile;

/// Table-name marker replaced by the configured prefix.
pub const PREFIX_MARKER: &str = "*PREFIX*";

static PAGING_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(limit|offset)\b").expect("static regex"));
static ORDER_BY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\border\s+by\b").expect("static regex"));

/// A lexical piece of a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Segment<'a> {
    Code(&'a str),
    /// Single-quoted literal including its quotes.
    Literal(&'a str),
    Comment(&'a str),
    /// Backtick-quoted identifier, without the backticks.
    Backticked(&'a str),
    /// Double-quoted identifier including its quotes.
    DoubleQuoted(&'a str),
}

/// Split `sql` into code, literals, comments and quoted identifiers.
pub(crate) fn segments(sql: &str) -> Vec<Segment<'_>> {
    let bytes = sql.as_bytes();
    let mut out = Vec::new();
    let mut code_start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        let start = idx;
        let segment_end = match bytes[idx] {
            b'\'' | b'"' | b'`' => Some(scan_quoted(bytes, idx, bytes[idx]).0),
            b'-' if bytes.get(idx + 1) == Some(&b'-') => Some(
                bytes[idx..]
                    .iter()
                    .position(|b| *b == b'\n')
                    .map_or(bytes.len(), |p| idx + p + 1),
            ),
            b'/' if bytes.get(idx + 1) == Some(&b'*') => Some(scan_block_comment(bytes, idx)),
            _ => None,
        };

        let Some(end) = segment_end else {
            idx += 1;
            continue;
        };

        if code_start < start {
            out.push(Segment::Code(&sql[code_start..start]));
        }
        let text = &sql[start..end];
        out.push(match bytes[start] {
            b'\'' => Segment::Literal(text),
            b'"' => Segment::DoubleQuoted(text),
            b'`' => {
                let closed = end - start >= 2 && bytes[end - 1] == b'`';
                Segment::Backticked(&sql[start + 1..if closed { end - 1 } else { end }])
            }
            _ => Segment::Comment(text),
        });
        idx = end;
        code_start = end;
    }

    if code_start < bytes.len() {
        out.push(Segment::Code(&sql[code_start..]));
    }
    out
}

// Returns the index just past the closing quote; a doubled quote is an escape.
fn scan_quoted(bytes: &[u8], open: usize, quote: u8) -> (usize, bool) {
    let mut idx = open + 1;
    while idx < bytes.len() {
        if bytes[idx] == quote {
            if bytes.get(idx + 1) == Some(&quote) {
                idx += 2;
                continue;
            }
            return (idx + 1, true);
        }
        idx += 1;
    }
    (bytes.len(), false)
}

fn scan_block_comment(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0u32;
    let mut idx = open;
    while idx < bytes.len() {
        if bytes[idx] == b'/' && bytes.get(idx + 1) == Some(&b'*') {
            depth += 1;
            idx += 2;
        } else if bytes[idx] == b'*' && bytes.get(idx + 1) == Some(&b'/') {
            depth -= 1;
            idx += 2;
            if depth == 0 {
                return idx;
            }
        } else {
            idx += 1;
        }
    }
    bytes.len()
}

/// Code-only view of `sql`: everything that is not executable SQL text
/// (literals, comments, quoted identifiers) is blanked out.
#[must_use]
pub fn code_only(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    for segment in segments(sql) {
        match segment {
            Segment::Code(code) => out.push_str(code),
            Segment::Literal(s) | Segment::Comment(s) | Segment::DoubleQuoted(s) => {
                out.push_str(&" ".repeat(s.len()));
            }
            Segment::Backticked(s) => out.push_str(&" ".repeat(s.len() + 2)),
        }
    }
    out
}

/// True when `sql` carries a `LIMIT` or `OFFSET` keyword in executable text.
#[must_use]
pub fn contains_paging_token(sql: &str) -> bool {
    PAGING_TOKEN.is_match(&code_only(sql))
}

/// True when the outermost query of `sql` is ordered.
///
/// An `ORDER BY` inside parentheses (window functions, subqueries, CTE
/// bodies) does not count.
#[must_use]
pub fn has_order_by(sql: &str) -> bool {
    let code = code_only(sql);
    ORDER_BY
        .find_iter(&code)
        .any(|m| paren_depth(&code[..m.start()]) == 0)
}

fn paren_depth(code: &str) -> i64 {
    code.bytes().fold(0, |depth, b| match b {
        b'(' => depth + 1,
        b')' => depth - 1,
        _ => depth,
    })
}

/// Whether the statement's leading keyword produces a result set.
///
/// Only used for drivers that cannot describe a statement before running it.
#[must_use]
pub fn returns_rows(sql: &str) -> bool {
    let code = code_only(sql);
    let first = code
        .trim_start_matches(|c: char| c.is_whitespace() || c == '(')
        .split(|c: char| !c.is_ascii_alphabetic())
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first.as_str(),
        "SELECT" | "WITH" | "VALUES" | "SHOW" | "PRAGMA" | "EXPLAIN" | "DESCRIBE"
    )
}

/// Replace the table-prefix marker in `name`.
#[must_use]
pub fn replace_table_prefix(name: &str, table_prefix: &str) -> String {
    name.replace(PREFIX_MARKER, table_prefix)
}

/// Rewrite portable SQL into `profile`'s dialect.
#[must_use]
pub fn rewrite_statement(sql: &str, profile: &dyn DialectProfile, table_prefix: &str) -> String {
    let mut out = String::with_capacity(sql.len() + 16);
    let mut next_param = 1usize;

    for segment in segments(sql) {
        match segment {
            Segment::Code(code) => {
                rewrite_code(code, profile, table_prefix, &mut next_param, &mut out);
            }
            Segment::Backticked(ident) => {
                out.push_str(&profile.quote_identifier(&replace_table_prefix(ident, table_prefix)));
            }
            Segment::DoubleQuoted(ident) => {
                out.push_str(&replace_table_prefix(ident, table_prefix));
            }
            Segment::Literal(s) | Segment::Comment(s) => out.push_str(s),
        }
    }
    out
}

fn rewrite_code(
    code: &str,
    profile: &dyn DialectProfile,
    table_prefix: &str,
    next_param: &mut usize,
    out: &mut String,
) {
    let style = profile.placeholder_style();
    let mut idx = 0;

    while idx < code.len() {
        let rest = &code[idx..];

        if rest.starts_with(PREFIX_MARKER) {
            out.push_str(table_prefix);
            idx += PREFIX_MARKER.len();
            continue;
        }

        let Some(c) = rest.chars().next() else { break };

        if c == '?' {
            let digits = rest[1..]
                .bytes()
                .take_while(u8::is_ascii_digit)
                .count();
            let index = if digits > 0 {
                rest[1..=digits].parse().unwrap_or(*next_param)
            } else {
                *next_param
            };
            out.push_str(&style.render(index));
            *next_param = index + 1;
            idx += 1 + digits;
            continue;
        }

        if c.is_ascii_alphabetic() || c == '_' {
            let word_len = rest
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_' || *b == b'$')
                .count();
            let word = &rest[..word_len];
            if rest[word_len..].starts_with("()") {
                if let Some(replacement) = profile.rewrite_function(&word.to_ascii_uppercase()) {
                    out.push_str(replacement);
                    idx += word_len + 2;
                    continue;
                }
            }
            out.push_str(word);
            idx += word_len;
            continue;
        }

        out.push(c);
        idx += c.len_utf8();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::profile_for;
    use crate::types::Dialect;

    #[test]
    fn rewrites_for_postgres() {
        let sql = "SELECT `configvalue` FROM `*PREFIX*appconfig` WHERE `appid` = ? AND `configkey` = ?";
        assert_eq!(
            rewrite_statement(sql, profile_for(Dialect::Postgres), "oc_"),
            "SELECT \"configvalue\" FROM \"oc_appconfig\" WHERE \"appid\" = $1 AND \"configkey\" = $2"
        );
    }

    #[test]
    fn rewrites_for_mysql_and_mssql() {
        let sql = "DELETE FROM `*PREFIX*locks` WHERE `ttl` < ?";
        assert_eq!(
            rewrite_statement(sql, profile_for(Dialect::Mysql), "oc_"),
            "DELETE FROM `oc_locks` WHERE `ttl` < ?"
        );
        assert_eq!(
            rewrite_statement(sql, profile_for(Dialect::Mssql), "oc_"),
            "DELETE FROM [oc_locks] WHERE [ttl] < @P1"
        );
    }

    #[test]
    fn bare_prefix_and_numbered_placeholders() {
        let sql = "UPDATE *PREFIX*t SET a = ?2 WHERE b = ?1";
        assert_eq!(
            rewrite_statement(sql, profile_for(Dialect::Oracle), "x_"),
            "UPDATE x_t SET a = :2 WHERE b = :1"
        );
    }

    #[test]
    fn literals_and_comments_untouched() {
        let sql = "SELECT '?', `a` -- what? *PREFIX*\nFROM t /* ? */ WHERE b = ?";
        assert_eq!(
            rewrite_statement(sql, profile_for(Dialect::Sqlite), "oc_"),
            "SELECT '?', \"a\" -- what? *PREFIX*\nFROM t /* ? */ WHERE b = ?1"
        );
    }

    #[test]
    fn escaped_quotes_stay_inside_literal() {
        let sql = "SELECT 'it''s ?' FROM t WHERE a = ?";
        assert_eq!(
            rewrite_statement(sql, profile_for(Dialect::Postgres), ""),
            "SELECT 'it''s ?' FROM t WHERE a = $1"
        );
    }

    #[test]
    fn portable_functions_are_translated() {
        let sql = "UPDATE t SET mtime = UNIX_TIMESTAMP(), seen = now()";
        assert_eq!(
            rewrite_statement(sql, profile_for(Dialect::Sqlite), ""),
            "UPDATE t SET mtime = strftime('%s','now'), seen = datetime('now')"
        );
        assert_eq!(rewrite_statement(sql, profile_for(Dialect::Mysql), ""), sql);
    }

    #[test]
    fn non_ascii_text_survives() {
        let sql = "SELECT `naïve` FROM t WHERE a = 'café' AND b = ?";
        assert_eq!(
            rewrite_statement(sql, profile_for(Dialect::Postgres), ""),
            "SELECT \"naïve\" FROM t WHERE a = 'café' AND b = $1"
        );
    }

    #[test]
    fn paging_detection_is_token_based() {
        assert!(contains_paging_token("SELECT * FROM t LIMIT 5"));
        assert!(contains_paging_token("select * from t limit 5 offset 2"));
        assert!(contains_paging_token("SELECT 1 OFFSET 5"));
        assert!(contains_paging_token("SELECT a FROM t ORDER BY a Offset 2 ROWS"));
        assert!(!contains_paging_token("SELECT `limit`, `offset` FROM t"));
        assert!(!contains_paging_token("SELECT * FROM t WHERE a = 'LIMIT' OR b = 'offset'"));
        assert!(!contains_paging_token("SELECT unlimited, offsets FROM t"));
    }

    #[test]
    fn only_outer_order_by_counts() {
        assert!(has_order_by("SELECT a FROM t ORDER BY a"));
        assert!(has_order_by("SELECT ROW_NUMBER() OVER (ORDER BY id) AS rn FROM t ORDER BY rn"));
        assert!(!has_order_by("SELECT ROW_NUMBER() OVER (ORDER BY id) AS rn FROM t"));
        assert!(!has_order_by("SELECT * FROM (SELECT TOP 3 a FROM t ORDER BY a) x"));
        assert!(!has_order_by("WITH c AS (SELECT a FROM t ORDER BY a) SELECT * FROM c"));
        assert!(!has_order_by("SELECT ')' AS p FROM t WHERE b = '(order by'"));
    }

    #[test]
    fn leading_keyword_classification() {
        assert!(returns_rows("  select 1"));
        assert!(returns_rows("(SELECT 1) UNION (SELECT 2)"));
        assert!(returns_rows("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(!returns_rows("INSERT INTO t (a) SELECT 1"));
        assert!(!returns_rows("-- comment\nDELETE FROM t"));
    }
}
