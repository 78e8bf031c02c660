//! Insert a row unless an identical one exists.
//!
//! Not atomic against other connections: two writers can both see "absent"
//! and both insert. Only a unique index on the table prevents that.

use crate::database::Database;
use crate::error::{SqlPortableError, ValidationError};
use crate::types::RowValues;

impl Database {
    /// Insert `fields` into `table` unless a row with the same values exists.
    ///
    /// `table` may use the `*PREFIX*` marker. Returns `Ok(true)` on success,
    /// whether or not a row was inserted.
    ///
    /// # Errors
    /// Returns `Validation(EmptyFields)` for an empty field list, and the
    /// same errors as [`execute_audited`](Self::execute_audited) otherwise.
    pub async fn insert_if_not_exist(
        &mut self,
        table: &str,
        fields: &[(&str, RowValues)],
    ) -> Result<bool, SqlPortableError> {
        if fields.is_empty() {
            return Err(ValidationError::EmptyFields.into());
        }
        let profile = self.ensure_connected().await?;
        let columns: Vec<&str> = fields.iter().map(|(name, _)| *name).collect();
        let values: Vec<RowValues> = fields.iter().map(|(_, value)| value.clone()).collect();

        if profile.has_native_conditional_insert() {
            let mut params = values.clone();
            params.extend(values);
            let sql = conditional_insert_sql(table, &columns);
            self.execute_audited(sql, &params).await?;
            return Ok(true);
        }

        let existing = self
            .execute_audited(probe_sql(table, &columns), &values)
            .await?;
        if existing.num_rows() > 0 {
            tracing::debug!(table, "row already present, skipping insert");
            return Ok(true);
        }
        self.execute_audited(insert_sql(table, &columns), &values)
            .await?;
        Ok(true)
    }
}

fn equality_filter(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("`{c}` = ?"))
        .collect::<Vec<_>>()
        .join(" AND ")
}

fn column_list(columns: &[&str]) -> String {
    columns
        .iter()
        .map(|c| format!("`{c}`"))
        .collect::<Vec<_>>()
        .join(",")
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(",")
}

/// `SELECT * FROM t WHERE a = ? AND b = ?`
pub(crate) fn probe_sql(table: &str, columns: &[&str]) -> String {
    format!("SELECT * FROM `{table}` WHERE {}", equality_filter(columns))
}

pub(crate) fn insert_sql(table: &str, columns: &[&str]) -> String {
    format!(
        "INSERT INTO `{table}` ({}) VALUES({})",
        column_list(columns),
        placeholders(columns.len())
    )
}

/// Single-statement form; bind the values twice, select list first.
pub(crate) fn conditional_insert_sql(table: &str, columns: &[&str]) -> String {
    format!(
        "INSERT INTO `{table}` ({}) SELECT {} FROM `{table}` WHERE {} HAVING COUNT(*) = 0",
        column_list(columns),
        placeholders(columns.len()),
        equality_filter(columns)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::profile_for;
    use crate::translation::rewrite_statement;
    use crate::types::Dialect;

    #[test]
    fn probe_and_insert_share_column_order() {
        assert_eq!(
            probe_sql("*PREFIX*locks", &["path", "owner"]),
            "SELECT * FROM `*PREFIX*locks` WHERE `path` = ? AND `owner` = ?"
        );
        assert_eq!(
            insert_sql("*PREFIX*locks", &["path", "owner"]),
            "INSERT INTO `*PREFIX*locks` (`path`,`owner`) VALUES(?,?)"
        );
    }

    #[test]
    fn conditional_insert_per_dialect() {
        let sql = conditional_insert_sql("*PREFIX*t", &["a", "b"]);
        assert_eq!(
            sql,
            "INSERT INTO `*PREFIX*t` (`a`,`b`) SELECT ?,? FROM `*PREFIX*t` WHERE `a` = ? AND `b` = ? HAVING COUNT(*) = 0"
        );
        assert_eq!(
            rewrite_statement(&sql, profile_for(Dialect::Postgres), "oc_"),
            "INSERT INTO \"oc_t\" (\"a\",\"b\") SELECT $1,$2 FROM \"oc_t\" WHERE \"a\" = $3 AND \"b\" = $4 HAVING COUNT(*) = 0"
        );
        assert_eq!(
            rewrite_statement(&sql, profile_for(Dialect::Mssql), "oc_"),
            "INSERT INTO [oc_t] ([a],[b]) SELECT @P1,@P2 FROM [oc_t] WHERE [a] = @P3 AND [b] = @P4 HAVING COUNT(*) = 0"
        );
        assert_eq!(
            rewrite_statement(&sql, profile_for(Dialect::Mysql), "oc_"),
            "INSERT INTO `oc_t` (`a`,`b`) SELECT ?,? FROM `oc_t` WHERE `a` = ? AND `b` = ? HAVING COUNT(*) = 0"
        );
        assert_eq!(
            rewrite_statement(&sql, profile_for(Dialect::Oracle), "oc_"),
            "INSERT INTO \"oc_t\" (\"a\",\"b\") SELECT :1,:2 FROM \"oc_t\" WHERE \"a\" = :3 AND \"b\" = :4 HAVING COUNT(*) = 0"
        );
    }
}
