use std::sync::Arc;

use chrono::NaiveDateTime;
use futures_util::TryStreamExt;
use tiberius::Query;

use super::connection::MssqlClient;
use crate::results::ResultSet;
use crate::types::RowValues;

/// Bind `params` to `sql` in order; placeholders are `@P1..@Pn`.
pub fn bind_query_params<'a>(sql: &'a str, params: &[RowValues]) -> Query<'a> {
    let mut query = Query::new(sql);
    for param in params {
        match param {
            RowValues::Int(i) => query.bind(*i),
            RowValues::Float(f) => query.bind(*f),
            RowValues::Text(s) => query.bind(s.clone()),
            RowValues::Bool(b) => query.bind(*b),
            RowValues::Timestamp(dt) => query.bind(*dt),
            RowValues::Null => query.bind(Option::<String>::None),
            RowValues::JSON(jsval) => query.bind(jsval.to_string()),
            RowValues::Blob(bytes) => query.bind(bytes.clone()),
        }
    }
    query
}

/// Run a row-returning statement and collect the first result set.
///
/// # Errors
/// Returns the driver error from execution or row decoding.
pub async fn build_result_set(
    client: &mut MssqlClient,
    sql: &str,
    params: &[RowValues],
) -> Result<ResultSet, tiberius::error::Error> {
    let mut stream = bind_query_params(sql, params).query(client).await?;

    let column_names: Vec<String> = stream
        .columns()
        .await?
        .map(|cols| cols.iter().map(|col| col.name().to_string()).collect())
        .unwrap_or_default();
    let col_count = column_names.len();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    let mut rows = stream.into_row_stream();
    while let Some(row) = rows.try_next().await? {
        let row_values = (0..col_count).map(|i| extract_value(&row, i)).collect();
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Run a statement that returns no rows; reports the summed row counts.
///
/// # Errors
/// Returns the driver error from execution.
pub async fn execute_dml(
    client: &mut MssqlClient,
    sql: &str,
    params: &[RowValues],
) -> Result<ResultSet, tiberius::error::Error> {
    let result = bind_query_params(sql, params).execute(client).await?;
    let affected: u64 = result.rows_affected().iter().sum();
    Ok(ResultSet::affected(
        usize::try_from(affected).unwrap_or(usize::MAX),
    ))
}

// Column types are not exposed per value, so the narrowest decoding that
// succeeds wins.
fn extract_value(row: &tiberius::Row, idx: usize) -> RowValues {
    if let Ok(Some(val)) = row.try_get::<i32, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<i64, _>(idx) {
        return RowValues::Int(val);
    }
    if let Ok(Some(val)) = row.try_get::<i16, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<u8, _>(idx) {
        return RowValues::Int(i64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<f32, _>(idx) {
        return RowValues::Float(f64::from(val));
    }
    if let Ok(Some(val)) = row.try_get::<f64, _>(idx) {
        return RowValues::Float(val);
    }
    if let Ok(Some(val)) = row.try_get::<bool, _>(idx) {
        return RowValues::Bool(val);
    }
    if let Ok(Some(val)) = row.try_get::<NaiveDateTime, _>(idx) {
        return RowValues::Timestamp(val);
    }
    if let Ok(Some(val)) = row.try_get::<&str, _>(idx) {
        return RowValues::Text(val.to_string());
    }
    if let Ok(Some(val)) = row.try_get::<&[u8], _>(idx) {
        return RowValues::Blob(val.to_vec());
    }
    RowValues::Null
}
