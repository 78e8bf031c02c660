use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use sqlx::mysql::{MySql, MySqlArguments, MySqlRow};
use sqlx::query::Query;
use sqlx::{Column, Row as _};

use crate::results::ResultSet;
use crate::types::RowValues;

pub(crate) type MysqlQuery<'q> = Query<'q, MySql, MySqlArguments>;

/// Bind `params` to `query` in order.
pub fn bind_query_params<'q>(mut query: MysqlQuery<'q>, params: &[RowValues]) -> MysqlQuery<'q> {
    for param in params {
        query = match param {
            RowValues::Int(i) => query.bind(*i),
            RowValues::Float(f) => query.bind(*f),
            RowValues::Text(s) => query.bind(s.clone()),
            RowValues::Bool(b) => query.bind(*b),
            RowValues::Timestamp(dt) => query.bind(*dt),
            RowValues::Null => query.bind(Option::<String>::None),
            RowValues::JSON(jsval) => query.bind(sqlx::types::Json(jsval.clone())),
            RowValues::Blob(bytes) => query.bind(bytes.clone()),
        };
    }
    query
}

/// Collect fetched rows, naming columns after the first row.
///
/// # Errors
/// Returns the driver error if a column cannot be decoded.
pub fn build_result_set(rows: &[MySqlRow]) -> Result<ResultSet, sqlx::Error> {
    let mut result_set = ResultSet::with_capacity(rows.len());
    if let Some(row) = rows.first() {
        let names = row.columns().iter().map(|c| c.name().to_string()).collect();
        result_set.set_column_names(Arc::new(names));
    }

    for row in rows {
        let col_count = row.columns().len();
        let mut row_values = Vec::with_capacity(col_count);
        for idx in 0..col_count {
            row_values.push(mysql_extract_value(row, idx)?);
        }
        result_set.add_row_values(row_values);
    }

    Ok(result_set)
}

/// Decode column `idx`, trying the driver's compatible types in order.
///
/// # Errors
/// Returns the driver error if no decoding applies.
pub fn mysql_extract_value(row: &MySqlRow, idx: usize) -> Result<RowValues, sqlx::Error> {
    if let Ok(val) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(val.map_or(RowValues::Null, RowValues::Int));
    }
    if let Ok(val) = row.try_get::<Option<u64>, _>(idx) {
        return Ok(val.map_or(RowValues::Null, |v| {
            i64::try_from(v).map_or_else(|_| RowValues::Text(v.to_string()), RowValues::Int)
        }));
    }
    if let Ok(val) = row.try_get::<Option<f64>, _>(idx) {
        return Ok(val.map_or(RowValues::Null, RowValues::Float));
    }
    if let Ok(val) = row.try_get::<Option<f32>, _>(idx) {
        return Ok(val.map_or(RowValues::Null, |v| RowValues::Float(f64::from(v))));
    }
    if let Ok(val) = row.try_get::<Option<NaiveDateTime>, _>(idx) {
        return Ok(val.map_or(RowValues::Null, RowValues::Timestamp));
    }
    if let Ok(val) = row.try_get::<Option<NaiveDate>, _>(idx) {
        return Ok(val
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map_or(RowValues::Null, RowValues::Timestamp));
    }
    if let Ok(val) = row.try_get::<Option<String>, _>(idx) {
        return Ok(val.map_or(RowValues::Null, RowValues::Text));
    }
    if let Ok(val) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Ok(val.map_or(RowValues::Null, RowValues::Blob));
    }
    // DECIMAL and friends travel as text.
    let val = row.try_get_unchecked::<Option<String>, _>(idx)?;
    Ok(val.map_or(RowValues::Null, RowValues::Text))
}
