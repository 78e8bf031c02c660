use std::sync::Arc;

use chrono::NaiveDateTime;
use ::oracle::sql_type::{OracleType, ToSql};
use ::oracle::{SqlValue, Statement};

use crate::results::ResultSet;
use crate::types::RowValues;

/// Owned Oracle binds for `params`; booleans become 0/1.
#[must_use]
pub fn convert_params(params: &[RowValues]) -> Vec<Box<dyn ToSql>> {
    params
        .iter()
        .map(|param| -> Box<dyn ToSql> {
            match param {
                RowValues::Int(i) => Box::new(*i),
                RowValues::Float(f) => Box::new(*f),
                RowValues::Text(s) => Box::new(s.clone()),
                RowValues::Bool(b) => Box::new(i64::from(*b)),
                RowValues::Timestamp(dt) => Box::new(*dt),
                RowValues::Null => Box::new(Option::<String>::None),
                RowValues::JSON(jsval) => Box::new(jsval.to_string()),
                RowValues::Blob(bytes) => Box::new(bytes.clone()),
            }
        })
        .collect()
}

/// Run a query statement and collect every row.
///
/// # Errors
/// Returns the driver error from execution or value conversion.
pub fn build_result_set(
    stmt: &mut Statement,
    params: &[&dyn ToSql],
) -> Result<ResultSet, ::oracle::Error> {
    let rows = stmt.query(params)?;
    let column_names: Vec<String> = rows
        .column_info()
        .iter()
        .map(|c| c.name().to_string())
        .collect();

    let mut result_set = ResultSet::with_capacity(10);
    result_set.set_column_names(Arc::new(column_names));

    for row in rows {
        let row = row?;
        let row_values = row
            .sql_values()
            .iter()
            .map(oracle_extract_value)
            .collect::<Result<Vec<_>, _>>()?;
        result_set.add_row_values(row_values);
    }
    Ok(result_set)
}

/// Decode one column according to its Oracle type.
///
/// # Errors
/// Returns the driver error if the value cannot be converted.
pub fn oracle_extract_value(value: &SqlValue) -> Result<RowValues, ::oracle::Error> {
    if value.is_null()? {
        return Ok(RowValues::Null);
    }
    Ok(match value.oracle_type()? {
        OracleType::Number(_, scale) if *scale <= 0 => match value.get::<i64>() {
            Ok(i) => RowValues::Int(i),
            Err(_) => RowValues::Text(value.get::<String>()?),
        },
        OracleType::Number(..)
        | OracleType::Float(_)
        | OracleType::BinaryFloat
        | OracleType::BinaryDouble => RowValues::Float(value.get::<f64>()?),
        OracleType::Date
        | OracleType::Timestamp(_)
        | OracleType::TimestampTZ(_)
        | OracleType::TimestampLTZ(_) => RowValues::Timestamp(value.get::<NaiveDateTime>()?),
        OracleType::Raw(_) | OracleType::LongRaw | OracleType::BLOB => {
            RowValues::Blob(value.get::<Vec<u8>>()?)
        }
        _ => RowValues::Text(value.get::<String>()?),
    })
}
