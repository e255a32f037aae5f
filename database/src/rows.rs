use aocrecs_types::{Table, Value};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::postgres::types::PgInterval;
use sqlx::postgres::PgRow;
use sqlx::sqlite::SqliteRow;
use sqlx::types::Decimal;
use sqlx::{Column, Row, TypeInfo, ValueRef};

use crate::DatabaseError;

/// Convert fetched rows into a [`Table`] with the given column names.
pub(crate) fn rows_to_table<R, F>(
    columns: Vec<String>,
    rows: &[R],
    decode: F,
) -> Result<Table, DatabaseError>
where
    R: Row,
    F: Fn(&R, usize) -> Result<Value, DatabaseError>,
{
    let mut table = Table::new(columns);
    for row in rows {
        let values = (0..row.len())
            .map(|i| decode(row, i))
            .collect::<Result<Vec<_>, _>>()?;
        table.push_row(values)?;
    }
    Ok(table)
}

pub(crate) fn column_names<R: Row>(row: &R) -> Vec<String> {
    row.columns().iter().map(|c| c.name().to_string()).collect()
}

fn unsupported<R: Row>(row: &R, i: usize, type_name: &str) -> DatabaseError
where
    usize: sqlx::ColumnIndex<R>,
{
    DatabaseError::UnsupportedColumnType {
        column: row.column(i).name().to_string(),
        type_name: type_name.to_string(),
    }
}

/// Decode by the column's Postgres type. Date, time, interval, numeric and
/// json values are rendered as text.
pub(crate) fn decode_pg_value(row: &PgRow, i: usize) -> Result<Value, DatabaseError> {
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "BOOL" => Value::Bool(row.try_get(i)?),
        "INT2" => Value::Int(row.try_get::<i16, _>(i)?.into()),
        "INT4" => Value::Int(row.try_get::<i32, _>(i)?.into()),
        "INT8" => Value::Int(row.try_get(i)?),
        "FLOAT4" => Value::Float(row.try_get::<f32, _>(i)?.into()),
        "FLOAT8" => Value::Float(row.try_get(i)?),
        "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" => Value::Text(row.try_get(i)?),
        "BYTEA" => Value::Bytes(row.try_get(i)?),
        "TIMESTAMP" => Value::Text(row.try_get::<NaiveDateTime, _>(i)?.to_string()),
        "TIMESTAMPTZ" => Value::Text(row.try_get::<DateTime<Utc>, _>(i)?.to_rfc3339()),
        "DATE" => Value::Text(row.try_get::<NaiveDate, _>(i)?.to_string()),
        "TIME" => Value::Text(row.try_get::<NaiveTime, _>(i)?.to_string()),
        "INTERVAL" => Value::Text(format_interval(&row.try_get::<PgInterval, _>(i)?)),
        "NUMERIC" => Value::Text(row.try_get::<Decimal, _>(i)?.to_string()),
        "JSON" | "JSONB" => Value::Text(row.try_get::<serde_json::Value, _>(i)?.to_string()),
        _ => return Err(unsupported(row, i, &type_name)),
    };
    Ok(value)
}

/// Decode by the storage class of the value itself, which is what SQLite
/// types dynamically.
pub(crate) fn decode_sqlite_value(row: &SqliteRow, i: usize) -> Result<Value, DatabaseError> {
    let raw = row.try_get_raw(i)?;
    if raw.is_null() {
        return Ok(Value::Null);
    }
    let type_name = raw.type_info().name().to_string();

    let value = match type_name.as_str() {
        "INTEGER" => Value::Int(row.try_get(i)?),
        "REAL" => Value::Float(row.try_get(i)?),
        "TEXT" => Value::Text(row.try_get(i)?),
        "BLOB" => Value::Bytes(row.try_get(i)?),
        _ => return Err(unsupported(row, i, &type_name)),
    };
    Ok(value)
}

/// Postgres' own text form: `3 days 01:02:03.5`.
pub(crate) fn format_interval(interval: &PgInterval) -> String {
    fn unit(n: i32, name: &str) -> String {
        if n.abs() == 1 {
            format!("{n} {name}")
        } else {
            format!("{n} {name}s")
        }
    }

    let mut parts = Vec::new();
    if interval.months != 0 {
        parts.push(unit(interval.months, "mon"));
    }
    if interval.days != 0 {
        parts.push(unit(interval.days, "day"));
    }
    if interval.microseconds != 0 || parts.is_empty() {
        let sign = if interval.microseconds < 0 { "-" } else { "" };
        let micros = interval.microseconds.unsigned_abs();
        let seconds = micros / 1_000_000;
        let mut time = format!(
            "{sign}{:02}:{:02}:{:02}",
            seconds / 3600,
            seconds / 60 % 60,
            seconds % 60
        );
        let fraction = micros % 1_000_000;
        if fraction != 0 {
            let digits = format!("{fraction:06}");
            time.push('.');
            time.push_str(digits.trim_end_matches('0'));
        }
        parts.push(time);
    }
    parts.join(" ")
}
