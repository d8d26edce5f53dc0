use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};

use crate::error::DataSourceError;
use crate::results::RowSet;
use crate::types::Value;

use super::session::RawRows;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Server column types with a dedicated decoding rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Timestamp,
    TimestampTz,
    Bool,
    /// Any other type; values stay text.
    Other(String),
}

impl ColumnType {
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "int2" => Self::Int2,
            "int4" => Self::Int4,
            "int8" => Self::Int8,
            "float4" => Self::Float4,
            "float8" => Self::Float8,
            "numeric" => Self::Numeric,
            "timestamp" => Self::Timestamp,
            "timestamptz" => Self::TimestampTz,
            "bool" => Self::Bool,
            other => Self::Other(other.to_string()),
        }
    }

    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Int2 => "int2",
            Self::Int4 => "int4",
            Self::Int8 => "int8",
            Self::Float4 => "float4",
            Self::Float8 => "float8",
            Self::Numeric => "numeric",
            Self::Timestamp => "timestamp",
            Self::TimestampTz => "timestamptz",
            Self::Bool => "bool",
            Self::Other(tag) => tag,
        }
    }
}

/// Decode one cell from its server text form.
///
/// # Errors
/// Returns `DataSourceError::Data` when the text is not valid for the column type.
pub fn decode_value(raw: Option<&str>, column_type: &ColumnType) -> Result<Value, DataSourceError> {
    let Some(raw) = raw else {
        return Ok(Value::Null);
    };
    let value = match column_type {
        ColumnType::Int2 | ColumnType::Int4 | ColumnType::Int8 => raw
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|e| bad_value(raw, column_type, e))?,
        ColumnType::Float4 | ColumnType::Float8 | ColumnType::Numeric => raw
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|e| bad_value(raw, column_type, e))?,
        ColumnType::Timestamp => parse_timestamp(raw)
            .map(Value::Timestamp)
            .map_err(|e| bad_value(raw, column_type, e))?,
        ColumnType::TimestampTz => parse_timestamptz(raw)
            .map(Value::TimestampTz)
            .map_err(|e| bad_value(raw, column_type, e))?,
        ColumnType::Bool => Value::Bool(raw == "t"),
        ColumnType::Other(_) => Value::Text(raw.to_string()),
    };
    Ok(value)
}

/// `infinity` and `-infinity` map to the latest and earliest representable timestamps.
fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    match raw {
        "infinity" => Ok(NaiveDateTime::MAX),
        "-infinity" => Ok(NaiveDateTime::MIN),
        _ => NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| e.to_string()),
    }
}

/// Server output is `2024-01-02 03:04:05.678+01`. Historical zones may print seconds in the
/// offset (`+05:53:28`). RFC 3339 is accepted as well.
fn parse_timestamptz(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    match raw {
        "infinity" => return Ok(NaiveDateTime::MAX.and_utc().fixed_offset()),
        "-infinity" => return Ok(NaiveDateTime::MIN.and_utc().fixed_offset()),
        _ => {}
    }
    DateTime::parse_from_str(raw, TIMESTAMPTZ_FORMAT)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .or_else(|e| parse_offset_with_seconds(raw).ok_or_else(|| e.to_string()))
}

fn parse_offset_with_seconds(raw: &str) -> Option<DateTime<FixedOffset>> {
    // the date part has `-` separators, so the offset sign is the last `+`/`-` after it
    let split = raw.rfind(['+', '-']).filter(|&at| at > 10)?;
    let (local, offset) = raw.split_at(split);
    let sign = if offset.starts_with('-') { -1 } else { 1 };
    let mut parts = offset[1..].split(':').map(str::parse::<i32>);
    let hours = parts.next()?.ok()?;
    let minutes = parts.next().transpose().ok()?.unwrap_or(0);
    let seconds = parts.next().transpose().ok()?.unwrap_or(0);
    if parts.next().is_some() {
        return None;
    }
    let offset = FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))?;
    let local = NaiveDateTime::parse_from_str(local, TIMESTAMP_FORMAT).ok()?;
    offset.from_local_datetime(&local).single()
}

fn bad_value(raw: &str, column_type: &ColumnType, err: impl std::fmt::Display) -> DataSourceError {
    DataSourceError::Data(format!(
        "cannot decode {raw:?} as {}: {err}",
        column_type.tag()
    ))
}

/// Decode a raw result into a [`RowSet`], keeping server row order.
///
/// # Errors
/// Returns `DataSourceError::Data` for a row whose width does not match the columns or for a
/// cell that does not parse.
pub fn decode_rows(raw: RawRows) -> Result<RowSet, DataSourceError> {
    let types: Vec<ColumnType> = raw
        .columns
        .iter()
        .map(|col| ColumnType::from_tag(&col.type_name))
        .collect();
    let (names, tags): (Vec<String>, Vec<String>) = raw
        .columns
        .into_iter()
        .map(|col| (col.name, col.type_name))
        .unzip();

    let mut row_set = RowSet::with_capacity(names, tags, raw.rows.len());
    for cells in raw.rows {
        if cells.len() != types.len() {
            return Err(DataSourceError::Data(format!(
                "row has {} values for {} columns",
                cells.len(),
                types.len()
            )));
        }
        let values = cells
            .iter()
            .zip(&types)
            .map(|(cell, column_type)| decode_value(cell.as_deref(), column_type))
            .collect::<Result<Vec<_>, _>>()?;
        row_set.add_row_values(values);
    }
    Ok(row_set)
}
