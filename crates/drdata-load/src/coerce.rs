//! CSV field to [`Value`] coercion.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use drdata_core::{Column, SemanticType, TemporalKind, TextKind, Value};

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];
const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const TIMESTAMPTZ_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%#z", "%Y-%m-%dT%H:%M:%S%.f%#z"];

/// Coerce one raw CSV field into a value for `column`.
///
/// On failure returns a description of what the field should have looked
/// like.
pub fn coerce_field(column: &Column, raw: &str) -> Result<Value, String> {
    if raw.is_empty() {
        return empty_field(column);
    }

    let trimmed = raw.trim();
    match &column.semantic_type {
        SemanticType::Integer { width } => {
            let value: i64 = trimmed.parse().map_err(|_| column.semantic_type.label())?;
            if value < width.min() || value > width.max() {
                return Err(format!(
                    "{} between {} and {}",
                    column.semantic_type.label(),
                    width.min(),
                    width.max()
                ));
            }
            Ok(Value::Integer(value))
        }
        SemanticType::Float => {
            let value: f64 = trimmed.parse().map_err(|_| "number".to_string())?;
            if is_exact_decimal(column) {
                Ok(Value::Text(trimmed.to_string()))
            } else {
                Ok(Value::Float(value))
            }
        }
        SemanticType::Boolean => match trimmed.to_ascii_lowercase().as_str() {
            "true" | "t" | "yes" | "y" | "1" => Ok(Value::Boolean(true)),
            "false" | "f" | "no" | "n" | "0" => Ok(Value::Boolean(false)),
            _ => Err("boolean (true/false, t/f, yes/no, y/n, 1/0)".to_string()),
        },
        SemanticType::DateTime { temporal } => temporal_value(*temporal, trimmed),
        SemanticType::Binary => {
            let hex = trimmed
                .strip_prefix("\\x")
                .ok_or_else(|| "bytea in \\x hex form".to_string())?;
            hex::decode(hex)
                .map(Value::Binary)
                .map_err(|_| "bytea in \\x hex form".to_string())
        }
        SemanticType::Text { text } => text_value(column, text, raw),
    }
}

fn empty_field(column: &Column) -> Result<Value, String> {
    if column.is_nullable {
        return Ok(Value::Null);
    }
    match &column.semantic_type {
        SemanticType::Text {
            text: TextKind::Plain | TextKind::Other,
        } => Ok(Value::Text(String::new())),
        other => Err(format!("non-empty {}", other.label())),
    }
}

/// `numeric` and `money` keep their exact decimal text.
fn is_exact_decimal(column: &Column) -> bool {
    column.declared_type.starts_with("numeric") || column.declared_type == "money"
}

fn temporal_value(kind: TemporalKind, raw: &str) -> Result<Value, String> {
    match kind {
        TemporalKind::Date => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
            .map(Value::Date)
            .map_err(|_| "date (YYYY-MM-DD)".to_string()),
        TemporalKind::Time => TIME_FORMATS
            .iter()
            .find_map(|format| NaiveTime::parse_from_str(raw, format).ok())
            .map(Value::Time)
            .ok_or_else(|| "time (HH:MM:SS)".to_string()),
        TemporalKind::Timestamp => TIMESTAMP_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(Value::Timestamp)
            .ok_or_else(|| "timestamp (YYYY-MM-DD HH:MM:SS)".to_string()),
        TemporalKind::TimestampTz => DateTime::parse_from_rfc3339(raw)
            .ok()
            .or_else(|| {
                TIMESTAMPTZ_FORMATS
                    .iter()
                    .find_map(|format| DateTime::parse_from_str(raw, format).ok())
            })
            .map(Value::TimestampTz)
            .ok_or_else(|| "timestamp with offset (RFC 3339)".to_string()),
    }
}

fn text_value(column: &Column, kind: &TextKind, raw: &str) -> Result<Value, String> {
    match kind {
        TextKind::Uuid => uuid::Uuid::parse_str(raw.trim())
            .map(|_| Value::Text(raw.trim().to_string()))
            .map_err(|_| "uuid".to_string()),
        TextKind::Json => serde_json::from_str::<serde_json::Value>(raw)
            .map(|_| Value::Text(raw.to_string()))
            .map_err(|_| "json".to_string()),
        TextKind::Enum { labels } => {
            if labels.iter().any(|label| label == raw) {
                Ok(Value::Text(raw.to_string()))
            } else {
                Err(format!("one of {}", labels.join(", ")))
            }
        }
        TextKind::Plain | TextKind::Other => {
            if let Some(max) = column.max_length
                && raw.chars().count() > max.max(0) as usize
            {
                return Err(format!("text of at most {max} characters"));
            }
            Ok(Value::Text(raw.to_string()))
        }
    }
}
