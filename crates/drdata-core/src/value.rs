use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

/// A single cell headed for the database.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<FixedOffset>),
    Binary(Vec<u8>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text literal accepted by the database input functions; `None` for NULL.
    pub fn to_sql_text(&self) -> Option<String> {
        match self {
            Value::Null => None,
            Value::Integer(value) => Some(value.to_string()),
            Value::Float(value) => Some(value.to_string()),
            Value::Text(value) => Some(value.clone()),
            Value::Boolean(value) => Some(value.to_string()),
            Value::Date(value) => Some(value.format("%Y-%m-%d").to_string()),
            Value::Time(value) => Some(value.format("%H:%M:%S%.f").to_string()),
            Value::Timestamp(value) => Some(value.format("%Y-%m-%d %H:%M:%S%.f").to_string()),
            Value::TimestampTz(value) => Some(value.to_rfc3339()),
            Value::Binary(bytes) => Some(format!("\\x{}", hex::encode(bytes))),
        }
    }

    /// Stable key for equality tracking (uniqueness sets, key pools).
    pub fn key(&self) -> String {
        self.to_sql_text().unwrap_or_else(|| "<null>".to_string())
    }
}

/// Rows for one table, aligned with `columns`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowBatch {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl RowBatch {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Values of `column` across all rows.
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a Value>> {
        let index = self.column_index(name)?;
        Some(self.rows.iter().filter_map(move |row| row.get(index)))
    }
}
