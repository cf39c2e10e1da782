use serde::{Deserialize, Serialize};

/// Closed set of value domains a column can hold.
///
/// Generation and CSV coercion match on this exhaustively, so every declared
/// database type is folded into one of these variants at introspection time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SemanticType {
    Integer { width: IntegerWidth },
    Float,
    Text { text: TextKind },
    Boolean,
    DateTime { temporal: TemporalKind },
    Binary,
}

impl SemanticType {
    /// Short human-readable label used in error messages.
    pub fn label(&self) -> String {
        match self {
            SemanticType::Integer { width } => match width {
                IntegerWidth::Small => "smallint".to_string(),
                IntegerWidth::Regular => "integer".to_string(),
                IntegerWidth::Big => "bigint".to_string(),
            },
            SemanticType::Float => "float".to_string(),
            SemanticType::Text { text } => match text {
                TextKind::Plain | TextKind::Other => "text".to_string(),
                TextKind::Uuid => "uuid".to_string(),
                TextKind::Json => "json".to_string(),
                TextKind::Enum { labels } => format!("enum({})", labels.join("|")),
            },
            SemanticType::Boolean => "boolean".to_string(),
            SemanticType::DateTime { temporal } => match temporal {
                TemporalKind::Date => "date".to_string(),
                TemporalKind::Time => "time".to_string(),
                TemporalKind::Timestamp => "timestamp".to_string(),
                TemporalKind::TimestampTz => "timestamptz".to_string(),
            },
            SemanticType::Binary => "binary".to_string(),
        }
    }
}

/// Storage width of an integer column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IntegerWidth {
    Small,
    Regular,
    Big,
}

impl IntegerWidth {
    pub fn min(self) -> i64 {
        match self {
            IntegerWidth::Small => i16::MIN as i64,
            IntegerWidth::Regular => i32::MIN as i64,
            IntegerWidth::Big => i64::MIN,
        }
    }

    pub fn max(self) -> i64 {
        match self {
            IntegerWidth::Small => i16::MAX as i64,
            IntegerWidth::Regular => i32::MAX as i64,
            IntegerWidth::Big => i64::MAX,
        }
    }
}

/// Shape of a textual column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum TextKind {
    Plain,
    Uuid,
    Json,
    Enum { labels: Vec<String> },
    /// Types carried as text without a known literal format (arrays, ranges, inet, ...).
    Other,
}

/// Flavour of a date/time column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TemporalKind {
    Date,
    Time,
    Timestamp,
    TimestampTz,
}
