//! Value synthesis per semantic type.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use rand::seq::IndexedRandom;
use rand_chacha::ChaCha8Rng;

use drdata_core::{Column, IntegerWidth, SemanticType, TemporalKind, TextKind, Value};

use crate::errors::GenerationError;

mod text;

/// Upper bound for integers and numerics without tighter limits.
const DEFAULT_NUMERIC_MAX: i64 = 1_000_000;
/// Dates are drawn from the year starting here.
const BASE_DATE: (i32, u32, u32) = (2024, 1, 1);

/// Produce a non-null value for `column` in its semantic domain.
pub fn generate_value(
    table: &str,
    column: &Column,
    rng: &mut ChaCha8Rng,
) -> Result<Value, GenerationError> {
    let value = match &column.semantic_type {
        SemanticType::Integer { width } => Value::Integer(integer(*width, rng)),
        SemanticType::Float => Value::Float(float(column, rng)),
        SemanticType::Boolean => Value::Boolean(rng.random_bool(0.5)),
        SemanticType::DateTime { temporal } => temporal_value(*temporal, rng),
        SemanticType::Binary => {
            let mut bytes = vec![0_u8; rng.random_range(8..=32)];
            rng.fill(bytes.as_mut_slice());
            Value::Binary(bytes)
        }
        SemanticType::Text { text } => match text {
            TextKind::Plain => Value::Text(plain_text(column, rng)),
            TextKind::Uuid => Value::Text(random_uuid(rng)),
            TextKind::Json => Value::Text(
                serde_json::json!({
                    "id": rng.random_range(1..=DEFAULT_NUMERIC_MAX),
                    "label": text::word(rng),
                })
                .to_string(),
            ),
            TextKind::Enum { labels } => {
                let label = labels.choose(rng).ok_or_else(|| unsupported(
                    table,
                    column,
                    "enum type has no labels",
                ))?;
                Value::Text(label.clone())
            }
            TextKind::Other => {
                return Err(unsupported(
                    table,
                    column,
                    &format!("no generator for type '{}'", column.declared_type),
                ));
            }
        },
    };
    Ok(value)
}

pub(crate) fn unsupported(table: &str, column: &Column, reason: &str) -> GenerationError {
    GenerationError::UnsupportedColumn {
        table: table.to_string(),
        column: column.name.clone(),
        reason: reason.to_string(),
    }
}

fn integer(width: IntegerWidth, rng: &mut ChaCha8Rng) -> i64 {
    let max = width.max().min(DEFAULT_NUMERIC_MAX);
    rng.random_range(1..=max)
}

/// Respects `numeric(p, s)`: at most `p - s` integral digits, `s` decimals.
fn float(column: &Column, rng: &mut ChaCha8Rng) -> f64 {
    let is_numeric = column.declared_type.starts_with("numeric");
    let scale = match column.numeric_scale {
        Some(scale) if is_numeric => scale,
        _ => 2,
    };
    let mut max = DEFAULT_NUMERIC_MAX as f64;
    if let (true, Some(precision)) = (is_numeric, column.numeric_precision) {
        max = max.min(10_f64.powi(precision - scale));
    }

    // Rounding digits only; the integral bound above uses the declared scale.
    let factor = 10_f64.powi(scale.clamp(0, 6));
    let raw: f64 = rng.random_range(0.0..max);
    (raw * factor).floor() / factor
}

fn base_date() -> NaiveDate {
    let (year, month, day) = BASE_DATE;
    NaiveDate::from_ymd_opt(year, month, day).unwrap_or_default()
}

fn temporal_value(kind: TemporalKind, rng: &mut ChaCha8Rng) -> Value {
    let date = base_date() + Duration::days(rng.random_range(0..=365));
    let seconds = rng.random_range(0..86_400);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0).unwrap_or_default();
    match kind {
        TemporalKind::Date => Value::Date(date),
        TemporalKind::Time => Value::Time(time),
        TemporalKind::Timestamp => Value::Timestamp(NaiveDateTime::new(date, time)),
        TemporalKind::TimestampTz => Value::TimestampTz(
            Utc.from_utc_datetime(&NaiveDateTime::new(date, time))
                .fixed_offset(),
        ),
    }
}

fn random_uuid(rng: &mut ChaCha8Rng) -> String {
    let mut bytes: [u8; 16] = rng.random();
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    uuid::Uuid::from_bytes(bytes).to_string()
}

fn plain_text(column: &Column, rng: &mut ChaCha8Rng) -> String {
    let max_len = column
        .max_length
        .and_then(|len| usize::try_from(len).ok())
        .filter(|len| *len > 0);

    let value = match text::by_column_name(&column.name, rng) {
        Some(value) => value,
        None if column.is_unique || column.is_primary_key => {
            let tagged = format!("{}_{}", column.name, rng.random::<u32>());
            match max_len {
                Some(len) if tagged.chars().count() > len => token(len, rng),
                _ => tagged,
            }
        }
        None => text::words(rng),
    };

    match max_len {
        Some(len) => value.chars().take(len).collect(),
        None => value,
    }
}

fn token(len: usize, rng: &mut ChaCha8Rng) -> String {
    (0..len).map(|_| char::from(rng.sample(Alphanumeric))).collect()
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    fn column(name: &str, declared: &str, semantic_type: SemanticType) -> Column {
        Column {
            ordinal_position: 1,
            name: name.to_string(),
            declared_type: declared.to_string(),
            semantic_type,
            is_nullable: false,
            default: None,
            max_length: None,
            numeric_precision: None,
            numeric_scale: None,
            is_unique: false,
            is_primary_key: false,
            is_generated: false,
        }
    }

    fn text_kind(text: TextKind) -> SemanticType {
        SemanticType::Text { text }
    }

    #[test]
    fn integers_fit_their_width() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let small = column(
            "n",
            "smallint",
            SemanticType::Integer {
                width: IntegerWidth::Small,
            },
        );
        for _ in 0..200 {
            match generate_value("t", &small, &mut rng).expect("value") {
                Value::Integer(value) => assert!((1..=i16::MAX as i64).contains(&value)),
                other => panic!("unexpected {other:?}"),
            }
        }
    }

    #[test]
    fn numerics_respect_precision_and_scale() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut price = column("price", "numeric(5,2)", SemanticType::Float);
        price.numeric_precision = Some(5);
        price.numeric_scale = Some(2);

        for _ in 0..200 {
            let Value::Float(value) = generate_value("t", &price, &mut rng).expect("value") else {
                panic!("expected float");
            };
            assert!((0.0..1000.0).contains(&value));
            assert_eq!((value * 100.0).round() / 100.0, value);
        }
    }

    #[test]
    fn wide_scale_numerics_keep_integral_digits_in_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut latitude = column("latitude", "numeric(10,8)", SemanticType::Float);
        latitude.numeric_precision = Some(10);
        latitude.numeric_scale = Some(8);
        let mut ratio = column("ratio", "numeric(8,8)", SemanticType::Float);
        ratio.numeric_precision = Some(8);
        ratio.numeric_scale = Some(8);

        for _ in 0..200 {
            let Value::Float(value) = generate_value("t", &latitude, &mut rng).expect("value")
            else {
                panic!("expected float");
            };
            assert!((0.0..100.0).contains(&value), "{value}");

            let Value::Float(value) = generate_value("t", &ratio, &mut rng).expect("value") else {
                panic!("expected float");
            };
            assert!((0.0..1.0).contains(&value), "{value}");
        }
    }

    #[test]
    fn text_respects_max_length() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let mut code = column("code", "character varying(3)", text_kind(TextKind::Plain));
        code.max_length = Some(3);
        code.is_unique = true;
        let mut bio = column("bio", "character varying(10)", text_kind(TextKind::Plain));
        bio.max_length = Some(10);

        for _ in 0..50 {
            let Value::Text(value) = generate_value("t", &code, &mut rng).expect("code") else {
                panic!("expected text");
            };
            assert_eq!(value.chars().count(), 3);
            let Value::Text(value) = generate_value("t", &bio, &mut rng).expect("bio") else {
                panic!("expected text");
            };
            assert!(value.chars().count() <= 10);
        }
    }

    #[test]
    fn uuids_enums_and_json_are_well_formed() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let id = column("id", "uuid", text_kind(TextKind::Uuid));
        let Value::Text(value) = generate_value("t", &id, &mut rng).expect("uuid") else {
            panic!("expected text");
        };
        assert!(uuid::Uuid::parse_str(&value).is_ok());

        let mood = column(
            "mood",
            "mood",
            text_kind(TextKind::Enum {
                labels: vec!["sad".to_string(), "ok".to_string()],
            }),
        );
        let Value::Text(value) = generate_value("t", &mood, &mut rng).expect("enum") else {
            panic!("expected text");
        };
        assert!(value == "sad" || value == "ok");

        let payload = column("payload", "jsonb", text_kind(TextKind::Json));
        let Value::Text(value) = generate_value("t", &payload, &mut rng).expect("json") else {
            panic!("expected text");
        };
        assert!(serde_json::from_str::<serde_json::Value>(&value).is_ok());
    }

    #[test]
    fn unknown_types_and_empty_enums_are_unsupported() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let tags = column("tags", "integer[]", text_kind(TextKind::Other));
        let err = generate_value("posts", &tags, &mut rng).unwrap_err();
        assert!(err.to_string().contains("posts.tags"));

        let empty = column(
            "state",
            "state",
            text_kind(TextKind::Enum { labels: Vec::new() }),
        );
        assert!(matches!(
            generate_value("posts", &empty, &mut rng),
            Err(GenerationError::UnsupportedColumn { .. })
        ));
    }

    #[test]
    fn email_columns_look_like_emails() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let email = column("contact_email", "text", text_kind(TextKind::Plain));
        let Value::Text(value) = generate_value("t", &email, &mut rng).expect("email") else {
            panic!("expected text");
        };
        assert!(value.contains('@'));
    }
}
