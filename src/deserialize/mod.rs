pub mod binding;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use tracing::trace;

use crate::error::ParseError;
use crate::schema::{DataType, TableSchema};

pub use binding::{FieldBinder, RowBinding, RowBindingBuilder};

/// The closed set of target types a column can be bound to. Resolved once at
/// binding time; conversion dispatches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticType {
    String,
    Integer,
    Long,
    Decimal,
    Boolean,
    Date,
    DateTime,
    /// Closed enumeration: matched case-insensitively against member names.
    Enum(Vec<String>),
}

impl SemanticType {
    /// Resolves an external type-name string, for bindings built from
    /// declarative configuration rather than code.
    pub fn from_name(type_name: &str, column: &str) -> Result<Self, ParseError> {
        match type_name {
            "String" => Ok(SemanticType::String),
            "Integer" | "int" => Ok(SemanticType::Integer),
            "Long" | "long" => Ok(SemanticType::Long),
            "Decimal" | "BigDecimal" => Ok(SemanticType::Decimal),
            "Boolean" | "boolean" => Ok(SemanticType::Boolean),
            "Date" | "LocalDate" => Ok(SemanticType::Date),
            "DateTime" | "LocalDateTime" => Ok(SemanticType::DateTime),
            _ => Err(ParseError::UnsupportedType {
                column: column.to_string(),
                type_name: type_name.to_string(),
            }),
        }
    }
}

/// A successfully converted field value. Variants mirror [`SemanticType`].
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Text(String),
    Integer(i32),
    Long(i64),
    Decimal(Decimal),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    /// Index into the enumeration's member-name set.
    Enum(usize),
}

/// Locale conventions for one table, derived once from its schema and passed
/// by reference into every field conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeserializationContext {
    pub decimal_symbol: String,
    pub digit_grouping_symbol: String,
    pub trim: bool,
}

impl DeserializationContext {
    pub fn from_schema(schema: &TableSchema) -> Self {
        Self {
            decimal_symbol: schema.decimal_symbol.clone(),
            digit_grouping_symbol: schema.digit_grouping_symbol.clone(),
            trim: schema.trim,
        }
    }
}

/// A failed field conversion, without attribution; the caller knows the
/// table, record index and column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    pub value: String,
    pub reason: String,
}

impl ConversionError {
    fn new(value: &str, reason: impl Into<String>) -> Self {
        Self {
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Converts one raw field into a typed value.
///
/// A blank value means "no value supplied" and yields `Ok(None)`, never an
/// error. An enumeration member that matches no name also yields `Ok(None)`.
/// Purely functional: no state is touched beyond the returned value.
pub fn deserialize_field(
    raw: &str,
    ty: &SemanticType,
    data_type: DataType,
    ctx: &DeserializationContext,
) -> Result<Option<Value>, ConversionError> {
    if raw.trim().is_empty() {
        trace!("skipping blank value");
        return Ok(None);
    }

    let value = if ctx.trim { raw.trim() } else { raw };

    match ty {
        SemanticType::String => Ok(Some(Value::Text(value.to_string()))),

        SemanticType::Integer => strip_grouping(value, ctx)
            .parse::<i32>()
            .map(|v| Some(Value::Integer(v)))
            .map_err(|e| ConversionError::new(value, format!("not an integer: {e}"))),

        SemanticType::Long => strip_grouping(value, ctx)
            .parse::<i64>()
            .map(|v| Some(Value::Long(v)))
            .map_err(|e| ConversionError::new(value, format!("not a long: {e}"))),

        SemanticType::Decimal => {
            let normalized = strip_grouping(value, ctx).replace(&ctx.decimal_symbol, ".");
            normalized
                .parse::<Decimal>()
                .map(|v| Some(Value::Decimal(v)))
                .map_err(|e| ConversionError::new(value, format!("not a decimal: {e}")))
        }

        // "1" is true, every other value is false. The exports never agreed
        // on a false literal, so nothing is validated here.
        SemanticType::Boolean => Ok(Some(Value::Boolean(value == "1"))),

        SemanticType::Date => value
            .parse::<NaiveDate>()
            .map(|v| Some(Value::Date(v)))
            .map_err(|e| ConversionError::new(value, format!("not an ISO-8601 date: {e}"))),

        SemanticType::DateTime => {
            if data_type != DataType::AlphaNumeric {
                return Err(ConversionError::new(
                    value,
                    format!("can't deserialize a [{data_type:?}] column into a date-time"),
                ));
            }
            value
                .parse::<NaiveDateTime>()
                .map(|v| Some(Value::DateTime(v)))
                .map_err(|e| ConversionError::new(value, format!("not an ISO-8601 date-time: {e}")))
        }

        SemanticType::Enum(names) => {
            let lowered = value.to_lowercase();
            let index = names.iter().position(|n| n.to_lowercase() == lowered);
            if index.is_none() {
                trace!(value, "no enumeration member matched, leaving unset");
            }
            Ok(index.map(Value::Enum))
        }
    }
}

fn strip_grouping(value: &str, ctx: &DeserializationContext) -> String {
    value.replace(&ctx.digit_grouping_symbol, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn german_ctx() -> DeserializationContext {
        DeserializationContext {
            decimal_symbol: ",".to_string(),
            digit_grouping_symbol: ".".to_string(),
            trim: false,
        }
    }

    fn convert(raw: &str, ty: &SemanticType) -> Result<Option<Value>, ConversionError> {
        deserialize_field(raw, ty, DataType::AlphaNumeric, &german_ctx())
    }

    #[test]
    fn blank_values_are_unset_not_errors() {
        for ty in [SemanticType::String, SemanticType::Integer, SemanticType::Date] {
            assert_eq!(convert("", &ty).unwrap(), None);
            assert_eq!(convert("   ", &ty).unwrap(), None);
        }
    }

    #[test]
    fn strings_pass_through_verbatim() {
        assert_eq!(
            convert("  Müller GmbH ", &SemanticType::String).unwrap(),
            Some(Value::Text("  Müller GmbH ".to_string()))
        );
    }

    #[test]
    fn trim_flag_trims_before_conversion() {
        let ctx = DeserializationContext {
            trim: true,
            ..german_ctx()
        };
        assert_eq!(
            deserialize_field(" abc ", &SemanticType::String, DataType::AlphaNumeric, &ctx)
                .unwrap(),
            Some(Value::Text("abc".to_string()))
        );
    }

    #[test]
    fn integers_drop_grouping_symbols() {
        assert_eq!(
            convert("1.234", &SemanticType::Integer).unwrap(),
            Some(Value::Integer(1234))
        );
        assert_eq!(
            convert("-17", &SemanticType::Integer).unwrap(),
            Some(Value::Integer(-17))
        );
        assert!(convert("abc", &SemanticType::Integer).is_err());
    }

    #[test]
    fn longs_drop_grouping_symbols() {
        assert_eq!(
            convert("9.876.543.210", &SemanticType::Long).unwrap(),
            Some(Value::Long(9_876_543_210))
        );
    }

    #[test]
    fn decimals_use_locale_symbols() {
        assert_eq!(
            convert("1.234,56", &SemanticType::Decimal).unwrap(),
            Some(Value::Decimal("1234.56".parse().unwrap()))
        );
        assert!(convert("1,2,3", &SemanticType::Decimal).is_err());
    }

    #[test]
    fn boolean_only_recognizes_one() {
        assert_eq!(
            convert("1", &SemanticType::Boolean).unwrap(),
            Some(Value::Boolean(true))
        );
        assert_eq!(
            convert("0", &SemanticType::Boolean).unwrap(),
            Some(Value::Boolean(false))
        );
        // Not validated: any non-"1" literal is false.
        assert_eq!(
            convert("ja", &SemanticType::Boolean).unwrap(),
            Some(Value::Boolean(false))
        );
    }

    #[test]
    fn dates_parse_iso_8601() {
        assert_eq!(
            convert("2024-12-31", &SemanticType::Date).unwrap(),
            Some(Value::Date(NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()))
        );
        assert!(convert("31.12.2024", &SemanticType::Date).is_err());
    }

    #[test]
    fn date_time_requires_alphanumeric_data_type() {
        let ctx = german_ctx();
        let ok = deserialize_field(
            "2024-12-31T23:59:59",
            &SemanticType::DateTime,
            DataType::AlphaNumeric,
            &ctx,
        )
        .unwrap();
        assert_eq!(
            ok,
            Some(Value::DateTime(
                NaiveDate::from_ymd_opt(2024, 12, 31)
                    .unwrap()
                    .and_hms_opt(23, 59, 59)
                    .unwrap()
            ))
        );

        let err = deserialize_field(
            "2024-12-31T23:59:59",
            &SemanticType::DateTime,
            DataType::Numeric,
            &ctx,
        );
        assert!(err.is_err());
    }

    #[test]
    fn enumerations_match_case_insensitively() {
        let ty = SemanticType::Enum(vec!["Soll".to_string(), "Haben".to_string()]);
        assert_eq!(convert("haben", &ty).unwrap(), Some(Value::Enum(1)));
        assert_eq!(convert("SOLL", &ty).unwrap(), Some(Value::Enum(0)));
        // A miss is swallowed as unset instead of an error.
        assert_eq!(convert("weder", &ty).unwrap(), None);
    }

    #[test]
    fn from_name_rejects_unknown_types() {
        assert_eq!(
            SemanticType::from_name("BigDecimal", "amount").unwrap(),
            SemanticType::Decimal
        );
        let err = SemanticType::from_name("Uuid", "amount").unwrap_err();
        assert!(matches!(err, ParseError::UnsupportedType { .. }));
    }
}
