use std::io;

use thiserror::Error;

/// Everything that can go wrong between raw bytes and typed records.
///
/// `Structural` and `Format` are scoped to a single record or field and are
/// recoverable under best-effort parsing; `Io` and `Config` always abort.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The tokenized record does not have one field per schema column.
    #[error(
        "table [{table}] record [{record}]: schema defines [{expected}] columns \
         but the record has [{actual}] fields"
    )]
    Structural {
        table: String,
        record: u64,
        expected: usize,
        actual: usize,
    },

    /// A raw field value could not be converted into its target type.
    #[error(
        "table [{table}] record [{record}] column [{column}]: \
         can't deserialize [{value}]: {reason}"
    )]
    Format {
        table: String,
        record: u64,
        column: String,
        value: String,
        reason: String,
    },

    /// No conversion rule exists for the requested target type.
    #[error("unmapped type [{type_name}] for column [{column}]")]
    UnsupportedType { column: String, type_name: String },

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: io::Error,
    },

    /// The schema itself is unusable (empty delimiter, conflicting delimiter
    /// set, unknown charset, duplicate column).
    #[error("invalid table schema: {0}")]
    Config(String),
}

impl ParseError {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        ParseError::Io {
            context: context.into(),
            source,
        }
    }

    /// True for errors that best-effort parsing may skip past.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, ParseError::Structural { .. } | ParseError::Format { .. })
    }
}
