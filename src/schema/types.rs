use serde::{Deserialize, Serialize};

use crate::error::ParseError;
use crate::schema::charset::resolve_charset;

/// The three data types an index description can declare for a column.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
pub enum DataType {
    AlphaNumeric,
    Numeric,
    Date,
}

/// A single column definition as declared by the index description.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct ColumnSchema {
    pub name: String,
    pub data_type: DataType,
    /// Digits after the decimal point, for Numeric columns.
    pub accuracy: Option<u32>,
    /// Declared date format, e.g. "DD.MM.YYYY". Carried through but not yet
    /// applied during deserialization; dates are parsed as ISO-8601.
    pub format: Option<String>,
    pub max_length: Option<u64>,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            accuracy: None,
            format: None,
            max_length: None,
        }
    }
}

/// 1-based row window restricting which records are materialized.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub struct Range {
    pub from: u64,
    pub to: u64,
    pub length: u64,
}

impl Default for Range {
    fn default() -> Self {
        Self {
            from: 1,
            to: u64::MAX,
            length: u64::MAX,
        }
    }
}

/// Immutable description of one table's file layout: delimiters, locale
/// symbols, column order and row range. Built once per parse invocation via
/// [`TableSchema::builder`].
///
/// The canonical field order of every record is primary-key columns followed
/// by regular columns, in declaration order. It is never inferred from a
/// header row.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TableSchema {
    pub name: String,
    pub column_delimiter: String,
    pub record_delimiter: String,
    pub text_encapsulator: String,
    pub decimal_symbol: String,
    pub digit_grouping_symbol: String,
    pub skip_bytes: u64,
    pub charset: String,
    pub trim: bool,
    pub range: Range,
    pub primary_key_columns: Vec<ColumnSchema>,
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    pub fn builder(name: impl Into<String>) -> TableSchemaBuilder {
        TableSchemaBuilder::new(name)
    }

    /// Primary-key columns followed by regular columns. Index `i` of a raw
    /// record corresponds to index `i` of this iterator.
    pub fn ordered_columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.primary_key_columns.iter().chain(self.columns.iter())
    }

    pub fn column_count(&self) -> usize {
        self.primary_key_columns.len() + self.columns.len()
    }
}

/// Builder mirroring the defaults of the GDPdU index description: `;` column
/// delimiter, CRLF record delimiter, `"` text encapsulator, German locale
/// symbols, ANSI code page.
#[derive(Debug, Clone)]
pub struct TableSchemaBuilder {
    schema: TableSchema,
}

impl TableSchemaBuilder {
    fn new(name: impl Into<String>) -> Self {
        Self {
            schema: TableSchema {
                name: name.into(),
                column_delimiter: ";".to_string(),
                record_delimiter: "\r\n".to_string(),
                text_encapsulator: "\"".to_string(),
                decimal_symbol: ",".to_string(),
                digit_grouping_symbol: ".".to_string(),
                skip_bytes: 0,
                charset: "ansi".to_string(),
                trim: false,
                range: Range::default(),
                primary_key_columns: Vec::new(),
                columns: Vec::new(),
            },
        }
    }

    pub fn column_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.schema.column_delimiter = delimiter.into();
        self
    }

    pub fn record_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.schema.record_delimiter = delimiter.into();
        self
    }

    pub fn text_encapsulator(mut self, encapsulator: impl Into<String>) -> Self {
        self.schema.text_encapsulator = encapsulator.into();
        self
    }

    pub fn decimal_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.schema.decimal_symbol = symbol.into();
        self
    }

    pub fn digit_grouping_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.schema.digit_grouping_symbol = symbol.into();
        self
    }

    pub fn skip_bytes(mut self, bytes: u64) -> Self {
        self.schema.skip_bytes = bytes;
        self
    }

    pub fn charset(mut self, label: impl Into<String>) -> Self {
        self.schema.charset = label.into();
        self
    }

    pub fn trim(mut self, trim: bool) -> Self {
        self.schema.trim = trim;
        self
    }

    pub fn range(mut self, range: Range) -> Self {
        self.schema.range = range;
        self
    }

    pub fn primary_key(mut self, column: ColumnSchema) -> Self {
        self.schema.primary_key_columns.push(column);
        self
    }

    pub fn column(mut self, column: ColumnSchema) -> Self {
        self.schema.columns.push(column);
        self
    }

    /// Validates the schema and freezes it.
    pub fn build(self) -> Result<TableSchema, ParseError> {
        let schema = self.schema;

        let delimiters = [
            ("column delimiter", &schema.column_delimiter),
            ("record delimiter", &schema.record_delimiter),
            ("text encapsulator", &schema.text_encapsulator),
        ];
        for (what, value) in &delimiters {
            if value.is_empty() {
                return Err(ParseError::Config(format!("{what} must not be empty")));
            }
        }
        // A delimiter that equals or prefixes another can never both win in
        // the matcher, so the schema is ambiguous.
        for (i, (what_a, a)) in delimiters.iter().enumerate() {
            for (what_b, b) in delimiters.iter().skip(i + 1) {
                if a.starts_with(b.as_str()) || b.starts_with(a.as_str()) {
                    return Err(ParseError::Config(format!(
                        "{what_a} [{a:?}] and {what_b} [{b:?}] conflict"
                    )));
                }
            }
        }

        resolve_charset(&schema.charset)?;

        let mut seen = std::collections::HashSet::new();
        for column in schema.ordered_columns() {
            if !seen.insert(column.name.as_str()) {
                return Err(ParseError::Config(format!(
                    "duplicate column name [{}]",
                    column.name
                )));
            }
        }

        Ok(schema)
    }
}
