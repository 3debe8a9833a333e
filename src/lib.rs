//! Parser for GDPdU/GoBD tax-audit data exports.
//!
//! A [`schema::TableSchema`] describes one exported file: delimiters, locale
//! symbols, charset and column layout, as declared by the accompanying index
//! description. [`parse::parse_records`] streams the file's raw records
//! through the tokenizer; [`parse::parse_typed`] additionally converts each
//! field into a typed value and hands it to a caller-supplied
//! [`deserialize::RowBinding`].
//!
//! ```no_run
//! use gdpdu_data::deserialize::RowBinding;
//! use gdpdu_data::parse::{parse_typed, ErrorPolicy};
//! use gdpdu_data::schema::{ColumnSchema, DataType, TableSchema};
//!
//! #[derive(Default)]
//! struct Konto {
//!     nummer: Option<i32>,
//!     bezeichnung: Option<String>,
//! }
//!
//! # fn main() -> Result<(), gdpdu_data::ParseError> {
//! let schema = TableSchema::builder("Sachkonten")
//!     .column(ColumnSchema::new("Kontonummer", DataType::Numeric))
//!     .column(ColumnSchema::new("Bezeichnung", DataType::AlphaNumeric))
//!     .build()?;
//!
//! let binding = RowBinding::builder()
//!     .integer("Kontonummer", |k: &mut Konto, v| k.nummer = Some(v))
//!     .string("Bezeichnung", |k: &mut Konto, v| k.bezeichnung = Some(v))
//!     .build();
//!
//! let file = std::fs::File::open("sachkonten.csv")
//!     .map_err(|e| gdpdu_data::ParseError::io("opening table file", e))?;
//! let outcome = parse_typed(&schema, file, &binding, ErrorPolicy::BestEffort)?;
//! # Ok(())
//! # }
//! ```

pub mod deserialize;
pub mod error;
pub mod parse;
pub mod schema;
pub mod tokenize;

pub use deserialize::{DeserializationContext, FieldBinder, RowBinding, SemanticType, Value};
pub use error::ParseError;
pub use parse::{parse_records, parse_typed, ErrorPolicy, ParseOutcome, RecordReader, TypedReader};
pub use schema::{ColumnSchema, DataType, Range, TableSchema};
pub use tokenize::{Lexer, RawRecord};
