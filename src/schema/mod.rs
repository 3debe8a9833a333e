pub mod charset;
pub mod types;

pub use charset::resolve_charset;
pub use types::{ColumnSchema, DataType, Range, TableSchema, TableSchemaBuilder};
