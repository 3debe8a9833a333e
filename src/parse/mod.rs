pub mod decode;

use std::io::Read;
use std::marker::PhantomData;

use tracing::{debug, trace, warn};

use crate::deserialize::{deserialize_field, DeserializationContext, FieldBinder};
use crate::error::ParseError;
use crate::schema::{resolve_charset, Range, TableSchema};
use crate::tokenize::{Lexer, RawRecord};

pub use decode::DecodingReader;

/// How record-scoped errors propagate during an eager parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Collect structural and format errors, keep going. IO and schema
    /// errors still abort.
    BestEffort,
    /// Abort on the first error of any kind.
    Strict,
}

/// Lazy, forward-only stream of raw records for one table file.
///
/// Owns the input, skips the declared preamble, decodes the declared
/// charset, tokenizes, applies the 1-based row window and validates the
/// field count of every selected record. Memory stays bounded by one
/// in-flight record regardless of file size, and dropping the reader early
/// costs nothing.
///
/// Structural errors come through as `Err` items so callers choose between
/// best-effort and strict handling; an IO error ends the stream.
pub struct RecordReader<R: Read> {
    table: String,
    decoder: DecodingReader<R>,
    lexer: Lexer,
    expected_columns: usize,
    range: Range,
    /// 1-based index of the record most recently produced by the tokenizer.
    index: u64,
    yielded: u64,
    input_done: bool,
    done: bool,
}

impl<R: Read> RecordReader<R> {
    pub fn new(schema: &TableSchema, input: R) -> Result<Self, ParseError> {
        let encoding = resolve_charset(&schema.charset)?;
        let decoder = DecodingReader::new(input, encoding, schema.skip_bytes)?;
        let lexer = Lexer::new(
            &schema.record_delimiter,
            &schema.column_delimiter,
            &schema.text_encapsulator,
        );
        debug!(table = %schema.name, charset = %schema.charset, "starting parse");

        Ok(Self {
            table: schema.name.clone(),
            decoder,
            lexer,
            expected_columns: schema.column_count(),
            range: schema.range,
            index: 0,
            yielded: 0,
            input_done: false,
            done: false,
        })
    }

    /// 1-based index (over all tokenized records, before windowing) of the
    /// record returned by the last `next()` call.
    pub fn record_index(&self) -> u64 {
        self.index
    }

    fn window(&mut self, record: RawRecord) -> Option<Result<RawRecord, ParseError>> {
        self.index += 1;

        if self.index < self.range.from {
            trace!(index = self.index, "record below range, skipping");
            return None;
        }
        if self.index > self.range.to {
            debug!(index = self.index, "record beyond range, stopping");
            self.done = true;
            return None;
        }
        if self.yielded >= self.range.length {
            debug!(yielded = self.yielded, "range length reached, stopping");
            self.done = true;
            return None;
        }
        self.yielded += 1;

        if record.len() != self.expected_columns {
            warn!(
                table = %self.table,
                index = self.index,
                expected = self.expected_columns,
                actual = record.len(),
                "field count mismatch"
            );
            return Some(Err(ParseError::Structural {
                table: self.table.clone(),
                record: self.index,
                expected: self.expected_columns,
                actual: record.len(),
            }));
        }

        Some(Ok(record))
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<RawRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut chunk = String::new();
        while !self.done {
            while let Some(record) = self.lexer.next_record() {
                if let Some(item) = self.window(record) {
                    return Some(item);
                }
                if self.done {
                    return None;
                }
            }

            if self.input_done {
                self.done = true;
                return None;
            }

            chunk.clear();
            match self.decoder.read_chunk(&mut chunk) {
                Ok(true) => self.lexer.push_str(&chunk),
                Ok(false) => {
                    // The final chunk can still carry a flushed replacement
                    // character for a truncated multi-byte sequence.
                    self.lexer.push_str(&chunk);
                    self.lexer.finish();
                    self.input_done = true;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        None
    }
}

/// Lazy stream of typed records: [`RecordReader`] plus per-field
/// deserialization through a [`FieldBinder`].
pub struct TypedReader<'a, R: Read, T, B> {
    records: RecordReader<R>,
    schema: &'a TableSchema,
    binder: &'a B,
    context: DeserializationContext,
    _marker: PhantomData<T>,
}

impl<'a, R, T, B> TypedReader<'a, R, T, B>
where
    R: Read,
    T: Default,
    B: FieldBinder<T>,
{
    pub fn new(schema: &'a TableSchema, input: R, binder: &'a B) -> Result<Self, ParseError> {
        Ok(Self {
            records: RecordReader::new(schema, input)?,
            schema,
            binder,
            context: DeserializationContext::from_schema(schema),
            _marker: PhantomData,
        })
    }

    fn bind_record(&self, raw: RawRecord) -> Result<T, ParseError> {
        let mut target = T::default();

        // Field order is schema order, never a header row.
        for (column, value) in self.schema.ordered_columns().zip(raw) {
            let Some((ty, sink)) = self.binder.bind(&column.name) else {
                trace!(column = %column.name, "column unbound, skipping");
                continue;
            };

            match deserialize_field(&value, ty, column.data_type, &self.context) {
                Ok(Some(typed)) => sink(&mut target, typed),
                Ok(None) => {}
                Err(e) => {
                    return Err(ParseError::Format {
                        table: self.schema.name.clone(),
                        record: self.records.record_index(),
                        column: column.name.clone(),
                        value: e.value,
                        reason: e.reason,
                    });
                }
            }
        }

        Ok(target)
    }
}

impl<R, T, B> Iterator for TypedReader<'_, R, T, B>
where
    R: Read,
    T: Default,
    B: FieldBinder<T>,
{
    type Item = Result<T, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.records.next()? {
            Ok(raw) => Some(self.bind_record(raw)),
            Err(e) => Some(Err(e)),
        }
    }
}

/// Result of an eager best-effort parse: the records that converted cleanly
/// plus every record-scoped error encountered along the way.
#[derive(Debug)]
pub struct ParseOutcome<T> {
    pub records: Vec<T>,
    pub errors: Vec<ParseError>,
}

/// Streams raw records for one table. Equivalent to [`RecordReader::new`].
pub fn parse_records<R: Read>(
    schema: &TableSchema,
    input: R,
) -> Result<RecordReader<R>, ParseError> {
    RecordReader::new(schema, input)
}

/// Parses one table file into typed records.
///
/// Under [`ErrorPolicy::BestEffort`], structural and format errors are
/// collected into the outcome and parsing continues with the next record;
/// under [`ErrorPolicy::Strict`] the first error aborts. IO and schema
/// errors abort either way.
pub fn parse_typed<R, T, B>(
    schema: &TableSchema,
    input: R,
    binder: &B,
    policy: ErrorPolicy,
) -> Result<ParseOutcome<T>, ParseError>
where
    R: Read,
    T: Default,
    B: FieldBinder<T>,
{
    let mut reader = TypedReader::new(schema, input, binder)?;
    let mut outcome = ParseOutcome {
        records: Vec::new(),
        errors: Vec::new(),
    };

    for item in &mut reader {
        match item {
            Ok(record) => outcome.records.push(record),
            Err(e) if policy == ErrorPolicy::BestEffort && e.is_recoverable() => {
                warn!(error = %e, "skipping record");
                outcome.errors.push(e);
            }
            Err(e) => return Err(e),
        }
    }

    debug!(
        records = outcome.records.len(),
        errors = outcome.errors.len(),
        "parse finished"
    );
    Ok(outcome)
}
