use std::collections::VecDeque;

use tracing::trace;

use crate::tokenize::trie::{DelimiterTrie, Token};
use crate::tokenize::RawRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Start of a column; encapsulation still unknown. Characters accumulate
    /// in the buffer while the combined trie looks for any delimiter.
    Undetermined,
    /// Committed to an unencapsulated column; only column and record
    /// delimiters can end it.
    Plain,
    /// Inside an encapsulated column; only the text encapsulator matters.
    Quoted,
}

/// Streaming tokenizer splitting a character stream into fields and records
/// using possibly multi-character, overlapping delimiters.
///
/// Characters are pushed in chunks; completed records are pulled off with
/// [`Lexer::next_record`]. The lexer never rejects input: every stream
/// resolves into fields, and field-count validation happens downstream.
///
/// Not thread-safe and single-use: one instance per parse.
#[derive(Debug)]
pub struct Lexer {
    state: State,
    /// Pending text of the current field. In the undetermined state this also
    /// holds characters that later turn out to be a delimiter; matches are
    /// stripped off the tail retroactively, so no character is ever lost.
    buf: String,
    /// Characters consumed since the current field started.
    chars_in_field: usize,
    /// Once this many characters pass without a delimiter match, the column
    /// cannot start with an encapsulator anymore.
    commit_len: usize,
    record_len: usize,
    column_len: usize,
    encapsulator_len: usize,
    combined: DelimiterTrie,
    plain: DelimiterTrie,
    quoted: DelimiterTrie,
    current: RawRecord,
    ready: VecDeque<RawRecord>,
}

impl Lexer {
    /// All three delimiter strings must be non-empty and free of mutual
    /// prefix conflicts; [`TableSchema::build`](crate::schema::TableSchema)
    /// guarantees both.
    pub fn new(record_delimiter: &str, column_delimiter: &str, text_encapsulator: &str) -> Self {
        let record_len = record_delimiter.chars().count();
        let column_len = column_delimiter.chars().count();
        let encapsulator_len = text_encapsulator.chars().count();

        Self {
            state: State::Undetermined,
            buf: String::new(),
            chars_in_field: 0,
            commit_len: record_len.max(column_len).max(encapsulator_len),
            record_len,
            column_len,
            encapsulator_len,
            combined: DelimiterTrie::new(&[
                (record_delimiter, Token::RecordDelimiter),
                (column_delimiter, Token::ColumnDelimiter),
                (text_encapsulator, Token::TextEncapsulator),
            ]),
            plain: DelimiterTrie::new(&[
                (record_delimiter, Token::RecordDelimiter),
                (column_delimiter, Token::ColumnDelimiter),
            ]),
            quoted: DelimiterTrie::new(&[(text_encapsulator, Token::TextEncapsulator)]),
            current: Vec::new(),
            ready: VecDeque::new(),
        }
    }

    pub fn push_str(&mut self, chunk: &str) {
        for c in chunk.chars() {
            self.push_char(c);
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.chars_in_field += 1;

        match self.state {
            State::Undetermined => {
                // Might still become literal text, a delimiter, or the
                // opening encapsulator; keep it either way.
                self.buf.push(c);

                match self.combined.advance(c) {
                    None => {}
                    Some(Token::RecordDelimiter) => {
                        trace!("record delimiter (undetermined)");
                        truncate_chars(&mut self.buf, self.record_len);
                        self.end_record();
                    }
                    Some(Token::ColumnDelimiter) => {
                        trace!("column delimiter (undetermined)");
                        truncate_chars(&mut self.buf, self.column_len);
                        self.end_column();
                    }
                    Some(Token::TextEncapsulator) => {
                        trace!("text encapsulator (undetermined)");
                        // The buffer only holds prefix characters of the
                        // encapsulator at this point; drop them.
                        self.buf.clear();
                        self.reset_tries();
                        self.state = State::Quoted;
                    }
                }

                // Enough characters to rule out every delimiter opening this
                // column, so it must be plain text.
                if self.state == State::Undetermined && self.chars_in_field >= self.commit_len {
                    trace!("committing to unencapsulated column");
                    self.state = State::Plain;
                }
            }

            State::Plain => match self.plain.advance(c) {
                None => self.buf.push(c),
                Some(Token::RecordDelimiter) => {
                    trace!("record delimiter (plain)");
                    // The final delimiter character was never appended.
                    truncate_chars(&mut self.buf, self.record_len - 1);
                    self.end_record();
                    self.state = State::Undetermined;
                }
                Some(Token::ColumnDelimiter) => {
                    trace!("column delimiter (plain)");
                    truncate_chars(&mut self.buf, self.column_len - 1);
                    self.end_column();
                    self.state = State::Undetermined;
                }
                Some(Token::TextEncapsulator) => unreachable!("not in the plain trie"),
            },

            State::Quoted => match self.quoted.advance(c) {
                None => self.buf.push(c),
                Some(Token::TextEncapsulator) => {
                    trace!("text encapsulator (quoted)");
                    truncate_chars(&mut self.buf, self.encapsulator_len - 1);
                    self.reset_tries();
                    // The field is emitted by the delimiter that follows;
                    // nothing enforces that one follows immediately.
                    self.chars_in_field = 0;
                    self.state = State::Undetermined;
                }
                Some(_) => unreachable!("only the encapsulator is in the quoted trie"),
            },
        }
    }

    /// Pulls the next completed record, if any.
    pub fn next_record(&mut self) -> Option<RawRecord> {
        self.ready.pop_front()
    }

    /// Signals end of stream. A pending field is flushed as the final field
    /// of the final record; a record left open by a trailing record delimiter
    /// is emitted only if it already holds at least one field, so a stream
    /// ending exactly on a record delimiter produces no trailing empty
    /// record.
    pub fn finish(&mut self) {
        trace!("end of stream");
        if !self.buf.is_empty() {
            self.end_record();
        } else if !self.current.is_empty() {
            let record = std::mem::take(&mut self.current);
            self.ready.push_back(record);
        }
    }

    fn end_column(&mut self) {
        let field = std::mem::take(&mut self.buf);
        trace!(field = %field, "field complete");
        self.current.push(field);
        self.chars_in_field = 0;
        self.reset_tries();
    }

    fn end_record(&mut self) {
        self.end_column();
        let record = std::mem::take(&mut self.current);
        self.ready.push_back(record);
    }

    fn reset_tries(&mut self) {
        self.combined.reset();
        self.plain.reset();
        self.quoted.reset();
    }
}

fn truncate_chars(buf: &mut String, n: usize) {
    for _ in 0..n {
        buf.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_with(rd: &str, cd: &str, te: &str, input: &str) -> Vec<Vec<String>> {
        let mut lexer = Lexer::new(rd, cd, te);
        lexer.push_str(input);
        lexer.finish();
        let mut records = Vec::new();
        while let Some(record) = lexer.next_record() {
            records.push(record);
        }
        records
    }

    fn tokenize(input: &str) -> Vec<Vec<String>> {
        tokenize_with("\n", ";", "\"", input)
    }

    #[test]
    fn splits_fields_and_records() {
        assert_eq!(tokenize("a;b;c\n"), vec![vec!["a", "b", "c"]]);
    }

    #[test]
    fn multiple_records() {
        assert_eq!(
            tokenize("a;b\nc;d\n"),
            vec![vec!["a", "b"], vec!["c", "d"]]
        );
    }

    #[test]
    fn quoted_field_keeps_embedded_column_delimiter() {
        assert_eq!(tokenize("\"a;b\";c\n"), vec![vec!["a;b", "c"]]);
    }

    #[test]
    fn quoted_field_keeps_embedded_record_delimiter() {
        assert_eq!(tokenize("\"a\nb\";c\n"), vec![vec!["a\nb", "c"]]);
    }

    #[test]
    fn trailing_field_without_record_delimiter_is_flushed() {
        assert_eq!(tokenize("a;b\nc;d"), vec![vec!["a", "b"], vec!["c", "d"]]);
    }

    #[test]
    fn stream_ending_on_record_delimiter_adds_no_empty_record() {
        assert_eq!(tokenize("a;b\n"), vec![vec!["a", "b"]]);
    }

    #[test]
    fn stream_ending_on_column_delimiter_keeps_open_record() {
        // The trailing empty field is lost: only the fields closed before EOF
        // survive.
        assert_eq!(tokenize("a;"), vec![vec!["a"]]);
    }

    #[test]
    fn empty_input_yields_no_records() {
        assert_eq!(tokenize(""), Vec::<Vec<String>>::new());
    }

    #[test]
    fn empty_fields_are_preserved() {
        assert_eq!(tokenize("a;;b\n"), vec![vec!["a", "", "b"]]);
    }

    #[test]
    fn crlf_record_delimiter() {
        assert_eq!(
            tokenize_with("\r\n", ";", "\"", "ab;cd\r\nef;gh\r\n"),
            vec![vec!["ab", "cd"], vec!["ef", "gh"]]
        );
    }

    #[test]
    fn multi_char_column_delimiter_and_encapsulator() {
        assert_eq!(
            tokenize_with("\r\n", "||", "##", "ab||##c||d##||ef\r\n"),
            vec![vec!["ab", "c||d", "ef"]]
        );
    }

    #[test]
    fn encapsulator_match_discards_everything_buffered_so_far() {
        // Characters preceding an encapsulator within the undetermined window
        // are treated as its prefix and dropped.
        assert_eq!(
            tokenize_with("\r\n", ";", "\"", "a\"bc\";dd\r\n"),
            vec![vec!["bc", "dd"]]
        );
    }

    #[test]
    fn text_after_closing_encapsulator_joins_the_field() {
        // Nothing checks that a delimiter follows the closing encapsulator.
        assert_eq!(tokenize("\"ab\"cd;e\n"), vec![vec!["abcd", "e"]]);
    }

    #[test]
    fn unterminated_quote_is_flushed_at_eof() {
        assert_eq!(tokenize("\"ab"), vec![vec!["ab"]]);
    }

    #[test]
    fn crlf_straddling_the_plain_commit_stays_literal() {
        // With a two-char record delimiter the column commits to plain text
        // while the matcher is mid-way through "\r\n"; the narrowed matcher
        // starts from its root and misses the '\n', so the pair stays in the
        // field.
        assert_eq!(
            tokenize_with("\r\n", ";", "\"", "a\r\n"),
            vec![vec!["a\r\n"]]
        );
    }

    #[test]
    fn round_trip_reproduces_fields() {
        let cases: &[(&str, &str, &str)] = &[("\n", ";", "\""), ("\r\n", "||", "##")];
        // Fields at least as long as the longest delimiter, so the column
        // commit cannot swallow the opening of a following delimiter.
        let records = vec![
            vec!["first".to_string(), "second".to_string(), "".to_string()],
            vec!["xx".to_string(), "äöü".to_string(), "99,95".to_string()],
        ];

        for &(rd, cd, te) in cases {
            let serialized: String = records
                .iter()
                .map(|r| r.join(cd))
                .map(|line| format!("{line}{rd}"))
                .collect();
            assert_eq!(
                tokenize_with(rd, cd, te, &serialized),
                records,
                "triple ({rd:?}, {cd:?}, {te:?})"
            );
        }
    }
}
