pub mod lexer;
pub mod trie;

/// One tokenized record: an ordered list of raw field strings. Index `i`
/// corresponds to the schema's `ordered_columns()[i]`.
pub type RawRecord = Vec<String>;

pub use lexer::Lexer;
pub use trie::{DelimiterTrie, Token};
