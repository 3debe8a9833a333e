use std::collections::HashMap;

use tracing::warn;

/// What a completed delimiter match means to the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    RecordDelimiter,
    ColumnDelimiter,
    TextEncapsulator,
}

#[derive(Debug)]
struct TrieNode {
    children: HashMap<char, usize>,
    output: Option<Token>,
}

impl TrieNode {
    fn new() -> Self {
        Self {
            children: HashMap::new(),
            output: None,
        }
    }
}

/// Incremental matcher over a set of delimiter strings.
///
/// One character is fed in at a time. A failed transition silently falls back
/// to the root without replaying the offending character, so a delimiter
/// match is only ever detected against an uninterrupted run of its
/// characters. The lexer compensates by keeping every consumed character in
/// its own buffer and stripping matches off the buffer's tail.
#[derive(Debug)]
pub struct DelimiterTrie {
    nodes: Vec<TrieNode>,
    cursor: usize,
}

impl DelimiterTrie {
    pub fn new(delimiters: &[(&str, Token)]) -> Self {
        let mut trie = Self {
            nodes: vec![TrieNode::new()],
            cursor: 0,
        };
        for (word, token) in delimiters {
            trie.insert(word, *token);
        }
        trie
    }

    fn insert(&mut self, word: &str, token: Token) {
        let mut node = 0;
        let last = word.chars().count().saturating_sub(1);
        for (i, c) in word.chars().enumerate() {
            let next = match self.nodes[node].children.get(&c) {
                Some(&existing) => existing,
                None => {
                    self.nodes.push(TrieNode::new());
                    let idx = self.nodes.len() - 1;
                    self.nodes[node].children.insert(c, idx);
                    idx
                }
            };
            if self.nodes[next].output.is_some() && i < last {
                // Schema validation rejects this, but a handbuilt trie could
                // still shadow one delimiter with another.
                warn!(word, "delimiter passes through an existing match");
            }
            if i == last {
                self.nodes[next].output = Some(token);
            }
            node = next;
        }
    }

    pub fn reset(&mut self) {
        self.cursor = 0;
    }

    /// Advances the match by one character. Returns the matched token once a
    /// delimiter is complete; the cursor resets on both a complete match and
    /// a failed transition.
    pub fn advance(&mut self, c: char) -> Option<Token> {
        match self.nodes[self.cursor].children.get(&c) {
            None => {
                self.reset();
                None
            }
            Some(&next) => match self.nodes[next].output {
                Some(token) => {
                    self.reset();
                    Some(token)
                }
                None => {
                    self.cursor = next;
                    None
                }
            },
        }
    }
}
