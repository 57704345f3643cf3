/**
This module holds the in-memory view of an annotated corpus: sentences made of tokens, each token
carrying an identifier, a coarse tag, its morphological features and its dependency head.
*/
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

/// Reserved value standing for "not expressed". It is shared by every category family: an absent
/// coarse tag, a feature missing on one side of a pair and the implicit counts added during
/// reconciliation all use it. The CoNLL-U reader maps a literal `_` column to an absent value, so
/// it can never be a real tag or feature value.
pub const EMPTY: &str = "_";

/// Morphological features of a token, ordered by feature name.
pub type Features = BTreeMap<String, String>;

/// Identifier of a token inside its sentence. Only `Primary` tokens are scored; spans
/// (multiword tokens such as `3-4`) and elided nodes (`5.1`) are decorative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TokenId {
    Primary(usize),
    Span(usize, usize),
    Elided(usize, usize),
}

impl TokenId {
    pub fn is_primary(&self) -> bool {
        matches!(self, TokenId::Primary(_))
    }
}

impl Display for TokenId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Primary(n) => write!(f, "{}", n),
            Self::Span(start, end) => write!(f, "{}-{}", start, end),
            Self::Elided(n, sub) => write!(f, "{}.{}", n, sub),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: TokenId,
    /// Coarse part-of-speech tag (UPOS column).
    pub upos: Option<String>,
    /// `None` when the FEATS column is empty.
    pub feats: Option<Features>,
    /// Index of the syntactic head, `0` being the virtual root.
    pub head: Option<usize>,
}

impl Token {
    pub fn new(id: TokenId) -> Self {
        Token {
            id,
            upos: None,
            feats: None,
            head: None,
        }
    }

    pub fn with_upos(mut self, upos: impl Into<String>) -> Self {
        self.upos = Some(upos.into());
        self
    }

    pub fn with_feature(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.feats
            .get_or_insert_with(Features::new)
            .insert(name.into(), value.into());
        self
    }

    pub fn with_head(mut self, head: usize) -> Self {
        self.head = Some(head);
        self
    }

    /// Coarse tag, or the `EMPTY` sentinel when absent.
    pub fn upos_value(&self) -> &str {
        self.upos.as_deref().unwrap_or(EMPTY)
    }

    /// Value of the feature `name`, or the `EMPTY` sentinel when the token does not express it.
    pub fn feature_value(&self, name: &str) -> &str {
        self.feats
            .as_ref()
            .and_then(|feats| feats.get(name))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
            .unwrap_or(EMPTY)
    }

    pub fn is_root(&self) -> bool {
        self.head == Some(0)
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.id, self.upos_value())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Sentence {
    /// Value of the `# sent_id` comment, if the sentence had one.
    pub sent_id: Option<String>,
    pub tokens: Vec<Token>,
}

impl Sentence {
    pub fn new(tokens: Vec<Token>) -> Self {
        Sentence {
            sent_id: None,
            tokens,
        }
    }

    /// Number of tokens that take part in the scoring.
    pub fn primary_len(&self) -> usize {
        self.tokens.iter().filter(|t| t.id.is_primary()).count()
    }

    /// Space separated identifiers, used when reporting a broken sentence.
    pub fn ids(&self) -> String {
        self.tokens
            .iter()
            .map(|t| t.id.to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl From<Vec<Token>> for Sentence {
    fn from(value: Vec<Token>) -> Self {
        Sentence::new(value)
    }
}
