//! Error kinds raised while reading and comparing two corpora. Every one of them is fatal: a run
//! either aligns and scores both corpora entirely or produces no metrics at all.

use std::fmt::Display;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

/// Which corpus a problem was found in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Gold,
    Pred,
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gold => write!(f, "gold"),
            Self::Pred => write!(f, "pred"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    #[error("number of sentences in corpora isn't equal: len(gold)=={gold}, len(pred)=={pred}")]
    CorpusLengthMismatch { gold: usize, pred: usize },

    #[error("incorrect filter (\"{0}\" mentioned at least twice)")]
    DuplicateFilterKey(String),

    #[error("incorrect filter clause \"{0}\", expected `key=value`")]
    MalformedFilterClause(String),

    #[error("can't parse token id: '{0}'")]
    UnrecognizedTokenId(String),

    #[error("sentence {sentence}: gold token {gold} and pred token {pred} can't be aligned")]
    Alignment {
        sentence: usize,
        gold: String,
        pred: String,
    },

    #[error("extra data in {side} sentence {sentence}: {ids}")]
    MisalignedSentence {
        side: Side,
        sentence: usize,
        ids: String,
    },

    #[error("line {line}: {reason}")]
    Parse { line: usize, reason: String },
}

impl EvalError {
    pub(crate) fn parse(line: usize, reason: impl Into<String>) -> Self {
        EvalError::Parse {
            line,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = EvalError::CorpusLengthMismatch { gold: 3, pred: 2 };
        assert_eq!(
            err.to_string(),
            "number of sentences in corpora isn't equal: len(gold)==3, len(pred)==2"
        );
        let err = EvalError::DuplicateFilterKey(String::from("upos"));
        assert_eq!(
            err.to_string(),
            "incorrect filter (\"upos\" mentioned at least twice)"
        );
        let err = EvalError::MisalignedSentence {
            side: Side::Pred,
            sentence: 4,
            ids: String::from("1 2 3"),
        };
        assert_eq!(err.to_string(), "extra data in pred sentence 4: 1 2 3");
    }
}
