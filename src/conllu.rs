/**
Reader for the CoNLL-U format. Only the columns needed for scoring are kept (ID, UPOS, FEATS and
HEAD); the others are checked for presence and dropped.
*/
use crate::error::{EvalError, Result};
use crate::token::{Features, Sentence, Token, TokenId, EMPTY};
use std::mem::take;
use tracing::trace;

const N_COLUMNS: usize = 10;
const ID: usize = 0;
const UPOS: usize = 3;
const FEATS: usize = 5;
const HEAD: usize = 6;

/// Parses a whole CoNLL-U document into sentences. Comment lines are skipped, except for
/// `# sent_id = ...` which is attached to the sentence. A sentence is closed by a blank line or by
/// the end of the input.
pub fn parse_corpus(content: &str) -> Result<Vec<Sentence>> {
    let mut sentences = Vec::new();
    let mut current = Sentence::default();

    for (index, raw_line) in content.lines().enumerate() {
        let line_number = index + 1;
        let line = raw_line.trim_end_matches('\r');

        if line.trim().is_empty() {
            if !current.tokens.is_empty() {
                sentences.push(take(&mut current));
            } else {
                current.sent_id = None;
            }
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if let Some((key, value)) = comment.split_once('=') {
                if key.trim() == "sent_id" {
                    current.sent_id = Some(value.trim().to_string());
                }
            }
            continue;
        }

        current.tokens.push(parse_token(line, line_number)?);
    }

    if !current.tokens.is_empty() {
        sentences.push(current);
    }
    trace!(sentences = sentences.len(), "parsed CoNLL-U document");
    Ok(sentences)
}

/// Parses a single token line.
pub fn parse_token(line: &str, line_number: usize) -> Result<Token> {
    let columns: Vec<&str> = line.split('\t').collect();
    if columns.len() != N_COLUMNS {
        return Err(EvalError::parse(
            line_number,
            format!(
                "expected {} tab separated columns, found {}",
                N_COLUMNS,
                columns.len()
            ),
        ));
    }
    let head = match columns[HEAD] {
        EMPTY => None,
        h => Some(h.parse::<usize>().map_err(|_| {
            EvalError::parse(line_number, format!("invalid head \"{}\"", h))
        })?),
    };
    Ok(Token {
        id: parse_token_id(columns[ID])?,
        upos: optional_column(columns[UPOS]).map(String::from),
        feats: optional_column(columns[FEATS]).map(parse_features),
        head,
    })
}

/// `n` is a primary node, `a-b` a multiword span and `a.b` an elided node.
pub fn parse_token_id(raw: &str) -> Result<TokenId> {
    let unrecognized = || EvalError::UnrecognizedTokenId(String::from(raw));
    if let Ok(n) = raw.parse::<usize>() {
        return Ok(TokenId::Primary(n));
    }
    let (separator, (left, right)) = match (raw.split_once('-'), raw.split_once('.')) {
        (Some(parts), None) => ('-', parts),
        (None, Some(parts)) => ('.', parts),
        _ => return Err(unrecognized()),
    };
    let left = left.parse::<usize>().map_err(|_| unrecognized())?;
    let right = right.parse::<usize>().map_err(|_| unrecognized())?;
    match separator {
        '-' => Ok(TokenId::Span(left, right)),
        _ => Ok(TokenId::Elided(left, right)),
    }
}

/// `Name=Value|Name=Value`. A feature without `=` is kept with an empty value.
fn parse_features(raw: &str) -> Features {
    raw.split('|')
        .filter(|f| !f.is_empty())
        .map(|f| match f.split_once('=') {
            Some((name, value)) => (name.to_string(), value.to_string()),
            None => (f.to_string(), String::new()),
        })
        .collect()
}

fn optional_column(raw: &str) -> Option<&str> {
    match raw {
        EMPTY | "" => None,
        v => Some(v),
    }
}
