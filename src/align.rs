/**
Token alignment between a gold sentence and a predicted sentence. Both sides may carry multiword
spans and elided nodes that have no counterpart on the other side; these are skipped and only
primary tokens with equal identifiers are paired.
*/
use crate::error::{EvalError, Result, Side};
use crate::token::{Sentence, Token};
use std::iter::Peekable;
use std::slice::Iter;

/// A gold token and the predicted token carrying the same primary identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedPair<'a> {
    pub gold: &'a Token,
    pub pred: &'a Token,
}

/// Aligns two sentences and collects the pairs. Fails on the first inconsistency.
///
/// * `gold`: Reference sentence
/// * `pred`: Predicted sentence
/// * `sentence`: Position of the sentence in the corpus, used in error messages
pub fn align<'a>(
    gold: &'a Sentence,
    pred: &'a Sentence,
    sentence: usize,
) -> Result<Vec<AlignedPair<'a>>> {
    Alignment::new(gold, pred, sentence).collect()
}

/// Iterator over the aligned pairs of two sentences. Once an error has been returned, the
/// iterator is exhausted.
pub struct Alignment<'a> {
    gold: Peekable<Iter<'a, Token>>,
    pred: Peekable<Iter<'a, Token>>,
    gold_sentence: &'a Sentence,
    pred_sentence: &'a Sentence,
    sentence: usize,
    done: bool,
}

impl<'a> Alignment<'a> {
    pub fn new(gold: &'a Sentence, pred: &'a Sentence, sentence: usize) -> Self {
        Alignment {
            gold: gold.tokens.iter().peekable(),
            pred: pred.tokens.iter().peekable(),
            gold_sentence: gold,
            pred_sentence: pred,
            sentence,
            done: false,
        }
    }

    /// Called once one side is exhausted: whatever remains on the other side must be skippable.
    fn check_leftovers(&mut self) -> Option<Result<AlignedPair<'a>>> {
        if self.gold.any(|t| t.id.is_primary()) {
            return Some(Err(self.extra_data(Side::Gold)));
        }
        if self.pred.any(|t| t.id.is_primary()) {
            return Some(Err(self.extra_data(Side::Pred)));
        }
        None
    }

    fn extra_data(&self, side: Side) -> EvalError {
        let sentence = match side {
            Side::Gold => self.gold_sentence,
            Side::Pred => self.pred_sentence,
        };
        EvalError::MisalignedSentence {
            side,
            sentence: self.sentence,
            ids: sentence.ids(),
        }
    }
}

impl<'a> Iterator for Alignment<'a> {
    type Item = Result<AlignedPair<'a>>;
    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let (gold, pred) = match (self.gold.peek(), self.pred.peek()) {
                (Some(g), Some(p)) => (*g, *p),
                _ => {
                    self.done = true;
                    return self.check_leftovers();
                }
            };
            if gold.id.is_primary() && gold.id == pred.id {
                self.gold.next();
                self.pred.next();
                return Some(Ok(AlignedPair { gold, pred }));
            }
            if !gold.id.is_primary() {
                self.gold.next();
                continue;
            }
            if !pred.id.is_primary() {
                self.pred.next();
                continue;
            }
            self.done = true;
            return Some(Err(EvalError::Alignment {
                sentence: self.sentence,
                gold: gold.id.to_string(),
                pred: pred.id.to_string(),
            }));
        }
    }
}
