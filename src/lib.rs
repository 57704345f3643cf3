/*!
Morphological and syntactic evaluation of annotated corpora. A gold corpus and a predicted corpus,
both made of sentences of tokens carrying a coarse part-of-speech tag (UPOS), morphological
features and a head, are aligned token by token and compared. The comparison yields, for every
value of every category, the precision, the recall, the F1 score and the values it was most often
confused with.

# Categories
* `UPOS`: the universal coarse part-of-speech tag.
* `<Feature>`: each morphological feature found on either side, such as `Case` or `Gender`. A
    feature that is not expressed on a token is counted with the `_` value.
* `IsRoot`: whether the token is attached to the root of the dependency tree (`Yes`/`No`).

# Alignment
Only primary tokens (integer identifiers) are scored. Multiword spans (`1-2`) and elided nodes
(`3.1`) are skipped on both sides. Whatever remains unpaired in a sentence is an error: the
evaluation never produces partial results.

# Example
```rust
use morpheval::{evaluate_str, EvalConfig};

let gold = "1\tLe\tle\tDET\t_\tDefinite=Def\t2\tdet\t_\t_
2\tchat\tchat\tNOUN\t_\tGender=Masc\t0\troot\t_\t_
";
let pred = "1\tLe\tle\tDET\t_\tDefinite=Def\t2\tdet\t_\t_
2\tchat\tchat\tVERB\t_\tGender=Masc\t0\troot\t_\t_
";
let reporter = evaluate_str(gold, pred, &EvalConfig::default()).unwrap();
assert_eq!(reporter.total_pairs(), 2);
assert_eq!(reporter.get("UPOS=DET").unwrap().fscore, 1.0);
assert_eq!(reporter.get("UPOS=NOUN").unwrap().recall, 0.0);
assert_eq!(reporter.get("Gender=Masc").unwrap().precision, 1.0);
```
*/

mod align;
mod config;
mod confusion;
mod conllu;
mod error;
mod filter;
mod metrics;
mod reporter;
mod token;

use tracing::{debug, info};

// The public api starts here
pub use align::{align, AlignedPair, Alignment};
pub use config::{EvalConfig, EvalConfigBuilder, TableOptions};
pub use confusion::{
    Category, CategoryFamily, ConfusionAccumulator, ConfusionMatrix, ConfusionStats,
    IS_ROOT_LABEL, UPOS_LABEL,
};
pub use conllu::{parse_corpus, parse_token, parse_token_id};
pub use error::{EvalError, Result, Side};
pub use filter::Filter;
pub use metrics::{
    collect_errors, compute_for_category, compute_for_value, compute_metrics, summarize_category,
    ValueScores,
};
pub use reporter::{
    Average, AverageParsingError, CategorySummary, Confusion, MetricsEntry, Reporter,
};
pub use token::{Features, Sentence, Token, TokenId, EMPTY};

/// Aligns every sentence pair and records the pairs whose gold token matches the filter. The
/// accumulator is returned before reconciliation.
///
/// * `gold`: Reference sentences
/// * `pred`: Predicted sentences, in the same order
/// * `filter`: Only the pairs whose gold token matches are recorded
pub fn accumulate(
    gold: &[Sentence],
    pred: &[Sentence],
    filter: Option<&Filter>,
) -> Result<ConfusionAccumulator> {
    if gold.len() != pred.len() {
        return Err(EvalError::CorpusLengthMismatch {
            gold: gold.len(),
            pred: pred.len(),
        });
    }
    let mut accumulator = ConfusionAccumulator::new();
    let mut skipped = 0usize;
    for (index, (gold_sentence, pred_sentence)) in gold.iter().zip(pred).enumerate() {
        for pair in Alignment::new(gold_sentence, pred_sentence, index) {
            let pair = pair?;
            if filter.map_or(true, |f| f.matches(pair.gold)) {
                accumulator.record_pair(&pair);
            } else {
                skipped += 1;
            }
        }
    }
    debug!(
        sentences = gold.len(),
        recorded = accumulator.total_pairs(),
        skipped,
        "aligned corpora"
    );
    Ok(accumulator)
}

/// Main entrypoint of the library. Compares the predicted corpus to the gold corpus and computes
/// the precision, recall and F1 score of every value of every category, along with their averages.
///
/// * `gold`: Reference sentences
/// * `pred`: Predicted sentences, in the same order
/// * `filter`: Restricts the evaluation to the gold tokens matching it
/// * `parallel`: Whether the vectorized metrics computations can use multiple cores
pub fn evaluate(
    gold: &[Sentence],
    pred: &[Sentence],
    filter: Option<&Filter>,
    parallel: bool,
) -> Result<Reporter> {
    let stats = accumulate(gold, pred, filter)?.reconcile();
    let reporter = compute_metrics(&stats, parallel);
    info!(
        pairs = reporter.total_pairs(),
        metrics = reporter.len(),
        "evaluation done"
    );
    Ok(reporter)
}

/// Same as `evaluate`, but the parameters are taken from an `EvalConfig`.
///
/// #Example
/// ```rust
/// use morpheval::{evaluate_conf, EvalConfigBuilder, Sentence, Token, TokenId};
///
/// let gold = vec![Sentence::new(vec![
///     Token::new(TokenId::Primary(1)).with_upos("NOUN"),
///     Token::new(TokenId::Primary(2)).with_upos("VERB"),
/// ])];
/// let pred = vec![Sentence::new(vec![
///     Token::new(TokenId::Primary(1)).with_upos("NOUN"),
///     Token::new(TokenId::Primary(2)).with_upos("NOUN"),
/// ])];
/// let config = EvalConfigBuilder::default().parallel(false).build();
/// let reporter = evaluate_conf(&gold, &pred, &config).unwrap();
/// let noun = reporter.get("UPOS=NOUN").unwrap();
/// assert_eq!((noun.gold_count, noun.pred_count), (1, 2));
/// assert_eq!(noun.precision, 0.5);
/// assert_eq!(noun.recall, 1.0);
/// ```
pub fn evaluate_conf(
    gold: &[Sentence],
    pred: &[Sentence],
    config: &EvalConfig,
) -> Result<Reporter> {
    evaluate(gold, pred, config.filter(), config.parallel())
}

/// Parses two CoNLL-U documents and evaluates them.
pub fn evaluate_str(gold: &str, pred: &str, config: &EvalConfig) -> Result<Reporter> {
    let gold = parse_corpus(gold)?;
    let pred = parse_corpus(pred)?;
    evaluate_conf(&gold, &pred, config)
}
