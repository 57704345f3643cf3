/**
This module accumulates the confusion statistics of an evaluation run. Every category (the coarse
tag, each morphological feature and the root attachment) owns a confusion matrix mapping a gold
value and a predicted value to a number of occurrences.
*/
use crate::align::AlignedPair;
use crate::token::{Token, EMPTY};
use ahash::{AHashMap, AHashSet};
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Display;
use tracing::debug;

/// Label of the coarse tag category.
pub const UPOS_LABEL: &str = "UPOS";
/// Label of the root attachment category.
pub const IS_ROOT_LABEL: &str = "IsRoot";
const ROOT: &str = "Yes";
const NOT_ROOT: &str = "No";

/// The three families of categories, in reporting order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Sequence, Serialize, Deserialize,
)]
pub enum CategoryFamily {
    Upos,
    Feats,
    Dep,
}

/// A single category, i.e. a single confusion matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category<'a> {
    Upos,
    Feature(&'a str),
    IsRoot,
}

impl<'a> Category<'a> {
    pub fn label(&self) -> &'a str {
        match *self {
            Self::Upos => UPOS_LABEL,
            Self::Feature(name) => name,
            Self::IsRoot => IS_ROOT_LABEL,
        }
    }

    pub fn family(&self) -> CategoryFamily {
        match self {
            Self::Upos => CategoryFamily::Upos,
            Self::Feature(_) => CategoryFamily::Feats,
            Self::IsRoot => CategoryFamily::Dep,
        }
    }
}

impl<'a> Display for Category<'a> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Gold value -> predicted value -> count.
///
/// The key universe is symmetric: any value recorded as a prediction is also a gold row, possibly
/// without any count.
#[derive(Debug, Clone, Default)]
pub struct ConfusionMatrix {
    rows: AHashMap<String, AHashMap<String, usize>>,
}

impl ConfusionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cell `(gold, pred)`, inserting a zero count (and the rows it needs) if absent.
    pub fn get_or_insert_zero(&mut self, gold: &str, pred: &str) -> &mut usize {
        if !self.rows.contains_key(pred) {
            self.rows.insert(String::from(pred), AHashMap::default());
        }
        self.rows
            .entry(String::from(gold))
            .or_default()
            .entry(String::from(pred))
            .or_insert(0)
    }

    /// Counts one occurrence of `gold` predicted as `pred`. Afterwards both values are row keys and
    /// the mirrored cell `(pred, gold)` exists.
    pub fn record(&mut self, gold: &str, pred: &str) {
        self.get_or_insert_zero(pred, gold);
        *self.get_or_insert_zero(gold, pred) += 1;
    }

    /// Adds `count` to a cell.
    pub fn add(&mut self, gold: &str, pred: &str, count: usize) {
        *self.get_or_insert_zero(gold, pred) += count;
    }

    pub fn count(&self, gold: &str, pred: &str) -> usize {
        self.rows
            .get(gold)
            .and_then(|row| row.get(pred))
            .copied()
            .unwrap_or(0)
    }

    pub fn row(&self, gold: &str) -> Option<&AHashMap<String, usize>> {
        self.rows.get(gold)
    }

    /// Number of gold occurrences of a value.
    pub fn row_sum(&self, gold: &str) -> usize {
        self.rows.get(gold).map(|row| row.values().sum()).unwrap_or(0)
    }

    /// Number of predicted occurrences of a value.
    pub fn column_sum(&self, pred: &str) -> usize {
        self.rows.values().filter_map(|row| row.get(pred)).sum()
    }

    /// Sum of every cell.
    pub fn total(&self) -> usize {
        self.rows.values().flat_map(|row| row.values()).sum()
    }

    /// Row keys in lexicographic order.
    pub fn values(&self) -> BTreeSet<&str> {
        self.rows.keys().map(String::as_str).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Checks that every predicted value is also a gold row.
    pub fn is_symmetric(&self) -> bool {
        let keys: AHashSet<&str> = self.rows.keys().map(String::as_str).collect();
        self.rows
            .values()
            .flat_map(|row| row.keys())
            .all(|pred| keys.contains(pred.as_str()))
    }

    /// Adds the occurrences the category never saw explicitly as `(EMPTY, EMPTY)` counts, so that
    /// the matrix accounts for exactly `total_pairs` observations. Returns the added count.
    fn fill_implicit_empty(&mut self, total_pairs: usize) -> usize {
        let expressed = self.total();
        if expressed >= total_pairs {
            return 0;
        }
        let shortfall = total_pairs - expressed;
        self.add(EMPTY, EMPTY, shortfall);
        shortfall
    }
}

/// Owns the confusion matrices of one evaluation run. Pairs are recorded one after the other;
/// `reconcile` then consumes the accumulator and returns the final, read-only statistics.
#[derive(Debug, Clone, Default)]
pub struct ConfusionAccumulator {
    upos: ConfusionMatrix,
    feats: AHashMap<String, ConfusionMatrix>,
    dep: ConfusionMatrix,
    total_pairs: usize,
}

impl ConfusionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation in a category.
    pub fn record(&mut self, category: Category<'_>, gold: &str, pred: &str) {
        let matrix = match category {
            Category::Upos => &mut self.upos,
            Category::Feature(name) => self.feats.entry(String::from(name)).or_default(),
            Category::IsRoot => &mut self.dep,
        };
        matrix.record(gold, pred);
    }

    /// Records every category of an aligned pair and counts the pair.
    pub fn record_pair(&mut self, pair: &AlignedPair<'_>) {
        let (gold, pred) = (pair.gold, pair.pred);
        self.record(Category::Upos, gold.upos_value(), pred.upos_value());
        for name in feature_names(gold, pred) {
            self.record(
                Category::Feature(name),
                gold.feature_value(name),
                pred.feature_value(name),
            );
        }
        self.record(Category::IsRoot, root_value(gold), root_value(pred));
        self.total_pairs += 1;
    }

    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    /// Materializes the implicit "not expressed" occurrences of the coarse tag and of every
    /// feature, then freezes the statistics.
    pub fn reconcile(mut self) -> ConfusionStats {
        let total_pairs = self.total_pairs;
        let added = self.upos.fill_implicit_empty(total_pairs);
        if added > 0 {
            debug!(category = UPOS_LABEL, added, "added implicit empty counts");
        }
        for (name, matrix) in self.feats.iter_mut() {
            let added = matrix.fill_implicit_empty(total_pairs);
            if added > 0 {
                debug!(category = %name, added, "added implicit empty counts");
            }
        }
        ConfusionStats {
            upos: self.upos,
            feats: self.feats.into_iter().collect(),
            dep: self.dep,
            total_pairs,
        }
    }
}

/// Reconciled statistics of an evaluation run.
#[derive(Debug, Clone)]
pub struct ConfusionStats {
    upos: ConfusionMatrix,
    feats: BTreeMap<String, ConfusionMatrix>,
    dep: ConfusionMatrix,
    total_pairs: usize,
}

impl ConfusionStats {
    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    pub fn upos(&self) -> &ConfusionMatrix {
        &self.upos
    }

    pub fn feature(&self, name: &str) -> Option<&ConfusionMatrix> {
        self.feats.get(name)
    }

    pub fn is_root(&self) -> &ConfusionMatrix {
        &self.dep
    }

    /// Every category of a family with its matrix. Features come in lexicographic order.
    pub fn family(&self, family: CategoryFamily) -> Vec<(Category<'_>, &ConfusionMatrix)> {
        match family {
            CategoryFamily::Upos => vec![(Category::Upos, &self.upos)],
            CategoryFamily::Feats => self
                .feats
                .iter()
                .map(|(name, matrix)| (Category::Feature(name.as_str()), matrix))
                .collect(),
            CategoryFamily::Dep if self.dep.is_empty() => vec![],
            CategoryFamily::Dep => vec![(Category::IsRoot, &self.dep)],
        }
    }

    /// Every category of every family, in reporting order.
    pub fn categories(&self) -> Vec<(Category<'_>, &ConfusionMatrix)> {
        enum_iterator::all::<CategoryFamily>()
            .flat_map(|family| self.family(family))
            .collect()
    }
}

/// Union of the feature names carried by the two tokens.
fn feature_names<'a>(gold: &'a Token, pred: &'a Token) -> BTreeSet<&'a str> {
    [gold, pred]
        .into_iter()
        .filter_map(|t| t.feats.as_ref())
        .flat_map(|feats| feats.keys())
        .map(String::as_str)
        .collect()
}

fn root_value(token: &Token) -> &'static str {
    if token.is_root() {
        ROOT
    } else {
        NOT_ROOT
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::align::align;
    use crate::align::tests::decorated;
    use crate::token::{Sentence, TokenId};
    use quickcheck::{QuickCheck, TestResult};
    use rstest::rstest;

    fn token(id: usize, upos: &str) -> Token {
        Token::new(TokenId::Primary(id)).with_upos(upos)
    }

    fn accumulate(gold: &Sentence, pred: &Sentence) -> ConfusionAccumulator {
        let mut acc = ConfusionAccumulator::new();
        for pair in align(gold, pred, 0).unwrap() {
            acc.record_pair(&pair);
        }
        acc
    }

    #[test]
    fn test_record_keeps_key_universe_symmetric() {
        let mut matrix = ConfusionMatrix::new();
        matrix.record("NOUN", "NOUN");
        matrix.record("VERB", "NOUN");
        assert_eq!(matrix.count("NOUN", "NOUN"), 1);
        assert_eq!(matrix.count("VERB", "NOUN"), 1);
        assert_eq!(matrix.count("NOUN", "VERB"), 0);
        assert!(matrix.row("NOUN").unwrap().contains_key("VERB"));
        assert_eq!(matrix.values(), BTreeSet::from(["NOUN", "VERB"]));
        assert_eq!(matrix.total(), 2);
        assert_eq!(matrix.row_sum("VERB"), 1);
        assert_eq!(matrix.column_sum("NOUN"), 2);
        assert_eq!(matrix.column_sum("VERB"), 0);
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn test_get_or_insert_zero_creates_pred_row() {
        let mut matrix = ConfusionMatrix::new();
        assert_eq!(*matrix.get_or_insert_zero("A", "B"), 0);
        assert!(matrix.row("B").is_some());
        assert!(matrix.is_symmetric());
    }

    #[test]
    fn test_upos_scenario() {
        let gold = Sentence::new(vec![token(1, "NOUN"), token(2, "VERB")]);
        let pred = Sentence::new(vec![token(1, "NOUN"), token(2, "NOUN")]);
        let stats = accumulate(&gold, &pred).reconcile();
        let upos = stats.upos();
        assert_eq!(upos.count("NOUN", "NOUN"), 1);
        assert_eq!(upos.count("VERB", "NOUN"), 1);
        assert_eq!(upos.count("VERB", "VERB"), 0);
        assert_eq!(upos.values(), BTreeSet::from(["NOUN", "VERB"]));
        assert_eq!(upos.total(), 2);
    }

    #[test]
    fn test_is_root_scenario() {
        let gold = Sentence::new(vec![token(1, "VERB").with_head(0)]);
        let pred = Sentence::new(vec![token(1, "VERB").with_head(3)]);
        let stats = accumulate(&gold, &pred).reconcile();
        let dep = stats.is_root();
        assert_eq!(dep.count("Yes", "No"), 1);
        assert_eq!(dep.count("No", "Yes"), 0);
        assert!(dep.row("No").unwrap().contains_key("Yes"));
        assert_eq!(dep.total(), 1);
    }

    #[test]
    fn test_features_use_empty_for_missing_side() {
        let gold = Sentence::new(vec![
            token(1, "NOUN").with_feature("Case", "Nom"),
            token(2, "VERB"),
            token(3, "ADJ").with_feature("Case", "Acc"),
        ]);
        let pred = Sentence::new(vec![
            token(1, "NOUN").with_feature("Case", "Nom"),
            token(2, "VERB").with_feature("Mood", "Ind"),
            token(3, "ADJ"),
        ]);
        let acc = accumulate(&gold, &pred);
        assert_eq!(acc.total_pairs(), 3);
        let stats = acc.reconcile();
        let case = stats.feature("Case").unwrap();
        assert_eq!(case.count("Nom", "Nom"), 1);
        assert_eq!(case.count("Acc", EMPTY), 1);
        // the pair where neither side expressed Case
        assert_eq!(case.count(EMPTY, EMPTY), 1);
        let mood = stats.feature("Mood").unwrap();
        assert_eq!(mood.count(EMPTY, "Ind"), 1);
        assert_eq!(mood.count(EMPTY, EMPTY), 2);
        assert_eq!(mood.total(), 3);
    }

    #[test]
    fn test_absent_upos_becomes_empty() {
        let gold = Sentence::new(vec![Token::new(TokenId::Primary(1)), token(2, "X")]);
        let pred = Sentence::new(vec![token(1, "X"), token(2, "X")]);
        let stats = accumulate(&gold, &pred).reconcile();
        assert_eq!(stats.upos().count(EMPTY, "X"), 1);
        assert_eq!(stats.upos().count("X", "X"), 1);
        assert_eq!(stats.upos().total(), 2);
    }

    #[test]
    fn test_reconcile_without_shortfall() {
        let gold = Sentence::new(vec![token(1, "NOUN")]);
        let stats = accumulate(&gold, &gold.clone()).reconcile();
        assert_eq!(stats.upos().row(EMPTY), None);
    }

    #[rstest]
    #[case(3, 3, 0)]
    #[case(3, 5, 2)]
    #[case(0, 4, 4)]
    fn test_fill_implicit_empty_reports_added_counts(
        #[case] expressed: usize,
        #[case] total_pairs: usize,
        #[case] added: usize,
    ) {
        let mut matrix = ConfusionMatrix::new();
        matrix.add("Sing", "Sing", expressed);
        assert_eq!(matrix.fill_implicit_empty(total_pairs), added);
        assert_eq!(matrix.total(), total_pairs);
        assert_eq!(matrix.count(EMPTY, EMPTY), added);
    }

    #[test]
    fn test_fully_expressed_feature_gets_no_empty_row() {
        let gold = Sentence::new(vec![
            token(1, "NOUN").with_feature("Number", "Sing"),
            token(2, "VERB").with_feature("Number", "Plur"),
        ]);
        let stats = accumulate(&gold, &gold.clone()).reconcile();
        let number = stats.feature("Number").unwrap();
        assert_eq!(number.row(EMPTY), None);
        assert_eq!(number.total(), 2);
    }

    #[test]
    fn test_categories_order() {
        let gold = Sentence::new(vec![token(1, "NOUN")
            .with_feature("Number", "Sing")
            .with_feature("Case", "Nom")
            .with_head(0)]);
        let stats = accumulate(&gold, &gold.clone()).reconcile();
        let labels: Vec<_> = stats
            .categories()
            .into_iter()
            .map(|(c, _)| c.label())
            .collect();
        assert_eq!(labels, vec!["UPOS", "Case", "Number", "IsRoot"]);
    }

    #[test]
    fn test_empty_run_has_no_is_root_category() {
        let stats = ConfusionAccumulator::new().reconcile();
        assert_eq!(stats.total_pairs(), 0);
        assert!(stats.family(CategoryFamily::Dep).is_empty());
        assert!(stats.upos().is_empty());
    }

    #[test]
    fn test_property_gold_counts_sum_to_total_pairs() {
        fn property(n: u8, markers: Vec<u8>, tags: Vec<u8>) -> TestResult {
            let n = (n % 30) as usize;
            let upos = ["NOUN", "VERB", "ADJ"];
            let cases = ["Nom", "Acc"];
            let mut gold = decorated(n, &markers);
            let mut pred = decorated(n, &[]);
            for (i, t) in gold.tokens.iter_mut().filter(|t| t.id.is_primary()).enumerate() {
                let tag = tags.get(i).copied().unwrap_or(0) as usize;
                t.upos = Some(String::from(upos[tag % 3]));
                if tag % 2 == 0 {
                    *t = t.clone().with_feature("Case", cases[tag % 4 / 2]);
                }
            }
            for (i, t) in pred.tokens.iter_mut().enumerate() {
                let tag = tags.get(i + 1).copied().unwrap_or(1) as usize;
                if tag % 5 != 0 {
                    t.upos = Some(String::from(upos[tag % 3]));
                }
                if tag % 3 == 0 {
                    *t = t.clone().with_feature("Gender", "Fem");
                }
            }
            let stats = accumulate(&gold, &pred).reconcile();
            let total = stats.total_pairs();
            let upos_gold: usize = stats
                .upos()
                .values()
                .iter()
                .map(|v| stats.upos().row_sum(v))
                .sum();
            let feats_ok = stats
                .family(CategoryFamily::Feats)
                .iter()
                .all(|(_, m)| m.total() == total && m.is_symmetric());
            TestResult::from_bool(
                total == n && upos_gold == total && feats_ok && stats.upos().is_symmetric(),
            )
        }
        let mut qc = QuickCheck::new().tests(1000);
        qc.quickcheck(property as fn(u8, Vec<u8>, Vec<u8>) -> TestResult)
    }
}
