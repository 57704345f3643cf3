/**
This modules holds the computed metrics and gives a few tools to prettyprint them as a table, the
way the scores are usually read on a terminal.
*/
use crate::config::TableOptions;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

const METRIC_MIN_WIDTH: usize = 6;
const COUNT_MIN_WIDTH: usize = 9;
const SCORE_WIDTH: usize = 9;
const ELLIPSIS: &str = " ...";

/// A value the gold occurrences were mistaken for, with its share of the gold occurrences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Confusion {
    pub value: String,
    /// Percentage in `[0, 100]`.
    pub percentage: f32,
}

/// Datastructure holding the metrics of a single value of a category, such as `UPOS=NOUN` or
/// `Case=Nom`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsEntry {
    /// `<category>=<value>`
    pub name: String,
    /// `UPOS`, a feature name or `IsRoot`
    pub category: String,
    pub value: String,
    /// Occurrences of the value in the gold corpus
    pub gold_count: usize,
    /// Occurrences of the value in the predicted corpus
    pub pred_count: usize,
    /// Precision metric
    pub precision: f32,
    /// Recall metric
    pub recall: f32,
    /// Fscore metric
    pub fscore: f32,
    /// Confusions, most frequent first
    pub errors: Vec<Confusion>,
}

/// Enumeration of the different types of averaging computed for every category. &str can be
/// parsed to create an `Average`.
#[derive(Debug, Hash, PartialEq, Eq, Copy, Clone, Serialize, Deserialize, Sequence)]
pub enum Average {
    Micro,
    Macro,
    Weighted,
}

impl Display for Average {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str_content = match self {
            Self::Micro => "Overall_Micro",
            Self::Macro => "Overall_Macro",
            Self::Weighted => "Overall_Weighted",
        };
        write!(f, "{}", str_content)
    }
}

impl FromStr for Average {
    type Err = AverageParsingError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "micro" => Ok(Average::Micro),
            "macro" => Ok(Average::Macro),
            "weighted" => Ok(Average::Weighted),
            _ => Err(AverageParsingError(String::from(s))),
        }
    }
}

#[derive(Debug, PartialEq, PartialOrd, Eq, Ord, Clone)]
pub struct AverageParsingError(String);
impl Display for AverageParsingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Impossible to parse the string ({}) into an Average",
            self.0
        )
    }
}
impl std::error::Error for AverageParsingError {}

/// Averaged metrics of a whole category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    pub category: String,
    pub average: Average,
    pub precision: f32,
    pub recall: f32,
    pub fscore: f32,
    /// Sum of the gold counts of the category
    pub support: usize,
}

/// The reporter holds the metrics of every value of every category, in the order they were
/// computed, along with the averages of each category. It can be displayed as a table or consumed
/// to obtain a map from metric names to entries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Reporter {
    entries: Vec<MetricsEntry>,
    summaries: Vec<CategorySummary>,
    total_pairs: usize,
}

impl Reporter {
    pub(crate) fn new(total_pairs: usize) -> Self {
        Reporter {
            total_pairs,
            ..Default::default()
        }
    }

    pub(crate) fn insert(&mut self, entry: MetricsEntry) {
        self.entries.push(entry)
    }

    pub(crate) fn insert_summary(&mut self, summary: CategorySummary) {
        self.summaries.push(summary)
    }

    /// Entries in insertion order.
    pub fn entries(&self) -> &[MetricsEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&MetricsEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn summaries(&self) -> &[CategorySummary] {
        &self.summaries
    }

    pub fn summary(&self, category: &str, average: Average) -> Option<&CategorySummary> {
        self.summaries
            .iter()
            .find(|s| s.category == category && s.average == average)
    }

    /// Number of aligned token pairs that were scored.
    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the metrics as a tab separated table with a header line.
    pub fn render(&self, options: &TableOptions) -> String {
        let name_width = self
            .entries
            .iter()
            .map(|e| e.name.chars().count())
            .chain([METRIC_MIN_WIDTH])
            .max()
            .unwrap_or(METRIC_MIN_WIDTH);
        let count_width = self
            .entries
            .iter()
            .flat_map(|e| [e.gold_count, e.pred_count])
            .map(|c| c.to_string().len())
            .chain([COUNT_MIN_WIDTH])
            .max()
            .unwrap_or(COUNT_MIN_WIDTH);

        let mut header = format!(
            "{:>nw$}\t{:>cw$}\t{:>cw$}\t{:>sw$}\t{:>sw$}\t{:>sw$}",
            "Metric",
            "Raw gold",
            "Raw pred",
            "Precision",
            "Recall",
            "F1",
            nw = name_width,
            cw = count_width,
            sw = SCORE_WIDTH,
        );
        if options.show_errors {
            header.push_str("  Errors");
        }

        let mut rows: Vec<&MetricsEntry> = self.entries.iter().collect();
        if options.sort_by_f1 {
            rows.sort_by(|a, b| a.fscore.total_cmp(&b.fscore));
        }

        let mut output = header;
        output.push('\n');
        for entry in rows {
            let mut line = format!(
                "{:>nw$}\t{:>cw$}\t{:>cw$}\t{:>sw$.2}\t{:>sw$.2}\t{:>sw$.2}",
                entry.name,
                entry.gold_count,
                entry.pred_count,
                entry.precision * 100.0,
                entry.recall * 100.0,
                entry.fscore * 100.0,
                nw = name_width,
                cw = count_width,
                sw = SCORE_WIDTH,
            );
            if options.show_errors {
                let budget = options
                    .max_width
                    .map(|w| w as isize - line.chars().count() as isize + 2);
                if budget.map_or(true, |b| b > 0) {
                    line.push_str("  ");
                    line.push_str(&format_errors(&entry.errors, budget));
                }
            }
            output.push_str(&line);
            output.push('\n');
        }
        output
    }
}

/// `value:percentage` items separated by spaces. When `max_len` is given, the items that would
/// not fit are replaced by an ellipsis.
fn format_errors(errors: &[Confusion], max_len: Option<isize>) -> String {
    let mut s = String::new();
    for error in errors {
        let previous_len = s.len();
        if !s.is_empty() {
            s.push(' ');
        }
        s.push_str(&format!("{}:{:.2}", error.value, error.percentage));
        if let Some(max) = max_len {
            if s.chars().count() as isize > max - ELLIPSIS.len() as isize {
                s.truncate(previous_len);
                s.push_str(ELLIPSIS);
                break;
            }
        }
    }
    s
}

/// The Reporter struct acts as a table when displayed.
impl Display for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render(&TableOptions::default()))
    }
}

/// By converting the reporter into a `HashMap`, you lose the ordering of the entries and the
/// category averages.
impl From<Reporter> for HashMap<String, MetricsEntry> {
    fn from(value: Reporter) -> Self {
        value
            .entries
            .into_iter()
            .map(|e| (e.name.clone(), e))
            .collect()
    }
}
