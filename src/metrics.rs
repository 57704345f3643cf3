/**
This module computes the metrics (precision, recall, f-score, gold and predicted counts) of every
value of every category from the reconciled confusion statistics.
*/
use crate::confusion::{Category, ConfusionMatrix, ConfusionStats};
use crate::reporter::{Average, CategorySummary, Confusion, MetricsEntry, Reporter};
use enum_iterator::all;
use itertools::multizip;
use ndarray::{prelude::*, Zip};
use ndarray_stats::SummaryStatisticsExt;
use num::Num;
use std::collections::BTreeSet;
use tracing::debug;

/// Counts and scores of a single value of a category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ValueScores {
    /// Number of gold occurrences of the value.
    pub gold_count: usize,
    /// Number of predicted occurrences of the value.
    pub pred_count: usize,
    /// Number of occurrences where both sides agree on the value.
    pub true_positives: usize,
    pub precision: f32,
    pub recall: f32,
    pub fscore: f32,
}

/// Computes the scores of a single value straight from the confusion matrix. A value that is not
/// a row of the matrix gets zero everywhere.
pub fn compute_for_value(matrix: &ConfusionMatrix, value: &str) -> ValueScores {
    let gold_count = matrix.row_sum(value);
    let pred_count = matrix.column_sum(value);
    let true_positives = matrix.count(value, value);
    let recall = ratio(true_positives, gold_count);
    let precision = ratio(true_positives, pred_count);
    ValueScores {
        gold_count,
        pred_count,
        true_positives,
        precision,
        recall,
        fscore: f1(precision, recall),
    }
}

fn ratio(numerator: usize, denominator: usize) -> f32 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f32 / denominator as f32
    }
}

/// Harmonic mean of precision and recall, `0` as soon as one of them is `0`.
fn f1(precision: f32, recall: f32) -> f32 {
    if precision == 0.0 || recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}

/// Values the gold occurrences of `value` were mistaken for, with the share of the gold
/// occurrences (in percent) each one took. Sorted by decreasing share, then by value.
pub fn collect_errors(matrix: &ConfusionMatrix, value: &str) -> Vec<Confusion> {
    let row = match matrix.row(value) {
        Some(row) => row,
        None => return vec![],
    };
    let total: usize = row.values().sum();
    if total == 0 {
        return vec![];
    }
    let mut errors: Vec<Confusion> = row
        .iter()
        .filter(|(pred, count)| pred.as_str() != value && **count > 0)
        .map(|(pred, count)| Confusion {
            value: pred.clone(),
            percentage: *count as f32 * 100.0 / total as f32,
        })
        .collect();
    errors.sort_by(|a, b| {
        b.percentage
            .total_cmp(&a.percentage)
            .then_with(|| a.value.cmp(&b.value))
    });
    errors
}

/// Dense copy of a confusion matrix, rows and columns following `values`.
fn dense<'a>(matrix: &ConfusionMatrix, values: &BTreeSet<&'a str>) -> Array2<usize> {
    let n = values.len();
    let mut dense = Array2::<usize>::zeros((n, n));
    for (i, gold) in values.iter().enumerate() {
        for (j, pred) in values.iter().enumerate() {
            dense[[i, j]] = matrix.count(gold, pred);
        }
    }
    dense
}

/// Gold sums, predicted sums and true positives of every value, in the order of the dense
/// matrix.
type GoldPredCorrect = (Array1<usize>, Array1<usize>, Array1<usize>);

fn extract_gold_pred_correct(dense: &Array2<usize>) -> GoldPredCorrect {
    let gold_sum = dense.sum_axis(Axis(1));
    let pred_sum = dense.sum_axis(Axis(0));
    let tp_sum = dense.diag().to_owned();
    (gold_sum, pred_sum, tp_sum)
}

/// Divides element-wise and returns `0` wherever the denominator is `0`.
fn prf_divide<I: Num + Copy + Send + Sync>(
    numerator: &Array1<I>,
    denominator: Array1<I>,
    parallel: bool,
) -> Array1<I> {
    let (result, zero_mask) = if parallel {
        par_prf_divide_results_and_mask(numerator, denominator)
    } else {
        prf_divide_results_and_mask(numerator, denominator)
    };
    result * zero_mask
}

/// This function computes the result in parallel. For a synchronous
/// version of this function, see `prf_divide_results_and_mask`.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn par_prf_divide_results_and_mask<I: Num + Copy + Send + Sync>(
    numerator: &Array1<I>,
    mut denominator: Array1<I>,
) -> (Array1<I>, Array1<I>) {
    let zero_at_mask = Zip::from(&denominator).par_map_collect(|d| {
        if *d == I::zero() {
            I::zero()
        } else {
            I::one()
        }
    });
    denominator.par_mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (numerator / &denominator, zero_at_mask)
}

/// This function computes the result synchronously. For a parallel
/// version of this function, see `par_prf_divide_results_and_mask`.
///
/// * `numerator`: Numerator of the division
/// * `denominator`: Denominator of the division
fn prf_divide_results_and_mask<I: Num + Copy>(
    numerator: &Array1<I>,
    mut denominator: Array1<I>,
) -> (Array1<I>, Array1<I>) {
    let zero_at_mask =
        Zip::from(&denominator).map_collect(|d| if *d == I::zero() { I::zero() } else { I::one() });
    denominator.mapv_inplace(|v| if v == I::zero() { I::one() } else { v });
    (numerator / &denominator, zero_at_mask)
}

/// Helper function to replace values from an array.
fn replace<Data: PartialEq + Copy>(
    mut array: Array1<Data>,
    replaced: Data,
    new_value: Data,
) -> Array1<Data> {
    array.mapv_inplace(|v| if v == replaced { new_value } else { v });
    array
}

/// Helper function to replace values from an array in parallel.
fn par_replace<Data: PartialEq + Send + Sync + Copy>(
    mut array: Array1<Data>,
    replaced: Data,
    new_value: Data,
) -> Array1<Data> {
    array.par_mapv_inplace(|v| if v == replaced { new_value } else { v });
    array
}

/// Precision, recall and f-score vectors.
type PrecisionRecallFScore = (Array1<f32>, Array1<f32>, Array1<f32>);

fn precision_recall_fscore(
    gold_sum: &Array1<usize>,
    pred_sum: &Array1<usize>,
    tp_sum: &Array1<usize>,
    parallel: bool,
) -> PrecisionRecallFScore {
    let tp = tp_sum.mapv(|x| x as f32);
    let precision = prf_divide(&tp, pred_sum.mapv(|x| x as f32), parallel);
    let recall = prf_divide(&tp, gold_sum.mapv(|x| x as f32), parallel);
    let denom = &precision + &recall;
    let denom_non_zero = if parallel {
        par_replace(denom, 0.0, 1.0)
    } else {
        replace(denom, 0.0, 1.0)
    };
    let fscore = (&precision * &recall) * 2.0 / denom_non_zero;
    (precision, recall, fscore)
}

/// Computes the metrics of every value of a category, in lexicographic order of the values. The
/// entries are named `<category>=<value>`.
pub fn compute_for_category(
    category: Category<'_>,
    matrix: &ConfusionMatrix,
    parallel: bool,
) -> Vec<MetricsEntry> {
    let values = matrix.values();
    let dense = dense(matrix, &values);
    let (gold_sum, pred_sum, tp_sum) = extract_gold_pred_correct(&dense);
    let (precision, recall, fscore) =
        precision_recall_fscore(&gold_sum, &pred_sum, &tp_sum, parallel);
    multizip((
        values.iter(),
        gold_sum.iter(),
        pred_sum.iter(),
        precision.iter(),
        recall.iter(),
        fscore.iter(),
    ))
    .map(|(value, gold, pred, p, r, f)| MetricsEntry {
        name: format!("{}={}", category.label(), value),
        category: String::from(category.label()),
        value: String::from(*value),
        gold_count: *gold,
        pred_count: *pred,
        precision: *p,
        recall: *r,
        fscore: *f,
        errors: collect_errors(matrix, value),
    })
    .collect()
}

/// Micro, macro and weighted averages of a category. Returns nothing for an empty matrix.
pub fn summarize_category(
    category: Category<'_>,
    matrix: &ConfusionMatrix,
    parallel: bool,
) -> Vec<CategorySummary> {
    if matrix.is_empty() {
        return vec![];
    }
    let values = matrix.values();
    let (gold_sum, pred_sum, tp_sum) = extract_gold_pred_correct(&dense(matrix, &values));
    let support = gold_sum.sum();
    let (precision, recall, fscore) =
        precision_recall_fscore(&gold_sum, &pred_sum, &tp_sum, parallel);
    all::<Average>()
        .map(|average| {
            let (p, r, f) = match average {
                Average::Micro => {
                    let p = ratio(tp_sum.sum(), pred_sum.sum());
                    let r = ratio(tp_sum.sum(), support);
                    (p, r, f1(p, r))
                }
                Average::Macro => (
                    precision.mean().unwrap_or(0.0),
                    recall.mean().unwrap_or(0.0),
                    fscore.mean().unwrap_or(0.0),
                ),
                Average::Weighted if support == 0 => (0.0, 0.0, 0.0),
                Average::Weighted => {
                    let weights = gold_sum.mapv(|x| x as f32);
                    (
                        precision.weighted_mean(&weights).unwrap_or(0.0),
                        recall.weighted_mean(&weights).unwrap_or(0.0),
                        fscore.weighted_mean(&weights).unwrap_or(0.0),
                    )
                }
            };
            CategorySummary {
                category: String::from(category.label()),
                average,
                precision: p,
                recall: r,
                fscore: f,
                support,
            }
        })
        .collect()
}

/// Computes the metrics of every category: the coarse tag first, then the features in
/// lexicographic order, then the root attachment.
pub fn compute_metrics(stats: &ConfusionStats, parallel: bool) -> Reporter {
    let mut reporter = Reporter::new(stats.total_pairs());
    for (category, matrix) in stats.categories() {
        let entries = compute_for_category(category, matrix, parallel);
        debug!(category = %category, values = entries.len(), "computed category metrics");
        for entry in entries {
            reporter.insert(entry);
        }
        for summary in summarize_category(category, matrix, parallel) {
            reporter.insert_summary(summary);
        }
    }
    reporter
}
