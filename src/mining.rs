//! Level-wise Apriori search for frequent itemsets over a membership matrix.

use std::collections::{BTreeSet, HashSet};

use ndarray::Array2;

use crate::encoder::{column_means, Item};
use crate::error::MiningError;

/// Tolerance applied to every support-threshold comparison so exact rational
/// supports are not excluded by floating-point rounding.
pub const SUPPORT_EPSILON: f64 = 1e-9;

/// An itemset together with the fraction of transactions containing it.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequentItemset<I> {
    pub items: BTreeSet<I>,
    pub support: f64,
}

impl<I: Item> FrequentItemset<I> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Mine all frequent itemsets of the matrix up to `max_len` members.
///
/// Levels are built bottom-up: frequent single items first, then size-k
/// candidates joined from the frequent (k-1)-sets, with candidates discarded
/// before counting whenever one of their (k-1)-subsets is not frequent (no
/// superset of an infrequent itemset can be frequent). Mining stops when a
/// level yields nothing or `max_len` is reached.
///
/// Output is deterministic: ascending level, lexicographic vocabulary order
/// within a level.
pub fn apriori<I: Item>(
    matrix: &Array2<bool>,
    vocabulary: &[I],
    min_support: f64,
    max_len: usize,
) -> Result<Vec<FrequentItemset<I>>, MiningError> {
    if max_len < 1 {
        return Err(MiningError::Configuration(format!(
            "max_len must be at least 1, got {max_len}"
        )));
    }
    if !(0.0..=1.0).contains(&min_support) {
        return Err(MiningError::Configuration(format!(
            "min_support must lie in [0, 1], got {min_support}"
        )));
    }
    if matrix.ncols() != vocabulary.len() {
        return Err(MiningError::Configuration(format!(
            "matrix has {} columns but the vocabulary has {} items",
            matrix.ncols(),
            vocabulary.len()
        )));
    }

    let mut found: Vec<(Vec<usize>, f64)> = Vec::new();

    // Level 1: single-item supports are the column means.
    let mut frequent: Vec<Vec<usize>> = Vec::new();
    for (column, &support) in column_means(matrix).iter().enumerate() {
        if meets_threshold(support, min_support) {
            found.push((vec![column], support));
            // A zero-support itemset carries no observed co-occurrence to
            // extend, even when the threshold admits it.
            if support > 0.0 {
                frequent.push(vec![column]);
            }
        }
    }

    let mut level = 2;
    while level <= max_len && !frequent.is_empty() {
        let prior: HashSet<Vec<usize>> = frequent.iter().cloned().collect();
        let mut next = Vec::new();

        for candidate in join_level(&frequent) {
            if !all_subsets_frequent(&candidate, &prior) {
                continue;
            }
            let support = itemset_support(matrix, &candidate);
            if meets_threshold(support, min_support) {
                found.push((candidate.clone(), support));
                if support > 0.0 {
                    next.push(candidate);
                }
            }
        }

        frequent = next;
        level += 1;
    }

    Ok(found
        .into_iter()
        .map(|(columns, support)| FrequentItemset {
            items: columns.iter().map(|&c| vocabulary[c].clone()).collect(),
            support,
        })
        .collect())
}

/// Whether `support` clears the threshold, within [`SUPPORT_EPSILON`].
pub fn meets_threshold(support: f64, min_support: f64) -> bool {
    support >= min_support - SUPPORT_EPSILON
}

/// Fraction of rows where every listed column is true.
fn itemset_support(matrix: &Array2<bool>, columns: &[usize]) -> f64 {
    let rows = matrix.nrows();
    if rows == 0 {
        return 0.0;
    }
    let hits = (0..rows)
        .filter(|&row| columns.iter().all(|&column| matrix[[row, column]]))
        .count();
    hits as f64 / rows as f64
}

/// Join frequent (k-1)-sets sharing a (k-2)-prefix into k-candidates.
///
/// `frequent` is lexicographically sorted, so pairing each set with its
/// later prefix-mates yields every candidate exactly once, already sorted.
fn join_level(frequent: &[Vec<usize>]) -> Vec<Vec<usize>> {
    let mut candidates = Vec::new();
    for (position, left) in frequent.iter().enumerate() {
        let prefix = &left[..left.len() - 1];
        for right in &frequent[position + 1..] {
            if &right[..right.len() - 1] != prefix {
                break;
            }
            let mut candidate = left.clone();
            candidate.push(right[right.len() - 1]);
            candidates.push(candidate);
        }
    }
    candidates
}

/// Apriori pruning: every (k-1)-subset of the candidate must be frequent.
fn all_subsets_frequent(candidate: &[usize], prior: &HashSet<Vec<usize>>) -> bool {
    let mut subset = Vec::with_capacity(candidate.len() - 1);
    for skip in 0..candidate.len() {
        subset.clear();
        subset.extend(
            candidate
                .iter()
                .enumerate()
                .filter(|&(position, _)| position != skip)
                .map(|(_, &column)| column),
        );
        if !prior.contains(subset.as_slice()) {
            return false;
        }
    }
    true
}
