//! Transaction encoding into a dense boolean membership matrix.

use std::collections::{BTreeSet, HashMap};
use std::fmt::{Debug, Display};
use std::hash::Hash;

use ndarray::Array2;

use crate::error::MiningError;

/// Opaque key type for the things being mined.
///
/// Items only need to be comparable, hashable and orderable (the ordering
/// gives the vocabulary and all derived output a deterministic layout), so
/// richer representations than plain labels can be mined unchanged.
pub trait Item: Clone + Eq + Hash + Ord + Debug + Display {
    /// Label-like representations can reject null/empty labels here.
    fn well_formed(&self) -> bool {
        true
    }
}

impl Item for String {
    fn well_formed(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Item for &str {
    fn well_formed(&self) -> bool {
        !self.trim().is_empty()
    }
}

impl Item for u64 {}
impl Item for i64 {}

/// One-hot encoder over a fitted item vocabulary.
///
/// `fit` derives the vocabulary from the given transactions; `transform`
/// produces a rows-by-vocabulary boolean matrix where a cell marks the item's
/// presence in the transaction. Duplicates within a transaction collapse to
/// presence, and items unknown to the fitted vocabulary are simply absent
/// columns for that transaction.
#[derive(Debug, Clone)]
pub struct TransactionEncoder<I> {
    vocabulary: Vec<I>,
    index: HashMap<I, usize>,
}

impl<I: Item> TransactionEncoder<I> {
    /// Derive a sorted, deduplicated vocabulary from the transactions.
    pub fn fit(transactions: &[Vec<I>]) -> Result<Self, MiningError> {
        let mut items = BTreeSet::new();
        for (index, transaction) in transactions.iter().enumerate() {
            for item in transaction {
                if !item.well_formed() {
                    return Err(MiningError::InvalidInput {
                        index,
                        reason: format!("malformed item label {item:?}"),
                    });
                }
                items.insert(item.clone());
            }
        }

        let vocabulary: Vec<I> = items.into_iter().collect();
        let index = vocabulary
            .iter()
            .enumerate()
            .map(|(position, item)| (item.clone(), position))
            .collect();

        Ok(Self { vocabulary, index })
    }

    /// Items of the fitted vocabulary, in column order.
    pub fn vocabulary(&self) -> &[I] {
        &self.vocabulary
    }

    /// Encode transactions against the fitted vocabulary.
    ///
    /// Empty transactions are legal and produce an all-false row.
    pub fn transform(&self, transactions: &[Vec<I>]) -> Result<Array2<bool>, MiningError> {
        let mut matrix = Array2::from_elem((transactions.len(), self.vocabulary.len()), false);
        for (row, transaction) in transactions.iter().enumerate() {
            for item in transaction {
                if !item.well_formed() {
                    return Err(MiningError::InvalidInput {
                        index: row,
                        reason: format!("malformed item label {item:?}"),
                    });
                }
                if let Some(&column) = self.index.get(item) {
                    matrix[[row, column]] = true;
                }
            }
        }
        Ok(matrix)
    }

    /// Fit a vocabulary and encode the same transactions in one step.
    pub fn fit_transform(transactions: &[Vec<I>]) -> Result<(Self, Array2<bool>), MiningError> {
        let encoder = Self::fit(transactions)?;
        let matrix = encoder.transform(transactions)?;
        Ok((encoder, matrix))
    }
}

/// Per-column mean of a membership matrix: the support of each single item.
pub fn column_means(matrix: &Array2<bool>) -> Vec<f64> {
    let rows = matrix.nrows();
    if rows == 0 {
        return vec![0.0; matrix.ncols()];
    }
    matrix
        .columns()
        .into_iter()
        .map(|column| column.iter().filter(|&&present| present).count() as f64 / rows as f64)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn txn(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fit_sorts_and_dedupes_vocabulary() {
        let transactions = vec![txn(&["beta", "alpha"]), txn(&["gamma", "alpha"])];
        let encoder = TransactionEncoder::fit(&transactions).unwrap();
        assert_eq!(encoder.vocabulary(), &["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_transform_marks_presence() {
        let transactions = vec![txn(&["a", "b"]), txn(&["b", "c"]), txn(&[])];
        let (encoder, matrix) = TransactionEncoder::fit_transform(&transactions).unwrap();

        assert_eq!(encoder.vocabulary(), &["a", "b", "c"]);
        assert_eq!(matrix.shape(), &[3, 3]);
        assert_eq!(matrix[[0, 0]], true);
        assert_eq!(matrix[[0, 1]], true);
        assert_eq!(matrix[[0, 2]], false);
        // empty transaction is an all-false row
        assert!(matrix.row(2).iter().all(|&present| !present));
    }

    #[test]
    fn test_duplicates_collapse_to_presence() {
        let transactions = vec![txn(&["a", "a", "a"])];
        let (encoder, matrix) = TransactionEncoder::fit_transform(&transactions).unwrap();
        assert_eq!(encoder.vocabulary(), &["a"]);
        assert_eq!(matrix[[0, 0]], true);
        assert_eq!(column_means(&matrix), vec![1.0]);
    }

    #[test]
    fn test_unknown_items_are_absent_columns() {
        let fitted = vec![txn(&["a", "b"])];
        let encoder = TransactionEncoder::fit(&fitted).unwrap();

        let matrix = encoder.transform(&[txn(&["b", "mystery"])]).unwrap();
        assert_eq!(matrix.shape(), &[1, 2]);
        assert_eq!(matrix[[0, 0]], false);
        assert_eq!(matrix[[0, 1]], true);
    }

    #[test]
    fn test_malformed_label_names_transaction_index() {
        let transactions = vec![txn(&["a"]), txn(&["b", "  "])];
        let err = TransactionEncoder::fit(&transactions).unwrap_err();
        match err {
            MiningError::InvalidInput { index, .. } => assert_eq!(index, 1),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_input_is_legal() {
        let transactions: Vec<Vec<String>> = Vec::new();
        let (encoder, matrix) = TransactionEncoder::fit_transform(&transactions).unwrap();
        assert!(encoder.vocabulary().is_empty());
        assert_eq!(matrix.shape(), &[0, 0]);
        assert!(column_means(&matrix).is_empty());
    }

    #[test]
    fn test_column_means() {
        let transactions = vec![txn(&["a", "b"]), txn(&["a"]), txn(&["b"]), txn(&["a"])];
        let (_, matrix) = TransactionEncoder::fit_transform(&transactions).unwrap();
        assert_eq!(column_means(&matrix), vec![0.75, 0.5]);
    }
}
