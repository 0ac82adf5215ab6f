//! Per-window support computation and the wide-table merge keyed on the
//! all-time vocabulary.

use rayon::prelude::*;

use crate::encoder::{column_means, Item, TransactionEncoder};
use crate::error::MiningError;

/// Name of the unconstrained window anchoring the merge.
pub const ALL_WINDOW: &str = "all";

/// A named, time-bounded slice of the transaction history.
#[derive(Debug, Clone)]
pub struct TransactionWindow<I> {
    pub name: String,
    pub transactions: Vec<Vec<I>>,
}

/// Support of one item within one window.
///
/// `NotObserved` marks an item missing from the window's vocabulary
/// entirely, which is a different state than a zero support and must stay
/// distinguishable all the way into the sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum WindowSupport {
    Observed(f64),
    NotObserved,
}

impl WindowSupport {
    pub fn value(self) -> Option<f64> {
        match self {
            WindowSupport::Observed(support) => Some(support),
            WindowSupport::NotObserved => None,
        }
    }
}

/// One row of the support table.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportRecord<I> {
    pub item: I,
    /// Parallel to [`SupportTable::columns`].
    pub supports: Vec<WindowSupport>,
}

/// Wide per-item support table across all windows.
#[derive(Debug, Clone, PartialEq)]
pub struct SupportTable<I> {
    /// Column names: `support_all` for the unconstrained window,
    /// `support_<name>` otherwise, in input window order.
    pub columns: Vec<String>,
    /// One row per item of the all-time vocabulary, in vocabulary order.
    pub records: Vec<SupportRecord<I>>,
}

/// Encode every window independently and merge the per-item supports.
///
/// The window named [`ALL_WINDOW`] supplies the universal key set: every item
/// it has ever seen gets a row, and items absent from a narrower window are
/// `NotObserved` there. A window with zero transactions contributes an
/// all-`NotObserved` column rather than failing. Windows are mutually
/// independent and read-only, so they are encoded in a fork-join; the
/// order-preserving collect keeps the merge deterministic.
pub fn aggregate<I>(windows: &[TransactionWindow<I>]) -> Result<SupportTable<I>, MiningError>
where
    I: Item + Send + Sync,
{
    let anchor = windows
        .iter()
        .position(|w| w.name == ALL_WINDOW)
        .ok_or_else(|| {
            MiningError::Configuration(format!("no '{ALL_WINDOW}' window supplied"))
        })?;
    for (position, window) in windows.iter().enumerate() {
        if windows[..position].iter().any(|w| w.name == window.name) {
            return Err(MiningError::Configuration(format!(
                "duplicate window name '{}'",
                window.name
            )));
        }
    }

    let per_window: Vec<(Vec<I>, Vec<f64>)> = windows
        .par_iter()
        .map(|window| {
            let (encoder, matrix) = TransactionEncoder::fit_transform(&window.transactions)?;
            let means = column_means(&matrix);
            Ok((encoder.vocabulary().to_vec(), means))
        })
        .collect::<Result<_, MiningError>>()?;

    let columns = windows
        .iter()
        .map(|window| format!("support_{}", window.name))
        .collect();

    let (key_items, _) = &per_window[anchor];
    let records = key_items
        .iter()
        .map(|item| {
            let supports = per_window
                .iter()
                .map(|(vocabulary, means)| match vocabulary.binary_search(item) {
                    Ok(column) => WindowSupport::Observed(means[column]),
                    Err(_) => WindowSupport::NotObserved,
                })
                .collect();
            SupportRecord {
                item: item.clone(),
                supports,
            }
        })
        .collect();

    Ok(SupportTable { columns, records })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn window(name: &str, transactions: &[&[&str]]) -> TransactionWindow<String> {
        TransactionWindow {
            name: name.to_string(),
            transactions: transactions
                .iter()
                .map(|t| t.iter().map(|s| s.to_string()).collect())
                .collect(),
        }
    }

    fn row<'t>(table: &'t SupportTable<String>, item: &str) -> &'t SupportRecord<String> {
        table
            .records
            .iter()
            .find(|r| r.item == item)
            .expect("missing item row")
    }

    #[test]
    fn test_merge_keyed_on_all_time_vocabulary() {
        let windows = vec![
            window("all", &[&["A", "B"], &["A"], &["C"]]),
            window("30", &[&["A"]]),
        ];
        let table = aggregate(&windows).unwrap();

        assert_eq!(table.columns, vec!["support_all", "support_30"]);
        assert_eq!(table.records.len(), 3);

        let a = row(&table, "A");
        assert_eq!(a.supports[0], WindowSupport::Observed(2.0 / 3.0));
        assert_eq!(a.supports[1], WindowSupport::Observed(1.0));

        // B and C were never seen in the 30-day window
        assert_eq!(row(&table, "B").supports[1], WindowSupport::NotObserved);
        assert_eq!(row(&table, "C").supports[1], WindowSupport::NotObserved);
    }

    #[test]
    fn test_every_all_time_item_gets_exactly_one_row() {
        let windows = vec![
            window("all", &[&["A", "B", "C"], &["B", "D"]]),
            window("90", &[&["B"]]),
            window("30", &[]),
        ];
        let table = aggregate(&windows).unwrap();

        let mut items: Vec<&str> = table.records.iter().map(|r| r.item.as_str()).collect();
        items.sort();
        items.dedup();
        assert_eq!(items, vec!["A", "B", "C", "D"]);
        assert_eq!(table.records.len(), 4);
    }

    #[test]
    fn test_empty_window_is_all_not_observed() {
        let windows = vec![
            window("all", &[&["A"], &["B"]]),
            window("30", &[]),
        ];
        let table = aggregate(&windows).unwrap();

        for record in &table.records {
            assert_eq!(record.supports[1], WindowSupport::NotObserved);
        }
    }

    #[test]
    fn test_missing_all_window_is_rejected() {
        let windows = vec![window("30", &[&["A"]])];
        assert!(matches!(
            aggregate(&windows),
            Err(MiningError::Configuration(_))
        ));
    }

    #[test]
    fn test_duplicate_window_names_are_rejected() {
        let windows = vec![
            window("all", &[&["A"]]),
            window("30", &[&["A"]]),
            window("30", &[&["A"]]),
        ];
        assert!(matches!(
            aggregate(&windows),
            Err(MiningError::Configuration(_))
        ));
    }

    #[test]
    fn test_deterministic_across_runs() {
        let windows = vec![
            window("all", &[&["A", "B"], &["C"], &["A"]]),
            window("90", &[&["C"], &["A"]]),
            window("30", &[&["C"]]),
        ];
        let first = aggregate(&windows).unwrap();
        let second = aggregate(&windows).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_all_window_yields_empty_table() {
        let windows = vec![window("all", &[]), window("30", &[&["A"]])];
        let table = aggregate(&windows).unwrap();
        assert!(table.records.is_empty());
        assert_eq!(table.columns.len(), 2);
    }
}
