//! Order-history loading and result-table export using Polars.
//!
//! The warehouse extract arrives as a CSV with one row per order and the
//! purchased product labels joined into a single `products` field; the two
//! result tables leave as CSVs shaped for the downstream reporting store.

use std::fs::File;

use anyhow::Context;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;

use crate::aggregate::{SupportTable, TransactionWindow, ALL_WINDOW};
use crate::rules::{label, AssociationRule};

/// Trailing window lengths, in days, the original reporting table tracks.
pub const DEFAULT_WINDOW_DAYS: [i64; 5] = [30, 90, 180, 365, 730];

/// One order: purchase date plus the product labels bought together.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub date: NaiveDate,
    pub products: Vec<String>,
}

/// Load orders from a CSV file with `date_created` and `products` columns.
///
/// The `products` field holds the order's labels joined with ", "; an empty
/// field is an order with no mineable items, which is legal.
pub fn load_orders(path: &str) -> crate::Result<Vec<Order>> {
    let df = LazyCsvReader::new(path)
        .finish()?
        .select([col("date_created"), col("products")])
        .filter(col("date_created").is_not_null())
        .collect()
        .with_context(|| format!("failed to read orders from {path}"))?;

    let dates = df.column("date_created")?.str()?;
    let products = df.column("products")?.str()?;

    let mut orders = Vec::with_capacity(df.height());
    for (row, (date, field)) in dates.into_iter().zip(products.into_iter()).enumerate() {
        let Some(date) = date else { continue };
        orders.push(Order {
            date: parse_order_date(date, row)?,
            products: split_products(field.unwrap_or("")),
        });
    }

    Ok(orders)
}

/// Parse the order timestamp, accepting full datetimes or bare dates.
fn parse_order_date(raw: &str, row: usize) -> crate::Result<NaiveDate> {
    if let Ok(datetime) = DateTime::parse_from_rfc3339(raw) {
        return Ok(datetime.date_naive());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Ok(datetime.date());
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Ok(datetime.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("order row {row}: unrecognized date '{raw}'"))
}

fn split_products(field: &str) -> Vec<String> {
    if field.trim().is_empty() {
        return Vec::new();
    }
    field.split(',').map(|label| label.trim().to_string()).collect()
}

/// Slice one loaded history into the unconstrained window plus one trailing
/// window per requested length, counted back from `reference_date`.
pub fn window_transactions(
    orders: &[Order],
    window_days: &[i64],
    reference_date: NaiveDate,
) -> Vec<TransactionWindow<String>> {
    let mut windows = Vec::with_capacity(window_days.len() + 1);
    windows.push(TransactionWindow {
        name: ALL_WINDOW.to_string(),
        transactions: orders.iter().map(|o| o.products.clone()).collect(),
    });

    for &days in window_days {
        let cutoff = reference_date - chrono::Duration::days(days);
        windows.push(TransactionWindow {
            name: days.to_string(),
            transactions: orders
                .iter()
                .filter(|o| o.date >= cutoff)
                .map(|o| o.products.clone())
                .collect(),
        });
    }

    windows
}

/// Render the rule table as a DataFrame shaped for the reporting store.
pub fn rule_frame(rules: &[AssociationRule<String>]) -> crate::Result<DataFrame> {
    let antecedents: Vec<String> = rules.iter().map(|r| label(&r.antecedent)).collect();
    let consequents: Vec<String> = rules.iter().map(|r| label(&r.consequent)).collect();

    let df = DataFrame::new(vec![
        Series::new("antecedents", antecedents),
        Series::new("consequents", consequents),
        Series::new(
            "antecedent_support",
            rules.iter().map(|r| r.antecedent_support).collect::<Vec<f64>>(),
        ),
        Series::new(
            "consequent_support",
            rules.iter().map(|r| r.consequent_support).collect::<Vec<f64>>(),
        ),
        Series::new("support", rules.iter().map(|r| r.support).collect::<Vec<f64>>()),
        Series::new(
            "confidence",
            rules.iter().map(|r| r.confidence).collect::<Vec<f64>>(),
        ),
        Series::new("lift", rules.iter().map(|r| r.lift).collect::<Vec<f64>>()),
        Series::new(
            "leverage",
            rules.iter().map(|r| r.leverage).collect::<Vec<f64>>(),
        ),
        Series::new(
            "conviction",
            rules.iter().map(|r| r.conviction).collect::<Vec<f64>>(),
        ),
    ])?;
    Ok(df)
}

/// Render the support table as a DataFrame; `NotObserved` cells become nulls.
pub fn support_frame(table: &SupportTable<String>) -> crate::Result<DataFrame> {
    let mut columns = Vec::with_capacity(table.columns.len() + 1);
    columns.push(Series::new(
        "product",
        table.records.iter().map(|r| r.item.clone()).collect::<Vec<String>>(),
    ));
    for (position, name) in table.columns.iter().enumerate() {
        let values: Vec<Option<f64>> = table
            .records
            .iter()
            .map(|r| r.supports[position].value())
            .collect();
        columns.push(Series::new(name.as_str(), values));
    }
    Ok(DataFrame::new(columns)?)
}

/// Write the rule table to a CSV file.
pub fn write_rule_table(rules: &[AssociationRule<String>], path: &str) -> crate::Result<()> {
    let mut df = rule_frame(rules)?;
    let file =
        File::create(path).with_context(|| format!("failed to create rule table {path}"))?;
    CsvWriter::new(file).finish(&mut df)?;
    Ok(())
}

/// Write the support table to a CSV file.
pub fn write_support_table(table: &SupportTable<String>, path: &str) -> crate::Result<()> {
    let mut df = support_frame(table)?;
    let file =
        File::create(path).with_context(|| format!("failed to create support table {path}"))?;
    CsvWriter::new(file).finish(&mut df)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::aggregate;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_test_csv() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "order_id,date_created,total,products").unwrap();
        writeln!(file, "1001,2024-01-05T09:12:00,34.50,\"Kombucha, Ginger Shot\"").unwrap();
        writeln!(file, "1002,2024-03-10 14:03:22,12.00,Kombucha").unwrap();
        writeln!(file, "1003,2024-06-01,55.90,\"Waterkefir, Ginger Shot\"").unwrap();
        writeln!(file, "1004,2024-06-20,8.75,Waterkefir").unwrap();
        file
    }

    #[test]
    fn test_load_orders() {
        let file = create_test_csv();
        let orders = load_orders(file.path().to_str().unwrap()).unwrap();

        assert_eq!(orders.len(), 4);
        assert_eq!(orders[0].date, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
        assert_eq!(orders[0].products, vec!["Kombucha", "Ginger Shot"]);
        assert_eq!(orders[2].products, vec!["Waterkefir", "Ginger Shot"]);
    }

    #[test]
    fn test_unparseable_date_is_an_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "order_id,date_created,total,products").unwrap();
        writeln!(file, "1001,last tuesday,10.0,Kombucha").unwrap();

        let result = load_orders(file.path().to_str().unwrap());
        assert!(result.is_err());
    }

    #[test]
    fn test_window_slicing() {
        let file = create_test_csv();
        let orders = load_orders(file.path().to_str().unwrap()).unwrap();
        let reference = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();

        let windows = window_transactions(&orders, &[30, 180], reference);
        assert_eq!(windows.len(), 3);
        assert_eq!(windows[0].name, "all");
        assert_eq!(windows[0].transactions.len(), 4);
        // 30 days back from 2024-06-30 covers the two June orders
        assert_eq!(windows[1].name, "30");
        assert_eq!(windows[1].transactions.len(), 2);
        // 180 days excludes only the January order
        assert_eq!(windows[2].name, "180");
        assert_eq!(windows[2].transactions.len(), 3);
    }

    #[test]
    fn test_support_table_round_trip_preserves_nulls() {
        let file = create_test_csv();
        let orders = load_orders(file.path().to_str().unwrap()).unwrap();
        let reference = NaiveDate::from_ymd_opt(2024, 6, 30).unwrap();
        let windows = window_transactions(&orders, &[30], reference);
        let table = aggregate(&windows).unwrap();

        let out = NamedTempFile::new().unwrap();
        let out_path = out.path().to_str().unwrap();
        write_support_table(&table, out_path).unwrap();

        let df = LazyCsvReader::new(out_path)
            .finish()
            .unwrap()
            .collect()
            .unwrap();
        // Ginger Shot, Kombucha, Waterkefir
        assert_eq!(df.height(), 3);
        // Kombucha was last bought March 10th, outside the 30-day window, so
        // its support_30 cell must be null, not zero
        let recent = df.column("support_30").unwrap();
        assert_eq!(recent.null_count(), 1);
    }

    #[test]
    fn test_rule_frame_shape() {
        use crate::mining::FrequentItemset;
        use crate::rules::{generate_rules, Metric};

        let itemsets = vec![
            FrequentItemset {
                items: ["A".to_string()].into_iter().collect(),
                support: 0.6,
            },
            FrequentItemset {
                items: ["B".to_string()].into_iter().collect(),
                support: 0.5,
            },
            FrequentItemset {
                items: ["A".to_string(), "B".to_string()].into_iter().collect(),
                support: 0.4,
            },
        ];
        let rules = generate_rules(&itemsets, Metric::Support, 0.0).unwrap();
        let df = rule_frame(&rules).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 9);
        assert!(df.column("confidence").is_ok());
        assert!(df.column("conviction").is_ok());
    }
}
