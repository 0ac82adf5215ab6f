//! BasketForge: market-basket mining CLI over retail order histories
//!
//! This is the main entrypoint that orchestrates order loading, frequent
//! itemset mining, rule generation, window aggregation and table export.

use anyhow::Result;
use basketforge::{
    aggregate, apriori, generate_rules, load_orders, viz, window_transactions, Args,
    TransactionEncoder, ALL_WINDOW,
};
use basketforge::aggregate::{SupportTable, TransactionWindow};
use basketforge::data::{write_rule_table, write_support_table};
use basketforge::rules::AssociationRule;
use clap::Parser;
use std::time::Instant;

fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse();

    if args.rules_only && args.support_only {
        anyhow::bail!("--rules-only and --support-only are mutually exclusive");
    }

    if args.verbose {
        println!("BasketForge - Market-Basket Mining over Order Histories");
        println!("=======================================================\n");
    }

    let start_time = Instant::now();

    // Step 1: Load the order history
    if args.verbose {
        println!("Step 1: Loading order history");
        println!("  Input file: {}", args.input);
    }

    let load_start = Instant::now();
    let orders = load_orders(&args.input)?;
    let load_time = load_start.elapsed();

    println!("✓ Orders loaded: {}", orders.len());
    if args.verbose {
        println!("  Loading time: {:.2}s", load_time.as_secs_f64());
    }

    // Step 2: Slice the history into trailing windows
    let reference_date = args.parse_reference_date()?;
    let window_days = args.parse_windows()?;
    let windows = window_transactions(&orders, &window_days, reference_date);

    if args.verbose {
        println!("\nStep 2: Window slicing");
        println!("  Reference date: {}", reference_date);
        for window in &windows {
            println!("  Window '{}': {} orders", window.name, window.transactions.len());
        }
    }

    // Step 3: Mine rules over the unconstrained window
    let rules = if args.support_only {
        None
    } else {
        Some(run_rule_mining(&args, &windows)?)
    };

    // Step 4: Aggregate per-window product supports
    let support = if args.rules_only {
        None
    } else {
        Some(run_support_analysis(&args, &windows)?)
    };

    // Step 5: Optional chart report
    if let Some(chart_path) = &args.chart {
        match (&rules, &support) {
            (Some(rules), Some(support)) => {
                viz::generate_chart_report(rules, support, chart_path)?;
            }
            _ => println!("Skipping charts: both tables are required"),
        }
    }

    let total_time = start_time.elapsed();
    println!("\n=== Pipeline Complete ===");
    println!("Total processing time: {:.2}s", total_time.as_secs_f64());

    Ok(())
}

/// Mine frequent itemsets on the all-time window and export the rule table.
fn run_rule_mining(
    args: &Args,
    windows: &[TransactionWindow<String>],
) -> Result<Vec<AssociationRule<String>>> {
    let all_time = windows
        .iter()
        .find(|w| w.name == ALL_WINDOW)
        .ok_or_else(|| anyhow::anyhow!("no unconstrained window available"))?;

    if args.verbose {
        println!("\nStep 3: Mining association rules");
        println!("  Minimum support: {}", args.min_support);
        println!("  Maximum itemset length: {}", args.max_len);
        println!("  Metric: {} >= {}", args.metric, args.min_threshold);
    }

    let mining_start = Instant::now();

    let (encoder, matrix) = TransactionEncoder::fit_transform(&all_time.transactions)?;
    let itemsets = apriori(&matrix, encoder.vocabulary(), args.min_support, args.max_len)?;
    let rules = generate_rules(&itemsets, args.parse_metric()?, args.min_threshold)?;

    let mining_time = mining_start.elapsed();

    write_rule_table(&rules, &args.rules_output)?;

    println!(
        "✓ Rule table: {} rules from {} frequent itemsets over {} products",
        rules.len(),
        itemsets.len(),
        encoder.vocabulary().len()
    );
    if args.verbose {
        println!("  Mining time: {:.2}s", mining_time.as_secs_f64());
        println!("  Saved to: {}", args.rules_output);
    }

    Ok(rules)
}

/// Aggregate per-window supports and export the support table.
fn run_support_analysis(
    args: &Args,
    windows: &[TransactionWindow<String>],
) -> Result<SupportTable<String>> {
    if args.verbose {
        println!("\nStep 4: Aggregating per-window product supports");
    }

    let aggregate_start = Instant::now();
    let table = aggregate(windows)?;
    let aggregate_time = aggregate_start.elapsed();

    write_support_table(&table, &args.support_output)?;

    println!(
        "✓ Support table: {} products across {} windows",
        table.records.len(),
        table.columns.len()
    );
    if args.verbose {
        println!("  Aggregation time: {:.2}s", aggregate_time.as_secs_f64());
        println!("  Saved to: {}", args.support_output);
    }

    Ok(table)
}
