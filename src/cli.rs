//! Command-line interface definitions and argument parsing

use chrono::{NaiveDate, Utc};
use clap::Parser;

use crate::rules::Metric;

/// Market-basket mining CLI producing association-rule and per-window
/// product-support tables from an order history
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the input orders CSV file
    #[arg(short, long, default_value = "orders.csv")]
    pub input: String,

    /// Output path for the association-rule table
    #[arg(long, default_value = "rules.csv")]
    pub rules_output: String,

    /// Output path for the per-window support table
    #[arg(long, default_value = "support.csv")]
    pub support_output: String,

    /// Minimum support for an itemset to count as frequent
    #[arg(long, default_value = "0.001")]
    pub min_support: f64,

    /// Maximum itemset length explored by the miner
    #[arg(long, default_value = "3")]
    pub max_len: usize,

    /// Metric a rule must clear: support, confidence or lift
    #[arg(long, default_value = "support")]
    pub metric: String,

    /// Minimum value of the chosen metric for a rule to be kept
    #[arg(long, default_value = "0.0")]
    pub min_threshold: f64,

    /// Trailing window lengths in days as a comma-separated list
    /// Example: --windows "30,90,180,365,730"
    #[arg(short, long, default_value = "30,90,180,365,730")]
    pub windows: String,

    /// Reference date (YYYY-MM-DD) the trailing windows count back from;
    /// defaults to today
    #[arg(long)]
    pub reference_date: Option<String>,

    /// Only produce the association-rule table
    #[arg(long)]
    pub rules_only: bool,

    /// Only produce the per-window support table
    #[arg(long)]
    pub support_only: bool,

    /// Output path for the chart report (PNG); charts are skipped when unset
    #[arg(long)]
    pub chart: Option<String>,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the window lengths from the comma-separated string.
    pub fn parse_windows(&self) -> crate::Result<Vec<i64>> {
        let mut days = Vec::new();
        for part in self.windows.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            let value: i64 = part
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid window length: {}", part))?;
            if value < 1 {
                anyhow::bail!("window lengths must be positive, got {}", value);
            }
            days.push(value);
        }
        if days.is_empty() {
            anyhow::bail!("at least one trailing window is required");
        }
        Ok(days)
    }

    /// Parse the rule metric name.
    pub fn parse_metric(&self) -> crate::Result<Metric> {
        self.metric
            .parse()
            .map_err(|reason| anyhow::anyhow!("{}", reason))
    }

    /// Parse the reference date, defaulting to today.
    pub fn parse_reference_date(&self) -> crate::Result<NaiveDate> {
        match &self.reference_date {
            Some(raw) => NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .map_err(|_| anyhow::anyhow!("invalid reference date: {}", raw)),
            None => Ok(Utc::now().date_naive()),
        }
    }
}
