//! BasketForge: market-basket analysis of retail order histories
//!
//! This library mines frequent itemsets and association rules from order
//! data (Apriori) and aggregates per-product support over trailing time
//! windows, producing flat tables for a downstream reporting store.

pub mod aggregate;
pub mod cli;
pub mod data;
pub mod encoder;
pub mod error;
pub mod mining;
pub mod rules;
pub mod viz;

// Re-export public items for easier access
pub use aggregate::{aggregate, SupportTable, TransactionWindow, WindowSupport, ALL_WINDOW};
pub use cli::Args;
pub use data::{load_orders, window_transactions, Order, DEFAULT_WINDOW_DAYS};
pub use encoder::{column_means, Item, TransactionEncoder};
pub use error::MiningError;
pub use mining::{apriori, FrequentItemset};
pub use rules::{generate_rules, label, AssociationRule, Metric, EMPTY_LABEL};

/// Common result type used throughout the application
pub type Result<T> = anyhow::Result<T>;
