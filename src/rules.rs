//! Association-rule derivation from frequent itemsets, plus the flat label
//! normalization used by the storage sink.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use itertools::Itertools;

use crate::encoder::Item;
use crate::error::MiningError;
use crate::mining::{meets_threshold, FrequentItemset};

/// Label emitted for an itemset with no parseable content.
///
/// The caller decides whether to drop or flag rules carrying it; the
/// normalizer itself never fails.
pub const EMPTY_LABEL: &str = "";

/// Metric a rule must clear to be emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Support,
    Confidence,
    Lift,
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "support" => Ok(Metric::Support),
            "confidence" => Ok(Metric::Confidence),
            "lift" => Ok(Metric::Lift),
            other => Err(format!(
                "unknown metric '{other}', expected support, confidence or lift"
            )),
        }
    }
}

/// A directional rule between two disjoint halves of one frequent itemset.
#[derive(Debug, Clone, PartialEq)]
pub struct AssociationRule<I> {
    pub antecedent: BTreeSet<I>,
    pub consequent: BTreeSet<I>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    pub conviction: f64,
}

impl<I> AssociationRule<I> {
    pub fn metric_value(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Support => self.support,
            Metric::Confidence => self.confidence,
            Metric::Lift => self.lift,
        }
    }
}

/// Derive every rule whose chosen metric clears `min_threshold`.
///
/// Each frequent itemset of two or more members contributes one rule per
/// non-empty strict subset (the antecedent), with the complement as
/// consequent. Subset supports come from the mined set itself, which the
/// Apriori property keeps closed under subsets. A threshold of 0.0 on the
/// support metric therefore enumerates every rule with its statistics
/// attached.
pub fn generate_rules<I: Item>(
    itemsets: &[FrequentItemset<I>],
    metric: Metric,
    min_threshold: f64,
) -> Result<Vec<AssociationRule<I>>, MiningError> {
    let supports: HashMap<BTreeSet<I>, f64> = itemsets
        .iter()
        .map(|f| (f.items.clone(), f.support))
        .collect();

    let mut rules = Vec::new();
    for itemset in itemsets.iter().filter(|f| f.len() >= 2) {
        let members: Vec<&I> = itemset.items.iter().collect();

        // Bitmask over the sorted members: every non-empty strict subset,
        // in a fixed order.
        for mask in 1..(1u64 << members.len()) - 1 {
            let mut antecedent = BTreeSet::new();
            let mut consequent = BTreeSet::new();
            for (position, &member) in members.iter().enumerate() {
                if mask & (1 << position) != 0 {
                    antecedent.insert(member.clone());
                } else {
                    consequent.insert(member.clone());
                }
            }

            let antecedent_support = subset_support(&supports, &antecedent)?;
            let consequent_support = subset_support(&supports, &consequent)?;
            let support = itemset.support;

            let confidence = support / antecedent_support;
            let lift = confidence / consequent_support;
            let leverage = support - antecedent_support * consequent_support;
            let conviction = if confidence >= 1.0 - f64::EPSILON {
                f64::INFINITY
            } else {
                (1.0 - consequent_support) / (1.0 - confidence)
            };

            let rule = AssociationRule {
                antecedent,
                consequent,
                antecedent_support,
                consequent_support,
                support,
                confidence,
                lift,
                leverage,
                conviction,
            };

            if meets_threshold(rule.metric_value(metric), min_threshold) {
                rules.push(rule);
            }
        }
    }

    Ok(rules)
}

fn subset_support<I: Item>(
    supports: &HashMap<BTreeSet<I>, f64>,
    subset: &BTreeSet<I>,
) -> Result<f64, MiningError> {
    supports
        .get(subset)
        .copied()
        .ok_or_else(|| MiningError::MissingSupport(label(subset)))
}

/// Flatten an itemset into its storage label.
///
/// A single item yields its bare label; multiple items are joined with
/// ", " in sorted order. An empty set yields [`EMPTY_LABEL`] rather than
/// failing, so no rule content is ever silently dropped.
pub fn label<I: Item>(items: &BTreeSet<I>) -> String {
    if items.is_empty() {
        return EMPTY_LABEL.to_string();
    }
    items.iter().join(", ")
}
