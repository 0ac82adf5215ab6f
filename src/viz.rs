//! Chart rendering with Plotters for the mined tables

use plotters::prelude::*;

use crate::aggregate::{SupportTable, WindowSupport};
use crate::rules::{label, AssociationRule};

/// Color palette cycled across chart series
const SERIES_COLORS: [RGBColor; 5] = [
    RED,
    BLUE,
    GREEN,
    MAGENTA,
    CYAN,
];

/// How many rules / products the charts show
const TOP_RULES: usize = 10;
const TOP_PRODUCTS: usize = 5;

/// Draw a bar chart of the strongest rules by lift.
///
/// Bars are indexed; the index-to-rule mapping is printed to the console by
/// [`print_rule_summary`].
pub fn create_rule_chart(
    rules: &[AssociationRule<String>],
    output_path: &str,
) -> crate::Result<()> {
    let ranked = rank_rules(rules);
    if ranked.is_empty() {
        anyhow::bail!("no rules to chart");
    }

    let max_lift = ranked
        .iter()
        .map(|r| r.lift)
        .filter(|l| l.is_finite())
        .fold(1.0f64, f64::max);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Top Association Rules by Lift", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..ranked.len() as f64, 0f64..(max_lift * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Rule Index")
        .y_desc("Lift")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (position, rule) in ranked.iter().enumerate() {
        let color = &SERIES_COLORS[position % SERIES_COLORS.len()];
        let height = if rule.lift.is_finite() { rule.lift } else { max_lift };
        chart.draw_series(std::iter::once(Rectangle::new(
            [
                (position as f64 + 0.1, 0.0),
                (position as f64 + 0.9, height),
            ],
            color.filled(),
        )))?;
    }

    root.present()?;
    println!("Rule chart saved to: {}", output_path);

    Ok(())
}

/// Draw per-window support trajectories for the leading products.
pub fn create_support_chart(table: &SupportTable<String>, output_path: &str) -> crate::Result<()> {
    let leaders = leading_products(table);
    if leaders.is_empty() {
        anyhow::bail!("no products to chart");
    }

    let max_support = leaders
        .iter()
        .flat_map(|&record| record.supports.iter())
        .filter_map(|s| s.value())
        .fold(0.0f64, f64::max);

    let root = BitMapBackend::new(output_path, (800, 600)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .caption("Product Support by Window", ("sans-serif", 30))
        .margin(10)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(0f64..table.columns.len() as f64, 0f64..(max_support * 1.1))?;

    chart
        .configure_mesh()
        .x_desc("Window Index")
        .y_desc("Support")
        .axis_desc_style(("sans-serif", 15))
        .draw()?;

    for (series, record) in leaders.iter().enumerate() {
        let color = SERIES_COLORS[series % SERIES_COLORS.len()];
        let points: Vec<(f64, f64)> = record
            .supports
            .iter()
            .enumerate()
            .filter_map(|(window, support)| support.value().map(|v| (window as f64, v)))
            .collect();

        chart
            .draw_series(LineSeries::new(points.clone(), &color))?
            .label(record.item.clone())
            .legend(move |(x, y)| {
                Rectangle::new([(x, y - 4), (x + 10, y + 6)], color.filled())
            });
        chart.draw_series(
            points
                .iter()
                .map(|&point| Circle::new(point, 3, color.filled())),
        )?;
    }

    chart.configure_series_labels().draw()?;

    root.present()?;
    println!("Support chart saved to: {}", output_path);

    Ok(())
}

/// Print the strongest rules with their statistics.
pub fn print_rule_summary(rules: &[AssociationRule<String>]) {
    println!("\n=== Top Rules by Lift ===");
    for (position, rule) in rank_rules(rules).iter().enumerate() {
        println!(
            "  {:2}. {} => {} (support {:.4}, confidence {:.3}, lift {:.3})",
            position,
            label(&rule.antecedent),
            label(&rule.consequent),
            rule.support,
            rule.confidence,
            rule.lift
        );
    }
}

/// Print the per-window support of the leading products.
pub fn print_support_summary(table: &SupportTable<String>) {
    println!("\n=== Leading Products ===");
    for record in leading_products(table) {
        let cells: Vec<String> = record
            .supports
            .iter()
            .map(|support| match support {
                WindowSupport::Observed(value) => format!("{value:.4}"),
                WindowSupport::NotObserved => "-".to_string(),
            })
            .collect();
        println!("  {}: {}", record.item, cells.join(" | "));
    }
}

/// Generate the full chart report: rule chart, support chart, console stats.
pub fn generate_chart_report(
    rules: &[AssociationRule<String>],
    table: &SupportTable<String>,
    base_output_path: &str,
) -> crate::Result<()> {
    create_rule_chart(rules, base_output_path)?;

    let support_chart_path = base_output_path.replace(".png", "_support.png");
    create_support_chart(table, &support_chart_path)?;

    print_rule_summary(rules);
    print_support_summary(table);

    Ok(())
}

fn rank_rules(rules: &[AssociationRule<String>]) -> Vec<&AssociationRule<String>> {
    let mut ranked: Vec<&AssociationRule<String>> = rules.iter().collect();
    ranked.sort_by(|a, b| {
        b.lift
            .partial_cmp(&a.lift)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(TOP_RULES);
    ranked
}

fn leading_products(table: &SupportTable<String>) -> Vec<&crate::aggregate::SupportRecord<String>> {
    let mut ranked: Vec<_> = table.records.iter().collect();
    ranked.sort_by(|a, b| {
        let a_support = a.supports.first().and_then(|s| s.value()).unwrap_or(0.0);
        let b_support = b.supports.first().and_then(|s| s.value()).unwrap_or(0.0);
        b_support
            .partial_cmp(&a_support)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    ranked.truncate(TOP_PRODUCTS);
    ranked
}
