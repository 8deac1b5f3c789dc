use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::analytics::{self, AnalyticsReport};
use crate::cli::load_pipeline;
use crate::error::Result;
use crate::transformer;

pub fn run(input: &str, rules: &str, json: bool) -> Result<()> {
    let (config, txns) = load_pipeline(Path::new(input), Path::new(rules))?;
    let (_, records) = transformer::transform_with_metadata(&txns, &config)?;
    let report = analytics::build_report(&config.ruleset.catalog_keys(), &records);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render(&report);
    }
    Ok(())
}

pub fn render(report: &AnalyticsReport) {
    let c = &report.coverage_analysis;

    println!("{}", "Coverage".bold());
    println!(
        "  {} of {} rule(s) used ({}%), {} unused",
        c.rules_used, c.total_rules_defined, c.usage_percentage, c.rules_unused
    );
    println!(
        "  {} transaction(s): {} matched, {} unmatched",
        c.total_transactions, c.transactions_with_rules, c.transactions_without_rules
    );

    let d = &report.confidence_distribution;
    println!("\n{}", "Confidence".bold());
    println!(
        "  {} high (>= 0.9), {} medium, {} low (< 0.4)",
        d.high.to_string().green(),
        d.medium,
        d.low.to_string().red()
    );

    // Usage + effectiveness ranking, most-used first.
    let mut ranked: Vec<(&String, &analytics::RuleEffectiveness)> =
        report.rule_effectiveness.iter().collect();
    ranked.sort_by(|a, b| b.1.usage_count.cmp(&a.1.usage_count).then(a.0.cmp(b.0)));

    let mut table = Table::new();
    table.set_header(vec!["Rule", "Matches", "Avg Confidence"]);
    for (key, eff) in ranked {
        table.add_row(vec![
            Cell::new(key),
            Cell::new(eff.usage_count),
            Cell::new(format!("{:.1}", eff.avg_confidence)),
        ]);
    }
    println!("\n{}\n{table}", "Rule effectiveness".bold());

    if !report.unused_rules.is_empty() {
        println!("\n{}", "Unused rules (removal candidates)".bold());
        for key in &report.unused_rules {
            println!("  {}", key.yellow());
        }
    }

    let quality = &report.insights.rule_quality;
    if !quality.low_performing_rules.is_empty() {
        println!("\n{}", "Low-performing rules (avg confidence < 0.5)".bold());
        for key in &quality.low_performing_rules {
            println!("  {}", key.red());
        }
    }
}
