use std::path::Path;

use crate::analytics;
use crate::cli::{analyze, load_pipeline};
use crate::error::Result;
use crate::transformer;

pub fn run(
    input: &str,
    rules: &str,
    output: Option<&str>,
    analytics_summary: bool,
    analytics_json: Option<&str>,
) -> Result<()> {
    let (config, txns) = load_pipeline(Path::new(input), Path::new(rules))?;

    let capture = analytics_summary || analytics_json.is_some();
    let (lines, records) = if capture {
        transformer::transform_with_metadata(&txns, &config)?
    } else {
        (transformer::transform_transactions(&txns, &config)?, vec![])
    };

    // Precedence: CLI flag, then the rules file's output.path, then the
    // legacy default.
    let out_path = output
        .map(str::to_string)
        .or_else(|| config.output_path.clone())
        .unwrap_or_else(|| "output.txt".to_string());
    std::fs::write(&out_path, lines.join("\n"))?;

    let unmatched = txns.len() - lines.len();
    println!(
        "Wrote {} posting(s) to {out_path} ({} transaction(s), {unmatched} unmatched)",
        lines.len(),
        txns.len()
    );

    if capture {
        let report = analytics::build_report(&config.ruleset.catalog_keys(), &records);
        if let Some(path) = analytics_json {
            std::fs::write(path, format!("{}\n", serde_json::to_string_pretty(&report)?))?;
            println!("Wrote analytics report to {path}");
        }
        if analytics_summary {
            println!();
            analyze::render(&report);
        }
    }
    Ok(())
}
