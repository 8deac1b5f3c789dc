use std::path::Path;

use comfy_table::{Cell, Table};

use crate::config;
use crate::error::Result;
use crate::models::Direction;

/// Load + validate a rules file and print the normalized catalog.
/// Simplified-syntax shorthand and account aliases are shown fully
/// expanded, so this doubles as a config check.
pub fn list(rules: &str) -> Result<()> {
    let config = config::load_config(Path::new(rules))?;

    let mut table = Table::new();
    table.set_header(vec!["Direction", "Pattern", "Debit", "Credit", "Description"]);
    for (direction, rules) in [
        (Direction::Income, &config.ruleset.income),
        (Direction::Expense, &config.ruleset.expense),
    ] {
        for rule in rules {
            table.add_row(vec![
                Cell::new(direction.as_str()),
                Cell::new(&rule.pattern),
                Cell::new(&rule.debit_account),
                Cell::new(&rule.credit_account),
                Cell::new(rule.description.as_deref().unwrap_or("")),
            ]);
        }
    }
    let total = config.ruleset.income.len() + config.ruleset.expense.len();
    println!("{total} rule(s) in {rules}\n{table}");
    Ok(())
}
