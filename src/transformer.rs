use chrono::NaiveDate;
use serde::Serialize;

use crate::config::Config;
use crate::error::{LedgerizeError, Result};
use crate::matcher::CompiledRules;
use crate::models::{Direction, RawRecord, Specificity, Transaction};
use crate::scorer;

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m-%d-%Y",
    "%m/%d/%Y",
    "%d %b %Y",
    "%b %d, %Y",
];

/// Lenient date parsing: ISO, slashed, US month-first, month names, with
/// or without a time-of-day suffix.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(d);
        }
    }
    // Retry on the date part alone for values like "2023-01-01 10:00".
    let first = raw.split_whitespace().next()?;
    if first != raw {
        for fmt in DATE_FORMATS {
            if let Ok(d) = NaiveDate::parse_from_str(first, fmt) {
                return Some(d);
            }
        }
    }
    None
}

/// Coerce an amount cell to a float, stripping thousands separators.
/// Unparseable amounts abort the batch.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let s = raw.replace(',', "");
    s.trim()
        .parse()
        .map_err(|_| LedgerizeError::Amount(raw.to_string()))
}

/// Turn raw reader records into typed transactions. Rows with an empty
/// date cell are dropped; a date or amount that cannot be parsed is fatal.
/// When the single signed amount column is absent, the amount is
/// deposit minus withdrawal.
pub fn normalize_transactions(rows: &[RawRecord]) -> Result<Vec<Transaction>> {
    let mut txns = Vec::with_capacity(rows.len());
    for row in rows {
        if row.date.trim().is_empty() {
            continue;
        }
        let date = parse_date(&row.date).ok_or_else(|| LedgerizeError::Date(row.date.clone()))?;
        let amount = match &row.amount {
            Some(raw) => parse_amount(raw)?,
            None => {
                let deposit = row.deposit.as_deref().map(parse_amount).transpose()?;
                let withdraw = row.withdraw.as_deref().map(parse_amount).transpose()?;
                deposit.unwrap_or(0.0) - withdraw.unwrap_or(0.0)
            }
        };
        txns.push(Transaction {
            date,
            description: row.description.clone(),
            amount,
        });
    }
    Ok(txns)
}

/// Stable ascending sort by date; rows on the same day keep input order.
pub fn sort_transactions(txns: &mut [Transaction]) {
    txns.sort_by_key(|t| t.date);
}

// ---------------------------------------------------------------------------
// Output formatting
// ---------------------------------------------------------------------------

/// Collapse every run of characters outside `[A-Za-z0-9 ]` to a single
/// space, then title-case.
fn clean_description(raw: &str) -> String {
    let mut cleaned = String::with_capacity(raw.len());
    let mut in_run = false;
    for c in raw.chars() {
        if c.is_ascii_alphanumeric() || c == ' ' {
            cleaned.push(c);
            in_run = false;
        } else if !in_run {
            cleaned.push(' ');
            in_run = true;
        }
    }
    title_case(&cleaned)
}

fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Transformation
// ---------------------------------------------------------------------------

/// Per-transaction analytics record emitted alongside the ledger output.
#[derive(Debug, Clone, Serialize)]
pub struct TxnRecord {
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub confidence_score: f64,
    pub matched_rule_type: Specificity,
    pub matched: bool,
    pub rule_key: String,
}

fn run(
    txns: &[Transaction],
    config: &Config,
    capture: bool,
) -> Result<(Vec<String>, Vec<TxnRecord>)> {
    let income = CompiledRules::compile(&config.ruleset.income)?;
    let expense = CompiledRules::compile(&config.ruleset.expense)?;

    let mut output = Vec::new();
    let mut records = Vec::new();

    for txn in txns {
        let formatted_date = txn.date.format("%Y/%m/%d").to_string();
        let direction = txn.direction();
        let compiled = match direction {
            Direction::Income => &income,
            Direction::Expense => &expense,
        };
        let rule = compiled.match_rule(&txn.description);
        let (confidence, specificity) = scorer::score(rule, &txn.description);

        if capture {
            records.push(TxnRecord {
                description: txn.description.clone(),
                amount: txn.amount,
                date: formatted_date.clone(),
                confidence_score: confidence,
                matched_rule_type: specificity,
                matched: rule.is_some(),
                rule_key: rule
                    .map(|r| r.key(direction))
                    .unwrap_or_else(|| "no_match".to_string()),
            });
        }

        // Unmatched transactions are silently excluded from the ledger but
        // stay visible in the analytics records.
        if let Some(rule) = rule {
            let description = clean_description(
                rule.description.as_deref().unwrap_or(&txn.description),
            );
            output.push(format!(
                "{formatted_date} {description}\n\t{:<50}{}{}\n\t{}",
                rule.debit_account,
                config.amount_prefix,
                txn.amount.abs(),
                rule.credit_account,
            ));
        }
    }
    Ok((output, records))
}

/// Transform transactions into ledger posting blocks.
pub fn transform_transactions(txns: &[Transaction], config: &Config) -> Result<Vec<String>> {
    Ok(run(txns, config, false)?.0)
}

/// Same transformation, also capturing per-transaction analytics records.
pub fn transform_with_metadata(
    txns: &[Transaction],
    config: &Config,
) -> Result<(Vec<String>, Vec<TxnRecord>)> {
    run(txns, config, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Rule, RuleSet};
    use crate::reader::HeaderMap;

    fn config(income: Vec<Rule>, expense: Vec<Rule>) -> Config {
        Config {
            ruleset: RuleSet { income, expense },
            amount_prefix: "$".to_string(),
            output_path: None,
            csv_headers: HeaderMap::default(),
            xls_headers: HeaderMap::default(),
            xls_first_row: 1,
        }
    }

    fn rule(pattern: &str, debit: &str, credit: &str) -> Rule {
        Rule {
            pattern: pattern.to_string(),
            debit_account: debit.to_string(),
            credit_account: credit.to_string(),
            description: None,
        }
    }

    fn sample_config() -> Config {
        config(
            vec![rule(
                "TRANSFER RENT PAYMENT Wyndham Realty",
                "Assets:AU:Savings:HSBC",
                "Income:AU:Interest",
            )],
            vec![rule("*", "Expenses:AU", "Assets:AU:Savings:HSBC")],
        )
    }

    fn raw(date: &str, description: &str, amount: &str) -> RawRecord {
        RawRecord {
            date: date.to_string(),
            description: description.to_string(),
            amount: Some(amount.to_string()),
            deposit: None,
            withdraw: None,
        }
    }

    fn txn(date: &str, description: &str, amount: f64) -> Transaction {
        Transaction {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            description: description.to_string(),
            amount,
        }
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 7, 19).unwrap();
        assert_eq!(parse_date("2024-07-19"), Some(expected));
        assert_eq!(parse_date("2024/07/19"), Some(expected));
        assert_eq!(parse_date("07-19-2024"), Some(expected));
        assert_eq!(parse_date("07/19/2024"), Some(expected));
        assert_eq!(parse_date("2024-07-19 10:00"), Some(expected));
        assert_eq!(parse_date("invalid_date"), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,701.80").unwrap(), 1701.80);
        assert_eq!(parse_amount("-1,000.00").unwrap(), -1000.0);
        assert_eq!(parse_amount("70000").unwrap(), 70000.0);
        assert!(parse_amount("not_a_number").is_err());
    }

    #[test]
    fn test_normalize_amount_column() {
        let txns =
            normalize_transactions(&[raw("2024-07-19", "SALARY", "1,701.80")]).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].amount, 1701.80);
        assert_eq!(txns[0].direction(), Direction::Income);
    }

    #[test]
    fn test_normalize_deposit_withdraw_columns() {
        let rows = vec![
            RawRecord {
                date: "2024-07-19".to_string(),
                description: "SALARY".to_string(),
                amount: None,
                deposit: Some("1,000.00".to_string()),
                withdraw: None,
            },
            RawRecord {
                date: "2024-07-20".to_string(),
                description: "RENT".to_string(),
                amount: None,
                deposit: None,
                withdraw: Some("900.00".to_string()),
            },
        ];
        let txns = normalize_transactions(&rows).unwrap();
        assert_eq!(txns[0].amount, 1000.0);
        assert_eq!(txns[1].amount, -900.0);
        assert_eq!(txns[1].direction(), Direction::Expense);
    }

    #[test]
    fn test_normalize_filters_empty_dates_and_rejects_bad_ones() {
        let rows = vec![
            raw("2024-07-19", "OK", "1.00"),
            raw("", "NO DATE", "2.00"),
            raw("2024-07-20", "OK TOO", "3.00"),
        ];
        assert_eq!(normalize_transactions(&rows).unwrap().len(), 2);

        let bad = vec![raw("not a date", "BAD", "1.00")];
        assert!(matches!(
            normalize_transactions(&bad).unwrap_err(),
            LedgerizeError::Date(_)
        ));
    }

    #[test]
    fn test_normalize_bad_amount_aborts_batch() {
        let rows = vec![raw("2024-07-19", "BAD", "12.3.4")];
        assert!(matches!(
            normalize_transactions(&rows).unwrap_err(),
            LedgerizeError::Amount(_)
        ));
    }

    #[test]
    fn test_sort_is_stable_on_equal_dates() {
        let mut txns = vec![
            txn("2023-02-01", "second", 1.0),
            txn("2023-01-01", "first a", 1.0),
            txn("2023-01-01", "first b", 1.0),
        ];
        sort_transactions(&mut txns);
        let order: Vec<&str> = txns.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(order, vec!["first a", "first b", "second"]);
    }

    #[test]
    fn test_transform_basic() {
        let txns = vec![txn(
            "2024-07-19",
            "TRANSFER RENT PAYMENT Wyndham Realty",
            1701.80,
        )];
        let output = transform_transactions(&txns, &sample_config()).unwrap();
        assert_eq!(output.len(), 1);
        let expected = format!(
            "2024/07/19 Transfer Rent Payment Wyndham Realty\n\t{:<50}$1701.8\n\tIncome:AU:Interest",
            "Assets:AU:Savings:HSBC"
        );
        assert_eq!(output[0], expected);
    }

    #[test]
    fn test_transform_negative_amount_uses_expense_rules() {
        let txns = vec![txn("2024-07-19", "RENT PAID", -1000.0)];
        let output = transform_transactions(&txns, &sample_config()).unwrap();
        assert_eq!(output.len(), 1);
        assert!(output[0].starts_with("2024/07/19 Rent Paid"));
        assert!(output[0].contains("Expenses:AU"));
        assert!(output[0].contains("$1000"));
    }

    #[test]
    fn test_transform_no_matching_rule_emits_nothing() {
        let cfg = config(
            vec![rule("Salary", "Assets:Checking", "Income:Salary")],
            vec![],
        );
        let txns = vec![txn("2024-07-19", "UNKNOWN TRANSACTION", 1000.0)];
        assert!(transform_transactions(&txns, &cfg).unwrap().is_empty());
    }

    #[test]
    fn test_transform_empty_input() {
        assert!(transform_transactions(&[], &sample_config()).unwrap().is_empty());
    }

    #[test]
    fn test_transform_is_idempotent() {
        let txns = vec![
            txn("2024-07-19", "TRANSFER RENT PAYMENT Wyndham Realty", 1701.8),
            txn("2024-07-20", "MISC FEES", -12.0),
        ];
        let cfg = sample_config();
        let first = transform_transactions(&txns, &cfg).unwrap();
        let second = transform_transactions(&txns, &cfg).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_transform_uses_rule_description_override() {
        let mut r = rule("*interest*", "Assets:Savings", "Income:Interest");
        r.description = Some("monthly interest (HSBC)".to_string());
        let cfg = config(vec![r], vec![]);
        let txns = vec![txn("2024-07-19", "INTEREST CR 0091", 15.0)];
        let output = transform_transactions(&txns, &cfg).unwrap();
        assert!(output[0].starts_with("2024/07/19 Monthly Interest  Hsbc "));
    }

    #[test]
    fn test_clean_description_sanitizes_and_title_cases() {
        assert_eq!(clean_description("AT&T WIRELESS-BILL"), "At T Wireless Bill");
        assert_eq!(clean_description("line\nbreak"), "Line Break");
        assert_eq!(clean_description("XYZ123 ok"), "Xyz123 Ok");
    }

    #[test]
    fn test_metadata_capture() {
        let cfg = config(
            vec![rule(
                "TRANSFER RENT PAYMENT Wyndham Realty",
                "Assets:AU:Savings:HSBC",
                "Income:AU:Interest",
            )],
            vec![rule("*PAYMENT*", "Expenses:AU", "Assets:AU:Savings:HSBC")],
        );
        let txns = vec![
            txn("2024-07-19", "TRANSFER RENT PAYMENT Wyndham Realty", 1701.8),
            txn("2024-07-20", "MISC PAYMENT", -500.0),
            txn("2024-07-21", "CRYPTIC CODE XYZ123", -25.0),
        ];
        let (output, records) = transform_with_metadata(&txns, &cfg).unwrap();
        assert_eq!(output.len(), 2);
        assert_eq!(records.len(), 3);

        assert_eq!(records[0].confidence_score, 0.9);
        assert_eq!(records[0].matched_rule_type, Specificity::Specific);
        assert_eq!(
            records[0].rule_key,
            "income.TRANSFER RENT PAYMENT Wyndham Realty"
        );
        assert_eq!(records[0].date, "2024/07/19");
        assert_eq!(records[0].amount, 1701.8);

        assert_eq!(records[1].confidence_score, 0.5);
        assert_eq!(records[1].matched_rule_type, Specificity::Wildcard);
        assert_eq!(records[1].rule_key, "expense.*PAYMENT*");

        assert_eq!(records[2].confidence_score, 0.1);
        assert_eq!(records[2].matched_rule_type, Specificity::None);
        assert!(!records[2].matched);
        assert_eq!(records[2].rule_key, "no_match");
    }

    #[test]
    fn test_plain_transform_captures_nothing() {
        let txns = vec![txn("2024-07-19", "MISC PAYMENT", -500.0)];
        let output = transform_transactions(&txns, &sample_config()).unwrap();
        let (with_meta, records) = transform_with_metadata(&txns, &sample_config()).unwrap();
        assert_eq!(output, with_meta);
        assert_eq!(records.len(), 1);
    }
}
