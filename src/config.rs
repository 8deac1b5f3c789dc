use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{LedgerizeError, Result};
use crate::models::{Rule, RuleSet};
use crate::reader::HeaderMap;

// ---------------------------------------------------------------------------
// Raw YAML shapes
// ---------------------------------------------------------------------------

/// One rule entry as written in YAML. Either legacy fields
/// (`transaction_type`/`debit_account`/`credit_account`) or simplified
/// shorthand (`match`/`to`/`from`); anything else rides along in `extra`.
#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct RawRule {
    #[serde(default)]
    pub transaction_type: Option<String>,
    #[serde(default)]
    pub debit_account: Option<String>,
    #[serde(default)]
    pub credit_account: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "match", default)]
    pub match_expr: Option<String>,
    #[serde(default)]
    pub to: Option<String>,
    #[serde(default)]
    pub from: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RuleSections {
    #[serde(default)]
    pub income: Vec<RawRule>,
    #[serde(default)]
    pub expense: Vec<RawRule>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AmountSection {
    #[serde(default)]
    pub prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OutputSection {
    #[serde(default)]
    pub amount: Option<AmountSection>,
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct SheetSection {
    #[serde(default)]
    pub first_row: Option<u32>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct FormatSection {
    #[serde(default)]
    pub header: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub sheet: Option<SheetSection>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct InputSection {
    #[serde(default)]
    pub csv: Option<FormatSection>,
    #[serde(default)]
    pub xls: Option<FormatSection>,
}

/// The whole rules file, pre-normalization.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RulesFile {
    #[serde(default)]
    pub rules: Option<RuleSections>,
    #[serde(default)]
    pub output: Option<OutputSection>,
    #[serde(default)]
    pub accounts: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub bank: Option<String>,
    #[serde(default)]
    pub input: Option<InputSection>,
}

#[derive(Debug, Deserialize, Default)]
struct PresetFile {
    #[serde(default)]
    accounts: BTreeMap<String, String>,
}

// ---------------------------------------------------------------------------
// Rule normalizer
// ---------------------------------------------------------------------------

/// True iff any rule entry uses the simplified `match` shorthand.
pub fn has_simplified_syntax(file: &RulesFile) -> bool {
    let Some(sections) = &file.rules else {
        return false;
    };
    sections
        .income
        .iter()
        .chain(sections.expense.iter())
        .any(|r| r.match_expr.is_some())
}

/// Expand a shorthand pattern into its glob form. Case-sensitive on the
/// literal prefix; unknown shapes pass through unchanged.
pub fn convert_pattern(pattern: &str) -> String {
    if let Some(rest) = pattern.strip_prefix("contains ") {
        format!("*{rest}*")
    } else if let Some(rest) = pattern.strip_prefix("starts with ") {
        format!("{rest}*")
    } else if let Some(rest) = pattern.strip_prefix("ends with ") {
        format!("*{rest}")
    } else if let Some(rest) = pattern.strip_prefix("exactly ") {
        rest.to_string()
    } else {
        pattern.to_string()
    }
}

/// Resolve an account alias to its full path; unknown names are treated as
/// literal account paths and pass through unchanged.
pub fn resolve_account(account: &str, aliases: &BTreeMap<String, String>) -> String {
    aliases
        .get(account)
        .cloned()
        .unwrap_or_else(|| account.to_string())
}

fn normalize_rule(raw: &RawRule, aliases: &BTreeMap<String, String>) -> RawRule {
    let mut rule = raw.clone();
    if let Some(expr) = rule.match_expr.take() {
        rule.transaction_type = Some(convert_pattern(&expr));
    }
    if let Some(to) = rule.to.take() {
        rule.debit_account = Some(resolve_account(&to, aliases));
    }
    if let Some(from) = rule.from.take() {
        rule.credit_account = Some(resolve_account(&from, aliases));
    }
    rule
}

/// Expand simplified-syntax rules into canonical form. Pure: the input is
/// left untouched, shorthand fields are consumed, everything else
/// (override description, free-form annotations) is preserved.
pub fn normalize_sections(
    sections: &RuleSections,
    aliases: &BTreeMap<String, String>,
) -> RuleSections {
    RuleSections {
        income: sections
            .income
            .iter()
            .map(|r| normalize_rule(r, aliases))
            .collect(),
        expense: sections
            .expense
            .iter()
            .map(|r| normalize_rule(r, aliases))
            .collect(),
    }
}

/// Load `accounts/<bank>.yaml` relative to the rules file directory.
/// A missing or malformed preset degrades to an empty alias map rather than
/// failing the run.
pub fn load_bank_preset(rules_dir: &Path, bank: &str) -> BTreeMap<String, String> {
    let path = rules_dir.join("accounts").join(format!("{bank}.yaml"));
    let Ok(content) = std::fs::read_to_string(&path) else {
        return BTreeMap::new();
    };
    serde_yaml::from_str::<PresetFile>(&content)
        .map(|p| p.accounts)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Validated configuration
// ---------------------------------------------------------------------------

/// Immutable, validated configuration for one run.
#[derive(Debug, Clone)]
pub struct Config {
    pub ruleset: RuleSet,
    pub amount_prefix: String,
    pub output_path: Option<String>,
    pub csv_headers: HeaderMap,
    pub xls_headers: HeaderMap,
    pub xls_first_row: u32,
}

fn to_rule(raw: &RawRule, direction: &str, index: usize) -> Result<Rule> {
    let field = |value: &Option<String>, name: &str| -> Result<String> {
        match value {
            Some(v) if !v.is_empty() => Ok(v.clone()),
            _ => Err(LedgerizeError::Config(format!(
                "{direction} rule #{} is missing '{name}'",
                index + 1
            ))),
        }
    };
    Ok(Rule {
        pattern: field(&raw.transaction_type, "transaction_type")?,
        debit_account: field(&raw.debit_account, "debit_account")?,
        credit_account: field(&raw.credit_account, "credit_account")?,
        description: raw.description.clone(),
    })
}

/// Parse an already-loaded rules file into a validated `Config`.
/// `rules_dir` anchors bank preset lookups.
pub fn build_config(file: &RulesFile, rules_dir: &Path) -> Result<Config> {
    let sections = file
        .rules
        .as_ref()
        .ok_or_else(|| LedgerizeError::Config("missing 'rules' section".to_string()))?;

    let sections = if has_simplified_syntax(file) {
        // User aliases override bank preset aliases on key collision.
        let mut aliases = match &file.bank {
            Some(bank) => load_bank_preset(rules_dir, bank),
            None => BTreeMap::new(),
        };
        if let Some(user) = &file.accounts {
            aliases.extend(user.clone());
        }
        normalize_sections(sections, &aliases)
    } else {
        sections.clone()
    };

    let mut ruleset = RuleSet::default();
    for (i, raw) in sections.income.iter().enumerate() {
        ruleset.income.push(to_rule(raw, "income", i)?);
    }
    for (i, raw) in sections.expense.iter().enumerate() {
        ruleset.expense.push(to_rule(raw, "expense", i)?);
    }

    let output = file.output.clone().unwrap_or_default();
    let amount_prefix = output
        .amount
        .and_then(|a| a.prefix)
        .unwrap_or_else(|| "$".to_string());

    let input = file.input.clone().unwrap_or_default();
    let csv_section = input.csv.unwrap_or_default();
    let xls_section = input.xls.unwrap_or_default();
    let xls_first_row = xls_section
        .sheet
        .as_ref()
        .and_then(|s| s.first_row)
        .unwrap_or(1);

    Ok(Config {
        ruleset,
        amount_prefix,
        output_path: output.path,
        csv_headers: HeaderMap::merged(csv_section.header.as_ref()),
        xls_headers: HeaderMap::merged(xls_section.header.as_ref()),
        xls_first_row,
    })
}

/// Load, normalize, and validate a YAML rules file. Any structural problem
/// is fatal before a single transaction is processed.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        LedgerizeError::Config(format!("cannot read rules file {}: {e}", path.display()))
    })?;
    let file: RulesFile = serde_yaml::from_str(&content)
        .map_err(|e| LedgerizeError::Config(format!("malformed rules file: {e}")))?;
    let rules_dir = path.parent().unwrap_or_else(|| Path::new("."));
    build_config(&file, rules_dir)
}
