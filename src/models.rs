use chrono::NaiveDate;
use serde::Serialize;

/// Posting direction, decided by the sign of the transaction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Income,
    Expense,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }
}

/// A canonical categorization rule: glob pattern plus the two ledger
/// accounts a matching transaction posts to.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub pattern: String,
    pub debit_account: String,
    pub credit_account: String,
    /// Optional replacement for the transaction description in the output.
    pub description: Option<String>,
}

impl Rule {
    /// Rule identity: `<direction>.<pattern>`.
    pub fn key(&self, direction: Direction) -> String {
        format!("{}.{}", direction.as_str(), self.pattern)
    }
}

/// Ordered rules per direction. First match wins; never mutated after load.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub income: Vec<Rule>,
    pub expense: Vec<Rule>,
}

impl RuleSet {
    pub fn for_direction(&self, direction: Direction) -> &[Rule] {
        match direction {
            Direction::Income => &self.income,
            Direction::Expense => &self.expense,
        }
    }

    /// All rule keys in catalog order, income first.
    pub fn catalog_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self
            .income
            .iter()
            .map(|r| r.key(Direction::Income))
            .collect();
        keys.extend(self.expense.iter().map(|r| r.key(Direction::Expense)));
        keys
    }
}

/// One bank statement row after normalization. Sign carries direction,
/// magnitude is what gets printed.
#[derive(Debug, Clone)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
}

impl Transaction {
    pub fn direction(&self) -> Direction {
        if self.amount > 0.0 {
            Direction::Income
        } else {
            Direction::Expense
        }
    }
}

/// Whether a matched rule pattern carries a wildcard, or nothing matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Specificity {
    Specific,
    Wildcard,
    None,
}

impl Specificity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Specific => "specific",
            Self::Wildcard => "wildcard",
            Self::None => "none",
        }
    }
}

/// Intermediate representation from a CSV/XLSX reader before normalization.
/// Amount columns stay raw strings; banks export either a single signed
/// amount column or separate deposit/withdrawal columns.
#[derive(Debug, Clone, Default)]
pub struct RawRecord {
    pub date: String,
    pub description: String,
    pub amount: Option<String>,
    pub deposit: Option<String>,
    pub withdraw: Option<String>,
}
