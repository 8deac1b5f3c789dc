use std::collections::BTreeMap;
use std::path::Path;

use crate::config::Config;
use crate::error::{LedgerizeError, Result};
use crate::models::RawRecord;

// ---------------------------------------------------------------------------
// Header mapping
// ---------------------------------------------------------------------------

/// Maps the pipeline's named columns onto the column titles a bank export
/// actually uses. Defaults cover the common case; rule files override per
/// format under `input.csv.header` / `input.xls.header`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    pub date: String,
    pub description: String,
    pub amount: String,
    pub deposit: String,
    pub withdraw: String,
}

impl Default for HeaderMap {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            description: "Description".to_string(),
            amount: "Amount".to_string(),
            deposit: "Deposit".to_string(),
            withdraw: "Withdrawal".to_string(),
        }
    }
}

impl HeaderMap {
    /// Defaults merged with user overrides. `income` is accepted as the
    /// legacy name for the deposit column.
    pub fn merged(overrides: Option<&BTreeMap<String, String>>) -> Self {
        let mut headers = Self::default();
        let Some(overrides) = overrides else {
            return headers;
        };
        for (key, value) in overrides {
            match key.as_str() {
                "date" => headers.date = value.clone(),
                "description" => headers.description = value.clone(),
                "amount" => headers.amount = value.clone(),
                "deposit" | "income" => headers.deposit = value.clone(),
                "withdraw" => headers.withdraw = value.clone(),
                _ => {}
            }
        }
        headers
    }
}

// ---------------------------------------------------------------------------
// Reader kinds — enum dispatch instead of trait objects
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ReaderKind {
    Csv,
    #[cfg(feature = "xlsx")]
    Xlsx,
}

impl ReaderKind {
    pub fn for_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            #[cfg(feature = "xlsx")]
            "xls" | "xlsx" => Ok(Self::Xlsx),
            _ => Err(LedgerizeError::UnsupportedFormat(
                path.display().to_string(),
            )),
        }
    }

    pub fn headers<'a>(&self, config: &'a Config) -> &'a HeaderMap {
        match self {
            Self::Csv => &config.csv_headers,
            #[cfg(feature = "xlsx")]
            Self::Xlsx => &config.xls_headers,
        }
    }

    /// Load the input file into ordered raw records with named columns
    /// resolved through the header mapping.
    pub fn load_rows(&self, path: &Path, config: &Config) -> Result<Vec<RawRecord>> {
        match self {
            Self::Csv => load_csv(path, &config.csv_headers),
            #[cfg(feature = "xlsx")]
            Self::Xlsx => load_xlsx(path, &config.xls_headers, config.xls_first_row),
        }
    }
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn column_index(titles: &[String], name: &str) -> Option<usize> {
    titles.iter().position(|t| t.trim() == name)
}

fn load_csv(path: &Path, headers: &HeaderMap) -> Result<Vec<RawRecord>> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let titles: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let idx_date = column_index(&titles, &headers.date).ok_or_else(|| {
        LedgerizeError::Other(format!("input has no '{}' column", headers.date))
    })?;
    let idx_desc = column_index(&titles, &headers.description).ok_or_else(|| {
        LedgerizeError::Other(format!("input has no '{}' column", headers.description))
    })?;
    let idx_amount = column_index(&titles, &headers.amount);
    let idx_deposit = column_index(&titles, &headers.deposit);
    let idx_withdraw = column_index(&titles, &headers.withdraw);

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let cell = |i: usize| record.get(i).unwrap_or("").trim().to_string();
        let opt_cell = |i: Option<usize>| {
            i.map(&cell)
                .filter(|v: &String| !v.is_empty())
        };
        rows.push(RawRecord {
            date: cell(idx_date),
            description: cell(idx_desc),
            amount: opt_cell(idx_amount),
            deposit: opt_cell(idx_deposit),
            withdraw: opt_cell(idx_withdraw),
        });
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// XLSX (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    let base = chrono::NaiveDate::from_ymd_opt(1899, 12, 30).unwrap();
    let date = base + chrono::Duration::days(serial as i64);
    date.format("%Y-%m-%d").to_string()
}

#[cfg(feature = "xlsx")]
fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) => format!("{f}"),
        Data::Int(i) => format!("{i}"),
        Data::DateTimeIso(s) => s.clone(),
        _ => String::new(),
    }
}

#[cfg(feature = "xlsx")]
fn cell_to_date(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Float(f) => excel_serial_to_date(*f),
        Data::Int(i) => excel_serial_to_date(*i as f64),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        other => cell_to_string(other),
    }
}

#[cfg(feature = "xlsx")]
fn load_xlsx(path: &Path, headers: &HeaderMap, first_row: u32) -> Result<Vec<RawRecord>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| LedgerizeError::Xlsx(format!("cannot open {}: {e}", path.display())))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| LedgerizeError::Xlsx("workbook has no sheets".to_string()))?
        .map_err(|e| LedgerizeError::Xlsx(e.to_string()))?;

    // first_row is 1-based: the sheet's header row after skipping any
    // preamble the bank puts above it.
    let mut rows = range.rows().skip(first_row.saturating_sub(1) as usize);
    let titles: Vec<String> = rows
        .next()
        .map(|r| r.iter().map(cell_to_string).collect())
        .unwrap_or_default();

    let idx_date = column_index(&titles, &headers.date).ok_or_else(|| {
        LedgerizeError::Other(format!("input has no '{}' column", headers.date))
    })?;
    let idx_desc = column_index(&titles, &headers.description).ok_or_else(|| {
        LedgerizeError::Other(format!("input has no '{}' column", headers.description))
    })?;
    let idx_amount = column_index(&titles, &headers.amount);
    let idx_deposit = column_index(&titles, &headers.deposit);
    let idx_withdraw = column_index(&titles, &headers.withdraw);

    let mut records = Vec::new();
    for row in rows {
        let opt_cell = |i: Option<usize>| {
            i.and_then(|i| row.get(i))
                .map(cell_to_string)
                .filter(|v| !v.is_empty())
        };
        records.push(RawRecord {
            date: row.get(idx_date).map(cell_to_date).unwrap_or_default(),
            description: row.get(idx_desc).map(cell_to_string).unwrap_or_default(),
            amount: opt_cell(idx_amount),
            deposit: opt_cell(idx_deposit),
            withdraw: opt_cell(idx_withdraw),
        });
    }
    Ok(records)
}
