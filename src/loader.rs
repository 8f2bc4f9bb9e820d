use std::path::Path;

use log::{debug, info};

use crate::dataset::Dataset;
use crate::error::{ClaimError, Result};
use crate::models::{ClaimRecord, ParsedRow, REQUIRED_COLUMNS};
use crate::normalizer::normalize;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Parse a paid amount, tolerating thousands separators, quotes, a dollar
/// sign and accounting-style parenthesized negatives. `NaN` and infinities
/// are rejected.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let s = raw.replace([',', '"', '$'], "");
    let s = s.trim();
    let value = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => inner.trim().parse::<f64>().ok().map(|v| -v),
        None => s.parse::<f64>().ok(),
    };
    value.filter(|v| v.is_finite())
}

/// Parse an integer-like `MONTH` cell. Spreadsheets and float-typed CSV
/// exports may carry a trailing `.0`.
pub fn parse_month(raw: &str) -> Option<i64> {
    let s = raw.trim();
    if let Ok(v) = s.parse::<i64>() {
        return Some(v);
    }
    let f: f64 = s.parse().ok()?;
    (f.fract() == 0.0).then_some(f as i64)
}

/// Split a `YYYYMM` key into its `YEAR` text and `MONTH_N` number.
pub fn derive_year_month(month: i64) -> Option<(String, u32)> {
    let text = month.to_string();
    if text.len() != 6 || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let month_n: u32 = text[4..].parse().ok()?;
    if !(1..=12).contains(&month_n) {
        return None;
    }
    Some((text[..4].to_string(), month_n))
}

fn is_spreadsheet(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ["xlsx", "xlsm", "xls", "ods"].iter().any(|x| e.eq_ignore_ascii_case(x)))
}

// ---------------------------------------------------------------------------
// load_dataset
// ---------------------------------------------------------------------------

/// Read a dataset from disk, derive `YEAR`/`MONTH_N`, and normalize
/// `CLAIM_SPECIALTY`. Runs once at startup.
pub fn load_dataset(path: &Path) -> Result<Dataset> {
    let (headers, rows) = if is_spreadsheet(path) {
        read_spreadsheet(path)?
    } else {
        read_csv(path)?
    };
    debug!("read {} rows from {}", rows.len(), path.display());
    let dataset = build_dataset(path, &headers, rows)?;
    info!(
        "loaded {} claims ({} extra columns) from {}",
        dataset.len(),
        dataset.extra_columns.len(),
        path.display()
    );
    Ok(dataset)
}

/// Turn raw header/row text into typed records. Fails on the first missing
/// column or malformed `MONTH`/`PAID_AMOUNT` cell.
pub fn build_dataset(source: &Path, headers: &[String], rows: Vec<ParsedRow>) -> Result<Dataset> {
    let position = |name: &str| headers.iter().position(|h| h.trim() == name);
    let mut required = [0usize; 5];
    for (slot, name) in required.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = position(name).ok_or_else(|| ClaimError::MissingColumn(name.to_string()))?;
    }
    let [idx_month, idx_amount, idx_category, idx_payer, idx_specialty] = required;

    let extra_idx: Vec<usize> = (0..headers.len())
        .filter(|i| !required.contains(i))
        .collect();
    let extra_columns: Vec<String> = extra_idx.iter().map(|&i| headers[i].trim().to_string()).collect();

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let field = |i: usize| row.fields.get(i).map(String::as_str).unwrap_or("");

        let raw_month = field(idx_month);
        let invalid_month = || ClaimError::InvalidValue {
            line: row.line,
            column: "MONTH",
            value: raw_month.to_string(),
        };
        let month = parse_month(raw_month).ok_or_else(invalid_month)?;
        let (year, month_n) = derive_year_month(month).ok_or_else(invalid_month)?;

        let raw_amount = field(idx_amount);
        let paid_amount = parse_amount(raw_amount).ok_or_else(|| ClaimError::InvalidValue {
            line: row.line,
            column: "PAID_AMOUNT",
            value: raw_amount.to_string(),
        })?;

        records.push(ClaimRecord {
            month,
            paid_amount,
            service_category: field(idx_category).trim().to_string(),
            payer: field(idx_payer).trim().to_string(),
            claim_specialty: normalize(field(idx_specialty)),
            year,
            month_n,
            extras: extra_idx.iter().map(|&i| field(i).to_string()).collect(),
        });
    }

    Ok(Dataset::new(source.to_path_buf(), records, extra_columns))
}

// ---------------------------------------------------------------------------
// CSV reader
// ---------------------------------------------------------------------------

fn read_csv(path: &Path) -> Result<(Vec<String>, Vec<ParsedRow>)> {
    let file = std::fs::File::open(path)?;
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(std::io::BufReader::new(file));

    let headers: Vec<String> = rdr
        .headers()?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        let line = record.position().map(|p| p.line() as usize).unwrap_or(rows.len() + 2);
        rows.push(ParsedRow {
            line,
            fields: record.iter().map(str::to_string).collect(),
        });
    }
    Ok((headers, rows))
}

// ---------------------------------------------------------------------------
// Spreadsheet reader (feature-gated)
// ---------------------------------------------------------------------------

#[cfg(feature = "xlsx")]
fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<ParsedRow>)> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(path)
        .map_err(|e| ClaimError::Spreadsheet(format!("Failed to open workbook: {e}")))?;
    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| ClaimError::Spreadsheet("Workbook has no sheets".to_string()))?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| ClaimError::Spreadsheet(format!("Failed to read sheet {sheet}: {e}")))?;

    let mut iter = range.rows();
    let headers: Vec<String> = match iter.next() {
        Some(row) => row.iter().map(cell_text).collect(),
        None => return Ok((Vec::new(), Vec::new())),
    };
    let mut rows = Vec::new();
    for (i, row) in iter.enumerate() {
        let fields: Vec<String> = row.iter().map(cell_text).collect();
        if fields.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        rows.push(ParsedRow { line: i + 2, fields });
    }
    Ok((headers, rows))
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

#[cfg(not(feature = "xlsx"))]
fn read_spreadsheet(path: &Path) -> Result<(Vec<String>, Vec<ParsedRow>)> {
    Err(ClaimError::UnsupportedFormat(format!(
        "{} (rebuild with the `xlsx` feature to read workbooks)",
        path.display()
    )))
}
