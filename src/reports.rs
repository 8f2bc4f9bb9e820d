use std::collections::BTreeMap;

use crate::models::ClaimRecord;

// ---------------------------------------------------------------------------
// Share breakdowns (category / payer)
// ---------------------------------------------------------------------------

pub struct GroupTotal {
    pub label: String,
    pub total: f64,
    pub count: usize,
    /// Percentage of the overall paid amount, 0-100.
    pub pct: f64,
}

fn group_totals<F>(rows: &[&ClaimRecord], key: F) -> Vec<GroupTotal>
where
    F: Fn(&ClaimRecord) -> &str,
{
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in rows {
        let entry = groups.entry(key(*r)).or_default();
        entry.0 += r.paid_amount;
        entry.1 += 1;
    }
    let grand = total_paid(rows);
    let mut out: Vec<GroupTotal> = groups
        .into_iter()
        .map(|(label, (total, count))| GroupTotal {
            label: label.to_string(),
            total,
            count,
            pct: if grand != 0.0 { total / grand * 100.0 } else { 0.0 },
        })
        .collect();
    // BTreeMap iteration already orders ties by label; the sort is stable.
    out.sort_by(|a, b| b.total.total_cmp(&a.total));
    out
}

pub fn total_paid(rows: &[&ClaimRecord]) -> f64 {
    rows.iter().map(|r| r.paid_amount).sum()
}

/// Paid amount per service category, largest first.
pub fn by_service_category(rows: &[&ClaimRecord]) -> Vec<GroupTotal> {
    group_totals(rows, |r| r.service_category.as_str())
}

/// Paid amount per payer, largest first.
pub fn by_payer(rows: &[&ClaimRecord]) -> Vec<GroupTotal> {
    group_totals(rows, |r| r.payer.as_str())
}

// ---------------------------------------------------------------------------
// Time series
// ---------------------------------------------------------------------------

pub struct MonthYearTotal {
    pub year: String,
    pub month_n: u32,
    pub total: f64,
}

/// Paid amount per `(MONTH_N, YEAR)`, ordered by year then month.
pub fn by_month_year(rows: &[&ClaimRecord]) -> Vec<MonthYearTotal> {
    let mut totals: BTreeMap<(&str, u32), f64> = BTreeMap::new();
    for r in rows {
        *totals.entry((r.year.as_str(), r.month_n)).or_default() += r.paid_amount;
    }
    totals
        .into_iter()
        .map(|((year, month_n), total)| MonthYearTotal {
            year: year.to_string(),
            month_n,
            total,
        })
        .collect()
}

pub struct PayerYearTotal {
    pub payer: String,
    pub year: String,
    pub total: f64,
}

/// Paid amount per `(PAYER, YEAR)`, ordered by payer then year.
pub fn by_payer_year(rows: &[&ClaimRecord]) -> Vec<PayerYearTotal> {
    let mut totals: BTreeMap<(&str, &str), f64> = BTreeMap::new();
    for r in rows {
        *totals.entry((r.payer.as_str(), r.year.as_str())).or_default() += r.paid_amount;
    }
    totals
        .into_iter()
        .map(|((payer, year), total)| PayerYearTotal {
            payer: payer.to_string(),
            year: year.to_string(),
            total,
        })
        .collect()
}

pub struct YearTotal {
    pub year: String,
    pub total: f64,
    pub count: usize,
}

/// Yearly paid amount for a single payer. Empty when the payer has no rows.
pub fn payer_by_year(rows: &[&ClaimRecord], payer: &str) -> Vec<YearTotal> {
    let mut totals: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for r in rows.iter().filter(|r| r.payer == payer) {
        let entry = totals.entry(r.year.as_str()).or_default();
        entry.0 += r.paid_amount;
        entry.1 += 1;
    }
    totals
        .into_iter()
        .map(|(year, (total, count))| YearTotal {
            year: year.to_string(),
            total,
            count,
        })
        .collect()
}

/// Distinct years present, ascending.
pub fn years(rows: &[&ClaimRecord]) -> Vec<String> {
    let mut years: Vec<String> = rows.iter().map(|r| r.year.clone()).collect();
    years.sort();
    years.dedup();
    years
}
