use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::dataset::Dataset;
use crate::error::{ClaimError, Result};
use crate::models::ClaimRecord;

/// Current date and amount selection. Rebuilt from the controls on every
/// recomputation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Inclusive `(lo, hi)` bounds on `PAID_AMOUNT`.
    pub amount_range: Option<(f64, f64)>,
}

impl FilterState {
    /// Build a filter from raw picker text. Either date may be absent; a
    /// present but malformed date is an error.
    pub fn from_inputs(
        start: Option<&str>,
        end: Option<&str>,
        amount_range: Option<(f64, f64)>,
    ) -> Result<Self> {
        Ok(Self {
            start_date: start.map(parse_picker_date).transpose()?,
            end_date: end.map(parse_picker_date).transpose()?,
            amount_range,
        })
    }

    /// A filter showing the whole dataset, with the amount range spanning
    /// its full bounds.
    pub fn full_range(dataset: &Dataset) -> Self {
        Self {
            amount_range: dataset.amount_bounds(),
            ..Self::default()
        }
    }

    pub fn clear_dates(&mut self) {
        self.start_date = None;
        self.end_date = None;
    }

    /// Reset the amount range to the dataset's min/max.
    pub fn clear_amount(&mut self, dataset: &Dataset) {
        self.amount_range = dataset.amount_bounds();
    }

    /// True when an end date is set without a start date. That end date has
    /// no effect on the result.
    pub fn end_date_ignored(&self) -> bool {
        self.start_date.is_none() && self.end_date.is_some()
    }

    pub fn range_summary(&self) -> String {
        range_summary(self.amount_range)
    }

    /// Short description of the active filters, for status lines.
    pub fn describe(&self) -> String {
        let dates = match (self.start_date, self.end_date) {
            (Some(s), Some(e)) => format!("{s} to {e}"),
            (Some(s), None) => format!("{}", s.format("%Y-%m")),
            _ => "all months".to_string(),
        };
        match self.amount_range {
            Some((lo, hi)) => format!("{dates}, amount {lo} to {hi}"),
            None => dates,
        }
    }
}

/// Parse date text from a picker or the command line. Anything after a `T`
/// or space (a time component) is ignored.
pub fn parse_picker_date(raw: &str) -> Result<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = trimmed.split(['T', ' ']).next().unwrap_or("");
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ClaimError::InvalidDate(raw.to_string()))
}

/// The `YYYYMM` key a calendar date falls in.
pub fn month_key(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 100 + i64::from(date.month())
}

pub fn range_summary(amount_range: Option<(f64, f64)>) -> String {
    match amount_range {
        Some((lo, hi)) => format!("Range: from {lo} to {hi}"),
        None => "Range: None".to_string(),
    }
}

/// Apply the filter to the dataset, keeping source order.
///
/// With a start date only, the single month containing it is selected; with
/// both dates the inclusive month range between them. An end date without a
/// start date applies no date filter at all; callers surface that to the
/// user themselves.
pub fn filter_records<'a>(dataset: &'a Dataset, state: &FilterState) -> Vec<&'a ClaimRecord> {
    let month_range = state.start_date.map(|start| {
        let start_key = month_key(start);
        match state.end_date {
            Some(end) => (start_key, month_key(end)),
            None => (start_key, start_key),
        }
    });
    let rows: Vec<&ClaimRecord> = dataset
        .records
        .iter()
        .filter(|r| match month_range {
            Some((lo, hi)) => lo <= r.month && r.month <= hi,
            None => true,
        })
        .filter(|r| match state.amount_range {
            Some((lo, hi)) => lo <= r.paid_amount && r.paid_amount <= hi,
            None => true,
        })
        .collect();
    debug!("filter {:?} kept {} of {} rows", state, rows.len(), dataset.len());
    rows
}
