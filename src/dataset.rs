use std::collections::HashSet;
use std::path::PathBuf;

use crate::models::ClaimRecord;

/// The loaded claim table. Built once by the loader and read-only afterwards;
/// filters borrow from it instead of copying rows.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub source: PathBuf,
    pub records: Vec<ClaimRecord>,
    /// Headers of source columns beyond the required ones, in file order.
    pub extra_columns: Vec<String>,
}

impl Dataset {
    pub fn new(source: PathBuf, records: Vec<ClaimRecord>, extra_columns: Vec<String>) -> Self {
        Self {
            source,
            records,
            extra_columns,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Smallest and largest `PAID_AMOUNT`, or `None` for an empty dataset.
    pub fn amount_bounds(&self) -> Option<(f64, f64)> {
        let mut amounts = self.records.iter().map(|r| r.paid_amount);
        let first = amounts.next()?;
        Some(amounts.fold((first, first), |(lo, hi), a| (lo.min(a), hi.max(a))))
    }

    /// Earliest and latest `MONTH` key present.
    pub fn month_bounds(&self) -> Option<(i64, i64)> {
        let min = self.records.iter().map(|r| r.month).min()?;
        let max = self.records.iter().map(|r| r.month).max()?;
        Some((min, max))
    }

    /// Distinct payers in order of first appearance.
    pub fn payers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .filter(|r| seen.insert(r.payer.as_str()))
            .map(|r| r.payer.clone())
            .collect()
    }

    pub fn all(&self) -> Vec<&ClaimRecord> {
        self.records.iter().collect()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::sample_dataset;
    use super::*;

    #[test]
    fn test_amount_bounds() {
        assert_eq!(sample_dataset().amount_bounds(), Some((50.0, 1000.0)));
        assert_eq!(Dataset::default().amount_bounds(), None);
    }

    #[test]
    fn test_month_bounds() {
        assert_eq!(sample_dataset().month_bounds(), Some((201801, 201901)));
        assert_eq!(Dataset::default().month_bounds(), None);
    }

    #[test]
    fn test_payers_in_first_appearance_order() {
        assert_eq!(sample_dataset().payers(), vec!["Payer F", "Payer H", "Payer W"]);
    }
}
