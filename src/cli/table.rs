use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_dataset, FilterArgs};
use crate::error::{ClaimError, Result};
use crate::filter::filter_records;
use crate::fmt::{money, number};
use crate::models::{ClaimRecord, Column};
use crate::settings::load_settings;

/// Sort rows by each key in turn. Keys are applied last-first with a stable
/// sort so the first key ends up primary.
pub(crate) fn sort_rows(rows: &mut [&ClaimRecord], keys: &[Column], descending: bool) {
    for column in keys.iter().rev() {
        rows.sort_by(|a, b| {
            let ord = column.compare(a, b);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        });
    }
}

pub(crate) fn parse_sort_keys(names: &[String]) -> Result<Vec<Column>> {
    names
        .iter()
        .filter(|n| !n.trim().is_empty())
        .map(|n| {
            Column::from_name(n).ok_or_else(|| {
                ClaimError::Other(format!(
                    "Unknown sort column: {n} (expected one of {})",
                    Column::ALL.map(|c| c.header()).join(", ")
                ))
            })
        })
        .collect()
}

pub fn run(
    data: Option<&str>,
    filter: &FilterArgs,
    sort: &[String],
    desc: bool,
    page: Option<usize>,
    page_size: Option<usize>,
) -> Result<()> {
    let dataset = open_dataset(data)?;
    let state = filter.to_state(&dataset)?;
    let keys = parse_sort_keys(sort)?;

    let mut rows = filter_records(&dataset, &state);
    sort_rows(&mut rows, &keys, desc);

    let total_rows = rows.len();
    let page_size = page_size.unwrap_or_else(|| load_settings().page_size).max(1);
    let page_count = total_rows.div_ceil(page_size).max(1);
    let shown: Vec<&ClaimRecord> = match page {
        Some(p) => {
            if p == 0 || p > page_count {
                return Err(ClaimError::Other(format!("No page {p} (1-{page_count})")));
            }
            rows.into_iter().skip((p - 1) * page_size).take(page_size).collect()
        }
        None => rows,
    };

    let mut table = Table::new();
    let mut header: Vec<String> = Column::ALL.iter().map(|c| c.header().to_string()).collect();
    header.extend(dataset.extra_columns.iter().cloned());
    table.set_header(header);

    for r in &shown {
        let mut cells = vec![
            Cell::new(r.month),
            Cell::new(&r.year),
            Cell::new(r.month_n),
            Cell::new(money(r.paid_amount)).set_alignment(CellAlignment::Right),
            Cell::new(&r.service_category),
            Cell::new(&r.payer),
            Cell::new(&r.claim_specialty),
        ];
        cells.extend(r.extras.iter().map(Cell::new));
        table.add_row(cells);
    }

    let paid: f64 = shown.iter().map(|r| r.paid_amount).sum();
    println!("Claims ({})\n{table}", state.describe());
    match page {
        Some(p) => println!(
            "Page {p} of {page_count} | {} of {} rows | Paid: {}",
            number(shown.len()),
            number(total_rows),
            money(paid)
        ),
        None => println!("{} rows | Paid: {}", number(total_rows), money(paid)),
    }
    println!("{}", state.range_summary());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;

    #[test]
    fn test_parse_sort_keys() {
        let keys = parse_sort_keys(&["payer".to_string(), "PAID_AMOUNT".to_string()]).unwrap();
        assert_eq!(keys, vec![Column::Payer, Column::PaidAmount]);
        assert!(parse_sort_keys(&["bogus".to_string()]).is_err());
        assert!(parse_sort_keys(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_sort_rows_first_key_is_primary() {
        let ds = sample_dataset();
        let mut rows = ds.all();
        sort_rows(&mut rows, &[Column::Payer, Column::PaidAmount], false);
        let got: Vec<f64> = rows.iter().map(|r| r.paid_amount).collect();
        assert_eq!(got, vec![50.0, 120.0, 300.0, 75.5, 500.0, 1000.0]);
    }

    #[test]
    fn test_sort_rows_descending() {
        let ds = sample_dataset();
        let mut rows = ds.all();
        sort_rows(&mut rows, &[Column::Month], true);
        assert_eq!(rows[0].month, 201901);
        assert_eq!(rows[5].month, 201801);
    }
}
