use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::cli::{open_dataset, FilterArgs, SummaryBy};
use crate::error::{ClaimError, Result};
use crate::filter::filter_records;
use crate::fmt::{money, month_abbr};
use crate::models::ClaimRecord;
use crate::reports::{self, GroupTotal};

fn amount_cell(amount: f64) -> Cell {
    Cell::new(money(amount)).set_alignment(CellAlignment::Right)
}

fn share_table(label: &str, groups: &[GroupTotal]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![label, "Paid", "%", "Claims"]);
    for g in groups {
        table.add_row(vec![
            Cell::new(&g.label),
            amount_cell(g.total),
            Cell::new(format!("{:.1}%", g.pct)),
            Cell::new(g.count),
        ]);
    }
    table
}

fn total_row(table: &mut Table, rows: &[&ClaimRecord], width: usize) {
    let mut cells = vec![Cell::new("Total".bold()), amount_cell(reports::total_paid(rows))];
    cells.extend((2..width).map(|_| Cell::new("")));
    table.add_row(cells);
}

/// Render the requested aggregate as a printable table with its title.
pub(crate) fn render(rows: &[&ClaimRecord], by: SummaryBy) -> (String, Table) {
    match by {
        SummaryBy::Category => {
            let mut table = share_table("Service category", &reports::by_service_category(rows));
            total_row(&mut table, rows, 4);
            ("Paid amount per service category".to_string(), table)
        }
        SummaryBy::Payer => {
            let mut table = share_table("Payer", &reports::by_payer(rows));
            total_row(&mut table, rows, 4);
            ("Paid amount per payer".to_string(), table)
        }
        SummaryBy::Month => {
            let mut table = Table::new();
            table.set_header(vec!["Year", "Month", "Paid"]);
            for m in reports::by_month_year(rows) {
                table.add_row(vec![
                    Cell::new(&m.year),
                    Cell::new(format!("{:02} {}", m.month_n, month_abbr(m.month_n))),
                    amount_cell(m.total),
                ]);
            }
            ("Paid amount per month".to_string(), table)
        }
        SummaryBy::PayerYear => {
            let mut table = Table::new();
            table.set_header(vec!["Payer", "Year", "Paid"]);
            for p in reports::by_payer_year(rows) {
                table.add_row(vec![Cell::new(&p.payer), Cell::new(&p.year), amount_cell(p.total)]);
            }
            ("Years' comparison per payer".to_string(), table)
        }
    }
}

pub fn run(data: Option<&str>, filter: &FilterArgs, by: SummaryBy) -> Result<()> {
    let dataset = open_dataset(data)?;
    let state = filter.to_state(&dataset)?;
    let rows = filter_records(&dataset, &state);
    let (title, table) = render(&rows, by);
    println!("{title} ({})\n{table}", state.describe());
    Ok(())
}

pub fn payers(data: Option<&str>, filter: &FilterArgs) -> Result<()> {
    let dataset = open_dataset(data)?;
    let state = filter.to_state(&dataset)?;
    let rows = filter_records(&dataset, &state);

    let totals = reports::by_payer(&rows);
    let mut table = Table::new();
    table.set_header(vec!["Payer", "Paid", "Claims"]);
    // Dataset order, matching the dashboard's payer selector.
    for payer in dataset.payers() {
        let (total, count) = totals
            .iter()
            .find(|g| g.label == payer)
            .map(|g| (g.total, g.count))
            .unwrap_or((0.0, 0));
        table.add_row(vec![Cell::new(&payer), amount_cell(total), Cell::new(count)]);
    }
    println!("Payers\n{table}");
    Ok(())
}

pub fn payer(data: Option<&str>, name: &str, filter: &FilterArgs) -> Result<()> {
    let dataset = open_dataset(data)?;
    if !dataset.payers().iter().any(|p| p == name) {
        return Err(ClaimError::UnknownPayer(name.to_string()));
    }
    let state = filter.to_state(&dataset)?;
    let rows = filter_records(&dataset, &state);

    let years = reports::payer_by_year(&rows, name);
    let mut table = Table::new();
    table.set_header(vec!["Year", "Paid", "Claims"]);
    for y in &years {
        table.add_row(vec![Cell::new(&y.year), amount_cell(y.total), Cell::new(y.count)]);
    }
    let total: f64 = years.iter().map(|y| y.total).sum();
    table.add_row(vec![Cell::new("Total".bold()), amount_cell(total), Cell::new("")]);
    println!("Yearly payment for {name} ({})\n{table}", state.describe());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;

    #[test]
    fn test_render_category_includes_total() {
        let ds = sample_dataset();
        let rows = ds.all();
        let (title, table) = render(&rows, SummaryBy::Category);
        assert!(title.contains("service category"));
        let text = table.to_string();
        assert!(text.contains("InpatientServices"));
        assert!(text.contains("$1,800.00"));
        assert!(text.contains("$2,045.50"));
    }

    #[test]
    fn test_render_month() {
        let ds = sample_dataset();
        let rows = ds.all();
        let (_, table) = render(&rows, SummaryBy::Month);
        let text = table.to_string();
        assert!(text.contains("05 May"));
        assert!(text.contains("$420.00"));
    }

    #[test]
    fn test_render_payer_year() {
        let ds = sample_dataset();
        let rows = ds.all();
        let (_, table) = render(&rows, SummaryBy::PayerYear);
        assert_eq!(table.row_iter().count(), 4);
    }
}
