use crate::cli::open_dataset;
use crate::error::Result;
use crate::fmt::{money, month_label, number};
use crate::reports;
use crate::settings::{load_settings, resolve_data_path};

pub fn run(data: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let path = resolve_data_path(data);

    println!("Dataset:    {}", path.display());
    println!("Page size:  {}", settings.page_size);

    if !path.exists() {
        println!();
        println!("Dataset not found. Run `claimdash use <PATH>` to pick one.");
        return Ok(());
    }

    let dataset = open_dataset(data)?;
    let rows = dataset.all();

    println!();
    println!("Rows:       {}", number(dataset.len()));
    if dataset.is_empty() {
        println!("Dataset has no claims.");
        return Ok(());
    }
    match dataset.month_bounds() {
        Some((lo, hi)) => println!("Months:     {} to {}", month_label(lo), month_label(hi)),
        None => println!("Months:     (none)"),
    }
    match dataset.amount_bounds() {
        Some((lo, hi)) => println!("Amounts:    {} to {}", money(lo), money(hi)),
        None => println!("Amounts:    (none)"),
    }
    println!("Paid:       {}", money(reports::total_paid(&rows)));
    println!("Payers:     {}", dataset.payers().len());
    println!("Categories: {}", reports::by_service_category(&rows).len());
    if !dataset.extra_columns.is_empty() {
        println!("Extra cols: {}", dataset.extra_columns.join(", "));
    }

    Ok(())
}
