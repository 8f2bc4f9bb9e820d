use std::path::{Path, PathBuf};

use csv::Writer;
use log::info;

use crate::cli::{open_dataset, FilterArgs};
use crate::dataset::Dataset;
use crate::error::Result;
use crate::filter::filter_records;
use crate::models::{ClaimRecord, Column};
use crate::settings::shellexpand_path;

fn default_path(dataset: &Dataset) -> PathBuf {
    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    dataset
        .source
        .parent()
        .unwrap_or(Path::new("."))
        .join("exports")
        .join(format!("claims-{date}.csv"))
}

/// Write rows with the full column set (derived columns included) followed
/// by any extra source columns.
pub(crate) fn write_rows(path: &Path, dataset: &Dataset, rows: &[&ClaimRecord]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let mut wtr = Writer::from_path(path)?;

    let mut header: Vec<&str> = Column::ALL.iter().map(|c| c.header()).collect();
    header.extend(dataset.extra_columns.iter().map(String::as_str));
    wtr.write_record(&header)?;

    for r in rows {
        let mut record: Vec<String> = Column::ALL.iter().map(|c| c.value(r)).collect();
        record.extend(r.extras.iter().cloned());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn run(data: Option<&str>, filter: &FilterArgs, output: Option<String>) -> Result<()> {
    let dataset = open_dataset(data)?;
    let state = filter.to_state(&dataset)?;
    let rows = filter_records(&dataset, &state);

    let path = output
        .map(|o| PathBuf::from(shellexpand_path(&o)))
        .unwrap_or_else(|| default_path(&dataset));
    write_rows(&path, &dataset, &rows)?;
    info!("exported {} rows to {}", rows.len(), path.display());
    println!("Wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;
    use crate::filter::FilterState;

    #[test]
    fn test_write_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("claims.csv");
        let ds = sample_dataset();
        let state = FilterState::from_inputs(Some("2018-05-01"), None, None).unwrap();
        let rows = filter_records(&ds, &state);
        write_rows(&path, &ds, &rows).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "MONTH,YEAR,MONTH_N,PAID_AMOUNT,SERVICE_CATEGORY,PAYER,CLAIM_SPECIALTY"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("201805,2018,5,120,"));
    }

    #[test]
    fn test_default_path_sits_next_to_dataset() {
        let ds = Dataset::new(PathBuf::from("/data/claims.csv"), vec![], vec![]);
        let path = default_path(&ds);
        assert!(path.starts_with("/data/exports"));
        assert!(path.to_string_lossy().ends_with(".csv"));
    }
}
