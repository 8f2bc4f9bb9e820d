pub mod dashboard;
pub mod export;
pub mod load;
pub mod status;
pub mod summary;
pub mod table;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;

use crate::dataset::Dataset;
use crate::error::Result;
use crate::filter::FilterState;
use crate::loader::load_dataset;
use crate::settings::resolve_data_path;

/// Load the dataset named by `--data`, or the saved default.
pub(crate) fn open_dataset(data: Option<&str>) -> Result<Dataset> {
    load_dataset(&resolve_data_path(data))
}

#[derive(Parser)]
#[command(
    name = "claimdash",
    about = "Filter, tabulate and chart insurance claim transactions."
)]
pub struct Cli {
    /// Dataset to open (CSV or XLSX). Defaults to the saved data path.
    #[arg(long, global = true)]
    pub data: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Start date: YYYY-MM-DD. On its own, selects that single month.
    #[arg(long = "from")]
    pub from_date: Option<String>,
    /// End date: YYYY-MM-DD. Ignored unless --from is also given.
    #[arg(long = "to")]
    pub to_date: Option<String>,
    /// Lowest paid amount to include
    #[arg(long, allow_hyphen_values = true)]
    pub min: Option<f64>,
    /// Highest paid amount to include
    #[arg(long, allow_hyphen_values = true)]
    pub max: Option<f64>,
}

impl FilterArgs {
    /// Build the filter state. A single amount bound is completed with the
    /// dataset's opposite bound. A `--to` without `--from` prints a warning.
    pub fn to_state(&self, dataset: &Dataset) -> Result<FilterState> {
        let amount_range = match (self.min, self.max) {
            (None, None) => None,
            (lo, hi) => {
                let bounds = dataset.amount_bounds();
                Some((
                    lo.or(bounds.map(|b| b.0)).unwrap_or(f64::NEG_INFINITY),
                    hi.or(bounds.map(|b| b.1)).unwrap_or(f64::INFINITY),
                ))
            }
        };
        let state =
            FilterState::from_inputs(self.from_date.as_deref(), self.to_date.as_deref(), amount_range)?;
        if state.end_date_ignored() {
            eprintln!("{}", "Warning: --to has no effect without --from".yellow());
        }
        Ok(state)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SummaryBy {
    /// Paid amount per service category
    Category,
    /// Paid amount per payer
    Payer,
    /// Paid amount per month, faceted by year
    Month,
    /// Paid amount per payer and year
    PayerYear,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Open the interactive dashboard (default).
    Dashboard,
    /// Print the filtered claims as a table.
    Table {
        #[command(flatten)]
        filter: FilterArgs,
        /// Sort columns, comma separated, primary first (e.g. payer,paid_amount)
        #[arg(long, value_delimiter = ',')]
        sort: Vec<String>,
        /// Sort descending
        #[arg(long)]
        desc: bool,
        /// Page to show (1-based). Without it every row is printed.
        #[arg(long)]
        page: Option<usize>,
        /// Rows per page (default from settings)
        #[arg(long = "page-size")]
        page_size: Option<usize>,
    },
    /// Aggregate paid amounts over the filtered claims.
    Summary {
        #[command(flatten)]
        filter: FilterArgs,
        /// Grouping to report
        #[arg(long, value_enum, default_value_t = SummaryBy::Category)]
        by: SummaryBy,
    },
    /// List payers with their totals.
    Payers {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Yearly totals for one payer.
    Payer {
        /// Payer name, exactly as it appears in the dataset
        name: String,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Write the filtered claims to a CSV file.
    Export {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output path (default: <dataset dir>/exports/claims-YYYY-MM-DD.csv)
        #[arg(long)]
        output: Option<String>,
    },
    /// Print the normalized form of a specialty label.
    Normalize {
        text: String,
    },
    /// Show the current dataset and summary statistics.
    Status,
    /// Make a dataset the default for future runs.
    Use {
        /// Path to a CSV or XLSX claims file
        path: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::test_support::sample_dataset;

    #[test]
    fn test_filter_args_complete_single_bound() {
        let ds = sample_dataset();
        let args = FilterArgs {
            min: Some(100.0),
            ..Default::default()
        };
        assert_eq!(args.to_state(&ds).unwrap().amount_range, Some((100.0, 1000.0)));

        let args = FilterArgs {
            max: Some(100.0),
            ..Default::default()
        };
        assert_eq!(args.to_state(&ds).unwrap().amount_range, Some((50.0, 100.0)));
    }

    #[test]
    fn test_filter_args_without_amount() {
        let ds = sample_dataset();
        let args = FilterArgs {
            from_date: Some("2018-05-01".to_string()),
            ..Default::default()
        };
        let state = args.to_state(&ds).unwrap();
        assert_eq!(state.amount_range, None);
        assert!(state.start_date.is_some());
    }

    #[test]
    fn test_filter_args_bad_date() {
        let ds = sample_dataset();
        let args = FilterArgs {
            to_date: Some("31/12/2018".to_string()),
            ..Default::default()
        };
        assert!(args.to_state(&ds).is_err());
    }

    #[test]
    fn test_cli_parses_table_flags() {
        let cli = Cli::parse_from([
            "claimdash", "--data", "c.csv", "table", "--from", "2018-01-01", "--min", "-5",
            "--sort", "payer,paid_amount", "--desc", "--page", "2",
        ]);
        assert_eq!(cli.data.as_deref(), Some("c.csv"));
        match cli.command {
            Some(Commands::Table { filter, sort, desc, page, .. }) => {
                assert_eq!(filter.from_date.as_deref(), Some("2018-01-01"));
                assert_eq!(filter.min, Some(-5.0));
                assert_eq!(sort, vec!["payer", "paid_amount"]);
                assert!(desc);
                assert_eq!(page, Some(2));
            }
            _ => panic!("expected table command"),
        }
    }

    #[test]
    fn test_cli_parses_summary_by() {
        let cli = Cli::parse_from(["claimdash", "summary", "--by", "payer-year"]);
        match cli.command {
            Some(Commands::Summary { by, .. }) => assert_eq!(by, SummaryBy::PayerYear),
            _ => panic!("expected summary command"),
        }
    }
}
