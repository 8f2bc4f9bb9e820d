mod browser;
mod cli;
mod dataset;
mod error;
mod filter;
mod fmt;
mod loader;
mod models;
mod normalizer;
mod reports;
mod settings;
mod tui;

use clap::Parser;

use cli::{Cli, Commands};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let data = cli.data.as_deref();

    let result = match cli.command {
        None | Some(Commands::Dashboard) => cli::dashboard::run(data),
        Some(Commands::Table {
            filter,
            sort,
            desc,
            page,
            page_size,
        }) => cli::table::run(data, &filter, &sort, desc, page, page_size),
        Some(Commands::Summary { filter, by }) => cli::summary::run(data, &filter, by),
        Some(Commands::Payers { filter }) => cli::summary::payers(data, &filter),
        Some(Commands::Payer { name, filter }) => cli::summary::payer(data, &name, &filter),
        Some(Commands::Export { filter, output }) => cli::export::run(data, &filter, output),
        Some(Commands::Normalize { text }) => {
            println!("{}", normalizer::normalize(&text));
            Ok(())
        }
        Some(Commands::Status) => cli::status::run(data),
        Some(Commands::Use { path }) => cli::load::run(&path),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
