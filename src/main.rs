use clap::Parser;
use githubipranges::{Client, IpRanges, Result};
use log::{error, info};
use std::fs;
use std::process::ExitCode;

mod cli;

/*-------------------------------------------------------------------------------------------------
  Main CLI Function
-------------------------------------------------------------------------------------------------*/

fn main() -> ExitCode {
    let args = cli::Args::parse();

    // Initialize logging
    if let Err(error) = stderrlog::new()
        .module(module_path!())
        .verbosity(args.verbose.log_level_filter())
        .init()
    {
        eprintln!("Failed to initialize logging: {error}");
    }

    match run(&args) {
        Ok(exit_code) => exit_code,
        Err(error) => {
            error!("{error}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &cli::Args) -> Result<ExitCode> {
    // Parse search CIDRs before loading so bad input fails fast
    let search_cidrs = cli::parse_prefixes(args)?;

    let ip_ranges = load_ip_ranges(args)?;
    info!(
        "Loaded {} GitHub IP prefixes for {} services",
        ip_ranges.len(),
        ip_ranges.services().len()
    );

    // Filter
    let filter = cli::build_filter(args, &ip_ranges)?;
    let filtered_ip_ranges = ip_ranges.filter(&filter);

    // Search
    let mut exit_code = ExitCode::SUCCESS;
    let display_ip_ranges = match &search_cidrs {
        Some(search_cidrs) => {
            let search_results = filtered_ip_ranges.search(search_cidrs);
            cli::log::search_results(search_cidrs, &search_results);
            if !search_results.all_found() {
                exit_code = ExitCode::FAILURE;
            }
            search_results.ip_ranges
        }
        None => filtered_ip_ranges,
    };

    // Output
    match args.output {
        cli::OutputFormat::Table => cli::output::range_table(&display_ip_ranges),
        cli::OutputFormat::Cidr => cli::output::prefixes_in_cidr_format(&display_ip_ranges),
        cli::OutputFormat::Netmask => cli::output::prefixes_in_netmask_format(&display_ip_ranges),
        cli::OutputFormat::Services => cli::output::services(&display_ip_ranges),
    }

    // Save to CSV
    if let Some(csv_file) = &args.csv_file {
        cli::csv::save(&display_ip_ranges, csv_file)?;
        info!("Saved GitHub IP ranges to {:?}", csv_file);
    }

    Ok(exit_code)
}

/// Load the IP ranges from `--file` when given, otherwise from the cache or the GitHub API.
fn load_ip_ranges(args: &cli::Args) -> Result<Box<IpRanges>> {
    match &args.file {
        Some(path) => {
            info!("Reading GitHub meta JSON from {:?}", path);
            let json = fs::read_to_string(path)?;
            IpRanges::from_json(&json)
        }
        None => Client::new().get_ranges(),
    }
}
