use std::process::ExitCode;

use clap::Parser;
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use xeno_harvester::app::{App, RunOptions};
use xeno_harvester::config::ConfigLoader;
use xeno_harvester::error::HarvestError;
use xeno_harvester::output::{JsonOutput, LogSink};
use xeno_harvester::store::Store;
use xeno_harvester::xeno::XenoCantoHttpClient;

#[derive(Parser)]
#[command(name = "xeno-hv")]
#[command(about = "Harvest xeno-canto recordings: per-species report plus quality-ranked downloads")]
#[command(version, author)]
struct Cli {
    /// Path to the JSON config (defaults to ./xeno-hv.json)
    #[arg(long)]
    config: Option<String>,

    /// Collect metadata and write the report only; download no audio
    #[arg(long)]
    skip_media: bool,

    /// Override the per-species download cap from the config
    #[arg(long)]
    max_per_species: Option<usize>,

    /// Only download recordings graded quality A
    #[arg(long)]
    only_high_quality: bool,

    /// Print the run summary as JSON instead of the human-readable form
    #[arg(long)]
    json: bool,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(harvest) = report.downcast_ref::<HarvestError>() {
            return ExitCode::from(map_exit_code(harvest));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &HarvestError) -> u8 {
    match error {
        HarvestError::MissingConfig
        | HarvestError::ConfigRead(_)
        | HarvestError::ConfigParse(_)
        | HarvestError::MissingApiKey
        | HarvestError::EmptyQuerySet
        | HarvestError::InvalidSpecies(_)
        | HarvestError::InvalidBoundingBox(_) => 2,
        HarvestError::XenoHttp(_)
        | HarvestError::XenoStatus { .. }
        | HarvestError::MalformedResponse(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ConfigLoader::resolve(cli.config.as_deref()).into_diagnostic()?;
    if let Some(cap) = cli.max_per_species {
        config.max_per_species = cap;
    }
    if cli.only_high_quality {
        config.only_high_quality = true;
    }

    let client = XenoCantoHttpClient::new(
        &config.api_key,
        config.request_timeout,
        config.media_timeout,
    )
    .into_diagnostic()?;
    let store = Store::new(config.dataset_root.clone());
    let app = App::new(store, client, config);

    let options = RunOptions {
        skip_media: cli.skip_media,
    };
    let summary = if cli.json {
        app.run(options, &JsonOutput).into_diagnostic()?
    } else {
        app.run(options, &LogSink).into_diagnostic()?
    };

    if cli.json {
        JsonOutput::print_summary(&summary).into_diagnostic()?;
    } else {
        print_run_summary(&summary);
    }
    Ok(())
}

fn print_run_summary(summary: &xeno_harvester::app::RunSummary) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    println!("{cyan}xeno-hv summary{reset}");
    println!(
        "{green}records: {} across {} species ({} queries){reset}",
        summary.total_records, summary.species, summary.queries
    );
    if summary.partial {
        println!("{yellow}warning: at least one query stopped early; counts are partial{reset}");
    }
    println!(
        "{green}downloads: {} new, {} already present, {} incomplete metadata, {} failed{reset}",
        summary.downloads.downloaded,
        summary.downloads.skipped_existing,
        summary.downloads.skipped_incomplete,
        summary.downloads.failed
    );
    if let Some(path) = &summary.report_path {
        println!("{cyan}report: {path}{reset}");
    }
    if let Some(path) = &summary.map_path {
        println!("{cyan}map: {path}{reset}");
    }
}
