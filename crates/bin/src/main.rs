//! finseries CLI binary.
//!
//! Ingests OpenDART balance sheets into a local SQLite store and runs the
//! ratio, comparison and forecast analyses over it.

mod integration;

use clap::{Args, Parser, Subcommand};
use finseries::export::stored_rows;
use finseries::{ExportFormat, Exporter, ServiceError, current_year, ingest, view};
use finseries_analysis::{
    ComparisonMerger, IndicatorCalculator, Selection, dedupe_selections, validate_year,
};
use finseries_data::dart::{CorpDirectory, DART_BASE_URL, DartClient};
use finseries_data::dart::corp_code::DEFAULT_SEARCH_LIMIT;
use finseries_data::store::StatementStore;
use finseries_forecast::ForecastPipeline;
use indicatif::{ProgressBar, ProgressStyle};
use integration::report;
use integration::store_manager::open_store;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Earliest fiscal year OpenDART serves structured statements for.
const MIN_YEAR: i32 = 2015;

#[derive(Parser)]
#[command(name = "finseries")]
#[command(about = "finseries: OpenDART balance-sheet series, ratios and forecasts", long_about = None)]
#[command(version)]
struct Cli {
    /// SQLite database path
    #[arg(long, global = true, env = "FINSERIES_DB")]
    db: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct DartArgs {
    /// OpenDART API key
    #[arg(long, env = "DART_API_KEY", hide_env_values = true)]
    api_key: String,

    /// OpenDART API base URL
    #[arg(long, env = "DART_BASE_URL", default_value = DART_BASE_URL)]
    base_url: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the corp-code catalog by name
    Search {
        /// Part of a company name
        term: String,

        /// Maximum number of matches
        #[arg(long, default_value_t = DEFAULT_SEARCH_LIMIT)]
        limit: usize,

        #[command(flatten)]
        dart: DartArgs,
    },

    /// Fetch and store the ten-year balance sheet of one or more companies
    Ingest {
        /// Exact company names
        #[arg(required = true)]
        companies: Vec<String>,

        #[command(flatten)]
        dart: DartArgs,
    },

    /// List stored companies
    Companies,

    /// Show the stored balance sheet of a company
    View {
        /// Company name
        company: String,

        /// Fiscal year (defaults to the latest stored year)
        #[arg(long)]
        year: Option<String>,
    },

    /// Compute financial ratios
    Indicators {
        /// Company name
        company: String,

        /// Fiscal year (defaults to the latest stored year)
        #[arg(long)]
        year: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Compare companies and years side by side
    Compare {
        /// Selections as `company:year`
        #[arg(required = true)]
        selections: Vec<String>,

        /// Print chart series (every account, missing values as zero)
        #[arg(long)]
        chart: bool,
    },

    /// Forecast total assets, equity and liabilities
    Forecast {
        /// Company name
        company: String,

        /// Year to project the inputs to (defaults to the latest year)
        #[arg(long)]
        year: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Export every stored row
    Export {
        /// Output format: csv, json or pretty-json
        #[arg(long, default_value = "csv")]
        format: ExportFormat,

        /// Output file (defaults to stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // A missing .env file is not an error
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "finseries=debug" } else { "finseries=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let db = cli.db.as_deref();

    match cli.command {
        Commands::Search { term, limit, dart } => search(&term, limit, &dart).await?,
        Commands::Ingest { companies, dart } => ingest_companies(&companies, &dart, db).await?,
        Commands::Companies => {
            let store = open_store(db)?;
            report::print_companies(&store.companies()?);
        }
        Commands::View { company, year } => {
            let store = open_store(db)?;
            let year = year.as_deref().map(parse_year).transpose()?;
            report::print_view(&view(&store, company.trim(), year)?);
        }
        Commands::Indicators {
            company,
            year,
            json,
        } => indicators(company.trim(), year.as_deref(), json, db)?,
        Commands::Compare { selections, chart } => compare(&selections, chart, db)?,
        Commands::Forecast {
            company,
            year,
            json,
        } => {
            let store = open_store(db)?;
            let target_year = year.as_deref().map(parse_year).transpose()?;
            let outcome = ForecastPipeline::new(&store).run(company.trim(), target_year)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report::forecast_json(&outcome))?);
            } else {
                report::print_forecast(&outcome);
            }
        }
        Commands::Export { format, output } => {
            let store = open_store(db)?;
            let rows = stored_rows(&store)?;
            match output {
                Some(path) => {
                    rows.export_to_file(&path, format)?;
                    println!("Exported {} rows to {}", rows.len(), path.display());
                }
                None => print!("{}", rows.export_to_string(format)?),
            }
        }
    }

    Ok(())
}

fn parse_year(input: &str) -> Result<i32, Box<dyn std::error::Error>> {
    Ok(validate_year(input, Some(MIN_YEAR))?)
}

fn spinner(message: &str) -> Result<ProgressBar, Box<dyn std::error::Error>> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message(message.to_string());
    Ok(pb)
}

async fn load_directory(client: &DartClient) -> Result<CorpDirectory, Box<dyn std::error::Error>> {
    let directory = CorpDirectory::new();
    let pb = spinner("Loading corp-code catalog...")?;
    match directory.try_load(client).await {
        Ok(count) => {
            pb.finish_with_message(format!("Loaded {} companies", count));
            Ok(directory)
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            Err(format!("Failed to load corp-code catalog: {}", e).into())
        }
    }
}

async fn search(
    term: &str,
    limit: usize,
    dart: &DartArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = DartClient::with_base_url(&dart.api_key, &dart.base_url)?;
    let directory = load_directory(&client).await?;
    report::print_search(term, &directory.search(term, limit));
    Ok(())
}

async fn ingest_companies(
    companies: &[String],
    dart: &DartArgs,
    db: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let client = DartClient::with_base_url(&dart.api_key, &dart.base_url)?;
    let directory = load_directory(&client).await?;
    let store = open_store(db)?;
    let year = current_year();

    let mut failed = 0;
    for name in companies {
        let pb = spinner(&format!("Fetching {}...", name))?;
        match ingest(&directory, &client, &store, name, year).await {
            Ok(outcome) => pb.finish_with_message(format!("✓ {}", outcome)),
            Err(e) => {
                pb.finish_with_message(ingest_failure(name, &e));
                failed += 1;
            }
        }
    }

    if failed > 0 {
        return Err(format!("{} of {} companies failed", failed, companies.len()).into());
    }
    Ok(())
}

fn ingest_failure(name: &str, err: &ServiceError) -> String {
    if err.is_upstream() {
        format!("✗ {}: {} (OpenDART request failed, retry later)", name, err)
    } else {
        format!("✗ {}: {}", name, err)
    }
}

fn indicators(
    company: &str,
    year: Option<&str>,
    json: bool,
    db: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let store = open_store(db)?;
    let year = match year {
        Some(y) => parse_year(y)?,
        None => *store
            .years_for_company(company)?
            .first()
            .ok_or_else(|| format!("No stored statements for '{}'", company))?,
    };

    let ratios = IndicatorCalculator::new(&store).compute(company, year)?;
    if json {
        println!("{}", ratios.export_to_string(ExportFormat::PrettyJson)?);
    } else {
        report::print_ratios(company, year, &ratios);
    }
    Ok(())
}

fn parse_selection(input: &str) -> Result<Selection, Box<dyn std::error::Error>> {
    let (name, year) = input
        .rsplit_once(':')
        .ok_or_else(|| format!("Selection '{}' must look like company:year", input))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Selection '{}' has no company name", input).into());
    }
    Ok(Selection::new(name, parse_year(year)?))
}

fn compare(
    selections: &[String],
    chart: bool,
    db: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = selections
        .iter()
        .map(|s| parse_selection(s))
        .collect::<Result<Vec<_>, _>>()?;

    let (unique, duplicates) = dedupe_selections(&parsed);
    if !duplicates.is_empty() {
        println!("Ignoring repeated selections: {}", duplicates.join(", "));
    }

    let store = open_store(db)?;
    let merger = ComparisonMerger::new(&store);

    if chart {
        match merger.chart_series(&unique)? {
            Some(series) => report::print_chart(&series),
            None => println!("No data for the selected companies and years"),
        }
    } else {
        match merger.merge(&unique)? {
            Some(table) => report::print_comparison(&table),
            None => println!("No accounts in common across the selections"),
        }
    }
    Ok(())
}
