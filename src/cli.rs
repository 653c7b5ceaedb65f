//! Command-line interface components.

use crate::config::{FilesystemConfig, default_csv_format};
use crate::filesystem::{CsvFormat, DataRequest, FileFreq, GroupSpace, find_datafiles, read_data};
use crate::models::{Driver, Level, ParseSummary, Workers};
use crate::timerange::{TimeRange, TimeRangeInput};
use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "uataq_fs")]
#[command(about = "Select and parse time-stamped observation files from a research filesystem")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Root of the research filesystem
    #[arg(short, long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Research group (defaults to lin)
    #[arg(short, long, global = true)]
    pub group: Option<String>,

    /// Increase logging verbosity (-v: info, -vv: debug, -vvv: trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only show errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the data files selected for a time range
    Files(SelectArgs),
    /// Parse the selected files into one table
    Read(ReadArgs),
    /// Show the highest processing level available for an instrument
    Levels {
        site: String,
        instrument: String,
    },
}

/// Which files to select
#[derive(ClapArgs, Debug, Clone)]
pub struct SelectArgs {
    pub site: String,
    pub instrument: String,
    pub logger: String,

    /// Processing level (raw, qaqc, calibrated, final); highest available if omitted
    #[arg(short, long)]
    pub level: Option<Level>,

    /// Single textual range, e.g. 2020-06 for the whole month
    #[arg(short, long, conflicts_with_all = ["start", "stop"])]
    pub time_range: Option<String>,

    /// Start of the range (inclusive)
    #[arg(long)]
    pub start: Option<String>,

    /// Stop of the range; partial dates cover the whole unit
    #[arg(long)]
    pub stop: Option<String>,

    /// Substring the file path must contain
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// Period each file covers (year, month, day, hour)
    #[arg(long, default_value = "month")]
    pub freq: FileFreq,

    /// File extension, including the dot
    #[arg(long, default_value = ".csv")]
    pub ext: String,

    /// Column holding the timestamp
    #[arg(long, default_value = "Time_UTC")]
    pub time_column: String,

    /// Lines to skip before the header row
    #[arg(long, default_value_t = 0)]
    pub skip_rows: usize,

    /// Search level directories recursively
    #[arg(long)]
    pub recursive: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ReadArgs {
    #[command(flatten)]
    pub select: SelectArgs,

    /// Parsing workers, a positive integer or "max"
    #[arg(short = 'n', long = "num-processes", default_value = "1")]
    pub num_processes: Workers,

    /// Output driver (polars or array)
    #[arg(long, default_value = "polars")]
    pub driver: Driver,

    /// Write the merged table to a .csv or .parquet file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Rows to print when no output file is given
    #[arg(long, default_value_t = 10)]
    pub head: usize,
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Progress bars are shown unless quiet
    pub fn show_progress(&self) -> bool {
        !self.quiet
    }

    fn config(&self, select: &SelectArgs) -> FilesystemConfig {
        let mut config = FilesystemConfig::new(&self.root)
            .with_recursive(select.recursive)
            .with_progress(self.show_progress())
            .with_format_all_levels(&select.instrument, select.format());
        if let Some(group) = &self.group {
            config = config.with_default_group(group);
        }
        config
    }
}

impl SelectArgs {
    pub fn time_range(&self) -> crate::Result<TimeRange> {
        TimeRange::build(
            self.time_range.clone().map(TimeRangeInput::Text),
            self.start.as_deref(),
            self.stop.as_deref(),
        )
    }

    /// Format for files named by their date, e.g. `2020_06.csv`
    pub fn format(&self) -> CsvFormat {
        default_csv_format(&self.logger, self.freq)
            .with_ext(&self.ext)
            .with_time_column(&self.time_column)
            .with_skip_rows(self.skip_rows)
    }

    pub fn request(&self) -> crate::Result<DataRequest> {
        let mut request = DataRequest::new(&self.site, &self.instrument, &self.logger)
            .with_time_range(self.time_range()?);
        if let Some(level) = self.level {
            request = request.with_level(level);
        }
        if let Some(pattern) = &self.pattern {
            request = request.with_pattern(pattern);
        }
        Ok(request)
    }
}

/// Set up structured logging based on CLI arguments
pub fn setup_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("uataq_fs={}", log_level)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .try_init()
        .context("Failed to initialise logging")?;

    debug!("Logging initialized at level: {}", log_level);
    Ok(())
}

/// Run the selected subcommand
pub async fn run(args: Args) -> Result<()> {
    debug!("Command line arguments: {:?}", args);

    match &args.command {
        Commands::Files(select) => run_files(&args, select),
        Commands::Read(read) => run_read(&args, read).await,
        Commands::Levels { site, instrument } => run_levels(&args, site, instrument),
    }
}

fn run_files(args: &Args, select: &SelectArgs) -> Result<()> {
    let config = args.config(select);
    config.validate()?;

    let registry = config.build_registry();
    let request = select.request()?;
    let files = find_datafiles(&registry, &request)?;

    println!(
        "{} {}",
        "Selected files for".bright_green().bold(),
        request.time_range.to_string().bright_cyan()
    );
    for file in &files {
        println!("  {} {}", file.period().to_string().bright_yellow(), file);
    }
    println!("{} file(s)", files.len().to_string().bold());
    Ok(())
}

async fn run_read(args: &Args, read: &ReadArgs) -> Result<()> {
    let start_time = Instant::now();
    let config = args
        .config(&read.select)
        .with_workers(read.num_processes)
        .with_driver(read.driver);
    config.validate()?;

    let registry = config.build_registry();
    let request = read.select.request()?;
    info!("Reading {} {} at {}", request.instrument, request.logger, request.site);

    let (mut data, summary) = read_data(&registry, &request, config.parse_options()).await?;

    match &read.output {
        Some(path) => {
            write_output(&mut data, path)?;
            println!("{} {}", "Wrote".bright_green().bold(), path.display());
        }
        None => println!("{}", data.head(Some(read.head))),
    }

    print_summary(&summary, start_time);
    Ok(())
}

fn run_levels(args: &Args, site: &str, instrument: &str) -> Result<()> {
    let config = FilesystemConfig::new(&args.root);
    config.validate()?;

    let registry = match &args.group {
        Some(group) => config.with_default_group(group).build_registry(),
        None => config.build_registry(),
    };
    let group = registry.get(None)?;
    let level = group.get_highest_lvl(site, instrument)?;

    println!(
        "{} {}/{}: {}",
        "Highest level for".bright_green().bold(),
        site,
        instrument,
        level.to_string().bright_cyan().bold()
    );
    Ok(())
}

/// Write a table as CSV or Parquet depending on the file extension
pub fn write_output(data: &mut DataFrame, path: &Path) -> Result<()> {
    let extension = path.extension().and_then(|ext| ext.to_str());
    if !matches!(extension, Some("csv" | "parquet")) {
        anyhow::bail!(
            "Unsupported output format for {}, expected .csv or .parquet",
            path.display()
        );
    }

    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;

    if extension == Some("parquet") {
        ParquetWriter::new(file)
            .finish(data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(data)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    Ok(())
}

fn print_summary(summary: &ParseSummary, start_time: Instant) {
    eprintln!();
    eprintln!("{}", "Read complete".bright_green().bold());
    eprintln!("   Files parsed: {}", summary.files_parsed);
    if summary.files_failed > 0 {
        eprintln!(
            "   Files failed: {}",
            summary.files_failed.to_string().bright_red().bold()
        );
    }
    eprintln!("   Rows: {}", summary.total_rows);
    eprintln!("   Workers: {}", summary.workers);
    eprintln!("   Time: {:.2?}", start_time.elapsed());
}
