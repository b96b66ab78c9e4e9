//! FeatureLab CLI: ingest, list, show and export commands.
//!
//! Commands:
//! - `ingest`: fetch tickers, run the feature pipeline, store monthly partitions
//! - `list`: list stored partitions
//! - `show`: print the rows of one partition
//! - `export`: write one partition, or all of them, as CSV

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use featurelab_core::data::{CsvProvider, DataProvider, SyntheticProvider, YahooProvider};
use featurelab_core::domain::{EnrichedRow, ENRICHED_COLUMNS};
use featurelab_store::{
    export_all, export_partition, write_csv, ParquetStore, PartitionStore, RunConfig, RunSummary, Runner,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "featurelab",
    about = "FeatureLab CLI: OHLCV feature engineering into monthly partitions"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct StorageArgs {
    /// Storage root directory.
    #[arg(long, default_value = "data")]
    root: PathBuf,

    /// Database name (subdirectory of the root).
    #[arg(long, default_value = "stock_data")]
    database: String,
}

impl StorageArgs {
    fn open(&self) -> Result<ParquetStore> {
        ParquetStore::open(&self.root, &self.database)
            .with_context(|| format!("failed to open store at {}", self.root.join(&self.database).display()))
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Yahoo,
    Csv,
    Synthetic,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch tickers, compute indicators and features, store monthly partitions.
    Ingest {
        /// Path to a TOML run config.
        #[arg(long, conflicts_with_all = ["tickers", "start", "end"])]
        config: Option<PathBuf>,

        /// Tickers to ingest (comma separated).
        #[arg(long, value_delimiter = ',')]
        tickers: Vec<String>,

        /// Start date (YYYY-MM-DD), inclusive.
        #[arg(long)]
        start: Option<NaiveDate>,

        /// End date (YYYY-MM-DD), inclusive. Defaults to today.
        #[arg(long)]
        end: Option<NaiveDate>,

        /// Where raw rows come from.
        #[arg(long, value_enum, default_value_t = Source::Yahoo)]
        source: Source,

        /// Directory of `{TICKER}.csv` files for `--source csv`.
        #[arg(long, default_value = "data/raw")]
        input_dir: PathBuf,

        /// Storage root directory (overrides the config file).
        #[arg(long)]
        root: Option<PathBuf>,

        /// Database name (overrides the config file).
        #[arg(long)]
        database: Option<String>,

        /// Extra attempts per Yahoo request after a transient failure.
        #[arg(long, default_value_t = 3)]
        retries: u32,

        /// Base delay between Yahoo retries, in milliseconds (doubles per attempt).
        #[arg(long, default_value_t = 500)]
        retry_delay_ms: u64,

        /// Process tickers one at a time.
        #[arg(long, default_value_t = false)]
        sequential: bool,
    },
    /// List stored partitions.
    List {
        #[command(flatten)]
        storage: StorageArgs,
    },
    /// Print the rows of a partition.
    Show {
        /// Partition name, e.g. AAPL_2023_04.
        partition: String,

        /// Print at most this many rows.
        #[arg(long)]
        limit: Option<usize>,

        #[command(flatten)]
        storage: StorageArgs,
    },
    /// Export partitions as CSV.
    Export {
        /// Partition name, e.g. AAPL_2023_04.
        #[arg(required_unless_present = "all", conflicts_with = "all")]
        partition: Option<String>,

        /// Output file. Defaults to stdout.
        #[arg(long)]
        out: Option<PathBuf>,

        /// Export every stored partition.
        #[arg(long, default_value_t = false)]
        all: bool,

        /// Output directory for `--all`.
        #[arg(long, default_value = "exports")]
        out_dir: PathBuf,

        #[command(flatten)]
        storage: StorageArgs,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            config,
            tickers,
            start,
            end,
            source,
            input_dir,
            root,
            database,
            retries,
            retry_delay_ms,
            sequential,
        } => {
            let mut run_config = match config {
                Some(path) => RunConfig::from_file(&path)?,
                None => {
                    let Some(start) = start else {
                        bail!("--start is required without --config");
                    };
                    let end = end.unwrap_or_else(|| chrono::Local::now().date_naive());
                    RunConfig::new(tickers, start, end)
                }
            };
            if let Some(root) = root {
                run_config.storage.root = root;
            }
            if let Some(database) = database {
                run_config.storage.database_name = database;
            }
            let retry = RetryArgs {
                retries,
                base_delay: Duration::from_millis(retry_delay_ms),
            };
            run_ingest(&run_config, source, input_dir, retry, !sequential)
        }
        Commands::List { storage } => run_list(&storage),
        Commands::Show {
            partition,
            limit,
            storage,
        } => run_show(&storage, &partition, limit),
        Commands::Export {
            partition,
            out,
            all,
            out_dir,
            storage,
        } => run_export(&storage, partition, out, all, out_dir),
    }
}

struct RetryArgs {
    retries: u32,
    base_delay: Duration,
}

fn run_ingest(
    config: &RunConfig,
    source: Source,
    input_dir: PathBuf,
    retry: RetryArgs,
    parallel: bool,
) -> Result<()> {
    let provider: Box<dyn DataProvider> = match source {
        Source::Yahoo => Box::new(YahooProvider::new()?.with_retries(retry.retries, retry.base_delay)),
        Source::Csv => Box::new(CsvProvider::new(input_dir)),
        Source::Synthetic => Box::new(SyntheticProvider::new()),
    };
    let store = ParquetStore::open(&config.storage.root, &config.storage.database_name)?;

    let runner = Runner::new(provider.as_ref(), &store, config)?;
    let summary = runner.run_all(parallel);
    print_summary(&summary);
    info!(store = %store.dir().display(), "partitions stored");

    if !summary.is_success() {
        bail!("{} of {} tickers failed", summary.failed.len(), config.run.tickers.len());
    }
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "{:<10} {:>8} {:>8} {:>8} {:>8} {:>10}",
        "ticker", "input", "missing", "outlier", "rows", "partitions"
    );
    for r in &summary.succeeded {
        println!(
            "{:<10} {:>8} {:>8} {:>8} {:>8} {:>10}",
            r.ticker,
            r.stats.input_rows,
            r.stats.dropped_missing,
            r.stats.dropped_outliers,
            r.stats.output_rows,
            r.stats.partitions
        );
    }
    for f in &summary.failed {
        println!("{:<10} FAILED: {}", f.ticker, f.error);
    }
}

fn run_list(storage: &StorageArgs) -> Result<()> {
    let store = storage.open()?;
    let names = store.list()?;
    if names.is_empty() {
        println!("No partitions in {}", store.dir().display());
    }
    for name in names {
        println!("{name}");
    }
    Ok(())
}

fn fmt_cell(v: Option<f64>) -> String {
    v.map(|x| format!("{x:.4}")).unwrap_or_else(|| "-".into())
}

fn print_rows(rows: &[EnrichedRow]) {
    let header: Vec<String> = ENRICHED_COLUMNS.iter().map(|c| format!("{c:>13}")).collect();
    println!("{}", header.join(" "));
    for row in rows {
        let bar = row.bar();
        let mut cells = vec![
            format!("{:>13}", bar.timestamp.to_string()),
            format!("{:>13.4}", bar.open),
            format!("{:>13.4}", bar.high),
            format!("{:>13.4}", bar.low),
            format!("{:>13.4}", bar.close),
            format!("{:>13.0}", bar.volume),
        ];
        cells.extend(row.derived().into_iter().map(|v| format!("{:>13}", fmt_cell(v))));
        println!("{}", cells.join(" "));
    }
}

fn run_show(storage: &StorageArgs, partition: &str, limit: Option<usize>) -> Result<()> {
    let store = storage.open()?;
    let rows = store.read(partition)?;
    let shown = limit.unwrap_or(rows.len()).min(rows.len());
    print_rows(&rows[..shown]);
    if shown < rows.len() {
        println!("... {} more rows", rows.len() - shown);
    }
    Ok(())
}

fn run_export(
    storage: &StorageArgs,
    partition: Option<String>,
    out: Option<PathBuf>,
    all: bool,
    out_dir: PathBuf,
) -> Result<()> {
    let store = storage.open()?;

    if all {
        let paths = export_all(&store, &out_dir)?;
        println!("Exported {} partitions to {}", paths.len(), out_dir.display());
        return Ok(());
    }

    let Some(name) = partition else {
        bail!("a partition name or --all is required");
    };
    match out {
        Some(path) => {
            let rows = export_partition(&store, &name, &path)?;
            println!("Exported {rows} rows to {}", path.display());
        }
        None => {
            let rows = store.read(&name)?;
            write_csv(std::io::stdout().lock(), &rows)?;
        }
    }
    Ok(())
}
