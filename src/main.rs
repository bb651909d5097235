use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info, warn};
use simstats::analytics::{self, reshape};
use simstats::config::{DEFAULT_DB_CONFIG, DEFAULT_HEIGHT, DEFAULT_WIDTH};
use simstats::error::config_error;
use simstats::{
    ChartRenderer, DatabaseConfig, JsonFormatter, PlotData, PlotSettings, PlotSummary,
    QueryCatalog, QueryParam, Result, Series, SimDatabase, SkuMergeReport, SqlQuery,
    TextFormatter,
};

#[derive(Debug, Parser)]
#[clap(
    name = "simstats",
    version,
    about = "Evaluates grid simulation output databases and renders charts"
)]
struct Arguments {
    #[clap(subcommand)]
    command: Command,

    /// JSON file holding the database connection string
    #[clap(long, global = true, value_name = "FILE", default_value = DEFAULT_DB_CONFIG)]
    db_config: PathBuf,

    /// Directory with .sql files overriding the built-in queries
    #[clap(long, global = true, value_name = "DIR")]
    queries_dir: Option<PathBuf>,

    /// Directory where charts are written
    #[clap(short = 'O', long, global = true, value_name = "DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Chart width in pixels
    #[clap(long, global = true, default_value_t = DEFAULT_WIDTH)]
    width: u32,

    /// Chart height in pixels
    #[clap(long, global = true, default_value_t = DEFAULT_HEIGHT)]
    height: u32,

    /// Format of the summary printed after each run
    #[clap(long, global = true, value_enum, default_value = "text")]
    output_format: OutputFormat,

    /// Write the summary to this file instead of stdout, - for stdout
    #[clap(short = 'o', long, global = true, value_name = "FILE")]
    outfile: Option<String>,

    /// Don't print progress or timing information
    #[clap(short = 'q', long, global = true)]
    quiet: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Queued and started transfers per time bin
    Transfers {
        /// Bin width in simulated seconds
        #[clap(long, default_value_t = 3600)]
        interval: i64,
    },
    /// Histogram of transfer durations
    Durations {
        #[clap(long, default_value_t = 200)]
        bins: usize,
    },
    /// Histogram of file sizes
    Filesize {
        #[clap(long, default_value_t = 200)]
        bins: usize,
    },
    /// Concurrent replicas per storage element over time
    Replicas,
    /// Cumulative traffic into each destination storage element
    Traffic,
    /// Histogram of the first column of a custom SELECT query
    Query {
        /// .sql file with a single SELECT statement
        #[clap(long, value_name = "FILE")]
        file: PathBuf,

        /// Value for a :name placeholder, repeatable
        #[clap(long = "param", value_name = "NAME=VALUE")]
        params: Vec<QueryParam>,

        #[clap(long, default_value_t = 200)]
        bins: usize,
    },
    /// Copy cloud SKU tiered rates into a simulation region config
    UpdateSku {
        /// Simulation config holding gcp.regions
        #[clap(long, value_name = "FILE", default_value = "config/gcp_default.json")]
        config: PathBuf,

        /// Cloud billing SKU catalog
        #[clap(long, value_name = "FILE", default_value = "skus.json")]
        skus: PathBuf,

        /// Where the merged config is written
        #[clap(long, value_name = "FILE", default_value = "config/new_gcp_default.json")]
        output: PathBuf,
    },
}

#[derive(Debug, ValueEnum, Clone, Copy)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Arguments::parse();
    let start_time = Instant::now();

    validate_arguments(&args)?;

    let progress = if !args.quiet {
        Some(create_spinner())
    } else {
        None
    };

    let output = match &args.command {
        Command::UpdateSku {
            config,
            skus,
            output,
        } => {
            let report = simstats::update_sim_config(config, skus, output)
                .with_context(|| format!("Failed to update {}", config.display()))?;
            finish(progress.as_ref());
            format_sku_report(&report, &args)?
        }
        command => {
            let summary = run_plot(command, &args, progress.as_ref())?;
            finish(progress.as_ref());
            format_plot(&summary, &args)?
        }
    };

    write_output(&output, &args)?;

    if !args.quiet {
        eprintln!("Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    }

    Ok(())
}

fn validate_arguments(args: &Arguments) -> Result<()> {
    if args.out_dir.exists() && !args.out_dir.is_dir() {
        return Err(config_error(
            format!(
                "Output directory path exists but is not a directory: {}",
                args.out_dir.display()
            ),
            Some("out_dir"),
        ));
    }

    match &args.command {
        Command::Transfers { interval } if *interval <= 0 => Err(config_error(
            "Bin interval must be greater than 0",
            Some("interval"),
        )),
        Command::Durations { bins } | Command::Filesize { bins } | Command::Query { bins, .. }
            if *bins == 0 =>
        {
            Err(config_error(
                "Number of bins must be greater than 0",
                Some("bins"),
            ))
        }
        Command::Query { file, .. } if !file.is_file() => Err(config_error(
            format!("Query file does not exist: {}", file.display()),
            Some("file"),
        )),
        _ => Ok(()),
    }
}

fn run_plot(
    command: &Command,
    args: &Arguments,
    progress: Option<&ProgressBar>,
) -> anyhow::Result<PlotSummary> {
    let config = DatabaseConfig::load(&args.db_config)?;
    let catalog = match &args.queries_dir {
        Some(dir) => QueryCatalog::from_dir(dir)?,
        None => QueryCatalog::builtin(),
    };
    let renderer = ChartRenderer::new(PlotSettings::new(&args.out_dir, args.width, args.height)?);

    let db = SimDatabase::open(&config)
        .with_context(|| format!("Failed to open {}", config.connection_str))?;

    let summary = match command {
        Command::Transfers { interval } => plot_transfers(&db, &catalog, &renderer, *interval, progress)?,
        Command::Durations { bins } => plot_durations(&db, &catalog, &renderer, *bins, progress)?,
        Command::Filesize { bins } => plot_file_sizes(&db, &catalog, &renderer, *bins, progress)?,
        Command::Replicas => plot_replicas(&db, &catalog, &renderer, progress)?,
        Command::Traffic => plot_traffic(&db, &catalog, &renderer, progress)?,
        Command::Query { file, params, bins } => {
            plot_query(&db, file, params, &renderer, *bins, progress)?
        }
        Command::UpdateSku { .. } => unreachable!("handled before opening the database"),
    };

    db.close()?;
    Ok(summary)
}

fn plot_transfers(
    db: &SimDatabase,
    catalog: &QueryCatalog,
    renderer: &ChartRenderer,
    interval: i64,
    progress: Option<&ProgressBar>,
) -> anyhow::Result<PlotSummary> {
    let rows = timed("query", progress, || db.transfer_times(catalog))?;
    let aligned = timed("transform", progress, || {
        let queued = analytics::bucket_events(&reshape::queued_events(&rows), interval)?;
        let started_events = reshape::started_events(&rows);
        let started = if started_events.is_empty() {
            warn!("No transfer has started yet");
            Series::empty(interval)
        } else {
            analytics::bucket_events(&started_events, interval)?
        };
        analytics::align_series(&queued, &started)
    })
    .context("Failed to bin transfers")?;
    let chart_path = timed("render", progress, || {
        renderer.grouped_bins(
            "transfers",
            "Queued and Started Transfers",
            ("queued", "started"),
            &aligned,
        )
    })?;

    Ok(PlotSummary {
        plot: "transfers".to_string(),
        chart_path,
        rows: rows.len(),
        data: PlotData::Aligned {
            labels: ("queued".to_string(), "started".to_string()),
            series: aligned,
        },
    })
}

fn plot_durations(
    db: &SimDatabase,
    catalog: &QueryCatalog,
    renderer: &ChartRenderer,
    bins: usize,
    progress: Option<&ProgressBar>,
) -> anyhow::Result<PlotSummary> {
    let rows = timed("query", progress, || db.transfer_times(catalog))?;
    let hist = timed("transform", progress, || {
        reshape::value_histogram(&reshape::transfer_durations(&rows), bins)
    })
    .context("Failed to build the transfer duration histogram")?;
    let chart_path = timed("render", progress, || {
        renderer.histogram("durations", "Transfer Durations", "Duration (s)", &hist)
    })?;

    Ok(PlotSummary {
        plot: "durations".to_string(),
        chart_path,
        rows: rows.len(),
        data: PlotData::Histogram(hist),
    })
}

fn plot_file_sizes(
    db: &SimDatabase,
    catalog: &QueryCatalog,
    renderer: &ChartRenderer,
    bins: usize,
    progress: Option<&ProgressBar>,
) -> anyhow::Result<PlotSummary> {
    let rows = timed("query", progress, || db.file_sizes(catalog))?;
    let hist = timed("transform", progress, || {
        let sizes: Vec<f64> = rows.iter().map(|f| f.bytes as f64).collect();
        reshape::value_histogram(&sizes, bins)
    })
    .context("Failed to build the file size histogram")?;
    let chart_path = timed("render", progress, || {
        renderer.histogram("filesize", "File Sizes", "File Size (bytes)", &hist)
    })?;

    Ok(PlotSummary {
        plot: "filesize".to_string(),
        chart_path,
        rows: rows.len(),
        data: PlotData::Histogram(hist),
    })
}

fn plot_replicas(
    db: &SimDatabase,
    catalog: &QueryCatalog,
    renderer: &ChartRenderer,
    progress: Option<&ProgressBar>,
) -> anyhow::Result<PlotSummary> {
    let rows = timed("query", progress, || db.replica_lifetimes(catalog))?;
    let curves = timed("transform", progress, || {
        let overlaps =
            analytics::count_overlaps_by_key(reshape::replica_intervals(&rows, None))?;
        Ok(overlaps
            .into_iter()
            .map(|(storage_element, points)| {
                let points: Vec<(i64, f64)> =
                    points.iter().map(|p| (p.time, p.count as f64)).collect();
                (storage_element, points)
            })
            .collect::<BTreeMap<String, Vec<(i64, f64)>>>())
    })
    .context("Failed to count concurrent replicas")?;
    let chart_path = timed("render", progress, || {
        renderer.curves(
            "replicas",
            "Replicas per Storage Element",
            "Replicas",
            &curves,
            true,
        )
    })?;

    Ok(PlotSummary {
        plot: "replicas".to_string(),
        chart_path,
        rows: rows.len(),
        data: PlotData::Curves(curves),
    })
}

fn plot_traffic(
    db: &SimDatabase,
    catalog: &QueryCatalog,
    renderer: &ChartRenderer,
    progress: Option<&ProgressBar>,
) -> anyhow::Result<PlotSummary> {
    let rows = timed("query", progress, || db.transfer_traffic(catalog))?;
    let curves = timed("transform", progress, || Ok(reshape::cumulative_traffic(&rows)))?;
    let chart_path = timed("render", progress, || {
        renderer.curves(
            "traffic",
            "Cumulative Traffic per Destination",
            "Traffic (bytes)",
            &curves,
            true,
        )
    })?;

    Ok(PlotSummary {
        plot: "traffic".to_string(),
        chart_path,
        rows: rows.len(),
        data: PlotData::Curves(curves),
    })
}

fn plot_query(
    db: &SimDatabase,
    file: &Path,
    params: &[QueryParam],
    renderer: &ChartRenderer,
    bins: usize,
    progress: Option<&ProgressBar>,
) -> anyhow::Result<PlotSummary> {
    let query = SqlQuery::from_file(file)
        .with_context(|| format!("Failed to load query from {}", file.display()))?;
    let name = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "query".to_string());
    debug!("Running {} with {} parameters", name, params.len());

    let values = timed("query", progress, || db.query_values(&query, params))?;
    let hist = timed("transform", progress, || reshape::value_histogram(&values, bins))
        .with_context(|| format!("Failed to build a histogram for {}", name))?;
    let chart_path = timed("render", progress, || {
        renderer.histogram(&name, &name, "Value", &hist)
    })?;

    Ok(PlotSummary {
        plot: name,
        chart_path,
        rows: values.len(),
        data: PlotData::Histogram(hist),
    })
}

/// Run one stage, logging how long it took
fn timed<T>(
    stage: &str,
    progress: Option<&ProgressBar>,
    run: impl FnOnce() -> Result<T>,
) -> Result<T> {
    if let Some(pb) = progress {
        pb.set_message(format!("{}...", stage));
    }
    let started = Instant::now();
    let result = run();
    info!("{} took: {:.3}s", stage, started.elapsed().as_secs_f64());
    result
}

fn format_plot(summary: &PlotSummary, args: &Arguments) -> Result<String> {
    match args.output_format {
        OutputFormat::Json => JsonFormatter::new()
            .with_pretty(true)
            .with_metadata(env!("CARGO_PKG_VERSION"), &args.db_config.display().to_string())
            .format_plot(summary),
        OutputFormat::Text => TextFormatter::new().format_plot(summary),
    }
}

fn format_sku_report(report: &SkuMergeReport, args: &Arguments) -> Result<String> {
    match args.output_format {
        OutputFormat::Json => JsonFormatter::new().with_pretty(true).format_sku_report(report),
        OutputFormat::Text => TextFormatter::new().format_sku_report(report),
    }
}

fn write_output(output: &str, args: &Arguments) -> anyhow::Result<()> {
    match &args.outfile {
        Some(outfile) if outfile != "-" => {
            fs::write(outfile, output).with_context(|| format!("Failed to write {}", outfile))?;
            info!("Results written to {}", outfile);
        }
        _ => println!("{}", output),
    }
    Ok(())
}

fn create_spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn finish(progress: Option<&ProgressBar>) {
    if let Some(pb) = progress {
        pb.finish_and_clear();
    }
}
