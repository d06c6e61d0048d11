use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

use anyhow::{Context, Result, anyhow};
use clap::{Args, Parser, Subcommand};
use ocr_layout::{
    AnalysisSummary, ColumnPolicy, LayoutOptions, OutputFormat, OutputOptions, UnassignedPolicy,
    analyze_ocr_file,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "ocr-layout",
    version,
    about = "Reconstruct columns and rows from OCR text boxes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Lay out OCR results and write columns and rows as JSON or CSV.
    Analyze(AnalyzeArgs),
}

#[derive(Debug, Args)]
struct AnalyzeArgs {
    /// OCR JSON input (PaddleOCR result list or native pages document).
    #[arg(short, long)]
    input: PathBuf,

    /// Output path.
    #[arg(short, long)]
    output: PathBuf,

    /// Output format: json or csv. Defaults from the output extension.
    #[arg(long)]
    format: Option<String>,

    /// JSON file with layout options; flags below override its fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Column policy: anchored-with-fallback, anchored-only or projection-only.
    #[arg(long)]
    policy: Option<String>,

    /// Header label the anchored column finder looks for.
    #[arg(long)]
    anchor_keyword: Option<String>,

    /// Number of columns the anchored finder must produce (2-4).
    #[arg(long)]
    expected_columns: Option<usize>,

    /// Smallest year accepted as a year column header.
    #[arg(long)]
    min_year: Option<u32>,

    /// Largest year accepted as a year column header.
    #[arg(long)]
    max_year: Option<u32>,

    /// Horizontal expansion ratio for page-wide row building.
    #[arg(long)]
    global_expansion: Option<f64>,

    /// Vertical overlap threshold for page-wide row building.
    #[arg(long)]
    global_overlap: Option<f64>,

    /// Horizontal expansion ratio for in-column row building.
    #[arg(long)]
    column_expansion: Option<f64>,

    /// Vertical overlap threshold for in-column row building.
    #[arg(long)]
    column_overlap: Option<f64>,

    /// Smoothing window of the projection profile.
    #[arg(long)]
    smooth_window: Option<usize>,

    /// Gap threshold as a fraction of the profile peak.
    #[arg(long)]
    gap_threshold: Option<f64>,

    /// Minimum width of a projection column.
    #[arg(long)]
    min_column_width: Option<f64>,

    /// Fragments fitting no column: drop or nearest.
    #[arg(long)]
    unassigned: Option<String>,

    /// CSV delimiter character.
    #[arg(long, default_value = ",")]
    delimiter: char,

    /// Enable verbose warning output.
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &AnalyzeArgs) -> Result<LayoutOptions> {
    let Some(path) = &args.config else {
        return Ok(LayoutOptions::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read --config '{}'", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse --config '{}'", path.display()))
}

fn parse_options(args: &AnalyzeArgs) -> Result<LayoutOptions> {
    let mut options = load_config(args)?;

    if let Some(policy) = args.policy.as_deref() {
        options.policy = ColumnPolicy::from_str(policy)
            .map_err(|error| anyhow!("invalid column policy: {error}"))
            .context("failed to parse --policy")?;
    }
    if let Some(unassigned) = args.unassigned.as_deref() {
        options.unassigned = UnassignedPolicy::from_str(unassigned)
            .map_err(|error| anyhow!("invalid unassigned policy: {error}"))
            .context("failed to parse --unassigned")?;
    }
    if let Some(keyword) = &args.anchor_keyword {
        options.anchor.keyword.clone_from(keyword);
    }
    if let Some(expected) = args.expected_columns {
        options.anchor.expected_columns = expected;
    }
    if let Some(year) = args.min_year {
        options.anchor.min_year = year;
    }
    if let Some(year) = args.max_year {
        options.anchor.max_year = year;
    }
    if let Some(ratio) = args.global_expansion {
        options.global_rows.expansion_ratio = ratio;
    }
    if let Some(threshold) = args.global_overlap {
        options.global_rows.vertical_overlap_threshold = threshold;
    }
    if let Some(ratio) = args.column_expansion {
        options.column_rows.expansion_ratio = ratio;
    }
    if let Some(threshold) = args.column_overlap {
        options.column_rows.vertical_overlap_threshold = threshold;
    }
    if let Some(window) = args.smooth_window {
        options.projection.smooth_window = window;
    }
    if let Some(factor) = args.gap_threshold {
        options.projection.gap_threshold_factor = factor;
    }
    if let Some(width) = args.min_column_width {
        options.projection.min_column_width = width;
    }

    options.validate().context("invalid layout options")?;
    Ok(options)
}

fn parse_output_options(args: &AnalyzeArgs) -> Result<OutputOptions> {
    let format = match args.format.as_deref() {
        Some(format) => OutputFormat::from_str(format)
            .map_err(|error| anyhow!("invalid output format: {error}"))
            .context("failed to parse --format")?,
        None => OutputFormat::for_path(&args.output),
    };

    if !args.delimiter.is_ascii() {
        anyhow::bail!("delimiter must be a single ASCII character");
    }

    Ok(OutputOptions {
        format,
        delimiter: args.delimiter as u8,
    })
}

fn log_summary(summary: &AnalysisSummary, verbose: bool) {
    if summary.warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", summary.warnings.len());
    if verbose {
        for warning in &summary.warnings {
            eprintln!(
                "  - {:?} page={:?} fragment={:?} count={:?}: {}",
                warning.code, warning.page, warning.fragment_index, warning.count, warning.message
            );
        }
    }
}

fn run_analyze(args: &AnalyzeArgs) -> Result<AnalysisSummary> {
    let options = parse_options(args)?;
    let output_options = parse_output_options(args)?;
    analyze_ocr_file(&args.input, &args.output, &output_options, &options)
        .with_context(|| format!("failed to analyze '{}'", args.input.display()))
}

fn main() -> ExitCode {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ocr_layout=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Analyze(args) => match run_analyze(&args) {
            Ok(summary) => {
                log_summary(&summary, args.verbose);
                if summary.row_count() > 0 {
                    ExitCode::SUCCESS
                } else {
                    ExitCode::from(2)
                }
            }
            Err(error) => {
                eprintln!("error: {error:#}");
                ExitCode::from(1)
            }
        },
    }
}
