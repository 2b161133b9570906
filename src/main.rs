//! `xlsxjsonl` - スプレッドシートをJSONLに変換するコマンドラインツール

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;

use xlsxjsonl::{
    jsonl_file_name, CollisionPolicy, ConverterBuilder, DateFormat, JsonStyle, NonFinitePolicy,
    SheetSelector, DEFAULT_PREVIEW_ROWS, DEFAULT_TYPE_THRESHOLD,
};

#[derive(Debug, Parser)]
#[command(name = "xlsxjsonl", version, about = "Convert XLSX/XLS sheets to warehouse-ready JSONL")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a sheet to JSONL
    Convert(ConvertArgs),
    /// Print the first rows of a sheet as a Markdown table
    Preview(PreviewArgs),
    /// Infer column types and list rows whose values do not match
    Quality(QualityArgs),
    /// Run the upload web form
    #[cfg(feature = "web")]
    Serve(xlsxjsonl::web::ServerConfig),
}

#[derive(Debug, Args)]
struct SheetArgs {
    /// Sheet index (0-based)
    #[arg(long, conflicts_with = "sheet_name")]
    sheet_index: Option<usize>,

    /// Sheet name
    #[arg(long)]
    sheet_name: Option<String>,
}

impl SheetArgs {
    fn selector(&self) -> SheetSelector {
        match (&self.sheet_index, &self.sheet_name) {
            (Some(index), _) => SheetSelector::Index(*index),
            (None, Some(name)) => SheetSelector::Name(name.clone()),
            (None, None) => SheetSelector::First,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum CollisionArg {
    Suffix,
    Error,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum NonFiniteArg {
    Error,
    Null,
}

#[derive(Debug, Args)]
struct ConvertArgs {
    /// Input workbook (.xlsx or .xls)
    input: PathBuf,

    /// Output file, or `-` for stdout [default: <stem>.jsonl next to the input]
    #[arg(short, long)]
    output: Option<String>,

    #[command(flatten)]
    sheet: SheetArgs,

    /// What to do when two headers sanitize to the same name
    #[arg(long, value_enum, default_value = "suffix")]
    on_collision: CollisionArg,

    /// What to do with NaN and infinite numbers
    #[arg(long, value_enum, default_value = "error")]
    non_finite: NonFiniteArg,

    /// Write `{"a":1}` instead of `{"a": 1}`
    #[arg(long)]
    compact: bool,

    /// chrono format string for date cells [default: ISO 8601]
    #[arg(long)]
    date_format: Option<String>,
}

#[derive(Debug, Args)]
struct PreviewArgs {
    /// Input workbook (.xlsx or .xls)
    input: PathBuf,

    /// Number of rows to show
    #[arg(short = 'n', long, default_value_t = DEFAULT_PREVIEW_ROWS)]
    rows: usize,

    #[command(flatten)]
    sheet: SheetArgs,
}

#[derive(Debug, Args)]
struct QualityArgs {
    /// Input workbook (.xlsx or .xls)
    input: PathBuf,

    /// Share of non-missing values that must parse for a type to be inferred
    #[arg(long, default_value_t = DEFAULT_TYPE_THRESHOLD)]
    threshold: f64,

    #[command(flatten)]
    sheet: SheetArgs,
}

fn main() {
    init_tracing();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .try_init();
}

fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Convert(args) => convert(args),
        Command::Preview(args) => preview(args),
        Command::Quality(args) => quality(args),
        #[cfg(feature = "web")]
        Command::Serve(config) => {
            let runtime = tokio::runtime::Runtime::new().context("Failed to start tokio runtime")?;
            runtime.block_on(xlsxjsonl::web::serve(config))
        }
    }
}

fn convert(args: ConvertArgs) -> anyhow::Result<()> {
    let mut builder = ConverterBuilder::new()
        .with_sheet_selector(args.sheet.selector())
        .with_collision_policy(match args.on_collision {
            CollisionArg::Suffix => CollisionPolicy::Suffix,
            CollisionArg::Error => CollisionPolicy::Error,
        })
        .with_non_finite_policy(match args.non_finite {
            NonFiniteArg::Error => NonFinitePolicy::Error,
            NonFiniteArg::Null => NonFinitePolicy::Null,
        });
    if args.compact {
        builder = builder.with_json_style(JsonStyle::Compact);
    }
    if let Some(pattern) = args.date_format {
        builder = builder.with_date_format(DateFormat::Custom(pattern));
    }
    let converter = builder.build()?;

    let input = open_input(&args.input)?;
    let mut buffer = Vec::new();
    let summary = converter
        .convert(file_name(&args.input), input, &mut buffer)
        .with_context(|| format!("Failed to convert {}", args.input.display()))?;

    for column in summary
        .columns
        .iter()
        .filter(|column| column.original != column.sanitized)
    {
        info!("Column '{}' -> '{}'", column.original, column.sanitized);
    }

    match args.output.as_deref() {
        Some("-") => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(&buffer)?;
            stdout.flush()?;
        }
        Some(path) => write_output(Path::new(path), &buffer)?,
        None => {
            let name = jsonl_file_name(file_name(&args.input).unwrap_or_default());
            let path = args.input.with_file_name(name);
            write_output(&path, &buffer)?;
        }
    }

    info!(
        "Wrote {} rows from sheet '{}'",
        summary.row_count, summary.sheet_name
    );
    Ok(())
}

fn preview(args: PreviewArgs) -> anyhow::Result<()> {
    let converter = ConverterBuilder::new()
        .with_sheet_selector(args.sheet.selector())
        .with_preview_rows(args.rows)
        .build()?;

    let input = open_input(&args.input)?;
    let preview = converter
        .preview(file_name(&args.input), input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    if preview.headers().is_empty() {
        bail!("{} has no header row", args.input.display());
    }

    let mut stdout = io::stdout().lock();
    preview.render_markdown(&mut stdout)?;
    if preview.is_truncated() {
        writeln!(
            stdout,
            "\n(first {} of {} rows)",
            preview.rows().len(),
            preview.total_rows()
        )?;
    } else {
        writeln!(stdout, "\n({} rows)", preview.total_rows())?;
    }
    Ok(())
}

fn quality(args: QualityArgs) -> anyhow::Result<()> {
    let converter = ConverterBuilder::new()
        .with_sheet_selector(args.sheet.selector())
        .with_type_threshold(args.threshold)
        .build()?;

    let input = open_input(&args.input)?;
    let table = converter
        .load_table(file_name(&args.input), input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let report = converter.quality_report(&table);

    let mut stdout = io::stdout().lock();
    report.render_markdown(&mut stdout)?;

    let quarantined = report.quarantined();
    if quarantined.is_empty() {
        writeln!(stdout, "\nNo rows were quarantined.")?;
    } else {
        writeln!(stdout, "\n{} quarantined rows:", quarantined.len())?;
        for row in quarantined {
            writeln!(stdout, "- row {}: {}", row.row + 1, row.reason())?;
        }
    }
    Ok(())
}

fn open_input(path: &Path) -> anyhow::Result<File> {
    File::open(path).with_context(|| format!("Failed to open {}", path.display()))
}

fn file_name(path: &Path) -> Option<&str> {
    path.file_name().and_then(|name| name.to_str())
}

fn write_output(path: &Path, data: &[u8]) -> anyhow::Result<()> {
    fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Output written to {}", path.display());
    Ok(())
}
