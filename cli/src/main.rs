//! docorder CLI - reading-order reconstruction of detector output

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use docorder::batch::{COMBINED_FILE, DEFAULT_JOBS, MERGED_FILE};
use docorder::detect::is_empty_source;
use docorder::render::{self, write_json};
use docorder::source::{read_json, standardize};
use docorder::{
    detect_source_kind, run_batch, BatchEvent, BatchOptions, CommandNormalizer, ContextStrategy,
    EngineOptions, JsonFormat, OverrunPolicy, PageSelection, Reconstructor, SourceKind, SourceSet,
};

#[derive(Parser)]
#[command(name = "docorder")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Rebuild reading order from table, key-value and OCR line detections", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconstruct a single document
    Run {
        /// Table detections
        #[arg(value_name = "TABLES")]
        tables: PathBuf,

        /// Key-value detections
        #[arg(value_name = "KV")]
        kv_pairs: PathBuf,

        /// OCR lines
        #[arg(value_name = "LINES")]
        lines: PathBuf,

        /// Output directory (stdout if not specified)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        /// Print plain text instead of JSON
        #[arg(long, conflicts_with = "output")]
        text: bool,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Reconstruct every document under mirrored source directories
    Batch {
        /// Root of the table detections
        #[arg(long, value_name = "DIR")]
        tables: PathBuf,

        /// Root of the key-value detections
        #[arg(long, value_name = "DIR")]
        kv: PathBuf,

        /// Root of the OCR lines
        #[arg(long, value_name = "DIR")]
        lines: PathBuf,

        /// Output root
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        /// Documents processed concurrently
        #[arg(short, long, env = "DOCORDER_JOBS", default_value_t = DEFAULT_JOBS)]
        jobs: usize,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        engine: EngineArgs,
    },

    /// Identify source files and summarize their content
    Inspect {
        /// Source files
        #[arg(value_name = "FILE", required = true)]
        inputs: Vec<PathBuf>,
    },

    /// Show version information
    Version,
}

#[derive(Args)]
struct EngineArgs {
    /// How context lines are collected
    #[arg(long, value_enum, default_value = "sequential")]
    strategy: StrategyArg,

    /// What happens to a line found below a region
    #[arg(long, value_enum, default_value = "retain")]
    overrun: OverrunArg,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Reconstruct pages the lines source does not cover
    #[arg(long)]
    lenient: bool,

    /// Process pages one at a time
    #[arg(long)]
    sequential: bool,

    /// Command that turns region content into JSON (content on stdin)
    #[arg(long, env = "DOCORDER_NORMALIZE_CMD", value_name = "CMD")]
    normalize_cmd: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    /// Stop at the first line below the region
    Sequential,
    /// Take every remaining line above the region
    Sweep,
}

impl From<StrategyArg> for ContextStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Sequential => ContextStrategy::Sequential,
            StrategyArg::Sweep => ContextStrategy::Sweep,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum OverrunArg {
    /// Leave the line for the next region
    Retain,
    /// Drop the line
    Discard,
}

impl From<OverrunArg> for OverrunPolicy {
    fn from(arg: OverrunArg) -> Self {
        match arg {
            OverrunArg::Retain => OverrunPolicy::Retain,
            OverrunArg::Discard => OverrunPolicy::Discard,
        }
    }
}

impl EngineArgs {
    fn reconstructor(&self) -> Result<Reconstructor, Box<dyn std::error::Error>> {
        let pages = match &self.pages {
            Some(p) => PageSelection::parse(p)?,
            None => PageSelection::All,
        };

        let options = EngineOptions::new()
            .with_strategy(self.strategy.into())
            .with_overrun(self.overrun.into())
            .with_require_lines(!self.lenient)
            .with_parallel(!self.sequential)
            .with_pages(pages);

        let reconstructor = Reconstructor::with_options(options);
        Ok(match &self.normalize_cmd {
            Some(cmd) => {
                reconstructor.with_normalizer(Arc::new(CommandNormalizer::from_command_line(cmd)?))
            }
            None => reconstructor,
        })
    }
}

fn json_format(compact: bool) -> JsonFormat {
    if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            tables,
            kv_pairs,
            lines,
            output,
            text,
            compact,
            engine,
        } => cmd_run(
            [tables.as_path(), kv_pairs.as_path(), lines.as_path()],
            output.as_deref(),
            text,
            compact,
            &engine,
        ),
        Commands::Batch {
            tables,
            kv,
            lines,
            output,
            jobs,
            compact,
            engine,
        } => {
            let options = BatchOptions::new(tables, kv, lines, output)
                .with_jobs(jobs)
                .with_format(json_format(compact));
            cmd_batch(&options, &engine)
        }
        Commands::Inspect { inputs } => cmd_inspect(&inputs),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn cmd_run(
    [tables, kv_pairs, lines]: [&Path; 3],
    output: Option<&Path>,
    text: bool,
    compact: bool,
    engine: &EngineArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let reconstructor = engine.reconstructor()?;
    let source = SourceSet::from_paths(tables, kv_pairs, lines)?;
    let report = reconstructor.reconstruct(&source);
    let format = json_format(compact);

    for failure in &report.failures {
        eprintln!(
            "{} page {}: {}",
            "Warning".yellow().bold(),
            failure.page_no,
            failure.error
        );
    }
    if !report.rejections.is_empty() {
        eprintln!(
            "{} {} source records rejected (RUST_LOG=warn for details)",
            "Warning".yellow().bold(),
            report.rejections.len()
        );
    }

    match output {
        Some(dir) => {
            write_json(
                dir.join(COMBINED_FILE),
                &render::records_to_json(&report, format)?,
            )?;
            write_json(dir.join(MERGED_FILE), &render::merged_to_json(&report, format)?)?;

            println!(
                "{} {} pages, {} regions",
                "Reconstructed".green(),
                report.stats.pages,
                report.stats.regions()
            );
            println!("\n{}", "Output files:".green().bold());
            println!("  {} {}", "├─".dimmed(), COMBINED_FILE);
            println!("  {} {}", "└─".dimmed(), MERGED_FILE);
        }
        None if text => println!("{}", render::to_text(&report)),
        None => println!("{}", render::records_to_json(&report, format)?),
    }

    Ok(())
}

fn cmd_batch(
    options: &BatchOptions,
    engine: &EngineArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let reconstructor = engine.reconstructor()?;

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let (tx, rx) = crossbeam_channel::unbounded();
    let report = thread::scope(|scope| {
        let worker = scope.spawn(|| run_batch(options, &reconstructor, Some(tx)));

        for event in rx.iter() {
            match event {
                BatchEvent::Discovered(total) => pb.set_length(total as u64),
                BatchEvent::Started(path) => pb.set_message(path.display().to_string()),
                BatchEvent::Finished(outcome) => {
                    if let Some(error) = &outcome.error {
                        pb.println(format!(
                            "{} {}: {}",
                            "Failed".red(),
                            outcome.relative_path.display(),
                            error
                        ));
                    }
                    pb.inc(1);
                }
            }
        }

        worker.join()
    })
    .map_err(|_| "batch worker panicked")??;

    pb.finish_with_message("Done!");

    let stats = report.stats();
    println!("\n{}", "Batch Summary".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Documents".bold(), report.outcomes.len());
    println!("{}: {}", "Succeeded".bold(), report.succeeded());
    println!("{}: {}", "Failed".bold(), report.failed());
    println!("{}: {}", "Pages".bold(), stats.pages);
    println!("{}: {}", "Regions".bold(), stats.regions());
    println!("{}: {}", "Rejected records".bold(), stats.rejected);
    println!("{}: {}", "Output".bold(), options.output_dir.display());

    if report.failed() > 0 {
        return Err(format!("{} documents failed", report.failed()).into());
    }
    Ok(())
}

fn cmd_inspect(inputs: &[PathBuf]) -> Result<(), Box<dyn std::error::Error>> {
    for (i, input) in inputs.iter().enumerate() {
        if i > 0 {
            println!();
        }
        let value = read_json(input)?;
        let kind = detect_source_kind(&value);

        println!("{}", "Source Information".cyan().bold());
        println!("{}", "─".repeat(40).dimmed());
        println!("{}: {}", "File".bold(), input.display());

        let Some(kind) = kind else {
            let label = if is_empty_source(&value) {
                "empty"
            } else {
                "unrecognised"
            };
            println!("{}: {}", "Kind".bold(), label.yellow());
            continue;
        };
        println!("{}: {}", "Kind".bold(), kind);

        let source = match kind {
            SourceKind::Tables => SourceSet::from_values(value, Value::Null, Value::Null)?,
            SourceKind::KeyValues => SourceSet::from_values(Value::Null, value, Value::Null)?,
            SourceKind::Lines => SourceSet::from_values(Value::Null, Value::Null, value)?,
        };
        let standardized = standardize(&source);

        let (records, usable) = match kind {
            SourceKind::Tables => (
                source.tables.len(),
                standardized.tables.values().map(Vec::len).sum::<usize>(),
            ),
            SourceKind::KeyValues => (
                source.kv_pairs.len(),
                standardized.kv_pairs.values().map(Vec::len).sum::<usize>(),
            ),
            SourceKind::Lines => (
                source.lines.iter().map(|p| p.content.len()).sum(),
                standardized.lines.values().map(Vec::len).sum::<usize>(),
            ),
        };
        let pages: Vec<String> = standardized
            .all_pages()
            .iter()
            .map(u32::to_string)
            .collect();

        println!("{}: {}", "Records".bold(), records);
        println!("{}: {}", "Usable".bold(), usable);
        println!("{}: {}", "Rejected".bold(), standardized.rejections.len());
        println!("{}: {}", "Pages".bold(), pages.join(", "));

        for rejection in standardized.rejections.iter().take(5) {
            println!(
                "  {} #{}: {}",
                "└─".dimmed(),
                rejection.index,
                rejection.reason
            );
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docorder".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Reading-order reconstruction for document detections");
    println!();
    println!("License: MIT");
}
