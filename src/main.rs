//! quadfit - resize textures so they import at multiples of four

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use quadfit::batch::{
    discover_assets, BatchItem, BatchPipeline, DiscoverOptions, FsStore, ProcessOptions, Progress,
};
use quadfit::config::ImportSettings;
use quadfit::paths;
use quadfit::textures::{
    analyze, analyze_verified, ImageCrateCodec, ImageDimensions, ImportConstraint,
    ResampleStrategy, DEFAULT_CHUNK_ROWS,
};

#[derive(Parser)]
#[command(name = "quadfit")]
#[command(version)]
#[command(about = "Resize textures so their imported size is a multiple of four")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging (use RUST_LOG=debug for more detail)
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Options shared by `scan` and `process`
#[derive(Args)]
struct ScanArgs {
    /// Folder containing the assets
    folder: PathBuf,

    /// Include subfolders
    #[arg(short, long)]
    recursive: bool,

    /// Importer max size applied to every asset (overrides the settings default)
    #[arg(long, conflicts_with = "no_constraint")]
    max_size: Option<u32>,

    /// Ignore all max-size constraints
    #[arg(long)]
    no_constraint: bool,

    /// Settings file (defaults to quadfit.json in the folder, if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Nudge constrained source sizes that would miss the target by a pixel
    #[arg(long)]
    verify_plan: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List assets whose imported size is not a multiple of four
    Scan {
        #[command(flatten)]
        args: ScanArgs,

        /// Print items as JSON
        #[arg(long)]
        json: bool,
    },

    /// Scan, then resize the assets that need it
    Process {
        #[command(flatten)]
        args: ScanArgs,

        /// Destination rows resampled per band
        #[arg(long, default_value_t = DEFAULT_CHUNK_ROWS)]
        chunk_rows: u32,

        /// Resample the whole image in one pass instead of in bands
        #[arg(long, conflicts_with = "chunk_rows")]
        whole: bool,

        /// Only process assets whose path below the folder contains one of these
        /// (case-insensitive)
        #[arg(long)]
        only: Vec<String>,

        /// Decode, resize and encode, but do not write anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Show the resize plan for a given size
    Plan {
        width: u32,
        height: u32,

        /// Importer max size
        #[arg(long)]
        max_size: Option<u32>,

        /// Re-check the source size against the clamp
        #[arg(long)]
        verify: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Only initialize logging if verbose or RUST_LOG is set
    if cli.verbose || std::env::var("RUST_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive(if cli.verbose {
                "quadfit=debug".parse()?
            } else {
                "quadfit=warn".parse()?
            }))
            .init();
    }

    match cli.command {
        Commands::Scan { args, json } => {
            let items = scan(&args)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else if items.is_empty() {
                println!("All textures are already multiples of four.");
            } else {
                print_items(&args.folder, &items);
                println!("\n{} texture(s) need resizing", items.len());
            }
        }

        Commands::Process {
            args,
            chunk_rows,
            whole,
            only,
            dry_run,
        } => {
            let mut items = scan(&args)?;
            if !only.is_empty() {
                for item in &mut items {
                    let relative = item.path.strip_prefix(&args.folder).unwrap_or(&item.path);
                    item.selected = paths::matches_any(relative, &only);
                }
            }

            let selected = items.iter().filter(|i| i.selected).count();
            if selected == 0 {
                println!("Nothing to process.");
                return Ok(());
            }

            let strategy = if whole {
                ResampleStrategy::WholeImage
            } else {
                anyhow::ensure!(chunk_rows > 0, "--chunk-rows must be greater than zero");
                ResampleStrategy::Chunked { rows: chunk_rows }
            };
            let options = ProcessOptions { strategy, dry_run };

            let pb = progress_bar(selected as u64, "Resizing")?;
            let mut pipeline = BatchPipeline::new(ImageCrateCodec::default(), FsStore);
            let result = pipeline.process(&items, &options, |p| advance(&pb, p));
            pb.finish_and_clear();

            println!("=== Resize Summary ===");
            println!("Processed: {}", result.total);
            println!("Succeeded: {}", result.succeeded);
            println!("Failed:    {}", result.failed);
            if dry_run {
                println!("\nDry run, no files were written.");
            }

            if !result.is_success() {
                eprintln!("\nSome textures failed. Run with --verbose for details.");
                std::process::exit(1);
            }
        }

        Commands::Plan {
            width,
            height,
            max_size,
            verify,
        } => {
            anyhow::ensure!(width > 0 && height > 0, "width and height must be non-zero");
            anyhow::ensure!(max_size != Some(0), "--max-size must be greater than zero");

            let dims = ImageDimensions::new(width, height);
            let constraint = max_size.map(ImportConstraint::new);

            let plan = if verify {
                let (plan, check) = analyze_verified(dims, constraint);
                println!("Check:        {:?}", check);
                plan
            } else {
                analyze(dims, constraint)
            };

            println!("Source:       {}", plan.source());
            println!("Imported:     {}", plan.imported());
            println!("New imported: {}", plan.new_imported());
            println!("New source:   {}", plan.target());
            println!(
                "Needs resize: {}",
                if plan.needs_processing { "Yes" } else { "No" }
            );
        }
    }

    Ok(())
}

/// Discover and analyze the assets named by `args`
fn scan(args: &ScanArgs) -> Result<Vec<BatchItem>> {
    let mut settings = ImportSettings::resolve(args.config.as_deref(), &args.folder)
        .context("Failed to load import settings")?;
    if args.no_constraint {
        settings = settings.without_constraints();
    } else if let Some(max_size) = args.max_size {
        anyhow::ensure!(max_size > 0, "--max-size must be greater than zero");
        settings = settings.with_default_max_size(Some(max_size));
    }

    let options = DiscoverOptions {
        recursive: args.recursive,
        exclude: settings.exclude.clone(),
    };
    let files = discover_assets(&args.folder, &options)
        .with_context(|| format!("Failed to list assets in {}", args.folder.display()))?;

    let pb = progress_bar(files.len() as u64, "Scanning")?;
    let mut pipeline = BatchPipeline::new(ImageCrateCodec::default(), FsStore)
        .with_plan_verification(args.verify_plan);
    let items = pipeline.scan(&files, &settings, |p| advance(&pb, p));
    pb.finish_and_clear();

    Ok(items)
}

fn progress_bar(len: u64, label: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "{{spinner:.green}} [{{elapsed_precise}}] {label} [{{bar:40.cyan/blue}}] {{pos}}/{{len}} | {{msg}}"
            ))?
            .progress_chars("=>-"),
    );
    Ok(pb)
}

fn advance(pb: &ProgressBar, progress: Progress<'_>) {
    pb.set_position(progress.current as u64);
    pb.set_message(progress.name.to_string());
}

fn print_items(folder: &Path, items: &[BatchItem]) {
    println!(
        "{:<50} {:>11} {:>11} {:>11} {:>11}",
        "Path", "Current", "Imported", "New import", "New size"
    );
    for item in items {
        let relative = item.path.strip_prefix(folder).unwrap_or(&item.path);
        let plan = &item.plan;
        println!(
            "{:<50} {:>11} {:>11} {:>11} {:>11}",
            relative.display(),
            plan.source().to_string(),
            plan.imported().to_string(),
            plan.new_imported().to_string(),
            plan.target().to_string()
        );
    }
}
