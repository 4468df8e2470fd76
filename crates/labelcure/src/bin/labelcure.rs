//! labelcure CLI: reconcile a dataset with detector output and review the
//! discrepancies.

use clap::{Args, Parser, Subcommand};
use labelcure::core::{ClassNames, CurationPolicy, DatasetLayout, ParseMode, DEFAULT_IMAGE_EXT};
use labelcure::reconcile::{reconcile_dataset, PredictionFileDetector, Reconciler};
use labelcure::review::{ReviewConfig, ReviewSession, TerminalPresenter, DEFAULT_BACKUP_DIR};
use log::LevelFilter;
use std::io;
use std::path::{Path, PathBuf};

type CliError = Box<dyn std::error::Error>;
type CliResult<T> = Result<T, CliError>;

#[derive(Parser)]
#[command(name = "labelcure")]
#[command(about = "Find and fix missing or spurious labels in darknet detection datasets")]
#[command(version)]
struct Cli {
    /// Log debug messages.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors.
    #[arg(long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compare detector predictions with the labels and write a ledger.
    Reconcile(ReconcileArgs),

    /// Walk a ledger interactively and fix the dataset.
    Review(ReviewArgs),

    /// Create empty label files for images that have none.
    SeedEmpty(DatasetArgs),

    /// Print the default curation policy as JSON.
    Policy {
        /// Write the policy to this file instead of stdout.
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Args)]
struct DatasetArgs {
    /// Directory holding images and their darknet label files.
    #[arg(long)]
    dataset: PathBuf,

    /// Image file extension.
    #[arg(long, default_value = DEFAULT_IMAGE_EXT)]
    image_ext: String,
}

#[derive(Debug, Clone, Args)]
struct ReconcileArgs {
    #[command(flatten)]
    dataset: DatasetArgs,

    /// Directory with one `<image id>.json` prediction file per image.
    #[arg(long)]
    predictions: PathBuf,

    /// Ledger file to write.
    #[arg(long)]
    out: PathBuf,

    /// Curation policy (JSON). Missing fields keep their defaults.
    #[arg(long)]
    policy: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
struct ReviewArgs {
    /// Ledger produced by `reconcile`.
    #[arg(long)]
    ledger: PathBuf,

    /// Dataset directory (default: the ledger's directory).
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// Class names, one per line.
    #[arg(long)]
    names: Option<PathBuf>,

    /// Where pristine copies of changed files go.
    #[arg(long, default_value = DEFAULT_BACKUP_DIR)]
    backup_dir: PathBuf,

    /// Curation policy (JSON). Missing fields keep their defaults.
    #[arg(long)]
    policy: Option<PathBuf>,

    /// Image file extension.
    #[arg(long, default_value = DEFAULT_IMAGE_EXT)]
    image_ext: String,

    /// Refuse ledgers with malformed lines instead of dropping them.
    #[arg(long)]
    strict: bool,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    init_logging(level)?;

    match cli.command {
        Commands::Reconcile(args) => run_reconcile(&args),
        Commands::Review(args) => run_review(&args),
        Commands::SeedEmpty(args) => run_seed_empty(&args),
        Commands::Policy { out } => run_policy(out.as_deref()),
    }
}

#[cfg(not(feature = "tracing"))]
fn init_logging(level: LevelFilter) -> CliResult<()> {
    labelcure::core::init_with_level(level)?;
    Ok(())
}

/// With tracing enabled the filter comes from `RUST_LOG`.
#[cfg(feature = "tracing")]
fn init_logging(_level: LevelFilter) -> CliResult<()> {
    labelcure::core::init_tracing(false);
    Ok(())
}

fn load_policy(path: Option<&Path>) -> CliResult<CurationPolicy> {
    match path {
        Some(path) => Ok(CurationPolicy::load_json(path)?),
        None => Ok(CurationPolicy::default()),
    }
}

fn layout(args: &DatasetArgs) -> DatasetLayout {
    DatasetLayout::new(&args.dataset).with_image_ext(args.image_ext.as_str())
}

// ── reconcile ─────────────────────────────────────────────────────────

fn run_reconcile(args: &ReconcileArgs) -> CliResult<()> {
    let policy = load_policy(args.policy.as_deref())?;
    let layout = layout(&args.dataset);
    let mut detector = PredictionFileDetector::new(&args.predictions);
    let reconciler = Reconciler::new(policy);

    let summary = reconcile_dataset(&layout, &args.out, &mut detector, &reconciler)?;
    println!(
        "{} of {} images reconciled ({} skipped), {} records written to {}",
        summary.images_processed,
        summary.images_total,
        summary.images_skipped,
        summary.records_written,
        args.out.display()
    );
    Ok(())
}

// ── review ────────────────────────────────────────────────────────────

fn run_review(args: &ReviewArgs) -> CliResult<()> {
    let dataset_dir = match &args.dataset {
        Some(dir) => dir.clone(),
        None => match args.ledger.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        },
    };
    let dataset = DatasetLayout::new(dataset_dir).with_image_ext(args.image_ext.as_str());

    let mut config = ReviewConfig::new(&args.ledger, dataset)
        .with_backup_dir(&args.backup_dir)
        .with_policy(load_policy(args.policy.as_deref())?);
    if let Some(names) = &args.names {
        config = config.with_class_names(ClassNames::load(names)?);
    }
    if args.strict {
        config = config.with_parse_mode(ParseMode::Strict);
    }

    let presenter = TerminalPresenter::new(io::stdin().lock(), io::stdout());
    let mut session = ReviewSession::open(config, presenter)?;
    let summary = session.run();
    println!(
        "accepted {}, rejected {}, deleted {}, kept {}, skipped {}",
        summary.accepted, summary.rejected, summary.deleted, summary.kept, summary.skipped
    );
    Ok(())
}

// ── seed-empty ────────────────────────────────────────────────────────

fn run_seed_empty(args: &DatasetArgs) -> CliResult<()> {
    let summary = layout(args).seed_empty_annotations()?;
    println!(
        "{} unlabeled images, {} empty label files created",
        summary.found, summary.created
    );
    Ok(())
}

// ── policy ────────────────────────────────────────────────────────────

fn run_policy(out: Option<&Path>) -> CliResult<()> {
    let policy = CurationPolicy::default();
    match out {
        Some(path) => {
            policy.write_json(path)?;
            println!("policy written to {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&policy)?),
    }
    Ok(())
}
