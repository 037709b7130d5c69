use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use proof_prep::config::{expand_tilde, load_from_path, PrepConfig};
use proof_prep::dataset::load_descriptor;
use proof_prep::rewrite::SkippedFile;
use proof_prep::vcs::VcsStep;
use proof_prep::{
    ExampleDescriptor, ExampleReport, FailedExample, GitCli, MaterializeReport, Pipeline,
    RuleCatalog, TreeRewrite,
};
use similar::{ChangeTag, TextDiff};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "proof-prep")]
#[command(about = "Prepare broken-proof workspaces from a PRISM-style dataset", long_about = None)]
#[command(version)]
struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct RunArgs {
    /// TOML file with run settings; flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Working directory containing the repositories
    #[arg(long)]
    work_dir: Option<PathBuf>,

    /// Path to the dataset root
    #[arg(long)]
    dataset_path: Option<PathBuf>,

    /// Project directory name under both roots
    #[arg(long)]
    project: Option<String>,

    /// Number of examples to process (0 for all)
    #[arg(long)]
    example_limit: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision, check out, and normalize a workspace per example
    Prepare {
        #[command(flatten)]
        run: RunArgs,

        /// Do not wait for Enter between examples
        #[arg(long)]
        no_pause: bool,

        /// Show unified diff of rewritten files
        #[arg(short, long)]
        diff: bool,
    },

    /// List selected examples with their revisions and workspace paths
    List {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Apply the rewrite rules to an existing tree in place
    Rewrite {
        /// Root of the tree to rewrite
        dir: PathBuf,

        /// Source file extension, without the dot
        #[arg(long, default_value = "v")]
        extension: String,

        /// Monad module, relative to the tree root
        #[arg(long, default_value = "Monad.v")]
        monad_file: PathBuf,

        /// Show unified diff of rewritten files
        #[arg(short, long)]
        diff: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(if cli.verbose { Level::DEBUG } else { Level::INFO });

    match cli.command {
        Commands::Prepare {
            run,
            no_pause,
            diff,
        } => cmd_prepare(run, no_pause, diff),

        Commands::List { run } => cmd_list(run),

        Commands::Rewrite {
            dir,
            extension,
            monad_file,
            diff,
        } => cmd_rewrite(&dir, &extension, monad_file, diff),
    }
}

/// Log to stderr so reports on stdout stay readable.
fn init_tracing(level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .try_init()
        .ok();
}

/// Helper: Merge the optional config file with command-line overrides.
fn resolve_config(run: RunArgs) -> Result<PrepConfig> {
    let mut config = match &run.config {
        Some(path) => load_from_path(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PrepConfig::default(),
    };

    if let Some(work_dir) = run.work_dir {
        config.work_dir = Some(expand_tilde(&work_dir));
    }
    if let Some(dataset_path) = run.dataset_path {
        config.dataset_root = Some(expand_tilde(&dataset_path));
    }
    if let Some(project) = run.project {
        config.project = project;
    }
    if let Some(limit) = run.example_limit {
        config.example_limit = limit;
    }

    Ok(config)
}

fn build_pipeline(config: PrepConfig) -> Result<Pipeline<GitCli>> {
    let git = GitCli::new(config.git.clone());
    let pipeline = Pipeline::new(config, git)?;
    Ok(pipeline)
}

fn cmd_prepare(run: RunArgs, no_pause: bool, show_diff: bool) -> Result<()> {
    let mut config = resolve_config(run)?;
    if no_pause {
        config.pause = false;
    }

    let pipeline = build_pipeline(config)?;
    let paths = pipeline.paths();
    println!("Repository: {}", paths.canonical_repo.display());
    println!("Dataset: {}", paths.dataset_dir.display());
    println!();

    let summary = pipeline.run(pause_for_enter, |outcome| match outcome {
        Ok(report) => print_report(report, show_diff),
        Err(failed) => print_failure(failed),
    })?;

    let vcs_warnings = summary
        .prepared
        .iter()
        .filter(|r| r.has_vcs_failures())
        .count();

    println!();
    println!("{}", "Summary:".bold());
    println!(
        "  {} prepared",
        format!("{}", summary.prepared.len()).green()
    );
    println!(
        "  {} with version-control failures",
        format!("{}", vcs_warnings).yellow()
    );
    println!("  {} failed", format!("{}", summary.failed.len()).red());

    if !summary.failed.is_empty() {
        std::process::exit(1);
    }

    Ok(())
}

fn pause_for_enter(_example: &ExampleDescriptor) {
    print!("\nPress Enter to continue to next example...");
    // Prompt visibility only; a closed stdin simply continues.
    let _ = io::stdout().flush();
    let mut line = String::new();
    let _ = io::stdin().lock().read_line(&mut line);
}

fn cmd_list(run: RunArgs) -> Result<()> {
    let config = resolve_config(run)?;
    let pipeline = build_pipeline(config)?;
    let files = pipeline.discover()?;

    println!(
        "Found {} example(s) in {}",
        files.len(),
        pipeline.paths().dataset_dir.display()
    );

    for file in files {
        match load_descriptor(&file) {
            Ok(example) => {
                let revision = example
                    .revision
                    .as_deref()
                    .map(|r| r.normal())
                    .unwrap_or_else(|| "(no initial revision)".dimmed());
                let workspace = pipeline
                    .provisioner()
                    .workspace_path(&example.name)
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|e| e.to_string());
                println!("  - {} {} → {}", example.name, revision, workspace.dimmed());
            }
            Err(e) => {
                println!("  - {} {}", file.display(), e.to_string().red());
            }
        }
    }

    Ok(())
}

fn cmd_rewrite(dir: &Path, extension: &str, monad_file: PathBuf, show_diff: bool) -> Result<()> {
    let catalog = RuleCatalog::standard(extension, monad_file);
    let report = catalog
        .apply_to_tree(dir)
        .with_context(|| format!("rewriting {}", dir.display()))?;

    println!("Tree: {}", dir.display());
    print_rewrite(&report, show_diff);
    Ok(())
}

fn print_report(report: &ExampleReport, show_diff: bool) {
    println!(
        "{} {}: prepared {}",
        "✓".green(),
        report.example,
        report.workspace.display()
    );

    match &report.materialize {
        MaterializeReport::Skipped => {
            println!("  {}", "no initial revision; kept copied state".dimmed());
        }
        MaterializeReport::Ran { revision, steps } => {
            for step in steps.iter().filter(|s| !s.succeeded()) {
                let detail = match &step.outcome {
                    Ok(outcome) => outcome.to_string(),
                    Err(reason) => reason.clone(),
                };
                eprintln!("  {} {}: {}", "✗".red(), step.step, detail);
            }
            if report.materialize.checked_out().is_some() {
                println!("  {} {}", VcsStep::Checkout, revision);
            }
        }
    }

    print_rewrite(&report.rewrite, show_diff);
}

fn print_rewrite(rewrite: &TreeRewrite, show_diff: bool) {
    for change in &rewrite.changed {
        println!(
            "  {} {} ({})",
            "✎".cyan(),
            change.path.display(),
            change.rules.join(", ")
        );
        if show_diff {
            display_diff(&change.path, &change.original, &change.updated);
        }
    }

    for skipped in &rewrite.skipped {
        match skipped {
            SkippedFile::MissingTarget { rule, path } => {
                println!("  {} {} does not exist ({})", "⊘".yellow(), path.display(), rule);
            }
            SkippedFile::NotUtf8 { path } => {
                println!("  {} {} is not UTF-8", "⊘".yellow(), path.display());
            }
            SkippedFile::Symlink { path } => {
                println!(
                    "  {} {} does not link to a file in the tree",
                    "⊘".yellow(),
                    path.display()
                );
            }
        }
    }

    if rewrite.is_noop() {
        println!(
            "  {}",
            format!("no changes in {} file(s)", rewrite.scanned).dimmed()
        );
    }
}

fn print_failure(failed: &FailedExample) {
    eprintln!("{} {}: Failed - {}", "✗".red(), failed.example, failed.reason);
}

/// Helper: Show unified diff between original and rewritten content
fn display_diff(file: &Path, original: &str, modified: &str) {
    println!(
        "\n{}",
        format!("--- {} (original)", file.display()).dimmed()
    );
    println!("{}", format!("+++ {} (rewritten)", file.display()).dimmed());

    let diff = TextDiff::from_lines(original, modified);

    for change in diff.iter_all_changes() {
        let sign = match change.tag() {
            ChangeTag::Delete => format!("-{}", change).red(),
            ChangeTag::Insert => format!("+{}", change).green(),
            ChangeTag::Equal => format!(" {}", change).normal(),
        };
        print!("{}", sign);
    }
}
