//! strata CLI - a raw, directory-scoped backup tool with git-like vocabulary.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod output;

use output::ConsoleReporter;

/// A raw backup tool: commits, branches and checkouts over incremental
/// tar archives.
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase logging detail.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only report warnings and errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Turn the current directory into a tracked root
    Init,
    /// Capture the working tree as a new commit
    Commit {
        /// The commit message
        msg: String,
    },
    /// Reconstruct the state of a ref and repoint HEAD
    Checkout {
        /// Branch name, commit id, or unique id prefix
        r#ref: Option<String>,
        /// Destroy uncommitted changes instead of refusing
        #[arg(short, long)]
        force: bool,
        /// Start a fresh branch with no commit (the ref is the new name)
        #[arg(long)]
        orphan: bool,
    },
    /// Retarget HEAD (or its branch) without touching the tree
    Reset {
        /// Branch name, commit id, or unique id prefix
        r#ref: String,
        /// Also reconstruct the tree at the new target
        #[arg(long)]
        hard: bool,
    },
    /// List, create, or delete branches
    Branch {
        /// Branch to create; omit to list branches
        name: Option<String>,
        /// Where the new branch points (default: the current commit)
        r#ref: Option<String>,
        /// Move the branch if it already exists
        #[arg(short, long)]
        force: bool,
        /// Delete the named branch
        #[arg(short, long)]
        delete: bool,
    },
    /// Show the paths touched by a commit
    Show {
        /// Commit to show (default: HEAD)
        r#ref: Option<String>,
    },
    /// Report HEAD and uncommitted changes
    Status,
    /// Show commit history
    Log {
        /// Starting refs (default: HEAD)
        refs: Vec<String>,
        /// Include every branch as a starting ref
        #[arg(long)]
        all: bool,
        /// Show full ids and messages
        #[arg(long)]
        full: bool,
    },
    /// Remove commits unreachable from any branch or HEAD
    Prune,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let mut reporter = ConsoleReporter::new(cli.quiet);
    match dispatch(cli.command, &mut reporter) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::render_error(&err);
            ExitCode::FAILURE
        }
    }
}

fn dispatch(command: Commands, reporter: &mut ConsoleReporter) -> Result<()> {
    match command {
        Commands::Init => cmd::init::run(reporter),
        Commands::Commit { msg } => cmd::commit::run(&msg, reporter),
        Commands::Checkout { r#ref, force, orphan } => {
            cmd::checkout::run(r#ref.as_deref(), force, orphan, reporter)
        }
        Commands::Reset { r#ref, hard } => cmd::reset::run(&r#ref, hard, reporter),
        Commands::Branch {
            name,
            r#ref,
            force,
            delete,
        } => cmd::branch::run(name.as_deref(), r#ref.as_deref(), force, delete, reporter),
        Commands::Show { r#ref } => cmd::show::run(r#ref.as_deref(), reporter),
        Commands::Status => cmd::status::run(reporter),
        Commands::Log { refs, all, full } => cmd::log::run(&refs, all, full, reporter),
        Commands::Prune => cmd::prune::run(reporter),
    }
}

fn init_tracing(verbose: bool, quiet: bool) {
    let filter = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}
