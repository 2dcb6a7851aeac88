//! # ap-cli
//!
//! Command-line interface for assessment action plans.
//!
//! - `ap draft show/generate/refine`: open, regenerate and converse with a draft
//! - `ap draft update/add/delete/save`: edit the draft by hand
//! - `ap draft confirm`: commit the draft as tracked actions
//! - `ap actions list`: list confirmed actions for a project

mod commands;

use std::path::PathBuf;

use ap_lifecycle::PlannerConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// Action plan CLI: turn assessment findings into tracked actions.
#[derive(Parser)]
#[command(name = "ap", version, about)]
struct Cli {
    /// Project root directory (defaults to current directory).
    #[arg(long, default_value = ".")]
    project_root: PathBuf,

    /// Id of the user performing the operation.
    #[arg(long, global = true)]
    user: Option<i64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Work with the action plan draft for an assessment run.
    Draft {
        /// Assessment run the draft belongs to.
        #[arg(long)]
        run: i64,
        /// Project the assessment run belongs to.
        #[arg(long)]
        project: i64,
        #[command(subcommand)]
        command: commands::draft::DraftCommands,
    },
    /// Inspect confirmed actions.
    Actions {
        #[command(subcommand)]
        command: commands::actions::ActionsCommands,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("ap_lifecycle=info".parse()?)
                .add_directive("ap_cli=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let cli = Cli::parse();
    let project_root = cli.project_root.canonicalize().unwrap_or(cli.project_root);
    let config = PlannerConfig::load(&project_root)?;

    match &cli.command {
        Commands::Draft {
            run,
            project,
            command,
        } => commands::draft::execute(command, &config, *run, *project, cli.user).await,
        Commands::Actions { command } => commands::actions::execute(command, &config).await,
    }
}
