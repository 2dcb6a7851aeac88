// actions.rs - Confirmed action subcommands: list.

use ap_actions::{ActionStore, JsonActionStore};
use ap_lifecycle::PlannerConfig;
use clap::Subcommand;

#[derive(Subcommand)]
pub enum ActionsCommands {
    /// List confirmed actions for a project, newest first.
    List {
        #[arg(long)]
        project: i64,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

pub async fn execute(cmd: &ActionsCommands, config: &PlannerConfig) -> anyhow::Result<()> {
    let store = JsonActionStore::new(&config.actions_dir)?;

    match cmd {
        ActionsCommands::List { project, json } => list_actions(&store, *project, *json).await,
    }
}

async fn list_actions(store: &dyn ActionStore, project: i64, json: bool) -> anyhow::Result<()> {
    let actions = store.list_for_project(project).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&actions)?);
        return Ok(());
    }

    if actions.is_empty() {
        println!("No actions for project {}.", project);
        return Ok(());
    }

    println!(
        "{:<6} {:<10} {:<13} {:<12} TITLE",
        "ID", "PRIORITY", "STATUS", "DUE"
    );
    for action in &actions {
        let due = action
            .fields
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<6} {:<10} {:<13} {:<12} {}",
            action.id, action.fields.priority, action.action_status, due, action.fields.title
        );
    }
    println!("\n{} action(s)", actions.len());
    Ok(())
}
