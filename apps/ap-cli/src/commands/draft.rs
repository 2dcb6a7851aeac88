// draft.rs - Draft subcommands: show, generate, refine, edit, save, confirm, session.
//
// Each invocation builds a fresh controller and loads the run's draft from
// the store, so every edit command ends with an explicit save.

use std::sync::Arc;

use ap_actions::JsonActionStore;
use ap_draft::{ActionPatch, DraftAction, JsonDraftStore, Priority, Role};
use ap_lifecycle::{
    quick_prompts, ControllerPhase, DraftController, EventDispatcher, LogSink, PlannerConfig,
    RefineOutcome, SaveOutcome, WorkspaceView,
};
use ap_suggest::{SuggestionEngine, WebhookEngine};
use chrono::NaiveDate;
use clap::Subcommand;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Subcommand)]
pub enum DraftCommands {
    /// Open the draft, generating one if the run has none, and print it.
    Show {
        /// Print JSON instead of a listing.
        #[arg(long)]
        json: bool,
        /// Only load; never start a generation.
        #[arg(long)]
        no_generate: bool,
    },
    /// Discard the current draft and generate a fresh proposal.
    Generate,
    /// Ask the suggestion engine to revise the draft.
    Refine {
        /// Instruction for the engine (e.g., "Add due dates to all actions").
        #[arg(required = true)]
        message: Vec<String>,
    },
    /// Print the quick refinement prompts.
    Prompts,
    /// Edit one action in place.
    Update {
        /// Action index as shown by `ap draft show`.
        index: usize,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        /// low, medium, high or critical.
        #[arg(long)]
        priority: Option<Priority>,
        /// Suggested due date (YYYY-MM-DD).
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        category: Option<String>,
        /// User id to assign.
        #[arg(long, conflicts_with = "unassign")]
        assign: Option<i64>,
        #[arg(long)]
        unassign: bool,
    },
    /// Append a manual action.
    Add {
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        priority: Option<Priority>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// Remove an action. Later actions shift down by one.
    Delete {
        index: usize,
    },
    /// Persist the draft as it stands.
    Save,
    /// Create tracked actions from the draft and close it.
    Confirm,
    /// Interactive refinement session with autosave.
    Session,
}

pub async fn execute(
    cmd: &DraftCommands,
    config: &PlannerConfig,
    run: i64,
    project: i64,
    user: Option<i64>,
) -> anyhow::Result<()> {
    if let DraftCommands::Prompts = cmd {
        for prompt in quick_prompts() {
            println!("{}", prompt);
        }
        return Ok(());
    }

    let settings = &config.settings.engine;
    let engine = WebhookEngine::new(
        settings.webhook_url.as_deref(),
        settings.timeout(),
        settings.connect_timeout(),
    );
    if !engine.is_configured() {
        tracing::debug!("no suggestion engine configured; generate and refine will fail");
    }
    let controller = build_controller(config, run, project, Arc::new(engine))?;
    run_command(cmd, &controller, config, user).await
}

fn build_controller(
    config: &PlannerConfig,
    run: i64,
    project: i64,
    engine: Arc<dyn SuggestionEngine>,
) -> anyhow::Result<DraftController> {
    let drafts = JsonDraftStore::new(&config.drafts_dir)?;
    let actions = JsonActionStore::new(&config.actions_dir)?;
    let mut events = EventDispatcher::new();
    events.add_sink(Box::new(LogSink::new(&config.events_log)));

    Ok(DraftController::new(
        run,
        project,
        engine,
        Arc::new(drafts),
        Arc::new(actions),
        events,
    )
    .with_history_limit(config.settings.conversation.max_history))
}

async fn run_command(
    cmd: &DraftCommands,
    controller: &DraftController,
    config: &PlannerConfig,
    user: Option<i64>,
) -> anyhow::Result<()> {
    match cmd {
        DraftCommands::Show { json, no_generate } => {
            if *no_generate {
                controller.load(user).await?;
            } else {
                controller.open(user).await?;
            }
            print_view(&controller.view(), *json)
        }
        DraftCommands::Generate => {
            controller.load(user).await?;
            let draft_id = controller.generate(user).await?;
            println!("Generated draft {}", draft_id);
            print_view(&controller.view(), false)
        }
        DraftCommands::Refine { message } => {
            require_draft(controller, user).await?;
            refine(controller, user, &message.join(" ")).await?;
            save(controller, user).await
        }
        DraftCommands::Prompts => Ok(()),
        DraftCommands::Update {
            index,
            title,
            description,
            priority,
            due,
            clear_due,
            category,
            assign,
            unassign,
        } => {
            let patch = ActionPatch {
                title: title.clone(),
                description: description.clone(),
                priority: *priority,
                suggested_due_date: if *clear_due { Some(None) } else { due.map(Some) },
                linked_assessment_ids: None,
                criteria_category: category.clone().map(Some),
                assigned_to: if *unassign { Some(None) } else { assign.map(Some) },
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to update; pass at least one field");
            }
            require_draft(controller, user).await?;
            controller.update_action(*index, &patch)?;
            println!("Updated action {}", index);
            save(controller, user).await
        }
        DraftCommands::Add {
            title,
            description,
            priority,
            category,
            due,
        } => {
            require_draft(controller, user).await?;
            let mut action = DraftAction::manual();
            if let Some(title) = title {
                action.title = title.clone();
            }
            if let Some(description) = description {
                action.description = description.clone();
            }
            if let Some(priority) = priority {
                action.priority = *priority;
            }
            if category.is_some() {
                action.criteria_category = category.clone();
            }
            action.suggested_due_date = *due;
            let index = controller.add_action(action)?;
            println!("Added action {}", index);
            save(controller, user).await
        }
        DraftCommands::Delete { index } => {
            require_draft(controller, user).await?;
            let removed = controller.delete_action(*index)?;
            println!("Deleted action {}: {}", index, removed.title);
            save(controller, user).await
        }
        DraftCommands::Save => {
            require_draft(controller, user).await?;
            save(controller, user).await
        }
        DraftCommands::Confirm => {
            require_draft(controller, user).await?;
            confirm(controller, user).await
        }
        DraftCommands::Session => {
            controller.open(user).await?;
            session(controller, config, user).await
        }
    }
}

async fn require_draft(controller: &DraftController, user: Option<i64>) -> anyhow::Result<()> {
    if controller.load(user).await? == ControllerPhase::NoDraft {
        anyhow::bail!(
            "assessment run {} has no active draft; run `ap draft generate` first",
            controller.assessment_run_id()
        );
    }
    Ok(())
}

async fn refine(
    controller: &DraftController,
    user: Option<i64>,
    message: &str,
) -> anyhow::Result<()> {
    match controller.refine(user, message).await? {
        RefineOutcome::Skipped => println!("Empty message; nothing sent."),
        RefineOutcome::Refined {
            reply,
            action_count,
        } => {
            println!("{}", reply);
            println!("({} action(s) in draft)", action_count);
        }
    }
    Ok(())
}

async fn save(controller: &DraftController, user: Option<i64>) -> anyhow::Result<()> {
    match controller.save_draft(user).await? {
        SaveOutcome::Saved { saved_at } => {
            println!("Saved at {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"))
        }
        SaveOutcome::Aborted { draft_id } => {
            println!("Draft {} was replaced; changes not saved", draft_id)
        }
    }
    Ok(())
}

async fn confirm(controller: &DraftController, user: Option<i64>) -> anyhow::Result<()> {
    let created = controller.confirm(user).await?;
    println!("Created {} action(s):", created.len());
    for action in &created {
        println!("  #{:<5} {}", action.id, action.fields.title);
    }
    Ok(())
}

/// Read lines from stdin: plain text refines, `:`-commands edit.
async fn session(
    controller: &DraftController,
    config: &PlannerConfig,
    user: Option<i64>,
) -> anyhow::Result<()> {
    if controller.phase() != ControllerPhase::Active {
        anyhow::bail!("no active draft to work on");
    }
    controller.start_autosave(user, config.settings.autosave.interval())?;
    print_view(&controller.view(), false)?;
    println!("\nType a message to refine, or :show :save :delete N :add TITLE :confirm :quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        let result = match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) | (":q", _) => break,
            (":show", _) => print_view(&controller.view(), false),
            (":save", _) => save(controller, user).await,
            (":delete", index) => match index.trim().parse::<usize>() {
                Ok(index) => controller
                    .delete_action(index)
                    .map(|removed| println!("Deleted: {}", removed.title))
                    .map_err(anyhow::Error::from),
                Err(_) => Err(anyhow::anyhow!("usage: :delete N")),
            },
            (":add", title) => {
                let mut action = DraftAction::manual();
                if !title.trim().is_empty() {
                    action.title = title.trim().to_string();
                }
                controller
                    .add_action(action)
                    .map(|index| println!("Added action {}", index))
                    .map_err(anyhow::Error::from)
            }
            (":confirm", _) => {
                let result = confirm(controller, user).await;
                if result.is_ok() {
                    break;
                }
                result
            }
            _ => refine(controller, user, line).await,
        };
        if let Err(e) = result {
            eprintln!("error: {}", e);
        }
    }

    controller.stop_autosave();
    if controller.phase() == ControllerPhase::Active {
        save(controller, user).await?;
    }
    Ok(())
}

fn print_view(view: &WorkspaceView, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(view)?);
        return Ok(());
    }

    let Some(draft_id) = view.draft_id else {
        match &view.last_error {
            Some(e) => println!("No draft for assessment run {} ({})", view.assessment_run_id, e),
            None => println!("No draft for assessment run {}", view.assessment_run_id),
        }
        return Ok(());
    };

    println!("Draft {} [{}]: {}", draft_id, view.phase, view.summary());
    if let Some(saved_at) = view.last_saved_at {
        println!("  Last saved: {}", saved_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if let Some(e) = &view.last_save_error {
        println!("  Save failing: {}", e);
    }

    for (category, actions) in view.grouped() {
        println!("\n{}", category);
        for (index, action) in actions {
            let due = action
                .suggested_due_date
                .map(|d| format!("  due {}", d))
                .unwrap_or_default();
            let committed = action
                .confirmed_action_id
                .map(|id| format!("  (created #{})", id))
                .unwrap_or_default();
            println!(
                "  [{}] {:<8} {}{}{}",
                index, action.priority, action.title, due, committed
            );
            if !action.description.is_empty() {
                println!("       {}", action.description);
            }
        }
    }

    if !view.conversation.is_empty() {
        println!("\nConversation");
        for entry in &view.conversation {
            let speaker = match entry.role {
                Role::User => "you",
                Role::Assistant => "engine",
            };
            let marker = if entry.unanswered { " (no reply)" } else { "" };
            println!("  {}: {}{}", speaker, entry.content, marker);
        }
    }
    Ok(())
}
