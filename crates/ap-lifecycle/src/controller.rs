// controller.rs - DraftController: orchestrates one assessment run's draft.
//
// The controller owns the editable state (actions, conversation, draft id)
// and drives the suggestion engine, draft store and action store. Every
// async operation follows the same shape:
//
//   1. lock, check the phase, move to the busy phase, snapshot what the
//      call needs, unlock
//   2. await the collaborator with no lock held
//   3. lock, compare the epoch captured in step 1, apply or discard
//
// The epoch changes whenever the draft identity changes (generation starts,
// load adopts or clears a draft). A result carrying an old epoch belongs to
// a draft the workspace no longer shows and is never applied.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use ap_actions::{ActionSource, ActionStore, ConfirmedAction, NewAction};
use ap_draft::{
    history_window, ActionOrigin, ActionPatch, AssessmentRunId, ConversationEntry, Draft,
    DraftAction, DraftError, DraftStatus, DraftStore, ProjectId, UserId,
};
use ap_suggest::{GenerateRequest, RefineRequest, SuggestionEngine};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::autosave::AutosaveLease;
use crate::error::LifecycleError;
use crate::events::{DraftEvent, EventDispatcher};
use crate::phase::ControllerPhase;
use crate::view::WorkspaceView;

/// Result of a [`DraftController::refine`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefineOutcome {
    /// The message was blank; nothing was sent or recorded.
    Skipped,
    /// The engine revised the draft.
    Refined { reply: String, action_count: usize },
}

/// Result of a [`DraftController::save_draft`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Saved { saved_at: DateTime<Utc> },
    /// The draft was replaced while the save was in flight; the snapshot
    /// was not written to the current draft.
    Aborted { draft_id: Uuid },
}

struct State {
    phase: ControllerPhase,
    epoch: u64,
    draft_id: Option<Uuid>,
    actions: Vec<DraftAction>,
    conversation: Vec<ConversationEntry>,
    last_error: Option<String>,
    last_saved_at: Option<DateTime<Utc>>,
    last_save_error: Option<String>,
    saves_in_flight: usize,
    history_limit: usize,
}

impl State {
    fn enter(&mut self, next: ControllerPhase) {
        tracing::info!(from = %self.phase, to = %next, "draft phase change");
        self.phase = next;
    }

    /// Drop the current draft and move to `phase`.
    fn clear(&mut self, phase: ControllerPhase) {
        self.epoch += 1;
        self.draft_id = None;
        self.actions.clear();
        self.conversation.clear();
        self.last_saved_at = None;
        self.last_save_error = None;
        self.enter(phase);
    }

    /// Make `draft` the active draft.
    fn adopt(&mut self, draft: Draft) {
        self.epoch += 1;
        self.draft_id = Some(draft.draft_id);
        self.actions = draft.proposed_actions;
        self.conversation = draft.conversation_history;
        self.last_saved_at = draft.saved_at;
        self.last_save_error = None;
        self.enter(ControllerPhase::Active);
    }

    /// Snapshot for a save, or None when there is nothing to save.
    fn save_snapshot(&mut self) -> Option<SaveSnapshot> {
        let draft_id = self.draft_id?;
        self.saves_in_flight += 1;
        Some(SaveSnapshot {
            epoch: self.epoch,
            draft_id,
            actions: self.actions.clone(),
            conversation: self.conversation.clone(),
        })
    }

    /// Refuse anything but an idle, active draft.
    fn require_phase(
        &self,
        operation: &'static str,
        next: ControllerPhase,
    ) -> Result<(), LifecycleError> {
        if self.phase.is_busy() {
            return Err(LifecycleError::Busy { phase: self.phase });
        }
        if !self.phase.can_transition_to(next) {
            return Err(match self.phase {
                ControllerPhase::NoDraft => LifecycleError::NoDraft,
                phase => LifecycleError::InvalidState { operation, phase },
            });
        }
        Ok(())
    }

    fn require_editable(&self, operation: &'static str) -> Result<(), LifecycleError> {
        match self.phase {
            ControllerPhase::Active => Ok(()),
            ControllerPhase::NoDraft => Err(LifecycleError::NoDraft),
            phase if phase.is_busy() => Err(LifecycleError::Busy { phase }),
            phase => Err(LifecycleError::InvalidState { operation, phase }),
        }
    }

    fn unlocked_action(&mut self, index: usize) -> Result<&mut DraftAction, LifecycleError> {
        let len = self.actions.len();
        let action = self
            .actions
            .get_mut(index)
            .ok_or(LifecycleError::IndexOutOfRange { index, len })?;
        if let Some(action_id) = action.confirmed_action_id {
            return Err(LifecycleError::ActionLocked { index, action_id });
        }
        Ok(action)
    }
}

struct SaveSnapshot {
    epoch: u64,
    draft_id: Uuid,
    actions: Vec<DraftAction>,
    conversation: Vec<ConversationEntry>,
}

/// Shared between the controller and its autosave task.
pub(crate) struct Shared {
    assessment_run_id: AssessmentRunId,
    project_id: ProjectId,
    engine: Arc<dyn SuggestionEngine>,
    drafts: Arc<dyn DraftStore>,
    action_store: Arc<dyn ActionStore>,
    events: EventDispatcher,
    state: Mutex<State>,
}

fn require_user(user: Option<UserId>) -> Result<UserId, LifecycleError> {
    user.ok_or(LifecycleError::NotAuthenticated)
}

/// Engine output is always a fresh suggestion: it never carries commit ids.
fn as_suggestions(actions: Vec<DraftAction>) -> Vec<DraftAction> {
    actions
        .into_iter()
        .map(|mut action| {
            action.confirmed_action_id = None;
            action.origin = ActionOrigin::Suggested;
            action
        })
        .collect()
}

fn new_action_fields(
    action: &DraftAction,
    project_id: ProjectId,
    assessment_run_id: AssessmentRunId,
    user: UserId,
) -> NewAction {
    NewAction {
        project_id,
        title: action.title.clone(),
        description: action.description.clone(),
        priority: action.priority,
        due_date: action.suggested_due_date,
        assigned_to: action.assigned_to,
        category: action.criteria_category.clone(),
        linked_assessment_ids: action.linked_assessment_ids.clone(),
        source_assessment_run_id: Some(assessment_run_id),
        source_type: match action.origin {
            ActionOrigin::Suggested => ActionSource::AiGenerated,
            ActionOrigin::Manual => ActionSource::Manual,
        },
        created_by: Some(user),
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn view(&self) -> WorkspaceView {
        let state = self.lock();
        WorkspaceView {
            assessment_run_id: self.assessment_run_id,
            project_id: self.project_id,
            phase: state.phase,
            draft_id: state.draft_id,
            actions: state.actions.clone(),
            conversation: state.conversation.clone(),
            last_error: state.last_error.clone(),
            last_saved_at: state.last_saved_at,
            last_save_error: state.last_save_error.clone(),
            is_saving: state.saves_in_flight > 0,
        }
    }

    async fn load(&self, user: Option<UserId>) -> Result<ControllerPhase, LifecycleError> {
        require_user(user)?;
        let epoch = {
            let state = self.lock();
            if state.phase.is_busy() {
                return Err(LifecycleError::Busy { phase: state.phase });
            }
            state.epoch
        };

        let latest = self
            .drafts
            .latest_for_run(self.assessment_run_id)
            .await
            .map_err(|e| LifecycleError::LoadFailed(e.to_string()))?;

        let (phase, loaded) = {
            let mut state = self.lock();
            if state.epoch != epoch || state.phase.is_busy() {
                // Something newer took over while the store was read.
                return Ok(state.phase);
            }
            match latest {
                Some(draft) if draft.status == DraftStatus::Active => {
                    let event = DraftEvent::DraftLoaded {
                        assessment_run_id: self.assessment_run_id,
                        draft_id: draft.draft_id,
                        action_count: draft.proposed_actions.len(),
                        timestamp: Utc::now(),
                    };
                    state.adopt(draft);
                    (state.phase, Some(event))
                }
                other => {
                    if let Some(draft) = other.filter(|d| d.status == DraftStatus::Generating) {
                        tracing::warn!(
                            draft_id = %draft.draft_id,
                            "latest draft is still generating elsewhere; treating run as having no draft"
                        );
                    }
                    state.clear(ControllerPhase::NoDraft);
                    (state.phase, None)
                }
            }
        };

        if let Some(event) = loaded {
            self.events.dispatch(&event);
        }
        Ok(phase)
    }

    async fn generate(&self, user: Option<UserId>) -> Result<Uuid, LifecycleError> {
        let user = require_user(user)?;
        let epoch = {
            let mut state = self.lock();
            state.require_phase("generate", ControllerPhase::Generating)?;
            // Regenerating would orphan actions a failed confirm already created.
            if state.actions.iter().any(DraftAction::is_committed) {
                return Err(LifecycleError::ConfirmInProgress);
            }
            state.epoch += 1;
            state.last_error = None;
            state.enter(ControllerPhase::Generating);
            state.epoch
        };

        match self.run_generation(user).await {
            Ok(draft) => {
                let draft_id = draft.draft_id;
                let action_count = draft.proposed_actions.len();
                let stale = {
                    let mut state = self.lock();
                    if state.epoch == epoch {
                        state.adopt(draft);
                        false
                    } else {
                        true
                    }
                };
                if stale {
                    tracing::warn!(draft_id = %draft_id, "discarding stale generation result");
                    if let Err(e) = self.drafts.set_status(draft_id, DraftStatus::Superseded).await {
                        tracing::warn!(draft_id = %draft_id, "could not supersede stale draft: {}", e);
                    }
                    return Err(LifecycleError::GenerationFailed(
                        "superseded by a newer generation".to_string(),
                    ));
                }
                tracing::info!(draft_id = %draft_id, action_count, "action plan generated");
                self.events.dispatch(&DraftEvent::DraftGenerated {
                    assessment_run_id: self.assessment_run_id,
                    draft_id,
                    action_count,
                    requested_by: user,
                    timestamp: Utc::now(),
                });
                Ok(draft_id)
            }
            Err(reason) => {
                {
                    let mut state = self.lock();
                    if state.epoch == epoch {
                        state.clear(ControllerPhase::NoDraft);
                        state.last_error = Some(reason.clone());
                    }
                }
                tracing::warn!(assessment_run_id = self.assessment_run_id, "generation failed: {}", reason);
                self.events.dispatch(&DraftEvent::GenerationFailed {
                    assessment_run_id: self.assessment_run_id,
                    reason: reason.clone(),
                    timestamp: Utc::now(),
                });
                Err(LifecycleError::GenerationFailed(reason))
            }
        }
    }

    /// Supersede open drafts, ask the engine, store the new active draft.
    async fn run_generation(&self, user: UserId) -> Result<Draft, String> {
        let run_id = self.assessment_run_id;

        let superseded = self
            .drafts
            .supersede_open(run_id, None)
            .await
            .map_err(|e| format!("could not supersede previous draft: {}", e))?;
        self.announce_superseded(&superseded);

        let response = self
            .engine
            .generate(&GenerateRequest {
                project_id: self.project_id,
                assessment_run_id: run_id,
                requesting_user_id: Some(user),
            })
            .await
            .map_err(|e| e.to_string())?;

        let actions = as_suggestions(
            response
                .proposed_actions
                .ok_or_else(|| "suggestion engine returned no proposal".to_string())?,
        );

        let mut draft = Draft::new(response.draft_id, run_id, self.project_id, actions);
        draft.created_by = Some(user);
        self.drafts
            .insert(&draft)
            .await
            .map_err(|e| format!("could not store draft: {}", e))?;

        // Another workspace may have generated for this run in the meantime.
        let raced = self
            .drafts
            .supersede_open(run_id, Some(draft.draft_id))
            .await
            .map_err(|e| format!("could not supersede previous draft: {}", e))?;
        self.announce_superseded(&raced);

        Ok(draft)
    }

    fn announce_superseded(&self, draft_ids: &[Uuid]) {
        for draft_id in draft_ids {
            tracing::info!(draft_id = %draft_id, "draft superseded");
            self.events
                .dispatch(&DraftEvent::superseded(self.assessment_run_id, *draft_id));
        }
    }

    async fn refine(
        &self,
        user: Option<UserId>,
        message: &str,
    ) -> Result<RefineOutcome, LifecycleError> {
        require_user(user)?;
        let message = message.trim();
        if message.is_empty() {
            return Ok(RefineOutcome::Skipped);
        }

        let (epoch, draft_id, entry_index, history) = {
            let mut state = self.lock();
            state.require_phase("refine", ControllerPhase::Refining)?;
            let draft_id = state.draft_id.ok_or(LifecycleError::NoDraft)?;
            if state.actions.iter().any(DraftAction::is_committed) {
                return Err(LifecycleError::ConfirmInProgress);
            }
            state.conversation.push(ConversationEntry::user(message));
            let entry_index = state.conversation.len() - 1;
            let history = history_window(&state.conversation, state.history_limit);
            state.last_error = None;
            state.enter(ControllerPhase::Refining);
            (state.epoch, draft_id, entry_index, history)
        };

        let result = self
            .engine
            .refine(&RefineRequest {
                draft_id,
                user_message: message.to_string(),
                conversation_history: history,
            })
            .await;

        let outcome = {
            let mut state = self.lock();
            if state.epoch != epoch {
                Err("draft changed while refining".to_string())
            } else {
                match result {
                    Ok(response) => {
                        if let Some(actions) = response.refined_actions.clone() {
                            state.actions = as_suggestions(actions);
                        }
                        let reply = response.reply().to_string();
                        state
                            .conversation
                            .push(ConversationEntry::assistant(reply.clone()));
                        state.enter(ControllerPhase::Active);
                        Ok((reply, state.actions.len()))
                    }
                    Err(e) => {
                        let reason = e.to_string();
                        if let Some(entry) = state.conversation.get_mut(entry_index) {
                            entry.unanswered = true;
                        }
                        state.last_error = Some(reason.clone());
                        state.enter(ControllerPhase::Active);
                        Err(reason)
                    }
                }
            }
        };

        match outcome {
            Ok((reply, action_count)) => {
                self.events.dispatch(&DraftEvent::DraftRefined {
                    draft_id,
                    action_count,
                    timestamp: Utc::now(),
                });
                Ok(RefineOutcome::Refined {
                    reply,
                    action_count,
                })
            }
            Err(reason) => {
                tracing::warn!(draft_id = %draft_id, "refinement failed: {}", reason);
                self.events.dispatch(&DraftEvent::RefinementFailed {
                    draft_id,
                    reason: reason.clone(),
                    timestamp: Utc::now(),
                });
                Err(LifecycleError::RefinementFailed(reason))
            }
        }
    }

    fn update_action(&self, index: usize, patch: &ActionPatch) -> Result<(), LifecycleError> {
        let mut state = self.lock();
        state.require_editable("update an action")?;
        patch.apply_to(state.unlocked_action(index)?);
        Ok(())
    }

    fn add_action(&self, mut action: DraftAction) -> Result<usize, LifecycleError> {
        let mut state = self.lock();
        state.require_editable("add an action")?;
        action.confirmed_action_id = None;
        state.actions.push(action);
        Ok(state.actions.len() - 1)
    }

    fn delete_action(&self, index: usize) -> Result<DraftAction, LifecycleError> {
        let mut state = self.lock();
        state.require_editable("delete an action")?;
        state.unlocked_action(index)?;
        Ok(state.actions.remove(index))
    }

    async fn save_draft(&self, user: Option<UserId>) -> Result<SaveOutcome, LifecycleError> {
        require_user(user)?;
        let snapshot = {
            let mut state = self.lock();
            match state.phase {
                ControllerPhase::Active | ControllerPhase::Refining => {}
                ControllerPhase::NoDraft => return Err(LifecycleError::NoDraft),
                phase if phase.is_busy() => return Err(LifecycleError::Busy { phase }),
                phase => {
                    return Err(LifecycleError::InvalidState {
                        operation: "save",
                        phase,
                    })
                }
            }
            state.save_snapshot().ok_or(LifecycleError::NoDraft)?
        };
        self.persist(snapshot).await
    }

    /// One autosave tick. Returns false once the draft is terminal.
    pub(crate) async fn autosave_tick(&self, user: UserId) -> bool {
        let snapshot = {
            let mut state = self.lock();
            if state.phase.is_terminal() {
                return false;
            }
            if state.phase != ControllerPhase::Active {
                return true;
            }
            match state.save_snapshot() {
                Some(snapshot) => snapshot,
                None => return true,
            }
        };
        if let Err(e) = self.persist(snapshot).await {
            tracing::debug!(user, "autosave will retry next tick: {}", e);
        }
        true
    }

    async fn persist(&self, snapshot: SaveSnapshot) -> Result<SaveOutcome, LifecycleError> {
        let draft_id = snapshot.draft_id;
        let result = self
            .drafts
            .save_draft(draft_id, &snapshot.actions, &snapshot.conversation)
            .await;

        let outcome = {
            let mut state = self.lock();
            state.saves_in_flight = state.saves_in_flight.saturating_sub(1);
            let retargeted = state.epoch != snapshot.epoch || state.draft_id != Some(draft_id);
            match result {
                Ok(saved_at) if !retargeted => {
                    state.last_saved_at = Some(saved_at);
                    state.last_save_error = None;
                    Ok(SaveOutcome::Saved { saved_at })
                }
                Ok(_) => Ok(SaveOutcome::Aborted { draft_id }),
                Err(DraftError::NotWritable { .. }) if retargeted => {
                    Ok(SaveOutcome::Aborted { draft_id })
                }
                Err(e) => {
                    let reason = e.to_string();
                    if !retargeted {
                        state.last_save_error = Some(reason.clone());
                    }
                    Err(reason)
                }
            }
        };

        match outcome {
            Ok(SaveOutcome::Saved { saved_at }) => {
                tracing::debug!(draft_id = %draft_id, "draft saved");
                self.events
                    .dispatch(&DraftEvent::DraftSaved { draft_id, saved_at });
                Ok(SaveOutcome::Saved { saved_at })
            }
            Ok(aborted) => {
                tracing::warn!(draft_id = %draft_id, "draft replaced during save; snapshot discarded");
                Ok(aborted)
            }
            Err(reason) => {
                tracing::warn!(draft_id = %draft_id, "draft save failed: {}", reason);
                self.events.dispatch(&DraftEvent::SaveFailed {
                    draft_id,
                    reason: reason.clone(),
                    timestamp: Utc::now(),
                });
                Err(LifecycleError::SaveFailed(reason))
            }
        }
    }

    async fn confirm(&self, user: Option<UserId>) -> Result<Vec<ConfirmedAction>, LifecycleError> {
        let user = require_user(user)?;
        let (epoch, draft_id, mut actions, conversation) = {
            let mut state = self.lock();
            state.require_phase("confirm", ControllerPhase::Confirming)?;
            if state.actions.is_empty() {
                return Err(LifecycleError::EmptyPlan);
            }
            let draft_id = state.draft_id.ok_or(LifecycleError::NoDraft)?;
            state.last_error = None;
            state.enter(ControllerPhase::Confirming);
            (
                state.epoch,
                draft_id,
                state.actions.clone(),
                state.conversation.clone(),
            )
        };

        let result = self
            .commit(user, draft_id, &mut actions, &conversation)
            .await;

        let created_ids: Vec<i64> = actions.iter().filter_map(|a| a.confirmed_action_id).collect();
        let pending: Vec<usize> = actions
            .iter()
            .enumerate()
            .filter(|(_, a)| !a.is_committed())
            .map(|(i, _)| i)
            .collect();

        {
            let mut state = self.lock();
            // Edits are refused while confirming, so the snapshot is still
            // the list on screen; write the commit ids back into it.
            if state.epoch == epoch {
                state.actions = actions.clone();
                match &result {
                    Ok(_) => state.enter(ControllerPhase::Confirmed),
                    Err(reason) => {
                        state.last_error = Some(reason.clone());
                        state.enter(ControllerPhase::Active);
                    }
                }
            }
        }

        match result {
            Ok(created) => {
                tracing::info!(draft_id = %draft_id, count = created.len(), "action plan confirmed");
                self.events.dispatch(&DraftEvent::PlanConfirmed {
                    assessment_run_id: self.assessment_run_id,
                    draft_id,
                    action_ids: created_ids,
                    confirmed_by: user,
                    timestamp: Utc::now(),
                });
                Ok(created)
            }
            Err(reason) => {
                if !created_ids.is_empty() {
                    // Remember what was committed so a retry skips it.
                    if let Err(e) = self
                        .drafts
                        .save_draft(draft_id, &actions, &conversation)
                        .await
                    {
                        tracing::warn!(draft_id = %draft_id, "could not record confirm progress: {}", e);
                    }
                }
                tracing::warn!(
                    draft_id = %draft_id,
                    created = created_ids.len(),
                    pending = pending.len(),
                    "confirm failed: {}",
                    reason
                );
                self.events.dispatch(&DraftEvent::ConfirmFailed {
                    draft_id,
                    created: created_ids.clone(),
                    pending: pending.clone(),
                    reason: reason.clone(),
                    timestamp: Utc::now(),
                });
                Err(LifecycleError::ConfirmFailed {
                    created: created_ids,
                    pending,
                    reason,
                })
            }
        }
    }

    /// Persist the final list, create each uncommitted action, then mark the
    /// draft confirmed. Commit ids are written into `actions` as they land.
    async fn commit(
        &self,
        user: UserId,
        draft_id: Uuid,
        actions: &mut [DraftAction],
        conversation: &[ConversationEntry],
    ) -> Result<Vec<ConfirmedAction>, String> {
        self.drafts
            .save_draft(draft_id, actions, conversation)
            .await
            .map_err(|e| format!("could not save draft before confirming: {}", e))?;

        let mut created = Vec::with_capacity(actions.len());
        for (index, action) in actions.iter_mut().enumerate() {
            if let Some(action_id) = action.confirmed_action_id {
                match self.action_store.get(action_id).await {
                    Ok(Some(existing)) => {
                        created.push(existing);
                        continue;
                    }
                    Ok(None) => {
                        tracing::warn!(action_id, index, "committed action missing; creating it again");
                        action.confirmed_action_id = None;
                    }
                    Err(e) => {
                        return Err(format!(
                            "could not read committed action {} for action {}: {}",
                            action_id, index, e
                        ))
                    }
                }
            }

            let fields =
                new_action_fields(action, self.project_id, self.assessment_run_id, user);
            let confirmed = self
                .action_store
                .create_action(fields)
                .await
                .map_err(|e| format!("could not create action {} ('{}'): {}", index, action.title, e))?;
            action.confirmed_action_id = Some(confirmed.id);
            created.push(confirmed);
        }

        self.drafts
            .save_draft(draft_id, actions, conversation)
            .await
            .map_err(|e| format!("could not record committed actions: {}", e))?;
        self.drafts
            .set_status(draft_id, DraftStatus::Confirmed)
            .await
            .map_err(|e| format!("could not mark draft confirmed: {}", e))?;

        Ok(created)
    }
}

/// Lifecycle controller for one assessment run's action plan draft.
///
/// The controller is the sole mutator of the draft's in-memory state.
/// Generate, refine and confirm are mutually exclusive: a call arriving
/// while another is outstanding fails with [`LifecycleError::Busy`].
/// Every network-backed call takes the requesting user explicitly and fails
/// with [`LifecycleError::NotAuthenticated`] before contacting anything if
/// there is none.
pub struct DraftController {
    shared: Arc<Shared>,
    autosave: Mutex<Option<AutosaveLease>>,
}

impl DraftController {
    pub fn new(
        assessment_run_id: AssessmentRunId,
        project_id: ProjectId,
        engine: Arc<dyn SuggestionEngine>,
        drafts: Arc<dyn DraftStore>,
        action_store: Arc<dyn ActionStore>,
        events: EventDispatcher,
    ) -> Self {
        let state = State {
            phase: ControllerPhase::NoDraft,
            epoch: 0,
            draft_id: None,
            actions: Vec::new(),
            conversation: Vec::new(),
            last_error: None,
            last_saved_at: None,
            last_save_error: None,
            saves_in_flight: 0,
            history_limit: 0,
        };
        Self {
            shared: Arc::new(Shared {
                assessment_run_id,
                project_id,
                engine,
                drafts,
                action_store,
                events,
                state: Mutex::new(state),
            }),
            autosave: Mutex::new(None),
        }
    }

    /// Cap the conversation history sent with refinements (0 = unbounded).
    pub fn with_history_limit(self, max_entries: usize) -> Self {
        self.shared.lock().history_limit = max_entries;
        self
    }

    pub fn assessment_run_id(&self) -> AssessmentRunId {
        self.shared.assessment_run_id
    }

    pub fn project_id(&self) -> ProjectId {
        self.shared.project_id
    }

    pub fn phase(&self) -> ControllerPhase {
        self.shared.lock().phase
    }

    /// Snapshot of everything the workspace renders.
    pub fn view(&self) -> WorkspaceView {
        self.shared.view()
    }

    /// Fetch the latest draft for the run.
    ///
    /// An active draft becomes the workspace content; a terminal draft or
    /// none at all leaves the controller in [`ControllerPhase::NoDraft`].
    /// Reads only.
    pub async fn load(&self, user: Option<UserId>) -> Result<ControllerPhase, LifecycleError> {
        self.shared.load(user).await
    }

    /// Workspace mount: load, and generate if there is no open draft.
    ///
    /// Load always completes before generation starts, so opening a run that
    /// already has a draft never creates a second one.
    pub async fn open(&self, user: Option<UserId>) -> Result<ControllerPhase, LifecycleError> {
        if self.load(user).await? == ControllerPhase::NoDraft {
            self.generate(user).await?;
        }
        Ok(self.phase())
    }

    /// Ask the engine for a fresh proposal, superseding any open draft.
    ///
    /// On failure the controller returns to [`ControllerPhase::NoDraft`]
    /// with nothing stale retained.
    pub async fn generate(&self, user: Option<UserId>) -> Result<Uuid, LifecycleError> {
        self.shared.generate(user).await
    }

    /// Send a refinement message. Blank messages are ignored.
    ///
    /// On failure the action list is unchanged and the user entry stays in
    /// the conversation marked unanswered.
    pub async fn refine(
        &self,
        user: Option<UserId>,
        message: &str,
    ) -> Result<RefineOutcome, LifecycleError> {
        self.shared.refine(user, message).await
    }

    /// Merge `patch` into the action at `index`.
    pub fn update_action(&self, index: usize, patch: &ActionPatch) -> Result<(), LifecycleError> {
        self.shared.update_action(index, patch)
    }

    /// Append an action and return its index.
    pub fn add_action(&self, action: DraftAction) -> Result<usize, LifecycleError> {
        self.shared.add_action(action)
    }

    /// Remove the action at `index`. Later actions shift down by one, so
    /// callers must re-resolve any index they held.
    pub fn delete_action(&self, index: usize) -> Result<DraftAction, LifecycleError> {
        self.shared.delete_action(index)
    }

    /// Persist the current actions and conversation without changing phase.
    pub async fn save_draft(&self, user: Option<UserId>) -> Result<SaveOutcome, LifecycleError> {
        self.shared.save_draft(user).await
    }

    /// Commit every draft action as a confirmed action and close the draft.
    ///
    /// If any create fails the draft stays active and the error lists what
    /// was created and which indices remain; retrying creates only those.
    pub async fn confirm(
        &self,
        user: Option<UserId>,
    ) -> Result<Vec<ConfirmedAction>, LifecycleError> {
        let created = self.shared.confirm(user).await?;
        self.stop_autosave();
        Ok(created)
    }

    /// Start saving every `period` on behalf of `user`, replacing any
    /// running autosave. Must be called inside a Tokio runtime.
    pub fn start_autosave(
        &self,
        user: Option<UserId>,
        period: Duration,
    ) -> Result<(), LifecycleError> {
        let user = require_user(user)?;
        let phase = self.phase();
        if phase.is_terminal() {
            return Err(LifecycleError::InvalidState {
                operation: "start autosave",
                phase,
            });
        }
        let lease = AutosaveLease::spawn(Arc::downgrade(&self.shared), user, period)?;
        let mut slot = self
            .autosave
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *slot = Some(lease);
        tracing::debug!(period_secs = period.as_secs(), "autosave started");
        Ok(())
    }

    /// Cancel the autosave timer. Returns whether one was running.
    pub fn stop_autosave(&self) -> bool {
        let lease = self
            .autosave
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match lease {
            Some(lease) => {
                let running = lease.is_running();
                drop(lease);
                tracing::debug!("autosave stopped");
                running
            }
            None => false,
        }
    }

    pub fn autosave_running(&self) -> bool {
        self.autosave
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .as_ref()
            .is_some_and(AutosaveLease::is_running)
    }
}
