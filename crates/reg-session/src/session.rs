use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use reg_client::{ApiError, FormsApi};
use reg_spec::{AnswerSet, FormSpec, Identity, RuleEffects, evaluate_rules, prefill, validate};

use crate::draft::{DraftState, DraftStatus};

/// Tunables for one form session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period after the last answer change before a draft save fires.
    pub debounce: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(800),
        }
    }
}

/// Outcome of one explicit submission attempt.
#[derive(Debug)]
pub enum SubmitOutcome {
    Submitted,
    /// Required visible fields with no answer; nothing was sent.
    Invalid { missing: Vec<String> },
    /// The server rejected or the transport failed; answers stay intact
    /// for a retry.
    Failed(ApiError),
}

struct SessionState {
    answers: AnswerSet,
    effects: RuleEffects,
    draft: DraftStatus,
    submitted: bool,
}

/// One registration form being filled in: live rule effects, debounced
/// draft autosave, and final submission.
pub struct FormSession<A> {
    api: A,
    form: FormSpec,
    config: SessionConfig,
    state: Mutex<SessionState>,
    changed: Notify,
}

impl<A: FormsApi> FormSession<A> {
    /// Builds a session around an already-fetched form, starting from the
    /// given answers.
    pub fn with_answers(api: A, form: FormSpec, answers: AnswerSet, config: SessionConfig) -> Self {
        let effects = evaluate_rules(&form.rules, &answers);
        Self {
            api,
            form,
            config,
            state: Mutex::new(SessionState {
                answers,
                effects,
                draft: DraftStatus::new(),
                submitted: false,
            }),
            changed: Notify::new(),
        }
    }

    /// Fetches the active form for an event and seeds the initial answers:
    /// a stored draft when one exists, else identity prefill, else empty.
    /// A failed draft fetch degrades to starting fresh.
    pub async fn mount(
        api: A,
        event_id: &str,
        identity: Option<&Identity>,
        config: SessionConfig,
    ) -> Result<Self, ApiError> {
        let form = api.active_form(event_id).await?;

        let draft = match api.fetch_draft(&form.id).await {
            Ok(draft) => draft,
            Err(error) => {
                debug!(%error, "draft fetch failed, starting fresh");
                None
            }
        };

        let answers = match draft {
            Some(answers) => answers,
            None => identity
                .map(|identity| prefill(&form.schema, identity))
                .unwrap_or_default(),
        };

        Ok(Self::with_answers(api, form, answers, config))
    }

    pub fn form(&self) -> &FormSpec {
        &self.form
    }

    pub fn answers(&self) -> AnswerSet {
        self.state.lock().answers.clone()
    }

    pub fn effects(&self) -> RuleEffects {
        self.state.lock().effects.clone()
    }

    pub fn draft_status(&self) -> DraftStatus {
        self.state.lock().draft
    }

    pub fn is_submitted(&self) -> bool {
        self.state.lock().submitted
    }

    /// Records an answer and synchronously re-evaluates the full rule list.
    /// `Value::Null` clears the field. Re-arms the autosave debounce.
    pub fn set_answer(&self, field_id: &str, value: Value) {
        {
            let mut state = self.state.lock();
            if value.is_null() {
                state.answers.remove(field_id);
            } else {
                state.answers.insert(field_id.to_string(), value);
            }
            state.effects = evaluate_rules(&self.form.rules, &state.answers);
            state.draft.state = DraftState::Dirty;
        }
        self.changed.notify_one();
    }

    /// Debounced autosave driver. One save is in flight at a time; a change
    /// arriving during a save re-arms the debounce without cancelling the
    /// save. Failures are absorbed and retried on the next window. Runs
    /// until the owning task is dropped; see [`FormSession::spawn_autosave`].
    pub async fn autosave_loop(&self) {
        loop {
            self.changed.notified().await;
            self.debounce().await;

            let snapshot = {
                let mut state = self.state.lock();
                if state.answers.is_empty() {
                    continue;
                }
                state.draft.state = DraftState::Saving;
                state.answers.clone()
            };

            match self.api.save_draft(&self.form.id, &snapshot).await {
                Ok(()) => {
                    let mut state = self.state.lock();
                    state.draft.last_saved_at = Some(chrono::Utc::now());
                    // a change that landed mid-save keeps the state dirty
                    if state.draft.state == DraftState::Saving {
                        state.draft.state = DraftState::Saved;
                    }
                }
                Err(error) => {
                    warn!(%error, "draft autosave failed, will retry");
                    let mut state = self.state.lock();
                    if state.draft.state == DraftState::Saving {
                        state.draft.state = DraftState::SaveFailed;
                    }
                }
            }
        }
    }

    /// Waits until no change has arrived for a full debounce window.
    async fn debounce(&self) {
        loop {
            let quiet = tokio::time::sleep(self.config.debounce);
            tokio::pin!(quiet);
            tokio::select! {
                _ = &mut quiet => return,
                _ = self.changed.notified() => {}
            }
        }
    }

    /// Validates locally and submits the full answer set, hidden fields'
    /// stale values included. Nothing is sent when validation fails.
    pub async fn submit(&self) -> SubmitOutcome {
        let snapshot = {
            let state = self.state.lock();
            let result = validate(&self.form, &state.answers);
            if !result.valid {
                return SubmitOutcome::Invalid {
                    missing: result.missing_required,
                };
            }
            state.answers.clone()
        };

        match self.api.submit(&self.form.id, &snapshot).await {
            Ok(()) => {
                let mut state = self.state.lock();
                state.answers = AnswerSet::new();
                state.effects = evaluate_rules(&self.form.rules, &state.answers);
                state.draft.state = DraftState::Empty;
                state.submitted = true;
                SubmitOutcome::Submitted
            }
            Err(error) => SubmitOutcome::Failed(error),
        }
    }
}

impl<A: FormsApi + 'static> FormSession<A> {
    /// Spawns the autosave driver. Dropping the returned handle aborts the
    /// driver and releases the debounce timer.
    pub fn spawn_autosave(self: &Arc<Self>) -> AutosaveHandle {
        let session = Arc::clone(self);
        let task = tokio::spawn(async move { session.autosave_loop().await });
        AutosaveHandle { task }
    }
}

/// Owns the autosave task; aborting on drop releases the debounce timer.
pub struct AutosaveHandle {
    task: JoinHandle<()>,
}

impl AutosaveHandle {
    pub fn abort(&self) {
        self.task.abort();
    }
}

impl Drop for AutosaveHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
