//! Per-widget run/compare/hint flow.
//!
//! ```text
//! Idle -> Running -> Succeeded | Failed -> AwaitingHintConfirmation
//!      -> FetchingHint -> ShowingHint -> Idle
//! ```
//!
//! Only explicit calls and the hint-offer timer move the session. Runs are not
//! serialized: the stored output is that of the last run to complete.

use std::{
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use tokio::{sync::Notify, task::JoinHandle};

use crate::{
    execution::{self, compare, RunOutcome},
    hint::{Hint, HintSource},
    runtime::{Language, RuntimeRegistry},
    store::{draft_key, KeyValueStore},
    task::Task,
};

pub const DEFAULT_HINT_DELAY: Duration = Duration::from_millis(3000);

const SCRATCH_TASK: &str = "scratch";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
    AwaitingHintConfirmation,
    FetchingHint,
    ShowingHint,
}

#[derive(Debug, Default)]
struct SessionState {
    phase: Phase,
    output: Option<String>,
    matched: Option<bool>,
    last_code: String,
    pending_offers: usize,
    hint: Option<Hint>,
}

pub struct LessonSession {
    registry: Arc<RuntimeRegistry>,
    hints: Arc<dyn HintSource>,
    store: Option<Arc<dyn KeyValueStore>>,
    language: Language,
    task: Option<Task>,
    hint_delay: Duration,
    state: Arc<Mutex<SessionState>>,
    offer: Arc<Notify>,
    timers: Vec<JoinHandle<()>>,
}

impl LessonSession {
    pub fn new(registry: Arc<RuntimeRegistry>, hints: Arc<dyn HintSource>, language: Language) -> Self {
        Self {
            registry,
            hints,
            store: None,
            language,
            task: None,
            hint_delay: DEFAULT_HINT_DELAY,
            state: Arc::new(Mutex::new(SessionState::default())),
            offer: Arc::new(Notify::new()),
            timers: Vec::new(),
        }
    }

    pub fn with_task(mut self, task: Task) -> Self {
        self.task = Some(task);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_hint_delay(mut self, delay: Duration) -> Self {
        self.hint_delay = delay;
        self
    }

    /// Applies to offers scheduled from now on.
    pub fn set_hint_delay(&mut self, delay: Duration) {
        self.hint_delay = delay;
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn task(&self) -> Option<&Task> {
        self.task.as_ref()
    }

    pub fn phase(&self) -> Phase {
        lock(&self.state).phase
    }

    pub fn output(&self) -> Option<String> {
        lock(&self.state).output.clone()
    }

    /// Whether the last completed run matched the task's expected output.
    pub fn output_matches(&self) -> Option<bool> {
        lock(&self.state).matched
    }

    pub fn hint(&self) -> Option<Hint> {
        lock(&self.state).hint.clone()
    }

    pub async fn run(&mut self, source: &str) -> RunOutcome {
        {
            let mut st = lock(&self.state);
            st.phase = Phase::Running;
            st.output = None;
            st.matched = None;
        }
        self.save_draft(source);

        let input = self.task.as_ref().map(|t| t.input.as_str()).unwrap_or("");
        let outcome = if source.trim().is_empty() {
            RunOutcome::Empty
        } else {
            match self.registry.handle(self.language).await {
                Ok(handle) => execution::run_with_input(source, input, &handle).await,
                Err(e) => RunOutcome::from_load_error(&e),
            }
        };

        let rendered = outcome.render();
        let matched = match (&self.task, &outcome) {
            (Some(task), RunOutcome::Completed(_)) => {
                Some(compare::matches(&rendered, &task.expected_output))
            }
            _ => None,
        };

        {
            let mut st = lock(&self.state);
            st.output = Some(rendered);
            st.matched = matched;
            st.last_code = source.to_string();
            st.phase = if outcome.is_success() { Phase::Succeeded } else { Phase::Failed };
        }

        if matched == Some(false) {
            self.schedule_hint_offer();
        }
        outcome
    }

    fn schedule_hint_offer(&mut self) {
        let state = Arc::downgrade(&self.state);
        let offer = Arc::clone(&self.offer);
        let delay = self.hint_delay;
        log::debug!("output mismatch; offering a hint in {:?}", delay);
        lock(&self.state).pending_offers += 1;

        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(state) = state.upgrade() else { return };
            {
                let mut st = lock(&state);
                st.pending_offers -= 1;
                if !matches!(st.phase, Phase::Running | Phase::FetchingHint | Phase::ShowingHint) {
                    st.phase = Phase::AwaitingHintConfirmation;
                }
            }
            offer.notify_waiters();
        });

        self.timers.retain(|t| !t.is_finished());
        self.timers.push(timer);
    }

    /// Resolves once a pending hint offer fires; `false` if none is pending.
    pub async fn wait_for_hint_offer(&self) -> bool {
        loop {
            // Registered before the checks so a timer firing in between is seen.
            let notified = self.offer.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let st = lock(&self.state);
                if st.phase == Phase::AwaitingHintConfirmation {
                    return true;
                }
                if st.pending_offers == 0 {
                    return false;
                }
            }
            notified.await;
        }
    }

    /// Accepts an offered hint and starts fetching it.
    ///
    /// The fetch only holds a weak reference to the session; a hint arriving
    /// after the session is gone is dropped.
    pub fn confirm_hint(&self) -> Option<JoinHandle<()>> {
        let task = self.task.clone()?;
        let (code, actual) = {
            let mut st = lock(&self.state);
            if st.phase != Phase::AwaitingHintConfirmation {
                return None;
            }
            st.phase = Phase::FetchingHint;
            (st.last_code.clone(), st.output.clone().unwrap_or_default())
        };

        let hints = Arc::clone(&self.hints);
        let state = Arc::downgrade(&self.state);
        let language = self.language;
        Some(tokio::spawn(async move {
            let hint = hints.fetch_hint(&task, &code, language, &actual).await;
            match state.upgrade() {
                Some(state) => {
                    let mut st = lock(&state);
                    st.hint = Some(hint);
                    st.phase = Phase::ShowingHint;
                }
                None => log::debug!("session closed before the hint for `{}` arrived", task.name),
            }
        }))
    }

    /// Confirms the offer and waits for the hint.
    pub async fn request_hint(&self) -> Option<Hint> {
        let fetch = self.confirm_hint()?;
        if let Err(e) = fetch.await {
            log::warn!("hint task failed: {}", e);
            return None;
        }
        self.hint()
    }

    pub fn decline_hint(&self) {
        let mut st = lock(&self.state);
        if st.phase == Phase::AwaitingHintConfirmation {
            st.phase = Phase::Idle;
        }
    }

    pub fn dismiss_hint(&self) {
        let mut st = lock(&self.state);
        st.hint = None;
        st.phase = Phase::Idle;
    }

    pub fn load_draft(&self) -> Option<String> {
        let store = self.store.as_ref()?;
        match store.get(&self.draft_key()) {
            Ok(draft) => draft,
            Err(e) => {
                log::warn!("cannot read draft: {}", e);
                None
            }
        }
    }

    fn save_draft(&self, source: &str) {
        let Some(store) = &self.store else { return };
        let key = self.draft_key();
        let saved = if source.trim().is_empty() {
            store.remove(&key)
        } else {
            store.set(&key, source)
        };
        if let Err(e) = saved {
            log::warn!("cannot save draft `{}`: {}", key, e);
        }
    }

    fn draft_key(&self) -> String {
        let name = self.task.as_ref().map(|t| t.name.as_str()).unwrap_or(SCRATCH_TASK);
        draft_key(name, self.language)
    }
}

impl Drop for LessonSession {
    fn drop(&mut self) {
        for timer in &self.timers {
            timer.abort();
        }
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
