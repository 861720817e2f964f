//! Runtime registry keyed by language.
//!
//! Native runtimes are registered ready to use. Lazy runtimes are built by a
//! [`RuntimeLoader`] on first request. Every request that arrives while a load
//! is in flight waits for that same attempt and gets its result, success or
//! failure. Only a success is kept; after a failure the next request starts a
//! fresh attempt.

use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use async_trait::async_trait;
use tokio::sync::watch;

use super::{native::NativeRuntime, python::PythonLoader, Language, LanguageRuntime, RuntimeHandle};
use crate::{config::Config, error::RuntimeError};

#[async_trait]
pub trait RuntimeLoader: Send + Sync {
    fn language(&self) -> Language;

    async fn load(&self) -> Result<Arc<dyn LanguageRuntime>, RuntimeError>;
}

type LoadResult = Result<RuntimeHandle, RuntimeError>;

enum LoadState {
    Idle,
    Loading(watch::Receiver<Option<LoadResult>>),
    Ready(RuntimeHandle),
}

enum Slot {
    Ready(RuntimeHandle),
    Lazy {
        loader: Arc<dyn RuntimeLoader>,
        state: Arc<Mutex<LoadState>>,
    },
}

#[derive(Default)]
pub struct RuntimeRegistry {
    slots: HashMap<Language, Slot>,
}

impl RuntimeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(cfg: &Config) -> Self {
        let mut registry = Self::new();
        registry.register_ready(Arc::new(NativeRuntime::new(cfg.max_operations())));
        registry.register_lazy(PythonLoader::new(cfg.python_bin(), cfg.exec_timeout()));
        registry
    }

    pub fn register_ready(&mut self, runtime: Arc<dyn LanguageRuntime>) {
        let language = runtime.language();
        self.slots.insert(language, Slot::Ready(RuntimeHandle::new(runtime)));
    }

    pub fn register_lazy<L: RuntimeLoader + 'static>(&mut self, loader: L) {
        let language = loader.language();
        self.slots.insert(
            language,
            Slot::Lazy {
                loader: Arc::new(loader),
                state: Arc::new(Mutex::new(LoadState::Idle)),
            },
        );
    }

    pub fn languages(&self) -> Vec<Language> {
        let mut langs: Vec<Language> = self.slots.keys().copied().collect();
        langs.sort_by_key(|l| l.id());
        langs
    }

    pub fn is_loaded(&self, language: Language) -> bool {
        match self.slots.get(&language) {
            Some(Slot::Ready(_)) => true,
            Some(Slot::Lazy { state, .. }) => matches!(*lock(state), LoadState::Ready(_)),
            None => false,
        }
    }

    pub async fn handle(&self, language: Language) -> Result<RuntimeHandle, RuntimeError> {
        let (loader, state) = match self.slots.get(&language) {
            None => return Err(RuntimeError::UnsupportedLanguage(language.id().to_string())),
            Some(Slot::Ready(handle)) => return Ok(handle.clone()),
            Some(Slot::Lazy { loader, state }) => (loader, state),
        };

        let mut attempt = {
            let mut st = lock(state);
            match &*st {
                LoadState::Ready(handle) => return Ok(handle.clone()),
                LoadState::Loading(rx) => rx.clone(),
                LoadState::Idle => {
                    let (tx, rx) = watch::channel(None);
                    *st = LoadState::Loading(rx.clone());
                    spawn_load(language, Arc::clone(loader), Arc::clone(state), tx);
                    rx
                }
            }
        };

        let result = match attempt.wait_for(Option::is_some).await {
            Ok(done) => (*done).clone().unwrap_or_else(|| Err(load_aborted(language))),
            Err(_) => Err(load_aborted(language)),
        };
        result.inspect_err(|e| log::warn!("{}", e))
    }
}

// The load runs on its own task so a caller that gives up waiting does not
// strand the others.
fn spawn_load(
    language: Language,
    loader: Arc<dyn RuntimeLoader>,
    state: Arc<Mutex<LoadState>>,
    tx: watch::Sender<Option<LoadResult>>,
) {
    tokio::spawn(async move {
        log::info!("loading {} runtime", language);
        let result = loader.load().await.map(RuntimeHandle::new);
        *lock(&state) = match &result {
            Ok(handle) => LoadState::Ready(handle.clone()),
            Err(_) => LoadState::Idle,
        };
        // Nobody left waiting is fine.
        let _ = tx.send(Some(result));
    });
}

fn load_aborted(language: Language) -> RuntimeError {
    RuntimeError::Unavailable {
        language: language.display_name().to_string(),
        reason: "loader stopped before finishing".to_string(),
    }
}

fn lock(state: &Mutex<LoadState>) -> MutexGuard<'_, LoadState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl fmt::Debug for RuntimeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RuntimeRegistry")
            .field("languages", &self.languages())
            .finish()
    }
}
