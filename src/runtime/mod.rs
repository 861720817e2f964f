//! Language runtimes: the pluggable execution backends and their registry.

use std::{fmt, str::FromStr, sync::Arc};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{error::RuntimeError, execution::ExecutionResult};

pub mod capture;
pub mod native;
pub mod python;
pub mod registry;

pub use registry::{RuntimeLoader, RuntimeRegistry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Embedded in-process scripting engine, always available.
    Rhai,
    /// External interpreter, checked on first use.
    Python,
}

impl Language {
    pub fn id(&self) -> &'static str {
        match self {
            Language::Rhai => "rhai",
            Language::Python => "python",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Language::Rhai => "Rhai",
            Language::Python => "Python",
        }
    }

    /// Info string used for fenced code blocks in prompts and hints.
    pub fn fence_tag(&self) -> &'static str {
        self.id()
    }

    pub fn is_native(&self) -> bool {
        matches!(self, Language::Rhai)
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Language {
    type Err = RuntimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rhai" => Ok(Language::Rhai),
            "python" | "python3" | "py" => Ok(Language::Python),
            other => Err(RuntimeError::UnsupportedLanguage(other.to_string())),
        }
    }
}

/// A ready-to-execute interpreter for one language.
///
/// User-level failures (syntax errors, exceptions, limits) are reported in
/// `ExecutionResult::error`. `Err` is reserved for the runtime itself breaking.
#[async_trait]
pub trait LanguageRuntime: Send + Sync {
    fn language(&self) -> Language;

    async fn execute(&self, source: &str, input: &str) -> Result<ExecutionResult, RuntimeError>;
}

/// Shared handle to a loaded runtime; lives as long as the registry that made it.
#[derive(Clone)]
pub struct RuntimeHandle(Arc<dyn LanguageRuntime>);

impl RuntimeHandle {
    pub fn new(runtime: Arc<dyn LanguageRuntime>) -> Self {
        Self(runtime)
    }

    pub fn language(&self) -> Language {
        self.0.language()
    }

    pub async fn execute(&self, source: &str, input: &str) -> Result<ExecutionResult, RuntimeError> {
        self.0.execute(source, input).await
    }

    pub fn ptr_eq(&self, other: &RuntimeHandle) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuntimeHandle").field(&self.language()).finish()
    }
}
