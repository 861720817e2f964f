//! Lesson code runner: executes learner code on pluggable language runtimes,
//! checks the output against an exercise and fetches AI hints on mismatch.

pub mod config;
pub mod error;
pub mod execution;
pub mod hint;
pub mod llm;
pub mod printer;
pub mod runtime;
pub mod session;
pub mod store;
pub mod task;

pub use error::{HintError, RuntimeError, StoreError};
pub use execution::{ExecutionResult, RunOutcome};
pub use hint::{Hint, HintFetcher, HintSource};
pub use runtime::{Language, LanguageRuntime, RuntimeHandle, RuntimeRegistry};
pub use session::{LessonSession, Phase};
pub use task::Task;
