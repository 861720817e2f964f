//! Execution sandbox: run learner code on a runtime and render the outcome.

pub mod compare;

use crate::{error::RuntimeError, runtime::RuntimeHandle};

pub const EMPTY_SOURCE_MESSAGE: &str = "Please write some code first.";
pub const NO_OUTPUT_MESSAGE: &str = "Code executed, but no output.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutionResult {
    /// Printed lines in emission order.
    pub stdout: Vec<String>,
    /// Stringified value of the final expression, if it had one.
    pub return_value: Option<String>,
    pub error: Option<String>,
}

impl ExecutionResult {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn render(&self) -> String {
        if let Some(err) = &self.error {
            return format!("Error: {}", err);
        }
        if !self.stdout.is_empty() {
            return self.stdout.join("\n");
        }
        match &self.return_value {
            Some(value) => value.clone(),
            None => NO_OUTPUT_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Nothing to run; the runtime was not touched.
    Empty,
    /// The runtime could not be loaded or broke down.
    Unavailable(String),
    Completed(ExecutionResult),
}

impl RunOutcome {
    pub fn render(&self) -> String {
        match self {
            RunOutcome::Empty => EMPTY_SOURCE_MESSAGE.to_string(),
            RunOutcome::Unavailable(reason) => format!("Runtime unavailable: {}", reason),
            RunOutcome::Completed(result) => result.render(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Completed(r) if !r.is_error())
    }

    /// A runtime failure that happened before anything was executed.
    pub fn from_load_error(err: &RuntimeError) -> Self {
        RunOutcome::Unavailable(err.to_string())
    }
}

pub async fn run(source: &str, runtime: &RuntimeHandle) -> RunOutcome {
    run_with_input(source, "", runtime).await
}

pub async fn run_with_input(source: &str, input: &str, runtime: &RuntimeHandle) -> RunOutcome {
    if source.trim().is_empty() {
        return RunOutcome::Empty;
    }

    log::debug!("running {} bytes of {}", source.len(), runtime.language());
    match runtime.execute(source, input).await {
        Ok(result) => RunOutcome::Completed(result),
        Err(err) => {
            log::warn!("{} runtime failed: {}", runtime.language(), err);
            RunOutcome::Unavailable(err.to_string())
        }
    }
}
