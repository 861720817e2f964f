//! In-process Rhai runtime. Needs no loading; `print`/`debug` go through the
//! shared [`OutputSink`].

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use rhai::{Dynamic, Engine, EvalAltResult};

use super::{capture::OutputSink, Language, LanguageRuntime};
use crate::{error::RuntimeError, execution::ExecutionResult};

pub struct NativeRuntime {
    engine: Engine,
    sink: Arc<OutputSink>,
    input: Arc<Mutex<String>>,
}

impl NativeRuntime {
    /// `max_operations == 0` disables the operation budget.
    pub fn new(max_operations: u64) -> Self {
        let sink = Arc::new(OutputSink::new());
        let input = Arc::new(Mutex::new(String::new()));

        let mut engine = Engine::new();
        if max_operations > 0 {
            engine.set_max_operations(max_operations);
        }

        let print_sink = Arc::clone(&sink);
        engine.on_print(move |text| print_sink.emit(text));
        let debug_sink = Arc::clone(&sink);
        engine.on_debug(move |text, _source, _pos| debug_sink.emit(text));

        let program_input = Arc::clone(&input);
        engine.register_fn("input", move || -> String {
            program_input
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone()
        });

        Self { engine, sink, input }
    }

    pub fn sink(&self) -> &OutputSink {
        &self.sink
    }

    pub fn execute_blocking(&self, source: &str, input: &str) -> ExecutionResult {
        let guard = self.sink.capture();
        *self.input.lock().unwrap_or_else(PoisonError::into_inner) = input.to_string();

        let outcome = self.engine.eval::<Dynamic>(source);
        let stdout = guard.take_lines();
        drop(guard);

        match outcome {
            Ok(value) => ExecutionResult {
                stdout,
                return_value: if value.is_unit() { None } else { Some(value.to_string()) },
                error: None,
            },
            Err(err) => {
                log::debug!("rhai script failed: {}", err);
                ExecutionResult {
                    stdout,
                    return_value: None,
                    error: Some(describe_error(&err)),
                }
            }
        }
    }
}

impl Default for NativeRuntime {
    fn default() -> Self {
        Self::new(1_000_000)
    }
}

#[async_trait]
impl LanguageRuntime for NativeRuntime {
    fn language(&self) -> Language {
        Language::Rhai
    }

    // Evaluates inline on the calling task; the operation budget bounds how
    // long that blocks.
    async fn execute(&self, source: &str, input: &str) -> Result<ExecutionResult, RuntimeError> {
        Ok(self.execute_blocking(source, input))
    }
}

// A `throw` reports the thrown value itself, like an exception message.
fn describe_error(err: &EvalAltResult) -> String {
    match err {
        EvalAltResult::ErrorRuntime(value, _) if !value.is_unit() => value.to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_expression_becomes_the_return_value() {
        let rt = NativeRuntime::default();
        let result = rt.execute_blocking("2 + 2", "");
        assert!(result.stdout.is_empty());
        assert_eq!(result.return_value.as_deref(), Some("4"));
        assert!(result.error.is_none());
    }

    #[test]
    fn thrown_value_is_the_error_message() {
        let rt = NativeRuntime::default();
        let result = rt.execute_blocking(r#"print("before"); throw "boom";"#, "");
        assert_eq!(result.stdout, vec!["before".to_string()]);
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert!(!rt.sink().is_capturing());
    }

    #[test]
    fn input_function_reads_the_task_input() {
        let rt = NativeRuntime::default();
        let result = rt.execute_blocking("print(input().to_upper());", "abc");
        assert_eq!(result.stdout, vec!["ABC".to_string()]);
    }

    #[test]
    fn operation_budget_stops_runaway_loops() {
        let rt = NativeRuntime::new(10_000);
        let result = rt.execute_blocking("loop { }", "");
        assert!(result.error.is_some());
    }
}
