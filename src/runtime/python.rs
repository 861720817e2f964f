//! Python runtime backed by an external interpreter process.
//!
//! The loader checks the interpreter once; each run then starts a fresh
//! process with a bootstrap that redirects `sys.stdout` for the duration of the
//! program. Every printed line is forwarded as soon as it is complete, and a
//! final JSON line reports the trailing value or the error. A program that
//! kills the interpreter still keeps the lines it printed.

use std::{io::Write, process::Stdio, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Deserialize;
use tokio::{io::AsyncWriteExt, process::Command, time::timeout};

use super::{Language, LanguageRuntime, RuntimeLoader};
use crate::{error::RuntimeError, execution::ExecutionResult};

const LINE_MARKER: &str = "__lessonbox_line__";
const RESULT_MARKER: &str = "__lessonbox_result__";

const BOOTSTRAP: &str = r#"
import ast, contextlib, io, json, sys

def _lessonbox_emit(line):
    sys.__stdout__.write("\n__lessonbox_line__" + json.dumps(line) + "\n")
    sys.__stdout__.flush()

class _LessonboxLines(io.TextIOBase):
    def __init__(self):
        self.pending = ""

    def writable(self):
        return True

    def write(self, s):
        self.pending += s
        while "\n" in self.pending:
            line, self.pending = self.pending.split("\n", 1)
            _lessonbox_emit(line.rstrip("\r"))
        return len(s)

    def finish(self):
        if self.pending:
            _lessonbox_emit(self.pending)
            self.pending = ""

def _lessonbox_main(path):
    with open(path, encoding="utf-8") as f:
        src = f.read()
    out = _LessonboxLines()
    report = {"value": None, "error": None}
    scope = {"__name__": "__main__"}
    try:
        tree = ast.parse(src, filename="<lesson>", mode="exec")
        tail = None
        if tree.body and isinstance(tree.body[-1], ast.Expr):
            tail = ast.Expression(tree.body.pop().value)
        with contextlib.redirect_stdout(out):
            exec(compile(tree, "<lesson>", "exec"), scope)
            if tail is not None:
                value = eval(compile(tail, "<lesson>", "eval"), scope)
                if value is not None:
                    report["value"] = str(value)
    except SystemExit as exc:
        if exc.code not in (None, 0):
            if isinstance(exc.code, int):
                report["error"] = "exited with status " + str(exc.code)
            else:
                report["error"] = str(exc.code)
    except BaseException as exc:
        report["error"] = str(exc) or type(exc).__name__
    out.finish()
    sys.__stdout__.write("\n__lessonbox_result__" + json.dumps(report) + "\n")
    sys.__stdout__.flush()

_lessonbox_main(sys.argv[1])
"#;

#[derive(Debug, Deserialize)]
struct BootstrapReport {
    value: Option<String>,
    error: Option<String>,
}

/// What the interpreter wrote on its real stdout.
#[derive(Debug, Default)]
struct Transcript {
    lines: Vec<String>,
    report: Option<BootstrapReport>,
}

#[derive(Debug, Clone)]
pub struct PythonLoader {
    program: String,
    exec_timeout: Duration,
}

impl PythonLoader {
    pub fn new(program: impl Into<String>, exec_timeout: Duration) -> Self {
        Self { program: program.into(), exec_timeout }
    }
}

#[async_trait]
impl RuntimeLoader for PythonLoader {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn load(&self) -> Result<Arc<dyn LanguageRuntime>, RuntimeError> {
        let unavailable = |reason: String| RuntimeError::Unavailable {
            language: Language::Python.display_name().to_string(),
            reason,
        };

        log::debug!("checking python interpreter `{}`", self.program);
        let out = Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| unavailable(format!("cannot start `{}`: {}", self.program, e)))?;
        if !out.status.success() {
            return Err(unavailable(format!(
                "`{} --version` exited with {}",
                self.program, out.status
            )));
        }

        // Older interpreters print the version on stderr.
        let mut version = String::from_utf8_lossy(&out.stdout).trim().to_string();
        if version.is_empty() {
            version = String::from_utf8_lossy(&out.stderr).trim().to_string();
        }
        log::info!("python runtime ready: {}", version);

        Ok(Arc::new(PythonRuntime {
            program: self.program.clone(),
            exec_timeout: self.exec_timeout,
        }))
    }
}

#[derive(Debug)]
pub struct PythonRuntime {
    program: String,
    exec_timeout: Duration,
}

#[async_trait]
impl LanguageRuntime for PythonRuntime {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn execute(&self, source: &str, input: &str) -> Result<ExecutionResult, RuntimeError> {
        let mut script = tempfile::Builder::new()
            .prefix("lessonbox-")
            .suffix(".py")
            .tempfile()?;
        script.write_all(source.as_bytes())?;
        script.flush()?;

        let mut child = Command::new(&self.program)
            .arg("-u") // unbuffered
            .arg("-c")
            .arg(BOOTSTRAP)
            .arg(script.path())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        // Feeding stdin runs under the same deadline as the program: a program
        // that never reads would otherwise block a large write forever.
        let stdin = child.stdin.take();
        let feed = async move {
            if let Some(mut stdin) = stdin {
                if let Err(e) = stdin.write_all(input.as_bytes()).await {
                    log::debug!("python stdin closed early: {}", e);
                }
            }
        };
        let run = async move {
            let ((), out) = tokio::join!(feed, child.wait_with_output());
            out
        };

        let out = match timeout(self.exec_timeout, run).await {
            Ok(out) => out?,
            Err(_) => {
                log::warn!("python execution exceeded {:?}", self.exec_timeout);
                return Ok(ExecutionResult {
                    error: Some(RuntimeError::Timeout(self.exec_timeout).to_string()),
                    ..Default::default()
                });
            }
        };

        let stderr = String::from_utf8_lossy(&out.stderr);
        if !stderr.trim().is_empty() {
            log::debug!("python stderr: {}", stderr.trim());
        }

        let transcript = read_transcript(&String::from_utf8_lossy(&out.stdout));
        let result = match transcript.report {
            Some(report) => ExecutionResult {
                stdout: transcript.lines,
                return_value: report.value,
                error: report.error,
            },
            // The program took the interpreter down before it could report.
            None => {
                log::debug!("python exited with {} without a report", out.status);
                ExecutionResult {
                    stdout: transcript.lines,
                    return_value: None,
                    error: Some(format!("interpreter exited with {}", out.status)),
                }
            }
        };
        Ok(result)
    }
}

fn read_transcript(stdout: &str) -> Transcript {
    let mut transcript = Transcript::default();
    for line in stdout.lines() {
        if let Some(payload) = line.strip_prefix(LINE_MARKER) {
            match serde_json::from_str::<String>(payload) {
                Ok(text) => transcript.lines.push(text),
                Err(e) => log::debug!("unreadable output line: {}", e),
            }
        } else if let Some(payload) = line.strip_prefix(RESULT_MARKER) {
            transcript.report = serde_json::from_str(payload).ok();
        }
    }
    transcript
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_and_report_are_read_in_order() {
        let raw = "\n__lessonbox_line__\"a\"\nnoise\n__lessonbox_line__\"b \\\"q\\\"\"\n\
                   \n__lessonbox_result__{\"value\":\"4\",\"error\":null}\n";
        let transcript = read_transcript(raw);
        assert_eq!(transcript.lines, vec!["a".to_string(), "b \"q\"".to_string()]);
        assert_eq!(transcript.report.unwrap().value.as_deref(), Some("4"));
    }

    #[test]
    fn lines_survive_a_missing_report() {
        let transcript = read_transcript("\n__lessonbox_line__\"hi\"\n");
        assert_eq!(transcript.lines, vec!["hi".to_string()]);
        assert!(transcript.report.is_none());
    }
}
