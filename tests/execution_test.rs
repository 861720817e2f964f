use std::{process::Command, sync::Arc, time::Duration};

use lessonbox::{
    config::Config,
    execution::{self, RunOutcome, EMPTY_SOURCE_MESSAGE, NO_OUTPUT_MESSAGE},
    runtime::{native::NativeRuntime, python::PythonLoader, Language, RuntimeLoader, RuntimeRegistry},
    RuntimeHandle,
};

fn native() -> RuntimeHandle {
    RuntimeHandle::new(Arc::new(NativeRuntime::default()))
}

fn python_available() -> bool {
    Command::new("python3")
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

#[tokio::test]
async fn blank_source_is_not_executed() {
    let rt = native();
    for src in ["", "   ", "\n\t\n"] {
        let outcome = execution::run(src, &rt).await;
        assert_eq!(outcome, RunOutcome::Empty);
        assert_eq!(outcome.render(), EMPTY_SOURCE_MESSAGE);
    }
}

#[tokio::test]
async fn printed_lines_are_joined_in_order() {
    let outcome = execution::run(r#"print("a"); print("b");"#, &native()).await;
    assert!(outcome.is_success());
    assert_eq!(outcome.render(), "a\nb");
}

#[tokio::test]
async fn printed_lines_win_over_the_final_value() {
    let outcome = execution::run(r#"print("shown"); 42"#, &native()).await;
    assert_eq!(outcome.render(), "shown");
}

#[tokio::test]
async fn final_value_is_used_when_nothing_is_printed() {
    let outcome = execution::run("2 + 2", &native()).await;
    assert_eq!(outcome.render(), "4");
}

#[tokio::test]
async fn silent_program_reports_no_output() {
    let outcome = execution::run("let x = 1;", &native()).await;
    assert_eq!(outcome.render(), NO_OUTPUT_MESSAGE);
}

#[tokio::test]
async fn errors_are_reported_and_the_runtime_stays_usable() {
    let rt = native();
    let failed = execution::run(r#"print("partial"); throw "boom";"#, &rt).await;
    assert!(!failed.is_success());
    assert_eq!(failed.render(), "Error: boom");

    let syntax = execution::run("let = ;", &rt).await;
    assert!(syntax.render().starts_with("Error: "));

    let next = execution::run(r#"print("still works");"#, &rt).await;
    assert_eq!(next.render(), "still works");
}

#[tokio::test]
async fn native_runtime_is_ready_without_loading() {
    let registry = RuntimeRegistry::from_config(&Config::from_pairs([("MAX_OPERATIONS", "5000")]));
    assert!(registry.is_loaded(Language::Rhai));
    let handle = registry.handle(Language::Rhai).await.unwrap();
    assert_eq!(handle.language(), Language::Rhai);

    let outcome = execution::run("let n = 0; loop { n += 1; }", &handle).await;
    assert!(outcome.render().starts_with("Error: "));
}

#[tokio::test]
async fn missing_interpreter_is_reported_as_unavailable() {
    let loader = PythonLoader::new("lessonbox-no-such-python", Duration::from_secs(5));
    let err = loader.load().await.err().expect("load should fail");
    let outcome = RunOutcome::from_load_error(&err);
    assert!(matches!(outcome, RunOutcome::Unavailable(_)));
    assert!(outcome.render().starts_with("Runtime unavailable: Python runtime unavailable"));
}

#[tokio::test]
async fn python_prints_values_and_errors() {
    if !python_available() {
        eprintln!("python3 not found; skipping");
        return;
    }
    let loader = PythonLoader::new("python3", Duration::from_secs(20));
    let rt = RuntimeHandle::new(loader.load().await.unwrap());

    let printed = execution::run("print('a')\nprint('b')", &rt).await;
    assert_eq!(printed.render(), "a\nb");

    let value = execution::run("x = 2\nx + 2", &rt).await;
    assert_eq!(value.render(), "4");

    let silent = execution::run("x = 1", &rt).await;
    assert_eq!(silent.render(), NO_OUTPUT_MESSAGE);

    let failed = execution::run("raise ValueError('bad value')", &rt).await;
    assert_eq!(failed.render(), "Error: bad value");

    let echoed = execution::run_with_input("print(input().upper())", "hello\n", &rt).await;
    assert_eq!(echoed.render(), "HELLO");

    let prints_win = execution::run("print('a')\n40 + 2", &rt).await;
    assert_eq!(prints_win.render(), "a");

    let partial = rt.execute("print('partial')\nraise RuntimeError('late')", "").await.unwrap();
    assert_eq!(partial.stdout, vec!["partial".to_string()]);
    assert_eq!(partial.error.as_deref(), Some("late"));
    assert_eq!(execution::run("print('partial')\nraise RuntimeError('late')", &rt).await.render(), "Error: late");

    let no_newline = execution::run("import sys\nsys.stdout.write('x')", &rt).await;
    assert_eq!(no_newline.render(), "x");
}

#[tokio::test]
async fn python_exit_calls_are_reported() {
    if !python_available() {
        eprintln!("python3 not found; skipping");
        return;
    }
    let loader = PythonLoader::new("python3", Duration::from_secs(20));
    let rt = RuntimeHandle::new(loader.load().await.unwrap());

    // A clean exit is a normal end of the program.
    let clean = execution::run("import sys\nprint('a')\nsys.exit(0)", &rt).await;
    assert!(clean.is_success());
    assert_eq!(clean.render(), "a");

    let failed = execution::run("import sys\nsys.exit(2)", &rt).await;
    assert_eq!(failed.render(), "Error: exited with status 2");

    let message = execution::run("import sys\nsys.exit('bad input')", &rt).await;
    assert_eq!(message.render(), "Error: bad input");

    // Killing the interpreter is the program's error, not a missing runtime,
    // and what it printed first is kept.
    let hard = rt.execute("import os\nprint('hi')\nos._exit(3)", "").await.unwrap();
    assert_eq!(hard.stdout, vec!["hi".to_string()]);
    let outcome = execution::run("import os\nprint('hi')\nos._exit(3)", &rt).await;
    assert!(matches!(outcome, RunOutcome::Completed(_)));
    assert!(outcome.render().starts_with("Error: interpreter exited with"));
}

#[tokio::test]
async fn python_runaway_program_times_out() {
    if !python_available() {
        eprintln!("python3 not found; skipping");
        return;
    }
    let loader = PythonLoader::new("python3", Duration::from_millis(500));
    let rt = RuntimeHandle::new(loader.load().await.unwrap());
    let outcome = execution::run("while True:\n    pass", &rt).await;
    assert!(outcome.render().starts_with("Error: execution timed out"));

    // Input larger than the pipe buffer, never read by the program.
    let big_input = "x".repeat(1 << 20);
    let outcome = tokio::time::timeout(
        Duration::from_secs(10),
        execution::run_with_input("while True:\n    pass", &big_input, &rt),
    )
    .await
    .expect("the execution deadline covers feeding stdin");
    assert!(outcome.render().starts_with("Error: execution timed out"));
}
