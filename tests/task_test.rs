use std::fs;

use lessonbox::Task;

#[test]
fn task_file_is_loaded() -> anyhow::Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("task.json");
    fs::write(
        &path,
        r#"{"name":"sum","description":"Add two numbers","input":"2 3","expected_output":"5"}"#,
    )?;

    let task = Task::load(&path)?;
    assert_eq!(task.name, "sum");
    assert_eq!(task.input, "2 3");
    assert_eq!(task.expected_output, "5");
    Ok(())
}

#[test]
fn optional_fields_default_to_empty() -> anyhow::Result<()> {
    let task: Task = serde_json::from_str(r#"{"name":"t","expected_output":"x"}"#)?;
    assert!(task.description.is_empty());
    assert!(task.input.is_empty());
    Ok(())
}

#[test]
fn broken_task_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.json");
    fs::write(&path, "{").unwrap();
    let err = Task::load(&path).unwrap_err();
    assert!(format!("{:#}", err).contains("bad.json"));
}
