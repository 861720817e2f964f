use std::time::Duration;

use lessonbox::{config::Config, Language};

#[test]
fn defaults_are_filled_in() {
    let cfg = Config::from_pairs(std::iter::empty::<(String, String)>());
    assert_eq!(cfg.hint_delay(), Duration::from_millis(3000));
    assert_eq!(cfg.request_timeout(), Duration::from_secs(60));
    assert_eq!(cfg.exec_timeout(), Duration::from_secs(10));
    assert_eq!(cfg.max_operations(), 1_000_000);
    assert_eq!(cfg.python_bin(), "python3");
    assert_eq!(cfg.default_language(), Language::Rhai);
    assert_eq!(cfg.get("HINT_API_URL").as_deref(), Some("http://localhost:11434"));
    assert!(cfg.get_bool("PRETTIFY_MARKDOWN"));
}

#[test]
fn overrides_replace_defaults() {
    let cfg = Config::from_pairs([
        ("HINT_DELAY_MS", "0"),
        ("DEFAULT_LANGUAGE", "python"),
        ("PRETTIFY_MARKDOWN", "false"),
        ("EXEC_TIMEOUT", "not a number"),
    ]);
    assert_eq!(cfg.hint_delay(), Duration::ZERO);
    assert_eq!(cfg.default_language(), Language::Python);
    assert!(!cfg.get_bool("PRETTIFY_MARKDOWN"));
    assert_eq!(cfg.exec_timeout(), Duration::from_secs(10));
}
