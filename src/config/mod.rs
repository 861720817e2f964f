use std::{
    collections::HashMap,
    env,
    fs,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    time::Duration,
};

use directories::BaseDirs;

use crate::runtime::Language;

#[derive(Debug, Clone)]
pub struct Config {
    inner: HashMap<String, String>,
    pub config_path: PathBuf,
}

impl Config {
    pub fn load() -> Self {
        let config_path = default_config_path();
        let mut cfg = Self::from_pairs(std::iter::empty::<(String, String)>());
        cfg.config_path = config_path.clone();
        cfg.merge_rc_file(&config_path);

        // Overlay environment variables (take precedence)
        for (k, v) in env::vars() {
            if is_config_key(&k) {
                cfg.inner.insert(k, v);
            }
        }
        cfg
    }

    /// Defaults overlaid with the given pairs; no rc file, no environment.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut map = default_map();
        for (k, v) in pairs {
            map.insert(k.into(), v.into());
        }
        Self { inner: map, config_path: default_config_path() }
    }

    fn merge_rc_file(&mut self, path: &Path) {
        if !path.exists() {
            return;
        }
        match fs::File::open(path) {
            Ok(file) => {
                let reader = BufReader::new(file);
                for line in reader.lines().map_while(Result::ok) {
                    let line = line.trim();
                    if line.is_empty() || line.starts_with('#') {
                        continue;
                    }
                    if let Some((k, v)) = line.split_once('=') {
                        self.inner.insert(k.trim().to_string(), v.trim().to_string());
                    }
                }
            }
            Err(e) => log::warn!("cannot read {}: {}", path.display(), e),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).cloned()
    }

    pub fn get_bool(&self, key: &str) -> bool {
        self.get(key)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
    }

    pub fn get_u64(&self, key: &str) -> Option<u64> {
        self.get(key).and_then(|v| v.trim().parse::<u64>().ok())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("REQUEST_TIMEOUT").unwrap_or(60))
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.get_u64("EXEC_TIMEOUT").unwrap_or(10))
    }

    pub fn hint_delay(&self) -> Duration {
        Duration::from_millis(self.get_u64("HINT_DELAY_MS").unwrap_or(3000))
    }

    pub fn max_operations(&self) -> u64 {
        self.get_u64("MAX_OPERATIONS").unwrap_or(1_000_000)
    }

    pub fn python_bin(&self) -> String {
        self.get("PYTHON_BIN").unwrap_or_else(|| "python3".into())
    }

    pub fn default_language(&self) -> Language {
        self.get("DEFAULT_LANGUAGE")
            .and_then(|v| v.parse().ok())
            .unwrap_or(Language::Rhai)
    }

    pub fn store_path(&self) -> PathBuf {
        self.get("STORE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| env::temp_dir().join("lessonbox").join("store"))
    }
}

fn is_config_key(k: &str) -> bool {
    const KEYS: &[&str] = &[
        "HINT_API_URL",
        "HINT_MODEL",
        "REQUEST_TIMEOUT",
        "HINT_DELAY_MS",
        "PYTHON_BIN",
        "EXEC_TIMEOUT",
        "MAX_OPERATIONS",
        "STORE_PATH",
        "DEFAULT_LANGUAGE",
        "PRETTIFY_MARKDOWN",
    ];

    KEYS.contains(&k) || k.starts_with("LESSONBOX_")
}

fn config_dir() -> PathBuf {
    BaseDirs::new()
        .map(|b| b.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("~/.config"))
        .join("lessonbox")
}

fn default_config_path() -> PathBuf {
    config_dir().join(".lessonboxrc")
}

fn default_map() -> HashMap<String, String> {
    let mut m = HashMap::new();
    let temp = env::temp_dir().join("lessonbox");

    // Paths
    m.insert(
        "STORE_PATH".into(),
        temp.join("store").to_string_lossy().into_owned(),
    );

    // Numbers
    m.insert("REQUEST_TIMEOUT".into(), "60".into());
    m.insert("HINT_DELAY_MS".into(), "3000".into());
    m.insert("EXEC_TIMEOUT".into(), "10".into());
    m.insert("MAX_OPERATIONS".into(), "1000000".into());

    // Strings
    m.insert("HINT_API_URL".into(), "http://localhost:11434".into());
    m.insert("HINT_MODEL".into(), "llama3".into());
    m.insert("PYTHON_BIN".into(), "python3".into());
    m.insert("DEFAULT_LANGUAGE".into(), "rhai".into());

    // Bools as strings
    m.insert("PRETTIFY_MARKDOWN".into(), "true".into());

    m
}
