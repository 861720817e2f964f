//! Exercise descriptors supplied by the lesson content.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub input: String,
    pub expected_output: String,
}

impl Task {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading task file: {}", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("parsing task file: {}", path.display()))
    }
}
