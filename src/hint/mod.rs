//! AI hints for failing exercises: prompt construction, response parsing and
//! the fetcher that never fails.
//!
//! A response is read with a small grammar: optional prose, at most one fenced
//! block tagged with the exercise language, optional prose. Anything that does
//! not fit becomes plain prose.

use std::ops::Range;

use async_trait::async_trait;

use crate::{config::Config, error::HintError, llm::GenerateClient, runtime::Language, task::Task};

pub const FALLBACK_HINT_TEXT: &str =
    "Sorry, a hint could not be generated right now. Compare your output with the expected output and try again.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hint {
    pub text_before: String,
    pub code: Option<String>,
    pub text_after: String,
}

impl Hint {
    pub fn fallback() -> Self {
        Self {
            text_before: FALLBACK_HINT_TEXT.to_string(),
            code: None,
            text_after: String::new(),
        }
    }

    pub fn is_fallback(&self) -> bool {
        *self == Self::fallback()
    }
}

pub fn build_prompt(task: &Task, code: &str, language: Language, actual: &str) -> String {
    let tag = language.fence_tag();
    format!(
        "You are a patient programming tutor. A student is solving the following exercise in {lang}.\n\n\
         Exercise: {description}\n\n\
         Student code:\n```{tag}\n{code}\n```\n\n\
         Actual output:\n{actual}\n\n\
         Expected output:\n{expected}\n\n\
         Explain briefly why the output differs, without giving away more than needed. \
         If a code change helps, show it in a single ```{tag} code block.",
        lang = language.display_name(),
        description = task.description.trim(),
        code = code.trim_end(),
        actual = actual.trim(),
        expected = task.expected_output.trim(),
    )
}

pub fn parse_hint(raw: &str, fence_tag: &str) -> Hint {
    match find_fenced_block(raw, fence_tag) {
        Some(block) => Hint {
            text_before: raw[..block.open].trim().to_string(),
            code: Some(raw[block.body].trim().to_string()),
            text_after: strip_inline_code(&raw[block.end..]).trim().to_string(),
        },
        None => Hint {
            text_before: raw.trim().to_string(),
            code: None,
            text_after: String::new(),
        },
    }
}

struct FencedBlock {
    open: usize,
    body: Range<usize>,
    end: usize,
}

fn find_fenced_block(text: &str, tag: &str) -> Option<FencedBlock> {
    let mut from = 0;
    while let Some(rel) = text[from..].find("```") {
        let open = from + rel;
        let info_start = open + 3;
        let line_end = text[info_start..]
            .find('\n')
            .map(|i| info_start + i)
            .unwrap_or(text.len());
        let body_start = (line_end + 1).min(text.len());
        let close = body_start + text[body_start..].find("```")?;

        if text[info_start..line_end].trim().eq_ignore_ascii_case(tag) {
            return Some(FencedBlock { open, body: body_start..close, end: close + 3 });
        }
        // Some other fenced block; skip over it.
        from = close + 3;
    }
    None
}

/// Drops `inline` fragments; an unmatched backtick is kept as is.
fn strip_inline_code(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find('`') {
        let Some(len) = rest[start + 1..].find('`') else { break };
        out.push_str(&rest[..start]);
        rest = &rest[start + len + 2..];
    }
    out.push_str(rest);
    out
}

#[async_trait]
pub trait HintSource: Send + Sync {
    /// Always yields a hint; failures produce [`Hint::fallback`].
    async fn fetch_hint(&self, task: &Task, code: &str, language: Language, actual: &str) -> Hint;
}

#[derive(Debug, Clone)]
pub struct HintFetcher {
    client: GenerateClient,
}

impl HintFetcher {
    pub fn new(client: GenerateClient) -> Self {
        Self { client }
    }

    pub fn from_config(cfg: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(GenerateClient::from_config(cfg)?))
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub async fn try_fetch(
        &self,
        task: &Task,
        code: &str,
        language: Language,
        actual: &str,
    ) -> Result<Hint, HintError> {
        let prompt = build_prompt(task, code, language, actual);
        let raw = self.client.generate(&prompt).await?;
        Ok(parse_hint(&raw, language.fence_tag()))
    }
}

#[async_trait]
impl HintSource for HintFetcher {
    async fn fetch_hint(&self, task: &Task, code: &str, language: Language, actual: &str) -> Hint {
        match self.try_fetch(task, code, language, actual).await {
            Ok(hint) => hint,
            Err(e) => {
                log::warn!("hint for task `{}` failed: {}", task.name, e);
                Hint::fallback()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_fragments_are_removed() {
        assert_eq!(strip_inline_code("use `x` and `y` here"), "use  and  here");
        assert_eq!(strip_inline_code("a lone ` stays"), "a lone ` stays");
    }

    #[test]
    fn other_fences_are_skipped() {
        let raw = "See:\n```text\nplain\n```\nthen\n```python\nprint(1)\n```\nend";
        let hint = parse_hint(raw, "python");
        assert_eq!(hint.code.as_deref(), Some("print(1)"));
        assert_eq!(hint.text_after, "end");
        assert!(hint.text_before.starts_with("See:"));
    }

    #[test]
    fn unterminated_fence_is_plain_prose() {
        let hint = parse_hint("Try this:\n```python\nprint(1)", "python");
        assert!(hint.code.is_none());
        assert_eq!(hint.text_before, "Try this:\n```python\nprint(1)");
    }

    #[test]
    fn prompt_mentions_everything_the_tutor_needs() {
        let task = Task {
            name: "sum".into(),
            description: "Print the sum of 2 and 3".into(),
            input: String::new(),
            expected_output: "5".into(),
        };
        let prompt = build_prompt(&task, "print(2 * 3)", Language::Python, "6");
        assert!(prompt.contains("Print the sum of 2 and 3"));
        assert!(prompt.contains("```python\nprint(2 * 3)\n```"));
        assert!(prompt.contains("Python"));
        assert!(prompt.contains("Actual output:\n6"));
        assert!(prompt.contains("Expected output:\n5"));
    }
}
