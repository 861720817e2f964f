//! Printers: run output, status lines and hints (termimad).

use owo_colors::OwoColorize;
use termimad::MadSkin;

use crate::{execution::RunOutcome, hint::Hint};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Plain,
    Good,
    Bad,
    Info,
}

pub struct TextPrinter {
    pub tone: Tone,
}

impl TextPrinter {
    pub fn new(tone: Tone) -> Self {
        Self { tone }
    }

    pub fn print(&self, text: &str) {
        match self.tone {
            Tone::Good => println!("{}", text.green()),
            Tone::Bad => println!("{}", text.red()),
            Tone::Info => println!("{}", text.cyan()),
            Tone::Plain => println!("{}", text),
        }
    }
}

pub fn print_outcome(outcome: &RunOutcome) {
    let tone = if outcome.is_success() { Tone::Plain } else { Tone::Bad };
    TextPrinter::new(tone).print(&outcome.render());
}

pub fn print_verdict(matched: bool) {
    if matched {
        TextPrinter::new(Tone::Good).print("✔ Output matches the expected output.");
    } else {
        TextPrinter::new(Tone::Bad).print("✘ Output does not match the expected output.");
    }
}

pub struct MarkdownPrinter {
    pub skin: MadSkin,
}

impl Default for MarkdownPrinter {
    fn default() -> Self {
        Self { skin: MadSkin::default() }
    }
}

impl MarkdownPrinter {
    pub fn print(&self, text: &str) {
        self.skin.print_text(text);
        println!();
    }
}

pub fn hint_markdown(hint: &Hint, fence_tag: &str) -> String {
    let mut md = String::new();
    if !hint.text_before.is_empty() {
        md.push_str(&hint.text_before);
        md.push_str("\n\n");
    }
    if let Some(code) = &hint.code {
        md.push_str(&format!("```{}\n{}\n```\n\n", fence_tag, code));
    }
    if !hint.text_after.is_empty() {
        md.push_str(&hint.text_after);
        md.push('\n');
    }
    md
}

pub fn print_hint(hint: &Hint, fence_tag: &str, markdown: bool) {
    let text = hint_markdown(hint, fence_tag);
    if markdown {
        MarkdownPrinter::default().print(&text);
    } else {
        println!("{}", text.trim_end());
    }
}
