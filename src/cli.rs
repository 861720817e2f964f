use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser};

#[derive(Parser, Debug, Clone)]
#[command(name = "lessonbox", about = "Run lesson code, check it against a task and ask for hints", version)]
#[command(group(ArgGroup::new("source").args(["file", "code", "show_draft"]).multiple(false)))]
#[command(group(ArgGroup::new("md_switch").args(["md", "no_md"]).multiple(false)))]
pub struct Cli {
    /// Language of the code (rhai, python). Defaults to DEFAULT_LANGUAGE.
    #[arg(short = 'l', long = "lang")]
    pub lang: Option<String>,

    /// Task JSON file: {"name", "description", "input", "expected_output"}.
    #[arg(short = 't', long)]
    pub task: Option<PathBuf>,

    /// Read the code from a file.
    #[arg(short = 'f', long)]
    pub file: Option<PathBuf>,

    /// Code given inline.
    #[arg(short = 'c', long)]
    pub code: Option<String>,

    /// Print the saved draft for the task and language, then exit.
    #[arg(long = "show-draft")]
    pub show_draft: bool,

    /// Never offer a hint on mismatch.
    #[arg(long = "no-hint")]
    pub no_hint: bool,

    /// Delay before a hint is offered, in milliseconds. Overrides HINT_DELAY_MS.
    #[arg(long = "hint-delay")]
    pub hint_delay: Option<u64>,

    /// Render hints as Markdown.
    #[arg(long)]
    pub md: bool,
    /// Print hints as plain text.
    #[arg(long = "no-md")]
    pub no_md: bool,

    /// List available languages.
    #[arg(long = "list-languages")]
    pub list_languages: bool,

    /// More logging (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
