mod cli;

use std::{
    fs,
    io::{self, Read, Write},
    sync::Arc,
    time::Duration,
};

use anyhow::{anyhow, bail, Context, Result};
use is_terminal::IsTerminal;
use log::LevelFilter;

use lessonbox::{
    config::Config,
    execution::RunOutcome,
    hint::HintFetcher,
    printer::{self, TextPrinter, Tone},
    runtime::{Language, RuntimeRegistry},
    session::LessonSession,
    store::{FileStore, KeyValueStore},
    task::Task,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_logging(args.verbose);

    let cfg = Config::load();
    let registry = Arc::new(RuntimeRegistry::from_config(&cfg));

    if args.list_languages {
        for lang in registry.languages() {
            let kind = if lang.is_native() { "built-in" } else { "loaded on first use" };
            println!("{} ({})", lang.id(), kind);
        }
        return Ok(());
    }

    let language: Language = match args.lang.as_deref() {
        Some(l) => l.parse()?,
        None => cfg.default_language(),
    };
    let task = args.task.as_deref().map(Task::load).transpose()?;
    let markdown = if args.no_md {
        false
    } else if args.md {
        true
    } else {
        cfg.get_bool("PRETTIFY_MARKDOWN")
    };
    let hint_delay = args
        .hint_delay
        .map(Duration::from_millis)
        .unwrap_or_else(|| cfg.hint_delay());

    let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::from_config(&cfg)?);
    let hints = Arc::new(HintFetcher::from_config(&cfg)?);
    log::debug!("hints come from model {}", hints.model());
    let mut session = LessonSession::new(registry, hints, language)
        .with_store(store)
        .with_hint_delay(hint_delay);
    if let Some(task) = task {
        session = session.with_task(task);
    }

    if args.show_draft {
        match session.load_draft() {
            Some(draft) => println!("{}", draft),
            None => bail!("no saved draft for this task and language"),
        }
        return Ok(());
    }

    // Source: --code, --file, piped stdin, then the saved draft.
    let stdin_is_tty = io::stdin().is_terminal();
    let source = if let Some(code) = args.code.clone() {
        code
    } else if let Some(path) = &args.file {
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?
    } else if !stdin_is_tty {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf)?;
        buf
    } else {
        session
            .load_draft()
            .ok_or_else(|| anyhow!("no code given: use --code, --file, or pipe it on stdin"))?
    };

    if let Some(task) = session.task() {
        TextPrinter::new(Tone::Info).print(&format!("▶ {} ({})", task.name, language));
    }
    let outcome = session.run(&source).await;
    printer::print_outcome(&outcome);

    let Some(matched) = session.output_matches() else {
        return exit_status(&outcome);
    };
    printer::print_verdict(matched);
    if matched || args.no_hint {
        return Ok(());
    }
    if !stdin_is_tty {
        log::info!("stdin is not a terminal; skipping the hint offer");
        return Ok(());
    }

    if session.wait_for_hint_offer().await {
        print!("Want a hint? [Y]es, [N]o: ");
        io::stdout().flush().ok();
        let mut choice = String::new();
        io::stdin().read_line(&mut choice)?;
        match choice.trim().to_lowercase().as_str() {
            "y" | "yes" | "" => {
                TextPrinter::new(Tone::Info).print("Asking for a hint...");
                if let Some(hint) = session.request_hint().await {
                    printer::print_hint(&hint, language.fence_tag(), markdown);
                }
                session.dismiss_hint();
            }
            _ => session.decline_hint(),
        }
    }
    Ok(())
}

fn exit_status(outcome: &RunOutcome) -> Result<()> {
    match outcome {
        RunOutcome::Unavailable(reason) => bail!("{}", reason),
        _ => Ok(()),
    }
}

fn init_logging(verbose: u8) {
    let mut builder = env_logger::Builder::from_default_env();
    match verbose {
        0 => {}
        1 => {
            builder.filter_level(LevelFilter::Info);
        }
        2 => {
            builder.filter_level(LevelFilter::Debug);
        }
        _ => {
            builder.filter_level(LevelFilter::Trace);
        }
    }
    builder.init();
}
