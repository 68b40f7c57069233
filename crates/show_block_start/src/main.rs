// crates/show_block_start/src/main.rs

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Arg, Command};
use log::debug;

use block_resolver::{Language, Position, Selection, SourceBuffer};
use scope_tokenizer::GrammarRegistry;
use show_block_start::{
    run_command_with, BlockCommand, CommandOutcome, Editor, EditorView, HighlightConfig,
    HighlightSession, TerminalHighlighter, TerminalNotifier,
};

fn cli() -> Command {
    Command::new("show_block_start")
        .version("0.1.0")
        .about("Shows the line that opens the Ruby block or Python scope around a position")
        .arg(
            Arg::new("file")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf))
                .help("Source file to scan"),
        )
        .arg(
            Arg::new("line")
                .long("line")
                .required(true)
                .value_parser(clap::value_parser!(u64).range(1..))
                .help("Cursor line, starting at 1"),
        )
        .arg(
            Arg::new("column")
                .long("column")
                .required(true)
                .value_parser(clap::value_parser!(u64).range(1..))
                .help("Cursor column, starting at 1"),
        )
        .arg(
            Arg::new("end_line")
                .long("end-line")
                .value_parser(clap::value_parser!(u64).range(1..))
                .help("Selection end line (defaults to --line)"),
        )
        .arg(
            Arg::new("end_column")
                .long("end-column")
                .value_parser(clap::value_parser!(u64).range(1..))
                .help("Selection end column (defaults to --column)"),
        )
        .arg(
            Arg::new("language")
                .long("language")
                .value_parser(["ruby", "python"])
                .help("Override the language inferred from the file extension"),
        )
        .arg(
            Arg::new("color")
                .long("color")
                .help("Highlight color as #RRGGBB (also BLOCK_HIGHLIGHT_COLOR)"),
        )
        .arg(
            Arg::new("grammar_dir")
                .long("grammar-dir")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Load ruby.sublime-syntax / python.sublime-syntax from this directory"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
}

fn detect_language(file: &Path, requested: Option<&String>) -> Result<Language> {
    match requested.map(String::as_str) {
        Some("ruby") => Ok(Language::Ruby),
        Some("python") => Ok(Language::Python),
        Some(other) => bail!("Unsupported language: {other}"),
        None => file
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Language::for_extension)
            .with_context(|| {
                format!("Cannot infer the language of {}; pass --language", file.display())
            }),
    }
}

/// One-based CLI number to a zero-based index.
fn index(value: u64) -> usize {
    value.saturating_sub(1) as usize
}

fn main() -> Result<()> {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    let file = matches
        .get_one::<PathBuf>("file")
        .context("Missing source file")?;
    let language = detect_language(file, matches.get_one::<String>("language"))?;
    let source = fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let line = matches.get_one::<u64>("line").copied().map(index).unwrap_or_default();
    let column = matches.get_one::<u64>("column").copied().map(index).unwrap_or_default();
    let end_line = matches.get_one::<u64>("end_line").copied().map_or(line, index);
    let end_column = matches.get_one::<u64>("end_column").copied().map_or(column, index);

    let config = HighlightConfig::from_args(matches.get_one::<String>("color").map(String::as_str));
    debug!("{} as {language}, highlight color {}", file.display(), config.color);

    let editor = EditorView::new(
        SourceBuffer::from_source(&source),
        Selection::new(Position::new(line, column), Position::new(end_line, end_column)),
    );
    let line_count = editor.buffer().line_count();
    if line >= line_count {
        bail!(
            "Line {} is past the end of {} ({line_count} lines)",
            line + 1,
            file.display()
        );
    }

    let mut session = HighlightSession::new();
    let mut sink = TerminalHighlighter::new(io::stdout(), editor.buffer());
    let mut notifier = TerminalNotifier::new(io::stdout());
    let command = BlockCommand::for_language(language);

    let from_dir;
    let registry = match matches.get_one::<PathBuf>("grammar_dir") {
        Some(dir) => {
            from_dir = GrammarRegistry::from_dir(dir);
            &from_dir
        }
        None => GrammarRegistry::global(),
    };

    let outcome =
        run_command_with(registry, command, &editor, &mut session, &mut sink, &mut notifier, &config);
    match outcome {
        CommandOutcome::Highlighted(start) => debug!("matched line {}", start.line + 1),
        CommandOutcome::NoMatch => println!("No enclosing block found"),
        CommandOutcome::GrammarUnavailable => eprintln!("The {language} grammar is unavailable"),
        CommandOutcome::Notice(_) | CommandOutcome::AlreadyHighlighted => {}
    }

    session.on_selection_changed(&mut sink);
    Ok(())
}
