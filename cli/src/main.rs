mod highlighter;
mod validator;

use std::io::{BufRead, BufReader};
use std::path::PathBuf;

use adaptive_expressions::{Engine, EngineOptions, Options, SimpleObjectMemory, render_error};
use adaptive_expressions_core::{FunctionTable, lexer};
use clap::Parser;
use miette::{Diagnostic, Result};
use reedline::{
    DefaultCompleter, DefaultPrompt, DefaultPromptSegment, DescriptionMode, EditCommand, Emacs,
    IdeMenu, KeyCode, KeyModifiers, Keybindings, MenuBuilder, Reedline, ReedlineEvent,
    ReedlineMenu, Signal, default_emacs_keybindings,
};
use serde_json::Value;
use thiserror::Error;

use crate::highlighter::Highlighter;
use crate::validator::InputValidator;

/// Evaluate adaptive expressions against JSON state
#[derive(Parser, Debug)]
#[command(name = "adaptive-expressions")]
#[command(about = "Evaluate adaptive expressions", long_about = None)]
struct Args {
    /// JSON state the expression reads from and writes into
    #[arg(long, conflicts_with = "memory_file")]
    memory: Option<String>,

    /// File holding the JSON state
    #[arg(long)]
    memory_file: Option<PathBuf>,

    /// Locale for locale-aware builtins (e.g. "de-DE")
    #[arg(long)]
    locale: Option<String>,

    /// Maximum nesting of brackets and templates
    #[arg(long, default_value_t = EngineOptions::default().max_depth)]
    max_depth: usize,

    /// Print the tokens of each input
    #[arg(long)]
    tokens: bool,

    /// Print the parsed expression tree (for debugging)
    #[arg(long)]
    debug_parse: bool,

    /// Expression to evaluate (if not provided, reads from stdin)
    expression: Option<String>,
}

#[derive(Debug, Error, Diagnostic)]
enum CliError {
    #[error("could not read memory file {path}")]
    #[diagnostic(code(cli::memory_file))]
    ReadMemory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("memory is not valid JSON")]
    #[diagnostic(
        code(cli::memory_json),
        help("pass a JSON object, e.g. '{{\"user\": {{\"name\": \"Ada\"}}}}'")
    )]
    InvalidMemory(#[source] serde_json::Error),
}

fn load_memory(args: &Args) -> Result<Value, CliError> {
    let text = match (&args.memory, &args.memory_file) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => std::fs::read_to_string(path).map_err(|source| CliError::ReadMemory {
            path: path.clone(),
            source,
        })?,
        (None, None) => return Ok(Value::Object(Default::default())),
    };
    serde_json::from_str(&text).map_err(CliError::InvalidMemory)
}

fn add_menu_keybindings(keybindings: &mut Keybindings) {
    keybindings.add_binding(
        KeyModifiers::NONE,
        KeyCode::Tab,
        ReedlineEvent::UntilFound(vec![
            ReedlineEvent::Menu("completion_menu".to_string()),
            ReedlineEvent::MenuNext,
        ]),
    );
    keybindings.add_binding(
        KeyModifiers::ALT,
        KeyCode::Enter,
        ReedlineEvent::Edit(vec![EditCommand::InsertNewline]),
    );
}

fn setup_reedline() -> (Reedline, DefaultPrompt) {
    let mut builtins: Vec<String> = FunctionTable::global().names().map(str::to_string).collect();
    builtins.sort();

    let completer = Box::new({
        let mut completions = DefaultCompleter::with_inclusions(&['-', '_', '@', '#', '$']);
        completions.insert(builtins);
        completions
    });

    let ide_menu = IdeMenu::default()
        .with_name("completion_menu")
        .with_min_completion_width(0)
        .with_max_completion_width(50)
        .with_max_completion_height(u16::MAX)
        .with_padding(0)
        .with_cursor_offset(0)
        .with_description_mode(DescriptionMode::PreferRight)
        .with_min_description_width(0)
        .with_max_description_width(50)
        .with_description_offset(1)
        .with_correct_cursor_pos(false);

    let mut keybindings = default_emacs_keybindings();
    add_menu_keybindings(&mut keybindings);

    let line_editor = Reedline::create()
        .with_highlighter(Box::new(Highlighter))
        .with_validator(Box::new(InputValidator))
        .with_completer(completer)
        .with_menu(ReedlineMenu::EngineCompleter(Box::new(ide_menu)))
        .with_edit_mode(Box::new(Emacs::new(keybindings)));

    let prompt = DefaultPrompt::new(
        DefaultPromptSegment::Basic("expr".to_string()),
        DefaultPromptSegment::Empty,
    );

    (line_editor, prompt)
}

/// One input line against state that persists between lines.
struct Session {
    engine: Engine,
    options: Options,
    memory: SimpleObjectMemory<'static>,
    tokens: bool,
    debug_parse: bool,
}

impl Session {
    fn interpret_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        if self.tokens {
            println!("=== Tokens ===");
            match lexer::tokenize(input) {
                Ok(tokens) => {
                    for token in tokens {
                        println!(
                            "{:>4}..{:<4} {:<18} {:?}",
                            token.span.0.start,
                            token.span.0.end,
                            token.kind.to_string(),
                            token.text
                        );
                    }
                }
                Err(err) => println!("lexing stopped: {}", err),
            }
            println!();
        }

        let expression = match self.engine.compile(input) {
            Ok(expression) => expression,
            Err(err) => {
                render_error(&err);
                return;
            }
        };

        if self.debug_parse {
            println!("=== Parsed Expression ===");
            println!("{}", expression);
            println!("{:#?}", expression);
            println!("return type: {}", expression.return_type());
            println!();
        }

        match self.engine.run(&expression, &mut self.memory, &self.options) {
            Ok(value) => println!("{:#}", value),
            Err(err) => render_error(&err),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    use tracing_subscriber::{EnvFilter, fmt};

    // RUST_LOG controls the level; default to WARN if not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let memory = load_memory(&args)?;
    let engine_options = EngineOptions {
        max_depth: args.max_depth,
        default_locale: args.locale.clone(),
        ..EngineOptions::default()
    };
    let mut session = Session {
        options: engine_options.evaluation_options(),
        engine: Engine::new(engine_options),
        memory: SimpleObjectMemory::new(memory),
        tokens: args.tokens,
        debug_parse: args.debug_parse,
    };
    tracing::debug!(options = ?session.engine.options(), "session ready");

    if let Some(expr) = &args.expression {
        session.interpret_input(expr);
        return Ok(());
    }

    if atty::is(atty::Stream::Stdin) {
        let (mut line_editor, prompt) = setup_reedline();

        println!("Adaptive expressions REPL - state persists between lines (Ctrl+D or Ctrl+C to exit)");

        loop {
            let sig = match line_editor.read_line(&prompt) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Reedline error: {e}");
                    return Ok(());
                }
            };

            match sig {
                Signal::Success(buffer) => session.interpret_input(&buffer),
                Signal::CtrlD | Signal::CtrlC => {
                    println!("\nGoodbye!");
                    return Ok(());
                }
            }
        }
    } else {
        let stdin = std::io::stdin();
        let reader = BufReader::new(stdin.lock());

        for line in reader.lines() {
            let line = match line {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("Error reading line from stdin: {}", e);
                    return Ok(());
                }
            };
            session.interpret_input(&line);
        }
    }

    Ok(())
}
