use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use libime_core::{DpadDirection, StyledPreedit};
use libkana::{
    create_ime_store, Candidate, CandidateProvider, CompositionMode, DecorationPolicy,
    EditorHost, ImeAction, ImeState, KanaCandidateProvider, KanaConfig, KanaStore,
    KeyboardAction,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "libkana")]
#[command(about = "Kana input method demo driving the libime-core composition engine")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive REPL driving a store against a terminal editor
    Interactive,
    /// Print the candidates offered for a text
    Convert {
        text: String,
        /// Number of candidates (defaults to the configured limit)
        #[arg(short = 'n', long)]
        count: Option<usize>,
    },
}

/// Editor that prints every host call to stdout.
#[derive(Default)]
struct TerminalHost {
    committed: String,
}

impl EditorHost for TerminalHost {
    fn commit_text(&mut self, text: &str) {
        self.committed.push_str(text);
        println!("  commit  {:?}  -> {:?}", text, self.committed);
    }

    fn set_composing_region(&mut self, preedit: &StyledPreedit) {
        println!("  preedit {}", render_preedit(preedit));
    }

    fn clear_composing(&mut self) {
        println!("  preedit (none)");
    }

    fn send_directional_key(&mut self, direction: DpadDirection, count: usize) {
        println!("  dpad    {:?} x{}", direction, count);
    }

    fn delete_one_character_or_selection(&mut self) {
        self.committed.pop();
        println!("  delete  -> {:?}", self.committed);
    }

    fn perform_default_or_newline_action(&mut self) {
        self.committed.push('\n');
        println!("  enter   -> {:?}", self.committed);
    }
}

/// `[bg]ul` with `|` at the caret.
fn render_preedit(preedit: &StyledPreedit) -> String {
    let mut out = String::new();
    for (i, c) in preedit.text.chars().enumerate() {
        if i == preedit.caret {
            out.push('|');
        }
        if i == preedit.bg.start && !preedit.bg.is_empty() {
            out.push('[');
        }
        out.push(c);
        if i + 1 == preedit.bg.end_exclusive && !preedit.bg.is_empty() {
            out.push(']');
        }
    }
    if preedit.caret >= preedit.len() {
        out.push('|');
    }
    out
}

fn configure_logging() {
    // RUST_LOG=ime.store=debug,ime.effect=trace
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<KanaConfig> {
    match path {
        Some(path) => {
            let config = KanaConfig::load_toml(path)?;
            info!(target: "kana", path = %path.display(), "config_loaded");
            Ok(config)
        }
        None => Ok(KanaConfig::default()),
    }
}

enum Command {
    Key(KeyboardAction),
    Pick(usize),
    State,
    Help,
    Quit,
}

fn parse_command(line: &str) -> Option<Command> {
    let Some(rest) = line.strip_prefix(':') else {
        return Some(Command::Key(KeyboardAction::input(line)));
    };
    let mut parts = rest.split_whitespace();
    let name = parts.next()?;
    let count: i32 = parts.next().and_then(|n| n.parse().ok()).unwrap_or(1);
    let command = match name {
        "space" | "s" => Command::Key(KeyboardAction::Space),
        "bs" | "b" => Command::Key(KeyboardAction::Backspace),
        "enter" | "e" => Command::Key(KeyboardAction::Enter),
        "left" | "h" => Command::Key(KeyboardAction::move_horizontal(-count)),
        "right" | "l" => Command::Key(KeyboardAction::move_horizontal(count)),
        "up" | "k" => Command::Key(KeyboardAction::MoveCursor { dx: 0, dy: -count }),
        "down" | "j" => Command::Key(KeyboardAction::MoveCursor { dx: 0, dy: count }),
        "direct" => Command::Key(KeyboardAction::SetCompositionMode(CompositionMode::Direct)),
        "pre" => Command::Key(KeyboardAction::SetCompositionMode(
            CompositionMode::Precomposition,
        )),
        "split" => Command::Key(KeyboardAction::SetPreeditDecor(DecorationPolicy::SplitAtCursor)),
        "char" => Command::Key(KeyboardAction::SetPreeditDecor(DecorationPolicy::CursorChar)),
        "pick" | "p" => Command::Pick(count.max(1) as usize - 1),
        "state" => Command::State,
        "help" | "?" => Command::Help,
        "quit" | "q" => Command::Quit,
        _ => return None,
    };
    Some(command)
}

fn print_help() {
    println!("Type text to compose it. Commands:");
    println!("  :space :bs :enter        keys (also :s :b :e)");
    println!("  :left N :right N         move the split cursor (also :h :l)");
    println!("  :up N :down N            vertical moves (also :k :j)");
    println!("  :pick N                  commit candidate N (1-based)");
    println!("  :direct :pre             switch composition mode");
    println!("  :split :char             switch preedit decoration");
    println!("  :state                   print the state as JSON");
    println!("  :quit");
}

fn print_candidates(state: &ImeState) {
    let Some(p) = state.as_precomposition() else {
        println!("  [direct]");
        return;
    };
    let ui = &p.candidate_ui;
    if ui.is_loading {
        println!("  candidates: (loading {})", ui.request_key);
    } else if ui.candidates.is_empty() {
        println!("  candidates: -");
    } else {
        let list: Vec<String> = ui
            .candidates
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let marker = if ui.selected_index == Some(i) { "*" } else { "" };
                format!("{}{}.{}", marker, i + 1, c.surface)
            })
            .collect();
        println!("  candidates: {}", list.join("  "));
    }
}

fn run_interactive(config: KanaConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("start tokio runtime")?;
    let mut store: KanaStore<TerminalHost> =
        create_ime_store(&config, TerminalHost::default(), runtime.handle().clone());

    println!("libkana interactive. Type text, :help for commands, Ctrl-D to exit.");
    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line.context("read stdin")?;
        let input = line.trim_end_matches(['\r', '\n']);
        if input.is_empty() {
            continue;
        }
        match parse_command(input) {
            Some(Command::Key(action)) => store.dispatch_ui(action),
            Some(Command::Pick(index)) => {
                let chosen = store
                    .state()
                    .as_precomposition()
                    .and_then(|p| p.candidate_ui.candidates.get(index).cloned());
                match chosen {
                    Some(candidate) => store.dispatch(ImeAction::CandidateChosen(candidate)),
                    None => println!("  no candidate {}", index + 1),
                }
            }
            Some(Command::State) => {
                println!("{}", serde_json::to_string_pretty(store.state())?);
                continue;
            }
            Some(Command::Help) => {
                print_help();
                continue;
            }
            Some(Command::Quit) => break,
            None => {
                println!("  unknown command {:?}", input);
                continue;
            }
        }
        runtime.block_on(store.wait_for_candidates());
        print_candidates(store.state());
        io::stdout().flush()?;
    }

    store.dispose();
    Ok(())
}

fn run_convert(config: &KanaConfig, text: &str, count: Option<usize>) -> Result<()> {
    let provider = KanaCandidateProvider::from_config(config);
    let limit = count.unwrap_or(config.base().candidate_limit);
    let candidates: Vec<Candidate> = provider.suggest(text, limit)?;
    if candidates.is_empty() {
        println!("(no candidates)");
    }
    for (i, c) in candidates.iter().enumerate() {
        println!("{}. {}", i + 1, c.surface);
    }
    Ok(())
}

fn main() -> Result<()> {
    configure_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Some(Commands::Convert { text, count }) => run_convert(&config, &text, count),
        Some(Commands::Interactive) | None => run_interactive(config),
    }
}
