// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! Interactive shell over a single loader instance.

use loom_loader::{LoadError, Loader};
use loom_script::Value;
use owo_colors::OwoColorize;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::Validator;
use rustyline::{Config, Editor, Helper};
use std::path::PathBuf;
use tokio::runtime::Handle;

const HISTORY_FILE: &str = "history";
const MAX_HISTORY_SIZE: usize = 1000;

/// Shell commands, written with a dot prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplCommand {
    Resolve,
    Source,
    Cache,
    Config,
    Help,
    Exit,
}

impl ReplCommand {
    /// Parse a command and its argument
    pub fn parse(input: &str) -> Option<(Self, Option<&str>)> {
        let input = input.trim().strip_prefix('.')?;

        let mut parts = input.splitn(2, char::is_whitespace);
        let cmd = parts.next()?.to_lowercase();
        let arg = parts.next().map(str::trim).filter(|a| !a.is_empty());

        match cmd.as_str() {
            "resolve" | "r" => Some((ReplCommand::Resolve, arg)),
            "source" | "s" => Some((ReplCommand::Source, arg)),
            "cache" | "c" => Some((ReplCommand::Cache, arg)),
            "config" => Some((ReplCommand::Config, arg)),
            "help" | "h" | "?" => Some((ReplCommand::Help, arg)),
            "exit" | "quit" | "q" => Some((ReplCommand::Exit, arg)),
            _ => None,
        }
    }

    /// All commands, for help and completion
    pub fn all_commands() -> &'static [(&'static str, &'static str)] {
        &[
            (".resolve <path>", "Load a module and print its value"),
            (".source <path>", "Print the transpiled factory of a module"),
            (".cache", "List compiled modules"),
            (".config", "Print the loader configuration"),
            (".help", "Show this help message"),
            (".exit", "Exit the shell"),
        ]
    }
}

/// Completes command names.
struct ShellHelper {
    commands: Vec<String>,
}

impl ShellHelper {
    fn new() -> Self {
        let commands = ReplCommand::all_commands()
            .iter()
            .filter_map(|(usage, _)| usage.split_whitespace().next())
            .map(String::from)
            .collect();
        Self { commands }
    }
}

impl Completer for ShellHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let word = &line[..pos];
        if !word.starts_with('.') || word.contains(char::is_whitespace) {
            return Ok((pos, vec![]));
        }

        let matches = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(word))
            .map(|cmd| Pair {
                display: cmd.clone(),
                replacement: cmd[word.len()..].to_string(),
            })
            .collect();

        Ok((pos, matches))
    }
}

impl Hinter for ShellHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<Self::Hint> {
        if pos < line.len() || line.len() < 2 || !line.starts_with('.') {
            return None;
        }
        self.commands
            .iter()
            .find(|cmd| cmd.starts_with(line) && cmd.len() > line.len())
            .map(|cmd| cmd[line.len()..].to_string().dimmed().to_string())
    }
}

impl Highlighter for ShellHelper {}

impl Validator for ShellHelper {}

impl Helper for ShellHelper {}

/// Result of executing a shell command
enum CommandResult {
    Continue,
    Exit,
}

/// The interactive shell
pub struct Repl {
    loader: Loader,
    runtime: Handle,
    editor: Editor<ShellHelper, DefaultHistory>,
    history_path: PathBuf,
}

impl Repl {
    /// Create a shell driving `loader` on `runtime`. Must not be called
    /// from an async context.
    pub fn new(loader: Loader, runtime: Handle) -> rustyline::Result<Self> {
        let config = Config::builder()
            .history_ignore_dups(true)?
            .history_ignore_space(true)
            .max_history_size(MAX_HISTORY_SIZE)?
            .auto_add_history(true)
            .build();

        let mut editor = Editor::with_config(config)?;
        editor.set_helper(Some(ShellHelper::new()));

        let history_path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("loom")
            .join(HISTORY_FILE);
        if let Some(parent) = history_path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let _ = editor.load_history(&history_path);

        Ok(Self {
            loader,
            runtime,
            editor,
            history_path,
        })
    }

    /// Run the main loop
    pub fn run(&mut self) -> rustyline::Result<()> {
        self.print_banner();

        loop {
            let prompt = format!("{} ", "loom>".bright_green().bold());

            match self.editor.readline(&prompt) {
                Ok(line) => {
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    match ReplCommand::parse(trimmed) {
                        Some((cmd, arg)) => {
                            if let CommandResult::Exit = self.execute_command(cmd, arg) {
                                break;
                            }
                        }
                        // Anything else is a module specifier.
                        None if !trimmed.starts_with('.') => self.resolve(trimmed),
                        None => {
                            eprintln!(
                                "{}: unknown command {} (try {})",
                                "Error".red().bold(),
                                trimmed.cyan(),
                                ".help".cyan()
                            );
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C".dimmed());
                    continue;
                }
                Err(ReadlineError::Eof) => break,
                Err(err) => {
                    eprintln!("{}: {:?}", "Error".red().bold(), err);
                    break;
                }
            }
        }

        let _ = self.editor.save_history(&self.history_path);
        Ok(())
    }

    fn print_banner(&self) {
        println!();
        println!(
            "  {} {}",
            "loom".bright_cyan().bold(),
            env!("CARGO_PKG_VERSION").bright_yellow()
        );
        println!(
            "  {} {} {}",
            "Type a module path to load it, or".dimmed(),
            ".help".cyan(),
            "for commands".dimmed()
        );
        println!();
    }

    fn execute_command(&mut self, cmd: ReplCommand, arg: Option<&str>) -> CommandResult {
        match cmd {
            ReplCommand::Resolve | ReplCommand::Source => match arg {
                Some(path) if cmd == ReplCommand::Resolve => self.resolve(path),
                Some(path) => self.source(path),
                None => eprintln!("{}: a module path is required", "Error".red().bold()),
            },
            ReplCommand::Cache => self.print_cache(),
            ReplCommand::Config => match toml::to_string_pretty(self.loader.config()) {
                Ok(text) => print!("{}", text),
                Err(e) => eprintln!("{}: {}", "Error".red().bold(), e),
            },
            ReplCommand::Help => print_help(),
            ReplCommand::Exit => return CommandResult::Exit,
        }
        CommandResult::Continue
    }

    fn resolve(&self, specifier: &str) {
        match self.runtime.block_on(self.loader.resolve(specifier)) {
            Ok(value) => println!("{}", format_value(&value)),
            Err(e) => print_error(&e),
        }
    }

    fn source(&self, specifier: &str) {
        match self.runtime.block_on(self.loader.source(specifier)) {
            Ok(source) => {
                for warning in &source.warnings {
                    eprintln!("{} {}", "warning:".yellow().bold(), warning);
                }
                println!("{}", source.wrapped(self.loader.config().error_policy));
            }
            Err(e) => print_error(&e),
        }
    }

    fn print_cache(&self) {
        let paths = self.loader.cache().paths();
        if paths.is_empty() {
            println!("{}", "(empty)".dimmed());
        }
        for path in paths {
            println!("  {}", path.to_string().cyan());
        }
    }
}

fn print_help() {
    println!();
    println!("{}", "Commands:".white().bold());
    println!();
    for (cmd, desc) in ReplCommand::all_commands() {
        println!("  {:18} {}", cmd.cyan(), desc.dimmed());
    }
    println!();
}

/// Colors a module value by type.
fn format_value(value: &Value) -> String {
    match value {
        Value::Undefined => "undefined".blue().dimmed().to_string(),
        Value::Null => "null".blue().to_string(),
        Value::Boolean(_) | Value::Number(_) => value.inspect().yellow().to_string(),
        Value::String(s) => format!("'{}'", s).green().to_string(),
        Value::Function(_) => value.inspect().magenta().to_string(),
        Value::Array(_) | Value::Object(_) => value.inspect(),
    }
}

fn print_error(error: &LoadError) {
    let text = error.to_string();
    match text.split_once(':') {
        Some((kind, message)) if !kind.contains(' ') => {
            eprintln!("{}:{}", kind.red().bold(), message)
        }
        _ => eprintln!("{}", text.red()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repl_command_parse() {
        assert!(matches!(
            ReplCommand::parse(".resolve /app/main.component"),
            Some((ReplCommand::Resolve, Some("/app/main.component")))
        ));
        assert!(matches!(ReplCommand::parse(".cache"), Some((ReplCommand::Cache, None))));
        assert!(matches!(ReplCommand::parse("  .q  "), Some((ReplCommand::Exit, None))));
        assert!(matches!(ReplCommand::parse(".s   x.js"), Some((ReplCommand::Source, Some("x.js")))));
        assert!(ReplCommand::parse(".nope").is_none());
        assert!(ReplCommand::parse("/app/main.component").is_none());
    }

    #[test]
    fn test_hint_completes_command() {
        let helper = ShellHelper::new();
        let history = DefaultHistory::new();
        let ctx = rustyline::Context::new(&history);
        let hint = helper.hint(".res", 4, &ctx).unwrap();
        assert!(hint.contains("olve"));
        assert!(helper.hint(".resolve", 8, &ctx).is_none());
        assert!(helper.hint("/app", 4, &ctx).is_none());
    }

    #[test]
    fn test_helper_lists_command_names() {
        let helper = ShellHelper::new();
        assert_eq!(
            helper.commands,
            vec![".resolve", ".source", ".cache", ".config", ".help", ".exit"]
        );
    }
}
