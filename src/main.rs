// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.
//
// Copyright (c) 2025 Pegasus Heavy Industries, LLC

//! loom - load single-file components from the command line
//!
//! ## Commands
//!
//! - `run`: load entries and print each module's value
//! - `transpile`: print the factory generated for a component or script
//! - `normalize`: print the canonical path of a specifier
//! - `shell`: interactive session over one loader

mod repl;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use loom_loader::{
    extract, normalize, CollectingReporter, Container, ErrorPolicy, Fetcher, FsFetcher,
    HtmlFragmentParser, HttpFetcher, Loader, LoaderConfig, ModuleKind, ModulePath, Transpiler,
};
use owo_colors::OwoColorize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// loom - a runtime loader for single-file components
#[derive(Parser, Debug)]
#[command(name = "loom")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./loom.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Load entries and print the resulting modules
    Run(RunArgs),

    /// Print the factory source generated for a file
    Transpile(TranspileArgs),

    /// Print the canonical path of a specifier
    Normalize(NormalizeArgs),

    /// Start an interactive shell
    #[command(alias = "repl")]
    Shell(ShellArgs),
}

/// Where documents come from.
#[derive(Args, Debug, Clone, Default)]
struct SourceArgs {
    /// Serve documents from this directory (default: current directory)
    #[arg(long, value_name = "DIR", conflicts_with = "base_url")]
    root: Option<PathBuf>,

    /// Fetch documents over HTTP relative to this URL
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Entry modules
    #[arg(required = true, value_name = "ENTRY")]
    entries: Vec<String>,

    #[command(flatten)]
    source: SourceArgs,

    /// Allow cached responses
    #[arg(long)]
    cache: bool,

    /// Fail the load when a module throws instead of resolving it to undefined
    #[arg(long)]
    propagate: bool,

    /// Pre-register a module: NAME=JSON
    #[arg(long, value_name = "NAME=JSON")]
    provide: Vec<String>,
}

#[derive(Args, Debug)]
struct TranspileArgs {
    /// Component or script file
    file: PathBuf,

    /// Module path the file is served under (default: /<file name>)
    #[arg(long = "as", value_name = "PATH")]
    as_path: Option<String>,
}

#[derive(Args, Debug)]
struct NormalizeArgs {
    /// Import specifier
    spec: String,

    /// Module the specifier is written in (default: page root)
    #[arg(long, value_name = "PATH")]
    from: Option<String>,
}

#[derive(Args, Debug)]
struct ShellArgs {
    #[command(flatten)]
    source: SourceArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = LoaderConfig::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Run(args) => run(args, config).await,
        Commands::Transpile(args) => transpile(args, &config).await,
        Commands::Normalize(args) => {
            println!("{}", canonical(&args.spec, args.from.as_deref(), &config));
            Ok(ExitCode::SUCCESS)
        }
        Commands::Shell(args) => {
            let loader = Loader::builder(fetcher(&args.source)?).config(config).build()?;
            let handle = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || -> anyhow::Result<()> {
                let mut shell = repl::Repl::new(loader, handle)?;
                shell.run()?;
                Ok(())
            })
            .await??;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// `RUST_LOG`, then `LOOM_LOG`, then `loom=info` (`debug` with `--verbose`).
fn init_tracing(verbose: bool) {
    let default = if verbose {
        "loom=debug,loom_loader=debug,loom_script=debug"
    } else {
        "loom=info,loom_loader=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("LOOM_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn fetcher(source: &SourceArgs) -> anyhow::Result<Arc<dyn Fetcher>> {
    if let Some(base_url) = &source.base_url {
        return Ok(Arc::new(HttpFetcher::new(base_url)?));
    }
    let root = match &source.root {
        Some(root) => root.clone(),
        None => std::env::current_dir().context("Cannot determine the current directory")?,
    };
    Ok(Arc::new(FsFetcher::new(root)))
}

/// Parses a `--provide NAME=JSON` argument.
fn parse_provide(arg: &str) -> anyhow::Result<(String, serde_json::Value)> {
    let Some((name, json)) = arg.split_once('=') else {
        bail!("expected NAME=JSON, got '{}'", arg);
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("missing module name in '{}'", arg);
    }
    let value = serde_json::from_str(json).with_context(|| format!("invalid JSON for '{}'", name))?;
    Ok((name.to_string(), value))
}

fn canonical(spec: &str, from: Option<&str>, config: &LoaderConfig) -> ModulePath {
    let dir = from.map(|from| ModulePath::new(from).dir_stack()).unwrap_or_default();
    normalize(spec, &dir, config.path_style).with_default_extension(&config.default_extension)
}

async fn run(args: RunArgs, mut config: LoaderConfig) -> anyhow::Result<ExitCode> {
    if args.cache {
        config.cache_enabled = true;
    }
    if args.propagate {
        config.error_policy = ErrorPolicy::Propagate;
    }

    let mut container = Container::new();
    for provide in &args.provide {
        let (name, value) = parse_provide(provide)?;
        container.insert_json(name, &value);
    }

    let reporter = Arc::new(CollectingReporter::new());
    let loader = Loader::builder(fetcher(&args.source)?)
        .config(config)
        .container(container)
        .reporter(reporter.clone())
        .build()?;

    let mut failed = false;
    for (path, result) in loader.load_all(&args.entries).await {
        match result {
            Ok(value) => {
                println!("{} {}", "✓".green().bold(), path.to_string().cyan());
                println!("  {}", value.inspect());
                if path.kind(&loader.config().component_extensions) == ModuleKind::Component {
                    let has_template = value
                        .as_object()
                        .and_then(|object| object.get("template"))
                        .is_some_and(|template| !template.is_nullish());
                    let label = if has_template { "yes" } else { "no" };
                    println!("  {} {}", "template:".dimmed(), label);
                }
            }
            Err(e) => {
                failed = true;
                println!("{} {}", "✗".red().bold(), path.to_string().cyan());
                println!("  {}", e.to_string().red());
            }
        }
    }

    let reports = reporter.take();
    if !reports.is_empty() {
        eprintln!();
        eprintln!("{}", "Reported errors:".yellow().bold());
        for report in reports {
            eprintln!("  {}", report);
        }
    }

    Ok(if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

async fn transpile(args: TranspileArgs, config: &LoaderConfig) -> anyhow::Result<ExitCode> {
    let text = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Cannot read {}", args.file.display()))?;

    let served_as = match args.as_path {
        Some(path) => path,
        None => {
            let name = args
                .file
                .file_name()
                .context("expected a file, not a directory")?;
            format!("/{}", name.to_string_lossy())
        }
    };
    let path = canonical(&served_as, None, config);
    let kind = path.kind(&config.component_extensions);
    let fragments = extract(&HtmlFragmentParser, kind, &text);

    let transpiler = Transpiler::new(config.path_style, config.default_extension.clone());
    let source = transpiler.transpile(&path, &fragments.script)?;

    for warning in &source.warnings {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }
    for import in &source.imports {
        eprintln!("{} {} -> {}", "import".dimmed(), import.specifier, import.path.to_string().cyan());
    }
    println!("{}", source.wrapped(config.error_policy));
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_loader::PathStyle;

    #[test]
    fn test_parse_provide() {
        let (name, value) = parse_provide("Counter={\"name\":\"counter\"}").unwrap();
        assert_eq!(name, "Counter");
        assert_eq!(value, serde_json::json!({ "name": "counter" }));

        assert!(parse_provide("Counter").is_err());
        assert!(parse_provide("=1").is_err());
        assert!(parse_provide("Counter={").is_err());
    }

    #[test]
    fn test_canonical() {
        let config = LoaderConfig::default();
        assert_eq!(
            canonical("../shared/util", Some("/app/main.component"), &config).as_str(),
            "/shared/util.js"
        );
        assert_eq!(canonical("app/main.component", None, &config).as_str(), "/app/main.component");
        assert_eq!(canonical("Counter", None, &config).as_str(), "Counter");

        let relative = LoaderConfig {
            path_style: PathStyle::Relative,
            ..Default::default()
        };
        assert_eq!(canonical("/app/x", None, &relative).as_str(), "./app/x.js");
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "loom",
            "run",
            "/app/main.component",
            "--root",
            "site",
            "--provide",
            "Counter={}",
            "--propagate",
        ])
        .unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.entries, vec!["/app/main.component"]);
                assert_eq!(args.source.root, Some(PathBuf::from("site")));
                assert!(args.propagate);
                assert!(!args.cache);
            }
            other => panic!("unexpected command {:?}", other),
        }

        assert!(Cli::try_parse_from(["loom", "run", "a", "--root", "x", "--base-url", "http://h/"]).is_err());
        assert!(Cli::try_parse_from(["loom", "run"]).is_err());
    }
}
