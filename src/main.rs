//! magefilehub CLI entry point
//!
//! Usage:
//!   magefilehub run <target> [args...]   Run a target through mage or go run
//!   magefilehub list                     List discovered targets
//!   magefilehub search <query>           Search targets
//!   magefilehub locate                   Show the magefile location
//!   magefilehub config                   Show configuration
//!   magefilehub init                     Create a starter magefile.go

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, EnvFilter};

use magefilehub::cli::{
    commands::{ConfigArgs, ListArgs, LocateArgs, OutputFormat, RunArgs, SearchArgs},
    write_starter, Cli, Commands,
};
use magefilehub::config::{find_config_files, load_config, Config};
use magefilehub::error::{DelegateError, ErrorInfo};
use magefilehub::executor::Delegator;
use magefilehub::runner::{CommandDiscovery, DiscoveredCommand, ScriptLocation, ScriptLocator};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

/// Install the stderr subscriber; `RUST_LOG` wins over `--verbose`
fn init_logging(verbose: bool) {
    let default = if verbose { "magefilehub=debug" } else { "magefilehub=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Top-level context shared by all subcommands
struct App {
    config: Config,
    locator: ScriptLocator,
    discovery: CommandDiscovery,
    verbose: bool,
}

impl App {
    fn new(cli: &Cli) -> Result<Self> {
        let root = cli.dir.clone().unwrap_or_else(|| PathBuf::from("."));
        if !root.is_dir() {
            anyhow::bail!("Project directory '{}' not found", root.display());
        }
        let config = load_config(&root, cli.config.as_deref())?;
        let locator = ScriptLocator::from_config(root, &config.discovery);
        let discovery = CommandDiscovery::new(locator.clone());

        Ok(Self {
            config,
            locator,
            discovery,
            verbose: cli.verbose,
        })
    }
}

/// Returns the process exit code
async fn run(cli: Cli) -> Result<u8> {
    let app = App::new(&cli)?;

    match cli.command {
        Commands::Run(args) => return run_target(&app, args).await,
        Commands::List(args) => list_targets(&app, args)?,
        Commands::Search(args) => search_targets(&app, args)?,
        Commands::Locate(args) => locate(&app, args)?,
        Commands::Config(args) => show_config(&app, args)?,
        Commands::Init => init_magefile(&app)?,
    }

    Ok(0)
}

/// Delegate a target and mirror its exit code
async fn run_target(app: &App, args: RunArgs) -> Result<u8> {
    if !app.locator.has_script() {
        let err = DelegateError::CommandNotFound {
            command: args.target.clone(),
        };
        report_failure(&err);
        return Ok(exit_code_byte(err.exit_code()));
    }

    let mut delegator = Delegator::from_config(app.locator.clone(), &app.config.delegate);
    if let Some(secs) = args.timeout {
        delegator = delegator.with_timeout(Duration::from_secs(secs));
    }

    if app.verbose {
        let runner = delegator
            .select_runner()
            .map(|r| r.to_string())
            .unwrap_or_else(|e| e.to_string());
        eprintln!(
            "{}: {} in {}",
            "runner".cyan(),
            runner,
            app.locator.root().display()
        );
    }

    let result = delegator.run(&args.target, &args.args, &app.discovery).await;

    match result.error() {
        None => {
            if app.verbose {
                eprintln!("{}: {}", "success".green(), args.target);
            }
        }
        Some(err) => report_failure(err),
    }

    Ok(exit_code_byte(result.exit_code()))
}

fn report_failure(err: &DelegateError) {
    let info = ErrorInfo::from(err);
    eprintln!("{}: {}", "error".red().bold(), info.message);
    if let Some(suggestion) = info.suggestion {
        eprintln!("{}: {}", "hint".yellow(), suggestion);
    }
}

/// Clamp to the range a process can report
fn exit_code_byte(code: i32) -> u8 {
    u8::try_from(code).unwrap_or(1)
}

/// List discovered targets
fn list_targets(app: &App, args: ListArgs) -> Result<()> {
    let catalog = app
        .discovery
        .discover()
        .context("Failed to discover targets")?;

    let namespace = args.namespace.as_deref().map(str::to_lowercase);

    if args.grouped && !matches!(args.format, OutputFormat::Plain) {
        let mut groups = catalog.by_namespace();
        if let Some(ns) = &namespace {
            groups.retain(|group, _| group == ns);
        }
        return print_grouped(app, &groups, &args.format);
    }

    let selected: Vec<&DiscoveredCommand> = catalog
        .commands()
        .iter()
        .filter(|c| match &namespace {
            Some(ns) => c.namespace().map(str::to_lowercase).as_deref() == Some(ns.as_str()),
            None => true,
        })
        .collect();

    print_commands(app, &selected, &args.format)
}

/// Targets under one heading per namespace; top-level functions come first
fn print_grouped(
    app: &App,
    groups: &BTreeMap<String, Vec<&DiscoveredCommand>>,
    format: &OutputFormat,
) -> Result<()> {
    if let OutputFormat::Json = format {
        let json = serde_json::to_string_pretty(&serde_json::json!({
            "location": app.locator.resolve(),
            "namespaces": groups
        }))?;
        println!("{}", json);
        return Ok(());
    }

    println!("{}: {}", "Magefile".cyan(), app.locator.resolve());
    if groups.is_empty() {
        println!();
        println!("No targets found.");
        return Ok(());
    }

    for (namespace, commands) in groups {
        println!();
        if namespace.is_empty() {
            println!("{}", "Targets:".bold());
        } else {
            println!("{}", format!("{}:", namespace).bold());
        }
        for command in commands {
            if command.description.is_empty() {
                println!("  {}", command.display_name().green());
            } else {
                println!("  {}  - {}", command.display_name().green(), command.description);
            }
        }
    }

    Ok(())
}

/// Search targets by name or description
fn search_targets(app: &App, args: SearchArgs) -> Result<()> {
    let matches = app
        .discovery
        .search(&args.query)
        .context("Failed to discover targets")?;

    if matches.is_empty() && matches!(args.format, OutputFormat::Table) {
        let suggestions = app
            .discovery
            .suggest(&args.query)
            .context("Failed to discover targets")?;
        print_suggestions(&args.query, &suggestions);
        return Ok(());
    }

    print_commands(app, &matches, &args.format)
}

fn print_suggestions(query: &str, suggestions: &[&DiscoveredCommand]) {
    println!("No targets found matching '{}'", query);
    if suggestions.is_empty() {
        return;
    }

    println!();
    println!("{}", "Did you mean:".yellow());
    for command in suggestions {
        if command.description.is_empty() {
            println!("  {}", command.display_name().green());
        } else {
            println!("  {} - {}", command.display_name().green(), command.description);
        }
    }
}

fn print_commands(app: &App, commands: &[&DiscoveredCommand], format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "location": app.locator.resolve(),
                "commands": commands
            }))?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            for command in commands {
                println!("{}", command.display_name());
            }
        }
        OutputFormat::Table => {
            println!("{}: {}", "Magefile".cyan(), app.locator.resolve());
            println!();
            if commands.is_empty() {
                println!("No targets found.");
                return Ok(());
            }

            let width = commands
                .iter()
                .map(|c| c.display_name().len())
                .max()
                .unwrap_or(10);

            for command in commands {
                let desc = if command.description.is_empty() {
                    String::new()
                } else {
                    format!("- {}", command.description)
                };
                println!(
                    "  {:width$}  {}",
                    command.display_name().green(),
                    desc,
                    width = width
                );
            }
        }
    }

    Ok(())
}

/// Show where the magefile lives
fn locate(app: &App, args: LocateArgs) -> Result<()> {
    let location = app.locator.resolve();
    let path = app.locator.display_path();

    match args.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "location": location,
                "path": path,
                "conflict": location.has_conflict()
            }))?;
            println!("{}", json);
        }
        OutputFormat::Plain => {
            if let Some(path) = path {
                println!("{}", path.display());
            }
        }
        OutputFormat::Table => {
            let kind = match &location {
                ScriptLocation::None => "none".yellow(),
                ScriptLocation::Directory { .. } => "directory".green(),
                ScriptLocation::SingleFile(_) => "file".green(),
            };
            println!("{}: {}", "Location".cyan(), kind);
            if let Some(path) = path {
                println!("{}: {}", "Path".cyan(), path.display());
            }
            if let ScriptLocation::Directory {
                conflicting_file: Some(file),
                ..
            } = &location
            {
                println!(
                    "{}: {} is set aside while targets run",
                    "Conflict".yellow(),
                    file.display()
                );
            }
        }
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(app: &App, args: ConfigArgs) -> Result<()> {
    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&app.config)?);
        }
        OutputFormat::Plain => {
            print!("{}", toml::to_string_pretty(&app.config)?);
        }
        OutputFormat::Table => {
            println!("{}:", "Config Files".cyan());
            let files = find_config_files(app.locator.root());
            if files.is_empty() {
                println!("  None (using defaults)");
            }
            for file in &files {
                println!("  - {}", file.display());
            }
            println!();
            print!("{}", toml::to_string_pretty(&app.config)?);
        }
    }

    Ok(())
}

/// Create a starter magefile.go
fn init_magefile(app: &App) -> Result<()> {
    let path = write_starter(app.locator.root(), app.locator.file_name())
        .with_context(|| format!("Failed to create {}", app.locator.file_name()))?;

    println!("{}: {}", "Created".green(), path.display());
    println!("  Run 'magefilehub list' to see its targets");
    Ok(())
}
