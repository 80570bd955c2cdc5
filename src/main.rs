//! shellrun CLI entry point
//!
//! Usage:
//!   shellrun exec <program> [args...]   Run a program and print its stdout
//!   shellrun sh <command>               Run a command string through the shell
//!   shellrun spawn <command>...         Run commands concurrently on the worker pool
//!   shellrun check                      Report host capabilities
//!   shellrun config                     Show configuration

use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use shellrun::cli::{
    commands::{CheckArgs, ConfigArgs, ConfigFormat, ExecArgs, OutputFormat, ShArgs, SpawnArgs},
    Cli, Commands,
};
use shellrun::config::{load_config, Config};
use shellrun::error::{ErrorInfo, ShellError};
use shellrun::executor::{AsyncShell, Runner};
use shellrun::logging::init_logging;
use shellrun::platform;

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.log_format) {
        eprintln!("{}: {:#}", "warning".yellow().bold(), e);
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {:#}", "error".red().bold(), e);
            if let Some(shell_err) = e.downcast_ref::<ShellError>() {
                if let Some(suggestion) = ErrorInfo::from(shell_err).suggestion {
                    eprintln!("{}: {}", "hint".cyan(), suggestion);
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mut config = load_config(cli.config.as_deref())?;
    if let Some(mode) = cli.mode {
        config.runner.mode = mode;
    }

    match cli.command {
        Commands::Exec(args) => exec_program(args, &config),
        Commands::Sh(args) => run_shell(args, &config),
        Commands::Spawn(args) => spawn_commands(args, config, cli.verbose),
        Commands::Check(args) => check_host(args, &config),
        Commands::Config(args) => show_config(args, &config),
    }
}

/// Run a program with arguments on this thread
fn exec_program(args: ExecArgs, config: &Config) -> Result<()> {
    let runner = Runner::from_config(config.runner.clone())?;
    let result = runner.run(&args.program, &args.args);
    print_output(result, args.trim)
}

/// Run a command string through the shell on this thread
fn run_shell(args: ShArgs, config: &Config) -> Result<()> {
    let runner = Runner::from_config(config.runner.clone())?;
    let result = runner.run_command(&args.command);
    print_output(result, args.trim)
}

fn print_output(result: Result<String, ShellError>, trim: bool) -> Result<()> {
    match result {
        Ok(output) => {
            print!("{}", maybe_trim(&output, trim));
            Ok(())
        }
        Err(e) => {
            // Whatever the child wrote is still useful when it failed
            if let ShellError::NonZeroExit { stdout, .. } = &e {
                print!("{}", maybe_trim(stdout, trim));
            }
            Err(e.into())
        }
    }
}

fn maybe_trim(output: &str, trim: bool) -> &str {
    if trim {
        output.trim_end_matches(['\n', '\r'])
    } else {
        output
    }
}

/// Run every command concurrently and print outputs as they complete
fn spawn_commands(args: SpawnArgs, mut config: Config, verbose: bool) -> Result<()> {
    if let Some(workers) = args.workers {
        config.pool.workers = workers;
    }

    let shell = AsyncShell::from_config(&config).context("Failed to start worker pool")?;
    let completed = Arc::new(Mutex::new(0usize));

    let handles: Vec<_> = args
        .commands
        .iter()
        .map(|command| {
            let completed = Arc::clone(&completed);
            let handle = shell.execute_command_with(command, move |output| {
                print!("{}", output);
                if let Ok(mut n) = completed.lock() {
                    *n += 1;
                }
            });
            (command.clone(), handle)
        })
        .collect();

    if verbose {
        eprintln!(
            "{}: {} command(s) submitted",
            "spawn".cyan(),
            handles.len()
        );
    }

    let mut errors: Vec<String> = Vec::new();
    for (command, handle) in handles {
        if let Err(e) = handle.wait() {
            // Failed commands get no callback, so their output surfaces here
            if let ShellError::NonZeroExit { stdout, .. } = &e {
                print!("{}", stdout);
            }
            errors.push(format!("{}: {}", command, e));
        }
    }

    shell.shutdown();

    if verbose {
        let done = completed.lock().map(|n| *n).unwrap_or(0);
        eprintln!("{}: {} command(s) completed", "spawn".green(), done);
    }

    if !errors.is_empty() {
        eprintln!("{}:", "Errors".red());
        for error in &errors {
            eprintln!("  - {}", error);
        }
        anyhow::bail!("{} command(s) failed", errors.len());
    }

    Ok(())
}

/// Report what the host offers
fn check_host(args: CheckArgs, config: &Config) -> Result<()> {
    let caps = platform::probe(&config.runner);

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&caps)?);
        }
        OutputFormat::Table => {
            let mark = |ok: bool| if ok { "yes".green() } else { "no".red() };

            println!("{}: {} ({})", "OS".cyan(), caps.os, mark(caps.supported));
            println!(
                "{}: {} ({})",
                "Env locator".cyan(),
                caps.env_locator.display(),
                mark(caps.env_locator_exists)
            );
            match &caps.shell_path {
                Some(path) => println!("{}: {} -> {}", "Shell".cyan(), caps.shell, path.display()),
                None => println!("{}: {} ({})", "Shell".cyan(), caps.shell, "not found".red()),
            }
        }
    }

    platform::ensure_supported()?;
    if !caps.ready() {
        anyhow::bail!("Host cannot run shell commands with the current configuration");
    }

    Ok(())
}

/// Show resolved configuration
fn show_config(args: ConfigArgs, config: &Config) -> Result<()> {
    match args.format {
        ConfigFormat::Toml => {
            print!(
                "{}",
                toml::to_string_pretty(config).context("Failed to render config")?
            );
        }
        ConfigFormat::Json => {
            println!("{}", serde_json::to_string_pretty(config)?);
        }
    }
    Ok(())
}
