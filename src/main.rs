mod blob;
mod cli;
mod config;
mod host;
mod progress;
mod provision;
mod steps;
#[cfg(test)]
mod testing;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use config::ProvisionConfig;
use host::SystemHost;
use progress::StepProgress;
use std::io;

/// Global context for the application
pub struct Context {
    pub quiet: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context { quiet: cli.quiet };

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&ctx),
        Command::Steps => list_steps(),
        Command::Config => {
            let config = ProvisionConfig::from_current_dir()?;
            print!("{}", config.to_toml()?);
            Ok(())
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "hoist", &mut io::stdout());
            Ok(())
        }
    }
}

fn run(ctx: &Context) -> Result<()> {
    let config = ProvisionConfig::from_current_dir()?;
    if !ctx.quiet {
        ui::banner();
        ui::kv("Source", &config.source_dir.display().to_string());
        ui::kv("Install", &config.install_dir.display().to_string());
        println!();
    }

    let host = SystemHost::new();
    let mut progress = StepProgress::new(ctx.quiet);

    match provision::run(&config, &host, &mut progress) {
        Ok(summary) => {
            if !ctx.quiet {
                println!();
                ui::success(&format!(
                    "Provisioned {} ({}, {} unchanged)",
                    config.install_dir.display(),
                    ui::plural(summary.total_changes(), "change"),
                    summary.no_change
                ));
            }
            Ok(())
        }
        Err(err) => {
            ui::error(&err.to_string());
            ui::hint(err.kind().advice());
            // Already reported; returning Err would print it twice
            std::process::exit(1);
        }
    }
}

fn list_steps() -> Result<()> {
    let config = ProvisionConfig::from_current_dir()?;
    let runbook = provision::build_runbook(&config);

    ui::header("Provisioning steps");
    for (index, step) in runbook.steps.iter().enumerate() {
        ui::step(index + 1, runbook.len(), &step.description());
    }
    Ok(())
}
