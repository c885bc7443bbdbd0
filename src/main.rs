mod app;
mod cli;
mod config;
mod logging;
mod services;
mod ui;

use crate::cli::Command;
use crate::config::AppConfig;
use crate::services::api::fetch_item_list;
use crate::services::liveness::{self, Liveness};
use anyhow::{Context, Result};
use clap::Parser;
use std::panic;
use std::process::ExitCode;
use tokio::runtime::Runtime;

fn main() -> Result<ExitCode> {
    panic::set_hook(Box::new(|info| {
        eprintln!("dcpu-ide-panels panic: {info}");
        if let Some(location) = info.location() {
            eprintln!("  at {}:{}", location.file(), location.line());
        }
    }));

    let cli = cli::Cli::parse();
    let settings = AppConfig::load(&cli)?;
    logging::init(cli.debug || settings.debug_logging);

    if let Some(command) = cli.command.clone() {
        return handle_command(command, &settings);
    }

    if cli.headless {
        app::run_headless(&settings)?;
        return Ok(ExitCode::SUCCESS);
    }

    app::run(settings)?;
    Ok(ExitCode::SUCCESS)
}

fn handle_command(command: Command, settings: &AppConfig) -> Result<ExitCode> {
    let runtime = Runtime::new().context("starting tokio runtime")?;
    let client = app::build_client(settings)?;

    match command {
        Command::Items => {
            let items = runtime
                .block_on(fetch_item_list(&client, &settings.item_list_path))
                .with_context(|| format!("fetching {}", settings.item_list_path))?;
            for item in items {
                let key = item
                    .key
                    .as_deref()
                    .map(|key| format!("alt+{key}"))
                    .unwrap_or_default();
                println!("{:<16} {:<24} {:<8} {}", item.id, item.title, key, item.src);
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Ping => match runtime.block_on(liveness::probe(&client, &settings.ping_path)) {
            Liveness::Reachable => {
                println!("{} is reachable", settings.address);
                Ok(ExitCode::SUCCESS)
            }
            Liveness::Unreachable { message, .. } => {
                println!("{} is unreachable: {message}", settings.address);
                Ok(ExitCode::FAILURE)
            }
        },
    }
}
