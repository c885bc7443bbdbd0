use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Command line interface for the DCPU IDE panels.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "dcpu-ide-panels",
    author,
    version,
    about = "Dashboard, dialogs and connection status for the DCPU IDE"
)]
pub struct Cli {
    /// Optional path to a configuration file (TOML, YAML, JSON).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Named profile to load (e.g. dev, remote).
    #[arg(short, long)]
    pub profile: Option<String>,

    /// Load the dashboard and probe the server without opening a window.
    #[arg(long)]
    pub headless: bool,

    /// Enable debug logging (honours RUST_LOG).
    #[arg(long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Print the dashboard item list served by the IDE.
    Items,
    /// Probe the server once; exits non-zero when it is unreachable.
    Ping,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands_and_flags() {
        let cli = Cli::parse_from(["dcpu-ide-panels", "--debug", "-p", "dev", "ping"]);
        assert!(cli.debug);
        assert_eq!(cli.profile.as_deref(), Some("dev"));
        assert!(matches!(cli.command, Some(Command::Ping)));
    }

    #[test]
    fn window_mode_is_the_default() {
        let cli = Cli::parse_from(["dcpu-ide-panels"]);
        assert!(!cli.headless);
        assert!(cli.command.is_none());
    }
}
