use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;

#[derive(Parser)]
#[command(name = "camwatch", about = "Live view of your monitoring cameras")]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Stream every camera, keeping the latest frame of each on disk
    Watch(commands::watch::WatchArgs),
    /// List the cameras the server offers
    Cameras(commands::cameras::CamerasArgs),
    /// Log in and store the session token
    Login(commands::auth::CredentialArgs),
    /// Register a new user
    Register(commands::auth::CredentialArgs),
    /// Forget the stored session token
    Logout,
    /// Manage configuration
    Config(commands::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Watch(args) => commands::watch::run(args).await,
        Commands::Cameras(args) => commands::cameras::run(args).await,
        Commands::Login(args) => commands::auth::login(args).await,
        Commands::Register(args) => commands::auth::register(args).await,
        Commands::Logout => commands::auth::logout(),
        Commands::Config(args) => commands::config::run(args),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn watch_accepts_overrides() {
        let cli = Cli::try_parse_from([
            "camwatch",
            "watch",
            "--output",
            "/tmp/frames",
            "--server",
            "http://cams:4000",
        ])
        .unwrap();

        match cli.command {
            Commands::Watch(args) => {
                assert_eq!(args.output, Some(std::path::PathBuf::from("/tmp/frames")));
                assert_eq!(args.server.as_deref(), Some("http://cams:4000"));
            }
            _ => panic!("Expected watch command"),
        }
    }

    #[test]
    fn verbose_is_global() {
        let cli = Cli::try_parse_from(["camwatch", "logout", "-v"]).unwrap();
        assert!(cli.verbose);
    }
}
