use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Result, bail};
use camwatch_core::{
    FileSinkFactory, HttpCameraDirectory, SessionExit, SessionManager, StatusBoard, WsTransport,
};
use clap::Args;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use super::ServerContext;
use super::auth::prompt_login;

#[derive(Args)]
pub struct WatchArgs {
    /// Directory for the latest frame of each camera (overrides config)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Server URL (overrides config)
    #[arg(long)]
    pub server: Option<String>,
}

pub async fn run(args: WatchArgs) -> Result<()> {
    let mut ctx = ServerContext::load(args.server.as_deref())?;
    if let Some(dir) = args.output {
        ctx.config.output.dir = dir;
    }
    println!("Writing frames to {}", ctx.config.output.dir.display());

    loop {
        match watch_once(&ctx).await {
            SessionExit::Shutdown => return Ok(()),
            SessionExit::Drained => {
                println!("All camera streams have ended.");
                return Ok(());
            }
            SessionExit::LoginRequired if std::io::stdin().is_terminal() => {
                println!("Please log in to continue.");
                prompt_login(&ctx, None).await?;
                info!("Reloading session with new credentials");
            }
            SessionExit::LoginRequired => {
                bail!("Session is no longer valid. Run `camwatch login` and try again.")
            }
        }
    }
}

/// Run one session, printing status changes until it ends
async fn watch_once(ctx: &ServerContext) -> SessionExit {
    let status = StatusBoard::new();
    let sinks = Arc::new(FileSinkFactory::new(&ctx.config.output.dir));
    let mut session = SessionManager::new(
        ctx.config.session_config(),
        ctx.auth.clone(),
        Arc::new(HttpCameraDirectory::new(ctx.endpoints.clone())),
        Arc::new(WsTransport::new(ctx.endpoints.clone())),
        sinks.clone(),
    )
    .with_status(status.clone());

    let mut updates = status.updates();
    let printer = tokio::spawn(async move {
        loop {
            match updates.recv().await {
                Ok(message) => println!("{}", message),
                Err(RecvError::Lagged(skipped)) => {
                    warn!("Skipped {} status message(s)", skipped)
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let shutdown = session.shutdown_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.cancel();
        }
    });

    let exit = session.run().await;

    interrupt.abort();
    // The printer drains the remaining messages and stops once the board is gone
    drop(session);
    drop(status);
    let _ = printer.await;
    sinks.join_writers().await;
    exit
}
