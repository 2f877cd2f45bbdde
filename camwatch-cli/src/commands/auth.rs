use anyhow::{Result, bail};
use camwatch_core::{AuthClient, LoginError};
use clap::Args;
use dialoguer::{Input, Password, theme::ColorfulTheme};

use super::ServerContext;

#[derive(Args)]
pub struct CredentialArgs {
    /// Username (prompted for when omitted)
    #[arg(short, long)]
    pub username: Option<String>,

    /// Server URL (overrides config)
    #[arg(long)]
    pub server: Option<String>,
}

pub async fn login(args: CredentialArgs) -> Result<()> {
    let ctx = ServerContext::load(args.server.as_deref())?;
    prompt_login(&ctx, args.username).await?;
    println!("Logged in to {}", ctx.endpoints.base());
    Ok(())
}

pub async fn register(args: CredentialArgs) -> Result<()> {
    let ctx = ServerContext::load(args.server.as_deref())?;
    let (username, password) = prompt_credentials(args.username, true)?;

    let client = AuthClient::new(ctx.endpoints.clone(), ctx.auth.clone());
    match client.register(&username, &password).await {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(LoginError::Conflict { message }) => bail!("{}", message),
        Err(LoginError::Unexpected { status: 401 }) if !ctx.auth.is_authenticated() => {
            bail!("The server only accepts registrations from signed-in users. Run `camwatch login` first.")
        }
        Err(e) => Err(e.into()),
    }
}

pub fn logout() -> Result<()> {
    let ctx = ServerContext::load(None)?;
    if !ctx.auth.is_authenticated() {
        println!("Not logged in.");
        return Ok(());
    }
    ctx.auth.invalidate();
    println!("Logged out.");
    Ok(())
}

/// Ask for credentials and log in, storing the issued token
pub async fn prompt_login(ctx: &ServerContext, username: Option<String>) -> Result<()> {
    let (username, password) = prompt_credentials(username, false)?;
    let client = AuthClient::new(ctx.endpoints.clone(), ctx.auth.clone());

    match client.login(&username, &password).await {
        Ok(_) => Ok(()),
        Err(LoginError::Rejected { message }) if message.is_empty() => {
            bail!("Login rejected")
        }
        Err(LoginError::Rejected { message }) => bail!("{}", message),
        Err(e) => Err(e.into()),
    }
}

fn prompt_credentials(username: Option<String>, confirm: bool) -> Result<(String, String)> {
    let theme = ColorfulTheme::default();

    let username = match username {
        Some(username) => username,
        None => Input::with_theme(&theme)
            .with_prompt("Username")
            .interact_text()?,
    };

    let mut password = Password::with_theme(&theme).with_prompt("Password");
    if confirm {
        password = password.with_confirmation("Confirm password", "Passwords don't match");
    }
    let password = password.interact()?;

    Ok((username, password))
}
