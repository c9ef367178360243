//! Account CLI commands.
//!
//! Auth sessions are process-scoped: the provider token lives only for
//! the lifetime of one invocation, so commands that need a session
//! (whoami after login, delete) sign in themselves.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::config;
use crate::core::AccountManager;
use crate::providers::SupabaseAuth;

/// Account subcommands
#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Sign in with email and password
    Login {
        email: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "BRAINDUMP_PASSWORD")]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        email: String,

        #[arg(long)]
        first_name: String,

        /// Password (prompted when omitted)
        #[arg(long, env = "BRAINDUMP_PASSWORD")]
        password: Option<String>,
    },

    /// Revoke the current session
    Logout {
        email: String,

        #[arg(long, env = "BRAINDUMP_PASSWORD")]
        password: Option<String>,
    },

    /// Show the signed-in user for the given credentials
    Whoami {
        email: String,

        #[arg(long, env = "BRAINDUMP_PASSWORD")]
        password: Option<String>,
    },

    /// Permanently delete the account
    Delete {
        email: String,

        #[arg(long, env = "BRAINDUMP_PASSWORD")]
        password: Option<String>,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

/// Execute an account command
pub async fn execute(command: AccountCommands) -> Result<()> {
    match command {
        AccountCommands::Login { email, password } => execute_login(&email, password).await,
        AccountCommands::Signup {
            email,
            first_name,
            password,
        } => execute_signup(&email, &first_name, password).await,
        AccountCommands::Logout { email, password } => execute_logout(&email, password).await,
        AccountCommands::Whoami { email, password } => execute_whoami(&email, password).await,
        AccountCommands::Delete { email, password, yes } => {
            execute_delete(&email, password, yes).await
        }
    }
}

/// Build the account manager over the configured Supabase project
fn account_manager() -> Result<AccountManager> {
    let cfg = config::config()?;
    if cfg.supabase.url.is_empty() || cfg.supabase.anon_key.is_empty() {
        anyhow::bail!(
            "SUPABASE_URL and SUPABASE_ANON_KEY are not set (env or .braindump/config.yaml)"
        );
    }

    Ok(AccountManager::new(Arc::new(SupabaseAuth::new(&cfg.supabase))))
}

/// Use the provided password or prompt for one on stdin
fn resolve_password(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    print!("Password: ");
    std::io::stdout().flush().ok();

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read password")?;

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn execute_login(email: &str, password: Option<String>) -> Result<()> {
    let manager = account_manager()?;
    let password = resolve_password(password)?;

    let user = manager.sign_in(email, &password).await?;
    println!("Welcome back, {}!", user.display_name());
    Ok(())
}

async fn execute_signup(email: &str, first_name: &str, password: Option<String>) -> Result<()> {
    let manager = account_manager()?;
    let password = resolve_password(password)?;

    let user = manager.sign_up(email, &password, first_name).await?;
    println!("Account created for {}", user.email);
    Ok(())
}

async fn execute_logout(email: &str, password: Option<String>) -> Result<()> {
    let manager = account_manager()?;
    let password = resolve_password(password)?;

    manager.sign_in(email, &password).await?;
    manager.sign_out().await?;
    println!("Signed out");
    Ok(())
}

async fn execute_whoami(email: &str, password: Option<String>) -> Result<()> {
    let manager = account_manager()?;
    let password = resolve_password(password)?;

    manager.sign_in(email, &password).await?;
    match manager.refresh().await? {
        Some(user) => {
            println!("Signed in as {} ({})", user.display_name(), user.email);
            println!("User id: {}", user.id);
        }
        None => println!("Not signed in"),
    }
    Ok(())
}

async fn execute_delete(email: &str, password: Option<String>, yes: bool) -> Result<()> {
    let manager = account_manager()?;
    let password = resolve_password(password)?;

    manager.sign_in(email, &password).await?;

    if !yes {
        print!("This permanently deletes the account {}. Type 'delete' to confirm: ", email);
        std::io::stdout().flush().ok();

        let mut line = String::new();
        std::io::stdin()
            .read_line(&mut line)
            .context("Failed to read confirmation")?;
        if line.trim() != "delete" {
            println!("Aborted");
            return Ok(());
        }
    }

    manager.delete_account().await?;
    println!("Account deleted");
    Ok(())
}
