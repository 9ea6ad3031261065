//! bugdrill command line client.
//!
//! Drives the session layer end to end: sign in, check the stored session,
//! browse the pattern catalog, and print progress.

use anyhow::Result;
use api_client::ApiClient;
use clap::{Parser, Subcommand};
use client_core::{Config, Paths};
use credential_store::{CredentialManager, FileStorage};
use session_engine::{SessionManager, SessionState};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "bugdrill",
    about = "Headless client for the bugdrill practice service",
    version
)]
struct Args {
    /// Base directory for config and credentials (default ~/.bugdrill)
    #[arg(long, global = true, env = "BUGDRILL_HOME")]
    home: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Signup {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        display_name: String,
    },
    /// Sign out and clear stored credentials
    Logout,
    /// Validate the stored session and print its state
    Status,
    /// List pattern categories
    Patterns,
    /// Show overall progress
    Progress,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let paths = match &args.home {
        Some(dir) => Paths::with_base_dir(dir.clone()),
        None => Paths::new()?,
    };
    let config = Config::load(&paths)?;
    client_core::init_logging(&config.log_level);

    let storage = FileStorage::new(paths.credentials_dir())?;
    let store = Arc::new(CredentialManager::new(Box::new(storage)));
    let api = ApiClient::new(
        config.api_base_url.clone(),
        Duration::from_secs(config.request_timeout_secs),
        store.clone(),
    )?;
    let session = SessionManager::new(api.clone(), store);

    match args.command {
        Commands::Login { email, password } => {
            let user = session.login(&email, &password).await?;
            println!("signed in as {} <{}>", user.display_name, user.email);
        }
        Commands::Signup {
            email,
            password,
            display_name,
        } => {
            let user = session.signup(&email, &password, &display_name).await?;
            println!("account created for {} <{}>", user.display_name, user.email);
        }
        Commands::Logout => {
            session.logout().await?;
            println!("signed out");
        }
        Commands::Status => {
            session.check_auth().await?;
            print_state(&session.state());
        }
        Commands::Patterns => {
            let patterns = api.catalog().patterns().await?;
            if patterns.is_empty() {
                println!("no patterns available");
            }
            for pattern in patterns {
                println!("{:>3}  {}  ({})", pattern.id, pattern.name, pattern.slug);
            }
        }
        Commands::Progress => {
            let progress = api.progress().user_progress().await?;
            println!("attempted: {}", progress.total_snippets_attempted);
            println!("solved:    {}", progress.total_snippets_solved);
            for row in progress.patterns {
                println!("  {:<24} {}/{}", row.pattern_name, row.solved, row.attempted);
            }
        }
    }

    Ok(())
}

fn print_state(state: &SessionState) {
    if state.is_authenticated {
        if let Some(user) = &state.user {
            println!("authenticated as {} <{}>", user.display_name, user.email);
            if user.is_trial {
                println!(
                    "trial account, {} snippets remaining",
                    user.trial_snippets_remaining
                );
            }
        }
    } else if let Some(error) = &state.error {
        println!("not authenticated: {error}");
    } else {
        println!("not authenticated");
    }
}
