//! policydesk - terminal client for the insurance appointment platform.
//!
//! Every command goes through the same session store, request pipeline and
//! route guard the platform's views use, so expired tokens are refreshed
//! transparently and protected commands are gated by role.

mod commands;

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use policydesk_core::{ApiClient, ApiError, Config, Navigator, Route, RouteGuard, SessionEvaluator, TokenStore};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const USAGE: &str = "\
Usage: policydesk <command> [args]

Commands:
  login [email]                          Log in and store the session
  register [role]                        Create an account (CUSTOMER or AGENT)
  logout                                 Revoke and clear the stored session
  status                                 Show the stored session
  route <path>                           Show what a route would display
  agents [all|available|top|<field>]     List agents, optionally by specialization
  slots <agent-id> [from-date]           List open slots of an agent
  appointments                           List appointments for your role
  book <agent-id> <date-time> <type> [notes...]
                                         Book an appointment
  status-update <id> <status> [reason]   Change an appointment's status
  ask <question...>                      Ask the AI assistant
  analytics                              Show platform analytics (admin)
  forgot-password <email>                Request a password reset email
  reset-password <token>                 Set a new password
  verify-email <token>                   Confirm an email address
";

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

/// Terminal stand-in for client-side navigation.
struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, to: Route) {
        match to {
            Route::Login => eprintln!("Please log in again: policydesk login"),
            other => eprintln!("Redirecting to {}", other),
        }
    }
}

/// Everything a command needs, wired once per run.
pub struct App {
    pub config: Config,
    pub client: ApiClient,
    pub evaluator: SessionEvaluator,
    pub guard: RouteGuard,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        eprint!("{}", USAGE);
        return Ok(());
    };
    if command == "help" || command == "--help" || command == "-h" {
        print!("{}", USAGE);
        return Ok(());
    }

    let config = Config::load()?;
    let backend = config
        .storage_backend()
        .context("Failed to open session storage")?;
    let store = Arc::new(TokenStore::new(backend));
    let navigator: Arc<dyn Navigator> = Arc::new(ConsoleNavigator);
    let client = ApiClient::from_config(&config, store.clone(), Some(navigator.clone()))
        .context("Failed to build HTTP client")?;
    let evaluator = SessionEvaluator::new(store);
    let guard = RouteGuard::new(evaluator.clone(), Some(navigator));
    info!(api_url = %config.api_url, command = %command, "policydesk starting");

    let mut app = App {
        config,
        client,
        evaluator,
        guard,
    };

    match commands::run(&mut app, command, rest).await {
        Ok(()) => Ok(()),
        Err(e) => match e.downcast_ref::<ApiError>() {
            // The navigator has already told the user to log in again.
            Some(api_error) if api_error.is_session_terminated() => std::process::exit(2),
            _ => Err(e),
        },
    }
}
