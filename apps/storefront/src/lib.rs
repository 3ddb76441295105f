//! # Pupuk Storefront
//!
//! The `pupuk` command line: the fertilizer shop and its back-office,
//! driven against the storefront backend.
//!
//! ## Module Organization
//! ```text
//! pupuk_storefront/
//! ├── lib.rs          ◄─── You are here (tracing setup & dispatch)
//! ├── cli.rs          ◄─── clap definition
//! ├── state/
//! │   ├── app.rs      ◄─── Connected Storefront + saved session
//! │   ├── session.rs  ◄─── Session cookie file
//! │   └── shop.rs     ◄─── Interactive page flow
//! ├── commands/       ◄─── One function per subcommand
//! ├── output.rs       ◄─── Tables and summaries for the terminal
//! └── error.rs        ◄─── Error type every command returns
//! ```
//!
//! ## Invocation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  main ──► Cli::parse ──► init_tracing ──► run                            │
//! │                                            │                            │
//! │            ClientConfig::load (+ --api-url)│                            │
//! │            SessionStore::default_location  │                            │
//! │            AppState::connect ◄─────────────┘  restores the cookie       │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │            commands::* ──► String ──► stdout                            │
//! │                   │                                                     │
//! │                   ▼                                                     │
//! │            persist_session   (the backend may have rotated the cookie)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;
pub mod state;

use pupuk_client::ClientConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use commands::{account, admin, cart, catalog, checkout, orders, shop, OutputFormat};
use error::ApiResult;
use state::{AppState, SessionStore};

/// Default filter with `--verbose`.
const VERBOSE_FILTER: &str = "info,pupuk=debug,reqwest=warn";

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - Default: warnings only, so tables stay readable
/// - `--verbose`: `info`, and `debug` for the pupuk crates
/// - `RUST_LOG` overrides both
///
/// Logs go to stderr; stdout carries command output.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new(VERBOSE_FILTER)
        } else {
            EnvFilter::new("warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .try_init()
}

/// Loads configuration, connects, and runs one command.
pub async fn run(cli: Cli) -> ApiResult<()> {
    let mut config = ClientConfig::load(cli.config.clone())?;
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.trim_end_matches('/').to_string();
        config.validate()?;
    }
    info!(base_url = %config.api.base_url, "Storefront configured");

    let state = AppState::connect(config, SessionStore::default_location()?)?;
    let format = OutputFormat::from_flag(cli.json);

    if let Some(output) = dispatch(&state, &cli.command, format).await? {
        println!("{}", output);
    }

    if touches_session(&cli.command) {
        state.persist_session()?;
    }
    Ok(())
}

/// Commands after which the cookie jar may differ from the saved file.
///
/// Login and logout manage the file themselves.
fn touches_session(command: &Command) -> bool {
    !matches!(
        command,
        Command::Login(_) | Command::Logout | Command::Register(_) | Command::ForgotPassword { .. }
            | Command::ResetPassword(_)
    )
}

/// Runs `command`. Long-running commands print as they go and return `None`.
async fn dispatch(state: &AppState, command: &Command, format: OutputFormat) -> ApiResult<Option<String>> {
    let output = match command {
        Command::Catalog(args) => catalog::list(state, args, format).await?,
        Command::Product { id } => catalog::show(state, id, format).await?,
        Command::Facets => catalog::facets(state, format).await?,
        Command::Cart(cmd) => cart::run(state, cmd, format).await?,
        Command::Checkout(args) => checkout::checkout(state, args, format).await?,
        Command::PaymentFinish { url } => checkout::payment_finish(state, url, format).await?,
        Command::Orders => orders::list(state, format).await?,
        Command::Order { id } => orders::show(state, id, format).await?,
        Command::Watch => {
            orders::watch(state, format).await?;
            return Ok(None);
        }
        Command::Login(args) => account::login(state, args, format).await?,
        Command::Register(args) => account::register(state, args, format).await?,
        Command::Logout => account::logout(state).await?,
        Command::Whoami => account::whoami(state, format).await?,
        Command::ForgotPassword { email } => account::forgot_password(state, email).await?,
        Command::ResetPassword(args) => account::reset_password(state, args).await?,
        Command::Profile(args) => account::update_profile(state, args, format).await?,
        Command::Admin(cmd) => admin::run(state, cmd, format).await?,
        Command::Shop => {
            shop::run(state).await?;
            return Ok(None);
        }
    };
    Ok(Some(output))
}
