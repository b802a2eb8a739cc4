//! vend - storefront client for signed downloads and checkout
//!
//! This is the CLI application that wires the library crates together:
//! it loads configuration, owns the token store, runs commands while
//! rendering their events, and prints the final outcome.

mod cli;
mod display;
mod error;
mod events;
mod logging;

use crate::cli::{Cli, Commands};
use crate::display::{CommandOutcome, OutputRenderer};
use crate::error::CliError;
use crate::events::EventHandler;
use clap::Parser;
use std::process;
use std::sync::Arc;
use tokio::select;
use tracing::{error, info};
use vend_auth::{FileTokenStore, TokenStore};
use vend_checkout::{PollerConfig, PurchasePoller};
use vend_config::Config;
use vend_errors::PurchaseError;
use vend_events::{EventReceiver, EventSender};
use vend_net::{DeliveryConfig, Downloader, NetClient, NetConfig, StorefrontClient};
use vend_types::{CheckoutRequest, PurchaseRecord};

#[tokio::main]
async fn main() {
    // Parse command line arguments first to check for JSON mode
    let cli = Cli::parse();
    let json_mode = cli.global.json;

    init_tracing(json_mode, cli.global.debug);

    if let Err(e) = run(cli).await {
        error!("command failed: {e}");
        if !json_mode {
            eprintln!("Error: {e}");
        }
        process::exit(1);
    }
}

/// Shared handles every command dispatches against
struct AppContext {
    config: Config,
    tokens: Arc<FileTokenStore>,
    api: StorefrontClient,
    downloader: Downloader,
    poller: PollerConfig,
    events: EventSender,
}

/// Main application logic
async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting vend v{}", env!("CARGO_PKG_VERSION"));

    // Configuration precedence: file, then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    if let Some(api_url) = &cli.global.api_url {
        config.storefront.api_url.clone_from(api_url);
    }
    config.validate()?;

    // Resolve the login token before any async plumbing spins up
    let command = match cli.command {
        Commands::Login { token: None } => Commands::Login {
            token: Some(prompt_for_token(cli.global.json)?),
        },
        other => other,
    };

    let tokens = Arc::new(FileTokenStore::with_default_path()?);
    let (event_sender, event_receiver) = vend_events::channel();

    let net = NetClient::new(NetConfig::from_config(&config))?;
    let api = StorefrontClient::new(net.clone(), &config.storefront.api_url, tokens.clone())?
        .with_events(event_sender.clone());
    let downloader = Downloader::new(net, tokens.clone(), DeliveryConfig::from_config(&config))
        .with_events(event_sender.clone());
    let poller = PollerConfig::from_config(&config);

    let colors = console::Term::stderr().features().colors_supported();
    let handler = EventHandler::new(colors, cli.global.json, cli.global.debug);
    let renderer = OutputRenderer::new(cli.global.json);

    let context = AppContext {
        config,
        tokens,
        api,
        downloader,
        poller,
        events: event_sender,
    };

    let outcome = execute_command_with_events(command, context, event_receiver, &handler).await?;
    renderer.render(&outcome)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command with concurrent event handling
async fn execute_command_with_events(
    command: Commands,
    context: AppContext,
    mut event_receiver: EventReceiver,
    handler: &EventHandler,
) -> Result<CommandOutcome, CliError> {
    let mut command_future = Box::pin(execute_command(command, context));

    loop {
        select! {
            // Command completed
            result = &mut command_future => {
                // Drain any remaining events
                while let Ok(event) = event_receiver.try_recv() {
                    handler.handle_event(&event);
                }
                return result;
            }

            // Event received
            event = event_receiver.recv() => {
                match event {
                    Some(event) => handler.handle_event(&event),
                    None => { /* Channel closed: keep waiting for command to finish */ }
                }
            }
        }
    }
}

/// Execute the specified command
async fn execute_command(command: Commands, ctx: AppContext) -> Result<CommandOutcome, CliError> {
    match command {
        Commands::Login { token } => {
            let token = token
                .ok_or_else(|| CliError::InvalidArguments("a token is required".to_string()))?;
            ctx.tokens.set_token(&token)?;
            Ok(CommandOutcome::LoggedIn)
        }

        Commands::Logout => {
            ctx.tokens.clear_token()?;
            Ok(CommandOutcome::LoggedOut)
        }

        Commands::Download { product_id, output } => {
            let grant = ctx.api.fetch_download_grant(product_id).await?;
            let dest_dir = output.unwrap_or_else(|| ctx.config.output_dir());
            let delivery = ctx.downloader.download(&grant, &dest_dir).await?;
            Ok(CommandOutcome::Delivered(delivery))
        }

        Commands::Buy { product_id, wait } => {
            let request = CheckoutRequest::stripe(
                ctx.config.storefront.success_url.clone(),
                ctx.config.storefront.cancel_url.clone(),
            );
            let session = ctx.api.create_checkout(product_id, &request).await?;
            if wait {
                let record = confirm_session(&ctx, session.session_id.clone()).await?;
                Ok(CommandOutcome::Settled(record))
            } else {
                Ok(CommandOutcome::CheckoutOpen(session))
            }
        }

        Commands::Verify { session_id, once } => {
            if once {
                let record = ctx.api.verify_purchase(&session_id).await?;
                if record.payment_status.is_declined() {
                    return Err(vend_errors::Error::from(PurchaseError::PaymentFailed {
                        status: record.payment_status.as_str().to_string(),
                    })
                    .into());
                }
                if record.payment_status.is_settled() {
                    Ok(CommandOutcome::Settled(record))
                } else {
                    Ok(CommandOutcome::Pending(record))
                }
            } else {
                let record = confirm_session(&ctx, session_id).await?;
                Ok(CommandOutcome::Settled(record))
            }
        }
    }
}

/// Run the confirmation poller to completion for a session
async fn confirm_session(ctx: &AppContext, session_id: String) -> Result<PurchaseRecord, CliError> {
    let poller =
        PurchasePoller::new(ctx.api.clone(), ctx.poller.clone()).with_events(ctx.events.clone());
    let outcome = poller.spawn(session_id).wait().await;
    Ok(outcome.into_result()?)
}

/// Ask for the token on the terminal without echoing it
fn prompt_for_token(json_mode: bool) -> Result<String, CliError> {
    if json_mode {
        return Err(CliError::InvalidArguments(
            "login needs the token argument in --json mode".to_string(),
        ));
    }
    let term = console::Term::stderr();
    term.write_str("Paste your storefront session token: ")?;
    let token = term.read_secure_line()?;
    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(CliError::InvalidArguments(
            "a token is required".to_string(),
        ));
    }
    Ok(token)
}

/// Open a timestamped log file under the vend data directory
fn open_log_file() -> Option<(std::fs::File, std::path::PathBuf)> {
    let dir = dirs::data_dir()?.join("vend").join("logs");
    std::fs::create_dir_all(&dir).ok()?;
    let path = dir.join(format!(
        "vend-{}.log",
        chrono::Utc::now().format("%Y%m%d-%H%M%S")
    ));
    let file = std::fs::File::create(&path).ok()?;
    Some((file, path))
}

/// Initialize tracing/logging
fn init_tracing(json_mode: bool, debug_enabled_flag: bool) {
    let debug_enabled = std::env::var("RUST_LOG").is_ok() || debug_enabled_flag;

    if debug_enabled {
        // Debug mode: structured JSON logs to file
        if let Some((file, path)) = open_log_file() {
            tracing_subscriber::fmt()
                .json()
                .with_writer(file)
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,vend=debug")),
                )
                .init();
            if !json_mode {
                eprintln!("Debug logging enabled: {}", path.display());
            }
            return;
        }
        if json_mode {
            // JSON output must stay clean even when the log file fails
            tracing_subscriber::fmt()
                .with_writer(std::io::sink)
                .with_env_filter("off")
                .init();
        } else {
            eprintln!("Warning: failed to create log file, logging to stderr");
            tracing_subscriber::fmt()
                .with_env_filter(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,vend=debug")),
                )
                .init();
        }
    } else if json_mode {
        // JSON mode: suppress all console logging to avoid contaminating output
        tracing_subscriber::fmt()
            .with_writer(std::io::sink)
            .with_env_filter("off")
            .init();
    } else {
        // Normal mode: minimal logging to stderr
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,vend=warn")),
            )
            .init();
    }
}
