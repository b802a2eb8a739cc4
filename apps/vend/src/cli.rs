//! Command line interface definition

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vend - storefront client for signed downloads and checkout
#[derive(Parser)]
#[command(name = "vend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Download purchased files and confirm checkout payments")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Enable debug logging to the vend data directory
    #[arg(long, global = true)]
    pub debug: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the storefront API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Store a session token for authenticated requests
    Login {
        /// Bearer token issued by the storefront (prompted when omitted)
        #[arg(value_name = "TOKEN")]
        token: Option<String>,
    },

    /// Forget the stored session token
    Logout,

    /// Download a purchased file
    #[command(alias = "dl")]
    Download {
        /// Product identifier
        product_id: i64,

        /// Directory the file lands in (default: current directory)
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,
    },

    /// Open a checkout session for a product
    Buy {
        /// Product identifier
        product_id: i64,

        /// Stay attached and poll until the payment settles
        #[arg(long)]
        wait: bool,
    },

    /// Confirm that a checkout session settled
    Verify {
        /// Checkout session identifier
        session_id: String,

        /// Single reconciliation pass instead of the polling loop
        #[arg(long)]
        once: bool,
    },
}
