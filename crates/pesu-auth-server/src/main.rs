// Copyright 2026 PESU Auth Contributors
// SPDX-License-Identifier: MIT

//! PESU Auth API server entry point.

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use pesu_auth_server::config::{Overrides, ServerConfig};
use pesu_auth_server::rest;

#[derive(Parser)]
#[command(
    name = "pesu-auth-server",
    about = "PESU Auth: verify PESU Academy credentials and fetch student profiles",
    version
)]
struct Cli {
    /// Log level or filter directive (trace, debug, info, warn, error).
    /// `RUST_LOG` takes precedence when set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API (default).
    Serve(ServeArgs),

    /// Generate shell completion scripts.
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[derive(Args, Default)]
struct ServeArgs {
    /// Host to bind. Also reads PESU_AUTH_HOST. Default 0.0.0.0.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind. Also reads PESU_AUTH_PORT. Default 5000.
    #[arg(long)]
    port: Option<u16>,

    /// Portal base URL. Also reads PESU_AUTH_PORTAL_URL.
    #[arg(long)]
    portal_url: Option<String>,

    /// Per-request timeout towards the portal, in milliseconds.
    /// Also reads PESU_AUTH_TIMEOUT_MS. Default 30000.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Maximum authentication attempts in flight.
    /// Also reads PESU_AUTH_MAX_CONCURRENT. Default 64.
    #[arg(long)]
    max_concurrent: Option<usize>,

    /// Also run the class and section lookup for profile requests.
    /// Also reads PESU_AUTH_CLASS_LOOKUP.
    #[arg(long)]
    class_lookup: bool,
}

impl From<ServeArgs> for Overrides {
    fn from(args: ServeArgs) -> Self {
        Overrides {
            host: args.host,
            port: args.port,
            portal_url: args.portal_url,
            timeout_ms: args.timeout_ms,
            max_concurrent: args.max_concurrent,
            // Absent flag defers to the environment.
            class_lookup: args.class_lookup.then_some(true),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    match cli.command.unwrap_or(Commands::Serve(ServeArgs::default())) {
        Commands::Serve(args) => {
            let config = ServerConfig::resolve(args.into())?;
            rest::start(config).await?;
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "pesu-auth-server", &mut std::io::stdout());
        }
    }

    Ok(())
}
