use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser;
use sendmail_relay::{logging, router, serve, Context, RelayConfig};

#[derive(Parser)]
#[command(name = "sendmail-relay", about = "Relay JSON mail requests to an SMTP server")]
struct Cli {
    /// Raise console log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long, action = clap::ArgAction::Count)]
    verbosity: u8,

    /// Load environment variables from this file instead of ./.env
    #[arg(long)]
    env_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.env_file {
        Some(path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("could not load {}", path.display()))?;
        }
        None => {
            dotenvy::dotenv().ok();
        }
    }

    // Refuse to start, before binding anything, if the environment is incomplete.
    let config = match RelayConfig::load() {
        Ok(config) => Arc::new(config),
        Err(err) => {
            eprintln!("Must provide HOST_NAME, SERVER_PORT, MAIL_FROM and MAIL_HOST_TYPE in the environment: {err}");
            std::process::exit(1);
        }
    };

    logging::init(&config, cli.verbosity).context("could not initialise logging")?;
    tracing::debug!(host_type = ?config.mail_host_type, enable_send = config.enable_send, "configuration loaded");

    let addr = (config.host_name.clone(), config.server_port);
    let banner = config.banner();
    let routes = router(Context::new(config));

    serve(addr, routes, &banner)
        .await
        .context("error running HTTP server")?;
    Ok(())
}
