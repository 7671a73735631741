//! Chat relay client
//!
//! Registers with a relay server, prints every message it receives on its
//! own line, and sends each line typed on stdin.
//!
//! # Usage
//!
//! ```text
//! relay -u alice -h 127.0.0.1:9001          # immediate delivery
//! relay -u bobby -n 5 -h chat.example:9001  # deliver in bursts of 5
//! ```

use std::process;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use relay_client::{ClientConfig, RelayClient};
use relay_core::{ClientId, DisplayName, MAX_THROTTLE, USERNAME_LENGTH};

/// Chat relay client
#[derive(Parser, Debug)]
#[command(name = "relay", version, about, disable_help_flag = true)]
struct Args {
    /// Username (exactly 5 bytes)
    #[arg(short = 'u', long = "user", value_parser = parse_name)]
    username: DisplayName,

    /// Get messages once this many are pending (0 = immediately)
    #[arg(
        short = 'n',
        long,
        default_value_t = 0,
        value_parser = clap::value_parser!(u64).range(0..=MAX_THROTTLE)
    )]
    throttle: u64,

    /// Server address (host:port)
    #[arg(short = 'h', long = "host")]
    server: String,

    /// Print help
    #[arg(long, action = clap::ArgAction::Help)]
    help: Option<bool>,
}

fn parse_name(s: &str) -> Result<DisplayName, String> {
    DisplayName::parse(s).map_err(|_| format!("username must be exactly {USERNAME_LENGTH} bytes"))
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::new(args.server, args.username, args.throttle);
    if let Err(e) = run(config).await {
        eprintln!("Fatal error: {e:#}");
        process::exit(1);
    }
}

async fn run(config: ClientConfig) -> Result<()> {
    let client = RelayClient::from_config(&config)
        .await
        .context("couldn't set up connection")?;
    let id = client
        .register(config.name, config.throttle)
        .await
        .context("failed to subscribe")?;

    let client = Arc::new(client);
    let cancel_token = CancellationToken::new();

    let reader = tokio::spawn(read_messages(Arc::clone(&client), cancel_token.clone()));
    let result = send_messages(&client, id, cancel_token.clone()).await;

    cancel_token.cancel();
    let _ = reader.await;
    result
}

/// Prints each delivery as `name: text` on its own line until cancelled.
///
/// Text that is not valid UTF-8 is shown with replacement characters.
async fn read_messages(client: Arc<RelayClient>, cancel_token: CancellationToken) {
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            result = client.recv_broadcast() => match result {
                Ok(broadcast) => println!("{broadcast}"),
                Err(e) => debug!(error = %e, "Receive failed"),
            },
        }
    }
}

/// Sends each non-empty stdin line until EOF or Ctrl-C.
async fn send_messages(
    client: &RelayClient,
    id: ClientId,
    cancel_token: CancellationToken,
) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => return Ok(()),
            _ = cancel_token.cancelled() => return Ok(()),
            line = lines.next_line() => line.context("failed to read stdin")?,
        };

        let Some(line) = line else {
            return Ok(());
        };
        let text = line.trim_end_matches('\r');
        if text.is_empty() {
            continue;
        }

        match client.send_text(id, text).await {
            Ok(()) => {}
            Err(relay_client::ClientError::Frame(e)) => warn!(error = %e, "Message not sent"),
            Err(e) => return Err(e).context("failed to send message"),
        }
    }
}
