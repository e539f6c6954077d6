//! Inkwell chat entry point.
//!
//! # Usage
//!
//! ```bash
//! # Chat about an article against a running backend
//! inkwell-chat --ws-base wss://api.example.com --article 42 --brand acme
//!
//! # No backend: talk to the built-in loopback assistant
//! inkwell-chat --offline --article 42 --brand acme
//! ```

use clap::Parser;
use inkwell_app::{Runtime, Session};
use inkwell_cli::host;
use inkwell_client::{ClientConfig, LoopbackOptions, SystemEnv, TransportMode, WsDriver};
use tokio::{io::BufReader, sync::mpsc};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Inkwell article chat
#[derive(Parser, Debug)]
#[command(name = "inkwell-chat")]
#[command(about = "Chat with the Inkwell assistant about an article")]
#[command(version)]
struct Args {
    /// WebSocket base URL of the chat backend
    #[arg(long, env = "INKWELL_WS_BASE", default_value = "ws://localhost:8000")]
    ws_base: String,

    /// Article the conversation is about
    #[arg(long, env = "INKWELL_ARTICLE_ID")]
    article: String,

    /// Brand whose voice the assistant should use
    #[arg(long, env = "INKWELL_BRAND_ID")]
    brand: String,

    /// Target platform label sent with every request [default: General]
    #[arg(long, env = "INKWELL_PLATFORM")]
    platform: Option<String>,

    /// Automatic reconnect attempts before giving up
    #[arg(long, default_value = "3")]
    max_retries: u32,

    /// Use the in-process loopback assistant instead of a server
    #[arg(long)]
    offline: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenvy::dotenv();
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // Transcript owns stdout
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = ClientConfig::new(&args.ws_base, &args.article, &args.brand)?
        .with_max_retries(args.max_retries);
    if let Some(platform) = &args.platform {
        config = config.with_platform(platform);
    }

    let mode = if args.offline {
        tracing::info!("offline mode, using loopback assistant");
        TransportMode::Loopback(LoopbackOptions::default())
    } else {
        TransportMode::WebSocket
    };

    let session = Session::new(config.session_config(), SystemEnv::new());
    let (commands_tx, commands_rx) = mpsc::channel(32);
    let driver = WsDriver::new(mode, commands_rx, session.snapshot());

    let printer = tokio::spawn(host::print_snapshots(driver.subscribe(), std::io::stdout()));
    let reader = tokio::spawn(host::read_commands(
        BufReader::new(tokio::io::stdin()),
        commands_tx,
        std::io::stdout(),
    ));

    let mut runtime = Runtime::new(driver, session);
    let result = runtime.run().await;

    // Dropping the driver ends the printer after its last render
    drop(runtime);
    let _ = printer.await;
    reader.abort();

    result?;
    Ok(())
}
