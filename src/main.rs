use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use score_keeper::api::state::AppState;
use score_keeper::api::{build_router, cors_layer};
use score_keeper::config::AppConfig;
use score_keeper::messages::MessageLog;
use score_keeper::models::REQUIRED_FIELDS;
use score_keeper::parser::MessageParser;
use score_keeper::scoring::Scorer;
use score_keeper::sheets::{GoogleSheetsClient, GoogleSheetsConfig, MemorySheet, RangeStore};
use score_keeper::storage::{FsBlobStore, StorageConfig};

#[derive(Parser)]
#[command(name = "score-keeper")]
#[command(about = "Head-to-head game score tracker backed by a spreadsheet")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "./config.toml")]
    config: String,

    /// Data directory path (overrides the config file)
    #[arg(long)]
    data_dir: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Output logs as JSON
    #[arg(long)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Bind address
        #[arg(long)]
        host: Option<String>,

        /// Port number
        #[arg(long)]
        port: Option<u16>,

        /// Use an in-memory sheet instead of the configured spreadsheet
        #[arg(long)]
        memory_store: bool,
    },

    /// Score one message and print the reply
    Submit {
        /// Message text, e.g. "Jess by 5. Catan. Rainy"
        message: String,

        /// Use an in-memory sheet instead of the configured spreadsheet
        #[arg(long)]
        memory_store: bool,
    },

    /// Parse a message without storing it
    Parse {
        /// Message text
        message: String,
    },

    /// Print the message history
    Messages,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load_or_default(std::path::Path::new(&cli.config))
        .with_context(|| format!("loading {}", cli.config))?;
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = PathBuf::from(data_dir);
    }
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(filter);
    if cli.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!(
        "Starting score-keeper v{} ({})",
        env!("CARGO_PKG_VERSION"),
        config.environment
    );

    match cli.command {
        Commands::Serve {
            host,
            port,
            memory_store,
        } => {
            let scorer = build_scorer(&config, memory_store)?;
            let state = AppState::new(scorer, message_log(&config));
            let app = build_router(state).layer(cors_layer(&config.server.cors_origin));

            let host = host.unwrap_or_else(|| config.server.host.clone());
            let port = port.unwrap_or(config.server.port);
            let addr = format!("{}:{}", host, port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            tracing::info!("Listening on http://{}", addr);
            axum::serve(listener, app).await?;
        }
        Commands::Submit {
            message,
            memory_store,
        } => {
            let scorer = build_scorer(&config, memory_store)?;
            println!("{}", scorer.reply_to(&message).await);
        }
        Commands::Parse { message } => {
            let parser = build_parser(&config)?;
            match parser.parse(&message) {
                Ok(record) => println!("{}", serde_json::to_string_pretty(&record)?),
                Err(e) => {
                    eprintln!("FormatError: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Commands::Messages => {
            let entries = message_log(&config).read().await?;
            if entries.is_empty() {
                println!("No messages yet.");
            }
            for entry in entries {
                println!("[{:?}] {}", entry.who, entry.body);
            }
        }
    }

    Ok(())
}

fn build_parser(config: &AppConfig) -> Result<MessageParser> {
    Ok(MessageParser::new(
        config.scoring.participants()?,
        config.scoring.timezone()?,
    ))
}

fn build_scorer(config: &AppConfig, memory_store: bool) -> Result<Scorer> {
    let sheet_name = config.sheets.sheet_name.clone();

    let store: Arc<dyn RangeStore> = if memory_store {
        tracing::warn!("Using an in-memory sheet; results are lost on exit");
        Arc::new(MemorySheet::with_header(sheet_name.as_str(), &REQUIRED_FIELDS))
    } else {
        config.validate_remote()?;
        let access_token = std::env::var(&config.sheets.access_token_env).with_context(|| {
            format!(
                "reading the Sheets access token from ${}",
                config.sheets.access_token_env
            )
        })?;
        Arc::new(GoogleSheetsClient::new(GoogleSheetsConfig {
            spreadsheet_id: config.sheets.spreadsheet_id.clone(),
            base_url: config.sheets.base_url.clone(),
            access_token,
            timeout_seconds: config.sheets.timeout_seconds,
        })?)
    };

    tracing::info!("Recording results in {} sheet {:?}", store.name(), sheet_name);
    Ok(Scorer::new(store, sheet_name, build_parser(config)?))
}

fn message_log(config: &AppConfig) -> MessageLog {
    let storage = StorageConfig::new(config.data_dir.clone());
    MessageLog::new(
        Arc::new(FsBlobStore::new(storage.blobs_dir())),
        config.message_log_key(),
    )
}
