//! Text-to-SQL A2A agent - main entry point

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use text2sql_a2a::config::AgentConfig;
use text2sql_a2a::observability::{init_default_logging, init_logging, LogFormat};
use text2sql_a2a::error::AgentResult;
use text2sql_a2a::pipeline::HttpPipeline;
use text2sql_a2a::protocol::{Message, TaskSendParams};
use text2sql_a2a::server::A2aServer;
use text2sql_a2a::task::{InMemoryTaskStore, TaskHandler};
use tokio::signal;
use tracing::{error, info, Level};

/// A2A task server for Text-to-SQL question answering
#[derive(Parser)]
#[command(name = "text2sql-a2a")]
#[command(about = "A2A task server for Text-to-SQL question answering")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the A2A JSON-RPC server
    Serve {
        /// Override the configured listen port
        #[arg(long, env = "A2A_PORT")]
        port: Option<u16>,
    },
    /// Validate configuration
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Submit one question and print the resulting task
    Ask {
        /// Natural-language question
        question: String,
    },
}

#[tokio::main]
async fn main() {
    // Missing .env is fine
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    match cli.verbose {
        0 => init_default_logging(),
        1 => init_logging(Level::DEBUG, log_format_from_env(), false),
        _ => init_logging(Level::TRACE, log_format_from_env(), true),
    }

    let config = match load_configuration(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    };

    let result = match cli.command {
        Commands::Serve { port } => run_server(config, port).await,
        Commands::Config { show } => handle_config_command(&config, show),
        Commands::Ask { question } => ask_once(config, question).await,
    };

    if let Err(e) = result {
        error!("Command failed: {}", e);
        process::exit(1);
    }
}

fn log_format_from_env() -> LogFormat {
    LogFormat::parse(&std::env::var("LOG_FORMAT").unwrap_or_else(|_| "json".to_string()))
}

fn load_configuration(
    config_path: &Option<PathBuf>,
) -> Result<AgentConfig, Box<dyn std::error::Error>> {
    if let Some(path) = config_path {
        info!("Loading configuration from: {}", path.display());
        return Ok(AgentConfig::load_from_file(path)?);
    }

    for path_str in ["agent.toml", "config/agent.toml"] {
        let path = PathBuf::from(path_str);
        if path.exists() {
            info!("Loading configuration from: {}", path.display());
            return Ok(AgentConfig::load_from_file(&path)?);
        }
    }

    Err("No configuration file found. Provide one with -c/--config or create agent.toml".into())
}

/// Wire the store, pipeline, and handler together
fn build_handler(config: &AgentConfig) -> AgentResult<TaskHandler> {
    let pipeline = HttpPipeline::from_agent_config(config)?;
    let store = Arc::new(InMemoryTaskStore::new());

    Ok(TaskHandler::new(store, Arc::new(pipeline)).with_pipeline_timeout(config.pipeline.timeout()))
}

async fn run_server(
    mut config: AgentConfig,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(port) = port {
        config.server.port = port;
    }

    let addr: SocketAddr = config.bind_address().parse()?;
    let handler = build_handler(&config)?;
    let server = A2aServer::new(&config, handler);

    info!(
        agent = %config.agent.name,
        version = env!("CARGO_PKG_VERSION"),
        pipeline = %config.pipeline.base_url,
        "Starting Text-to-SQL A2A agent"
    );

    server.serve(addr, shutdown_signal()).await?;

    info!("Application shutdown complete");
    Ok(())
}

/// Resolves on SIGINT or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for SIGINT: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT, shutting down gracefully..."),
        _ = terminate => info!("Received SIGTERM, shutting down gracefully..."),
    }
}

fn handle_config_command(
    config: &AgentConfig,
    show: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if show {
        println!("Current configuration:");
        println!("{}", toml::to_string_pretty(config)?);
    }

    info!("Configuration validation complete");
    Ok(())
}

async fn ask_once(config: AgentConfig, question: String) -> Result<(), Box<dyn std::error::Error>> {
    let handler = build_handler(&config)?;
    let task = handler
        .submit(TaskSendParams::new(None, Message::user_text(question)))
        .await;

    println!("{}", serde_json::to_string_pretty(&task)?);
    Ok(())
}
