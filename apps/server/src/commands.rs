//! CLI command definitions, routing, and tracing setup.

use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr};
use tracing::info;

use transdoc_core::{DocumentBuilder, Pipeline};
use transdoc_google::{GeminiGenerator, GoogleDocsClient, HtmlTitleFetcher};
use transdoc_response::{Lexicon, ResponseParser};
use transdoc_shared::{
    AppConfig, init_config, load_config, load_config_from, resolve_token, validate_service_config,
};

use crate::http;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// transdoc: translate and summarize web text into shared Google Docs.
#[derive(Parser)]
#[command(
    name = "transdoc",
    version,
    about = "Translate and summarize web text into formatted, shared Google Docs.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Config file (defaults to ~/.transdoc/transdoc.toml).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run the HTTP service.
    Serve {
        /// Address to bind (overrides `server.host`).
        #[arg(long)]
        host: Option<String>,

        /// Port to bind (overrides `server.port`).
        #[arg(long, env = "PORT")]
        port: Option<u16>,
    },

    /// Render model output into a document plan and print it as JSON.
    Render {
        /// Source URL shown in the Source section.
        #[arg(long)]
        url: String,

        /// Page title shown before the URL.
        #[arg(long, default_value = "")]
        title: String,

        /// File holding the model output (reads stdin when omitted).
        file: Option<PathBuf>,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
///
/// Logs go to stderr so `render` output on stdout stays machine-readable.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "transdoc=info,tower_http=info",
        1 => "transdoc=debug,tower_http=debug",
        _ => "transdoc=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { host, port } => cmd_serve(config, host, port).await,
        Command::Render { url, title, file } => cmd_render(&config, &url, &title, file),
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

fn resolve_config(path: Option<&std::path::Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };
    Ok(config)
}

// ---------------------------------------------------------------------------
// Command implementations
// ---------------------------------------------------------------------------

async fn cmd_serve(mut config: AppConfig, host: Option<String>, port: Option<u16>) -> Result<()> {
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }
    validate_service_config(&config)?;

    let generator = GeminiGenerator::new(
        &config.generation,
        resolve_token(&config.generation.access_token_env)?,
    )?;
    let documents = GoogleDocsClient::new(
        &config.documents,
        resolve_token(&config.documents.access_token_env)?,
    )?;
    let titles = HtmlTitleFetcher::new(&config.title)?;

    let pipeline = Pipeline::new(
        generator,
        documents,
        titles,
        ResponseParser::new(Lexicon::from(&config.lexicon)),
        DocumentBuilder::new(config.lexicon.keywords_label.clone()),
        config.documents.share_with.clone(),
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .wrap_err_with(|| format!("failed to bind {addr}"))?;
    info!(%addr, model = %config.generation.model, "transdoc listening");

    axum::serve(listener, http::router(Arc::new(pipeline)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

fn cmd_render(config: &AppConfig, url: &str, title: &str, file: Option<PathBuf>) -> Result<()> {
    let raw = match file {
        Some(path) => std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .wrap_err("failed to read stdin")?;
            buf
        }
    };

    println!("{}", render_plan(config, &raw, url, title)?);
    Ok(())
}

/// Parse model output and lay it out as a pretty-printed JSON plan.
fn render_plan(config: &AppConfig, raw: &str, url: &str, title: &str) -> Result<String> {
    let parser = ResponseParser::new(Lexicon::from(&config.lexicon));
    let blocks = parser.parse(raw)?;
    let plan = DocumentBuilder::new(config.lexicon.keywords_label.clone()).build(&blocks, url, title);
    info!(fingerprint = %plan.fingerprint(), "plan rendered");
    Ok(serde_json::to_string_pretty(&plan)?)
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let toml_str = toml::to_string_pretty(config)?;
    println!("{toml_str}");
    Ok(())
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
