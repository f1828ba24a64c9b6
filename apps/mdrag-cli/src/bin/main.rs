use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use mdrag_cli::settings::AppSettings;
use mdrag_cli::{api, repl, telemetry};
use mdrag_core::config::Config;
use mdrag_qa::QueryService;

#[derive(Parser, Debug)]
#[command(name = "mdrag")]
#[command(about = "Ask questions about a directory of Markdown documents")]
struct Cli {
    /// Corpus directory (overrides `corpus.root`)
    #[arg(long, global = true)]
    corpus: Option<PathBuf>,

    /// API key for the OpenAI-compatible providers
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Index the corpus and answer questions interactively
    Ask {
        /// Answer a single question and exit
        question: Option<String>,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },
}

fn spinner(message: String) -> ProgressBar {
    let sp = ProgressBar::new_spinner();
    sp.set_style(
        ProgressStyle::with_template("{spinner:.green} {msg} [{elapsed}]").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    sp.enable_steady_tick(Duration::from_millis(80));
    sp.set_message(message);
    sp
}

async fn initialize_with_progress(service: &QueryService, root: &std::path::Path) -> Result<()> {
    let sp = spinner(format!("Indexing {}", root.display()));
    let outcome = service.initialize(root).await;
    sp.finish_and_clear();
    outcome.with_context(|| format!("Failed to index {}", root.display()))?;
    tracing::info!(chunks = service.chunk_count().unwrap_or(0), root = %root.display(), "index ready");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for ctrl-c");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    let cli = Cli::parse();

    let config = Config::load().map_err(|e| {
        eprintln!("Error loading config: {}", e);
        e
    })?;
    let settings = AppSettings::from_config(&config)?;
    let root = cli.corpus.clone().unwrap_or_else(|| settings.corpus_root(config.base_dir()));
    let service = settings.build_service(cli.api_key.clone())?;

    match cli.command.unwrap_or(Command::Ask { question: None }) {
        Command::Ask { question } => {
            initialize_with_progress(&service, &root).await?;
            match question {
                Some(q) => {
                    let result = service.answer(&q).await?;
                    repl::print_result(&mut io::stdout().lock(), &result)?;
                }
                None => {
                    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
                    repl::run(&service, stdin, io::stdout().lock()).await?;
                }
            }
        }
        Command::Serve { host, port } => {
            let host = host.unwrap_or(settings.server.host.clone());
            let port = port.unwrap_or(settings.server.port);
            let listener = TcpListener::bind((host.as_str(), port))
                .await
                .with_context(|| format!("Failed to bind {host}:{port}"))?;

            let service = Arc::new(service);
            let background = Arc::clone(&service);
            tokio::spawn(async move {
                tracing::info!(root = %root.display(), "indexing corpus");
                match background.initialize(&root).await {
                    Ok(()) => tracing::info!(chunks = background.chunk_count().unwrap_or(0), "index ready"),
                    Err(e) => tracing::error!(error = %e, "indexing failed; queries will report NOT_INITIALIZED"),
                }
            });

            let app = api::router(service, settings.server.enable_cors);
            api::serve(listener, app, shutdown_signal()).await?;
        }
    }
    Ok(())
}
