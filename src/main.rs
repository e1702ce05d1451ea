//! # Doc Chat CLI (`docchat`)
//!
//! ## Usage
//!
//! ```bash
//! docchat [--config ./config/docchat.toml] <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docchat serve` | Load documents and start the HTTP server |
//! | `docchat documents` | List files currently under the document root |
//! | `docchat context` | Load documents and print a summary |
//! | `docchat ask "<message>"` | One-shot question against the loaded documents |

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use doc_chat::chat::ChatService;
use doc_chat::config::{load_config, load_config_or_default, Config};
use doc_chat::llm::create_client;
use doc_chat::loader::{list_documents, load_documents};
use doc_chat::server::run_server;

const DEFAULT_CONFIG: &str = "./config/docchat.toml";

/// Doc Chat — ask a hosted LLM questions about a folder of local documents.
///
/// Settings are read from a TOML file. When `--config` is not given and
/// `./config/docchat.toml` does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(name = "docchat", version)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server.
    ///
    /// Documents are loaded once at startup; files added later show up in
    /// `GET /documents` but not in the prompt context until restart.
    Serve {
        /// Override `[server].bind` (e.g. `0.0.0.0:8080`).
        #[arg(long)]
        bind: Option<String>,
    },

    /// List files currently under the document root.
    Documents,

    /// Load the document root and print what went into the context.
    Context,

    /// Ask a single question and print the reply.
    Ask {
        /// The question to send.
        message: String,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn resolve_config(path: Option<&PathBuf>) -> Result<Config> {
    match path {
        Some(path) => load_config(path),
        None => load_config_or_default(&PathBuf::from(DEFAULT_CONFIG)),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let mut config = resolve_config(cli.config.as_ref())?;

    match cli.command {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            run_server(&config).await?;
        }
        Commands::Documents => {
            for name in list_documents(&config.documents.root) {
                println!("{}", name);
            }
        }
        Commands::Context => {
            let report = load_documents(&config.documents);
            let context = report.context();
            println!("Root:      {}", config.documents.root.display());
            println!("Loaded:    {}", report.documents.len());
            for doc in &report.documents {
                println!("  {:<40} {:>8} chars", doc.name, doc.content.chars().count());
            }
            println!("Skipped:   {}", report.skipped.len());
            for (path, reason) in &report.skipped {
                println!("  {} ({})", path.display(), reason);
            }
            println!("Context:   {} chars", context.chars().count());
        }
        Commands::Ask { message } => {
            let client = create_client(&config.model)?;
            let context = load_documents(&config.documents).context();
            let service = ChatService::new(&context, client);
            let reply = service.handle(&message).await?;
            println!("{}", reply);
        }
    }

    Ok(())
}
