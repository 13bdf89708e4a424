use anyhow::Result;
use assistant_cli::{import, repl};
use assistant_core::chatlog::{ChatLogStore, SqliteChatLog};
use assistant_core::config::{self, AppConfig};
use assistant_core::conversation::Session;
use assistant_core::models::RecordKind;
use assistant_core::pipeline;
use assistant_core::service::{InboundMessage, LogsResponse};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Build { json } => run_build(cfg, json).await,
        Commands::Ask {
            query,
            sender,
            json,
        } => run_ask(cfg, query, sender, json).await,
        Commands::Chat { sender } => run_chat(cfg, sender).await,
        Commands::Logs => run_logs(cfg).await,
        Commands::Import {
            products,
            knowledge,
        } => run_import(cfg, products, knowledge).await,
    }
}

#[derive(Parser)]
#[command(name = "storefront-assistant")]
#[command(about = "Retrieval-grounded store assistant", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build both retrieval indexes and report their sizes
    Build {
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Answer a single message
    Ask {
        /// Message text
        query: String,
        /// Sender recorded in the chat log
        #[arg(long)]
        sender: Option<String>,
        /// Print the outbound envelope as JSON
        #[arg(long)]
        json: bool,
    },
    /// Interactive chat over stdin/stdout, one message per line
    Chat {
        /// Sender for lines that do not carry one
        #[arg(long)]
        sender: Option<String>,
    },
    /// Print the chat log, oldest first
    Logs,
    /// Import products and knowledge entries from JSON arrays
    Import {
        /// JSON file with an array of products
        #[arg(long)]
        products: Option<PathBuf>,
        /// JSON file with an array of {question, answer} entries
        #[arg(long)]
        knowledge: Option<PathBuf>,
    },
}

fn cli_session() -> Session {
    Session::new(format!("cli-{}", std::process::id()))
}

async fn run_build(cfg: AppConfig, json: bool) -> Result<()> {
    let runtime = pipeline::start(&cfg).await?;
    let indexes = runtime.service.assistant().indexes();
    let catalog = indexes.size(RecordKind::Catalog);
    let knowledge = indexes.size(RecordKind::Knowledge);
    if json {
        let summary = serde_json::json!({
            "status": "ok",
            "catalog": catalog,
            "knowledge": knowledge,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        let show = |n: Option<usize>| n.map_or_else(|| "absent".to_string(), |n| n.to_string());
        println!(
            "build: catalog index {}, knowledge index {}",
            show(catalog),
            show(knowledge)
        );
    }
    Ok(())
}

async fn run_ask(cfg: AppConfig, query: String, sender: Option<String>, json: bool) -> Result<()> {
    let runtime = pipeline::start(&cfg).await?;
    let mut session = cli_session();
    let outbound = runtime
        .service
        .handle(
            &mut session,
            InboundMessage {
                message: query,
                sender,
            },
        )
        .await;
    if json {
        println!("{}", serde_json::to_string(&outbound)?);
    } else {
        println!("{}", outbound.message);
    }
    Ok(())
}

async fn run_chat(cfg: AppConfig, sender: Option<String>) -> Result<()> {
    let runtime = pipeline::start(&cfg).await?;
    let mut session = cli_session();
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let answered = repl::run_session(
        &runtime.service,
        &mut session,
        stdin,
        tokio::io::stdout(),
        sender.as_deref(),
    )
    .await?;
    eprintln!("session {} closed after {} message(s)", session.id(), answered);
    Ok(())
}

async fn run_logs(cfg: AppConfig) -> Result<()> {
    let pool = storage::connect(&cfg.database.path).await?;
    storage::migrate(&pool).await?;
    let logs = SqliteChatLog::new(pool).list().await?;
    println!("{}", serde_json::to_string_pretty(&LogsResponse { logs })?);
    Ok(())
}

async fn run_import(
    cfg: AppConfig,
    products: Option<PathBuf>,
    knowledge: Option<PathBuf>,
) -> Result<()> {
    anyhow::ensure!(
        products.is_some() || knowledge.is_some(),
        "nothing to import: pass --products and/or --knowledge"
    );
    let pool = storage::connect(&cfg.database.path).await?;
    storage::migrate(&pool).await?;
    let summary =
        import::import_records(&pool, products.as_deref(), knowledge.as_deref()).await?;
    println!(
        "import: {} product(s), {} knowledge entries",
        summary.products, summary.knowledge
    );
    Ok(())
}
