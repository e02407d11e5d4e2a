//! Narwhal gateway binary entry point.
//!
//! Loads TOML configuration, constructs the storage backend and the
//! HTTP provider, seeds the project metadata, and runs a line-oriented
//! chat loop on stdin until EOF or ctrl-c.

use anyhow::Result;
use llm::{Client, HttpProvider};
use narwhal_gateway::{
    Backend, Gateway, GatewayConfig, GenerationParams, StorageBackend, StorageKind,
};
use store::{ActiveModel, MemoryStore, ModelConfig, ProjectStore, SqliteStore, StaticCredentials};
use tokio::io::AsyncBufReadExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing from RUST_LOG (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load configuration.
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "gateway.toml".to_string());
    let config = GatewayConfig::load(&config_path)?;
    tracing::info!("loaded configuration from {config_path}");

    // Construct the shared collaborators.
    let credentials = StaticCredentials::new(&config.llm.api_key);
    let models = ActiveModel::new(ModelConfig::new(config.llm.model.clone()));
    let params = GenerationParams::from(&config.llm);
    let provider = match &config.llm.base_url {
        Some(base_url) => HttpProvider::with_base_url(Client::new(), base_url),
        None => HttpProvider::new(Client::new()),
    };
    tracing::info!("provider initialized for model {}", config.llm.model);

    // Construct the storage backend and run.
    match config.storage.backend {
        StorageKind::InMemory => {
            tracing::info!("using in-memory storage");
            let backend = StorageBackend::new(credentials, models, MemoryStore::new());
            let gateway = Gateway::new(backend, provider, params)
                .with_cache_capacity(config.cache.capacity);
            run(gateway, &config).await
        }
        StorageKind::Sqlite => {
            let path = config.storage.path.as_deref().unwrap_or("narwhal.db");
            tracing::info!("using sqlite storage at {path}");
            let backend = StorageBackend::new(credentials, models, SqliteStore::open(path)?);
            let gateway = Gateway::new(backend, provider, params)
                .with_cache_capacity(config.cache.capacity);
            run(gateway, &config).await
        }
    }
}

/// Seed the project and chat on stdin until EOF or ctrl-c.
async fn run<B: Backend>(gateway: Gateway<B, HttpProvider>, config: &GatewayConfig) -> Result<()> {
    let conversation = config.project.id.as_str();
    gateway
        .backend()
        .storage()
        .put(conversation, &config.project.snapshot())
        .await?;
    tracing::info!("seeded project metadata for {conversation}");

    println!("narwhal gateway — project {conversation} (EOF or ctrl-c to exit)");
    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let text = line.trim();
                if text.is_empty() {
                    continue;
                }
                match gateway.send_message(conversation, text).await {
                    Ok(completion) => println!("{}", completion.reply),
                    Err(error) => eprintln!("error: {error}"),
                }
            }
        }
    }

    tracing::info!("gateway shut down");
    Ok(())
}
