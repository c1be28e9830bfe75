//! LureCoach server binary entry point.

mod server;

use std::sync::Arc;

use clap::Parser;

use lurecoach_core::chat::ChatEngine;
use lurecoach_core::dataset::{load_records, ExamplePool};
use lurecoach_core::llm_client::GeminiClient;
use lurecoach_core::prompts::{PersonaTemplates, PromptBuilder};

use crate::server::ChatServer;

/// LureCoach - catphishing awareness chat trainer.
#[derive(Parser, Debug)]
#[command(name = "lurecoach-server", version, about)]
struct Args {
    /// Port to listen on
    #[arg(short, long, default_value_t = 8780)]
    port: u16,

    /// Path to the JSONL scam-dialogue dataset
    #[arg(short, long, default_value = "data/scam_dataset.jsonl")]
    dataset: String,

    /// Model used for roleplay and augmentation
    #[arg(short, long, default_value = "gemini-2.5-flash")]
    model: String,

    /// Few-shot examples sampled into each prompt
    #[arg(long, default_value_t = 4)]
    few_shots: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let api_key = std::env::var("GEMINI_API_KEY")
        .map_err(|_| anyhow::anyhow!("GEMINI_API_KEY environment variable is not set"))?;

    let records = load_records(std::path::Path::new(&args.dataset));
    let pool = ExamplePool::from_records(&records);
    tracing::info!(dataset = %args.dataset, examples = pool.len(), "few-shot pool ready");

    let client = Arc::new(GeminiClient::new(api_key));
    let builder = PromptBuilder::new(pool, PersonaTemplates::default());
    let engine = Arc::new(
        ChatEngine::new(builder, client.clone(), args.model.clone())
            .with_few_shot_count(args.few_shots),
    );

    tracing::info!(port = args.port, model = %args.model, "lurecoach-server starting");
    let server = ChatServer::new(engine, client, args.model, args.port);
    server.start().await
}
