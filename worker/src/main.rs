use anyhow::{Context, Result};
use common::{urls, words};
use std::{env, time::Instant};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker::{cancel_after, cancel_on_ctrl_c, run_pipeline, PipelineConfig};

const DEFAULT_URLS_PATH: &str = "data/urls.txt";
const DEFAULT_WORD_BANK_PATH: &str = "data/word_bank.txt";

/// Rutas de entrada:
/// - URLS_PATH: una URL por línea (default data/urls.txt)
/// - WORD_BANK_PATH: una palabra por línea (default data/word_bank.txt)
fn input_paths() -> (String, String) {
    let urls = env::var("URLS_PATH").unwrap_or_else(|_| DEFAULT_URLS_PATH.to_string());
    let bank = env::var("WORD_BANK_PATH").unwrap_or_else(|_| DEFAULT_WORD_BANK_PATH.to_string());
    (urls, bank)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("worker=info,reqwest=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = PipelineConfig::from_env();
    let (urls_path, bank_path) = input_paths();

    let hostname = hostname::get()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string();

    let urls = urls::load_urls(&urls_path)
        .with_context(|| format!("no se pudo leer la lista de urls {}", urls_path))?;
    let bank = words::load_word_bank(&bank_path)
        .with_context(|| format!("no se pudo leer el banco de palabras {}", bank_path))?;

    info!(
        "worker en {}: {} urls, {} palabras en el banco",
        hostname,
        urls.len(),
        bank.len()
    );

    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());
    if let Some(deadline) = config.deadline {
        cancel_after(cancel.clone(), deadline);
    }

    let start = Instant::now();
    let output = run_pipeline(urls, bank, &config, cancel)
        .await
        .context("el pipeline falló")?;
    info!("tiempo de procesamiento: {:?}", start.elapsed());

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
