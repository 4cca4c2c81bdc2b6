use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use common::{count_valid_words, top_n, urls, words, ErrorReport, Output, PipelineError};
use std::{
    path::PathBuf,
    time::{Duration, Instant},
};
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;
use worker::{
    cancel_after, cancel_on_ctrl_c, run_pipeline, run_sequential, HttpFetcher, PipelineConfig,
};

#[derive(Parser)]
#[command(name = "client")]
#[command(about = "Ranking de palabras del banco en una lista de documentos remotos")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Descarga todas las URLs en paralelo y muestra el top de palabras
    Run {
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        tuning: TuningArgs,
    },
    /// Igual que `run` pero una URL a la vez (línea base para comparar tiempos)
    Sequential {
        #[command(flatten)]
        inputs: InputArgs,
        #[command(flatten)]
        tuning: TuningArgs,

        /// Procesar sólo las primeras N URLs
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Cuenta las palabras válidas de un archivo local, sin red
    Count {
        #[arg(value_name = "ARCHIVO")]
        file: PathBuf,

        /// Banco de palabras, una por línea
        #[arg(long = "words", env = "WORD_BANK_PATH", default_value = "data/word_bank.txt")]
        bank_path: PathBuf,

        #[arg(long, default_value_t = common::DEFAULT_TOP_N)]
        top: usize,
    },
}

#[derive(Args)]
struct InputArgs {
    /// Lista de URLs, una por línea
    #[arg(long, env = "URLS_PATH", default_value = "data/urls.txt")]
    urls: PathBuf,

    /// Banco de palabras, una por línea
    #[arg(long, env = "WORD_BANK_PATH", default_value = "data/word_bank.txt")]
    words: PathBuf,
}

/// Ajustes opcionales; lo que no venga sale de las variables de entorno.
#[derive(Args)]
struct TuningArgs {
    /// Tamaño del ranking
    #[arg(long)]
    top: Option<usize>,

    /// Requests por segundo (rate limiter global)
    #[arg(long)]
    rate: Option<u32>,

    /// Requests inmediatos permitidos antes de frenar
    #[arg(long)]
    burst: Option<u32>,

    /// Techo de workers concurrentes
    #[arg(long)]
    max_workers: Option<usize>,

    /// Timeout por request, en segundos
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Cancelar toda la corrida después de N segundos
    #[arg(long)]
    deadline_secs: Option<u64>,
}

impl TuningArgs {
    fn apply(&self, mut config: PipelineConfig) -> PipelineConfig {
        if let Some(top) = self.top {
            config.top_n = top;
        }
        if let Some(rate) = self.rate {
            config.rate_per_sec = rate;
            // si sólo cambia el rate, el burst lo sigue
            config.burst = rate;
        }
        if let Some(burst) = self.burst {
            config.burst = burst;
        }
        if let Some(max) = self.max_workers {
            config.max_workers = max;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = self.deadline_secs {
            config.deadline = Some(Duration::from_secs(secs));
        }
        config
    }
}

fn load_inputs(inputs: &InputArgs) -> Result<(Vec<String>, common::Bank)> {
    let urls = urls::load_urls(&inputs.urls)
        .with_context(|| format!("no se pudo leer {}", inputs.urls.display()))?;
    let bank = words::load_word_bank(&inputs.words)
        .with_context(|| format!("no se pudo leer {}", inputs.words.display()))?;
    info!("{} urls, {} palabras en el banco", urls.len(), bank.len());
    Ok((urls, bank))
}

fn cancellation(config: &PipelineConfig) -> CancellationToken {
    let cancel = CancellationToken::new();
    cancel_on_ctrl_c(cancel.clone());
    if let Some(deadline) = config.deadline {
        cancel_after(cancel.clone(), deadline);
    }
    cancel
}

/// Imprime el ranking en stdout, o el error estructurado en stderr y sale con 1.
fn report(result: Result<Output, PipelineError>, elapsed: Duration) -> Result<()> {
    match result {
        Ok(output) => {
            eprintln!("tiempo de procesamiento: {:?}", elapsed);
            println!("{}", serde_json::to_string_pretty(&output)?);
            Ok(())
        }
        Err(e) => {
            let err = ErrorReport::from(&e);
            eprintln!("{}", serde_json::to_string_pretty(&err)?);
            std::process::exit(1);
        }
    }
}

pub async fn run() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("client=info,worker=info,reqwest=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { inputs, tuning } => {
            let config = tuning.apply(PipelineConfig::from_env());
            let (urls, bank) = load_inputs(&inputs)?;
            let cancel = cancellation(&config);

            let start = Instant::now();
            let result = run_pipeline(urls, bank, &config, cancel).await;
            report(result, start.elapsed())?;
        }

        Commands::Sequential {
            inputs,
            tuning,
            limit,
        } => {
            let config = tuning.apply(PipelineConfig::from_env());
            let (mut urls, bank) = load_inputs(&inputs)?;
            if let Some(limit) = limit {
                urls.truncate(limit);
            }
            let cancel = cancellation(&config);
            let fetcher = HttpFetcher::new(&config)?;

            let start = Instant::now();
            let result = run_sequential(&urls, &bank, &config, &cancel, &fetcher).await;
            report(result, start.elapsed())?;
        }

        Commands::Count {
            file,
            bank_path,
            top,
        } => {
            let bank = words::load_word_bank(&bank_path)
                .with_context(|| format!("no se pudo leer {}", bank_path.display()))?;
            let text = std::fs::read_to_string(&file)
                .with_context(|| format!("no se pudo leer {}", file.display()))?;

            let counts = count_valid_words(&text, &bank);
            let output = Output {
                top: top_n(&counts, top),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}
