use std::{
    sync::{Arc, Mutex, PoisonError},
    time::{Duration, Instant},
};

use common::{count_valid_words, top_n, Aggregator, Bank, Output, PipelineError};
use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    config::PipelineConfig,
    fetcher::{Fetch, HttpFetcher},
    pool::{run_worker, FirstError, WorkQueue, WorkerContext},
    rate_limit::RateLimiter,
};

/// Estados de una corrida.
///
/// Pending -> Dispatching -> Collecting -> Finalizing -> Succeeded | Failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Pending,
    /// Cargando la cola y lanzando workers.
    Dispatching,
    /// Sumando conteos parciales mientras los workers corren.
    Collecting,
    /// Todos los workers terminaron; se esperan sus handles.
    Finalizing,
    Succeeded,
    Failed,
}

/// Driver del pipeline: arma la cola, el pool de workers y el agregador,
/// y devuelve el ranking completo o el primer error observado.
pub struct Pipeline {
    config: PipelineConfig,
    state: Mutex<PipelineState>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            config,
            state: Mutex::new(PipelineState::Pending),
        }
    }

    pub fn state(&self) -> PipelineState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, next: PipelineState) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        debug!("pipeline {:?} -> {:?}", *state, next);
        *state = next;
    }

    /// Corre el pipeline completo. `make_fetcher` se llama una vez por worker,
    /// así ningún worker comparte conexiones con otro.
    pub async fn run<F, M>(
        &self,
        urls: Vec<String>,
        bank: Arc<Bank>,
        cancel: CancellationToken,
        make_fetcher: M,
    ) -> Result<Output, PipelineError>
    where
        F: Fetch,
        M: Fn() -> Result<F, PipelineError>,
    {
        let start = Instant::now();
        let result = self.drive(urls, bank, cancel, make_fetcher).await;

        match &result {
            Ok(out) => {
                self.transition(PipelineState::Succeeded);
                info!(
                    "pipeline terminado en {:?}: {} palabras en el ranking",
                    start.elapsed(),
                    out.top.len()
                );
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                warn!("pipeline falló tras {:?}: {}", start.elapsed(), e);
            }
        }

        result
    }

    async fn drive<F, M>(
        &self,
        urls: Vec<String>,
        bank: Arc<Bank>,
        cancel: CancellationToken,
        make_fetcher: M,
    ) -> Result<Output, PipelineError>
    where
        F: Fetch,
        M: Fn() -> Result<F, PipelineError>,
    {
        self.transition(PipelineState::Dispatching);

        let total_urls = urls.len();
        let worker_count = self.config.worker_count(total_urls);
        let limiter = Arc::new(RateLimiter::new(self.config.rate_per_sec, self.config.burst)?);

        // todos los fetchers antes de lanzar nada: si uno falla no queda nadie corriendo
        let fetchers = (0..worker_count)
            .map(|_| make_fetcher())
            .collect::<Result<Vec<F>, PipelineError>>()?;

        info!(
            "procesando {} urls con {} workers (rate={}/s burst={})",
            total_urls,
            worker_count,
            limiter.rate_per_sec(),
            limiter.burst()
        );

        let failure = Arc::new(FirstError::default());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let ctx = WorkerContext {
            queue: Arc::new(WorkQueue::new(urls)),
            limiter,
            bank,
            failure: Arc::clone(&failure),
            cancel,
            results: tx,
        };

        let mut workers = JoinSet::new();
        for (worker_id, fetcher) in fetchers.into_iter().enumerate() {
            workers.spawn(run_worker(worker_id, fetcher, ctx.clone()));
        }
        // el canal se cierra cuando el último worker suelta su sender
        drop(ctx);

        self.transition(PipelineState::Collecting);

        let aggregator = Aggregator::new();
        let mut discarded = 0usize;
        while let Some(partial) = rx.recv().await {
            if failure.is_set() {
                discarded += 1;
                continue;
            }
            aggregator.merge(partial);
        }

        self.transition(PipelineState::Finalizing);

        let mut fetched = 0usize;
        let mut bytes = 0usize;
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(report) => {
                    debug!(
                        "worker {} terminó: {} documentos, {} bytes",
                        report.worker_id, report.fetched, report.bytes
                    );
                    fetched += report.fetched;
                    bytes += report.bytes;
                }
                Err(e) => {
                    warn!("worker terminó con error de join: {:?}", e);
                    failure.record(PipelineError::Worker(e.to_string()));
                }
            }
        }

        if discarded > 0 {
            debug!("{} conteos parciales descartados tras el primer error", discarded);
        }

        if let Some(err) = failure.take() {
            return Err(err);
        }

        info!(
            "{} documentos descargados ({} bytes), {} conteos sumados",
            fetched,
            bytes,
            aggregator.documents()
        );

        // los workers ya terminaron: el agregador no tiene más dueños
        let counts = aggregator.into_counts();
        Ok(Output {
            top: top_n(&counts, self.config.top_n),
        })
    }
}

/// Corre el pipeline concurrente con fetchers HTTP.
pub async fn run_pipeline(
    urls: Vec<String>,
    bank: Bank,
    config: &PipelineConfig,
    cancel: CancellationToken,
) -> Result<Output, PipelineError> {
    let pipeline = Pipeline::new(config.clone());
    pipeline
        .run(urls, Arc::new(bank), cancel, || HttpFetcher::new(config))
        .await
}

/// Versión secuencial: una URL a la vez, mismo rate limiter, mismo conteo y
/// misma regla de cortar en el primer error. Sirve de línea base para medir.
pub async fn run_sequential<F: Fetch>(
    urls: &[String],
    bank: &Bank,
    config: &PipelineConfig,
    cancel: &CancellationToken,
    fetcher: &F,
) -> Result<Output, PipelineError> {
    let limiter = RateLimiter::new(config.rate_per_sec, config.burst)?;
    let aggregator = Aggregator::new();
    let start = Instant::now();

    for url in urls {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }
        limiter.acquire(cancel).await?;
        let body = fetcher.fetch(url, cancel).await?;
        aggregator.merge(count_valid_words(&String::from_utf8_lossy(&body), bank));
    }

    info!(
        "corrida secuencial de {} urls en {:?}",
        urls.len(),
        start.elapsed()
    );

    Ok(Output {
        top: aggregator.top_n(config.top_n),
    })
}

/// Cancela `cancel` cuando pasa `after`.
pub fn cancel_after(cancel: CancellationToken, after: Duration) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(after) => {
                warn!("se cumplió el plazo de {:?}, cancelando", after);
                cancel.cancel();
            }
        }
    });
}

/// Cancela `cancel` al recibir Ctrl-C.
pub fn cancel_on_ctrl_c(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                if res.is_ok() {
                    warn!("Ctrl-C recibido, cancelando");
                    cancel.cancel();
                }
            }
        }
    });
}
