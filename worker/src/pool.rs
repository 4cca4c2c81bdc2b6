use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};

use common::{count_valid_words, Bank, PipelineError, WordCounts};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{fetcher::Fetch, rate_limit::RateLimiter};

/// Cola de URLs pendientes compartida por todos los workers.
/// Se llena completa antes de arrancar, así el despacho nunca bloquea.
#[derive(Debug, Default)]
pub struct WorkQueue {
    urls: Mutex<VecDeque<String>>,
}

impl WorkQueue {
    pub fn new<I>(urls: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            urls: Mutex::new(urls.into_iter().collect()),
        }
    }

    /// Saca la siguiente URL; el lock dura sólo el `pop_front`.
    pub fn next(&self) -> Option<String> {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Registro de "primer error gana": sólo se guarda el primero que llega.
#[derive(Debug, Default)]
pub struct FirstError {
    slot: Mutex<Option<PipelineError>>,
}

impl FirstError {
    /// Devuelve `true` si este error quedó registrado como el primero.
    pub fn record(&self, err: PipelineError) -> bool {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.is_some() {
            return false;
        }
        *slot = Some(err);
        true
    }

    pub fn is_set(&self) -> bool {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn take(&self) -> Option<PipelineError> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take()
    }
}

/// Métricas de un worker al terminar.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub worker_id: usize,
    pub fetched: usize,
    pub bytes: usize,
}

/// Lo que comparten todos los workers de una corrida.
#[derive(Clone)]
pub struct WorkerContext {
    pub queue: Arc<WorkQueue>,
    pub limiter: Arc<RateLimiter>,
    pub bank: Arc<Bank>,
    pub failure: Arc<FirstError>,
    pub cancel: CancellationToken,
    pub results: UnboundedSender<WordCounts>,
}

/// Loop de un worker:
/// 1. si hay cancelación, la reporta y termina
/// 2. si otro worker ya falló, termina sin tomar más URLs
/// 3. saca la siguiente URL (cola vacía => termina)
/// 4. espera permiso del rate limiter
/// 5. descarga, cuenta palabras válidas y manda el conteo parcial
///
/// Cualquier error queda en `failure` y corta este worker; los demás
/// terminan su descarga en curso y no toman URLs nuevas.
pub async fn run_worker<F: Fetch>(worker_id: usize, fetcher: F, ctx: WorkerContext) -> WorkerReport {
    let mut report = WorkerReport {
        worker_id,
        ..WorkerReport::default()
    };

    loop {
        if ctx.cancel.is_cancelled() {
            debug!("worker {} vio la cancelación", worker_id);
            ctx.failure.record(PipelineError::Cancelled);
            break;
        }

        if ctx.failure.is_set() {
            debug!("worker {} se detiene: otro worker ya falló", worker_id);
            break;
        }

        let Some(url) = ctx.queue.next() else {
            break;
        };

        if let Err(e) = ctx.limiter.acquire(&ctx.cancel).await {
            ctx.failure.record(e);
            break;
        }

        let body = match fetcher.fetch(&url, &ctx.cancel).await {
            Ok(body) => body,
            Err(e) => {
                if !e.is_cancelled() {
                    warn!("worker {} falló descargando {}: {}", worker_id, url, e);
                }
                ctx.failure.record(e);
                break;
            }
        };

        report.fetched += 1;
        report.bytes += body.len();

        // contar es CPU puro: va al pool de bloqueo para no frenar el runtime
        let bank = Arc::clone(&ctx.bank);
        let counted = tokio::task::spawn_blocking(move || {
            count_valid_words(&String::from_utf8_lossy(&body), &bank)
        })
        .await;

        let partial = match counted {
            Ok(partial) => partial,
            Err(e) => {
                warn!("worker {} no pudo contar {}: {:?}", worker_id, url, e);
                ctx.failure.record(PipelineError::Worker(e.to_string()));
                break;
            }
        };

        debug!(
            "worker {} contó {} palabras distintas en {}",
            worker_id,
            partial.len(),
            url
        );

        if ctx.results.send(partial).is_err() {
            // el colector ya no escucha
            break;
        }
    }

    report
}
