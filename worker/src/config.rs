use std::{env, time::Duration};

use common::DEFAULT_TOP_N;

pub const DEFAULT_WORKER_MULTIPLIER: usize = 4;
pub const DEFAULT_MAX_WORKERS: usize = 64;
pub const DEFAULT_RATE_LIMIT_PER_SEC: u32 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("wordbank-worker/", env!("CARGO_PKG_VERSION"));

/// Parámetros de una corrida del pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Workers por CPU.
    pub worker_multiplier: usize,
    /// Techo de workers sin importar cuántas CPUs haya.
    pub max_workers: usize,
    /// Permisos por segundo del rate limiter global.
    pub rate_per_sec: u32,
    /// Permisos que se pueden emitir de golpe antes de frenar.
    pub burst: u32,
    pub top_n: usize,
    pub request_timeout: Duration,
    /// Si viene, la corrida se cancela al cumplirse este plazo.
    pub deadline: Option<Duration>,
    pub user_agent: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            worker_multiplier: DEFAULT_WORKER_MULTIPLIER,
            max_workers: DEFAULT_MAX_WORKERS,
            rate_per_sec: DEFAULT_RATE_LIMIT_PER_SEC,
            burst: DEFAULT_RATE_LIMIT_PER_SEC,
            top_n: DEFAULT_TOP_N,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            deadline: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

fn parsed<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    lookup(key).and_then(|s| s.trim().parse::<T>().ok())
}

impl PipelineConfig {
    /// Lee la configuración desde variables de entorno:
    /// WORKER_MULTIPLIER, MAX_WORKERS, RATE_LIMIT_PER_SEC, RATE_LIMIT_BURST,
    /// TOP_N, REQUEST_TIMEOUT_SECS, DEADLINE_SECS, USER_AGENT.
    /// Valores ausentes o que no parsean usan el default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let rate_per_sec = parsed(&lookup, "RATE_LIMIT_PER_SEC").unwrap_or(defaults.rate_per_sec);
        // sin burst explícito, se permite un segundo completo de permisos de golpe
        let burst = parsed(&lookup, "RATE_LIMIT_BURST").unwrap_or(rate_per_sec);

        Self {
            worker_multiplier: parsed(&lookup, "WORKER_MULTIPLIER")
                .unwrap_or(defaults.worker_multiplier),
            max_workers: parsed(&lookup, "MAX_WORKERS").unwrap_or(defaults.max_workers),
            rate_per_sec,
            burst,
            top_n: parsed(&lookup, "TOP_N").unwrap_or(defaults.top_n),
            request_timeout: parsed(&lookup, "REQUEST_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            deadline: parsed(&lookup, "DEADLINE_SECS").map(Duration::from_secs),
            user_agent: lookup("USER_AGENT")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.user_agent),
        }
    }

    /// Cantidad de workers para `urls` URLs en esta máquina.
    pub fn worker_count(&self, urls: usize) -> usize {
        self.worker_count_for(num_cpus::get(), urls)
    }

    /// CPUs × multiplicador, con techo `max_workers`, nunca más que URLs
    /// y siempre al menos uno.
    pub fn worker_count_for(&self, cpus: usize, urls: usize) -> usize {
        cpus.saturating_mul(self.worker_multiplier)
            .min(self.max_workers)
            .min(urls)
            .max(1)
    }
}
