use std::num::NonZeroU32;

use common::PipelineError;
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota,
};
use tokio_util::sync::CancellationToken;

type DirectLimiter = governor::RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter global (token bucket) compartido por todos los workers.
///
/// Emite como máximo `rate_per_sec` permisos por segundo, con hasta `burst`
/// permisos inmediatos antes de empezar a frenar. Los permisos no se
/// devuelven: es una compuerta, no un pool de recursos.
pub struct RateLimiter {
    inner: DirectLimiter,
    rate_per_sec: NonZeroU32,
    burst: NonZeroU32,
}

impl RateLimiter {
    pub fn new(rate_per_sec: u32, burst: u32) -> Result<Self, PipelineError> {
        let rate_per_sec = NonZeroU32::new(rate_per_sec).ok_or_else(|| {
            PipelineError::InvalidInput("el rate limit debe ser mayor a 0".to_string())
        })?;
        let burst = NonZeroU32::new(burst).ok_or_else(|| {
            PipelineError::InvalidInput("el burst debe ser mayor a 0".to_string())
        })?;

        let quota = Quota::per_second(rate_per_sec).allow_burst(burst);

        Ok(Self {
            inner: DirectLimiter::direct(quota),
            rate_per_sec,
            burst,
        })
    }

    /// Espera un permiso. Si `cancel` se dispara antes o durante la espera,
    /// devuelve `Cancelled` sin consumir permiso.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Result<(), PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(PipelineError::Cancelled),
            _ = self.inner.until_ready() => Ok(()),
        }
    }

    #[cfg(test)]
    fn try_acquire(&self) -> bool {
        self.inner.check().is_ok()
    }

    pub fn rate_per_sec(&self) -> u32 {
        self.rate_per_sec.get()
    }

    pub fn burst(&self) -> u32 {
        self.burst.get()
    }
}
