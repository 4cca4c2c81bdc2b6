use std::future::Future;

use common::{error::error_chain, PipelineError};
use reqwest::{Client, Url};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::PipelineConfig;

/// Una descarga: exactamente un request por llamada, sin reintentos.
///
/// Las implementaciones deben abortar en cuanto `cancel` se dispare,
/// tanto antes como durante el request.
pub trait Fetch: Send + Sync + 'static {
    fn fetch(
        &self,
        url: &str,
        cancel: &CancellationToken,
    ) -> impl Future<Output = Result<Vec<u8>, PipelineError>> + Send;
}

/// Fetcher HTTP sobre reqwest. Cada worker crea el suyo, con su propio
/// cliente y pool de conexiones.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| PipelineError::Network(error_chain(&e)))?;

        Ok(Self { client })
    }
}

fn parse_url(url: &str) -> Result<Url, PipelineError> {
    let parsed = Url::parse(url)
        .map_err(|e| PipelineError::InvalidInput(format!("url inválida {:?}: {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(PipelineError::InvalidInput(format!(
            "esquema no soportado {:?} en {}",
            other, url
        ))),
    }
}

fn network_error(url: &str, err: &reqwest::Error) -> PipelineError {
    PipelineError::Network(format!("{}: {}", url, error_chain(err)))
}

impl Fetch for HttpFetcher {
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Vec<u8>, PipelineError> {
        if cancel.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        let target = parse_url(url)?;

        let resp = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            res = self.client.get(target).send() => res.map_err(|e| network_error(url, &e))?,
        };

        // un status no exitoso no es error: el body (ej: página de error) se cuenta igual
        let status = resp.status();
        if !status.is_success() {
            debug!("{} respondió status {}, se cuenta el body igual", url, status);
        }

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(PipelineError::Cancelled),
            res = resp.bytes() => res.map_err(|e| network_error(url, &e))?,
        };

        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{closed_addr, serve, test_router};
    use std::time::{Duration, Instant};

    fn fetcher() -> HttpFetcher {
        HttpFetcher::new(&PipelineConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn fetch_devuelve_el_body() {
        let addr = serve(test_router()).await;
        let cancel = CancellationToken::new();

        let body = fetcher()
            .fetch(&format!("http://{}/hello", addr), &cancel)
            .await
            .unwrap();

        assert_eq!(body, b"hello hello world".to_vec());
    }

    #[tokio::test]
    async fn fetch_status_500_no_es_error() {
        let addr = serve(test_router()).await;
        let cancel = CancellationToken::new();

        let body = fetcher()
            .fetch(&format!("http://{}/error", addr), &cancel)
            .await
            .unwrap();

        assert_eq!(String::from_utf8(body).unwrap(), "Internal Server Error");
    }

    #[tokio::test]
    async fn fetch_url_invalida_es_invalid_input() {
        let cancel = CancellationToken::new();

        let res = fetcher().fetch("no es una url", &cancel).await;
        assert!(matches!(res, Err(PipelineError::InvalidInput(_))));

        let res = fetcher().fetch("ftp://example.com/file", &cancel).await;
        assert!(matches!(res, Err(PipelineError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn fetch_conexion_rechazada_es_network() {
        let addr = closed_addr().await;
        let cancel = CancellationToken::new();

        let res = fetcher().fetch(&format!("http://{}/", addr), &cancel).await;
        assert!(matches!(res, Err(PipelineError::Network(_))), "{:?}", res);
    }

    #[tokio::test]
    async fn fetch_con_token_cancelado_no_hace_request() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        // aunque la URL sea inválida, gana la cancelación
        let res = fetcher().fetch("no es una url", &cancel).await;
        assert_eq!(res, Err(PipelineError::Cancelled));
    }

    #[tokio::test]
    async fn fetch_cancelado_en_vuelo_corta_rapido() {
        let addr = serve(test_router()).await;
        let cancel = CancellationToken::new();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });

        let start = Instant::now();
        let res = fetcher()
            .fetch(&format!("http://{}/slow", addr), &cancel)
            .await;

        assert_eq!(res, Err(PipelineError::Cancelled));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn fetch_timeout_es_network() {
        let addr = serve(test_router()).await;
        let cancel = CancellationToken::new();
        let cfg = PipelineConfig {
            request_timeout: Duration::from_millis(100),
            ..PipelineConfig::default()
        };

        let res = HttpFetcher::new(&cfg)
            .unwrap()
            .fetch(&format!("http://{}/slow", addr), &cancel)
            .await;

        assert!(matches!(res, Err(PipelineError::Network(_))), "{:?}", res);
    }
}
