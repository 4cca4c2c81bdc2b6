use serde::Serialize;
use thiserror::Error;

/// Tipo de fallo, pensado para reportarlo de forma estructurada.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Cancelled,
    InvalidInput,
    Worker,
}

/// Errores del pipeline. Cualquiera de ellos es fatal para la corrida completa.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PipelineError {
    /// Conexión, DNS, timeout o lectura del body.
    #[error("error de red: {0}")]
    Network(String),

    /// Se disparó la señal de cancelación compartida.
    #[error("operación cancelada")]
    Cancelled,

    /// URL mal formada o configuración imposible (ej: rate limit en 0).
    #[error("entrada inválida: {0}")]
    InvalidInput(String),

    /// Una tarea worker terminó con panic.
    #[error("worker terminó de forma anómala: {0}")]
    Worker(String),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::Network(_) => ErrorKind::Network,
            PipelineError::Cancelled => ErrorKind::Cancelled,
            PipelineError::InvalidInput(_) => ErrorKind::InvalidInput,
            PipelineError::Worker(_) => ErrorKind::Worker,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, PipelineError::Cancelled)
    }
}

/// Forma serializable de un fallo: `{"kind": "...", "message": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PipelineError> for ErrorReport {
    fn from(err: &PipelineError) -> Self {
        ErrorReport {
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Aplana un error y todas sus causas en una sola línea.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut out = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        current = cause.source();
    }
    out
}
