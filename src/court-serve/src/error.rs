use thiserror::Error;

/// Failures surfaced by the detection pipeline. The handlers map these onto
/// HTTP status codes; everything user-facing keeps the wording the frontend
/// already expects.
#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Imagem não encontrada")]
    MissingImage,

    #[error("Entrada inválida: {0}")]
    InvalidInput(String),

    #[error("Provedor de reconhecimento indisponível: {0}")]
    ProviderUnavailable(String),

    #[error("Modelo não está pronto (status: {0})")]
    ModelNotReady(String),
}

impl DetectError {
    /// HTTP status the handlers should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            DetectError::MissingImage | DetectError::InvalidInput(_) => 400,
            DetectError::ProviderUnavailable(_) => 502,
            DetectError::ModelNotReady(_) => 503,
        }
    }
}

impl From<base64::DecodeError> for DetectError {
    fn from(err: base64::DecodeError) -> Self {
        DetectError::InvalidInput(format!("base64 inválido: {}", err))
    }
}

impl From<serde_json::Error> for DetectError {
    fn from(err: serde_json::Error) -> Self {
        DetectError::InvalidInput(format!("JSON inválido: {}", err))
    }
}

impl From<reqwest::Error> for DetectError {
    fn from(err: reqwest::Error) -> Self {
        DetectError::ProviderUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DetectError>;
