use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type APIResult<T> = Result<T, APIError>;

/// `QuickBooks` fault code for "Duplicate Name Exists Error".
pub const DUPLICATE_NAME_CODE: &str = "6240";

#[derive(Debug, Error)]
pub enum APIError {
    #[error("http transport error: {0}")]
    Transport(#[from] ureq::Error),
    #[error("failed to build request: {0}")]
    Http(#[from] ureq::http::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid url: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("authentication with quickbooks failed: {0}")]
    Unauthorized(QBErrorResponse),
    #[error("invalid client credentials on token exchange")]
    InvalidClient,
    #[error("request throttled by quickbooks: {0}")]
    Throttled(QBErrorResponse),
    #[error("quickbooks rejected the request: {0}")]
    BadRequest(QBErrorResponse),
    #[error("{0} is missing fields required for create")]
    CreateMissingItems(&'static str),
    #[error("redirect url did not contain an authorization code")]
    NoAuthCode,
}

/// Coarse classification driving the failure policy: what aborts the run,
/// what is retried, and what is recorded against a single record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Authentication,
    RateLimit,
    Network,
    Duplicate,
    Validation,
    Other,
}

impl APIError {
    /// Maps an HTTP status and response body to an error, parsing the
    /// `QuickBooks` fault envelope out of the body when present.
    pub(crate) fn from_response(status: u16, body: String) -> Self {
        let response = QBErrorResponse::from_body(body);
        match status {
            401 | 403 => APIError::Unauthorized(response),
            429 => APIError::Throttled(response),
            _ => APIError::BadRequest(response),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            APIError::Transport(_) => ErrorKind::Network,
            APIError::Unauthorized(_) | APIError::InvalidClient => ErrorKind::Authentication,
            APIError::Throttled(_) => ErrorKind::RateLimit,
            APIError::BadRequest(response) => {
                if response.has_fault_code(DUPLICATE_NAME_CODE) {
                    ErrorKind::Duplicate
                } else {
                    ErrorKind::Validation
                }
            }
            _ => ErrorKind::Other,
        }
    }
}

/// Error envelope `QuickBooks` wraps most failures in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QBErrorResponse {
    #[serde(rename = "Fault")]
    pub fault: Option<Fault>,
    pub time: Option<String>,
    /// The unparsed body, kept for responses that are not fault-shaped.
    #[serde(skip)]
    pub raw: String,
}

impl QBErrorResponse {
    pub(crate) fn from_body(body: String) -> Self {
        match serde_json::from_str::<QBErrorResponse>(&body) {
            Ok(mut parsed) if parsed.fault.is_some() => {
                parsed.raw = body;
                parsed
            }
            _ => QBErrorResponse {
                raw: body,
                ..QBErrorResponse::default()
            },
        }
    }

    #[must_use]
    pub fn has_fault_code(&self, code: &str) -> bool {
        self.fault
            .as_ref()
            .is_some_and(|fault| fault.errors.iter().any(|e| e.code == code))
    }
}

impl std::fmt::Display for QBErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.fault {
            Some(fault) => {
                write!(f, "{}", fault.fault_type)?;
                for error in &fault.errors {
                    write!(f, "; [{}] {}", error.code, error.message)?;
                    if let Some(detail) = &error.detail {
                        write!(f, " - {detail}")?;
                    }
                }
                Ok(())
            }
            None => write!(f, "{}", self.raw),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fault {
    #[serde(rename = "type")]
    pub fault_type: String,
    #[serde(rename = "Error")]
    pub errors: Vec<QBError>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QBError {
    #[serde(rename = "Message")]
    pub message: String,
    pub code: String,
    #[serde(rename = "Detail")]
    pub detail: Option<String>,
    pub element: Option<String>,
}
