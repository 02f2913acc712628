//! Error types for attestation requests and report verification

use thiserror::Error;

use crate::types::QuoteStatus;

/// One variant per failure kind, so callers can branch on what actually failed.
/// Every variant is terminal: nothing in this crate retries.
#[derive(Error, Debug)]
pub enum AttestationError {
    #[error("trusted key is not a decodable PEM public key block: {0}")]
    KeyFormat(String),

    #[error("trusted key is not a well-formed public key: {0}")]
    KeyParse(String),

    #[error("invalid attestation configuration: {0}")]
    Config(String),

    #[error("attestation authority connection error: {0}")]
    Transport(String),

    #[error("attestation authority returned HTTP {status}")]
    AuthorityRejected { status: u16 },

    #[error("malformed attestation authority response: {0}")]
    MalformedResponse(String),

    #[error("attestation report does not match the expected schema: {0}")]
    Schema(String),

    #[error("report does not contain the submitted evidence: {0}")]
    EvidenceMismatch(String),

    #[error("report signing certificate chain is not trusted: {0}")]
    UntrustedSigner(String),

    #[error("report signature is invalid: {0}")]
    InvalidSignature(String),

    #[error("quote status {status} is not accepted")]
    QuoteRejected { status: QuoteStatus },

    #[error("report issued at {timestamp} is outside the accepted age of {max_age_secs}s")]
    StaleReport { timestamp: String, max_age_secs: u64 },
}

pub type Result<T, E = AttestationError> = std::result::Result<T, E>;

impl From<reqwest::Error> for AttestationError {
    fn from(err: reqwest::Error) -> Self {
        AttestationError::Transport(err.to_string())
    }
}
