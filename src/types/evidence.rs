use base64ct::{Base64, Encoding};
use serde::Serialize;

/// Quote produced by the enclave, opaque to this crate, plus the optional nonce
/// that IAS will echo back in the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evidence {
    quote: Vec<u8>,
    nonce: Option<String>,
}

impl Evidence {
    pub fn new(quote: impl Into<Vec<u8>>) -> Self {
        Self {
            quote: quote.into(),
            nonce: None,
        }
    }

    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = Some(nonce.into());
        self
    }

    pub fn quote(&self) -> &[u8] {
        &self.quote
    }

    pub fn nonce(&self) -> Option<&str> {
        self.nonce.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.quote.is_empty()
    }

    pub fn to_base64(&self) -> String {
        Base64::encode_string(&self.quote)
    }

    /// Request envelope posted to the report endpoint.
    pub fn submission(&self) -> EvidenceSubmission<'_> {
        EvidenceSubmission {
            isv_enclave_quote: self.to_base64(),
            nonce: self.nonce(),
        }
    }
}

impl From<Vec<u8>> for Evidence {
    fn from(quote: Vec<u8>) -> Self {
        Evidence::new(quote)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceSubmission<'a> {
    pub isv_enclave_quote: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nonce: Option<&'a str>,
}
