//! Network exchange with the attestation authority.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use tracing::{debug, warn};

use crate::config::AttestationConfig;
use crate::constants::{MAX_NONCE_LEN, REPORT_SIGNATURE_HEADER, REPORT_SIGNING_CERTIFICATE_HEADER};
use crate::error::{AttestationError, Result};
use crate::types::{Evidence, RawResponse};

/// TLS client certificate chain and private key the attesting party presents to the authority.
#[derive(Clone)]
pub struct ClientIdentity {
    pem: Vec<u8>,
}

impl ClientIdentity {
    /// Expects a PEM bundle with at least one `CERTIFICATE` block and one private key block.
    pub fn from_pem(bundle: &[u8]) -> Result<Self> {
        let blocks = pem::parse_many(bundle)
            .map_err(|e| AttestationError::Transport(format!("invalid client identity: {e}")))?;

        if !blocks.iter().any(|block| block.tag() == "CERTIFICATE") {
            return Err(AttestationError::Transport(
                "client identity has no certificate".to_string(),
            ));
        }

        if !blocks.iter().any(|block| block.tag().ends_with("PRIVATE KEY")) {
            return Err(AttestationError::Transport(
                "client identity has no private key".to_string(),
            ));
        }

        Ok(Self {
            pem: bundle.to_vec(),
        })
    }

    fn to_tls_identity(&self) -> Result<reqwest::Identity> {
        reqwest::Identity::from_pem(&self.pem)
            .map_err(|e| AttestationError::Transport(format!("invalid client identity: {e}")))
    }
}

impl std::fmt::Debug for ClientIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientIdentity").finish_non_exhaustive()
    }
}

/// One request/response exchange with the attestation authority.
///
/// Implementations do not retry; a failed submission is reported as is.
#[async_trait]
pub trait AttestationTransport: Send + Sync {
    async fn submit(&self, identity: &ClientIdentity, evidence: &Evidence) -> Result<RawResponse>;
}

/// HTTPS client for the IAS report endpoint.
#[derive(Debug, Clone)]
pub struct IasClient {
    endpoint: String,
    timeout: Duration,
    verify_server_certificate: bool,
}

impl IasClient {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::from_config(&AttestationConfig {
            endpoint: endpoint.into(),
            ..AttestationConfig::default()
        })
    }

    pub fn from_config(config: &AttestationConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: config.timeout(),
            verify_server_certificate: config.verify_server_certificate,
        }
    }

    fn http_client(&self, identity: &ClientIdentity) -> Result<reqwest::Client> {
        if !self.verify_server_certificate {
            warn!(endpoint = %self.endpoint, "server certificate validation is disabled");
        }

        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .identity(identity.to_tls_identity()?)
            .timeout(self.timeout)
            .danger_accept_invalid_certs(!self.verify_server_certificate)
            .build()?;

        Ok(client)
    }
}

#[async_trait]
impl AttestationTransport for IasClient {
    async fn submit(&self, identity: &ClientIdentity, evidence: &Evidence) -> Result<RawResponse> {
        check_submission(evidence)?;

        let client = self.http_client(identity)?;

        debug!(
            endpoint = %self.endpoint,
            quote_len = evidence.quote().len(),
            nonce = evidence.nonce().is_some(),
            "submitting quote to attestation authority"
        );

        let response = client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(&evidence.submission())
            .send()
            .await?;

        let status = response.status().as_u16();
        if status != 200 {
            warn!(status, endpoint = %self.endpoint, "attestation authority rejected the quote");
            return Err(AttestationError::AuthorityRejected { status });
        }

        let signature = header_value(response.headers(), REPORT_SIGNATURE_HEADER)?;
        let signing_certificate = header_value(response.headers(), REPORT_SIGNING_CERTIFICATE_HEADER)?;
        let body = response.bytes().await?.to_vec();

        debug!(status, body_len = body.len(), "received attestation report");

        Ok(RawResponse {
            body,
            signature,
            signing_certificate,
        })
    }
}

/// Rejects submissions the authority would refuse anyway.
pub(crate) fn check_submission(evidence: &Evidence) -> Result<()> {
    if evidence.is_empty() {
        return Err(AttestationError::Transport("empty evidence".to_string()));
    }

    if let Some(nonce) = evidence.nonce() {
        if nonce.len() > MAX_NONCE_LEN {
            return Err(AttestationError::Transport(format!(
                "nonce is {} characters, at most {} are allowed",
                nonce.len(),
                MAX_NONCE_LEN
            )));
        }
    }

    Ok(())
}

fn header_value(headers: &HeaderMap, name: &str) -> Result<String> {
    headers
        .get(name)
        .ok_or_else(|| AttestationError::MalformedResponse(format!("missing {name} header")))?
        .to_str()
        .map(str::to_string)
        .map_err(|e| AttestationError::MalformedResponse(format!("{name} header is not ASCII: {e}")))
}
