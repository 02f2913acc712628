use anyhow::anyhow;
use chrono::NaiveDateTime;
use p256::ecdsa::VerifyingKey;
use serde::{Deserialize, Serialize};

use super::{QuoteBody, QuoteStatus};

/// What a validated report vouches for: the enclave's public key (carried in the
/// quote's report data) and the measurements it was bound to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnclaveIdentity {
    /// Uncompressed SEC1 point without the leading tag byte (x || y).
    #[serde(with = "hex")]
    pub public_key: [u8; 64],
    #[serde(with = "hex")]
    pub mr_enclave: [u8; 32],
    #[serde(with = "hex")]
    pub mr_signer: [u8; 32],
    pub isv_prod_id: u16,
    pub isv_svn: u16,
    pub debug: bool,
    pub quote_status: QuoteStatus,
    pub report_id: String,
    pub timestamp: NaiveDateTime,
}

impl EnclaveIdentity {
    pub(crate) fn from_quote_body(
        body: &QuoteBody,
        quote_status: QuoteStatus,
        report_id: String,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            public_key: body.report.report_data,
            mr_enclave: body.report.mr_enclave,
            mr_signer: body.report.mr_signer,
            isv_prod_id: body.report.isv_prod_id.get(),
            isv_svn: body.report.isv_svn.get(),
            debug: body.report.is_debug(),
            quote_status,
            report_id,
            timestamp,
        }
    }

    /// Interprets the attested key as a P-256 public key.
    pub fn verifying_key(&self) -> anyhow::Result<VerifyingKey> {
        let mut key = [0u8; 65];
        key[0] = 4;
        key[1..].copy_from_slice(&self.public_key);
        VerifyingKey::from_sec1_bytes(&key)
            .map_err(|e| anyhow!("enclave public key is not a P-256 point: {e}"))
    }
}
