pub mod config;
pub mod constants;
pub mod error;
pub mod parser;
pub mod service;
pub mod transport;
pub mod trust_store;
pub mod trusted_key;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod fixtures;

use std::time::SystemTime;

use anyhow::anyhow;
use base64ct::{Base64, Encoding};
use chrono::{DateTime, Utc};
use rsa::pkcs1v15::{Signature, VerifyingKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::signature::Verifier;
use rsa::RsaPublicKey;
use sha2::Sha256;
use tracing::{debug, warn};
use trust_store::TrustStore;
use x509_cert::der::Encode;
use x509_cert::Certificate;

pub use config::{AttestationConfig, CorrelationMode, VerificationPolicy};
pub use error::{AttestationError, Result};
pub use service::AttestationService;
pub use transport::{AttestationTransport, ClientIdentity, IasClient};
pub use trusted_key::{intel_verification_key, TrustedVerificationKey};
pub use types::{
    AttestationReport, EnclaveIdentity, Evidence, QuoteBody, QuoteStatus, RawResponse,
    ReportBody, ReportEnvelope, ValidatedReport,
};

use constants::QUOTE_BODY_LEN;

/// Decides whether a parsed report is authentic, refers to `evidence`, and
/// satisfies `policy`. On success returns the identity the report vouches for.
pub fn verify_attestation_report(
    current_time: SystemTime,
    report: &AttestationReport,
    evidence: &Evidence,
    trusted_key: &TrustedVerificationKey,
    policy: &VerificationPolicy,
) -> Result<EnclaveIdentity> {
    // 1. Verify the report is about the evidence that was submitted.
    verify_correlation(report, evidence, policy)?;

    // 2. Verify the signing certificate chain is rooted in the pinned key.
    let signer = TrustStore::new(current_time, trusted_key)
        .verify_chain_leaf(report.signing_chain())
        .map_err(|e| AttestationError::UntrustedSigner(format!("{e:#}")))?;

    // 3. Verify the signature over the body bytes exactly as received.
    verify_report_signature(&signer.cert, report.raw_body(), report.signature())
        .map_err(|e| AttestationError::InvalidSignature(format!("{e:#}")))?;

    // 4. Verify the quote status is acceptable to the caller.
    let status = report.quote_status();
    if !policy.accepts(status) {
        if status.is_revoked() {
            warn!(
                status = %status,
                report_id = %report.body().id,
                revocation_reason = ?report.body().revocation_reason,
                "platform signing key material is revoked"
            );
        }
        return Err(AttestationError::QuoteRejected {
            status: status.clone(),
        });
    }
    if *status != QuoteStatus::Ok {
        warn!(
            status = %status,
            report_id = %report.body().id,
            advisories = ?report.body().advisory_ids,
            "accepting quote with non-OK status"
        );
    }

    // 5. Verify the report is recent enough, when the caller asks for it.
    verify_freshness(current_time, report, policy)?;

    // 6. Extract the enclave identity from the echoed quote body.
    let quote_body = QuoteBody::from_base64(&report.body().isv_enclave_quote_body)
        .map_err(|e| AttestationError::Schema(format!("{e:#}")))?;

    debug!(report_id = %report.body().id, status = %status, "attestation report verified");

    Ok(EnclaveIdentity::from_quote_body(
        &quote_body,
        status.clone(),
        report.body().id.clone(),
        report.body().timestamp,
    ))
}

fn verify_correlation(
    report: &AttestationReport,
    evidence: &Evidence,
    policy: &VerificationPolicy,
) -> Result<()> {
    let echoed = report.body().isv_enclave_quote_body.as_str();

    let correlated = match policy.correlation {
        CorrelationMode::Exact => {
            let quote = evidence.quote();
            let body = &quote[..quote.len().min(QUOTE_BODY_LEN)];
            echoed == Base64::encode_string(body)
        },
        CorrelationMode::Prefix => evidence.to_base64().starts_with(echoed),
    };

    if !correlated {
        return Err(AttestationError::EvidenceMismatch(
            "echoed quote body does not match the submitted quote".to_string(),
        ));
    }

    if let Some(nonce) = evidence.nonce() {
        if report.body().nonce.as_deref() != Some(nonce) {
            return Err(AttestationError::EvidenceMismatch(
                "report nonce does not match the submitted nonce".to_string(),
            ));
        }
    }

    Ok(())
}

/// RSASSA-PKCS1-v1_5 with SHA-256 under the leaf certificate's key.
fn verify_report_signature(leaf: &Certificate, body: &[u8], signature: &[u8]) -> anyhow::Result<()> {
    let spki = leaf
        .tbs_certificate
        .subject_public_key_info
        .to_der()
        .map_err(|e| anyhow!("failed to encode signing key: {e}"))?;

    let pk = RsaPublicKey::from_public_key_der(&spki)
        .map_err(|e| anyhow!("signing certificate does not carry an RSA key: {e}"))?;

    let signature =
        Signature::try_from(signature).map_err(|e| anyhow!("malformed signature: {e}"))?;

    VerifyingKey::<Sha256>::new(pk)
        .verify(body, &signature)
        .map_err(|e| anyhow!("signature does not match the report body: {e}"))
}

fn verify_freshness(
    current_time: SystemTime,
    report: &AttestationReport,
    policy: &VerificationPolicy,
) -> Result<()> {
    let Some(max_age) = policy.max_report_age else {
        return Ok(());
    };

    let issued = report.body().timestamp.and_utc();
    let now = DateTime::<Utc>::from(current_time);

    // A negative age (issued in the future) fails the conversion.
    let fresh = (now - issued)
        .to_std()
        .map(|age| age <= max_age)
        .unwrap_or(false);

    if !fresh {
        return Err(AttestationError::StaleReport {
            timestamp: report.body().timestamp.to_string(),
            max_age_secs: max_age.as_secs(),
        });
    }

    Ok(())
}
