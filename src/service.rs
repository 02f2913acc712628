//! Submit evidence, get back a verified enclave identity.

use std::time::SystemTime;

use tracing::info;

use crate::config::{AttestationConfig, VerificationPolicy};
use crate::error::Result;
use crate::parser;
use crate::transport::{AttestationTransport, ClientIdentity, IasClient};
use crate::trusted_key::{intel_verification_key, TrustedVerificationKey};
use crate::types::{EnclaveIdentity, Evidence, ValidatedReport};
use crate::verify_attestation_report;

/// Runs one attestation end to end: transport, parse, verify.
///
/// Holds no mutable state, so a single service can be shared between tasks and
/// used for any number of concurrent attestations.
pub struct AttestationService<'k, T> {
    transport: T,
    trusted_key: &'k TrustedVerificationKey,
    policy: VerificationPolicy,
    clock: fn() -> SystemTime,
}

impl AttestationService<'static, IasClient> {
    /// IAS over HTTPS, verified against the pinned Intel key.
    pub fn from_config(config: &AttestationConfig) -> Result<Self> {
        Ok(Self::new(
            IasClient::from_config(config),
            intel_verification_key()?,
            config.policy(),
        ))
    }
}

impl<'k, T: AttestationTransport> AttestationService<'k, T> {
    pub fn new(transport: T, trusted_key: &'k TrustedVerificationKey, policy: VerificationPolicy) -> Self {
        Self {
            transport,
            trusted_key,
            policy,
            clock: SystemTime::now,
        }
    }

    /// Source of the time certificate validity and report age are checked against.
    pub fn with_clock(mut self, clock: fn() -> SystemTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    pub async fn attest(&self, identity: &ClientIdentity, evidence: &Evidence) -> Result<EnclaveIdentity> {
        self.attest_report(identity, evidence)
            .await
            .map(|validated| validated.identity)
    }

    /// Like [`attest`](Self::attest), keeping the report for hand-off.
    pub async fn attest_report(&self, identity: &ClientIdentity, evidence: &Evidence) -> Result<ValidatedReport> {
        let response = self.transport.submit(identity, evidence).await?;
        let report = parser::parse(response)?;
        let identity = verify_attestation_report(
            (self.clock)(),
            &report,
            evidence,
            self.trusted_key,
            &self.policy,
        )?;

        info!(
            report_id = %identity.report_id,
            status = %identity.quote_status,
            mr_enclave = %hex::encode(identity.mr_enclave),
            "enclave attested"
        );

        Ok(ValidatedReport { report, identity })
    }
}
