use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{DEFAULT_TIMEOUT_SECS, IAS_REPORT_URL};
use crate::error::{AttestationError, Result};
use crate::types::QuoteStatus;

/// How the quote body echoed in a report is matched against the submitted quote.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorrelationMode {
    /// The echoed body must be exactly the base64 of the leading quote body bytes.
    #[default]
    Exact,
    /// The echoed body only has to be a prefix of the base64 of the whole quote.
    Prefix,
}

/// Caller policy applied to a report once its authenticity is established.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationPolicy {
    pub accepted_statuses: BTreeSet<QuoteStatus>,
    pub correlation: CorrelationMode,
    /// Reject reports older than this, measured from the report timestamp.
    pub max_report_age: Option<Duration>,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            accepted_statuses: BTreeSet::from([QuoteStatus::Ok]),
            correlation: CorrelationMode::default(),
            max_report_age: None,
        }
    }
}

impl VerificationPolicy {
    /// Explicitly allow a non-`OK` status, e.g. `GROUP_OUT_OF_DATE` on platforms awaiting a microcode update.
    pub fn accept(mut self, status: QuoteStatus) -> Self {
        self.accepted_statuses.insert(status);
        self
    }

    pub fn with_correlation(mut self, correlation: CorrelationMode) -> Self {
        self.correlation = correlation;
        self
    }

    pub fn with_max_report_age(mut self, max_age: Duration) -> Self {
        self.max_report_age = Some(max_age);
        self
    }

    pub fn accepts(&self, status: &QuoteStatus) -> bool {
        self.accepted_statuses.contains(status)
    }
}

/// Settings of an [`AttestationService`](crate::AttestationService).
///
/// The trusted verification key is deliberately absent: it is pinned at build time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AttestationConfig {
    /// Report endpoint of the attestation authority.
    pub endpoint: String,
    /// Deadline for one submission, connection included.
    pub timeout_secs: u64,
    /// Validate the authority's TLS server certificate against the web PKI.
    /// `false` relies solely on the report signature for authenticity.
    pub verify_server_certificate: bool,
    pub accepted_statuses: Vec<QuoteStatus>,
    pub correlation: CorrelationMode,
    pub max_report_age_secs: Option<u64>,
}

impl Default for AttestationConfig {
    fn default() -> Self {
        Self {
            endpoint: IAS_REPORT_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            verify_server_certificate: true,
            accepted_statuses: vec![QuoteStatus::Ok],
            correlation: CorrelationMode::default(),
            max_report_age_secs: None,
        }
    }
}

impl TryFrom<String> for AttestationConfig {
    type Error = AttestationError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        AttestationConfig::from_json(&value)
    }
}

impl AttestationConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| AttestationError::Config(e.to_string()))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn policy(&self) -> VerificationPolicy {
        VerificationPolicy {
            accepted_statuses: self.accepted_statuses.iter().cloned().collect(),
            correlation: self.correlation,
            max_report_age: self.max_report_age_secs.map(Duration::from_secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_only_accept_ok() {
        let policy = AttestationConfig::default().policy();
        assert!(policy.accepts(&QuoteStatus::Ok));
        assert!(!policy.accepts(&QuoteStatus::GroupOutOfDate));
        assert!(!policy.accepts(&QuoteStatus::KeyRevoked));
        assert_eq!(policy.correlation, CorrelationMode::Exact);
        assert_eq!(policy, VerificationPolicy::default());
    }

    #[test]
    fn load_from_json() {
        let config = AttestationConfig::from_json(
            r#"{
                "endpoint": "https://ias.example.com/attestation/v4/report",
                "timeout_secs": 5,
                "accepted_statuses": ["OK", "GROUP_OUT_OF_DATE"],
                "correlation": "prefix",
                "max_report_age_secs": 86400
            }"#,
        )
        .unwrap();

        assert_eq!(config.endpoint, "https://ias.example.com/attestation/v4/report");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.verify_server_certificate);

        let policy = config.policy();
        assert!(policy.accepts(&QuoteStatus::GroupOutOfDate));
        assert_eq!(policy.correlation, CorrelationMode::Prefix);
        assert_eq!(policy.max_report_age, Some(Duration::from_secs(86400)));
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        let err = AttestationConfig::from_json(r#"{"timeout_secs": "soon"}"#).unwrap_err();
        assert!(matches!(err, AttestationError::Config(_)));

        let err = AttestationConfig::try_from("not json".to_string()).unwrap_err();
        assert!(matches!(err, AttestationError::Config(_)));
    }

    #[test]
    fn trusted_key_cannot_be_configured() {
        let err = AttestationConfig::from_json(r#"{"trusted_key": "-----BEGIN PUBLIC KEY-----"}"#).unwrap_err();
        assert!(matches!(err, AttestationError::Config(ref msg) if msg.contains("trusted_key")));
    }
}
