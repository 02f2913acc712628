use serde::{Deserialize, Serialize};

/// `isvEnclaveQuoteStatus` as assigned by IAS.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum QuoteStatus {
    /// EPID signature of the quote was verified and the platform is up to date.
    Ok,
    /// EPID signature of the quote is invalid.
    SignatureInvalid,
    /// The EPID group has been revoked.
    GroupRevoked,
    /// The EPID private key used to sign the quote has been revoked by signature.
    SignatureRevoked,
    /// The EPID private key used to sign the quote has been directly revoked.
    KeyRevoked,
    /// The SigRL used by the quote is out of date.
    SigrlVersionMismatch,
    /// The platform TCB level is out of date.
    GroupOutOfDate,
    /// Additional configuration of the platform may be needed.
    ConfigurationNeeded,
    /// Software hardening (mitigations) is needed in the enclave.
    SwHardeningNeeded,
    /// Both configuration and software hardening are needed.
    ConfigurationAndSwHardeningNeeded,
    /// A status this crate does not know about. Never accepted unless listed verbatim.
    Unknown(String),
}

impl QuoteStatus {
    pub fn as_str(&self) -> &str {
        match self {
            QuoteStatus::Ok => "OK",
            QuoteStatus::SignatureInvalid => "SIGNATURE_INVALID",
            QuoteStatus::GroupRevoked => "GROUP_REVOKED",
            QuoteStatus::SignatureRevoked => "SIGNATURE_REVOKED",
            QuoteStatus::KeyRevoked => "KEY_REVOKED",
            QuoteStatus::SigrlVersionMismatch => "SIGRL_VERSION_MISMATCH",
            QuoteStatus::GroupOutOfDate => "GROUP_OUT_OF_DATE",
            QuoteStatus::ConfigurationNeeded => "CONFIGURATION_NEEDED",
            QuoteStatus::SwHardeningNeeded => "SW_HARDENING_NEEDED",
            QuoteStatus::ConfigurationAndSwHardeningNeeded => {
                "CONFIGURATION_AND_SW_HARDENING_NEEDED"
            },
            QuoteStatus::Unknown(s) => s,
        }
    }

    /// Statuses reporting that the platform or its key material has been revoked.
    pub fn is_revoked(&self) -> bool {
        matches!(
            self,
            QuoteStatus::GroupRevoked | QuoteStatus::SignatureRevoked | QuoteStatus::KeyRevoked
        )
    }
}

impl From<&str> for QuoteStatus {
    fn from(s: &str) -> Self {
        match s {
            "OK" => QuoteStatus::Ok,
            "SIGNATURE_INVALID" => QuoteStatus::SignatureInvalid,
            "GROUP_REVOKED" => QuoteStatus::GroupRevoked,
            "SIGNATURE_REVOKED" => QuoteStatus::SignatureRevoked,
            "KEY_REVOKED" => QuoteStatus::KeyRevoked,
            "SIGRL_VERSION_MISMATCH" => QuoteStatus::SigrlVersionMismatch,
            "GROUP_OUT_OF_DATE" => QuoteStatus::GroupOutOfDate,
            "CONFIGURATION_NEEDED" => QuoteStatus::ConfigurationNeeded,
            "SW_HARDENING_NEEDED" => QuoteStatus::SwHardeningNeeded,
            "CONFIGURATION_AND_SW_HARDENING_NEEDED" => {
                QuoteStatus::ConfigurationAndSwHardeningNeeded
            },
            other => QuoteStatus::Unknown(other.to_string()),
        }
    }
}

impl From<String> for QuoteStatus {
    fn from(s: String) -> Self {
        QuoteStatus::from(s.as_str())
    }
}

impl From<QuoteStatus> for String {
    fn from(status: QuoteStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
