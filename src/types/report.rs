use base64ct::{Base64, Encoding};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use x509_cert::Certificate;

use super::{EnclaveIdentity, QuoteStatus};
use crate::error::{AttestationError, Result};
use crate::utils::ias_timestamp;

/// Response of the report endpoint exactly as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    /// Response body, byte for byte. The report signature covers these bytes.
    pub body: Vec<u8>,
    /// `X-IASReport-Signature` header (base64).
    pub signature: String,
    /// `X-IASReport-Signing-Certificate` header (URL-encoded PEM chain).
    pub signing_certificate: String,
}

/// Attestation verification report body returned by IAS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportBody {
    /// Identifier of the report.
    #[serde(default)]
    pub id: String,

    /// Time the report was created, UTC, ISO 8601 without offset.
    #[serde(with = "ias_timestamp")]
    pub timestamp: NaiveDateTime,

    /// API version that produced the report.
    pub version: Option<u16>,

    pub isv_enclave_quote_status: QuoteStatus,

    /// Base64 of the quote header and ISV enclave report, echoed from the submission.
    pub isv_enclave_quote_body: String,

    /// RFC 5280 revocation reason, present for `KEY_REVOKED`.
    pub revocation_reason: Option<u32>,

    pub pse_manifest_status: Option<String>,
    pub pse_manifest_hash: Option<String>,

    /// Hex encoded TLV blob for the platform, present when the platform needs attention.
    pub platform_info_blob: Option<String>,

    /// Echo of the nonce from the submission.
    pub nonce: Option<String>,

    pub epid_pseudonym: Option<String>,

    #[serde(rename = "advisoryURL")]
    pub advisory_url: Option<String>,

    #[serde(rename = "advisoryIDs", default)]
    pub advisory_ids: Vec<String>,
}

impl ReportBody {
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let body: ReportBody =
            serde_json::from_slice(bytes).map_err(|e| AttestationError::Schema(e.to_string()))?;

        if body.isv_enclave_quote_body.is_empty() {
            return Err(AttestationError::Schema(
                "isvEnclaveQuoteBody is empty".to_string(),
            ));
        }

        Ok(body)
    }

    pub fn platform_info(&self) -> Option<Result<Vec<u8>>> {
        self.platform_info_blob.as_ref().map(|blob| {
            hex::decode(blob).map_err(|e| {
                AttestationError::Schema(format!("platformInfoBlob is not hex: {e}"))
            })
        })
    }
}

/// A parsed report together with everything needed to check its authenticity.
///
/// Built once from a [`RawResponse`] and never mutated afterwards. The raw body is
/// kept verbatim since re-serialising [`ReportBody`] would not reproduce the bytes
/// the authority signed.
#[derive(Debug, Clone)]
pub struct AttestationReport {
    pub(crate) body: ReportBody,
    pub(crate) raw_body: Vec<u8>,
    pub(crate) signature: Vec<u8>,
    pub(crate) signing_chain: Vec<Certificate>,
    pub(crate) signature_header: String,
    pub(crate) signing_certificate_header: String,
}

impl AttestationReport {
    pub fn body(&self) -> &ReportBody {
        &self.body
    }

    pub fn raw_body(&self) -> &[u8] {
        &self.raw_body
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Signing certificate first, followed by its issuers.
    pub fn signing_chain(&self) -> &[Certificate] {
        &self.signing_chain
    }

    pub fn quote_status(&self) -> &QuoteStatus {
        &self.body.isv_enclave_quote_status
    }
}

/// A report that passed every check, paired with the identity it vouches for.
#[derive(Debug, Clone)]
pub struct ValidatedReport {
    pub report: AttestationReport,
    pub identity: EnclaveIdentity,
}

impl ValidatedReport {
    /// Hand-off record for components that store or forward the evidence.
    pub fn envelope(&self) -> ReportEnvelope {
        ReportEnvelope {
            enclave_pk: Base64::encode_string(&self.identity.public_key),
            signature: self.report.signature_header.clone(),
            signing_certificate: self.report.signing_certificate_header.clone(),
            response_body: Base64::encode_string(&self.report.raw_body),
        }
    }
}

/// Serialised form of a validated report. Byte fields are base64 encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportEnvelope {
    #[serde(rename = "EnclavePk")]
    pub enclave_pk: String,
    #[serde(rename = "IASReport-Signature")]
    pub signature: String,
    #[serde(rename = "IASReport-Signing-Certificate")]
    pub signing_certificate: String,
    #[serde(rename = "IASResponseBody")]
    pub response_body: String,
}

impl ReportEnvelope {
    /// Rebuilds the authority response so a receiver can verify it again.
    pub fn into_raw_response(self) -> Result<RawResponse> {
        let body = Base64::decode_vec(&self.response_body).map_err(|e| {
            AttestationError::MalformedResponse(format!("IASResponseBody is not base64: {e}"))
        })?;

        Ok(RawResponse {
            body,
            signature: self.signature,
            signing_certificate: self.signing_certificate,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_captured_body() {
        let body = ReportBody::from_slice(include_bytes!("../../data/response_body.json")).unwrap();
        assert_eq!(body.id, "165171271757108173876306223827987629752");
        assert_eq!(body.version, Some(3));
        assert_eq!(body.isv_enclave_quote_status, QuoteStatus::Ok);
        assert_eq!(body.timestamp.to_string(), "2026-10-19 11:02:17.614227");
        assert!(body.nonce.is_none());
        assert!(body.advisory_ids.is_empty());
        assert_eq!(body.platform_info().unwrap().unwrap().len(), 41);
    }

    #[test]
    fn optional_fields_are_tolerated() {
        let json = r#"{
            "id": "1",
            "timestamp": "2019-04-26T09:10:11.123456",
            "isvEnclaveQuoteStatus": "GROUP_OUT_OF_DATE",
            "isvEnclaveQuoteBody": "AAAA",
            "revocationReason": 1,
            "advisoryURL": "https://security-center.intel.com",
            "advisoryIDs": ["INTEL-SA-00161", "INTEL-SA-00233"],
            "someFutureField": {"nested": true}
        }"#;
        let body = ReportBody::from_slice(json.as_bytes()).unwrap();
        assert_eq!(body.isv_enclave_quote_status, QuoteStatus::GroupOutOfDate);
        assert_eq!(body.revocation_reason, Some(1));
        assert_eq!(body.advisory_ids.len(), 2);
    }

    #[test]
    fn mandatory_fields_are_required() {
        let missing_status = r#"{"timestamp": "2019-04-26T09:10:11.123456", "isvEnclaveQuoteBody": "AAAA"}"#;
        let missing_body = r#"{"timestamp": "2019-04-26T09:10:11.123456", "isvEnclaveQuoteStatus": "OK"}"#;
        let missing_timestamp = r#"{"isvEnclaveQuoteStatus": "OK", "isvEnclaveQuoteBody": "AAAA"}"#;
        let bad_timestamp = r#"{"timestamp": "yesterday", "isvEnclaveQuoteStatus": "OK", "isvEnclaveQuoteBody": "AAAA"}"#;
        let empty_body = r#"{"timestamp": "2019-04-26T09:10:11.123456", "isvEnclaveQuoteStatus": "OK", "isvEnclaveQuoteBody": ""}"#;

        for json in [missing_status, missing_body, missing_timestamp, bad_timestamp, empty_body] {
            let err = ReportBody::from_slice(json.as_bytes()).unwrap_err();
            assert!(matches!(err, AttestationError::Schema(_)), "{json}: {err}");
        }
    }
}
