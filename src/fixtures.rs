//! Shared helpers for building signed reports in tests.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use base64ct::{Base64, Encoding};
use once_cell::sync::Lazy;
use rsa::pkcs1v15::SigningKey;
use rsa::pkcs8::DecodePrivateKey;
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use sha2::Sha256;

use crate::constants::QUOTE_BODY_LEN;
use crate::trusted_key::TrustedVerificationKey;
use crate::types::RawResponse;

/// 2030-01-01T00:00:00Z, inside the validity window of every fixture certificate.
pub(crate) fn fixed_time() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_893_456_000)
}

pub(crate) fn quote() -> Vec<u8> {
    include_bytes!("../data/quote.bin").to_vec()
}

pub(crate) fn root_key() -> TrustedVerificationKey {
    TrustedVerificationKey::from_pem(include_bytes!("../data/root_ca_pub.pem")).unwrap()
}

pub(crate) struct BodyBuilder {
    pub(crate) quote_body: String,
    pub(crate) status: &'static str,
    pub(crate) nonce: Option<String>,
    pub(crate) timestamp: &'static str,
}

impl BodyBuilder {
    pub(crate) fn for_quote(quote: &[u8]) -> Self {
        let end = quote.len().min(QUOTE_BODY_LEN);
        Self {
            quote_body: Base64::encode_string(&quote[..end]),
            status: "OK",
            nonce: None,
            timestamp: "2029-12-31T12:00:00.000000",
        }
    }

    pub(crate) fn status(mut self, status: &'static str) -> Self {
        self.status = status;
        self
    }

    pub(crate) fn nonce(mut self, nonce: &str) -> Self {
        self.nonce = Some(nonce.to_string());
        self
    }

    pub(crate) fn timestamp(mut self, timestamp: &'static str) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub(crate) fn build(self) -> Vec<u8> {
        let mut body = serde_json::json!({
            "id": "260349165939014016213870364155620925815",
            "timestamp": self.timestamp,
            "version": 3,
            "isvEnclaveQuoteStatus": self.status,
            "isvEnclaveQuoteBody": self.quote_body,
        });
        if let Some(nonce) = self.nonce {
            body["nonce"] = serde_json::Value::String(nonce);
        }
        serde_json::to_vec(&body).unwrap()
    }
}

fn sign_with(key_pem: &str, body: &[u8]) -> String {
    let key = RsaPrivateKey::from_pkcs8_pem(key_pem).unwrap();
    let signer = SigningKey::<Sha256>::new(key);
    Base64::encode_string(&signer.sign(body).to_bytes())
}

/// Response as the authority would send it for `body`.
pub(crate) fn signed_response(body: Vec<u8>) -> RawResponse {
    RawResponse {
        signature: sign_with(include_str!("../data/signing_key.pem"), &body),
        signing_certificate: include_str!("../data/response_certificates.txt").to_string(),
        body,
    }
}

/// Response signed by a self-signed look-alike of the authority's CA.
pub(crate) fn forged_response(body: Vec<u8>) -> RawResponse {
    let chain = [include_str!("../data/rogue_signing.pem"), include_str!("../data/rogue.pem")].concat();
    RawResponse {
        signature: sign_with(include_str!("../data/rogue_key.pem"), &body),
        signing_certificate: chain,
        body,
    }
}

/// Response captured byte for byte, signature and URL-encoded chain included.
pub(crate) fn captured_response() -> RawResponse {
    RawResponse {
        body: include_bytes!("../data/response_body.json").to_vec(),
        signature: include_str!("../data/response_signature.txt").to_string(),
        signing_certificate: include_str!("../data/response_certificates.txt").to_string(),
    }
}

/// Root key with a `'static` lifetime, for services moved into spawned tasks.
pub(crate) fn static_root_key() -> &'static TrustedVerificationKey {
    static KEY: Lazy<TrustedVerificationKey> = Lazy::new(root_key);
    &KEY
}
