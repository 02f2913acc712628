//! The pinned key that every report signing chain must lead back to.

use once_cell::sync::OnceCell;
use x509_cert::der::{Decode, Encode};
use x509_cert::spki::SubjectPublicKeyInfoOwned;
use x509_cert::Certificate;

use crate::constants::INTEL_VERIFICATION_KEY_PEM;
use crate::error::{AttestationError, Result};

static INTEL_VERIFICATION_KEY: OnceCell<TrustedVerificationKey> = OnceCell::new();

/// Returns the pinned Intel verification key, parsing it on first use.
///
/// The key is compiled in. Rotating it means shipping a new build, never a
/// configuration change.
pub fn intel_verification_key() -> Result<&'static TrustedVerificationKey> {
    INTEL_VERIFICATION_KEY
        .get_or_try_init(|| TrustedVerificationKey::from_pem(INTEL_VERIFICATION_KEY_PEM.as_bytes()))
}

/// Root of trust for report signing certificate chains.
pub struct TrustedVerificationKey {
    spki_der: Vec<u8>,
    pk: x509_verify::VerifyingKey,
}

impl TrustedVerificationKey {
    /// Parses a `PUBLIC KEY` PEM block holding a DER SubjectPublicKeyInfo.
    pub fn from_pem(input: &[u8]) -> Result<Self> {
        let block = pem::parse(input.trim_ascii())
            .map_err(|e| AttestationError::KeyFormat(e.to_string()))?;

        if block.tag() != "PUBLIC KEY" {
            return Err(AttestationError::KeyFormat(format!(
                "expected a PUBLIC KEY block, found {}",
                block.tag()
            )));
        }

        Self::from_der(block.contents())
    }

    pub fn from_der(der: &[u8]) -> Result<Self> {
        let spki = SubjectPublicKeyInfoOwned::from_der(der)
            .map_err(|e| AttestationError::KeyParse(e.to_string()))?;

        let spki_der = spki
            .to_der()
            .map_err(|e| AttestationError::KeyParse(e.to_string()))?;

        let pk = x509_verify::VerifyingKey::try_from(spki)
            .map_err(|e| AttestationError::KeyParse(format!("unsupported public key: {}", e)))?;

        Ok(Self { spki_der, pk })
    }

    /// DER encoded SubjectPublicKeyInfo.
    pub fn spki_der(&self) -> &[u8] {
        &self.spki_der
    }

    /// True if `cert` certifies this very key.
    pub fn matches(&self, cert: &Certificate) -> bool {
        cert.tbs_certificate
            .subject_public_key_info
            .to_der()
            .map(|der| der == self.spki_der)
            .unwrap_or(false)
    }

    /// Checks that `cert` carries a signature made with this key.
    pub fn verify_issued(&self, cert: &Certificate) -> anyhow::Result<()> {
        self.pk
            .verify_strict(cert)
            .map_err(|e| anyhow::anyhow!("failed to verify signature with trusted key: {}", e))
    }
}

impl std::fmt::Debug for TrustedVerificationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrustedVerificationKey")
            .field("spki", &hex::encode(&self.spki_der))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_intel_key_parses_once() {
        let first = intel_verification_key().unwrap();
        let second = intel_verification_key().unwrap();
        assert!(std::ptr::eq(first, second));
        // 2048 bit RSA SubjectPublicKeyInfo
        assert_eq!(first.spki_der().len(), 294);
    }

    #[test]
    fn fixture_key_matches_its_certificate() {
        let key = TrustedVerificationKey::from_pem(include_bytes!("../data/root_ca_pub.pem")).unwrap();
        let root = Certificate::load_pem_chain(include_bytes!("../data/root_ca.pem")).unwrap();
        let leaf = Certificate::load_pem_chain(include_bytes!("../data/signing.pem")).unwrap();

        assert!(key.matches(&root[0]));
        assert!(!key.matches(&leaf[0]));
        assert!(key.verify_issued(&root[0]).is_ok());
        assert!(key.verify_issued(&leaf[0]).is_ok());
    }

    #[test]
    fn der_key_matches_pem_key() {
        let block = pem::parse(include_bytes!("../data/root_ca_pub.pem")).unwrap();
        let key = TrustedVerificationKey::from_der(block.contents()).unwrap();
        assert_eq!(key.spki_der(), block.contents());

        let root = Certificate::load_pem_chain(include_bytes!("../data/root_ca.pem")).unwrap();
        assert!(key.verify_issued(&root[0]).is_ok());
    }

    #[test]
    fn undecodable_block_is_a_format_error() {
        let err = TrustedVerificationKey::from_pem(b"not a pem block").unwrap_err();
        assert!(matches!(err, AttestationError::KeyFormat(_)));

        let err = TrustedVerificationKey::from_pem(include_bytes!("../data/root_ca.pem")).unwrap_err();
        assert!(matches!(err, AttestationError::KeyFormat(_)));
    }

    #[test]
    fn malformed_key_is_a_parse_error() {
        let bogus = pem::encode(&pem::Pem::new("PUBLIC KEY", vec![0x30, 0x03, 0x02, 0x01, 0x01]));
        let err = TrustedVerificationKey::from_pem(bogus.as_bytes()).unwrap_err();
        assert!(matches!(err, AttestationError::KeyParse(_)));
    }
}
