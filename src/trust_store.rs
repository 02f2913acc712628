use std::time::SystemTime;

use anyhow::{bail, Context};
use x509_cert::certificate::CertificateInner;
use x509_verify::VerifyingKey;

use crate::trusted_key::TrustedVerificationKey;
use crate::utils::Expireable;

/// TrustStore anchors report signing certificate chains to a single pinned key.
///
/// A chain is accepted when it is walked from an anchor down to the leaf with every
/// link signed by its issuer. The anchor is the first certificate certifying the
/// pinned key itself or, when no certificate does, the last certificate of the chain,
/// which must then be signed by the pinned key.
pub struct TrustStore<'a> {
    /// Pinned root of trust.
    pub anchor: &'a TrustedVerificationKey,
    pub current_time: SystemTime,
}

/// Wrapper for a verified certificate and its parsed key.
pub struct TrustedIdentity {
    pub cert: CertificateInner,
    pub pk: VerifyingKey,
}

impl<'a> TrustStore<'a> {
    /// `current_time` decides certificate validity, so it must come from a trusted clock.
    pub fn new(current_time: SystemTime, anchor: &'a TrustedVerificationKey) -> Self {
        Self {
            anchor,
            current_time,
        }
    }

    /// Verify the leaf node in a certificate chain is rooted in the pinned key.
    ///
    /// # Parameters
    /// * `chain` - The certificate chain to verify, leaf first.
    pub fn verify_chain_leaf(&self, chain: &[CertificateInner]) -> anyhow::Result<TrustedIdentity> {
        if chain.is_empty() {
            bail!("certificate chain is empty");
        }

        // Anything above a certificate that carries the pinned key is irrelevant.
        let chain = match chain.iter().position(|cert| self.anchor.matches(cert)) {
            Some(pinned) => &chain[..=pinned],
            None => {
                let root = chain.last().context("certificate chain is empty")?;
                self.anchor
                    .verify_issued(root)
                    .context("chain root is not signed by the trusted key")?;
                chain
            },
        };

        if !chain.valid_at(self.current_time) {
            bail!("certificate chain is outside its validity window");
        }

        // Anchor first, leaf last.
        let mut chain = chain.iter().rev().peekable();
        let mut issuer: Option<TrustedIdentity> = None;

        loop {
            let cert = chain.next().context("chain walk ran past the leaf")?;

            if let Some(signer) = &issuer {
                if signer.cert.tbs_certificate.subject != cert.tbs_certificate.issuer {
                    bail!(
                        "certificate {} is not issued by {}",
                        cert.tbs_certificate.subject,
                        signer.cert.tbs_certificate.subject
                    );
                }

                signer
                    .pk
                    .verify_strict(cert)
                    .map_err(|e| anyhow::anyhow!("signature on {} does not verify: {}", cert.tbs_certificate.subject, e))?;
            }

            let pk = cert
                .try_into()
                .map_err(|e| anyhow::anyhow!("unsupported key in {}: {}", cert.tbs_certificate.subject, e))?;

            let identity = TrustedIdentity { cert: cert.clone(), pk };

            if chain.peek().is_none() {
                return Ok(identity);
            }
            issuer = Some(identity);
        }
    }
}
