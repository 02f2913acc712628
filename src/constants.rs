// https://api.trustedservices.intel.com/documents/sgx-attestation-api-spec.pdf

/// Attestation verification report endpoint of the IAS development environment.
pub const IAS_REPORT_URL: &str = "https://test-as.sgx.trustedservices.intel.com:443/attestation/sgx/v2/report";

pub const REPORT_SIGNATURE_HEADER: &str = "X-IASReport-Signature";
pub const REPORT_SIGNING_CERTIFICATE_HEADER: &str = "X-IASReport-Signing-Certificate";

/// IAS rejects nonces longer than 32 characters.
pub const MAX_NONCE_LEN: usize = 32;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const QUOTE_HEADER_LEN: usize = 48;
pub const ENCLAVE_REPORT_LEN: usize = 384;
/// Header plus ISV enclave report, the part of the quote IAS echoes back.
/// A multiple of three, so the base64 of the body is a prefix of the base64 of the quote.
pub const QUOTE_BODY_LEN: usize = QUOTE_HEADER_LEN + ENCLAVE_REPORT_LEN;

pub const SGX_FLAGS_DEBUG: u64 = 0x0000_0000_0000_0002;

/// Public key of the Intel SGX Attestation Report Signing certificate.
pub const INTEL_VERIFICATION_KEY_PEM: &str = "
-----BEGIN PUBLIC KEY-----
MIIBIjANBgkqhkiG9w0BAQEFAAOCAQ8AMIIBCgKCAQEAqXot4OZuphR8nudFrAFi
aGxxkgma/Es/BA+tbeCTUR106AL1ENcWA4FX3K+E9BBL0/7X5rj5nIgX/R/1ubhk
KWw9gfqPG3KeAtIdcv/uTO1yXv50vqaPvE1CRChvzdS/ZEBqQ5oVvLTPZ3VEicQj
lytKgN9cLnxbwtuvLUK7eyRPfJW/ksddOzP8VBBniolYnRCD2jrMRZ8nBM2ZWYwn
XnwYeOAHV+W9tOhAImwRwKF/95yAsVwd21ryHMJBcGH70qLagZ7Ttyt++qO/6+KA
XJuKwZqjRlEtSEz8gZQeFfVYgcwSfo96oSMAzVr7V0L6HSDLRnpb6xxmbPdqNol4
tQIDAQAB
-----END PUBLIC KEY-----";
