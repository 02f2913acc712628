//! Turns a raw authority response into an [`AttestationReport`].

use base64ct::{Base64, Encoding};
use percent_encoding::percent_decode_str;
use tracing::debug;
use x509_cert::Certificate;

use crate::error::{AttestationError, Result};
use crate::types::{AttestationReport, RawResponse, ReportBody};

pub fn parse(response: RawResponse) -> Result<AttestationReport> {
    let body = ReportBody::from_slice(&response.body)?;
    let signature = decode_signature(&response.signature)?;
    let signing_chain = decode_certificate_chain(&response.signing_certificate)?;

    debug!(
        report_id = %body.id,
        status = %body.isv_enclave_quote_status,
        chain_len = signing_chain.len(),
        "parsed attestation report"
    );

    Ok(AttestationReport {
        body,
        raw_body: response.body,
        signature,
        signing_chain,
        signature_header: response.signature,
        signing_certificate_header: response.signing_certificate,
    })
}

fn decode_signature(header: &str) -> Result<Vec<u8>> {
    let signature = Base64::decode_vec(header.trim()).map_err(|e| {
        AttestationError::MalformedResponse(format!("report signature is not base64: {e}"))
    })?;

    if signature.is_empty() {
        return Err(AttestationError::MalformedResponse(
            "report signature is empty".to_string(),
        ));
    }

    Ok(signature)
}

/// The header carries the PEM chain URL-encoded, signing certificate first.
fn decode_certificate_chain(header: &str) -> Result<Vec<Certificate>> {
    let pem = percent_decode_str(header).decode_utf8().map_err(|e| {
        AttestationError::MalformedResponse(format!("signing certificate header is not UTF-8: {e}"))
    })?;

    let pem = pem.trim();
    if pem.is_empty() {
        return Err(AttestationError::MalformedResponse(
            "signing certificate header is empty".to_string(),
        ));
    }

    let chain = Certificate::load_pem_chain(pem.as_bytes()).map_err(|e| {
        AttestationError::MalformedResponse(format!("failed to parse signing certificate chain: {e}"))
    })?;

    if chain.is_empty() {
        return Err(AttestationError::MalformedResponse(
            "signing certificate chain is empty".to_string(),
        ));
    }

    Ok(chain)
}
