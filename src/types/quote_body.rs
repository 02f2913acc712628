use anyhow::{anyhow, Context};
use base64ct::{Base64, Encoding};
use zerocopy::{little_endian, AsBytes, FromBytes, FromZeroes};

use crate::constants::{QUOTE_BODY_LEN, SGX_FLAGS_DEBUG};
use crate::utils;

/// Header of an EPID quote (`sgx_quote_t` up to the report body).
#[derive(Debug, Clone, Copy, FromZeroes, FromBytes, AsBytes)]
#[repr(C)]
pub struct QuoteHeader {
    pub version: little_endian::U16,
    pub sign_type: little_endian::U16,
    pub epid_group_id: [u8; 4],
    pub qe_svn: little_endian::U16,
    pub pce_svn: little_endian::U16,
    pub xeid: little_endian::U32,
    pub basename: [u8; 32],
}

/// ISV enclave report (`sgx_report_body_t`).
#[derive(Debug, Clone, Copy, FromZeroes, FromBytes, AsBytes)]
#[repr(C)]
pub struct EnclaveReportBody {
    pub cpu_svn: [u8; 16],
    pub misc_select: little_endian::U32,
    pub reserved_1: [u8; 28],
    /// Flags (8 bytes) followed by XFRM (8 bytes).
    pub attributes: [u8; 16],
    pub mr_enclave: [u8; 32],
    pub reserved_2: [u8; 32],
    pub mr_signer: [u8; 32],
    pub reserved_3: [u8; 96],
    pub isv_prod_id: little_endian::U16,
    pub isv_svn: little_endian::U16,
    pub reserved_4: [u8; 60],
    /// 64 bytes chosen by the enclave, here the enclave's public key.
    pub report_data: [u8; 64],
}

impl EnclaveReportBody {
    pub fn flags(&self) -> u64 {
        let mut flags = [0u8; 8];
        flags.copy_from_slice(&self.attributes[..8]);
        u64::from_le_bytes(flags)
    }

    pub fn is_debug(&self) -> bool {
        self.flags() & SGX_FLAGS_DEBUG != 0
    }
}

/// The part of the quote IAS echoes back as `isvEnclaveQuoteBody`.
#[derive(Debug, Clone, Copy)]
pub struct QuoteBody {
    pub header: QuoteHeader,
    pub report: EnclaveReportBody,
}

impl QuoteBody {
    pub fn read(bytes: &mut &[u8]) -> anyhow::Result<Self> {
        if bytes.len() < QUOTE_BODY_LEN {
            return Err(anyhow!(
                "quote body is {} bytes, expected at least {}",
                bytes.len(),
                QUOTE_BODY_LEN
            ));
        }

        let header = utils::read_from_bytes::<QuoteHeader>(bytes)
            .ok_or_else(|| anyhow!("underflow reading quote header"))?;
        let report = utils::read_from_bytes::<EnclaveReportBody>(bytes)
            .ok_or_else(|| anyhow!("underflow reading enclave report body"))?;

        Ok(Self { header, report })
    }

    pub fn from_base64(encoded: &str) -> anyhow::Result<Self> {
        let bytes = Base64::decode_vec(encoded)
            .map_err(|e| anyhow!("quote body is not valid base64: {}", e))?;
        Self::read(&mut bytes.as_slice()).context("failed to read echoed quote body")
    }
}
