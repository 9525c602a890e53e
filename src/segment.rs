//! AML segments: one loaded ACPI table (DSDT/SSDT/PSDT) together with a stable index, retained
//! for the lifetime of the namespace because `Method` nodes reference their owning segment by
//! handle.

use crate::AmlError;

/// The 36-byte header common to every ACPI system description table. The core only needs the
/// signature and length to slice out the AML body; fuller field decoding (OEM ID, checksum,
/// revision, …) belongs to the table-scanning host, not this crate.
///
/// Layout grounded on the common `repr(C, packed)` ACPI system-description-table header pattern.
pub struct SdtHeader {
    pub signature: [u8; 4],
    pub length: u32,
}

impl SdtHeader {
    pub const SIZE: usize = 36;

    pub fn parse(bytes: &[u8]) -> Result<SdtHeader, AmlError> {
        if bytes.len() < Self::SIZE {
            return Err(AmlError::UnexpectedEndOfStream);
        }
        let signature = [bytes[0], bytes[1], bytes[2], bytes[3]];
        let length = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]);
        Ok(SdtHeader { signature, length })
    }
}

/// A stable handle identifying one loaded AML segment, assigned in load order.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct SegmentId(pub(crate) u32);

/// One loaded AML table: its signature, its index among same-signature tables (DSDT is always
/// index 0; SSDTs and PSDTs are numbered in scan order), and the AML bytecode body (the table
/// bytes with the `SdtHeader` stripped off).
#[derive(Clone, Copy)]
pub struct AmlSegment {
    pub signature: [u8; 4],
    pub index: usize,
    pub data: &'static [u8],
}

impl AmlSegment {
    pub(crate) fn from_table(table: &'static [u8], index: usize) -> Result<AmlSegment, AmlError> {
        let header = SdtHeader::parse(table)?;
        let length = header.length as usize;
        if length < SdtHeader::SIZE || length > table.len() {
            return Err(AmlError::UnexpectedEndOfStream);
        }
        Ok(AmlSegment { signature: header.signature, index, data: &table[SdtHeader::SIZE..length] })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(signature: &[u8; 4], body: &[u8]) -> alloc::vec::Vec<u8> {
        let mut bytes = alloc::vec![0u8; SdtHeader::SIZE];
        bytes[0..4].copy_from_slice(signature);
        let length = (SdtHeader::SIZE + body.len()) as u32;
        bytes[4..8].copy_from_slice(&length.to_le_bytes());
        bytes.extend_from_slice(body);
        bytes
    }

    #[test]
    fn slices_off_the_header() {
        let bytes = table(b"DSDT", &[1, 2, 3, 4]);
        let leaked: &'static [u8] = alloc::boxed::Box::leak(bytes.into_boxed_slice());
        let segment = AmlSegment::from_table(leaked, 0).unwrap();
        assert_eq!(segment.signature, *b"DSDT");
        assert_eq!(segment.data, &[1, 2, 3, 4]);
        assert_eq!(segment.index, 0);
    }

    #[test]
    fn rejects_truncated_table() {
        let bytes = [0u8; 10];
        assert!(AmlSegment::from_table(&bytes, 0).is_err());
    }
}
