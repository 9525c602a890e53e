//! AML name grammar: the compact binary encoding used inside DSDT/SSDT/PSDT bytecode, and the
//! human-readable textual form used by [`crate::namespace::Namespace::resolve_path`] and by
//! [`crate::namespace::Namespace::stringify_node_path`].

use crate::AmlError;
use alloc::{string::String, vec::Vec};
use core::{fmt, str::FromStr};

/// `\`, marks a name as absolute (resolution restarts at the root).
pub const ROOT_CHAR: u8 = b'\\';
/// `^`, pops one parent level per occurrence.
pub const PARENT_PREFIX_CHAR: u8 = b'^';
/// Fixes the segment count to exactly two.
pub const DUAL_PREFIX: u8 = 0x2E;
/// Next byte gives the segment count (must be `> 2`).
pub const MULTI_PREFIX: u8 = 0x2F;
/// Zero segments - the name refers to the current scope.
pub const NULL_NAME: u8 = 0x00;

fn is_lead_name_char(b: u8) -> bool {
    b.is_ascii_uppercase() || b == b'_'
}

fn is_name_char(b: u8) -> bool {
    is_lead_name_char(b) || b.is_ascii_digit()
}

/// A single 4-character ACPI name segment, right-padded with `_`.
///
/// Segments are the atoms both the binary and textual name grammars are built from; every
/// `NameSeg` is guaranteed, by construction, to match `[A-Z_][A-Z0-9_]{3}`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NameSeg(pub [u8; 4]);

impl NameSeg {
    /// Placeholder used by freshly-allocated nodes before [`crate::namespace::Namespace::resolve_new_node`]
    /// fills in the real name. Never observed by a caller - every installed node has gone through
    /// name resolution first.
    pub const PLACEHOLDER: NameSeg = NameSeg(*b"____");

    /// Builds a `NameSeg` from four raw bytes already known to be a valid AML name segment (as
    /// produced by the parser, which has already checked the grammar via [`Self::from_raw`]).
    pub fn from_raw(bytes: [u8; 4]) -> Result<NameSeg, AmlError> {
        if !is_lead_name_char(bytes[0]) {
            return Err(AmlError::InvalidNameSeg);
        }
        for &b in &bytes[1..] {
            if !is_name_char(b) {
                return Err(AmlError::InvalidNameSeg);
            }
        }
        Ok(NameSeg(bytes))
    }

    /// Builds a `NameSeg` from a textual fragment (1-4 characters), right-padding with `_` as
    /// ACPI requires of textual names shorter than four characters.
    pub fn from_str_padded(s: &str) -> Result<NameSeg, AmlError> {
        if s.is_empty() || s.len() > 4 {
            return Err(AmlError::InvalidNameSeg);
        }
        let mut bytes = [b'_'; 4];
        for (i, c) in s.bytes().enumerate() {
            bytes[i] = c.to_ascii_uppercase();
        }
        NameSeg::from_raw(bytes)
    }

    pub fn as_str(&self) -> &str {
        // Every byte was validated to be ASCII on construction.
        core::str::from_utf8(&self.0).unwrap()
    }
}

impl fmt::Debug for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl fmt::Display for NameSeg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed AML name: how many levels to ascend, whether to restart at the root, and the
/// segments to descend through afterwards.
///
/// All consuming operations (`resolve`, `resolve_new_node`, `stringify`) take `&self` - a parsed
/// name is never destroyed by use.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AmlName {
    pub is_absolute: bool,
    pub height: u32,
    pub segments: Vec<NameSeg>,
    /// True iff this name is a single relative segment with no parent prefix - the signal that
    /// the "walk up scopes" resolution rule applies.
    pub search_scopes: bool,
}

impl AmlName {
    /// The name of the current scope (zero segments, no height, relative).
    pub fn null() -> AmlName {
        AmlName { is_absolute: false, height: 0, segments: Vec::new(), search_scopes: false }
    }

    pub fn root() -> AmlName {
        AmlName { is_absolute: true, height: 0, segments: Vec::new(), search_scopes: false }
    }

    /// Parses the AML-encoded form of a name out of `data`, returning the parsed name and the
    /// number of bytes consumed.
    pub fn parse(data: &[u8]) -> Result<(AmlName, usize), AmlError> {
        let mut i = 0;
        let mut is_absolute = false;
        let mut height = 0u32;

        match data.first() {
            Some(&ROOT_CHAR) => {
                is_absolute = true;
                i += 1;
            }
            _ => {
                while data.get(i) == Some(&PARENT_PREFIX_CHAR) {
                    height += 1;
                    i += 1;
                }
            }
        }

        let num_segs = match data.get(i).copied() {
            Some(NULL_NAME) => {
                i += 1;
                0
            }
            Some(DUAL_PREFIX) => {
                i += 1;
                2
            }
            Some(MULTI_PREFIX) => {
                i += 1;
                let n = *data.get(i).ok_or(AmlError::UnexpectedEndOfStream)?;
                if n <= 2 {
                    return Err(AmlError::InvalidNameSeg);
                }
                i += 1;
                n as usize
            }
            Some(b) if is_lead_name_char(b) => 1,
            Some(b) => return Err(AmlError::UnexpectedByte(b)),
            None => return Err(AmlError::UnexpectedEndOfStream),
        };

        let needed = num_segs * 4;
        if data.len() < i + needed {
            return Err(AmlError::UnexpectedEndOfStream);
        }

        let mut segments = Vec::with_capacity(num_segs);
        for s in 0..num_segs {
            let raw: [u8; 4] = data[i + s * 4..i + s * 4 + 4].try_into().unwrap();
            segments.push(NameSeg::from_raw(raw)?);
        }
        i += needed;

        let search_scopes = !is_absolute && height == 0 && num_segs == 1;
        Ok((AmlName { is_absolute, height, segments, search_scopes }, i))
    }

    /// Renders the AML-binary form of this name back to its textual representation
    /// (`\^^SEG1.SEG2…`).
    pub fn stringify(&self) -> String {
        let mut s = String::new();
        if self.is_absolute {
            s.push('\\');
        }
        for _ in 0..self.height {
            s.push('^');
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                s.push('.');
            }
            s.push_str(seg.as_str());
        }
        s
    }
}

impl fmt::Display for AmlName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.stringify())
    }
}

impl FromStr for AmlName {
    type Err = AmlError;

    /// Parses the textual surface syntax a human would write: `\A.B.CDEF`, `^X`, names shorter
    /// than four characters auto-padded with `_`. Does not implement scope search - see
    /// [`crate::namespace::Namespace::resolve_search`] for that.
    fn from_str(s: &str) -> Result<AmlName, AmlError> {
        let bytes = s.as_bytes();
        let mut i = 0;
        let mut is_absolute = false;
        let mut height = 0u32;

        if bytes.first() == Some(&ROOT_CHAR) {
            is_absolute = true;
            i += 1;
        } else {
            while bytes.get(i) == Some(&PARENT_PREFIX_CHAR) {
                height += 1;
                i += 1;
            }
        }

        if i == bytes.len() {
            return Ok(AmlName { is_absolute, height, segments: Vec::new(), search_scopes: false });
        }

        let mut segments = Vec::new();
        for part in s[i..].split('.') {
            if part.is_empty() {
                // Trailing dot, or an empty segment in the middle of the path - both rejected.
                return Err(AmlError::EmptyNamesAreInvalid);
            }
            segments.push(NameSeg::from_str_padded(part)?);
        }

        let search_scopes = !is_absolute && height == 0 && segments.len() == 1;
        Ok(AmlName { is_absolute, height, segments, search_scopes })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn parses_null_name() {
        let (name, len) = AmlName::parse(&[0x00]).unwrap();
        assert_eq!(len, 1);
        assert!(!name.is_absolute);
        assert_eq!(name.height, 0);
        assert!(name.segments.is_empty());
        assert!(!name.search_scopes);
    }

    #[test]
    fn parses_single_segment_is_search_scopes() {
        let (name, len) = AmlName::parse(b"PCI0").unwrap();
        assert_eq!(len, 4);
        assert!(name.search_scopes);
        assert_eq!(name.segments, vec![NameSeg(*b"PCI0")]);
    }

    #[test]
    fn parses_absolute_dual() {
        let mut data = alloc::vec![ROOT_CHAR, DUAL_PREFIX];
        data.extend_from_slice(b"_SB_");
        data.extend_from_slice(b"PCI0");
        let (name, len) = AmlName::parse(&data).unwrap();
        assert_eq!(len, data.len());
        assert!(name.is_absolute);
        assert!(!name.search_scopes);
        assert_eq!(name.segments, vec![NameSeg(*b"_SB_"), NameSeg(*b"PCI0")]);
    }

    #[test]
    fn parses_multi_prefix() {
        let mut data = alloc::vec![MULTI_PREFIX, 3u8];
        data.extend_from_slice(b"_SB_");
        data.extend_from_slice(b"PCI0");
        data.extend_from_slice(b"LPCB");
        let (name, _) = AmlName::parse(&data).unwrap();
        assert_eq!(name.segments.len(), 3);
    }

    #[test]
    fn multi_prefix_requires_more_than_two_segments() {
        let data = [MULTI_PREFIX, 2u8];
        assert!(AmlName::parse(&data).is_err());
    }

    #[test]
    fn parent_prefixes_increase_height() {
        let mut data = alloc::vec![PARENT_PREFIX_CHAR, PARENT_PREFIX_CHAR];
        data.extend_from_slice(b"PCI0");
        let (name, _) = AmlName::parse(&data).unwrap();
        assert_eq!(name.height, 2);
        assert!(!name.is_absolute);
        assert!(!name.search_scopes);
    }

    #[test]
    fn stringify_round_trips_through_from_str() {
        let (name, _) = {
            let mut data = alloc::vec![ROOT_CHAR, DUAL_PREFIX];
            data.extend_from_slice(b"_SB_");
            data.extend_from_slice(b"PCI0");
            AmlName::parse(&data).unwrap()
        };
        let text = name.stringify();
        assert_eq!(text, "\\_SB_.PCI0");
        let reparsed = AmlName::from_str(&text).unwrap();
        assert_eq!(reparsed, name);
    }

    #[test]
    fn from_str_pads_short_segments() {
        let name = AmlName::from_str("\\A.B").unwrap();
        assert_eq!(name.segments, vec![NameSeg(*b"A___"), NameSeg(*b"B___")]);
    }

    #[test]
    fn from_str_rejects_trailing_dot() {
        assert!(AmlName::from_str("\\A.B.").is_err());
    }

    #[test]
    fn from_str_rejects_empty_middle_segment() {
        assert!(AmlName::from_str("\\A..B").is_err());
    }

    #[test]
    fn from_str_root_alone_has_no_segments() {
        let name = AmlName::from_str("\\").unwrap();
        assert!(name.is_absolute);
        assert!(name.segments.is_empty());
    }
}
