//! The small set of AML data object types the namespace core needs to know about.
//!
//! Full AML value semantics (implicit conversions, references, buffer fields as views over
//! buffers, …) are the bytecode interpreter's job. This module only carries enough of a value
//! representation for `Name` nodes and for the predefined native methods the core installs during
//! bootstrap (`_OSI`, `_OS_`, `_REV`).

use alloc::{string::String, vec::Vec};

/// A data object as it would be stored in a `Name` node, or passed to/returned from a native
/// method override.
#[derive(Clone, Debug, PartialEq)]
pub enum AmlValue {
    Integer(u64),
    String(String),
    Buffer(Vec<u8>),
    Package(Vec<AmlValue>),
}

impl AmlValue {
    pub fn zero() -> AmlValue {
        AmlValue::Integer(0)
    }

    pub fn ones() -> AmlValue {
        AmlValue::Integer(u64::MAX)
    }

    pub fn as_integer(&self) -> Option<u64> {
        match self {
            AmlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AmlValue::String(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

/// The identifier a device's `_HID`/`_CID` is compared against in
/// [`crate::query::check_device_pnp_id`]. Narrower than [`AmlValue`] because only integers
/// (packed EISA IDs) and strings are ever valid hardware/compatible IDs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PnpId {
    Eisa(u32),
    String(String),
}

impl PnpId {
    /// Extracts a [`PnpId`] from an evaluated `_HID`/`_CID` result, or `None` if the value has a
    /// type that can never be a valid hardware ID.
    pub fn from_value(value: &AmlValue) -> Option<PnpId> {
        match value {
            AmlValue::Integer(i) => u32::try_from(*i).ok().map(PnpId::Eisa),
            AmlValue::String(s) => Some(PnpId::String(s.clone())),
            _ => None,
        }
    }
}
