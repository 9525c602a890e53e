//! `acpi-namespace` is the namespace core of a lightweight ACPI implementation: it builds and
//! manages the hierarchical ACPI namespace that arises from parsing AML (ACPI Machine Language)
//! tables - DSDT, SSDTs, PSDTs - and resolves ACPI name references expressed both in their
//! compact binary AML form and in their human-readable textual form.
//!
//! This crate does **not** execute AML. The bytecode interpreter (operand stack, opcode
//! dispatch, method execution) is an external collaborator that drives this crate through a
//! single entry point per AML segment ([`bootstrap::Populate::populate`]); in turn, the
//! interpreter creates nodes and looks up scopes entirely through this crate's public surface
//! (`Namespace::resolve`, `Namespace::resolve_new_node`, `Namespace::install_nsnode`, …).
//!
//! ### Using the crate
//! Implement [`bootstrap::Handler`] to let the core locate ACPI tables, and [`bootstrap::Populate`]
//! to let an (external) AML interpreter parse them, then call [`bootstrap::create_namespace`]:
//!
//! ```ignore
//! let namespace = acpi_namespace::create_namespace(&my_handler, &mut my_interpreter);
//! let lpcb = namespace.resolve_path(None, "\\_SB_.PCI0.LPCB").unwrap();
//! ```
//!
//! ### Layout
//! - [`name`] - the AML name grammar: parsing, rendering, and the derived `search_scopes` flag.
//! - [`node`] - the node data model and the per-parent hash-indexed child table.
//! - [`namespace`] - the tree itself plus its resolvers (reference resolution, new-name binding,
//!   textual lookup, scope search).
//! - [`bootstrap`] - seeding the predefined objects and driving the external interpreter over
//!   each AML segment.
//! - [`segment`] - the loaded-table descriptor method bodies point into.
//! - [`query`] - device-by-PNP-ID matching and OpRegion override installation.
//! - [`value`] - the minimal AML data object representation `Name` nodes and native methods use.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

pub mod bootstrap;
pub mod name;
pub mod namespace;
pub mod node;
pub mod query;
pub mod segment;
pub mod value;

pub use bootstrap::{create_namespace, Handler, Populate};
pub use name::{AmlName, NameSeg};
pub use namespace::Namespace;
pub use node::{Node, NodeId, NodeKind};
pub use query::HidEvaluator;
pub use value::{AmlValue, PnpId};

/// The single error type this crate produces. Kept as one flat, hand-rolled enum rather than a
/// `thiserror`-derived hierarchy, matching the crate this one is grounded on: a `no_std` leaf
/// crate with no room for an error-handling dependency of its own, where every variant already
/// carries exactly the context a caller needs to act on it.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum AmlError {
    /*
     * Name grammar errors.
     */
    UnexpectedEndOfStream,
    UnexpectedByte(u8),
    InvalidNameSeg,
    EmptyNamesAreInvalid,

    /*
     * Namespace tree errors.
     */
    /// Produced by [`namespace::Namespace::resolve_new_node`] when an earlier segment of a new
    /// name does not resolve to an existing scope.
    ScopeDoesNotExist(AmlName),

    /*
     * Query errors.
     */
    /// An `ns_override_opregion` target was not an `OpRegion` node.
    TypeMismatch,

    /*
     * Errors surfaced by native method bodies ([`node::NativeMethod`]), since those are part of
     * this crate's own public contract even though full method execution is out of scope.
     */
    InvalidArgAccess(u8),
}

impl core::fmt::Display for AmlError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            AmlError::UnexpectedEndOfStream => write!(f, "unexpected end of AML name stream"),
            AmlError::UnexpectedByte(b) => write!(f, "unexpected byte 0x{:02x} in AML name", b),
            AmlError::InvalidNameSeg => write!(f, "invalid AML name segment"),
            AmlError::EmptyNamesAreInvalid => write!(f, "name has no segments"),
            AmlError::ScopeDoesNotExist(name) => write!(f, "scope does not exist: {}", name),
            AmlError::TypeMismatch => write!(f, "node kind does not match the requested operation"),
            AmlError::InvalidArgAccess(i) => write!(f, "invalid access of method argument {}", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NodeId>();
    }

    #[test]
    fn smoke_builds_and_resolves_through_public_surface() {
        use crate::name::AmlName;
        use crate::node::{Node, NodeKind};
        use core::str::FromStr;

        let mut namespace = Namespace::new();
        let root = namespace.root();
        let mut device = Node::new(NodeKind::Device);
        let parsed = AmlName::from_str("\\_SB_").unwrap();
        namespace.resolve_new_node(&mut device, root, &parsed).unwrap();
        let sb = namespace.install_nsnode(device);

        assert_eq!(namespace.resolve_path(None, "\\_SB_"), Some(sb));
    }
}
