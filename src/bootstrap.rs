//! Namespace bootstrap: seed the predefined objects, then drive the external AML interpreter
//! over each loaded table in order.

use crate::name::AmlName;
use crate::node::{MethodBody, MethodData, MethodFlags, NativeMethod, Node, NodeId, NodeKind};
use crate::segment::AmlSegment;
use crate::value::AmlValue;
use crate::{AmlError, Namespace};
use alloc::string::ToString;
use core::str::FromStr;
use log::info;

/// Host primitive the namespace core needs at bootstrap: locating ACPI tables. Everything else
/// a host might otherwise be asked to provide (`malloc`/`realloc`/`free`, `panic`, `log`) is
/// realized directly through `alloc` and the `log`/core panic machinery rather than through this
/// trait, because - unlike table scanning - none of them are actually platform-specific here.
pub trait Handler: Send + Sync {
    /// Locates the `index`-th ACPI table with the four-byte `signature`, returning its raw bytes
    /// (header included) for the namespace's lifetime, or `None` if no such table exists.
    fn scan_table(&self, signature: [u8; 4], index: usize) -> Option<&'static [u8]>;
}

/// The single entry point the external AML bytecode interpreter exposes back to the namespace
/// core: given a context scope and a loaded segment, parse its bytecode and install whatever
/// objects it defines. The interpreter is responsible for its own operand stack and
/// opcode dispatch; it calls back into [`Namespace`] (`resolve`, `resolve_new_node`,
/// `install_nsnode`, …) to do so.
pub trait Populate {
    fn populate(&mut self, namespace: &mut Namespace, ctx: NodeId, segment: &AmlSegment) -> Result<(), AmlError>;
}

fn install_device(namespace: &mut Namespace, root: NodeId, name: &str) -> NodeId {
    let mut node = Node::new(NodeKind::Device);
    let parsed = AmlName::from_str(name).expect("predefined object name is well-formed");
    namespace.resolve_new_node(&mut node, root, &parsed).expect("predefined object scope always resolves");
    namespace.install_nsnode(node)
}

fn install_native_method(namespace: &mut Namespace, root: NodeId, name: &str, flags: MethodFlags, body: NativeMethod) {
    let mut node =
        Node::new(NodeKind::Method(MethodData { flags, body: MethodBody::Native(body) }));
    let parsed = AmlName::from_str(name).expect("predefined object name is well-formed");
    namespace.resolve_new_node(&mut node, root, &parsed).expect("predefined object scope always resolves");
    namespace.install_nsnode(node);
}

/// `\_OSI`: queries OS-capability support. Follows Linux's policy: claim every `Windows *`
/// string and `Darwin`, refuse `Linux` (tables asking this are buggy), recognise a handful of
/// ACPI feature-group strings.
fn osi_method(args: &[AmlValue]) -> Result<AmlValue, AmlError> {
    let queried = args.first().and_then(AmlValue::as_str).ok_or(AmlError::InvalidArgAccess(0))?;

    let supported = matches!(
        queried,
        "Windows 2000"
            | "Windows 2001"
            | "Windows 2001 SP1"
            | "Windows 2001 SP2"
            | "Windows 2001.1"
            | "Windows 2001.1 SP1"
            | "Windows 2006"
            | "Windows 2006 SP1"
            | "Windows 2006 SP2"
            | "Windows 2006.1"
            | "Windows 2009"
            | "Windows 2012"
            | "Windows 2013"
            | "Windows 2015"
            | "Windows 2016"
            | "Windows 2017"
            | "Windows 2017.2"
            | "Windows 2018"
            | "Windows 2018.2"
            | "Windows 2019"
            | "Darwin"
            | "Extended Address Space Descriptor"
            | "3.0 Thermal Model"
            | "3.0 _SCP Extensions"
    );

    if queried == "Linux" {
        log::warn!("ACPI evaluated _OSI(\"Linux\"). This is a bug in the table. Reporting no support.");
    }

    Ok(if supported { AmlValue::ones() } else { AmlValue::zero() })
}

/// `\_OS_`: the pre-`_OSI` OS-identification string. Modern firmware shouldn't use this, but we
/// follow Linux (and the ACPI spec's own recommendation) in returning `"Microsoft Windows NT"`
/// to avoid firmware quirks tied to less common answers.
fn os_method(_args: &[AmlValue]) -> Result<AmlValue, AmlError> {
    Ok(AmlValue::String("Microsoft Windows NT".to_string()))
}

/// `\_REV`: the "AML interpreter revision". Firmware has historically misused this to detect
/// Linux, so - like Linux itself since 2015 - we just return `2`.
fn rev_method(_args: &[AmlValue]) -> Result<AmlValue, AmlError> {
    Ok(AmlValue::Integer(2))
}

/// Builds the root node and installs the eight predefined objects: five device stubs and three
/// native methods, all of which must exist before any AML is parsed so that tables can reference
/// them unconditionally.
fn create_root(namespace: &mut Namespace) -> NodeId {
    let root = namespace.root();

    for name in ["\\_SB_", "\\_SI_", "\\_GPE", "\\_PR_", "\\_TZ_"] {
        install_device(namespace, root, name);
    }

    install_native_method(namespace, root, "\\_OSI", MethodFlags::new(1, false, 0), osi_method);
    install_native_method(namespace, root, "\\_OS_", MethodFlags::new(0, false, 0), os_method);
    install_native_method(namespace, root, "\\_REV", MethodFlags::new(0, false, 0), rev_method);

    root
}

fn load_table(namespace: &mut Namespace, bytes: &'static [u8], index: usize) -> Result<AmlSegment, AmlError> {
    let segment = AmlSegment::from_table(bytes, index)?;
    info!(
        "loaded AML table '{}', {} bytes of AML code",
        core::str::from_utf8(&segment.signature).unwrap_or("????"),
        segment.data.len()
    );
    namespace.retain_segment(segment);
    Ok(segment)
}

/// Creates the ACPI namespace: builds the root and predefined objects, then loads the DSDT,
/// every SSDT, and every PSDT, driving `populate` over each in turn. Each table load is
/// independent but contributes to the same shared namespace. Host table-scan failure for the
/// DSDT, or allocation failure, is fatal - this function panics rather than returning an error,
/// matching `lai_create_namespace`'s `lai_panic` calls for exactly the same conditions.
pub fn create_namespace<H: Handler, P: Populate>(handler: &H, populate: &mut P) -> Namespace {
    let mut namespace = Namespace::new();

    let fadt = handler.scan_table(*b"FACP", 0).expect("unable to find ACPI FADT");
    namespace.set_fadt(fadt);

    let root = create_root(&mut namespace);

    let dsdt = handler.scan_table(*b"DSDT", 0).expect("unable to find ACPI DSDT");
    let segment = load_table(&mut namespace, dsdt, 0).expect("malformed DSDT header");
    populate.populate(&mut namespace, root, &segment).expect("failed to populate namespace from DSDT");

    let mut index = 0;
    while let Some(bytes) = handler.scan_table(*b"SSDT", index) {
        let segment = load_table(&mut namespace, bytes, index).expect("malformed SSDT header");
        populate.populate(&mut namespace, root, &segment).expect("failed to populate namespace from SSDT");
        index += 1;
    }

    // PSDTs are treated identically to SSDTs, scanned for ACPI 1.0 compatibility.
    index = 0;
    while let Some(bytes) = handler.scan_table(*b"PSDT", index) {
        let segment = load_table(&mut namespace, bytes, index).expect("malformed PSDT header");
        populate.populate(&mut namespace, root, &segment).expect("failed to populate namespace from PSDT");
        index += 1;
    }

    info!("ACPI namespace created, total of {} nodes", namespace.iter().count());
    namespace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::NameSeg;

    struct StubHandler {
        dsdt: &'static [u8],
        fadt: &'static [u8],
    }

    impl Handler for StubHandler {
        fn scan_table(&self, signature: [u8; 4], index: usize) -> Option<&'static [u8]> {
            match (&signature, index) {
                (b"FACP", 0) => Some(self.fadt),
                (b"DSDT", 0) => Some(self.dsdt),
                _ => None,
            }
        }
    }

    struct NoopPopulate;

    impl Populate for NoopPopulate {
        fn populate(&mut self, _namespace: &mut Namespace, _ctx: NodeId, _segment: &AmlSegment) -> Result<(), AmlError> {
            Ok(())
        }
    }

    fn header_only_table(signature: &[u8; 4]) -> &'static [u8] {
        let mut bytes = alloc::vec![0u8; 36];
        bytes[0..4].copy_from_slice(signature);
        bytes[4..8].copy_from_slice(&36u32.to_le_bytes());
        alloc::boxed::Box::leak(bytes.into_boxed_slice())
    }

    #[test]
    fn bootstrap_minimum_creates_nine_nodes() {
        let handler = StubHandler { dsdt: header_only_table(b"DSDT"), fadt: header_only_table(b"FACP") };
        let namespace = create_namespace(&handler, &mut NoopPopulate);
        let root = namespace.root();

        for name in [*b"_SB_", *b"_SI_", *b"_GPE", *b"_PR_", *b"_TZ_", *b"_OSI", *b"_OS_", *b"_REV"] {
            assert!(namespace.get_child(root, NameSeg(name)).is_some(), "missing predefined object {:?}", name);
        }

        // root + 8 predefined objects.
        assert_eq!(namespace.iter().count(), 9);
    }

    #[test]
    fn osi_reports_no_support_for_linux_without_panicking() {
        assert_eq!(osi_method(&[AmlValue::String("Linux".to_string())]).unwrap(), AmlValue::zero());
    }

    #[test]
    fn osi_supports_recent_windows_strings() {
        assert_eq!(osi_method(&[AmlValue::String("Windows 2015".to_string())]).unwrap(), AmlValue::ones());
    }

    #[test]
    fn rev_is_two() {
        assert_eq!(rev_method(&[]).unwrap(), AmlValue::Integer(2));
    }
}
