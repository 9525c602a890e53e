//! Queries external drivers and the interpreter use once the namespace is built: device matching
//! by `_HID`/`_CID`, and OpRegion override installation. The global and child
//! iterators themselves live on [`Namespace`] directly (`Namespace::iter`,
//! `Namespace::iter_children`).

use crate::node::{NodeId, NodeKind, OpRegionOverride};
use crate::value::{AmlValue, PnpId};
use crate::{AmlError, Namespace};
use alloc::boxed::Box;
use core::any::Any;
use log::warn;

/// Evaluates a device's `_HID`/`_CID` method. Implemented by whatever drives the AML
/// interpreter - evaluating a method is out of this crate's scope - and handed to
/// [`check_device_pnp_id`] so the matching logic itself can live here, fully tested, without
/// requiring a real interpreter.
pub trait HidEvaluator {
    fn evaluate(&mut self, namespace: &Namespace, node: NodeId) -> Result<AmlValue, AmlError>;
}

/// Matches the upstream `lai` C core's `lai_check_device_pnp_id`: evaluates `dev`'s `_HID`,
/// falling back to `_CID` if `_HID` is absent or failed to evaluate, and compares the result
/// against `expected`.
///
/// Returns `true` on a match. The original C surface returns `0` for a match and non-zero
/// otherwise; this crate exposes a `bool` instead, which is the idiomatic Rust shape for the same
/// binary outcome (there's no secondary error code worth preserving - evaluation failures are
/// logged and folded into "no match").
pub fn check_device_pnp_id(
    namespace: &Namespace,
    dev: NodeId,
    expected: &PnpId,
    evaluator: &mut dyn HidEvaluator,
) -> bool {
    let id = evaluate_hid_or_cid(namespace, dev, evaluator);

    match id {
        Some(id) => &id == expected,
        None => false,
    }
}

fn evaluate_hid_or_cid(namespace: &Namespace, dev: NodeId, evaluator: &mut dyn HidEvaluator) -> Option<PnpId> {
    if let Some(hid_node) = namespace.resolve_path(Some(dev), "_HID") {
        match evaluator.evaluate(namespace, hid_node) {
            Ok(value) => {
                if let Some(id) = PnpId::from_value(&value) {
                    return Some(id);
                }
            }
            Err(_) => warn!("could not evaluate _HID of device"),
        }
    }

    let cid_node = namespace.resolve_path(Some(dev), "_CID")?;
    match evaluator.evaluate(namespace, cid_node) {
        Ok(value) => PnpId::from_value(&value),
        Err(_) => {
            warn!("could not evaluate _CID of device");
            None
        }
    }
}

/// Binds an override vtable and opaque user pointer to an `OpRegion` node. Fails with a
/// type-mismatch error if `node` is not an `OpRegion` - this is a recoverable, returned error,
/// not a panic, since installing an override is something a driver does after the namespace is
/// built and may reasonably get a node kind wrong.
pub fn ns_override_opregion(
    namespace: &mut Namespace,
    node: NodeId,
    override_hooks: OpRegionOverride,
    user: Box<dyn Any + Send + Sync>,
) -> Result<(), AmlError> {
    match namespace.kind_mut(node) {
        NodeKind::OpRegion(region) => {
            region.override_hooks = Some((override_hooks, user));
            Ok(())
        }
        _ => {
            warn!("tried to override opregion functions for non-opregion");
            Err(AmlError::TypeMismatch)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::name::AmlName;
    use crate::node::{Node, OpRegionData, RegionSpace};
    use core::str::FromStr;

    struct StubEvaluator {
        result: Result<AmlValue, AmlError>,
    }

    impl HidEvaluator for StubEvaluator {
        fn evaluate(&mut self, _namespace: &Namespace, _node: NodeId) -> Result<AmlValue, AmlError> {
            self.result.clone()
        }
    }

    fn install_device_with_hid(namespace: &mut Namespace, name: &str, hid: AmlValue) -> NodeId {
        let root = namespace.root();
        let mut dev = Node::new(NodeKind::Device);
        let parsed = AmlName::from_str(name).unwrap();
        namespace.resolve_new_node(&mut dev, root, &parsed).unwrap();
        let dev_id = namespace.install_nsnode(dev);

        let mut hid_node = Node::new(NodeKind::Name(hid));
        let hid_path = AmlName::from_str(&alloc::format!("{}._HID", name)).unwrap();
        namespace.resolve_new_node(&mut hid_node, root, &hid_path).unwrap();
        namespace.install_nsnode(hid_node);

        dev_id
    }

    #[test]
    fn integer_hid_matches_integer_expectation() {
        let mut namespace = Namespace::new();
        let dev = install_device_with_hid(&mut namespace, "\\DEV1", AmlValue::Integer(0x0A03));
        let mut evaluator = StubEvaluator { result: Ok(AmlValue::Integer(0x0A03)) };

        assert!(check_device_pnp_id(&namespace, dev, &PnpId::Eisa(0x0A03), &mut evaluator));
    }

    #[test]
    fn integer_hid_does_not_match_string_expectation() {
        let mut namespace = Namespace::new();
        let dev = install_device_with_hid(&mut namespace, "\\DEV1", AmlValue::Integer(0x0A03));
        let mut evaluator = StubEvaluator { result: Ok(AmlValue::Integer(0x0A03)) };

        assert!(!check_device_pnp_id(&namespace, dev, &PnpId::String("PNP0A03".into()), &mut evaluator));
    }

    #[test]
    fn hid_evaluation_error_is_treated_as_absent_and_falls_back_to_cid() {
        let mut namespace = Namespace::new();
        let root = namespace.root();
        let mut dev = Node::new(NodeKind::Device);
        let parsed = AmlName::from_str("\\DEV1").unwrap();
        namespace.resolve_new_node(&mut dev, root, &parsed).unwrap();
        let dev_id = namespace.install_nsnode(dev);

        let mut cid_node = Node::new(NodeKind::Name(AmlValue::String("PNP0A03".into())));
        let cid_path = AmlName::from_str("\\DEV1._CID").unwrap();
        namespace.resolve_new_node(&mut cid_node, root, &cid_path).unwrap();
        namespace.install_nsnode(cid_node);

        // No _HID installed at all, so evaluator is only ever asked about _CID.
        let mut evaluator = StubEvaluator { result: Ok(AmlValue::String("PNP0A03".into())) };
        assert!(check_device_pnp_id(&namespace, dev_id, &PnpId::String("PNP0A03".into()), &mut evaluator));
    }

    #[test]
    fn override_opregion_rejects_non_opregion_kind() {
        let mut namespace = Namespace::new();
        let root = namespace.root();
        let mut node = Node::new(NodeKind::Device);
        let parsed = AmlName::from_str("\\DEV1").unwrap();
        namespace.resolve_new_node(&mut node, root, &parsed).unwrap();
        let id = namespace.install_nsnode(node);

        let hooks = OpRegionOverride { read: |_, _, _| 0, write: |_, _, _, _| {} };
        let result = ns_override_opregion(&mut namespace, id, hooks, Box::new(()));
        assert_eq!(result, Err(AmlError::TypeMismatch));
    }

    #[test]
    fn override_opregion_succeeds_on_opregion_kind() {
        let mut namespace = Namespace::new();
        let root = namespace.root();
        let mut node = Node::new(NodeKind::OpRegion(OpRegionData {
            space: RegionSpace::SystemMemory,
            base: 0xE000_0000,
            length: 0x1000,
            override_hooks: None,
        }));
        let parsed = AmlName::from_str("\\OPR1").unwrap();
        namespace.resolve_new_node(&mut node, root, &parsed).unwrap();
        let id = namespace.install_nsnode(node);

        let hooks = OpRegionOverride { read: |_, _, _| 0, write: |_, _, _, _| {} };
        assert!(ns_override_opregion(&mut namespace, id, hooks, Box::new(())).is_ok());
    }
}
