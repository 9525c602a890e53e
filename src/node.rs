//! The namespace node data model and the hash-indexed child table each node carries.

use crate::name::NameSeg;
use crate::segment::SegmentId;
use crate::value::AmlValue;
use alloc::{boxed::Box, vec::Vec};
use bit_field::BitField;
use core::any::Any;

/// A stable handle into the namespace arena. Never reused after a node is uninstalled - the slot
/// it pointed to becomes a tombstone instead.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Packed method flags: argument count (bits 0-2), serialized flag (bit 3), sync level
/// (bits 4-7) - matches the single-byte encoding ACPI defines for `DefMethod`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MethodFlags(pub u8);

impl MethodFlags {
    pub fn new(arg_count: u8, serialized: bool, sync_level: u8) -> MethodFlags {
        let mut bits = 0u8;
        bits.set_bits(0..3, arg_count & 0x7);
        bits.set_bit(3, serialized);
        bits.set_bits(4..8, sync_level & 0xF);
        MethodFlags(bits)
    }

    pub fn arg_count(&self) -> u8 {
        self.0.get_bits(0..3)
    }

    pub fn is_serialized(&self) -> bool {
        self.0.get_bit(3)
    }

    pub fn sync_level(&self) -> u8 {
        self.0.get_bits(4..8)
    }
}

/// A native override for a predefined method (`_OSI`, `_OS_`, `_REV`, or one installed by the
/// host). Takes the method's evaluated arguments and produces a result, without any AML bytecode
/// being interpreted.
pub type NativeMethod = fn(args: &[AmlValue]) -> Result<AmlValue, crate::AmlError>;

/// Where a method's implementation lives.
#[derive(Clone, Copy)]
pub enum MethodBody {
    /// AML bytecode living inside `segment`, at `offset..offset + length`.
    Aml { segment: SegmentId, offset: usize, length: usize },
    /// A host-supplied function, bypassing the AML interpreter entirely.
    Native(NativeMethod),
}

#[derive(Clone, Copy)]
pub struct MethodData {
    pub flags: MethodFlags,
    pub body: MethodBody,
}

/// ACPI address space a `OperationRegion` overlays.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum RegionSpace {
    SystemMemory,
    SystemIo,
    PciConfig,
    EmbeddedControl,
    SmBus,
    SystemCmos,
    PciBarTarget,
    Ipmi,
    GeneralPurposeIo,
    GenericSerialBus,
    Pcc,
    /// OEM-defined or otherwise unrecognised space ID, carried verbatim.
    Other(u8),
}

impl RegionSpace {
    pub fn from_byte(b: u8) -> RegionSpace {
        match b {
            0x00 => RegionSpace::SystemMemory,
            0x01 => RegionSpace::SystemIo,
            0x02 => RegionSpace::PciConfig,
            0x03 => RegionSpace::EmbeddedControl,
            0x04 => RegionSpace::SmBus,
            0x05 => RegionSpace::SystemCmos,
            0x06 => RegionSpace::PciBarTarget,
            0x07 => RegionSpace::Ipmi,
            0x08 => RegionSpace::GeneralPurposeIo,
            0x09 => RegionSpace::GenericSerialBus,
            0x0A => RegionSpace::Pcc,
            other => RegionSpace::Other(other),
        }
    }
}

/// The override vtable a host driver installs over a `OpRegion` node via
/// [`crate::query::ns_override_opregion`].
pub struct OpRegionOverride {
    pub read: fn(user: &(dyn Any + Send + Sync), offset: u64, width: u8) -> u64,
    pub write: fn(user: &(dyn Any + Send + Sync), offset: u64, width: u8, value: u64),
}

pub struct OpRegionData {
    pub space: RegionSpace,
    pub base: u64,
    pub length: u64,
    pub override_hooks: Option<(OpRegionOverride, Box<dyn Any + Send + Sync>)>,
}

/// Bit-packed field-access flags, per ACPI §19.6.62 `FieldFlags`: access type (bits 0-3), lock
/// rule (bit 4), update rule (bits 5-6).
#[derive(Clone, Copy, Debug, Default)]
pub struct FieldFlags(pub u8);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldAccessType {
    Any,
    Byte,
    Word,
    DWord,
    QWord,
    Buffer,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum FieldUpdateRule {
    Preserve,
    WriteAsOnes,
    WriteAsZeros,
}

impl FieldFlags {
    pub fn access_type(&self) -> FieldAccessType {
        match self.0.get_bits(0..4) {
            0 => FieldAccessType::Any,
            1 => FieldAccessType::Byte,
            2 => FieldAccessType::Word,
            3 => FieldAccessType::DWord,
            4 => FieldAccessType::QWord,
            5 => FieldAccessType::Buffer,
            _ => FieldAccessType::Any,
        }
    }

    pub fn lock_rule(&self) -> bool {
        self.0.get_bit(4)
    }

    pub fn update_rule(&self) -> FieldUpdateRule {
        match self.0.get_bits(5..7) {
            0 => FieldUpdateRule::Preserve,
            1 => FieldUpdateRule::WriteAsOnes,
            _ => FieldUpdateRule::WriteAsZeros,
        }
    }
}

pub struct FieldData {
    pub bit_offset: u64,
    pub bit_size: u64,
    pub flags: FieldFlags,
    pub region: NodeId,
}

pub struct IndexFieldData {
    pub bit_offset: u64,
    pub bit_size: u64,
    pub flags: FieldFlags,
    pub index: NodeId,
    pub data: NodeId,
}

pub struct BufferFieldData {
    pub bit_offset: u64,
    pub bit_size: u64,
    pub buffer: NodeId,
}

#[derive(Clone, Copy, Default)]
pub struct ProcessorData {
    pub cpu_id: u8,
    pub pblk_address: u32,
    pub pblk_length: u8,
}

#[derive(Clone, Copy, Default)]
pub struct PowerResourceData {
    pub system_level: u8,
    pub resource_order: u16,
}

/// The tagged variant every node carries. Only the attributes meaningful to a given kind are
/// present on it.
pub enum NodeKind {
    Root,
    Device,
    Method(MethodData),
    Mutex { sync_level: u8 },
    Processor(ProcessorData),
    Thermal,
    OpRegion(OpRegionData),
    Field(FieldData),
    IndexField(IndexFieldData),
    BufferField(BufferFieldData),
    Name(AmlValue),
    /// A strong reference to another node. The target is guaranteed, by construction, to never
    /// itself be an `Alias`.
    Alias(NodeId),
    Event,
    PowerResource(PowerResourceData),
}

impl NodeKind {
    pub fn is_alias(&self) -> bool {
        matches!(self, NodeKind::Alias(_))
    }

    pub fn is_opregion(&self) -> bool {
        matches!(self, NodeKind::OpRegion(_))
    }
}

/// A small open-chained hash table mapping a 4-byte name to the children installed under one
/// parent. Matches the upstream `lai` C core's `util-hash` table: same djb2 hash, same chaining
/// discipline, reimplemented without raw pointers.
pub(crate) struct ChildTable {
    buckets: Vec<Vec<NodeId>>,
}

const BUCKET_COUNT: usize = 16;

fn djb2(name: &NameSeg) -> u32 {
    let mut h: u32 = 5381;
    for &b in &name.0 {
        h = h.wrapping_mul(33).wrapping_add(b as u32);
    }
    h
}

impl ChildTable {
    pub(crate) fn new() -> ChildTable {
        let mut buckets = Vec::with_capacity(BUCKET_COUNT);
        for _ in 0..BUCKET_COUNT {
            buckets.push(Vec::new());
        }
        ChildTable { buckets }
    }

    fn bucket_index(name: &NameSeg) -> usize {
        (djb2(name) as usize) % BUCKET_COUNT
    }

    /// Returns `Err(())` if a child with this name already exists (duplicate install).
    pub(crate) fn insert(&mut self, name: NameSeg, names: &dyn Fn(NodeId) -> NameSeg, id: NodeId) -> Result<(), ()> {
        let bucket = &mut self.buckets[Self::bucket_index(&name)];
        if bucket.iter().any(|&existing| names(existing).0 == name.0) {
            return Err(());
        }
        bucket.push(id);
        Ok(())
    }

    pub(crate) fn get(&self, name: &NameSeg, names: &dyn Fn(NodeId) -> NameSeg) -> Option<NodeId> {
        self.buckets[Self::bucket_index(name)].iter().copied().find(|&id| names(id).0 == name.0)
    }

    /// Removes the first child whose id matches `id`, panicking if it is not found or is found
    /// twice - both indicate a corrupted namespace.
    pub(crate) fn remove(&mut self, name: &NameSeg, id: NodeId) {
        let bucket = &mut self.buckets[Self::bucket_index(name)];
        let pos = bucket.iter().position(|&existing| existing == id);
        match pos {
            Some(pos) => {
                bucket.remove(pos);
            }
            None => panic!("child node is missing from parent's hash table during uninstall"),
        }
        if bucket.iter().any(|&existing| existing == id) {
            panic!("child node appears multiple times in parent's hash table during uninstall");
        }
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.buckets.iter().flatten().copied()
    }
}

/// A single namespace entity: a name, a parent edge, the children installed under it, and the
/// kind-specific payload.
pub struct Node {
    pub(crate) name: NameSeg,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: ChildTable,
    pub kind: NodeKind,
}

impl Node {
    /// Allocates a node holding `kind`. The node's name and parent are not yet meaningful - they
    /// are filled in by [`crate::namespace::Namespace::resolve_new_node`] before the node is
    /// installed. Matches the C core's `lai_create_nsnode`: a zero-initialized node that is only
    /// given an identity once its place in the tree is resolved.
    pub fn new(kind: NodeKind) -> Node {
        Node { name: NameSeg::PLACEHOLDER, parent: None, children: ChildTable::new(), kind }
    }

    pub fn name(&self) -> NameSeg {
        self.name
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}
