//! The namespace tree and its resolvers: install/uninstall, child lookup, reference resolution,
//! new-name binding, and textual lookup.

use crate::name::{AmlName, NameSeg};
use crate::node::{Node, NodeId, NodeKind};
use crate::segment::{AmlSegment, SegmentId};
use crate::AmlError;
use alloc::string::String;
use alloc::vec::Vec;
use log::{debug, warn};

/// The global node list grows geometrically from this initial window, matching the upstream
/// `lai` C core's `NAMESPACE_WINDOW`.
const NAMESPACE_WINDOW: usize = 8192;

/// The in-memory ACPI namespace: an arena of nodes plus the root handle and the retained AML
/// segments method bodies point into.
///
/// Represented as `Vec<Option<Node>>` indexed by [`NodeId`] - the idiomatic-Rust realization of
/// the Design Notes' "arena of nodes + stable indices" suggestion. Uninstalling a node replaces
/// its slot with `None` (a tombstone); the slot is never reused.
pub struct Namespace {
    nodes: Vec<Option<Node>>,
    root: NodeId,
    segments: Vec<AmlSegment>,
    fadt: Option<&'static [u8]>,
}

impl Namespace {
    /// Builds an empty namespace consisting of just the root node. Bootstrap
    /// (`crate::bootstrap::create_namespace`) layers the predefined objects and parsed tables on
    /// top of this.
    pub fn new() -> Namespace {
        let mut namespace =
            Namespace { nodes: Vec::with_capacity(NAMESPACE_WINDOW), root: NodeId(0), segments: Vec::new(), fadt: None };
        let root = Node::new(NodeKind::Root);
        let id = namespace.install_nsnode(root);
        namespace.root = id;
        namespace
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn fadt(&self) -> Option<&'static [u8]> {
        self.fadt
    }

    pub(crate) fn set_fadt(&mut self, bytes: &'static [u8]) {
        self.fadt = Some(bytes);
    }

    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.index()].as_ref().expect("dangling NodeId: node was uninstalled")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.index()].as_mut().expect("dangling NodeId: node was uninstalled")
    }

    pub fn kind(&self, id: NodeId) -> &NodeKind {
        &self.node(id).kind
    }

    pub fn kind_mut(&mut self, id: NodeId) -> &mut NodeKind {
        &mut self.node_mut(id).kind
    }

    pub fn name(&self, id: NodeId) -> NameSeg {
        self.node(id).name()
    }

    /// `ns_parent` - the node's parent, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent()
    }

    /// `ns_get_child` - hashes the 4-byte key, walks the parent's chain, and returns the first
    /// child whose name matches. Does *not* dereference aliases - callers that need
    /// alias-transparent lookup go through [`Self::resolve`]/[`Self::resolve_path`].
    pub fn get_child(&self, parent: NodeId, name: NameSeg) -> Option<NodeId> {
        let names = |id: NodeId| self.name(id);
        self.node(parent).children.get(&name, &names)
    }

    fn child_iter(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.node(parent).children.iter()
    }

    /// Installs `node` into the tree: appends it to the global list, then (unless it's the root)
    /// links it into its parent's child index. Panics if a same-named child already exists under
    /// the same parent - this is a fatal configuration error, not a recoverable one, because it
    /// indicates a corrupted table or a double-load.
    pub fn install_nsnode(&mut self, node: Node) -> NodeId {
        let parent = node.parent;
        let name = node.name;

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Some(node));

        if let Some(parent) = parent {
            let names = |candidate: NodeId| self.name(candidate);
            let result = self.node_mut(parent).children.insert(name, &names, id);
            if result.is_err() {
                let path = self.stringify_node_path(id);
                panic!("trying to install duplicate namespace node {}", path);
            }
        }

        if log::log_enabled!(log::Level::Debug) {
            debug!("created {}", self.stringify_node_path(id));
        }

        id
    }

    /// `lai_uninstall_nsnode` - tombstones the node's slot in the global list, then removes it
    /// from its parent's child index. A sanity pass (inside [`crate::node::ChildTable::remove`])
    /// verifies the child did not occur twice in its parent's chain.
    pub fn uninstall_nsnode(&mut self, id: NodeId) {
        let (parent, name) = {
            let node = self.node(id);
            (node.parent, node.name)
        };

        if let Some(parent) = parent {
            self.node_mut(parent).children.remove(&name, id);
        }

        self.nodes[id.index()] = None;
    }

    /// Walks `id` up to the root, prepending each segment, producing `\SEG1.SEG2…` (or just `\`
    /// for the root itself). Owned by the caller - there is no other release obligation on the
    /// namespace surface.
    pub fn stringify_node_path(&self, id: NodeId) -> String {
        if id == self.root {
            return String::from("\\");
        }

        let mut segments = Vec::new();
        let mut current = id;
        loop {
            segments.push(self.name(current));
            match self.parent(current) {
                Some(parent) if parent != self.root => current = parent,
                _ => break,
            }
        }

        let mut s = String::from("\\");
        for (i, seg) in segments.iter().rev().enumerate() {
            if i > 0 {
                s.push('.');
            }
            s.push_str(seg.as_str());
        }
        s
    }

    /// Flattens `id` if it is an `Alias`, returning its (guaranteed non-alias) target. A no-op
    /// for any other kind.
    fn flatten_alias(&self, id: NodeId) -> NodeId {
        match self.kind(id) {
            NodeKind::Alias(target) => {
                debug_assert!(!self.kind(*target).is_alias(), "alias chains must be collapsed at creation");
                *target
            }
            _ => id,
        }
    }

    /// Reference resolution: look up an existing node given a context scope and a parsed name.
    /// Returns `None` on a miss - resolution is a pure lookup and never panics for that reason.
    pub fn resolve(&self, ctx: NodeId, name: &AmlName) -> Option<NodeId> {
        if name.search_scopes {
            let segment = name.segments[0];
            return self.resolve_search(ctx, segment);
        }

        let mut current = ctx;
        if name.is_absolute {
            current = self.root;
        }

        for _ in 0..name.height {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break, // already at the root; ascending further is a no-op
            }
        }

        for &segment in &name.segments {
            current = self.get_child(current, segment)?;
        }

        Some(self.flatten_alias(current))
    }

    /// `resolve_search` - the upward-walk rule used for unqualified, single-segment references:
    /// try `segment` at `ctx`, then its parent, and so on until the root; returns the first hit.
    pub fn resolve_search(&self, ctx: NodeId, segment: NameSeg) -> Option<NodeId> {
        let mut current = Some(ctx);
        while let Some(scope) = current {
            if let Some(node) = self.get_child(scope, segment) {
                return Some(self.flatten_alias(node));
            }
            current = self.parent(scope);
        }
        None
    }

    /// New-name binding: resolves the scope a freshly-created node must be installed under.
    /// Identical to the descent phase of [`Self::resolve`] - `search_scopes` is ignored -
    /// except the *last* segment becomes the new node's name rather than a lookup key. Sets
    /// `node`'s name and parent; the caller must still call [`Self::install_nsnode`].
    pub fn resolve_new_node(&self, node: &mut Node, ctx: NodeId, name: &AmlName) -> Result<(), AmlError> {
        let mut current = ctx;
        if name.is_absolute {
            current = self.root;
        }

        for _ in 0..name.height {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        if name.segments.is_empty() {
            return Err(AmlError::EmptyNamesAreInvalid);
        }

        let (last, rest) = name.segments.split_last().unwrap();
        for &segment in rest {
            let next = self.get_child(current, segment).ok_or_else(|| AmlError::ScopeDoesNotExist(name.clone()))?;
            current = match self.kind(next) {
                NodeKind::Alias(target) => {
                    warn!(
                        "resolution of new object name traverses Alias(), this is not supported in ACPICA"
                    );
                    *target
                }
                _ => next,
            };
        }

        node.name = *last;
        node.parent = Some(current);
        Ok(())
    }

    /// `resolve_path` - textual lookup. `ctx = None` defaults to the root. Auto-pads short
    /// segments, dereferences aliases at every step, and does *not* implement scope search (use
    /// [`Self::resolve_search`] for that).
    pub fn resolve_path(&self, ctx: Option<NodeId>, path: &str) -> Option<NodeId> {
        let name: AmlName = path.parse().ok()?;
        let mut current = ctx.unwrap_or(self.root);

        if name.is_absolute {
            current = self.root;
        }
        for _ in 0..name.height {
            match self.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        for &segment in &name.segments {
            current = self.get_child(current, segment)?;
            current = self.flatten_alias(current);
        }

        Some(current)
    }

    /// Retains `segment` for the namespace's lifetime and returns the handle `Method` nodes
    /// parsed out of it should reference.
    pub(crate) fn retain_segment(&mut self, segment: AmlSegment) -> SegmentId {
        let id = SegmentId(self.segments.len() as u32);
        self.segments.push(segment);
        id
    }

    pub fn segment(&self, id: SegmentId) -> &AmlSegment {
        &self.segments[id.0 as usize]
    }

    /// Yields every live node in installation order, transparently skipping tombstones.
    /// Single-pass, forward-only.
    pub fn iter(&self) -> NsIter<'_> {
        NsIter { namespace: self, next: 0 }
    }

    /// Yields the children of `parent` in (unspecified but deterministic) hash-chain order.
    pub fn iter_children(&self, parent: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.child_iter(parent)
    }
}

impl Default for Namespace {
    fn default() -> Namespace {
        Namespace::new()
    }
}

/// Global node iterator. Skips tombstoned slots transparently.
pub struct NsIter<'a> {
    namespace: &'a Namespace,
    next: usize,
}

impl<'a> Iterator for NsIter<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while self.next < self.namespace.nodes.len() {
            let id = NodeId(self.next as u32);
            self.next += 1;
            if self.namespace.nodes[id.index()].is_some() {
                return Some(id);
            }
        }
        None
    }
}
