//! Compressed binary radix tree mapping IPv4 blocks to payloads.
//!
//! Nodes live in an arena and refer to each other by index. Every leaf at
//! depth `d` stands for the block formed by its path bits followed by
//! `32 - d` wildcard bits. After each insertion no two sibling leaves carry
//! equal payloads, so the dump is always the minimal set of blocks.

mod node;

#[cfg(test)]
mod proptests;

use std::fmt;
use std::net::IpAddr;

use crate::cidr::{ip_to_u32, Cidr, ADDRESS_BITS};
use crate::payload::Payload;
use crate::record::Record;

use node::{Node, NodeId, ROOT};

/// Radix tree linking all records together.
///
/// The tree is a plain single-threaded structure; see
/// [`SharedTree`](crate::SharedTree) for a locked wrapper.
///
/// # Examples
/// ```
/// use geotrie::Tree;
///
/// let mut tree = Tree::new();
/// tree.add("1.0.0.0/29".parse().unwrap(), "A", false);
/// tree.add("1.0.0.8/29".parse().unwrap(), "A", false);
///
/// assert_eq!(tree.dump(), ["1.0.0.0/28 (A)"]);
/// assert_eq!(tree.lookup(0x0100_0005), Some(&"A"));
/// assert_eq!(tree.lookup(0x0100_0010), None);
/// ```
#[derive(Debug, Clone)]
pub struct Tree<P> {
    nodes: Vec<Node<P>>,
    free: Vec<NodeId>,
}

impl<P> Default for Tree<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Tree<P> {
    /// Create an empty tree. The root covers `0.0.0.0/0` with no payload.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::internal(None)],
            free: Vec::new(),
        }
    }

    /// Check if the tree holds no blocks at all.
    pub fn is_empty(&self) -> bool {
        let root = &self.nodes[ROOT];
        !root.is_leaf() && !root.has_children()
    }

    /// Number of blocks (leaves) currently stored. Walks the whole tree.
    pub fn len(&self) -> usize {
        let mut count = 0;
        self.walk(|_, _| count += 1);
        count
    }

    /// Number of live nodes, internal ones included.
    pub fn node_count(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    /// Drop every block.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.nodes.push(Node::internal(None));
        self.free.clear();
    }

    /// Find the payload of the most specific block containing `addr`.
    pub fn lookup(&self, addr: u32) -> Option<&P> {
        let mut node = &self.nodes[ROOT];
        let mut bits = addr;

        for _ in 0..ADDRESS_BITS {
            if let Some(payload) = node.payload.as_ref() {
                return Some(payload);
            }
            let child = node.children[(bits >> 31) as usize]?;
            bits <<= 1;
            node = &self.nodes[child];
        }

        match node.payload.as_ref() {
            Some(payload) => Some(payload),
            None => panic!("descended 32 bits without reaching a leaf"),
        }
    }

    /// Like [`lookup`](Self::lookup), for an `IpAddr`. Addresses that are
    /// neither IPv4 nor IPv4-mapped never match.
    pub fn lookup_ip(&self, ip: IpAddr) -> Option<&P> {
        ip_to_u32(ip).and_then(|addr| self.lookup(addr))
    }

    /// Visit every block in ascending address order.
    pub fn walk<F>(&self, mut f: F)
    where
        F: FnMut(Cidr, &P),
    {
        self.visit(ROOT, 0, 0, &mut f);
    }

    fn visit<F>(&self, id: NodeId, prefix: u32, depth: u8, f: &mut F)
    where
        F: FnMut(Cidr, &P),
    {
        let node = &self.nodes[id];
        if let Some(payload) = node.payload.as_ref() {
            f(Cidr::from_raw(prefix, depth), payload);
            return;
        }

        assert!(depth < ADDRESS_BITS, "internal node at depth 32");
        let bit = 1u32 << (ADDRESS_BITS - depth - 1);
        if let Some(left) = node.children[0] {
            self.visit(left, prefix, depth + 1, f);
        }
        if let Some(right) = node.children[1] {
            self.visit(right, prefix | bit, depth + 1, f);
        }
    }

    fn alloc(&mut self, node: Node<P>) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id] = node;
                id
            }
            None => {
                self.nodes.push(node);
                self.nodes.len() - 1
            }
        }
    }

    /// Return a whole subtree to the free list.
    fn release(&mut self, id: NodeId) {
        let mut stack = vec![id];
        while let Some(id) = stack.pop() {
            let node = &mut self.nodes[id];
            stack.extend(node.children.iter().flatten().copied());
            *node = Node::internal(None);
            self.free.push(id);
        }
    }

    fn release_children(&mut self, children: [Option<NodeId>; 2]) {
        for child in children.into_iter().flatten() {
            self.release(child);
        }
    }
}

impl<P: Payload + Clone> Tree<P> {
    /// Build a tree from records, inserted in order.
    pub fn from_records<I>(records: I, overwrite: bool) -> Self
    where
        I: IntoIterator<Item = Record<P>>,
    {
        let mut tree = Self::new();
        for record in records {
            tree.add_record(record, overwrite);
        }
        tree
    }

    /// Insert a record. See [`add`](Self::add).
    pub fn add_record(&mut self, record: Record<P>, overwrite: bool) {
        let (cidr, payload) = record.into_parts();
        self.add(cidr, payload, overwrite);
    }

    /// Insert `payload` for every address of `cidr`.
    ///
    /// `overwrite` decides who wins where the block overlaps existing blocks
    /// carrying a different payload: when true the new payload replaces
    /// them, otherwise existing blocks are kept and only the uncovered parts
    /// of `cidr` receive the new payload.
    pub fn add(&mut self, cidr: Cidr, payload: P, overwrite: bool) {
        let size = cidr.size();
        if size == 0 {
            self.add_root(payload, overwrite);
            return;
        }

        let mut bits = cidr.prefix();
        let mut id = ROOT;
        // set when a leaf was created or rewritten and may merge upward
        let mut modified = false;

        for depth in 1..=size {
            let target = (bits >> 31) as usize;
            let other = target ^ 1;
            bits <<= 1;
            let last = depth == size;

            if self.nodes[id].is_leaf() {
                // already covered by a wider block
                if !overwrite || self.nodes[id].payload.as_ref() == Some(&payload) {
                    break;
                }

                let old = self.nodes[id]
                    .payload
                    .take()
                    .unwrap_or_else(|| unreachable!("leaf without payload"));
                let carried = if last { payload.clone() } else { old.clone() };
                let other_leaf = self.alloc(Node::leaf(id, old));
                let target_leaf = self.alloc(Node::leaf(id, carried));
                self.nodes[id].children[other] = Some(other_leaf);
                self.nodes[id].children[target] = Some(target_leaf);
                log::trace!("split leaf at depth {} for {}", depth - 1, cidr);

                id = target_leaf;
                modified = true;
            } else if last {
                let existing = self.nodes[id].children[target];
                match existing {
                    Some(child) if !overwrite => {
                        if self.fill(child, &payload) {
                            self.compress(child);
                        }
                        id = child;
                        modified = false;
                    }
                    _ => {
                        if let Some(child) = existing {
                            self.release(child);
                        }
                        let leaf = self.alloc(Node::leaf(id, payload.clone()));
                        self.nodes[id].children[target] = Some(leaf);
                        id = leaf;
                        modified = true;
                    }
                }
            } else {
                let existing = self.nodes[id].children[target];
                id = match existing {
                    Some(child) => child,
                    None => {
                        let child = self.alloc(Node::internal(Some(id)));
                        self.nodes[id].children[target] = Some(child);
                        child
                    }
                };
            }
        }

        if modified {
            self.compress(id);
        }
    }

    /// Insertion of `0.0.0.0/0`: the root itself is the final node.
    fn add_root(&mut self, payload: P, overwrite: bool) {
        let root = &mut self.nodes[ROOT];
        if root.is_leaf() {
            if overwrite {
                root.payload = Some(payload);
            }
        } else if overwrite || !root.has_children() {
            let children = root.make_leaf(payload);
            self.release_children(children);
        } else {
            self.fill(ROOT, &payload);
        }
    }

    /// Stamp `payload` over every gap beneath `id` without touching
    /// conflicting leaves.
    ///
    /// Returns true when the whole subtree now carries `payload`, in which
    /// case `id` has been collapsed into a single leaf.
    fn fill(&mut self, id: NodeId, payload: &P) -> bool {
        if let Some(existing) = self.nodes[id].payload.as_ref() {
            return existing == payload;
        }

        let mut uniform = true;
        for bit in 0..2 {
            if let Some(child) = self.nodes[id].children[bit] {
                uniform &= self.fill(child, payload);
            }
        }

        if uniform {
            let children = self.nodes[id].make_leaf(payload.clone());
            self.release_children(children);
            log::trace!("collapsed filled subtree into a leaf");
            return true;
        }

        for bit in 0..2 {
            if self.nodes[id].children[bit].is_none() {
                let leaf = self.alloc(Node::leaf(id, payload.clone()));
                self.nodes[id].children[bit] = Some(leaf);
            }
        }
        false
    }

    /// Merge sibling leaves with equal payloads, walking up from `id`.
    fn compress(&mut self, mut id: NodeId) {
        assert!(self.nodes[id].is_leaf(), "compression must start at a leaf");

        while let Some(parent) = self.nodes[id].parent {
            let [Some(left), Some(right)] = self.nodes[parent].children else {
                break;
            };
            match (&self.nodes[left].payload, &self.nodes[right].payload) {
                (Some(a), Some(b)) if a == b => {}
                _ => break,
            }

            let payload = self.nodes[left]
                .payload
                .take()
                .unwrap_or_else(|| unreachable!("leaf without payload"));
            let children = self.nodes[parent].make_leaf(payload);
            self.release_children(children);
            id = parent;
        }
    }

    /// Every block with its payload, in ascending address order.
    pub fn records(&self) -> Vec<Record<P>> {
        let mut records = Vec::new();
        self.walk(|cidr, payload| records.push(Record::new(cidr, payload.clone())));
        records
    }
}

impl<P: Payload> Tree<P> {
    /// Render every block as `a.b.c.d/n (payload)`, in address order.
    pub fn dump(&self) -> Vec<String> {
        let mut lines = Vec::new();
        self.walk(|cidr, payload| lines.push(format!("{} ({})", cidr, payload.render())));
        lines
    }
}

impl<P: Payload> fmt::Display for Tree<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = Ok(());
        let mut first = true;
        self.walk(|cidr, payload| {
            if result.is_err() {
                return;
            }
            let sep = if first { "" } else { "\n" };
            first = false;
            result = write!(f, "{}{} ({})", sep, cidr, payload.render());
        });
        result
    }
}

impl<P: Payload + Clone> Extend<Record<P>> for Tree<P> {
    /// Extends without overwriting existing blocks.
    fn extend<I: IntoIterator<Item = Record<P>>>(&mut self, iter: I) {
        for record in iter {
            self.add_record(record, false);
        }
    }
}

impl<P: Payload + Clone> FromIterator<Record<P>> for Tree<P> {
    fn from_iter<I: IntoIterator<Item = Record<P>>>(iter: I) -> Self {
        Self::from_records(iter, false)
    }
}
