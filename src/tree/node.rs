//! Arena node of the radix tree.

/// Index of a node inside the tree's arena.
pub(crate) type NodeId = usize;

/// The root always lives in the first arena slot.
pub(crate) const ROOT: NodeId = 0;

/// A node is either a leaf (payload set, no children) or internal
/// (no payload, any subset of children).
#[derive(Debug, Clone)]
pub(crate) struct Node<P> {
    pub(crate) parent: Option<NodeId>,
    /// Indexed by the next address bit.
    pub(crate) children: [Option<NodeId>; 2],
    pub(crate) payload: Option<P>,
}

impl<P> Node<P> {
    pub(crate) fn internal(parent: Option<NodeId>) -> Self {
        Self {
            parent,
            children: [None, None],
            payload: None,
        }
    }

    pub(crate) fn leaf(parent: NodeId, payload: P) -> Self {
        Self {
            parent: Some(parent),
            children: [None, None],
            payload: Some(payload),
        }
    }

    pub(crate) fn is_leaf(&self) -> bool {
        debug_assert!(
            self.payload.is_none() || self.children == [None, None],
            "leaf node must not have children"
        );
        self.payload.is_some()
    }

    pub(crate) fn has_children(&self) -> bool {
        self.children.iter().any(Option::is_some)
    }

    /// Turn the node into a leaf, returning the detached children.
    pub(crate) fn make_leaf(&mut self, payload: P) -> [Option<NodeId>; 2] {
        self.payload = Some(payload);
        std::mem::take(&mut self.children)
    }
}
