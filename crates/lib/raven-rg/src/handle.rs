use std::marker::PhantomData;

/// Index of a pass in the graph's pass list.
pub(crate) type PassId = u32;

/// Sentinel flags value meaning "suppress pre-read/pre-write hook invocation".
pub const IGNORED: u32 = u32::MAX;

/// An opaque handle to a virtual resource, equal to an index into the
/// frame graph's resource-node list. Two handles pointing at the same
/// underlying resource but different versions are distinct values.
pub struct FrameGraphResource<T> {
    pub(crate) node: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> FrameGraphResource<T> {
    pub(crate) fn new(node: u32) -> Self {
        Self {
            node,
            _marker: PhantomData,
        }
    }

    pub fn node_id(&self) -> u32 {
        self.node
    }
}

impl<T> Clone for FrameGraphResource<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FrameGraphResource<T> {}

impl<T> std::fmt::Debug for FrameGraphResource<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameGraphResource")
            .field("node", &self.node)
            .finish()
    }
}

impl<T> PartialEq for FrameGraphResource<T> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl<T> Eq for FrameGraphResource<T> {}
