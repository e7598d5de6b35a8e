use crate::graph::FrameGraph;
use crate::handle::{FrameGraphResource, IGNORED};
use crate::node::{AccessDeclaration, PassNode};
use crate::virtual_resource::Virtualizable;

/// Declaration-phase API scoped to one pass. Constructed by the graph for
/// the duration of a single `setup` callback; enforces the create/read/write
/// rules and performs handle renaming on write.
pub struct FrameGraphBuilder<'rg, Ctx, Alloc> {
    pub(crate) graph: &'rg mut FrameGraph<Ctx, Alloc>,
    pub(crate) pass_id: u32,
}

impl<'rg, Ctx: 'static, Alloc: 'static> FrameGraphBuilder<'rg, Ctx, Alloc> {
    /// Allocates a new transient resource and records it in this pass's
    /// `creates` list.
    pub fn create<T>(&mut self, name: impl Into<String>, desc: T::Desc) -> FrameGraphResource<T>
    where
        T: Virtualizable<Ctx, Alloc> + 'static,
    {
        let handle = self.graph.create_resource::<T>(name.into(), desc);
        self.graph.passes[self.pass_id as usize]
            .creates
            .push(handle.node_id());
        handle
    }

    /// Declares a read. `handle` must be valid and not already created or
    /// written by this pass. Idempotent for repeated `(handle, flags)` pairs.
    pub fn read<T>(&mut self, handle: FrameGraphResource<T>, flags: u32) -> FrameGraphResource<T>
    where
        T: Virtualizable<Ctx, Alloc> + 'static,
    {
        assert!(
            self.graph.is_valid(handle),
            "read: stale or out-of-range resource handle"
        );

        let node_id = handle.node_id();
        let pass = &mut self.graph.passes[self.pass_id as usize];
        assert!(
            !pass.creates.contains(&node_id) && !pass.writes.iter().any(|a| a.node == node_id),
            "pass '{}' cannot read a handle it creates or writes",
            pass.name
        );

        record_read(pass, node_id, flags);
        handle
    }

    /// Declares a write. If `handle` was created by this pass, the write is
    /// recorded against the same handle. Otherwise the handle is renamed: the
    /// entry's version is bumped, a read of the *old* handle is recorded with
    /// `IGNORED` flags (so its hook never fires), and the new handle is
    /// returned. Writing an imported resource implicitly marks the pass as
    /// having a side effect.
    pub fn write<T>(&mut self, handle: FrameGraphResource<T>, flags: u32) -> FrameGraphResource<T>
    where
        T: Virtualizable<Ctx, Alloc> + 'static,
    {
        assert!(
            self.graph.is_valid(handle),
            "write: stale or out-of-range resource handle"
        );

        let node_id = handle.node_id();
        let resource_id = self.graph.resource_nodes[node_id as usize].resource_id;
        if self.graph.resources[resource_id as usize].is_imported() {
            self.set_side_effect();
        }

        let creates_here = self.graph.passes[self.pass_id as usize]
            .creates
            .contains(&node_id);

        if creates_here {
            let pass = &mut self.graph.passes[self.pass_id as usize];
            if !pass.writes.iter().any(|a| a.node == node_id) {
                pass.writes.push(AccessDeclaration { node: node_id, flags });
            }
            handle
        } else {
            {
                let pass = &mut self.graph.passes[self.pass_id as usize];
                record_read(pass, node_id, IGNORED);
            }

            let renamed = self.graph.rename_resource::<T>(handle);
            let pass = &mut self.graph.passes[self.pass_id as usize];
            pass.writes.push(AccessDeclaration {
                node: renamed.node_id(),
                flags,
            });
            renamed
        }
    }

    /// Marks the pass so it is never culled.
    pub fn set_side_effect(&mut self) {
        self.graph.passes[self.pass_id as usize].has_side_effect = true;
    }
}

fn record_read<Ctx, Alloc>(pass: &mut PassNode<Ctx, Alloc>, node_id: u32, flags: u32) {
    if !pass.reads.iter().any(|a| a.node == node_id) {
        pass.reads.push(AccessDeclaration { node: node_id, flags });
    }
}
