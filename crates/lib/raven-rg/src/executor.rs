use std::cell::RefCell;

use crate::graph::FrameGraph;
use crate::handle::{FrameGraphResource, IGNORED};
use crate::node::AccessDeclaration;
use crate::virtual_resource::Virtualizable;

/// Boxed, type-erased pass body. Mirrors the source's fixed-size callback
/// storage, replaced here with a uniformly boxed closure (the source's size
/// cap on the closure is a micro-optimization, not a contract worth
/// reproducing). Takes `(resources, context)` only, matching the original's
/// `static_assert(std::is_invocable_v<Execute, const Data&,
/// FrameGraphPassResources&, void*>)` contract — the allocator is threaded
/// only to `ResourceEntry::create`/`destroy`, never to the pass body.
pub(crate) type PassExecFn<Ctx, Alloc> =
    dyn FnOnce(&PassResources<'_, Ctx, Alloc>, &mut Ctx) -> anyhow::Result<()>;

/// Read-only (to the caller) view scoped to one pass's execute invocation.
/// Exposes typed accessors for exactly the handles the pass declared via
/// `create`/`read`/`write`.
pub struct PassResources<'g, Ctx, Alloc> {
    pub(crate) graph: &'g FrameGraph<Ctx, Alloc>,
    pub(crate) pass_id: u32,
}

impl<'g, Ctx: 'static, Alloc: 'static> PassResources<'g, Ctx, Alloc> {
    /// Panics if the pass did not declare `handle`, or if `T` does not match
    /// the type the resource was created/imported with.
    pub fn get<T>(&self, handle: FrameGraphResource<T>) -> std::cell::RefMut<'g, T>
    where
        T: Virtualizable<Ctx, Alloc> + 'static,
    {
        let resource_id = self.resolve_declared(handle.node_id());
        let entry = &self.graph.resources[resource_id as usize];
        entry
            .concept
            .resource_cell()
            .downcast_ref::<RefCell<T>>()
            .expect("type mismatch accessing frame graph resource")
            .borrow_mut()
    }

    pub fn get_descriptor<T>(&self, handle: FrameGraphResource<T>) -> &'g T::Desc
    where
        T: Virtualizable<Ctx, Alloc> + 'static,
    {
        let resource_id = self.resolve_declared(handle.node_id());
        let entry = &self.graph.resources[resource_id as usize];
        entry
            .concept
            .desc_any()
            .downcast_ref::<T::Desc>()
            .expect("type mismatch accessing frame graph resource descriptor")
    }

    fn resolve_declared(&self, node_id: u32) -> u32 {
        let pass = &self.graph.passes[self.pass_id as usize];
        let declared = pass.creates.contains(&node_id)
            || pass.reads.iter().any(|a| a.node == node_id)
            || pass.writes.iter().any(|a| a.node == node_id);
        assert!(
            declared,
            "pass '{}' accessed a resource handle it never declared",
            pass.name
        );
        self.graph.resource_nodes[node_id as usize].resource_id
    }
}

pub(crate) fn execute<Ctx: 'static, Alloc: 'static>(
    graph: &mut FrameGraph<Ctx, Alloc>,
    context: &mut Ctx,
    allocator: &mut Alloc,
) -> anyhow::Result<()> {
    for pass_id in 0..graph.passes.len() {
        if !graph.passes[pass_id].can_execute() {
            continue;
        }

        materialize_creates(graph, pass_id, allocator);
        invoke_pre_hooks(graph, pass_id, context);

        if let Some(exec) = graph.passes[pass_id].exec.take() {
            let resources = PassResources {
                graph: &*graph,
                pass_id: pass_id as u32,
            };

            if let Err(err) = exec(&resources, context) {
                glog::warn!("pass '{}' failed: {:#}", graph.passes[pass_id].name, err);
                return Err(err);
            }
        }

        release_expired(graph, pass_id, allocator);
    }

    Ok(())
}

fn materialize_creates<Ctx, Alloc>(graph: &mut FrameGraph<Ctx, Alloc>, pass_id: usize, allocator: &mut Alloc) {
    let creates = graph.passes[pass_id].creates.clone();
    for node_id in creates {
        let resource_id = graph.resource_nodes[node_id as usize].resource_id;
        graph.resources[resource_id as usize].concept.create(allocator);
    }
}

fn invoke_pre_hooks<Ctx, Alloc>(graph: &mut FrameGraph<Ctx, Alloc>, pass_id: usize, context: &mut Ctx) {
    let reads: Vec<AccessDeclaration> = graph.passes[pass_id].reads.clone();
    for access in &reads {
        if access.flags != IGNORED {
            let resource_id = graph.resource_nodes[access.node as usize].resource_id;
            graph.resources[resource_id as usize]
                .concept
                .pre_read(access.flags, context);
        }
    }

    let writes: Vec<AccessDeclaration> = graph.passes[pass_id].writes.clone();
    for access in &writes {
        if access.flags != IGNORED {
            let resource_id = graph.resource_nodes[access.node as usize].resource_id;
            graph.resources[resource_id as usize]
                .concept
                .pre_write(access.flags, context);
        }
    }
}

fn release_expired<Ctx, Alloc>(graph: &mut FrameGraph<Ctx, Alloc>, pass_id: usize, allocator: &mut Alloc) {
    for resource_id in 0..graph.resources.len() {
        let entry = &graph.resources[resource_id];
        if entry.is_transient() && entry.last == Some(pass_id as u32) {
            graph.resources[resource_id].concept.destroy(allocator);
        }
    }
}
