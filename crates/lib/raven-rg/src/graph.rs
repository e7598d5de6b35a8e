use std::cell::RefCell;
use std::rc::Rc;

use crate::builder::FrameGraphBuilder;
use crate::compiler;
use crate::debug::{self, DebugVisitor};
use crate::executor::{self, PassResources};
use crate::handle::FrameGraphResource;
use crate::node::{PassNode, ResourceEntry, ResourceKind, ResourceNode};
use crate::virtual_resource::{VirtualResourceModel, Virtualizable};

/// The frame graph itself: owns the pass list, the resource-node list, and
/// the virtual-resource registry. `Ctx` and `Alloc` are opaque to the engine
/// and threaded through purely so user `Virtualizable` hooks can use them;
/// the engine never inspects either.
pub struct FrameGraph<Ctx, Alloc> {
    pub(crate) passes: Vec<PassNode<Ctx, Alloc>>,
    pub(crate) resource_nodes: Vec<ResourceNode>,
    pub(crate) resources: Vec<ResourceEntry<Ctx, Alloc>>,
}

impl<Ctx, Alloc> Default for FrameGraph<Ctx, Alloc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx: 'static, Alloc: 'static> FrameGraph<Ctx, Alloc> {
    pub fn new() -> Self {
        Self {
            passes: Vec::new(),
            resource_nodes: Vec::new(),
            resources: Vec::new(),
        }
    }

    /// Capacity hint applied to the passes, resource-nodes, and registry
    /// vectors up front.
    pub fn reserve(&mut self, num_passes: usize, num_resources: usize) {
        self.passes.reserve(num_passes);
        self.resource_nodes.reserve(num_resources);
        self.resources.reserve(num_resources);
    }

    /// Registers an externally-owned resource. The engine never calls
    /// `create`/`destroy` on imported resources.
    pub fn import<T>(&mut self, name: impl Into<String>, desc: T::Desc, resource: T) -> FrameGraphResource<T>
    where
        T: Virtualizable<Ctx, Alloc> + 'static,
    {
        let resource_id = self.resources.len() as u32;
        self.resources.push(ResourceEntry {
            id: resource_id,
            kind: ResourceKind::Imported,
            version: 1,
            producer: None,
            last: None,
            concept: Box::new(VirtualResourceModel {
                desc,
                resource: RefCell::new(resource),
            }),
        });

        self.push_node(name.into(), resource_id)
    }

    pub(crate) fn create_resource<T>(&mut self, name: String, desc: T::Desc) -> FrameGraphResource<T>
    where
        T: Virtualizable<Ctx, Alloc> + 'static,
    {
        let resource_id = self.resources.len() as u32;
        self.resources.push(ResourceEntry {
            id: resource_id,
            kind: ResourceKind::Transient,
            version: 1,
            producer: None,
            last: None,
            concept: Box::new(VirtualResourceModel {
                desc,
                resource: RefCell::new(T::default()),
            }),
        });

        self.push_node(name, resource_id)
    }

    fn push_node<T>(&mut self, name: String, resource_id: u32) -> FrameGraphResource<T> {
        let node_id = self.resource_nodes.len() as u32;
        self.resource_nodes.push(ResourceNode {
            name,
            node_id,
            resource_id,
            version: 1,
            ref_count: 0,
            producer: None,
        });
        FrameGraphResource::new(node_id)
    }

    pub(crate) fn rename_resource<T>(&mut self, handle: FrameGraphResource<T>) -> FrameGraphResource<T> {
        let node_id = handle.node_id();
        let resource_id = self.resource_nodes[node_id as usize].resource_id;
        let name = self.resource_nodes[node_id as usize].name.clone();

        self.resources[resource_id as usize].version += 1;
        let new_version = self.resources[resource_id as usize].version;

        let new_node_id = self.resource_nodes.len() as u32;
        self.resource_nodes.push(ResourceNode {
            name,
            node_id: new_node_id,
            resource_id,
            version: new_version,
            ref_count: 0,
            producer: None,
        });
        FrameGraphResource::new(new_node_id)
    }

    pub fn get_descriptor<T>(&self, handle: FrameGraphResource<T>) -> &T::Desc
    where
        T: Virtualizable<Ctx, Alloc> + 'static,
    {
        let node = &self.resource_nodes[handle.node_id() as usize];
        let entry = &self.resources[node.resource_id as usize];
        entry
            .concept
            .desc_any()
            .downcast_ref::<T::Desc>()
            .expect("type mismatch retrieving frame graph resource descriptor")
    }

    /// A handle is valid iff its node's version snapshot equals the current
    /// version of the entry it points to.
    pub fn is_valid<T>(&self, handle: FrameGraphResource<T>) -> bool {
        let node_id = handle.node_id() as usize;
        assert!(node_id < self.resource_nodes.len(), "resource handle out of range");
        let node = &self.resource_nodes[node_id];
        let entry = &self.resources[node.resource_id as usize];
        node.version == entry.version
    }

    /// Creates a pass owning a default-constructed `Data`. `setup` runs
    /// immediately and declares the pass's accesses via the builder; `exec`
    /// is stored and invoked by `execute()` if the pass survives culling.
    /// Returns a shared, interior-mutable handle to `Data` so the client can
    /// inspect results after execution — the idiomatic substitute for the
    /// source's stable `const Data&` return value (see DESIGN.md).
    pub fn add_callback_pass<Data, Setup, Exec>(
        &mut self,
        name: impl Into<String>,
        setup: Setup,
        exec: Exec,
    ) -> Rc<RefCell<Data>>
    where
        Data: Default + 'static,
        Setup: FnOnce(&mut FrameGraphBuilder<Ctx, Alloc>, &mut Data),
        Exec: for<'g> FnOnce(&Data, &PassResources<'g, Ctx, Alloc>, &mut Ctx) -> anyhow::Result<()> + 'static,
    {
        let pass_id = self.passes.len() as u32;
        self.passes.push(PassNode::new_empty(pass_id, name.into()));

        let data = Rc::new(RefCell::new(Data::default()));
        {
            let mut builder = FrameGraphBuilder {
                graph: self,
                pass_id,
            };
            let mut data_mut = data.borrow_mut();
            setup(&mut builder, &mut data_mut);
        }

        let data_for_exec = data.clone();
        let exec_box: Box<executor::PassExecFn<Ctx, Alloc>> = Box::new(move |resources, ctx| {
            let data_ref = data_for_exec.borrow();
            exec(&data_ref, resources, ctx)
        });
        self.passes[pass_id as usize].exec = Some(exec_box);

        data
    }

    /// Runs the three-phase reference-counting/culling/lifetime-window
    /// compile. Idempotent on an unmodified graph, but specified to be
    /// called at most once per frame.
    pub fn compile(&mut self) {
        compiler::compile(self);
    }

    /// Drives passes in declaration order: skips culled passes, materializes
    /// transient creates, fires pre-read/pre-write hooks, invokes the pass
    /// body, then releases resources whose lifetime window ends here. The
    /// graph is one-shot: a second `execute()` call is not specified to work.
    pub fn execute(&mut self, context: &mut Ctx, allocator: &mut Alloc) -> anyhow::Result<()> {
        executor::execute(self, context, allocator)
    }

    /// Visits every pass and resource node in declaration order, then
    /// flushes the visitor to `sink`.
    pub fn debug_output<V>(&self, visitor: &mut V, sink: &mut dyn std::io::Write) -> std::io::Result<()>
    where
        V: DebugVisitor<Ctx, Alloc>,
    {
        debug::debug_output(self, visitor, sink)
    }
}
