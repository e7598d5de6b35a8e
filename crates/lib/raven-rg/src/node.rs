use crate::executor::PassExecFn;
use crate::handle::PassId;
use crate::virtual_resource::VirtualResourceConcept;

/// Whether a resource entry's lifetime is owned by the graph (`Transient`,
/// created and destroyed by the executor) or by the client (`Imported`,
/// the engine never calls `create`/`destroy` on it).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Transient,
    Imported,
}

/// `(handle, flags)`. `flags == IGNORED` suppresses the pre-read/pre-write
/// hook for this particular access declaration.
#[derive(Debug, Clone, Copy)]
pub struct AccessDeclaration {
    pub node: u32,
    pub flags: u32,
}

/// A versioned view onto one `ResourceEntry`. A handle is valid iff its
/// node's `version` equals the entry's current version.
pub struct ResourceNode {
    pub(crate) name: String,
    pub(crate) node_id: u32,
    pub(crate) resource_id: u32,
    pub(crate) version: u32,
    pub(crate) ref_count: i32,
    /// Pass that writes this exact node, set in compiler Phase A. Consulted
    /// only by the Phase B culling walk; distinct from `ResourceEntry`'s own
    /// `producer`/`last`, which the executor uses for create/destroy timing.
    pub(crate) producer: Option<PassId>,
}

impl ResourceNode {
    pub fn id(&self) -> u32 {
        self.node_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn resource_id(&self) -> u32 {
        self.resource_id
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn ref_count(&self) -> i32 {
        self.ref_count
    }

    pub fn producer(&self) -> Option<u32> {
        self.producer
    }
}

/// One physical virtual resource. Owns the type-erased user object behind a
/// `VirtualResourceConcept`.
pub struct ResourceEntry<Ctx, Alloc> {
    pub(crate) id: u32,
    pub(crate) kind: ResourceKind,
    pub(crate) version: u32,
    pub(crate) producer: Option<PassId>,
    pub(crate) last: Option<PassId>,
    pub(crate) concept: Box<dyn VirtualResourceConcept<Ctx, Alloc>>,
}

impl<Ctx, Alloc> ResourceEntry<Ctx, Alloc> {
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn is_transient(&self) -> bool {
        self.kind == ResourceKind::Transient
    }

    pub fn is_imported(&self) -> bool {
        self.kind == ResourceKind::Imported
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn producer(&self) -> Option<u32> {
        self.producer
    }

    pub fn last(&self) -> Option<u32> {
        self.last
    }

    pub fn debug_string(&self) -> String {
        self.concept.debug_string()
    }
}

/// A unit of declared work: a name, the accesses it declared at setup time,
/// and a deferred execute closure invoked by the executor if the pass
/// survives culling.
pub struct PassNode<Ctx, Alloc> {
    pub(crate) name: String,
    pub(crate) pass_id: u32,
    pub(crate) ref_count: i32,
    pub(crate) has_side_effect: bool,
    pub(crate) creates: Vec<u32>,
    pub(crate) reads: Vec<AccessDeclaration>,
    pub(crate) writes: Vec<AccessDeclaration>,
    pub(crate) exec: Option<Box<PassExecFn<Ctx, Alloc>>>,
}

impl<Ctx, Alloc> PassNode<Ctx, Alloc> {
    pub(crate) fn new_empty(pass_id: u32, name: String) -> Self {
        Self {
            name,
            pass_id,
            ref_count: 0,
            has_side_effect: false,
            creates: Vec::new(),
            reads: Vec::new(),
            writes: Vec::new(),
            exec: None,
        }
    }

    pub fn id(&self) -> u32 {
        self.pass_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ref_count(&self) -> i32 {
        self.ref_count
    }

    pub fn has_side_effect(&self) -> bool {
        self.has_side_effect
    }

    /// A pass is live iff culling left it with outstanding references, or it
    /// was marked as having an observable side effect.
    pub fn can_execute(&self) -> bool {
        self.ref_count > 0 || self.has_side_effect
    }

    pub fn creates(&self) -> &[u32] {
        &self.creates
    }

    pub fn reads(&self) -> &[AccessDeclaration] {
        &self.reads
    }

    pub fn writes(&self) -> &[AccessDeclaration] {
        &self.writes
    }
}
