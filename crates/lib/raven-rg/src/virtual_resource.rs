use std::any::Any;
use std::cell::RefCell;

/// Capability contract a user resource type must satisfy to be stored inside
/// a frame graph. `create`/`destroy` are required; the hooks below are
/// optional and default to no-ops, mirroring the source's compile-time
/// detection of `preRead`/`preWrite`/`toString` overloads.
pub trait Virtualizable<Ctx, Alloc>: Default {
    type Desc: Default + 'static;

    fn create(&mut self, desc: &Self::Desc, alloc: &mut Alloc);
    fn destroy(&mut self, desc: &Self::Desc, alloc: &mut Alloc);

    fn pre_read(&mut self, _desc: &Self::Desc, _flags: u32, _ctx: &mut Ctx) {}
    fn pre_write(&mut self, _desc: &Self::Desc, _flags: u32, _ctx: &mut Ctx) {}
    fn debug_string(_desc: &Self::Desc) -> String {
        String::new()
    }
}

/// Object-safe dispatch surface stored behind `Box<dyn _>` in the registry.
/// One `VirtualResourceModel<T, ..>` is instantiated per concrete `T`; this
/// trait is the "concept" half of the concept/model type-erasure pair.
pub(crate) trait VirtualResourceConcept<Ctx, Alloc> {
    fn create(&mut self, alloc: &mut Alloc);
    fn destroy(&mut self, alloc: &mut Alloc);
    fn pre_read(&mut self, flags: u32, ctx: &mut Ctx);
    fn pre_write(&mut self, flags: u32, ctx: &mut Ctx);
    fn debug_string(&self) -> String;

    /// Type-erased handle to the `RefCell<T>` storing the resource object.
    /// Exists so `PassResources::get` can hand out a `RefMut<T>` through a
    /// shared `&self` — the Rust-idiomatic equivalent of the reference-member
    /// trick the source uses to return a mutable `T&` from a `const`-qualified
    /// accessor.
    fn resource_cell(&self) -> &dyn Any;
    fn desc_any(&self) -> &dyn Any;
}

pub(crate) struct VirtualResourceModel<T: Virtualizable<Ctx, Alloc>, Ctx, Alloc> {
    pub(crate) desc: T::Desc,
    pub(crate) resource: RefCell<T>,
}

impl<T, Ctx, Alloc> VirtualResourceConcept<Ctx, Alloc> for VirtualResourceModel<T, Ctx, Alloc>
where
    T: Virtualizable<Ctx, Alloc> + 'static,
    Ctx: 'static,
    Alloc: 'static,
{
    fn create(&mut self, alloc: &mut Alloc) {
        self.resource.get_mut().create(&self.desc, alloc);
    }

    fn destroy(&mut self, alloc: &mut Alloc) {
        self.resource.get_mut().destroy(&self.desc, alloc);
    }

    fn pre_read(&mut self, flags: u32, ctx: &mut Ctx) {
        self.resource.get_mut().pre_read(&self.desc, flags, ctx);
    }

    fn pre_write(&mut self, flags: u32, ctx: &mut Ctx) {
        self.resource.get_mut().pre_write(&self.desc, flags, ctx);
    }

    fn debug_string(&self) -> String {
        T::debug_string(&self.desc)
    }

    fn resource_cell(&self) -> &dyn Any {
        &self.resource
    }

    fn desc_any(&self) -> &dyn Any {
        &self.desc
    }
}
