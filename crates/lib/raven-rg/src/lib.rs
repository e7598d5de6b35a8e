mod blackboard;
mod builder;
mod compiler;
mod debug;
mod executor;
mod graph;
mod handle;
mod node;
mod virtual_resource;

pub use blackboard::Blackboard;
pub use builder::FrameGraphBuilder;
pub use debug::DebugVisitor;
pub use executor::PassResources;
pub use graph::FrameGraph;
pub use handle::{FrameGraphResource, IGNORED};
pub use node::{AccessDeclaration, PassNode, ResourceEntry, ResourceKind, ResourceNode};
pub use virtual_resource::Virtualizable;

extern crate log as glog;
