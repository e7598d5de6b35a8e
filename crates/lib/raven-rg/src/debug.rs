use crate::graph::FrameGraph;
use crate::node::{PassNode, ResourceEntry, ResourceNode};

/// Read-only traversal surface consumed by external serializers (JSON,
/// Graphviz, ...). This crate implements only the traversal driver and the
/// contract; shipping a concrete writer is out of scope.
pub trait DebugVisitor<Ctx, Alloc> {
    /// Invoked once per pass, in declaration order, with every resource node
    /// in the graph so the visitor can resolve the names/versions of the
    /// pass's declared accesses itself.
    fn visit_pass(&mut self, pass: &PassNode<Ctx, Alloc>, resource_nodes: &[ResourceNode]);

    /// Invoked once per resource node, in declaration order, with the entry
    /// it snapshots and every pass in the graph so the visitor can resolve
    /// producer/reader/writer names itself.
    fn visit_resource(
        &mut self,
        node: &ResourceNode,
        entry: &ResourceEntry<Ctx, Alloc>,
        passes: &[PassNode<Ctx, Alloc>],
    );

    fn flush(&mut self, sink: &mut dyn std::io::Write) -> std::io::Result<()>;
}

pub(crate) fn debug_output<Ctx, Alloc, V>(
    graph: &FrameGraph<Ctx, Alloc>,
    visitor: &mut V,
    sink: &mut dyn std::io::Write,
) -> std::io::Result<()>
where
    V: DebugVisitor<Ctx, Alloc>,
{
    for pass in &graph.passes {
        visitor.visit_pass(pass, &graph.resource_nodes);
    }

    for node in &graph.resource_nodes {
        let entry = &graph.resources[node.resource_id() as usize];
        visitor.visit_resource(node, entry, &graph.passes);
    }

    visitor.flush(sink)
}
