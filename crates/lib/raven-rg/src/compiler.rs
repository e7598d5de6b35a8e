use crate::graph::FrameGraph;

/// Three-phase compile: reference counting, iterative culling, then
/// lifetime-window assignment over the surviving (live) passes.
pub(crate) fn compile<Ctx, Alloc>(graph: &mut FrameGraph<Ctx, Alloc>) {
    phase_a_reference_count(graph);
    phase_b_cull(graph);
    phase_c_lifetime_windows(graph);
}

fn phase_a_reference_count<Ctx, Alloc>(graph: &mut FrameGraph<Ctx, Alloc>) {
    for pass_id in 0..graph.passes.len() {
        graph.passes[pass_id].ref_count = graph.passes[pass_id].writes.len() as i32;

        let reads: Vec<u32> = graph.passes[pass_id].reads.iter().map(|a| a.node).collect();
        for node_id in reads {
            graph.resource_nodes[node_id as usize].ref_count += 1;
        }

        let writes: Vec<u32> = graph.passes[pass_id].writes.iter().map(|a| a.node).collect();
        for node_id in writes {
            graph.resource_nodes[node_id as usize].producer = Some(pass_id as u32);
        }
    }
}

fn phase_b_cull<Ctx, Alloc>(graph: &mut FrameGraph<Ctx, Alloc>) {
    let mut stack: Vec<u32> = graph
        .resource_nodes
        .iter()
        .filter(|node| node.ref_count == 0)
        .map(|node| node.node_id)
        .collect();

    while let Some(node_id) = stack.pop() {
        let producer = match graph.resource_nodes[node_id as usize].producer {
            Some(p) => p,
            None => continue,
        };

        if graph.passes[producer as usize].has_side_effect {
            continue;
        }

        debug_assert!(graph.passes[producer as usize].ref_count >= 1);
        graph.passes[producer as usize].ref_count -= 1;

        if graph.passes[producer as usize].ref_count == 0 {
            let reads: Vec<u32> = graph.passes[producer as usize]
                .reads
                .iter()
                .map(|a| a.node)
                .collect();

            for rid in reads {
                graph.resource_nodes[rid as usize].ref_count -= 1;
                if graph.resource_nodes[rid as usize].ref_count == 0 {
                    stack.push(rid);
                }
            }
        }
    }
}

fn phase_c_lifetime_windows<Ctx, Alloc>(graph: &mut FrameGraph<Ctx, Alloc>) {
    for pass_id in 0..graph.passes.len() {
        if !graph.passes[pass_id].can_execute() {
            glog::debug!("culled pass '{}'", graph.passes[pass_id].name);
            continue;
        }

        let creates = graph.passes[pass_id].creates.clone();
        for node_id in creates {
            let resource_id = graph.resource_nodes[node_id as usize].resource_id;
            graph.resources[resource_id as usize].producer = Some(pass_id as u32);
        }

        let writes: Vec<u32> = graph.passes[pass_id].writes.iter().map(|a| a.node).collect();
        for node_id in writes {
            debug_assert!(
                graph.resource_nodes[node_id as usize].producer.is_some(),
                "a written resource node must have a producer by Phase C"
            );
            let resource_id = graph.resource_nodes[node_id as usize].resource_id;
            graph.resources[resource_id as usize].last = Some(pass_id as u32);
        }

        let reads: Vec<u32> = graph.passes[pass_id].reads.iter().map(|a| a.node).collect();
        for node_id in reads {
            let resource_id = graph.resource_nodes[node_id as usize].resource_id;
            graph.resources[resource_id as usize].last = Some(pass_id as u32);
        }
    }
}
