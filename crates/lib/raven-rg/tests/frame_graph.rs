use std::cell::Cell;

use raven_rg::{
    DebugVisitor, FrameGraph, FrameGraphResource, PassNode, ResourceEntry, ResourceNode,
    Virtualizable, IGNORED,
};

#[derive(Default, Clone, Debug)]
struct TextureDesc {
    width: u32,
    height: u32,
}

#[derive(Default)]
struct Texture {
    id: i32,
}

#[derive(Default)]
struct TestAllocator {
    next_id: Cell<i32>,
}

impl Virtualizable<(), TestAllocator> for Texture {
    type Desc = TextureDesc;

    fn create(&mut self, _desc: &TextureDesc, alloc: &mut TestAllocator) {
        let id = alloc.next_id.get() + 1;
        alloc.next_id.set(id);
        self.id = id;
    }

    fn destroy(&mut self, _desc: &TextureDesc, _alloc: &mut TestAllocator) {}

    fn debug_string(_desc: &TextureDesc) -> String {
        "<I>texture</I>".to_string()
    }
}

type TestGraph = FrameGraph<(), TestAllocator>;

#[test]
fn pass_without_data_just_runs() {
    let mut graph = TestGraph::new();
    graph.reserve(1, 0);

    #[derive(Default)]
    struct Empty;

    graph.add_callback_pass::<Empty, _, _>("empty", |_builder, _data| {}, |_d, _r, _c| Ok(()));

    graph.compile();
    graph.execute(&mut (), &mut TestAllocator::default()).unwrap();
}

#[test]
fn basic_graph_with_side_effect() {
    let mut graph = TestGraph::new();
    let mut alloc = TestAllocator::default();

    #[derive(Default)]
    struct Data {
        foo: Option<FrameGraphResource<Texture>>,
        bar: Option<FrameGraphResource<Texture>>,
        executed: Cell<bool>,
    }

    let data = graph.add_callback_pass::<Data, _, _>(
        "basic",
        |builder, data| {
            let foo = builder.create::<Texture>(
                "foo",
                TextureDesc {
                    width: 128,
                    height: 128,
                },
            );
            let bar = builder.create::<Texture>(
                "bar",
                TextureDesc {
                    width: 256,
                    height: 256,
                },
            );
            data.foo = Some(builder.write(foo, IGNORED));
            data.bar = Some(builder.write(bar, IGNORED));
            builder.set_side_effect();
        },
        |data, resources, _ctx| {
            assert_eq!(resources.get(data.foo.unwrap()).id, 1);
            assert_eq!(resources.get(data.bar.unwrap()).id, 2);
            data.executed.set(true);
            Ok(())
        },
    );

    graph.compile();
    graph.execute(&mut (), &mut alloc).unwrap();

    assert!(data.borrow().executed.get());
}

#[test]
fn imported_resource_is_never_created_and_rename_invalidates_old_handle() {
    let mut graph = TestGraph::new();
    let mut alloc = TestAllocator::default();

    let backbuffer = graph.import::<Texture>(
        "backbuffer",
        TextureDesc { width: 1, height: 1 },
        Texture { id: 777 },
    );

    #[derive(Default)]
    struct Data {
        renamed: Option<FrameGraphResource<Texture>>,
        executed: Cell<bool>,
    }

    let data = graph.add_callback_pass::<Data, _, _>(
        "import_write",
        |builder, data| {
            data.renamed = Some(builder.write(backbuffer, IGNORED));
        },
        |data, resources, _ctx| {
            assert_eq!(resources.get(data.renamed.unwrap()).id, 777);
            data.executed.set(true);
            Ok(())
        },
    );

    graph.compile();
    graph.execute(&mut (), &mut alloc).unwrap();

    assert!(!graph.is_valid(backbuffer));
    assert!(graph.is_valid(data.borrow().renamed.unwrap()));
    assert!(data.borrow().executed.get());
}

#[test]
fn renamed_resource_chains_across_passes() {
    const TEST_FLAG: u32 = 1;

    let mut graph = TestGraph::new();
    let mut alloc = TestAllocator::default();

    #[derive(Default)]
    struct Pass1Data {
        foo: Option<FrameGraphResource<Texture>>,
        executed: Cell<bool>,
    }
    #[derive(Default)]
    struct Pass2Data {
        foo: Option<FrameGraphResource<Texture>>,
        executed: Cell<bool>,
    }

    let pass1 = graph.add_callback_pass::<Pass1Data, _, _>(
        "pass1",
        |builder, data| {
            let foo = builder.create::<Texture>(
                "foo",
                TextureDesc {
                    width: 64,
                    height: 64,
                },
            );
            data.foo = Some(builder.write(foo, IGNORED));
        },
        |data, _resources, _ctx| {
            data.executed.set(true);
            Ok(())
        },
    );

    let pass1_foo = pass1.borrow().foo.unwrap();

    let pass2 = graph.add_callback_pass::<Pass2Data, _, _>(
        "pass2",
        |builder, data| {
            let read = builder.read(pass1_foo, TEST_FLAG);
            data.foo = Some(builder.write(read, TEST_FLAG));
            builder.set_side_effect();
        },
        |data, _resources, _ctx| {
            data.executed.set(true);
            Ok(())
        },
    );

    graph.compile();
    graph.execute(&mut (), &mut alloc).unwrap();

    assert!(!graph.is_valid(pass1_foo));
    assert!(graph.is_valid(pass2.borrow().foo.unwrap()));
    assert!(pass1.borrow().executed.get());
    assert!(pass2.borrow().executed.get());
}

#[test]
fn pass_with_no_declarations_is_culled() {
    let mut graph = TestGraph::new();
    let mut alloc = TestAllocator::default();

    #[derive(Default)]
    struct Data {
        executed: Cell<bool>,
    }

    let data = graph.add_callback_pass::<Data, _, _>(
        "dummy",
        |_builder, _data| {},
        |data, _resources, _ctx| {
            data.executed.set(true);
            Ok(())
        },
    );

    graph.compile();
    graph.execute(&mut (), &mut alloc).unwrap();

    assert!(!data.borrow().executed.get());
}

#[test]
fn deferred_pipeline_culls_unused_dummy_pass() {
    let hd_desc = || TextureDesc {
        width: 1920,
        height: 1080,
    };

    let mut graph = TestGraph::new();
    let mut alloc = TestAllocator::default();

    let backbuffer = graph.import::<Texture>(
        "backbuffer",
        TextureDesc { width: 1, height: 1 },
        Texture { id: 117 },
    );

    #[derive(Default)]
    struct DepthData {
        depth: Option<FrameGraphResource<Texture>>,
        executed: Cell<bool>,
    }
    #[derive(Default)]
    struct GBufferData {
        position: Option<FrameGraphResource<Texture>>,
        normal: Option<FrameGraphResource<Texture>>,
        albedo: Option<FrameGraphResource<Texture>>,
        executed: Cell<bool>,
    }
    #[derive(Default)]
    struct LightingData {
        executed: Cell<bool>,
    }
    #[derive(Default)]
    struct DummyData {
        executed: Cell<bool>,
    }

    let depth_pass = graph.add_callback_pass::<DepthData, _, _>(
        "depth",
        |builder, data| {
            let depth = builder.create::<Texture>("depth", hd_desc());
            data.depth = Some(builder.write(depth, 1));
        },
        |data, _r, _c| {
            data.executed.set(true);
            Ok(())
        },
    );
    let depth_handle = depth_pass.borrow().depth.unwrap();

    let gbuffer_pass = graph.add_callback_pass::<GBufferData, _, _>(
        "gbuffer",
        |builder, data| {
            let _depth = builder.read(depth_handle, 1);
            let position = builder.create::<Texture>("position", hd_desc());
            let normal = builder.create::<Texture>("normal", hd_desc());
            let albedo = builder.create::<Texture>("albedo", hd_desc());
            data.position = Some(builder.write(position, 1));
            data.normal = Some(builder.write(normal, 1));
            data.albedo = Some(builder.write(albedo, 1));
        },
        |data, _r, _c| {
            data.executed.set(true);
            Ok(())
        },
    );

    let (position_handle, normal_handle, albedo_handle) = {
        let g = gbuffer_pass.borrow();
        (g.position.unwrap(), g.normal.unwrap(), g.albedo.unwrap())
    };

    let lighting_pass = graph.add_callback_pass::<LightingData, _, _>(
        "lighting",
        |builder, _data| {
            let _position = builder.read(position_handle, 1);
            let _normal = builder.read(normal_handle, 1);
            let _albedo = builder.read(albedo_handle, 1);
            let _backbuffer = builder.write(backbuffer, 1);
        },
        |data, _r, _c| {
            data.executed.set(true);
            Ok(())
        },
    );

    let dummy_pass = graph.add_callback_pass::<DummyData, _, _>(
        "dummy",
        |_builder, _data| {},
        |data, _r, _c| {
            data.executed.set(true);
            Ok(())
        },
    );

    graph.compile();
    graph.execute(&mut (), &mut alloc).unwrap();

    assert!(depth_pass.borrow().executed.get());
    assert!(gbuffer_pass.borrow().executed.get());
    assert!(lighting_pass.borrow().executed.get());
    assert!(!dummy_pass.borrow().executed.get());
}

struct ReadCountVisitor {
    read_counts: Vec<(String, usize)>,
    culled: Vec<(String, bool)>,
}

impl DebugVisitor<(), TestAllocator> for ReadCountVisitor {
    fn visit_pass(&mut self, pass: &PassNode<(), TestAllocator>, _resource_nodes: &[ResourceNode]) {
        self.read_counts
            .push((pass.name().to_string(), pass.reads().len()));
        self.culled.push((pass.name().to_string(), !pass.can_execute()));
    }

    fn visit_resource(
        &mut self,
        _node: &ResourceNode,
        _entry: &ResourceEntry<(), TestAllocator>,
        _passes: &[PassNode<(), TestAllocator>],
    ) {
    }

    fn flush(&mut self, _sink: &mut dyn std::io::Write) -> std::io::Result<()> {
        Ok(())
    }
}

#[test]
fn repeated_read_with_same_flags_is_idempotent() {
    let mut graph = TestGraph::new();

    #[derive(Default)]
    struct Data {
        foo: Option<FrameGraphResource<Texture>>,
    }

    graph.add_callback_pass::<Data, _, _>(
        "reader",
        |builder, data| {
            let foo = builder.create::<Texture>(
                "foo",
                TextureDesc {
                    width: 4,
                    height: 4,
                },
            );
            data.foo = Some(foo);
            let _ = builder.read(foo, 1);
            let _ = builder.read(foo, 1);
            let _ = builder.read(foo, 1);
        },
        |_d, _r, _c| Ok(()),
    );

    let mut visitor = ReadCountVisitor {
        read_counts: Vec::new(),
        culled: Vec::new(),
    };
    let mut sink = Vec::new();
    graph.debug_output(&mut visitor, &mut sink).unwrap();

    let (_, count) = visitor
        .read_counts
        .into_iter()
        .find(|(name, _)| name == "reader")
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn debug_output_reports_culled_status() {
    let mut graph = TestGraph::new();
    let mut alloc = TestAllocator::default();

    #[derive(Default)]
    struct Data;

    graph.add_callback_pass::<Data, _, _>("alive", |builder, _data| {
        builder.set_side_effect();
    }, |_d, _r, _c| Ok(()));

    graph.add_callback_pass::<Data, _, _>("culled", |_builder, _data| {}, |_d, _r, _c| Ok(()));

    graph.compile();
    graph.execute(&mut (), &mut alloc).unwrap();

    let mut visitor = ReadCountVisitor {
        read_counts: Vec::new(),
        culled: Vec::new(),
    };
    let mut sink = Vec::new();
    graph.debug_output(&mut visitor, &mut sink).unwrap();

    assert_eq!(
        visitor.culled.iter().find(|(n, _)| n == "alive").unwrap().1,
        false
    );
    assert_eq!(
        visitor.culled.iter().find(|(n, _)| n == "culled").unwrap().1,
        true
    );
}
