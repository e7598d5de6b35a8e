use std::cell::Cell;

use raven_rg::{DebugVisitor, FrameGraph, FrameGraphResource, PassNode, ResourceEntry, ResourceNode, Virtualizable};

fn init_log() -> anyhow::Result<()> {
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Debug)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

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
struct Allocator {
    next_id: Cell<i32>,
}

struct RenderContext;

impl Virtualizable<RenderContext, Allocator> for Texture {
    type Desc = TextureDesc;

    fn create(&mut self, desc: &TextureDesc, alloc: &mut Allocator) {
        let id = alloc.next_id.get() + 1;
        alloc.next_id.set(id);
        self.id = id;
        log::debug!("materialized transient texture #{} ({}x{})", id, desc.width, desc.height);
    }

    fn destroy(&mut self, _desc: &TextureDesc, _alloc: &mut Allocator) {
        log::debug!("released transient texture #{}", self.id);
    }

    fn debug_string(desc: &TextureDesc) -> String {
        format!("texture {}x{}", desc.width, desc.height)
    }
}

#[derive(Default)]
struct DepthPassData {
    depth: Option<FrameGraphResource<Texture>>,
    executed: Cell<bool>,
}

#[derive(Default)]
struct GBufferPassData {
    position: Option<FrameGraphResource<Texture>>,
    normal: Option<FrameGraphResource<Texture>>,
    albedo: Option<FrameGraphResource<Texture>>,
    executed: Cell<bool>,
}

#[derive(Default)]
struct LightingPassData {
    executed: Cell<bool>,
}

#[derive(Default)]
struct UnusedPassData {
    executed: Cell<bool>,
}

struct TextWriter;

impl DebugVisitor<RenderContext, Allocator> for TextWriter {
    fn visit_pass(&mut self, pass: &PassNode<RenderContext, Allocator>, _resource_nodes: &[ResourceNode]) {
        println!(
            "pass #{} '{}' culled={} reads={} writes={}",
            pass.id(),
            pass.name(),
            !pass.can_execute(),
            pass.reads().len(),
            pass.writes().len(),
        );
    }

    fn visit_resource(
        &mut self,
        node: &ResourceNode,
        entry: &ResourceEntry<RenderContext, Allocator>,
        _passes: &[PassNode<RenderContext, Allocator>],
    ) {
        println!(
            "resource #{} '{}' v{} transient={} producer={:?}",
            node.id(),
            node.name(),
            node.version(),
            entry.is_transient(),
            entry.producer(),
        );
    }

    fn flush(&mut self, sink: &mut dyn std::io::Write) -> std::io::Result<()> {
        writeln!(sink, "-- end of frame --")
    }
}

fn hd_desc() -> TextureDesc {
    TextureDesc {
        width: 1920,
        height: 1080,
    }
}

fn main() -> anyhow::Result<()> {
    init_log()?;

    let mut graph = FrameGraph::<RenderContext, Allocator>::new();
    graph.reserve(4, 8);

    let backbuffer = graph.import::<Texture>(
        "backbuffer",
        TextureDesc { width: 1, height: 1 },
        Texture { id: 0 },
    );

    let depth_pass = graph.add_callback_pass::<DepthPassData, _, _>(
        "depth",
        |builder, data| {
            let depth = builder.create::<Texture>("depth", hd_desc());
            data.depth = Some(builder.write(depth, 1));
        },
        |data, _resources, _ctx| {
            data.executed.set(true);
            log::info!("depth pass executed");
            Ok(())
        },
    );
    let depth_handle = depth_pass.borrow().depth.unwrap();

    let gbuffer_pass = graph.add_callback_pass::<GBufferPassData, _, _>(
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
        |data, _resources, _ctx| {
            data.executed.set(true);
            log::info!("gbuffer pass executed");
            Ok(())
        },
    );

    let (position_handle, normal_handle, albedo_handle) = {
        let g = gbuffer_pass.borrow();
        (g.position.unwrap(), g.normal.unwrap(), g.albedo.unwrap())
    };

    let lighting_pass = graph.add_callback_pass::<LightingPassData, _, _>(
        "lighting",
        |builder, _data| {
            let _position = builder.read(position_handle, 1);
            let _normal = builder.read(normal_handle, 1);
            let _albedo = builder.read(albedo_handle, 1);
            let _backbuffer = builder.write(backbuffer, 1);
        },
        |data, _resources, _ctx| {
            data.executed.set(true);
            log::info!("lighting pass executed");
            Ok(())
        },
    );

    // Declares nothing and has no side effect; the compiler should cull it.
    let unused_pass = graph.add_callback_pass::<UnusedPassData, _, _>(
        "unused",
        |_builder, _data| {},
        |data, _resources, _ctx| {
            data.executed.set(true);
            Ok(())
        },
    );

    graph.compile();

    let mut ctx = RenderContext;
    let mut alloc = Allocator::default();
    graph.execute(&mut ctx, &mut alloc)?;

    log::info!(
        "depth={} gbuffer={} lighting={} unused={}",
        depth_pass.borrow().executed.get(),
        gbuffer_pass.borrow().executed.get(),
        lighting_pass.borrow().executed.get(),
        unused_pass.borrow().executed.get(),
    );

    let mut writer = TextWriter;
    let mut stdout = std::io::stdout();
    graph.debug_output(&mut writer, &mut stdout)?;

    Ok(())
}
