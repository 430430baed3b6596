//! Vitrine - headless artifact viewer
//!
//! Loads an artifact the way the interactive viewer does, renders a few
//! frames into a draw list and reports what would be on screen. Clicks can be
//! replayed to inspect hotspots.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;
use vitrine::{
    AssetLoader, Catalog, ConsoleUi, DrawList, FileLoader, MemoryLoader, PointerEvent, RawGeometry,
    Vec2, Vec3, Viewer, ViewerConfig, load_config,
};

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Parser, Debug)]
#[command(name = "vitrine")]
#[command(about = "Interactive 3D artifact viewer with clickable hotspots")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "vitrine.toml")]
    config: PathBuf,

    /// Artifact id to show (defaults to the first catalog entry)
    #[arg(short, long)]
    artifact: Option<String>,

    /// Directory asset paths are resolved against
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Serve a placeholder box for every artifact instead of reading files
    #[arg(long)]
    placeholder: bool,

    /// Pointer press in viewport pixels, as X,Y (repeatable)
    #[arg(long, value_parser = parse_point)]
    click: Vec<Vec2>,

    /// Click every hotspot marker at its projected screen position
    #[arg(long)]
    click_hotspots: bool,

    /// Orbit drag in pixels, as DX,DY, applied before the view reset
    #[arg(long, value_parser = parse_point)]
    orbit: Option<Vec2>,

    /// Frames to render after the artifact has loaded
    #[arg(long, default_value_t = 60)]
    frames: u32,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,
}

fn parse_point(s: &str) -> Result<Vec2, String> {
    let (x, y) = s
        .split_once(',')
        .ok_or_else(|| format!("expected X,Y, got '{}'", s))?;
    let x = x.trim().parse::<f32>().map_err(|e| e.to_string())?;
    let y = y.trim().parse::<f32>().map_err(|e| e.to_string())?;
    Ok(Vec2::new(x, y))
}

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_lowercase()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Vitrine v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    let catalog = config.catalog()?;
    info!(artifacts = catalog.len(), "Catalog loaded");

    if args.placeholder {
        let loader = placeholder_loader(&catalog);
        run(&args, &config, catalog, loader)
    } else {
        let root = args.assets.clone().unwrap_or_else(|| config.asset_root.clone());
        run(&args, &config, catalog, FileLoader::new(root))
    }
}

/// A unit box per artifact, stretched a little so models differ.
fn placeholder_loader(catalog: &Catalog) -> MemoryLoader {
    let mut loader = MemoryLoader::new();
    for (i, artifact) in catalog.iter().enumerate() {
        let size = Vec3::new(1.0, 1.0 + i as f32 * 0.5, 1.0);
        loader.insert(artifact.asset_path.clone(), RawGeometry::cuboid(size, Vec3::ZERO));
    }
    loader
}

fn run<L: AssetLoader>(args: &Args, config: &ViewerConfig, catalog: Catalog, loader: L) -> Result<()> {
    let mut viewer = Viewer::new(config, catalog, loader, ConsoleUi::new());
    let mut renderer = DrawList::new();

    let started = match &args.artifact {
        Some(id) => viewer.select_artifact(id)?,
        None => viewer.start()?,
    };
    if !started {
        if let Some(text) = viewer.ui().loading_text() {
            println!("{}", text);
        }
        return Ok(());
    }

    while viewer.is_loading() {
        viewer.tick(&mut renderer);
        thread::sleep(FRAME_INTERVAL);
    }

    let Some(active) = viewer.active() else {
        let reason = viewer
            .ui()
            .alerts
            .last()
            .cloned()
            .unwrap_or_else(|| "unknown error".to_string());
        bail!("{}", reason);
    };

    println!("Artifact: {} ({})", active.descriptor.name, active.descriptor.id);
    println!(
        "  Scale: auto {:.4} x manual {:.2} = {:.4}",
        active.applied.auto_scale,
        active.applied.manual_scale,
        active.applied.final_scale()
    );
    println!("  Offset: {}", active.applied.final_position);
    println!("  Effective size: {}", active.effective_size);
    println!("  Hotspots: {}", active.markers.len());

    for _ in 0..args.frames {
        viewer.tick(&mut renderer);
    }
    println!(
        "Frame {}: {} draws, {} triangles, camera at {}",
        renderer.frames,
        renderer.commands.len(),
        renderer.triangle_count(),
        viewer.camera().position
    );

    let mut clicks = args.click.clone();
    if args.click_hotspots {
        clicks.extend(marker_screen_positions(&viewer));
    }
    for point in clicks {
        match viewer.pointer_down(PointerEvent::new(point.x, point.y)) {
            Some(hotspot) => println!("Click ({}, {}): {}", point.x, point.y, hotspot.title),
            None => println!("Click ({}, {}): nothing", point.x, point.y),
        }
    }
    if let Some(info) = &viewer.ui().info {
        println!("Info panel: {} - {}", info.title, info.content);
    }
    viewer.close_info();

    if let Some(drag) = args.orbit {
        viewer.controls_mut().rotate(drag);
        for _ in 0..args.frames {
            viewer.tick(&mut renderer);
        }
        println!("After orbit: camera at {}", viewer.camera().position);

        viewer.reset_view();
        viewer.tick(&mut renderer);
        println!("After reset: camera at {}", viewer.camera().position);
    }

    Ok(())
}

/// Screen positions of the active markers, for synthesized clicks.
fn marker_screen_positions<L: AssetLoader>(viewer: &Viewer<L, ConsoleUi>) -> Vec<Vec2> {
    let Some(active) = viewer.active() else {
        return Vec::new();
    };
    let viewport = viewer.viewport();
    active
        .markers
        .iter()
        .filter_map(|&marker| viewer.scene().world_position(marker))
        .filter_map(|world| {
            viewer.camera().world_to_screen(world, viewport)
        })
        .collect()
}
