mod config;
mod renderer;
mod shader;
mod viewer;

use anyhow::{Context as _, Result};
use clap::Parser;
use eframe::{NativeOptions, egui, run_native};
use terrain_core::{Scene, TerrainMesh, utils::save_terrain_png};

use crate::config::{Args, DemoConfig};
use crate::viewer::TerrainViewer;

fn main() -> Result<()> {
    // Default to "info" if RUST_LOG is unset.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = DemoConfig::resolve(&args).context("invalid configuration")?;

    let mesh = TerrainMesh::generate(&config.terrain).context("terrain generation failed")?;

    if let Some(path) = &args.export_heightmap {
        save_terrain_png(&mesh.height_map(), path)
            .with_context(|| format!("could not export {}", path.display()))?;
        return Ok(());
    }

    let scene = Scene::new(mesh, config.orbit_camera(), config.projection)?
        .with_clear_color(config.clear_color);

    let opts = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Terrain Demo")
            .with_inner_size([config.window.width, config.window.height])
            .with_min_inner_size([400.0, 300.0]),
        renderer: eframe::Renderer::Glow,
        depth_buffer: 24,
        multisampling: 4,
        ..Default::default()
    };
    run_native(
        "Terrain Demo",
        opts,
        Box::new(move |cc| Ok(Box::new(TerrainViewer::new(cc, config, scene)))),
    )
    .map_err(|err| anyhow::anyhow!("window closed with an error: {err}"))
}
