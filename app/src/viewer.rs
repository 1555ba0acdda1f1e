use std::sync::Arc;
use std::time::Instant;

use eframe::egui_glow;
use eframe::glow;
use eframe::{App, CreationContext, Frame};
use egui::mutex::Mutex;
use terrain_core::{Scene, TerrainMesh, TerrainParams};

use crate::config::{CameraConfig, DemoConfig};
use crate::renderer::TerrainRenderer;
use crate::shader::ShaderSources;

pub struct TerrainViewer {
    scene: Scene,
    // edited by the side panel, applied on "Generate Terrain"
    params: TerrainParams,
    camera_config: CameraConfig,
    config: DemoConfig,
    renderer: Option<Arc<Mutex<TerrainRenderer>>>,
    wireframe: bool,
    status_message: String,
}

impl TerrainViewer {
    pub fn new(cc: &CreationContext<'_>, config: DemoConfig, mut scene: Scene) -> Self {
        let mut status_message = String::new();
        let renderer = match cc.gl.as_ref() {
            Some(gl) => {
                let sources = ShaderSources::from_dir(config.shader_dir.as_deref());
                match TerrainRenderer::on_surface_created(
                    gl,
                    &sources,
                    scene.mesh(),
                    scene.mesh_generation(),
                ) {
                    Ok(renderer) => {
                        scene.on_surface_created();
                        Some(Arc::new(Mutex::new(renderer)))
                    }
                    Err(err) => {
                        log::error!("renderer setup failed: {err}");
                        status_message = format!("Renderer error: {err}");
                        None
                    }
                }
            }
            None => {
                log::error!("no OpenGL context; was eframe started with the glow renderer?");
                status_message = "No OpenGL context available".into();
                None
            }
        };

        Self {
            params: config.terrain.clone(),
            camera_config: config.camera.clone(),
            scene,
            config,
            renderer,
            wireframe: false,
            status_message,
        }
    }

    fn regenerate(&mut self) {
        let start = Instant::now();
        match TerrainMesh::generate(&self.params) {
            Ok(mesh) => {
                self.scene.replace_mesh(mesh);
                let elapsed = start.elapsed().as_secs_f32() * 1000.0;
                self.status_message =
                    format!("Generated in {:.2} ms (seed {})", elapsed, self.params.seed);
                log::info!("{}", self.status_message);
            }
            Err(err) => {
                log::warn!("terrain generation rejected: {err}");
                self.status_message = format!("Invalid parameters: {err}");
            }
        }
    }

    // Re-upload when the scene holds a newer mesh than the GPU
    fn sync_mesh(&mut self, gl: Option<&Arc<glow::Context>>) {
        let (Some(renderer), Some(gl)) = (&self.renderer, gl) else {
            return;
        };
        let mut renderer = renderer.lock();
        let generation = self.scene.mesh_generation();
        if !renderer.needs_upload(generation) {
            return;
        }
        if let Err(err) = renderer.upload_mesh(gl, self.scene.mesh(), generation) {
            // logged once; the GPU keeps drawing the previous terrain
            log::error!("mesh upload failed for generation {generation}: {err}");
            self.status_message = format!("Upload error: {err}");
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Terrain");
        ui.separator();

        ui.label("Seed");
        ui.add(egui::DragValue::new(&mut self.params.seed).speed(1.0));

        ui.label("Grid size");
        ui.add(egui::Slider::new(&mut self.params.grid_size, 2..=512));

        ui.label("Frequency");
        ui.add(egui::Slider::new(&mut self.params.frequency, 0.1..=10.0));

        ui.label("Persistence");
        ui.add(egui::Slider::new(&mut self.params.persistence, 0.0..=1.0));

        ui.label("Octaves");
        ui.add(egui::Slider::new(&mut self.params.octaves, 1..=8));

        ui.label("Height scale");
        ui.add(egui::Slider::new(&mut self.params.height_scale, 0.0..=1.5));

        ui.separator();

        if ui.button("Generate Terrain").clicked() {
            self.regenerate();
        }

        if ui.checkbox(&mut self.wireframe, "Wireframe").changed() {
            if let Some(renderer) = &self.renderer {
                renderer.lock().wireframe = self.wireframe;
            }
        }

        if ui.button("Reset camera").clicked() {
            *self.scene.camera_mut() = self.config.orbit_camera();
        }

        ui.separator();
        let camera = self.scene.camera();
        ui.label(format!(
            "Camera: yaw {:.0}°, pitch {:.0}°, distance {:.2}",
            camera.yaw().to_degrees(),
            camera.pitch().to_degrees(),
            camera.distance()
        ));
        let mesh = self.scene.mesh();
        ui.label(format!(
            "{} vertices, {} triangles",
            mesh.vertex_count(),
            mesh.index_count() / 3
        ));
        ui.label(&self.status_message);
    }

    fn viewport(&mut self, ui: &mut egui::Ui) {
        let (rect, response) = ui.allocate_exact_size(ui.available_size(), egui::Sense::drag());

        let drag = response.drag_delta();
        if drag != egui::Vec2::ZERO {
            let speed = self.camera_config.orbit_speed;
            self.scene.camera_mut().orbit(-drag.x * speed, drag.y * speed);
        }
        if response.hovered() {
            let scroll = ui.input(|i| i.smooth_scroll_delta.y);
            if scroll != 0.0 {
                let factor = (-scroll * self.camera_config.zoom_speed).exp();
                self.scene.camera_mut().zoom(factor);
            }
        }

        let Some(renderer) = self.renderer.clone() else {
            ui.painter().text(
                rect.center(),
                egui::Align2::CENTER_CENTER,
                "Renderer unavailable",
                egui::FontId::proportional(18.0),
                egui::Color32::LIGHT_RED,
            );
            return;
        };

        // Surface size in physical pixels drives the aspect ratio
        let pixels_per_point = ui.ctx().pixels_per_point();
        let width = (rect.width() * pixels_per_point).round() as u32;
        let height = (rect.height() * pixels_per_point).round() as u32;
        if self.scene.on_surface_changed(width, height).is_err() {
            // collapsed panel, nothing to draw this frame
            return;
        }

        // Matrices for this frame are settled before its draw is queued
        let frame = match self.scene.frame() {
            Ok(frame) => frame,
            Err(err) => {
                log::warn!("skipping draw: {err}");
                return;
            }
        };
        let callback = egui::PaintCallback {
            rect,
            callback: Arc::new(egui_glow::CallbackFn::new(move |_info, painter| {
                renderer.lock().on_draw_frame(painter.gl(), &frame);
            })),
        };
        ui.painter().add(callback);
    }
}

impl App for TerrainViewer {
    fn update(&mut self, ctx: &egui::Context, frame: &mut Frame) {
        let gl = frame.gl().cloned();

        egui::SidePanel::left("controls").show(ctx, |ui| {
            self.controls(ui);
        });
        self.sync_mesh(gl.as_ref());

        egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| self.viewport(ui));
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let (Some(renderer), Some(gl)) = (&self.renderer, gl) {
            renderer.lock().destroy(gl);
        }
    }
}
