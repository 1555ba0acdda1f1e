use glam::Mat4;

use crate::camera::{OrbitCamera, Projection};
use crate::error::TerrainError;
use crate::mesh::TerrainMesh;

/// Everything the GL side needs to draw one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameParams {
    pub view_projection: Mat4,
    pub clear_color: [f32; 4],
    pub index_count: usize,
    pub height_bounds: (f32, f32),
}

/// The demo scene: one mesh, one camera, one projection.
///
/// Mirrors the renderer callback order of a GL surface: created, changed
/// (any number of times), then one `frame()` per draw. Matrices are only
/// rebuilt after the surface size or the camera changed.
#[derive(Debug)]
pub struct Scene {
    mesh: TerrainMesh,
    camera: OrbitCamera,
    projection: Projection,
    clear_color: [f32; 4],
    surface: Option<(u32, u32)>,
    surface_live: bool,
    view_projection: Mat4,
    dirty: bool,
    mesh_generation: u64,
}

impl Scene {
    pub fn new(
        mesh: TerrainMesh,
        camera: OrbitCamera,
        projection: Projection,
    ) -> Result<Self, TerrainError> {
        projection.validate()?;
        Ok(Self {
            mesh,
            camera,
            projection,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            surface: None,
            surface_live: false,
            view_projection: Mat4::IDENTITY,
            dirty: true,
            mesh_generation: 0,
        })
    }

    pub fn with_clear_color(mut self, clear_color: [f32; 4]) -> Self {
        self.clear_color = clear_color;
        self
    }

    pub fn on_surface_created(&mut self) {
        log::info!("surface created");
        self.surface_live = true;
        self.dirty = true;
    }

    pub fn on_surface_changed(&mut self, width: u32, height: u32) -> Result<(), TerrainError> {
        if width == 0 || height == 0 {
            return Err(TerrainError::EmptySurface { width, height });
        }
        if self.surface != Some((width, height)) {
            log::debug!("surface changed to {}x{}", width, height);
            self.surface = Some((width, height));
            self.dirty = true;
        }
        Ok(())
    }

    pub fn is_surface_live(&self) -> bool {
        self.surface_live
    }

    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    /// Mutable camera access; the next frame recomputes its matrices.
    pub fn camera_mut(&mut self) -> &mut OrbitCamera {
        self.dirty = true;
        &mut self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn set_projection(&mut self, projection: Projection) -> Result<(), TerrainError> {
        projection.validate()?;
        self.projection = projection;
        self.dirty = true;
        Ok(())
    }

    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    /// Swap in a freshly generated terrain. The GPU copy is stale until the
    /// renderer sees the bumped generation.
    pub fn replace_mesh(&mut self, mesh: TerrainMesh) -> u64 {
        self.mesh = mesh;
        self.mesh_generation += 1;
        self.mesh_generation
    }

    pub fn mesh_generation(&self) -> u64 {
        self.mesh_generation
    }

    pub fn needs_matrix_update(&self) -> bool {
        self.dirty
    }

    /// Compute this frame's matrices (if stale) and hand back the draw inputs.
    ///
    /// Fails until `on_surface_created` has been called: there is nothing to
    /// draw on.
    pub fn frame(&mut self) -> Result<FrameParams, TerrainError> {
        if !self.surface_live {
            return Err(TerrainError::SurfaceNotCreated);
        }
        if self.dirty {
            self.update_matrices()?;
        }
        Ok(FrameParams {
            view_projection: self.view_projection,
            clear_color: self.clear_color,
            index_count: self.mesh.index_count(),
            height_bounds: self.mesh.height_bounds(),
        })
    }

    fn update_matrices(&mut self) -> Result<(), TerrainError> {
        // Aspect 1 until the first surface change arrives
        let (width, height) = self.surface.unwrap_or((1, 1));
        let projection = self.projection.matrix(width, height)?;
        self.view_projection = projection * self.camera.view_matrix();
        self.dirty = false;
        Ok(())
    }
}
