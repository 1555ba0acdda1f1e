use eframe::glow::{self, HasContext as _};
use terrain_core::{FrameParams, TerrainMesh};
use thiserror::Error;

use crate::shader::{self, NORMAL_ATTRIB, POSITION_ATTRIB, ShaderError, ShaderSources};

// Direction towards the light, world space
const LIGHT_DIR: [f32; 3] = [0.4, 1.0, 0.3];

#[derive(Debug, Error)]
pub enum RendererError {
    #[error(transparent)]
    Shader(#[from] ShaderError),

    #[error("could not create {what}: {reason}")]
    Resource { what: &'static str, reason: String },

    #[error("terrain has {0} indices, more than a single draw call can address")]
    TooManyIndices(usize),
}

fn resource(what: &'static str) -> impl FnOnce(String) -> RendererError {
    move |reason| RendererError::Resource { what, reason }
}

// glDrawElements takes a GLsizei count
fn draw_count(index_count: usize) -> Result<i32, RendererError> {
    i32::try_from(index_count).map_err(|_| RendererError::TooManyIndices(index_count))
}

/// Which mesh generation the buffers hold. A generation the GPU refused is
/// remembered so it isn't retried every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MeshSync {
    uploaded: u64,
    refused: Option<u64>,
}

impl MeshSync {
    fn new(generation: u64) -> Self {
        Self {
            uploaded: generation,
            refused: None,
        }
    }

    fn is_stale(&self, generation: u64) -> bool {
        generation != self.uploaded && self.refused != Some(generation)
    }

    fn uploaded(&mut self, generation: u64) {
        self.uploaded = generation;
        self.refused = None;
    }

    fn refused(&mut self, generation: u64) {
        self.refused = Some(generation);
    }
}

/// GPU side of the terrain: one program, one VAO, three buffers.
pub struct TerrainRenderer {
    program: glow::Program,
    vao: glow::VertexArray,
    position_vbo: glow::Buffer,
    normal_vbo: glow::Buffer,
    index_buffer: glow::Buffer,
    mvp_loc: Option<glow::UniformLocation>,
    height_range_loc: Option<glow::UniformLocation>,
    light_dir_loc: Option<glow::UniformLocation>,
    index_count: i32,
    sync: MeshSync,
    pub wireframe: bool,
}

impl TerrainRenderer {
    /// Compile the program and upload `mesh` once.
    pub fn on_surface_created(
        gl: &glow::Context,
        sources: &ShaderSources,
        mesh: &TerrainMesh,
        generation: u64,
    ) -> Result<Self, RendererError> {
        unsafe {
            let program = shader::compile_program(gl, sources)?;
            let mvp_loc = gl.get_uniform_location(program, "u_mvp");
            if mvp_loc.is_none() {
                log::warn!("u_mvp not found in terrain program");
            }
            let height_range_loc = gl.get_uniform_location(program, "u_height_range");
            let light_dir_loc = gl.get_uniform_location(program, "u_light_dir");

            let vao = gl.create_vertex_array().map_err(resource("vertex array"))?;
            let position_vbo = gl.create_buffer().map_err(resource("position buffer"))?;
            let normal_vbo = gl.create_buffer().map_err(resource("normal buffer"))?;
            let index_buffer = gl.create_buffer().map_err(resource("index buffer"))?;

            // The VAO remembers the attribute layout and the bound index buffer
            gl.bind_vertex_array(Some(vao));

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(position_vbo));
            gl.enable_vertex_attrib_array(POSITION_ATTRIB);
            gl.vertex_attrib_pointer_f32(POSITION_ATTRIB, 3, glow::FLOAT, false, 0, 0);

            gl.bind_buffer(glow::ARRAY_BUFFER, Some(normal_vbo));
            gl.enable_vertex_attrib_array(NORMAL_ATTRIB);
            gl.vertex_attrib_pointer_f32(NORMAL_ATTRIB, 3, glow::FLOAT, false, 0, 0);

            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(index_buffer));

            gl.bind_vertex_array(None);
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            let mut renderer = Self {
                program,
                vao,
                position_vbo,
                normal_vbo,
                index_buffer,
                mvp_loc,
                height_range_loc,
                light_dir_loc,
                index_count: 0,
                sync: MeshSync::new(generation),
                wireframe: false,
            };
            if let Err(err) = renderer.upload_mesh(gl, mesh, generation) {
                renderer.destroy(gl);
                return Err(err);
            }
            log::info!(
                "terrain uploaded: {} vertices, {} triangles",
                mesh.vertex_count(),
                mesh.index_count() / 3
            );
            Ok(renderer)
        }
    }

    /// Replace the buffer contents with a regenerated mesh. On failure the
    /// previous buffers stay bound and `generation` is not offered again.
    pub fn upload_mesh(
        &mut self,
        gl: &glow::Context,
        mesh: &TerrainMesh,
        generation: u64,
    ) -> Result<(), RendererError> {
        let index_count = match draw_count(mesh.index_count()) {
            Ok(count) => count,
            Err(err) => {
                self.sync.refused(generation);
                return Err(err);
            }
        };
        unsafe {
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.position_vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(mesh.positions()),
                glow::STATIC_DRAW,
            );
            gl.bind_buffer(glow::ARRAY_BUFFER, Some(self.normal_vbo));
            gl.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(mesh.normals()),
                glow::STATIC_DRAW,
            );
            gl.bind_buffer(glow::ARRAY_BUFFER, None);

            // Element buffer binding is VAO state
            gl.bind_vertex_array(Some(self.vao));
            gl.bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(self.index_buffer));
            gl.buffer_data_u8_slice(
                glow::ELEMENT_ARRAY_BUFFER,
                bytemuck::cast_slice(mesh.indices()),
                glow::STATIC_DRAW,
            );
            gl.bind_vertex_array(None);
        }
        self.index_count = index_count;
        self.sync.uploaded(generation);
        Ok(())
    }

    /// Whether the scene's `generation` still has to go to the GPU.
    pub fn needs_upload(&self, generation: u64) -> bool {
        self.sync.is_stale(generation)
    }

    pub fn on_draw_frame(&self, gl: &glow::Context, frame: &FrameParams) {
        let [r, g, b, a] = frame.clear_color;
        unsafe {
            gl.clear_color(r, g, b, a);
            gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
            gl.enable(glow::DEPTH_TEST);
            gl.depth_func(glow::LESS);
            gl.enable(glow::CULL_FACE);
            gl.cull_face(glow::BACK);

            gl.use_program(Some(self.program));
            gl.uniform_matrix_4_f32_slice(
                self.mvp_loc.as_ref(),
                false,
                &frame.view_projection.to_cols_array(),
            );
            gl.uniform_2_f32(
                self.height_range_loc.as_ref(),
                frame.height_bounds.0,
                frame.height_bounds.1,
            );
            gl.uniform_3_f32(self.light_dir_loc.as_ref(), LIGHT_DIR[0], LIGHT_DIR[1], LIGHT_DIR[2]);

            gl.bind_vertex_array(Some(self.vao));
            let wireframe = self.wireframe && !gl.version().is_embedded;
            if wireframe {
                gl.polygon_mode(glow::FRONT_AND_BACK, glow::LINE);
            }
            gl.draw_elements(glow::TRIANGLES, self.index_count, glow::UNSIGNED_INT, 0);
            if wireframe {
                gl.polygon_mode(glow::FRONT_AND_BACK, glow::FILL);
            }

            gl.bind_vertex_array(None);
            gl.use_program(None);
            gl.disable(glow::CULL_FACE);
            gl.disable(glow::DEPTH_TEST);
        }
    }

    pub fn destroy(&self, gl: &glow::Context) {
        unsafe {
            gl.delete_program(self.program);
            gl.delete_vertex_array(self.vao);
            gl.delete_buffer(self.position_vbo);
            gl.delete_buffer(self.normal_vbo);
            gl.delete_buffer(self.index_buffer);
        }
        log::debug!("terrain GPU resources released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draw_count_fits_gl_sizei() {
        assert_eq!(draw_count(6).unwrap(), 6);
        assert_eq!(draw_count(i32::MAX as usize).unwrap(), i32::MAX);
        let too_many = i32::MAX as usize + 1;
        assert!(matches!(draw_count(too_many), Err(RendererError::TooManyIndices(n)) if n == too_many));
    }

    #[test]
    fn new_generation_is_stale_until_uploaded() {
        let mut sync = MeshSync::new(0);
        assert!(!sync.is_stale(0));
        assert!(sync.is_stale(1));
        sync.uploaded(1);
        assert!(!sync.is_stale(1));
    }

    #[test]
    fn refused_generation_is_not_retried() {
        let mut sync = MeshSync::new(0);
        sync.refused(1);
        // every later frame asks again with the same generation
        for _ in 0..3 {
            assert!(!sync.is_stale(1));
        }
        assert_eq!(sync.uploaded, 0);

        // regenerating again gives the next mesh its own chance
        assert!(sync.is_stale(2));
        sync.uploaded(2);
        assert_eq!(sync, MeshSync::new(2));
    }
}
