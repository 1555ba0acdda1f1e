use std::fs;
use std::path::Path;

use eframe::egui_glow::ShaderVersion;
use eframe::glow::{self, HasContext as _};
use thiserror::Error;

pub const VERTEX_FILE: &str = "terrain.vert";
pub const FRAGMENT_FILE: &str = "terrain.frag";

const EMBEDDED_VERTEX: &str = include_str!("../shaders/terrain.vert");
const EMBEDDED_FRAGMENT: &str = include_str!("../shaders/terrain.frag");

// Attribute slots bound before linking so the VAO layout is fixed
pub const POSITION_ATTRIB: u32 = 0;
pub const NORMAL_ATTRIB: u32 = 1;

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("could not create {0}")]
    Create(String),

    #[error("{stage} shader failed to compile:\n{log}")]
    Compile { stage: &'static str, log: String },

    #[error("shader program failed to link:\n{0}")]
    Link(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl ShaderSources {
    pub fn embedded() -> Self {
        Self {
            vertex: EMBEDDED_VERTEX.to_owned(),
            fragment: EMBEDDED_FRAGMENT.to_owned(),
        }
    }

    /// Read overrides from `dir`. A file that can't be read is logged and
    /// replaced by the bundled source; the demo still starts.
    pub fn load(dir: &Path) -> Self {
        Self {
            vertex: read_or_embedded(&dir.join(VERTEX_FILE), EMBEDDED_VERTEX),
            fragment: read_or_embedded(&dir.join(FRAGMENT_FILE), EMBEDDED_FRAGMENT),
        }
    }

    pub fn from_dir(dir: Option<&Path>) -> Self {
        match dir {
            Some(dir) => Self::load(dir),
            None => Self::embedded(),
        }
    }
}

fn read_or_embedded(path: &Path, embedded: &str) -> String {
    match fs::read_to_string(path) {
        Ok(source) => {
            log::info!("using shader override {}", path.display());
            source
        }
        Err(err) => {
            log::error!(
                "could not read shader {}, using the bundled one: {}",
                path.display(),
                err
            );
            embedded.to_owned()
        }
    }
}

// Version line and interface switch for whatever context eframe handed us
fn with_header(version: &ShaderVersion, source: &str) -> String {
    format!(
        "{}\n#define NEW_SHADER_INTERFACE {}\n{}",
        version.version_declaration(),
        version.is_new_shader_interface() as i32,
        source
    )
}

/// Compile and link the terrain program.
///
/// # Safety
/// `gl` must be the current context on this thread.
pub unsafe fn compile_program(
    gl: &glow::Context,
    sources: &ShaderSources,
) -> Result<glow::Program, ShaderError> {
    unsafe {
        let version = ShaderVersion::get(gl);
        let program = gl.create_program().map_err(ShaderError::Create)?;

        let stages = [
            (glow::VERTEX_SHADER, "vertex", &sources.vertex),
            (glow::FRAGMENT_SHADER, "fragment", &sources.fragment),
        ];
        let mut shaders = Vec::with_capacity(stages.len());
        for (kind, stage, source) in stages {
            let shader = match gl.create_shader(kind) {
                Ok(shader) => shader,
                Err(err) => {
                    release(gl, program, &shaders);
                    return Err(ShaderError::Create(err));
                }
            };
            gl.shader_source(shader, &with_header(&version, source));
            gl.compile_shader(shader);
            shaders.push(shader);
            if !gl.get_shader_compile_status(shader) {
                let log = gl.get_shader_info_log(shader);
                release(gl, program, &shaders);
                return Err(ShaderError::Compile { stage, log });
            }
            gl.attach_shader(program, shader);
        }

        gl.bind_attrib_location(program, POSITION_ATTRIB, "a_position");
        gl.bind_attrib_location(program, NORMAL_ATTRIB, "a_normal");
        gl.link_program(program);
        let linked = gl.get_program_link_status(program);
        let link_log = gl.get_program_info_log(program);

        for &shader in &shaders {
            gl.detach_shader(program, shader);
            gl.delete_shader(shader);
        }
        if !linked {
            gl.delete_program(program);
            return Err(ShaderError::Link(link_log));
        }
        log::debug!("terrain program linked ({:?})", version);
        Ok(program)
    }
}

unsafe fn release(gl: &glow::Context, program: glow::Program, shaders: &[glow::Shader]) {
    unsafe {
        for &shader in shaders {
            gl.delete_shader(shader);
        }
        gl.delete_program(program);
    }
}
