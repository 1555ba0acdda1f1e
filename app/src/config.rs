use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use serde::{Deserialize, Serialize};
use terrain_core::{OrbitCamera, Projection, TerrainError, TerrainParams};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "terrain_demo", about = "Perlin heightfield rendered with OpenGL")]
pub struct Args {
    /// JSON config file; CLI flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Noise seed
    #[arg(long)]
    pub seed: Option<u64>,

    /// Vertices per side of the terrain grid
    #[arg(long)]
    pub grid_size: Option<usize>,

    /// Directory holding terrain.vert / terrain.frag overrides
    #[arg(long)]
    pub shader_dir: Option<PathBuf>,

    /// Write a coloured PNG of the height map and exit
    #[arg(long, value_name = "PNG")]
    pub export_heightmap: Option<PathBuf>,

    /// Start from the classic view: eye at (0, 0, 2) looking down -Z
    #[arg(long)]
    pub looking_down_z: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Invalid(#[from] TerrainError),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub yaw_deg: f32,
    pub pitch_deg: f32,
    pub distance: f32,
    // radians per dragged point
    pub orbit_speed: f32,
    // log-distance per scrolled point
    pub zoom_speed: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            yaw_deg: 0.0,
            pitch_deg: 35.0,
            distance: 3.0,
            orbit_speed: 0.01,
            zoom_speed: 0.002,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 1024.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub terrain: TerrainParams,
    pub camera: CameraConfig,
    pub projection: Projection,
    pub clear_color: [f32; 4],
    pub window: WindowConfig,
    pub shader_dir: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            terrain: TerrainParams::default(),
            camera: CameraConfig::default(),
            projection: Projection::default(),
            clear_color: [0.0, 0.0, 0.0, 1.0],
            window: WindowConfig::default(),
            shader_dir: None,
        }
    }
}

impl DemoConfig {
    /// Defaults, then the JSON file (if any), then CLI flags.
    pub fn resolve(args: &Args) -> Result<Self, ConfigError> {
        let mut config = match &args.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.apply_args(args);
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::info!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_args(&mut self, args: &Args) {
        if let Some(seed) = args.seed {
            self.terrain.seed = seed;
        }
        if let Some(grid_size) = args.grid_size {
            self.terrain.grid_size = grid_size;
        }
        if let Some(dir) = &args.shader_dir {
            self.shader_dir = Some(dir.clone());
        }
        if args.looking_down_z {
            self.camera.yaw_deg = 0.0;
            self.camera.pitch_deg = 0.0;
            self.camera.distance = 2.0;
        }
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        self.terrain.validate()?;
        self.projection.validate()
    }

    pub fn orbit_camera(&self) -> OrbitCamera {
        OrbitCamera::new(
            glam::Vec3::ZERO,
            self.camera.yaw_deg.to_radians(),
            self.camera.pitch_deg.to_radians(),
            self.camera.distance,
        )
    }
}
