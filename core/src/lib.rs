// core holds the noise, heightfield mesh, camera and scene state
// Nothing in here touches GL; the app crate owns the GPU side.
pub mod camera;
pub mod error;
pub mod mesh;
pub mod perlin2;
pub mod scene;
pub mod utils;

pub use camera::{OrbitCamera, Projection};
pub use error::TerrainError;
pub use mesh::{TerrainMesh, TerrainParams};
pub use perlin2::Perlin2D;
pub use scene::{FrameParams, Scene};
pub use utils::flatten2;

// noise generator that can sample 2D points
// The heightfield only ever needs (x, z) -> height.
pub trait NoiseGenerator {
    // Sample 2D noise at (x, y).
    fn get2(&self, x: f64, y: f64) -> f64;
}
