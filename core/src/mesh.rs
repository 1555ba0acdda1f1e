use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::utils::{HeightMap2D, flatten2, height_range, sample_grid};
use crate::{NoiseGenerator, Perlin2D};

pub const MAX_OCTAVES: usize = 12;
/// Largest grid accepted: 4097² vertices, about 100M indices, still a valid
/// `i32` draw count.
pub const MAX_GRID_SIZE: usize = 4097;

/// Everything needed to rebuild the same terrain twice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Vertices per side; the mesh has `grid_size²` vertices.
    pub grid_size: usize,
    /// World-space width and depth of the mesh, centred on the origin.
    pub extent: f32,
    /// Noise output in [-1, 1] is multiplied by this to get world height.
    pub height_scale: f32,
    pub seed: u64,
    pub frequency: f64,
    pub persistence: f64,
    pub octaves: usize,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            grid_size: 128,
            extent: 2.0,
            height_scale: 0.35,
            seed: 2025,
            frequency: 3.0,
            persistence: 0.5,
            octaves: 5,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<(), TerrainError> {
        self.validate_geometry()?;
        if !(self.frequency.is_finite() && self.frequency > 0.0) {
            return Err(TerrainError::param("frequency", "must be a positive number"));
        }
        if !(0.0..=1.0).contains(&self.persistence) {
            return Err(TerrainError::param("persistence", "must lie in [0, 1]"));
        }
        if !(1..=MAX_OCTAVES).contains(&self.octaves) {
            return Err(TerrainError::param(
                "octaves",
                format!("must lie in 1..={MAX_OCTAVES}"),
            ));
        }
        Ok(())
    }

    // The parts that matter regardless of where heights come from
    fn validate_geometry(&self) -> Result<(), TerrainError> {
        if self.grid_size < 2 {
            return Err(TerrainError::param("grid_size", "need at least 2 vertices per side"));
        }
        if self.grid_size > MAX_GRID_SIZE {
            return Err(TerrainError::param(
                "grid_size",
                format!("must be at most {MAX_GRID_SIZE}"),
            ));
        }
        if !(self.extent.is_finite() && self.extent > 0.0) {
            return Err(TerrainError::param("extent", "must be a positive number"));
        }
        if !self.height_scale.is_finite() {
            return Err(TerrainError::param("height_scale", "must be finite"));
        }
        Ok(())
    }

    pub fn noise(&self) -> Perlin2D {
        Perlin2D::new(self.seed, self.frequency, self.persistence, self.octaves)
    }
}

/// CPU-side heightfield ready for upload: positions, normals, triangle indices.
#[derive(Debug, Clone)]
pub struct TerrainMesh {
    grid_size: usize,
    // x, y, z per vertex
    positions: Vec<f32>,
    normals: Vec<f32>,
    indices: Vec<u32>,
    height_bounds: (f32, f32),
}

impl TerrainMesh {
    /// Build the mesh with the Perlin field described by `params`.
    pub fn generate(params: &TerrainParams) -> Result<Self, TerrainError> {
        params.validate()?;
        Self::from_noise(params, &params.noise())
    }

    /// Build the mesh from any noise source; `params`' noise settings are ignored.
    pub fn from_noise<N: NoiseGenerator + ?Sized>(
        params: &TerrainParams,
        noise: &N,
    ) -> Result<Self, TerrainError> {
        params.validate_geometry()?;
        let n = params.grid_size;
        let heights = sample_grid(noise, n);
        let step = params.extent / (n - 1) as f32;
        let half = params.extent * 0.5;

        let mut positions = Vec::with_capacity(n * n * 3);
        for (iz, row) in heights.iter().enumerate() {
            for (ix, &h) in row.iter().enumerate() {
                positions.push(ix as f32 * step - half);
                positions.push(h * params.height_scale);
                positions.push(iz as f32 * step - half);
            }
        }

        let normals = compute_normals(&heights, params.height_scale, step);
        let indices = grid_indices(n);
        let (lo, hi) = height_range(&flatten2(&heights));
        let (lo, hi) = (lo * params.height_scale, hi * params.height_scale);
        let height_bounds = (lo.min(hi), lo.max(hi));

        log::debug!(
            "generated {}x{} terrain: {} vertices, {} indices, heights {:.3}..{:.3}",
            n,
            n,
            n * n,
            indices.len(),
            height_bounds.0,
            height_bounds.1
        );

        Ok(Self {
            grid_size: n,
            positions,
            normals,
            indices,
            height_bounds,
        })
    }

    pub fn grid_size(&self) -> usize {
        self.grid_size
    }

    pub fn vertex_count(&self) -> usize {
        self.grid_size * self.grid_size
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// World-space (min, max) of the vertical coordinate.
    pub fn height_bounds(&self) -> (f32, f32) {
        self.height_bounds
    }

    pub fn height_at(&self, ix: usize, iz: usize) -> Option<f32> {
        if ix >= self.grid_size || iz >= self.grid_size {
            return None;
        }
        Some(self.positions[(iz * self.grid_size + ix) * 3 + 1])
    }

    /// Heights back as a row-major grid, e.g. for image export.
    pub fn height_map(&self) -> HeightMap2D {
        self.positions
            .chunks_exact(3 * self.grid_size)
            .map(|row| row.iter().skip(1).step_by(3).copied().collect())
            .collect()
    }
}

// Two counter-clockwise (seen from +Y) triangles per cell
fn grid_indices(n: usize) -> Vec<u32> {
    let mut indices = Vec::with_capacity((n - 1) * (n - 1) * 6);
    for z in 0..n - 1 {
        for x in 0..n - 1 {
            let tl = (z * n + x) as u32;
            let tr = tl + 1;
            let bl = tl + n as u32;
            let br = bl + 1;
            indices.extend_from_slice(&[tl, bl, tr, tr, bl, br]);
        }
    }
    indices
}

// Central differences in the interior, one-sided on the border
fn compute_normals(heights: &HeightMap2D, height_scale: f32, step: f32) -> Vec<f32> {
    let n = heights.len();
    let mut normals = Vec::with_capacity(n * n * 3);
    for z in 0..n {
        for x in 0..n {
            let (x0, x1) = (x.saturating_sub(1), (x + 1).min(n - 1));
            let (z0, z1) = (z.saturating_sub(1), (z + 1).min(n - 1));
            let dhdx = (heights[z][x1] - heights[z][x0]) * height_scale / ((x1 - x0) as f32 * step);
            let dhdz = (heights[z1][x] - heights[z0][x]) * height_scale / ((z1 - z0) as f32 * step);
            let normal = glam::Vec3::new(-dhdx, 1.0, -dhdz).normalize();
            normals.extend_from_slice(&normal.to_array());
        }
    }
    normals
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Flat(f64);

    impl NoiseGenerator for Flat {
        fn get2(&self, _x: f64, _y: f64) -> f64 {
            self.0
        }
    }

    // Height rises along +x only
    struct SlopeX;

    impl NoiseGenerator for SlopeX {
        fn get2(&self, x: f64, _y: f64) -> f64 {
            x
        }
    }

    fn small(grid_size: usize) -> TerrainParams {
        TerrainParams {
            grid_size,
            ..TerrainParams::default()
        }
    }

    #[test]
    fn mesh_counts() {
        let mesh = TerrainMesh::generate(&small(17)).unwrap();
        assert_eq!(mesh.vertex_count(), 17 * 17);
        assert_eq!(mesh.positions().len(), 17 * 17 * 3);
        assert_eq!(mesh.normals().len(), 17 * 17 * 3);
        assert_eq!(mesh.index_count(), 16 * 16 * 6);
    }

    #[test]
    fn mesh_spans_extent_centered() {
        let params = TerrainParams {
            extent: 4.0,
            ..small(9)
        };
        let mesh = TerrainMesh::from_noise(&params, &Flat(0.0)).unwrap();
        let p = mesh.positions();
        // first vertex is the (-x, -z) corner, last is (+x, +z)
        assert_eq!((p[0], p[2]), (-2.0, -2.0));
        let last = p.len() - 3;
        assert_eq!((p[last], p[last + 2]), (2.0, 2.0));
    }

    #[test]
    fn heights_follow_noise_times_scale() {
        let params = TerrainParams {
            height_scale: 2.0,
            ..small(5)
        };
        let mesh = TerrainMesh::from_noise(&params, &SlopeX).unwrap();
        assert_eq!(mesh.height_at(0, 3), Some(0.0));
        assert_eq!(mesh.height_at(2, 3), Some(1.0));
        assert_eq!(mesh.height_at(4, 0), Some(2.0));
        assert_eq!(mesh.height_at(5, 0), None);
        assert_eq!(mesh.height_bounds(), (0.0, 2.0));
    }

    #[test]
    fn indices_stay_in_range_and_wind_upwards() {
        let mesh = TerrainMesh::from_noise(&small(6), &Flat(0.0)).unwrap();
        let p = mesh.positions();
        let vertex = |i: u32| glam::Vec3::from_slice(&p[i as usize * 3..i as usize * 3 + 3]);
        for tri in mesh.indices().chunks_exact(3) {
            assert!(tri.iter().all(|&i| (i as usize) < mesh.vertex_count()));
            let (a, b, c) = (vertex(tri[0]), vertex(tri[1]), vertex(tri[2]));
            assert!((b - a).cross(c - a).y > 0.0);
        }
    }

    #[test]
    fn normals_are_unit_and_tilt_against_slope() {
        let mesh = TerrainMesh::from_noise(&small(8), &SlopeX).unwrap();
        for n in mesh.normals().chunks_exact(3) {
            let v = glam::Vec3::from_slice(n);
            assert!((v.length() - 1.0).abs() < 1e-5);
            assert!(v.x < 0.0);
            assert!(v.z.abs() < 1e-6);
        }
    }

    #[test]
    fn flat_noise_gives_up_normals() {
        let mesh = TerrainMesh::from_noise(&small(4), &Flat(0.25)).unwrap();
        for n in mesh.normals().chunks_exact(3) {
            assert_eq!(n, &[0.0, 1.0, 0.0]);
        }
    }

    #[test]
    fn generate_is_deterministic() {
        let a = TerrainMesh::generate(&small(33)).unwrap();
        let b = TerrainMesh::generate(&small(33)).unwrap();
        assert_eq!(a.positions(), b.positions());
    }

    #[test]
    fn height_map_round_trips_heights() {
        let mesh = TerrainMesh::from_noise(&small(4), &SlopeX).unwrap();
        let map = mesh.height_map();
        assert_eq!(map.len(), 4);
        assert_eq!(map[2][3], mesh.height_at(3, 2).unwrap());
    }

    #[test]
    fn custom_noise_still_needs_sane_geometry() {
        let params = TerrainParams {
            extent: -1.0,
            ..small(4)
        };
        assert!(TerrainMesh::from_noise(&params, &Flat(0.0)).is_err());
        // noise settings are irrelevant when the heights come from elsewhere
        let params = TerrainParams {
            octaves: 0,
            ..small(4)
        };
        assert!(TerrainMesh::from_noise(&params, &Flat(0.0)).is_ok());
    }

    #[test]
    fn rejects_bad_params() {
        assert!(TerrainMesh::generate(&small(1)).is_err());
        let bad = [
            TerrainParams { extent: 0.0, ..small(8) },
            TerrainParams { frequency: -1.0, ..small(8) },
            TerrainParams { persistence: 1.5, ..small(8) },
            TerrainParams { octaves: 0, ..small(8) },
            TerrainParams { height_scale: f32::NAN, ..small(8) },
            TerrainParams { grid_size: 40_000, ..small(8) },
            TerrainParams { grid_size: MAX_GRID_SIZE + 1, ..small(8) },
        ];
        for params in &bad {
            assert!(params.validate().is_err(), "{params:?} should be rejected");
        }
        assert!(TerrainParams::default().validate().is_ok());
        assert!(small(MAX_GRID_SIZE).validate().is_ok());
    }

    #[test]
    fn params_deserialize_with_defaults() {
        let params: TerrainParams = serde_json::from_str(r#"{ "seed": 7, "octaves": 3 }"#).unwrap();
        assert_eq!(params.seed, 7);
        assert_eq!(params.octaves, 3);
        assert_eq!(params.grid_size, TerrainParams::default().grid_size);
    }
}
