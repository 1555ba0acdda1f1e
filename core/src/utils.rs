use std::path::Path;

use image::RgbImage;
use palette::{Gradient, LinSrgb};

use crate::NoiseGenerator;
use crate::error::TerrainError;

// Below this spread a map is treated as flat
const FLAT_EPSILON: f32 = 1e-6;

// 2D height map: row‐major Vec<Vec<f32>> of size N×N
// access as `map[z][x]`.
pub type HeightMap2D = Vec<Vec<f32>>;

// Sample `noise` on a size×size grid spanning [0, 1] in both axes
// Corners land exactly on 0 and 1 so neighbouring tiles would share edges
pub fn sample_grid<N: NoiseGenerator + ?Sized>(noise: &N, size: usize) -> HeightMap2D {
    let denom = size.saturating_sub(1).max(1) as f64;
    let mut data = vec![vec![0.0; size]; size];
    for (z, row) in data.iter_mut().enumerate() {
        for (x, cell) in row.iter_mut().enumerate() {
            let nx = x as f64 / denom;
            let nz = z as f64 / denom;
            *cell = noise.get2(nx, nz) as f32;
        }
    }
    data
}

// flatten a 2D height map (row‐major) into a single Vec<f32>
pub fn flatten2(map: &HeightMap2D) -> Vec<f32> {
    map.iter().flat_map(|row| row.iter().cloned()).collect()
}

// (min, max) over every cell; (0, 0) for an empty map
pub fn height_range(flat: &[f32]) -> (f32, f32) {
    if flat.is_empty() {
        return (0.0, 0.0);
    }
    flat.iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)))
}

// Rescale heights into [0, 1]; a flat map becomes all 0.5
pub fn normalize2(map: &mut HeightMap2D) {
    let (min, max) = height_range(&flatten2(map));
    let range = max - min;

    for row in map.iter_mut() {
        for val in row.iter_mut() {
            *val = if range < FLAT_EPSILON {
                0.5
            } else {
                (*val - min) / range
            };
        }
    }
}

fn terrain_gradient() -> Gradient<LinSrgb> {
    Gradient::with_domain(vec![
        (0.00, LinSrgb::new(0.0, 0.0, 0.5)), // deep water
        (0.30, LinSrgb::new(0.0, 0.5, 1.0)), // shallow water
        (0.35, LinSrgb::new(0.8, 0.8, 0.5)), // sand
        (0.55, LinSrgb::new(0.1, 0.6, 0.2)), // grass
        (0.80, LinSrgb::new(0.5, 0.4, 0.3)), // rock
        (1.00, LinSrgb::new(1.0, 1.0, 1.0)), // snow
    ])
}

// Convert a flat, normalized &[f32] into an RGB byte buffer
pub fn to_terrain_image(flat: &[f32]) -> Vec<u8> {
    let gradient = terrain_gradient();
    let mut buf = Vec::with_capacity(flat.len() * 3);
    for &h in flat {
        let col: LinSrgb = gradient.get(h.clamp(0.0, 1.0));
        let rgb = col.into_format::<u8>();
        buf.extend_from_slice(&[rgb.red, rgb.green, rgb.blue]);
    }
    buf
}

// Normalize, colour and write a size×size height map as PNG
pub fn save_terrain_png(map: &HeightMap2D, path: &Path) -> Result<(), TerrainError> {
    let size = map.len();
    if let Some(row) = map.iter().find(|row| row.len() != size) {
        return Err(TerrainError::NotSquare {
            rows: size,
            cols: row.len(),
        });
    }
    let mut normalized = map.clone();
    normalize2(&mut normalized);
    let rgb = to_terrain_image(&flatten2(&normalized));

    // Square was checked above, so the buffer is exactly size*size*3
    let img = RgbImage::from_raw(size as u32, size as u32, rgb).ok_or(TerrainError::NotSquare {
        rows: size,
        cols: size,
    })?;
    img.save(path)?;
    log::info!("wrote {}x{} height map to {}", size, size, path.display());
    Ok(())
}
