use std::path::Path;

use terrain_core::{TerrainMesh, TerrainParams, utils::save_terrain_png};

fn main() -> Result<(), terrain_core::TerrainError> {
    // Generate a 257×257 demo terrain with seed 2025
    let params = TerrainParams {
        grid_size: 257,
        ..TerrainParams::default()
    };
    let mesh = TerrainMesh::generate(&params)?;
    let (lo, hi) = mesh.height_bounds();
    println!(
        "{} vertices, {} triangles, heights {:.3}..{:.3}",
        mesh.vertex_count(),
        mesh.index_count() / 3,
        lo,
        hi
    );

    let path = Path::new("terrain_heightmap.png");
    save_terrain_png(&mesh.height_map(), path)?;
    println!("Saved height map image to {:?}", path);
    Ok(())
}
