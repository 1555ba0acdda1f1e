use criterion::{Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use terrain_core::{
    NoiseGenerator, OrbitCamera, Perlin2D, Projection, Scene, TerrainMesh, TerrainParams,
    utils::{flatten2, normalize2, sample_grid, to_terrain_image},
};

const SIZE: usize = 257;
const SEED: u64 = 2025;

fn params() -> TerrainParams {
    TerrainParams {
        grid_size: SIZE,
        seed: SEED,
        ..TerrainParams::default()
    }
}

fn bench_perlin_grid(c: &mut Criterion) {
    c.bench_function("Perlin2D sample 257x257 grid", |b| {
        let perlin = Perlin2D::new(SEED, 3.0, 0.5, 5);
        b.iter(|| sample_grid(black_box(&perlin), SIZE))
    });
}

fn bench_perlin_point(c: &mut Criterion) {
    c.bench_function("Perlin2D single sample, 5 octaves", |b| {
        let perlin = Perlin2D::new(SEED, 3.0, 0.5, 5);
        b.iter(|| perlin.get2(black_box(0.37), black_box(0.61)))
    });
}

fn bench_mesh_generation(c: &mut Criterion) {
    c.bench_function("TerrainMesh generate 257x257 (positions + normals + indices)", |b| {
        let p = params();
        b.iter(|| TerrainMesh::generate(black_box(&p)).unwrap())
    });
}

fn bench_heightmap_image(c: &mut Criterion) {
    c.bench_function("height map normalize + flatten + image", |b| {
        let mesh = TerrainMesh::generate(&params()).unwrap();
        b.iter(|| {
            let mut map = mesh.height_map();
            normalize2(&mut map);
            let flat = flatten2(&map);
            to_terrain_image(&flat)
        })
    });
}

fn bench_view_projection(c: &mut Criterion) {
    let mesh = TerrainMesh::generate(&TerrainParams {
        grid_size: 2,
        ..TerrainParams::default()
    })
    .unwrap();
    let mut scene = Scene::new(mesh, OrbitCamera::default(), Projection::default()).unwrap();
    scene.on_surface_created();
    scene.on_surface_changed(1920, 1080).unwrap();

    c.bench_function("camera orbit + view-projection recompute", |b| {
        b.iter(|| {
            scene.camera_mut().orbit(black_box(0.01), 0.0);
            scene.frame().unwrap().view_projection
        })
    });
}

criterion_group!(
    terrain_benchmarks,
    bench_perlin_grid,
    bench_perlin_point,
    bench_mesh_generation,
    bench_heightmap_image,
    bench_view_projection
);
criterion_main!(terrain_benchmarks);
