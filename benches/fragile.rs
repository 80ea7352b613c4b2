use std::collections::HashSet;

use criterion::{criterion_group, criterion_main, Criterion, black_box};

use shatter::engine::Engine;
use shatter::fragile::{
    CollisionScanner, Impact, ProjectileKind, ShatterConfig, StructureResolver, ThicknessAnalyzer,
};
use shatter::math::VoxelBox;
use shatter::voxel::{palette, FragileKind, Grid, MemoryGrid, Voxel, VoxelCoord};

use glam::{IVec3, Vec3};

fn pane_grid(size: i32) -> MemoryGrid {
    let mut grid = MemoryGrid::new();
    grid.fill(0, VoxelBox::new(IVec3::ZERO, IVec3::new(size - 1, size - 1, 0)), Voxel::of(palette::GLASS));
    grid
}

fn bench_thickness(c: &mut Criterion) {
    let config = ShatterConfig::default();
    let registry = config.registry();
    let grid = pane_grid(16);
    let analyzer = ThicknessAnalyzer::new(&registry, &grid);

    c.bench_function("thickness_single_layer", |b| {
        b.iter(|| analyzer.is_single_layer(black_box(VoxelCoord::new(0, 8, 8, 0))));
    });
}

fn bench_flood_fill_64(c: &mut Criterion) {
    let config = ShatterConfig::default();
    let registry = config.registry();
    let grid = pane_grid(32);
    let broken = HashSet::new();
    let resolver = StructureResolver::new(&registry, &grid, &broken);

    c.bench_function("flood_fill_cap_64", |b| {
        b.iter(|| resolver.resolve(black_box(VoxelCoord::new(0, 16, 16, 0)), FragileKind::Glass, 64));
    });
}

fn bench_flood_fill_4096(c: &mut Criterion) {
    let config = ShatterConfig::default();
    let registry = config.registry();
    let grid = pane_grid(64);
    let broken = HashSet::new();
    let resolver = StructureResolver::new(&registry, &grid, &broken);

    c.bench_function("flood_fill_cap_4096", |b| {
        b.iter(|| resolver.resolve(black_box(VoxelCoord::new(0, 32, 32, 0)), FragileKind::Glass, 4096));
    });
}

fn bench_path_scan(c: &mut Criterion) {
    let config = ShatterConfig::default();
    let registry = config.registry();
    let mut grid = MemoryGrid::new();
    grid.set(VoxelCoord::new(0, 9, 0, 0), Voxel::of(palette::GLASS)).unwrap();
    let scanner = CollisionScanner::new(&registry, &grid, &config.path);

    c.bench_function("path_scan_miss", |b| {
        b.iter(|| scanner.path_scan(0, black_box(Vec3::new(0.5, 0.0, 0.5)), black_box(Vec3::new(2.5, 0.0, 0.5))));
    });
    c.bench_function("path_scan_hit", |b| {
        b.iter(|| scanner.path_scan(0, black_box(Vec3::new(8.5, 0.0, 0.5)), black_box(Vec3::new(9.5, 0.0, 0.5))));
    });
}

fn bench_break_and_restore(c: &mut Criterion) {
    c.bench_function("impact_break_then_flush", |b| {
        b.iter_batched(
            || Engine::new(ShatterConfig::default(), pane_grid(8)).unwrap(),
            |mut engine| {
                let impact = Impact {
                    kind: ProjectileKind::WindCharge,
                    actor: Some(1),
                    target: VoxelCoord::new(0, 4, 4, 0),
                };
                engine.on_impact(&impact);
                engine.force_restore_all()
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_thickness,
    bench_flood_fill_64,
    bench_flood_fill_4096,
    bench_path_scan,
    bench_break_and_restore,
);
criterion_main!(benches);
