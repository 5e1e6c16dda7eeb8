use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use cro_rs::CroConfig;
use cro_rs::models::cro::CroSimulation;
use cro_rs::models::cro::problem::cro_problem_def;
use cro_rs::physics::FieldAccessor;
use cro_rs::physics::locator::{LocatorStrategy, ZoneLocator, find_nearest};

fn column_counts() -> Vec<usize> {
    vec![40, 400, 2000]
}

fn config_with_columns(columns: usize) -> CroConfig {
    let mut config = CroConfig::default();
    config.geometry.columns = columns;
    config.output_sink_path = std::env::temp_dir().join("cro-bench-flux.txt");
    config
}

fn bench_nearest_cell(c: &mut Criterion) {
    let mut group = c.benchmark_group("nearest_cell");
    for &columns in &column_counts() {
        let config = config_with_columns(columns);
        let fields = cro_problem_def(&config).unwrap();
        let zone = config.zones.permeate_a;
        let tree = ZoneLocator::build(&fields, &[zone], LocatorStrategy::RTree).unwrap();
        let queries: Vec<[f64; 3]> = fields
            .cells_in(config.zones.surface)
            .unwrap()
            .iter()
            .map(|&cell| fields.mesh.cells[cell].centroid)
            .collect();

        group.bench_with_input(BenchmarkId::new("linear", columns), &columns, |b, _| {
            b.iter(|| {
                for &q in &queries {
                    std::hint::black_box(find_nearest(&fields, q, zone).unwrap());
                }
            });
        });
        group.bench_with_input(BenchmarkId::new("r_tree", columns), &columns, |b, _| {
            b.iter(|| {
                for &q in &queries {
                    std::hint::black_box(tree.find_nearest(&fields, q, zone).unwrap());
                }
            });
        });
    }
    group.finish();
}

fn bench_iteration(c: &mut Criterion) {
    let mut group = c.benchmark_group("hook_iteration");
    for &columns in &column_counts() {
        for strategy in [LocatorStrategy::LinearScan, LocatorStrategy::RTree] {
            let mut config = config_with_columns(columns);
            config.locator = strategy;
            let fields = cro_problem_def(&config).unwrap();
            let mut sim = CroSimulation::new(config, fields).unwrap();
            sim.initialize().unwrap();

            let id = BenchmarkId::new(format!("{strategy:?}"), columns);
            group.bench_with_input(id, &columns, |b, _| {
                b.iter(|| sim.iterate().unwrap());
            });
        }
    }
    group.finish();
}

criterion_group!(benches, bench_nearest_cell, bench_iteration);
criterion_main!(benches);
