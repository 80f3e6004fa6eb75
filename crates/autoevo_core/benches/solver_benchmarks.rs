use autoevo_core::config::AutoEvoConfig;
use autoevo_core::registry::Registry;
use autoevo_core::snapshot::build_snapshots;
use autoevo_core::solver::GenerationSolver;
use autoevo_data::{BiomeConditions, Patch, Species};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn species() -> Vec<Species> {
    (0..20)
        .map(|i| {
            let base = match i % 4 {
                0 => "chloroplast",
                1 => "chemoplast",
                2 => "rusticyanin",
                _ => "oxytoxisome",
            };
            Species::new(i, format!("Species {i}"), "single")
                .with_organelles([base, "cytoplasm"])
                .with_organelles(std::iter::repeat("flagellum").take((i % 3) as usize))
                .with_behaviour(f64::from(i * 20), 100.0)
        })
        .collect()
}

fn patches(species: &[Species]) -> Vec<Patch> {
    (0..64)
        .map(|p| {
            let biome = BiomeConditions::default()
                .with_dissolved("sunlight", 100.0 + f64::from(p))
                .with_cloud("hydrogensulfide", 0.5, 2000.0)
                .with_cloud("iron", 0.2, 1000.0);
            species.iter().fold(Patch::new(p, format!("Patch {p}"), biome), |patch, s| {
                patch.with_population(s.id, 1000 + i64::from(p + s.id))
            })
        })
        .collect()
}

fn bench_generation_solve(c: &mut Criterion) {
    let registry = Registry::standard().unwrap();
    let config = AutoEvoConfig::default();
    let species = species();
    let snapshots = build_snapshots(&species, &registry, &config).unwrap();
    let patches = patches(&species);

    c.bench_function("solve_64_patches_20_species", |b| {
        b.iter(|| {
            let outcome = GenerationSolver::new(&registry, &config)
                .solve(black_box(&patches), &snapshots)
                .unwrap();
            black_box(outcome.species.len())
        })
    });
}

criterion_group!(benches, bench_generation_solve);
criterion_main!(benches);
