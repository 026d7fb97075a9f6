//! Selection and assignment benchmarks for skirmish_core.
//!
//! Run with: `cargo bench -p skirmish_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use skirmish_core::config::AiConfig;
use skirmish_core::oracle::NoPlanner;
use skirmish_core::rating::{self, CombatUnitCriteria, PowerPlantCriteria};
use skirmish_core::registry::UnitTypeRegistry;
use skirmish_core::task::{BuildType, Priority, TaskContext, TaskRequest, TaskStore};
use skirmish_core::unit_kind::{TargetType, TargetTypeValues};
use skirmish_test_utils::doubles::FakeWorld;
use skirmish_test_utils::fixtures::{controller, pos, tree, unit, ARM};

/// Rating a whole category of candidates.
pub fn rating_benchmark(c: &mut Criterion) {
    let registry = UnitTypeRegistry::new(tree());
    let constants = AiConfig::default().rating;
    let power = PowerPlantCriteria {
        cost: 1.0,
        build_time: 0.5,
        power: 2.0,
    };
    let combat = CombatUnitCriteria {
        cost: 1.0,
        range: 0.5,
        speed: 0.5,
        power: 2.0,
        efficiency: 1.0,
        factory_utilization: 1.0,
    };
    let weights = TargetTypeValues::from_array([1.0, 0.1, 0.0, 0.0, 0.0]);
    let busy = vec![1.0; registry.tree().factory_count()];

    c.bench_function("select_power_plant", |b| {
        b.iter(|| rating::select_power_plant(&registry, ARM, black_box(&power), false, true));
    });

    let mut rng = ChaCha8Rng::seed_from_u64(0);
    c.bench_function("select_combat_unit", |b| {
        b.iter(|| {
            rating::select_combat_unit(
                &registry,
                ARM,
                TargetType::Surface,
                &weights,
                black_box(&combat),
                &busy,
                4,
                &constants,
                &mut rng,
            )
        });
    });
}

/// One worker choosing among many open tasks.
pub fn assignment_benchmark(c: &mut Criterion) {
    let config = AiConfig::default();
    let base_controller = controller(&config);
    let solar = unit("solar");
    let commander = unit("commander");

    c.bench_function("assign_among_64_tasks", |b| {
        b.iter_batched(
            || {
                let mut world = FakeWorld::new(4096);
                let mut controller = base_controller.clone();
                let mut store = TaskStore::new();
                let worker = world.spawn(1, commander, 2048, 2048);
                store.add_worker(worker, commander, 0);
                let mut ctx = TaskContext {
                    host: &mut world,
                    controller: &mut controller,
                    config: &config,
                    tick: 0,
                };
                for i in 0..64 {
                    store.enqueue_task(
                        TaskRequest::Build {
                            priority: Priority::Normal,
                            build_type: BuildType::Energy,
                            unit_type: solar,
                            position: pos(1800 + (i % 8) * 64, 1800 + (i / 8) * 64),
                        },
                        &mut ctx,
                    );
                }
                (world, controller, store, worker)
            },
            |(mut world, mut controller, mut store, worker)| {
                let mut ctx = TaskContext {
                    host: &mut world,
                    controller: &mut controller,
                    config: &config,
                    tick: 1,
                };
                black_box(store.assign_task(worker, &mut ctx, &mut NoPlanner))
            },
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, rating_benchmark, assignment_benchmark);
criterion_main!(benches);
