use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use strikeframe_animation_core::{DefinitionRegistry, Point};
use strikeframe_orchestrator::{ActorSpec, EngineConfig, NoopCollaborators, Orchestrator};

fn board(registry: &Arc<DefinitionRegistry>, cfg: &EngineConfig) -> Orchestrator {
    Orchestrator::new(Arc::clone(registry), cfg.clone())
        .with_actor("player", ActorSpec::ally(Point::new(100.0, 300.0)))
        .with_actor("enemy", ActorSpec::opponent(Point::new(500.0, 300.0)))
        .with_actor("enemy2", ActorSpec::opponent(Point::new(650.0, 300.0)))
        .with_actor("enemy3", ActorSpec::opponent(Point::new(800.0, 300.0)))
}

fn sequence_benchmark(c: &mut Criterion) {
    let cfg = EngineConfig::default();
    let json = strikeframe_test_fixtures::bundles::json("combat").expect("combat bundle");
    let registry = Arc::new(
        DefinitionRegistry::from_bundle_json(&json, &cfg.animation).expect("parse bundle"),
    );

    for id in ["card.strike", "card.flurry", "card.chakram"] {
        c.bench_function(&format!("run_{id}_at_60hz"), |b| {
            b.iter(|| {
                let mut orch = board(&registry, &cfg);
                let mut sink = NoopCollaborators;
                orch.play_sequence(id, "player", Some("enemy"))
                    .expect("fixture sequence");
                while !orch.is_idle() {
                    black_box(orch.step(16.0, &mut sink).expect("step"));
                }
            })
        });
    }

    // several overlapping cards, as in a combo turn
    c.bench_function("overlapping_sequences_tick", |b| {
        b.iter(|| {
            let mut orch = board(&registry, &cfg);
            let mut sink = NoopCollaborators;
            for id in ["card.chakram", "card.finisher", "card.focus"] {
                orch.play_sequence(id, "player", Some("enemy"))
                    .expect("fixture sequence");
            }
            for _ in 0..60 {
                black_box(orch.step(16.0, &mut sink).expect("step"));
            }
        })
    });
}

criterion_group!(benches, sequence_benchmark);
criterion_main!(benches);
