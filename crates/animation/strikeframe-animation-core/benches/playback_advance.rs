use std::collections::HashMap;
use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use strikeframe_animation_core::{
    ActorFrame, Config, DefinitionRegistry, InstId, InstanceCfg, PlaybackInstance, Point,
    PoseProvider,
};

struct Field(HashMap<&'static str, ActorFrame>);

impl PoseProvider for Field {
    fn actor_frame(&self, role: &str) -> Option<ActorFrame> {
        self.0.get(role).copied()
    }
}

fn playback_benchmark(c: &mut Criterion) {
    let cfg = Config::default();
    let json = strikeframe_test_fixtures::bundles::json("combat").expect("combat bundle");
    let registry = DefinitionRegistry::from_bundle_json(&json, &cfg).expect("parse bundle");
    let field = Field(HashMap::from([
        ("player", ActorFrame::at_rest(Point::new(100.0, 300.0), 1.0)),
        ("enemy", ActorFrame::at_rest(Point::new(500.0, 300.0), -1.0)),
    ]));

    c.bench_function("parse_combat_bundle", |b| {
        b.iter(|| DefinitionRegistry::from_bundle_json(black_box(&json), &cfg).expect("parse"))
    });

    for id in ["player.dash", "enemy.hit"] {
        let def = registry.animation(id).expect("fixture animation");
        c.bench_function(&format!("play_{id}_at_60hz"), |b| {
            b.iter(|| {
                let mut inst = PlaybackInstance::new(
                    InstId(0),
                    Arc::clone(&def),
                    InstanceCfg::new("player").with_target("enemy"),
                    &cfg,
                );
                while !inst.is_done() {
                    black_box(inst.advance(16.0, &field, &cfg));
                }
            })
        });
    }
}

criterion_group!(benches, playback_benchmark);
criterion_main!(benches);
