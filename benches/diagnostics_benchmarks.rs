use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use livesim::circuit::{ComponentInstance, Pin, PinId, SceneItem};
use livesim::engine::{Recording, ReplayEngine};
use livesim::index::SessionIndex;
use livesim::probe::Probe;
use livesim::rules::RuleSet;

/// A ladder of resistors and LEDs, two pins each, chained net to net.
fn ladder(size: u64) -> (Vec<Vec<PinId>>, Vec<ComponentInstance>, Vec<SceneItem>, Recording) {
    let mut nets = vec![Vec::new(); size as usize + 1];
    let mut instances = Vec::new();
    let mut breadboard = Vec::new();
    let mut recording = Recording::default();

    for i in 0..size {
        let (title, part) = if i % 2 == 0 {
            let title = format!("R{}", i);
            let part = ComponentInstance::new(i, &title, "Resistor")
                .with_spice("R{instanceTitle} {net connector0} {net connector1} 220")
                .with_property("power", "0.25", "W");
            recording = recording.with_vector(&format!("@{}[p]", title.to_lowercase()), 0.1);
            (title, part)
        } else {
            let title = format!("LED{}", i);
            let part = ComponentInstance::new(i, &title, "Red LED")
                .with_spice("D{instanceTitle} {net connector0} {net connector1} LED")
                .with_property("current", "20mA", "A");
            recording = recording.with_vector(&format!("@d{}[id]", title.to_lowercase()), 0.01);
            (title, part)
        };

        let a = PinId(i * 2 + 10_000);
        let b = PinId(i * 2 + 10_001);
        nets[i as usize].push(a);
        nets[i as usize + 1].push(b);
        instances.push(part.with_pin(Pin::new(a.0, "pin 1")).with_pin(Pin::new(b.0, "pin 2")));
        breadboard.push(SceneItem::part(i + 1_000_000, &title));
    }

    for net in 1..=size {
        recording = recording.with_vector(&format!("v({})", net), net as f64 * 0.1);
    }
    (nets, instances, breadboard, recording)
}

fn bench_index_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("session_index");

    for size in [10u64, 100, 1000].iter() {
        let (nets, instances, breadboard, _) = ladder(*size);
        group.bench_with_input(BenchmarkId::new("build", size), size, |b, _| {
            b.iter(|| SessionIndex::build(black_box(&nets), black_box(&instances), black_box(&breadboard)));
        });
    }

    group.finish();
}

fn bench_rule_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_pass");
    let rules = RuleSet::default();

    for size in [10u64, 100, 1000].iter() {
        let (nets, instances, breadboard, recording) = ladder(*size);
        let index = SessionIndex::build(&nets, &instances, &breadboard);
        let engine = ReplayEngine::new(recording);

        group.bench_with_input(BenchmarkId::new("diagnose", size), size, |b, _| {
            b.iter(|| {
                let probe = Probe::new(&engine, &index);
                instances
                    .iter()
                    .filter_map(|part| {
                        let kind = index.kind(part.id)?;
                        rules.diagnose(part, kind, &probe).ok()
                    })
                    .filter(|verdict| verdict.has_smoke())
                    .count()
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_index_build, bench_rule_pass);
criterion_main!(benches);
