//! Frame-throughput benchmarks for the simulation core.
//!
//! Measures full frames at various bot counts against a discarding tracker.
//!
//! Run with: cargo bench --bench frame_bench

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use serpent_arena::config::SimulationConfig;
use serpent_arena::db::BotScript;
use serpent_arena::game::bot::{BotController, BotHandle, ControllerView, LogBuffer, Steering};
use serpent_arena::game::field::Field;
use serpent_arena::net::tracker::NullTracker;

/// Wanders by turning a fixed amount each frame.
struct Wanderer {
    turn: f32,
}

impl BotController for Wanderer {
    fn init(&mut self, _bot: &BotHandle) -> Result<(), String> {
        Ok(())
    }

    fn step(
        &mut self,
        view: &ControllerView<'_>,
        _log: &mut LogBuffer,
    ) -> Result<Steering, String> {
        Ok(Steering {
            target_heading_deg: view.heading() + self.turn,
            boost: false,
        })
    }
}

fn create_field(bot_count: usize) -> Field {
    let config = SimulationConfig {
        field_size_x: 512.0,
        field_size_y: 512.0,
        field_static_food: 2000,
        rng_seed: Some(1),
        ..Default::default()
    };
    let mut field = Field::new(config, Box::new(NullTracker)).unwrap();

    for i in 0..bot_count {
        let script = BotScript {
            database_id: i as i64,
            name: format!("bench-{i}"),
            color: (i % 8) as u32,
            viewer_key: i as u64,
        };
        let turn = if i % 2 == 0 { 3.0 } else { -3.0 };
        field
            .new_bot(script, Box::new(Wanderer { turn }))
            .unwrap();
    }
    field
}

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");
    group.sample_size(30);

    for count in [10, 50, 100] {
        let mut field = create_field(count);

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("full_frame", count), &count, |b, _| {
            b.iter(|| {
                field.frame();
                black_box(field.current_frame())
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_frame);
criterion_main!(benches);
