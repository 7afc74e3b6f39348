use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use snatch_core::{build_sandbox_app, run_frame, MatchConfig};

fn bench_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("frame");

    for hosts in [16u32, 64, 256] {
        group.bench_with_input(BenchmarkId::new("hosts", hosts), &hosts, |b, &hosts| {
            b.iter_batched(
                || {
                    let mut config = MatchConfig::builtin();
                    config.seed = 7;
                    config.spawn.host_count = hosts;
                    config.arena.points_per_zone = hosts / 2;
                    let mut app = build_sandbox_app(config);
                    run_frame(&mut app);
                    app
                },
                |mut app| {
                    for _ in 0..10 {
                        run_frame(&mut app);
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

criterion_group!(frame_benches, bench_frame);
criterion_main!(frame_benches);
