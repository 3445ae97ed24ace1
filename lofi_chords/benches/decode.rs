// Benchmarks for the generation pipeline.
//
// The corpus is a seeded random walk over major and minor triads on all
// twelve roots, written as pitch-class numbers, so roughly a third of the
// vocabulary fits any diatonic scale.

use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};
use lofi_chords::decode::{self, DecodeStrategy, Session};
use lofi_chords::midi::{MidiSettings, timeline_to_bytes};
use lofi_chords::render::{DurationTable, render};
use lofi_prng::ChordRng;

fn triad_corpus(len: usize) -> Vec<String> {
    let mut rng = ChordRng::new(0xC0FFEE);
    (0..len)
        .map(|_| {
            let root = rng.range_u64(0, 12);
            let third = if rng.next_f64() < 0.5 { 4 } else { 3 };
            format!("{}.{}.{}", root, (root + third) % 12, (root + 7) % 12)
        })
        .collect()
}

fn session(strategy: DecodeStrategy) -> Session {
    Session::builder()
        .corpus(triad_corpus(2_000))
        .transition_predictor()
        .strategy(strategy)
        .max_attempts(Some(100_000))
        .build()
        .expect("benchmark session")
}

fn bench_generate(c: &mut Criterion) {
    let sampled = session(DecodeStrategy::Sampled { temperature: 1.0 });
    c.bench_function("generate_16_sampled", |b| {
        let mut rng = ChordRng::new(1);
        b.iter(|| black_box(decode::generate(&sampled, 16, "c_major_scale", &mut rng)))
    });

    let greedy = session(DecodeStrategy::Greedy);
    c.bench_function("generate_16_greedy", |b| {
        let mut rng = ChordRng::new(2);
        b.iter(|| black_box(decode::generate(&greedy, 16, "g_major_scale", &mut rng)))
    });
}

fn bench_render(c: &mut Criterion) {
    let session = session(DecodeStrategy::Sampled { temperature: 1.0 });
    let chords = decode::generate(&session, 64, "a_minor_scale", &mut ChordRng::new(3))
        .expect("benchmark chords")
        .chords;
    let durations = DurationTable::default();

    c.bench_function("render_and_encode_64", |b| {
        b.iter_batched(
            || ChordRng::new(4),
            |mut rng| {
                let timeline = render(&chords, &durations, &mut rng);
                black_box(timeline_to_bytes(&timeline, &MidiSettings::default()))
            },
            BatchSize::SmallInput,
        )
    });
}

criterion_group!(benches, bench_generate, bench_render);
criterion_main!(benches);
