use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dicecycle::verify::dominance::{count_beats, count_beats_sorted};
use dicecycle::{CycleExtension, DiceCatalog, DominanceMatrix, ExtensionConfig, ThresholdSearch};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

/// Pair of random dice ordered so that the first one wins.
fn random_pair(faces: usize, seed: u64) -> (Vec<f64>, Vec<f64>) {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    loop {
        let a: Vec<f64> = (0..faces).map(|_| rng.gen_range(0..100) as f64).collect();
        let b: Vec<f64> = (0..faces).map(|_| rng.gen_range(0..100) as f64).collect();
        if count_beats(&a, &b).dominates() {
            return (a, b);
        }
        if count_beats(&b, &a).dominates() {
            return (b, a);
        }
    }
}

fn bench_insertion(c: &mut Criterion) {
    let (a_small, b_small) = random_pair(6, 42);
    let (a_large, b_large) = random_pair(60, 7);
    let search = ThresholdSearch::default();

    let mut group = c.benchmark_group("insertion_search");

    group.bench_function("comparator_60", |b| {
        b.iter(|| black_box(count_beats(&a_large, &b_large)));
    });

    group.bench_function("comparator_sorted_60", |b| {
        b.iter(|| black_box(count_beats_sorted(&a_large, &b_large)));
    });

    group.bench_function("threshold_6", |b| {
        b.iter(|| black_box(search.insert(&a_small, &b_small).ok()));
    });

    group.bench_function("threshold_60", |b| {
        b.iter(|| black_box(search.insert(&a_large, &b_large).ok()));
    });

    group.finish();
}

fn bench_cycles(c: &mut Criterion) {
    let tuples = DiceCatalog::munoz_perera_tuples(12, 6).expect("tuples");
    let oskar = DiceCatalog::oskar();
    let path = DiceCatalog::munoz_perera_path(6);
    let mp6 = DiceCatalog::munoz_perera(6).expect("dice");

    let mut group = c.benchmark_group("cycles");

    group.bench_function("matrix_mp12x6", |b| {
        b.iter(|| black_box(DominanceMatrix::compute(tuples.dice())));
    });

    group.bench_function("extend_mp6_to_20", |b| {
        let extension = CycleExtension::new(ExtensionConfig {
            max_dice: 20,
            ..ExtensionConfig::default()
        });
        b.iter(|| black_box(extension.execute(&mp6, &path).expect("extend")));
    });

    group.bench_function("search_oskar", |b| {
        b.iter(|| {
            black_box(dicecycle::search_cycles(
                &oskar,
                dicecycle::Orientation::Beats,
                None,
            ))
        });
    });

    group.finish();
}

criterion_group!(benches, bench_insertion, bench_cycles);
criterion_main!(benches);
