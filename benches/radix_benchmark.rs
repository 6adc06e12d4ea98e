use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use xsort_rs::radix;
use xsort_rs::record::{KEY_SIZE, Key, RECORD_SIZE, Record};

fn generate_keys(n: usize) -> Vec<Key> {
    let mut state = 0x2545F4914F6CDD1Du64;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let mut k = [0u8; KEY_SIZE];
            k[..8].copy_from_slice(&state.to_be_bytes());
            Key(k)
        })
        .collect()
}

fn generate_records(n: usize) -> Vec<Record> {
    generate_keys(n)
        .into_iter()
        .map(|k| {
            let mut data = [0u8; RECORD_SIZE];
            data[..KEY_SIZE].copy_from_slice(&k.0);
            Record(data)
        })
        .collect()
}

fn bench_sort_keys(c: &mut Criterion) {
    let mut group = c.benchmark_group("radix_sort_keys");
    for n in [100_000, 1_000_000] {
        let input = generate_keys(n);
        for threads in [1, 4] {
            group.bench_with_input(
                BenchmarkId::new(format!("{}_threads", threads), n),
                &input,
                |b, input| {
                    b.iter(|| {
                        let mut keys = input.clone();
                        radix::sort(black_box(&mut keys), 0, threads);
                        keys
                    })
                },
            );
        }
    }
    group.finish();
}

fn bench_sort_records(c: &mut Criterion) {
    let mut group = c.benchmark_group("radix_sort_records");
    group.sample_size(20);
    let input = generate_records(200_000);
    for threads in [1, 4] {
        group.bench_with_input(
            BenchmarkId::new(format!("{}_threads", threads), input.len()),
            &input,
            |b, input| {
                b.iter(|| {
                    let mut records = input.clone();
                    radix::sort(black_box(&mut records), 0, threads);
                    records
                })
            },
        );
    }
    group.finish();
}

fn bench_comparison_baseline(c: &mut Criterion) {
    let input = generate_records(200_000);
    c.bench_function("std_sort_unstable_records", |b| {
        b.iter(|| {
            let mut records = input.clone();
            records.sort_unstable();
            records
        })
    });
}

criterion_group!(
    benches,
    bench_sort_keys,
    bench_sort_records,
    bench_comparison_baseline,
);
criterion_main!(benches);
