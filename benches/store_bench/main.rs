use content_store::Store;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tempfile::tempdir;

fn bench_store(c: &mut Criterion) {
    let document: String = "lorem ipsum dolor sit amet ".repeat(200);

    c.bench_function("store_single_document", |b| {
        b.iter_batched(
            || Store::open(tempdir().unwrap().into_path(), true).unwrap(),
            |mut store| {
                black_box(store.store(black_box(&document)).unwrap());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_retrieve(c: &mut Criterion) {
    let document: String = "lorem ipsum dolor sit amet ".repeat(200);
    let dir = tempdir().unwrap();
    let mut store = Store::open(dir.path(), true).unwrap();
    let id = store.store(&document).unwrap();

    let mut group = c.benchmark_group("retrieve");
    group.bench_function("whole_document", |b| {
        b.iter(|| black_box(store.retrieve(black_box(id)).unwrap()))
    });
    group.bench_function("small_slice", |b| {
        b.iter(|| {
            black_box(
                store
                    .retrieve_parts(black_box(id), &[100], &[120])
                    .unwrap(),
            )
        })
    });
    group.finish();
}

criterion_group!(benches, bench_store, bench_retrieve);
criterion_main!(benches);
