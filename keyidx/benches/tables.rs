use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use keyidx::{BinarySearchTable, ChdTable, HashMapTable};

pub fn get(c: &mut Criterion) {
    let keys: Vec<String> = (0..2048).map(|i| format!("key-{}", i)).collect();
    let chd = ChdTable::try_new(&keys).unwrap();
    let map = HashMapTable::new(&keys);
    let sorted = BinarySearchTable::new(&keys);
    let mut group = c.benchmark_group("get");
    for key_nr in [2usize, 1032, 2040] {
        group.bench_with_input(BenchmarkId::new("chd", key_nr), &keys[key_nr], |b, key| {
            b.iter(|| chd.get(key))
        });
        group.bench_with_input(BenchmarkId::new("hash_map", key_nr), &keys[key_nr], |b, key| {
            b.iter(|| map.get(key))
        });
        group.bench_with_input(BenchmarkId::new("binary_search", key_nr), &keys[key_nr], |b, key| {
            b.iter(|| sorted.get(key))
        });
    }
    group.finish();
}

criterion_group!(tables, get);
criterion_main!(tables);
