use criterion::{black_box, criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use hyprsession::store::SnapshotStore;
use std::fs::{self, File};
use std::path::Path;
use std::time::{Duration, UNIX_EPOCH};
use tempfile::TempDir;

/// Fills a store directory with `count` records plus some unrelated files.
fn populate(dir: &Path, count: u64) -> std::io::Result<()> {
    for i in 0..count {
        let path = dir.join(format!("session-20240101-{:06}", i));
        fs::write(&path, "/usr/share/applications/firefox.desktop\n")?;
        File::options()
            .write(true)
            .open(&path)?
            .set_modified(UNIX_EPOCH + Duration::from_secs(1_000 + i))?;
    }

    for i in 0..10 {
        fs::write(dir.join(format!("notes-{i}.txt")), "x")?;
    }
    Ok(())
}

fn bench_list_steady_state(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    populate(tmp.path(), 5).unwrap();
    let store = SnapshotStore::new(tmp.path(), 5);

    c.bench_function("list_at_cap", |b| {
        b.iter(|| black_box(store.list().unwrap()))
    });
}

fn bench_list_with_eviction(c: &mut Criterion) {
    let mut group = c.benchmark_group("list_with_eviction");

    for count in [10u64, 100, 1_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || {
                    let tmp = TempDir::new().unwrap();
                    populate(tmp.path(), count).unwrap();
                    tmp
                },
                |tmp| {
                    let store = SnapshotStore::new(tmp.path(), 5);
                    black_box(store.list().unwrap());
                    tmp
                },
                BatchSize::PerIteration,
            )
        });
    }

    group.finish();
}

fn bench_create(c: &mut Criterion) {
    let tmp = TempDir::new().unwrap();
    let store = SnapshotStore::new(tmp.path(), 5);
    let entries: Vec<String> = (0..20)
        .map(|i| format!("/usr/share/applications/app-{i}.desktop"))
        .collect();

    c.bench_function("create_twenty_entries", |b| {
        b.iter(|| black_box(store.create(&entries).unwrap()))
    });
}

criterion_group!(benches, bench_list_steady_state, bench_list_with_eviction, bench_create);
criterion_main!(benches);
