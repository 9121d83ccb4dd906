use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use pagestack_engine::{Cmd, DropTarget, EntityId};
mod common;

fn bench_drop_commits(c: &mut Criterion) {
    let mut group = c.benchmark_group("drop_commit");
    group.sample_size(20);

    let doc = common::generate_document(200, 20);

    // Every fourth page of the first group, dropped into the last group
    let first = doc.item_at(0).unwrap();
    let dragged: Vec<EntityId> = first
        .pages
        .iter()
        .step_by(4)
        .map(|page| EntityId::Page(*page))
        .collect();
    let last_group = doc.len() - 2;

    group.bench_function("pages_into_group", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut d| {
                let effects = d.apply(Cmd::Move {
                    dragged: std::hint::black_box(dragged.clone()),
                    target: DropTarget::into_group(last_group, 3),
                });
                std::hint::black_box(effects)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("pages_to_top_level", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut d| {
                let effects = d.apply(Cmd::Move {
                    dragged: std::hint::black_box(dragged.clone()),
                    target: DropTarget::before(100),
                });
                std::hint::black_box(effects)
            },
            BatchSize::SmallInput,
        );
    });

    let items: Vec<EntityId> = (0..50)
        .filter_map(|i| doc.item_at(i * 3))
        .map(|item| EntityId::Item(item.id))
        .collect();
    group.bench_function("items_reorder", |b| {
        b.iter_batched(
            || doc.clone(),
            |mut d| {
                let effects = d.apply(Cmd::Move {
                    dragged: std::hint::black_box(items.clone()),
                    target: DropTarget::after(doc.len() - 1),
                });
                std::hint::black_box(effects)
            },
            BatchSize::SmallInput,
        );
    });

    group.bench_function("sanitize_clean_tree", |b| {
        let mut d = doc.clone();
        b.iter(|| std::hint::black_box(d.sanitize()));
    });

    group.finish();
}

criterion_group!(benches, bench_drop_commits);
criterion_main!(benches);
