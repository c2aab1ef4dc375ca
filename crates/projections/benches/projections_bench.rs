use chrono::{Duration, TimeZone, Utc};
use common::UserId;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use projections::{InMemoryProjectionStore, ProjectionStore, UserProjector};
use user_events::{UserChangeEvent, UserPayload, decode};

fn encoded_event(id: i64, minute: i64) -> Vec<u8> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    UserChangeEvent::updated(UserPayload {
        id: UserId::new(id),
        name: format!("user-{id}"),
        email: format!("user-{id}@example.com"),
        updated_at: base + Duration::minutes(minute),
    })
    .encode()
    .unwrap()
}

fn bench_decode(c: &mut Criterion) {
    let bytes = encoded_event(1, 0);

    c.bench_function("projections/decode_event", |b| {
        b.iter(|| decode(&bytes).unwrap());
    });
}

fn bench_handle_single_message(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let projector = UserProjector::new(InMemoryProjectionStore::new());
    let bytes = encoded_event(1, 0);

    // Same event every iteration, so after the first it is an idempotent overwrite.
    c.bench_function("projections/handle_single_message", |b| {
        b.iter(|| rt.block_on(projector.handle_message(&bytes)));
    });
}

fn bench_project_1000_users(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let messages: Vec<Vec<u8>> = (1..=1000).map(|id| encoded_event(id, 0)).collect();

    c.bench_function("projections/project_1000_users", |b| {
        b.iter_batched(
            || UserProjector::new(InMemoryProjectionStore::new()),
            |projector| {
                rt.block_on(async {
                    for message in &messages {
                        projector.handle_message(message).await;
                    }
                    assert_eq!(projector.store().count().await.unwrap(), 1000);
                });
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_stale_rejection(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let projector = UserProjector::new(InMemoryProjectionStore::new());
    rt.block_on(projector.handle_message(&encoded_event(1, 10)));
    let older = encoded_event(1, 0);

    c.bench_function("projections/reject_stale_message", |b| {
        b.iter(|| rt.block_on(projector.handle_message(&older)));
    });
}

criterion_group!(
    benches,
    bench_decode,
    bench_handle_single_message,
    bench_project_1000_users,
    bench_stale_rejection,
);
criterion_main!(benches);
