use criterion::{criterion_group, criterion_main, Criterion};
use olp_core::fixtures::*;

fn populated() -> Fixture {
    let fx = Fixture::new();
    for g in 0..10 {
        fx.join(&user(1), &group(g));
        for a in 0..100 {
            let _ = fx.kernel.assign(&group(g), CAN_EAT, Some(&apple(g * 100 + a)));
        }
    }
    for a in 0..1_000 {
        let _ = fx.kernel.assign(&user(a % 50 + 2), CAN_BE_AWESOME, Some(&apple(a)));
    }
    fx
}

fn resolve_benchmarks(c: &mut Criterion) {
    let fx = populated();
    let alice = active(user(1));

    c.bench_function("has_perm_via_group", |b| {
        b.iter(|| fx.kernel.has_perm(&alice, CAN_EAT, Some(&apple(555))))
    });

    c.bench_function("objects_accessible_to", |b| {
        b.iter(|| fx.kernel.objects_accessible_to(&alice, CAN_EAT, None))
    });

    c.bench_function("resolve_cached_name", |b| {
        b.iter(|| fx.kernel.resolver().resolve(CAN_BE_AWESOME))
    });
}

criterion_group!(benches, resolve_benchmarks);
criterion_main!(benches);
