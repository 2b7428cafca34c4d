use chrono::{Duration, Utc};
use common::{DriverId, HubId, OrderKey};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{RouteHints, Shipment, plan_segments};

fn route(legs: usize) -> Vec<HubId> {
    (0..=legs).map(|i| HubId::new(format!("HUB-{i}"))).collect()
}

fn create(route: &[HubId], hints: &RouteHints) -> Shipment {
    let segments = plan_segments(route, hints).unwrap();
    Shipment::create(
        OrderKey::from("ORD-BENCH"),
        route[0].clone(),
        route[route.len() - 1].clone(),
        segments,
        None,
        Utc::now(),
    )
    .unwrap()
}

fn bench_create_shipment(c: &mut Criterion) {
    let route = route(3);
    let hints = RouteHints::parse(
        r#"[{"distanceM": 1000, "durationMin": 10}, {"distanceM": 2000, "durationMin": 20}, {"distanceM": 3000, "durationMin": 30}]"#,
    );

    c.bench_function("domain/create_shipment", |b| {
        b.iter(|| create(&route, &hints));
    });
}

fn bench_full_lifecycle(c: &mut Criterion) {
    let mut group = c.benchmark_group("domain/full_lifecycle");

    for legs in [1, 5, 20] {
        let route = route(legs);
        group.bench_with_input(BenchmarkId::from_parameter(legs), &legs, |b, &legs| {
            b.iter(|| {
                let mut shipment = create(&route, &RouteHints::none());
                let start = Utc::now();
                for index in 0..legs {
                    let at = start + Duration::minutes(index as i64 * 10);
                    shipment
                        .assign_segment_driver(index, DriverId::from("drv-bench"), at)
                        .unwrap();
                    shipment.depart_segment(index, at).unwrap();
                    shipment
                        .arrive_segment(index, at + Duration::minutes(5))
                        .unwrap();
                }
                shipment
            });
        });
    }

    group.finish();
}

fn bench_parse_route_hints(c: &mut Criterion) {
    let raw = serde_json_array(50);
    c.bench_function("domain/parse_route_hints_50", |b| {
        b.iter(|| RouteHints::parse(&raw));
    });
}

fn serde_json_array(legs: usize) -> String {
    let entries: Vec<String> = (0..legs)
        .map(|i| format!(r#"{{"distanceM": {}, "durationMin": {}}}"#, i * 100, i))
        .collect();
    format!("[{}]", entries.join(","))
}

criterion_group!(
    benches,
    bench_create_shipment,
    bench_full_lifecycle,
    bench_parse_route_hints
);
criterion_main!(benches);
