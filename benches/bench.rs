// Criterion benchmarks for the branch locator

use std::sync::Arc;

use branch_locator::core::{
    distance::haversine_distance,
    scoring::rank_candidates,
    BranchCatalog, BranchSelector,
};
use branch_locator::models::{Branch, BranchRecord, BranchType, NearbyBranch, ScoringWeights, ServiceInfo};
use branch_locator::services::{GeoStore, InMemoryGeoStore};
use criterion::{black_box, criterion_group, criterion_main, Criterion, BenchmarkId};

const ORIGIN_LAT: f64 = 55.7558;
const ORIGIN_LON: f64 = 37.6173;

fn create_office(id: usize) -> BranchRecord {
    let lat_offset = (id as f64 * 0.001) % 0.5;
    let lon_offset = (id as f64 * 0.0007) % 0.5;

    BranchRecord {
        id: id as i64,
        name: format!("Office {}", id),
        post_index: "101000".to_string(),
        address: format!("Street {}", id),
        latitude: ORIGIN_LAT + lat_offset,
        longitude: ORIGIN_LON + lon_offset,
        load_rate: (id % 10) as f64 / 10.0,
        rating: 1.0 + (id % 5) as f64,
        // Every seventh office offers the rare service
        services: if id % 7 == 0 {
            vec![ServiceInfo { id: 7, name: "Safe deposit".to_string() }]
        } else {
            vec![ServiceInfo { id: 1, name: "Cash".to_string() }]
        },
    }
}

fn bench_haversine_distance(c: &mut Criterion) {
    c.bench_function("haversine_distance", |b| {
        b.iter(|| {
            haversine_distance(
                black_box(ORIGIN_LAT),
                black_box(ORIGIN_LON),
                black_box(55.76),
                black_box(37.64),
            )
        });
    });
}

fn bench_ranking(c: &mut Criterion) {
    let weights = ScoringWeights::default();

    let mut group = c.benchmark_group("ranking");

    for candidate_count in [5, 10, 50, 100].iter() {
        let candidates: Vec<NearbyBranch> = (0..*candidate_count)
            .map(|i| {
                let record = create_office(i);
                let distance = haversine_distance(ORIGIN_LAT, ORIGIN_LON, record.latitude, record.longitude);
                NearbyBranch {
                    branch: Arc::new(Branch::from_record(record)),
                    distance,
                }
            })
            .collect();

        group.bench_with_input(
            BenchmarkId::new("rank_candidates", candidate_count),
            candidate_count,
            |b, _| {
                b.iter(|| rank_candidates(black_box(candidates.clone()), black_box(&weights)));
            },
        );
    }

    group.finish();
}

fn bench_selector(c: &mut Criterion) {
    let store: Arc<dyn GeoStore> = Arc::new(
        InMemoryGeoStore::new().with_branches(BranchType::Office, (0..1000).map(create_office)),
    );
    let catalog = match tokio_test::block_on(BranchCatalog::load(store.as_ref(), BranchType::Office)) {
        Ok(catalog) => Arc::new(catalog),
        Err(e) => panic!("failed to load bench catalog: {}", e),
    };
    let selector = BranchSelector::with_defaults(catalog, store);

    c.bench_function("best_branch_1000_offices", |b| {
        b.iter(|| {
            tokio_test::block_on(selector.best_branch(black_box(ORIGIN_LON), black_box(ORIGIN_LAT), 5))
        });
    });

    c.bench_function("available_near_branches_rare_service", |b| {
        b.iter(|| {
            tokio_test::block_on(selector.available_near_branches(
                black_box(7),
                black_box(ORIGIN_LON),
                black_box(ORIGIN_LAT),
                5,
            ))
        });
    });
}

criterion_group!(
    benches,
    bench_haversine_distance,
    bench_ranking,
    bench_selector
);

criterion_main!(benches);
