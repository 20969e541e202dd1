// Unit tests for the branch locator core

use std::sync::Arc;

use branch_locator::core::{
    distance::{haversine_distance, is_within_bounding_box},
    filters::{provides_service, ServiceMatches},
    scoring::{calculate_branch_score, rank_candidates},
    BranchCatalog, EngineError,
};
use branch_locator::models::{
    BoundingBox, Branch, BranchRecord, BranchType, NearbyBranch, ScoringWeights, ServiceInfo,
};

fn create_record(id: i64, load_rate: f64, rating: f64, services: &[i64]) -> BranchRecord {
    BranchRecord {
        id,
        name: format!("Office {}", id),
        post_index: "101000".to_string(),
        address: format!("Tverskaya {}", id),
        latitude: 55.7558,
        longitude: 37.6173,
        load_rate,
        rating,
        services: services
            .iter()
            .map(|&service_id| ServiceInfo { id: service_id, name: format!("Service {}", service_id) })
            .collect(),
    }
}

fn nearby(record: BranchRecord, distance: f64) -> NearbyBranch {
    NearbyBranch {
        branch: Arc::new(Branch::from_record(record)),
        distance,
    }
}

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(55.7558, 37.6173, 55.7558, 37.6173);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_moscow_to_saint_petersburg() {
    // Roughly 634 km great-circle
    let distance = haversine_distance(55.7558, 37.6173, 59.9343, 30.3351);
    assert!(distance > 600.0 && distance < 660.0);
}

#[test]
fn test_bounding_box_contains_center() {
    let bbox = BoundingBox {
        min_lat: 55.66,
        max_lat: 55.85,
        min_lon: 37.46,
        max_lon: 37.78,
    };

    assert!(is_within_bounding_box(55.7558, 37.6173, &bbox));
    assert!(!is_within_bounding_box(59.9343, 30.3351, &bbox));
}

#[test]
fn test_worked_example_ranking() {
    // A: 1 km, load 0.2, rating 5.0 -> 0.55 * 0.25 + 0.07 + 0.10 = 0.3075
    // B: 4 km, load 0.1, rating 4.0 -> 0.55 + 0.035 + 0.125 = 0.71
    let candidates = vec![
        nearby(create_record(1, 0.2, 5.0, &[]), 1.0),
        nearby(create_record(2, 0.1, 4.0, &[]), 4.0),
    ];

    let ranked = rank_candidates(candidates, &ScoringWeights::default()).unwrap();

    assert_eq!(ranked[0].branch.id, 1);
    assert!((ranked[0].score - 0.3075).abs() < 1e-9);
    assert!((ranked[1].score - 0.71).abs() < 1e-9);
}

#[test]
fn test_two_branch_scores() {
    // A: 0.55 * 0.5 + 0.035 + 0.10 = 0.41
    // B: 0.55 + 0.175 + 0.125 = 0.85
    let candidates = vec![
        nearby(create_record(2, 0.5, 4.0, &[]), 4.0),
        nearby(create_record(1, 0.1, 5.0, &[]), 2.0),
    ];

    let ranked = rank_candidates(candidates, &ScoringWeights::default()).unwrap();

    assert_eq!(ranked.len(), 2);
    assert_eq!(ranked[0].branch.id, 1);
    assert!((ranked[0].score - 0.41).abs() < 1e-9);
    assert!((ranked[1].score - 0.85).abs() < 1e-9);
}

#[test]
fn test_equal_scores_keep_arrival_order() {
    let candidates = vec![
        nearby(create_record(9, 0.3, 5.0, &[]), 2.0),
        nearby(create_record(4, 0.3, 5.0, &[]), 2.0),
    ];

    let ranked = rank_candidates(candidates, &ScoringWeights::default()).unwrap();
    let ids: Vec<i64> = ranked.iter().map(|c| c.branch.id).collect();

    assert_eq!(ids, vec![9, 4]);
}

#[test]
fn test_all_candidates_at_origin() {
    let candidates = vec![
        nearby(create_record(1, 0.4, 5.0, &[]), 0.0),
        nearby(create_record(2, 0.2, 5.0, &[]), 0.0),
    ];

    let ranked = rank_candidates(candidates, &ScoringWeights::default()).unwrap();

    assert_eq!(ranked[0].branch.id, 2);
    assert!((ranked[0].score - (0.2 * 0.35 + 0.10)).abs() < 1e-9);
}

#[test]
fn test_unscorable_rating_is_data_integrity_error() {
    // from_record repairs the rating, so build the bad value directly
    let mut branch = Branch::from_record(create_record(7, 0.1, 5.0, &[]));
    branch.rating = 0.0;

    let result = calculate_branch_score(&branch, 1.0, 2.0, &ScoringWeights::default());
    assert!(matches!(result, Err(EngineError::DataIntegrity(_))));
}

#[test]
fn test_zero_rating_replaced_on_ingestion() {
    let branch = Branch::from_record(create_record(3, 0.3, 0.0, &[]));
    assert_eq!(branch.rating, 1.0);

    let score = calculate_branch_score(&branch, 1.0, 1.0, &ScoringWeights::default()).unwrap();
    assert!(score.is_finite());
}

#[test]
fn test_provides_service() {
    let branch = Branch::from_record(create_record(4, 0.1, 4.5, &[1, 3]));

    assert!(provides_service(&branch, 3));
    assert!(!provides_service(&branch, 2));
}

#[test]
fn test_service_matches_dedupe_and_order() {
    let mut matches = ServiceMatches::new(3);

    assert!(matches.offer(nearby(create_record(1, 0.1, 5.0, &[3]), 2.0)));
    assert!(!matches.offer(nearby(create_record(1, 0.1, 5.0, &[3]), 2.0)));
    assert!(!matches.offer(nearby(create_record(2, 0.1, 5.0, &[1]), 0.5)));
    assert!(matches.offer(nearby(create_record(5, 0.1, 5.0, &[3]), 1.0)));

    let nearest = matches.into_nearest(5);
    let ids: Vec<i64> = nearest.iter().map(|n| n.branch.id).collect();
    assert_eq!(ids, vec![5, 1]);
}

#[test]
fn test_catalog_rejects_duplicate_ids() {
    let result = BranchCatalog::from_records(
        BranchType::Office,
        vec![create_record(1, 0.1, 5.0, &[]), create_record(1, 0.2, 4.0, &[])],
    );

    assert!(matches!(result, Err(EngineError::DataIntegrity(_))));
}

#[test]
fn test_catalog_find_unknown_branch() {
    let catalog = BranchCatalog::from_records(BranchType::Office, vec![create_record(1, 0.1, 5.0, &[])]).unwrap();

    assert!(catalog.find(1).is_ok());
    assert!(matches!(catalog.find(2), Err(EngineError::BranchNotFound(2))));
}
