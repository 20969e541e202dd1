//! Branch Locator - nearest bank branch search and digital queue service
//!
//! This library ranks bank offices and ATMs around a location by distance,
//! load and rating, finds the nearest offices offering a given service, books
//! reservations into free office slots, and keeps a per-office digital queue
//! with a daily reminder task.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;
pub mod tasks;

// Re-export commonly used types
pub use core::{BookingPolicy, BranchCatalog, BranchSelector, EngineError, QueueManager, SearchLimits, distance::haversine_distance};
pub use models::{Branch, BranchType, Reservation, ScoredCandidate, ScoringWeights};
pub use services::{GeoStore, InMemoryGeoStore, Notifier, PostgresGeoStore};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        assert!(haversine_distance(55.7558, 37.6173, 55.7558, 37.6173) < 1e-9);
        assert_eq!(BranchType::Office.as_str(), "office");
        assert_eq!(BookingPolicy::default().slots().len(), 18);
    }
}
