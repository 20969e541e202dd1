// Core algorithm exports
pub mod booking;
pub mod catalog;
pub mod distance;
pub mod error;
pub mod filters;
pub mod queue;
pub mod scoring;
pub mod selector;

pub use booking::BookingPolicy;
pub use catalog::BranchCatalog;
pub use distance::{haversine_distance, is_within_bounding_box, EARTH_RADIUS_KM};
pub use error::EngineError;
pub use filters::{provides_service, ServiceMatches};
pub use queue::QueueManager;
pub use scoring::{calculate_branch_score, rank_candidates};
pub use selector::{BranchSelector, SearchLimits};
