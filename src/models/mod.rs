// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Branch, BranchRecord, BranchType, BoundingBox, MapMarker, NearBranch, NearbyBranch,
    Reservation, ReservationRecord, ScoredCandidate, ScoringWeights, ServiceCategory, ServiceInfo,
    ServiceSubcategory,
};
pub use requests::{
    AvailableBranchesQuery, BookReservationRequest, BoundingBoxQuery, LocationQuery, NotifyRequest, OriginQuery,
    SlotsQuery,
};
pub use responses::{
    BookReservationResponse, BranchDetailView, BranchView, ErrorResponse, HealthResponse, RankedBranchView,
};
