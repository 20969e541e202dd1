use std::collections::HashSet;

use crate::models::{Branch, NearbyBranch};

/// Check if a branch offers the requested service
#[inline]
pub fn provides_service(branch: &Branch, service_id: i64) -> bool {
    branch.provided_services.iter().any(|service| service.id == service_id)
}

/// Accumulates service-matching branches across repeated nearest-k scans
///
/// Later scans revisit branches already seen; each branch id is counted once,
/// keeping the distance from its first sighting.
#[derive(Debug)]
pub struct ServiceMatches {
    service_id: i64,
    seen: HashSet<i64>,
    matches: Vec<NearbyBranch>,
}

impl ServiceMatches {
    pub fn new(service_id: i64) -> Self {
        Self {
            service_id,
            seen: HashSet::new(),
            matches: Vec::new(),
        }
    }

    /// Record a scanned branch. Returns true if it was a new match.
    pub fn offer(&mut self, candidate: NearbyBranch) -> bool {
        if !self.seen.insert(candidate.branch.id) {
            return false;
        }
        if !provides_service(&candidate.branch, self.service_id) {
            return false;
        }
        self.matches.push(candidate);
        true
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Matches sorted ascending by distance, at most `limit` of them
    pub fn into_nearest(mut self, limit: usize) -> Vec<NearbyBranch> {
        self.matches.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        self.matches.truncate(limit);
        self.matches
    }
}
