use std::collections::HashMap;
use std::sync::Arc;

use crate::core::error::EngineError;
use crate::models::{Branch, BranchRecord, BranchType};
use crate::services::GeoStore;

/// Every branch of one type, loaded once from the store
///
/// The catalog is built explicitly at startup and shared by reference.
/// Reloading means building a new catalog; an existing one is never
/// re-initialized in place.
#[derive(Debug)]
pub struct BranchCatalog {
    branch_type: BranchType,
    branches: Vec<Arc<Branch>>,
    index: HashMap<i64, usize>,
}

impl BranchCatalog {
    /// Fetch all branches of `branch_type` and build the in-memory set
    pub async fn load(store: &dyn GeoStore, branch_type: BranchType) -> Result<Self, EngineError> {
        let records = store.branch_records(branch_type).await?;
        let catalog = Self::from_records(branch_type, records)?;

        tracing::info!(
            branch_type = %branch_type,
            branches = catalog.len(),
            "Branch catalog loaded"
        );

        Ok(catalog)
    }

    /// Build a catalog from records. Duplicate ids are a data integrity error.
    pub fn from_records(branch_type: BranchType, records: Vec<BranchRecord>) -> Result<Self, EngineError> {
        let mut branches = Vec::with_capacity(records.len());
        let mut index = HashMap::with_capacity(records.len());

        for record in records {
            if index.insert(record.id, branches.len()).is_some() {
                return Err(EngineError::DataIntegrity(format!(
                    "duplicate {} id {} in store snapshot",
                    branch_type, record.id
                )));
            }
            branches.push(Arc::new(Branch::from_record(record)));
        }

        Ok(Self {
            branch_type,
            branches,
            index,
        })
    }

    /// Look up a branch by id
    pub fn find(&self, id: i64) -> Result<&Arc<Branch>, EngineError> {
        self.index
            .get(&id)
            .map(|&position| &self.branches[position])
            .ok_or(EngineError::BranchNotFound(id))
    }

    /// All branches in store order
    pub fn all(&self) -> &[Arc<Branch>] {
        &self.branches
    }

    pub fn branch_type(&self) -> BranchType {
        self.branch_type
    }

    pub fn len(&self) -> usize {
        self.branches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.branches.is_empty()
    }
}
