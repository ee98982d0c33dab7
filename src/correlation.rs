//! Correlation map between primary-store identifiers and AI-facing correlation ids.
//!
//! Filled 1:1 while the structure is created and read-only afterwards. Lookups in both
//! directions; a correlation id that is not in the map is a reconciliation miss.

use crate::types::{CorrelationId, PrimaryId};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorrelationConflict {
    DuplicateCorrelation(CorrelationId),
    DuplicatePrimary(PrimaryId),
}

impl std::fmt::Display for CorrelationConflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CorrelationConflict::DuplicateCorrelation(id) => {
                write!(f, "correlation id '{}' already mapped", id)
            }
            CorrelationConflict::DuplicatePrimary(id) => {
                write!(f, "primary id {} already mapped", id)
            }
        }
    }
}

impl std::error::Error for CorrelationConflict {}

#[derive(Debug, Clone, Default)]
pub struct CorrelationMap {
    by_correlation: HashMap<CorrelationId, PrimaryId>,
    by_primary: HashMap<PrimaryId, CorrelationId>,
}

impl CorrelationMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a pair. Rejects anything that would break injectivity.
    pub fn insert(
        &mut self,
        correlation_id: CorrelationId,
        primary_id: PrimaryId,
    ) -> Result<(), CorrelationConflict> {
        if self.by_correlation.contains_key(&correlation_id) {
            return Err(CorrelationConflict::DuplicateCorrelation(correlation_id));
        }
        if self.by_primary.contains_key(&primary_id) {
            return Err(CorrelationConflict::DuplicatePrimary(primary_id));
        }
        self.by_primary.insert(primary_id, correlation_id.clone());
        self.by_correlation.insert(correlation_id, primary_id);
        Ok(())
    }

    pub fn resolve(&self, correlation_id: &CorrelationId) -> Option<PrimaryId> {
        self.by_correlation.get(correlation_id).copied()
    }

    pub fn correlation_for(&self, primary_id: PrimaryId) -> Option<&CorrelationId> {
        self.by_primary.get(&primary_id)
    }

    pub fn len(&self) -> usize {
        self.by_correlation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_correlation.is_empty()
    }

    pub fn primary_ids(&self) -> impl Iterator<Item = PrimaryId> + '_ {
        self.by_primary.keys().copied()
    }
}
