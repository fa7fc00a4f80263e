//! Search error types.

use crate::domain::{DomainError, StationName, TrainRunId};
use crate::repository::RepositoryError;

/// Error from itinerary search.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Origin or destination is not a known station
    #[error("station not found: {0}")]
    StationNotFound(StationName),

    /// Leg or station lookup failed
    #[error(transparent)]
    Repository(#[from] RepositoryError),

    /// Invalid search request
    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Multi-transfer search needs a template graph
    #[error("transfer graph has not been built")]
    GraphNotBuilt,

    /// A leg recorded during search is missing from the repository
    #[error("no leg of train {run} from {from} to {to}")]
    Reconstruction {
        run: TrainRunId,
        from: StationName,
        to: StationName,
    },

    /// The path engine ran out of node expansions
    #[error("search gave up after {expansions} node expansions")]
    BudgetExhausted { expansions: usize },

    #[error(transparent)]
    Domain(#[from] DomainError),
}
