//! Published template graph.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

use crate::repository::{LegRepository, RepositoryError, StationRegistry};

use super::{GraphStats, TemplateGraph, build_template};

/// Holds the current template graph.
///
/// Searches take an `Arc` snapshot and keep using it even if a rebuild
/// publishes a newer graph meanwhile. Rebuilds are serialised, and a failed
/// rebuild leaves the previous graph in place.
#[derive(Default)]
pub struct GraphStore {
    current: RwLock<Option<Arc<TemplateGraph>>>,
    build_lock: Mutex<()>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The published graph, if one has been built.
    pub async fn snapshot(&self) -> Option<Arc<TemplateGraph>> {
        self.current.read().await.clone()
    }

    /// Version of the published graph, if one has been built.
    pub async fn version(&self) -> Option<u64> {
        self.current.read().await.as_ref().map(|g| g.version())
    }

    /// Build a fresh graph from the repository and publish it.
    ///
    /// On success, replaces the current graph. On failure, the existing
    /// graph is preserved and the error is returned.
    pub async fn rebuild<R>(
        &self,
        repo: &R,
        min_stop_minutes: u32,
        batch_size: usize,
    ) -> Result<GraphStats, RepositoryError>
    where
        R: LegRepository + StationRegistry,
    {
        let _guard = self.build_lock.lock().await;
        let version = self.version().await.map_or(1, |v| v + 1);

        let built = async {
            let hubs = repo.hub_stations().await?;
            build_template(repo, hubs, min_stop_minutes, batch_size, version).await
        }
        .await;

        let graph = match built {
            Ok(graph) => graph,
            Err(e) => {
                warn!(version, error = %e, "Graph rebuild failed, keeping previous graph");
                return Err(e);
            }
        };

        let stats = graph.stats().clone();
        let mut guard = self.current.write().await;
        *guard = Some(Arc::new(graph));
        info!(version, "Published template graph");

        Ok(stats)
    }
}
