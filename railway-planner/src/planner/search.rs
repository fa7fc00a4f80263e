//! Itinerary search strategies.
//!
//! Direct and one-transfer searches work straight off repository queries.
//! Multi-transfer search runs the path engine over the published transfer
//! graph with a per-query overlay, and asks for alternatives by forbidding
//! the lead train of each result in turn.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::domain::{Itinerary, SpeedFilter, StationName, TrainRunId};
use crate::graph::{GraphStats, GraphStore, GraphView, QueryOverlay};
use crate::repository::{LegRepository, StationRegistry};

use super::config::PlannerConfig;
use super::engine::{Criterion, EngineQuery, PathState, cheapest_path};
use super::error::SearchError;
use super::pairing::pair_connections;
use super::rank::{SortMode, cap_per_speed_mix, deduplicate, rank_itineraries};

fn default_max_transfers() -> usize {
    1
}

/// A combined search request.
#[derive(Debug, Clone, Deserialize)]
pub struct JourneyRequest {
    pub from: StationName,
    pub to: StationName,

    #[serde(default)]
    pub speed: SpeedFilter,

    #[serde(default)]
    pub sort: SortMode,

    /// 0 for direct trains only, 1 adds one-change itineraries, 2 or more
    /// also runs the multi-transfer search.
    #[serde(default = "default_max_transfers")]
    pub max_transfers: usize,

    /// Alternatives wanted from the multi-transfer search. Falls back to
    /// the planner's default.
    #[serde(default)]
    pub result_count: Option<usize>,
}

impl JourneyRequest {
    /// Create a request with default filters and one allowed change.
    pub fn new(from: impl Into<StationName>, to: impl Into<StationName>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            speed: SpeedFilter::Any,
            sort: SortMode::default(),
            max_transfers: default_max_transfers(),
            result_count: None,
        }
    }

    pub fn with_speed(mut self, speed: SpeedFilter) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_sort(mut self, sort: SortMode) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_max_transfers(mut self, max_transfers: usize) -> Self {
        self.max_transfers = max_transfers;
        self
    }

    pub fn with_result_count(mut self, result_count: usize) -> Self {
        self.result_count = Some(result_count);
        self
    }
}

/// Railway itinerary planner.
pub struct Planner<R> {
    repo: Arc<R>,
    graphs: GraphStore,
    config: PlannerConfig,
}

impl<R> Planner<R>
where
    R: LegRepository + StationRegistry,
{
    /// Create a planner. No transfer graph is published until
    /// [`Planner::build_graph`] runs.
    pub fn new(repo: Arc<R>, config: PlannerConfig) -> Self {
        Self {
            repo,
            graphs: GraphStore::new(),
            config,
        }
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Rebuild the transfer graph from the repository's hub set.
    ///
    /// A failed build leaves the previously published graph in service.
    pub async fn build_graph(&self) -> Result<GraphStats, SearchError> {
        let stats = self
            .graphs
            .rebuild(
                self.repo.as_ref(),
                self.config.min_stop_minutes,
                self.config.fetch_batch_size,
            )
            .await?;
        Ok(stats)
    }

    /// Version of the published transfer graph, if any.
    pub async fn graph_version(&self) -> Option<u64> {
        self.graphs.version().await
    }

    /// Trains running straight from `from` to `to`, one itinerary per
    /// train label.
    pub async fn search_direct(
        &self,
        from: &StationName,
        to: &StationName,
        speed: SpeedFilter,
        sort: SortMode,
    ) -> Result<Vec<Itinerary>, SearchError> {
        self.check_endpoints(from, to).await?;

        let legs = self.repo.by_station_pair(from, to, speed).await?;
        let mut labels = HashSet::new();
        let mut itineraries = Vec::new();
        for leg in legs {
            if !speed.admits(&leg) || !labels.insert(leg.train_label.clone()) {
                continue;
            }
            itineraries.push(Itinerary::new(vec![leg], self.config.min_stop_minutes)?);
        }

        debug!(%from, %to, found = itineraries.len(), "Direct search");
        Ok(rank_itineraries(itineraries, sort))
    }

    /// Itineraries with exactly one change, at any station.
    ///
    /// Connections tighter than `min_stop_minutes` wait for the next day's
    /// train. Results are capped per speed mix when the config says so.
    pub async fn search_one_transfer(
        &self,
        from: &StationName,
        to: &StationName,
        speed: SpeedFilter,
        sort: SortMode,
        min_stop_minutes: u32,
    ) -> Result<Vec<Itinerary>, SearchError> {
        self.check_endpoints(from, to).await?;

        let (firsts, seconds) = futures::future::try_join(
            self.repo.by_departure_excluding_arrival(from, to),
            self.repo.by_arrival_excluding_departure(to, from),
        )
        .await?;

        let itineraries = pair_connections(&firsts, &seconds, speed, min_stop_minutes, None)?;
        debug!(
            %from,
            %to,
            first_legs = firsts.len(),
            second_legs = seconds.len(),
            found = itineraries.len(),
            "One-transfer search"
        );

        Ok(self.capped(rank_itineraries(itineraries, sort)))
    }

    /// One-change itineraries that change trains at `via`.
    pub async fn search_via(
        &self,
        from: &StationName,
        via: &StationName,
        to: &StationName,
        speed: SpeedFilter,
        sort: SortMode,
    ) -> Result<Vec<Itinerary>, SearchError> {
        self.check_endpoints(from, to).await?;
        self.check_station(via).await?;
        if via == from || via == to {
            return Err(SearchError::InvalidRequest(format!(
                "via station {via} must differ from both endpoints"
            )));
        }

        let (firsts, seconds) = futures::future::try_join(
            self.repo.by_station_pair(from, via, speed),
            self.repo.by_station_pair(via, to, speed),
        )
        .await?;

        let itineraries = pair_connections(
            &firsts,
            &seconds,
            speed,
            self.config.min_stop_minutes,
            Some(via),
        )?;
        debug!(%from, %via, %to, found = itineraries.len(), "Via search");

        Ok(self.capped(rank_itineraries(itineraries, sort)))
    }

    /// Up to `result_count` alternatives with at most `max_transfers`
    /// changes, found over the transfer graph.
    ///
    /// Price sort modes optimise for fare, all others for travel time. Each
    /// alternative must start on a different train from every earlier one.
    pub async fn search_multi_transfer(
        &self,
        from: &StationName,
        to: &StationName,
        speed: SpeedFilter,
        max_transfers: usize,
        result_count: usize,
        sort: SortMode,
    ) -> Result<Vec<Itinerary>, SearchError> {
        self.check_endpoints(from, to).await?;
        if result_count == 0 {
            return Err(SearchError::InvalidRequest(
                "result count must be at least 1".to_string(),
            ));
        }

        let graph = self.graphs.snapshot().await.ok_or(SearchError::GraphNotBuilt)?;
        let min_stop = self.config.min_stop_minutes;
        let overlay = QueryOverlay::build(self.repo.as_ref(), &graph, from, to, min_stop).await?;
        let view = GraphView::new(&graph, &overlay);
        debug!(
            version = graph.version(),
            overlay_edges = overlay.edge_count(),
            "Prepared query graph"
        );

        let criterion = if sort.is_price() {
            Criterion::Price
        } else {
            Criterion::Time
        };
        let mut forbidden: HashSet<TrainRunId> = HashSet::new();
        let mut seen = HashSet::new();
        let mut itineraries = Vec::new();

        while itineraries.len() < result_count {
            let query = EngineQuery {
                destination: to,
                forbidden: &forbidden,
                max_transfers,
                speed,
                criterion,
                min_stop_minutes: min_stop,
                max_expansions: self.config.max_expansions,
            };
            let Some(path) = cheapest_path(view, &query)? else {
                break;
            };
            let Some(lead) = path.lead_run().cloned() else {
                break;
            };

            let itinerary = self.reconstruct(&path, to).await?;
            if itinerary.total_minutes() > self.config.cost_ceiling_minutes {
                break;
            }
            forbidden.insert(lead);
            if seen.insert(itinerary.key().to_string()) {
                itineraries.push(itinerary);
            }
        }

        info!(%from, %to, found = itineraries.len(), "Multi-transfer search");
        Ok(rank_itineraries(itineraries, sort))
    }

    /// Run every strategy the request allows and merge the results.
    ///
    /// The multi-transfer search only joins for the shortest-time and
    /// cheapest sort modes.
    pub async fn search(&self, request: &JourneyRequest) -> Result<Vec<Itinerary>, SearchError> {
        let (from, to) = (&request.from, &request.to);
        let mut found = self
            .search_direct(from, to, request.speed, request.sort)
            .await?;

        if request.max_transfers >= 1 {
            found.extend(
                self.search_one_transfer(
                    from,
                    to,
                    request.speed,
                    request.sort,
                    self.config.min_stop_minutes,
                )
                .await?,
            );
        }

        if request.max_transfers >= 2 {
            if matches!(request.sort, SortMode::DurationAsc | SortMode::PriceAsc) {
                let count = request
                    .result_count
                    .unwrap_or(self.config.default_result_count);
                found.extend(
                    self.search_multi_transfer(
                        from,
                        to,
                        request.speed,
                        request.max_transfers,
                        count,
                        request.sort,
                    )
                    .await?,
                );
            } else {
                warn!(sort = ?request.sort, "Multi-transfer search skipped for this sort mode");
            }
        }

        let merged = rank_itineraries(deduplicate(found), request.sort);
        info!(%from, %to, results = merged.len(), "Search complete");
        Ok(merged)
    }

    /// Turn the engine's boardings back into repository legs.
    ///
    /// The engine never lets a path leave a train and board the same run
    /// again, so each boarding is one continuous ride.
    async fn reconstruct(
        &self,
        path: &PathState,
        destination: &StationName,
    ) -> Result<Itinerary, SearchError> {
        let mut legs = Vec::with_capacity(path.boardings.len());
        for (i, boarding) in path.boardings.iter().enumerate() {
            let alight = path
                .boardings
                .get(i + 1)
                .map_or(destination, |next| &next.station);
            let leg = self
                .repo
                .by_station_pair_and_train(&boarding.station, alight, &boarding.run)
                .await?
                .ok_or_else(|| SearchError::Reconstruction {
                    run: boarding.run.clone(),
                    from: boarding.station.clone(),
                    to: alight.clone(),
                })?;
            legs.push(leg);
        }
        Ok(Itinerary::new(legs, self.config.min_stop_minutes)?)
    }

    fn capped(&self, itineraries: Vec<Itinerary>) -> Vec<Itinerary> {
        match self.config.bucket_cap {
            Some(cap) => cap_per_speed_mix(itineraries, cap),
            None => itineraries,
        }
    }

    async fn check_station(&self, name: &StationName) -> Result<(), SearchError> {
        match self.repo.by_name(name).await? {
            Some(_) => Ok(()),
            None => Err(SearchError::StationNotFound(name.clone())),
        }
    }

    async fn check_endpoints(&self, from: &StationName, to: &StationName) -> Result<(), SearchError> {
        self.check_station(from).await?;
        self.check_station(to).await?;
        if from == to {
            return Err(SearchError::InvalidRequest(
                "origin and destination are the same station".to_string(),
            ));
        }
        Ok(())
    }
}
