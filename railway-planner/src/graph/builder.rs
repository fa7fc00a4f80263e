//! Template graph construction.
//!
//! For every hub the builder fetches the legs leaving and arriving there,
//! keeps the ones that stay inside the hub network, and links them with
//! ride edges, a cyclic wait chain over the departures, and one
//! arrival-to-departure connection per arriving train.

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::domain::{DomainError, Leg, MAX_ARRIVAL_DAY, MINUTES_PER_DAY, StationName, stop_time};
use crate::repository::{HubStations, LegRepository, RepositoryError};

use super::transfer::{
    earliest_change, floor_between, nearest_per_run, through_departure, wait_links,
};
use super::{Edge, GraphNode, RideEdge, TemplateGraph, WaitEdge};

/// Build a template graph over `hubs`.
///
/// Hubs are fetched `batch_size` at a time. Any repository failure aborts the
/// build.
pub async fn build_template<R: LegRepository>(
    repo: &R,
    hubs: HubStations,
    min_stop_minutes: u32,
    batch_size: usize,
    version: u64,
) -> Result<TemplateGraph, RepositoryError> {
    let stations = hubs.sorted();
    let mut builder = Builder {
        graph: TemplateGraph::new(version, hubs),
        rides_seen: HashSet::new(),
        floor: min_stop_minutes,
    };

    for batch in stations.chunks(batch_size.max(1)) {
        let futures: Vec<_> = batch
            .iter()
            .map(|station| async move {
                let departures = repo.by_departure_station(station).await;
                let arrivals = repo.by_arrival_station(station).await;
                (station, departures, arrivals)
            })
            .collect();

        for (station, departures, arrivals) in join_all(futures).await {
            builder.add_hub(station, departures?, arrivals?);
        }
    }

    let mut graph = builder.graph;
    graph.finish();

    let stats = graph.stats();
    info!(
        version,
        hubs = stats.hubs,
        nodes = stats.nodes,
        ride_edges = stats.ride_edges,
        wait_edges = stats.wait_edges,
        dropped_edges = stats.dropped_edges,
        "Template graph built"
    );

    Ok(graph)
}

struct Builder {
    graph: TemplateGraph,
    /// (leg id, departure day) pairs already emitted as ride edges.
    rides_seen: HashSet<(u64, u8)>,
    floor: u32,
}

impl Builder {
    fn add_hub(&mut self, station: &StationName, departures: Vec<Arc<Leg>>, arrivals: Vec<Arc<Leg>>) {
        let hubs = self.graph.hubs.clone();

        let departures = self.usable(departures, |leg| hubs.contains(&leg.to));
        let mut departures = nearest_per_run(departures);
        departures.sort_by_key(|l| (l.departure, l.id));

        let arrivals = self.usable(arrivals, |leg| hubs.contains(&leg.from));
        let mut arrivals = nearest_per_run(arrivals);
        arrivals.sort_by_key(|l| (l.arrival, l.id));

        debug!(
            station = %station,
            departures = departures.len(),
            arrivals = arrivals.len(),
            "Linking hub"
        );

        for leg in departures.iter().chain(arrivals.iter()) {
            self.add_rides(leg);
        }
        self.add_wait_chain(station, &departures);
        self.add_connections(&departures, &arrivals);

        self.graph.hub_departures.insert(station.clone(), departures);
        self.graph.hub_arrivals.insert(station.clone(), arrivals);
    }

    /// Drop legs outside the hub network and legs that go nowhere.
    fn usable(&mut self, legs: Vec<Arc<Leg>>, in_network: impl Fn(&Leg) -> bool) -> Vec<Arc<Leg>> {
        let mut kept = Vec::with_capacity(legs.len());
        for leg in legs {
            if !in_network(&leg) {
                continue;
            }
            if leg.from == leg.to {
                warn!(leg = leg.id, station = %leg.from, "Dropping leg that starts and ends at one station");
                self.graph.stats.dropped_edges += 1;
                continue;
            }
            kept.push(leg);
        }
        kept
    }

    fn add_rides(&mut self, leg: &Arc<Leg>) {
        for day in 0..=MAX_ARRIVAL_DAY {
            if self.rides_seen.insert((leg.id, day)) {
                let ride = RideEdge::new(Arc::clone(leg), day);
                self.graph.add_edge(ride.source(), Edge::Ride(ride));
            }
        }
    }

    /// Link each departure to the next one in time order, wrapping the last
    /// round to the first on the following day.
    fn add_wait_chain(&mut self, station: &StationName, departures: &[Arc<Leg>]) {
        if departures.len() < 2 {
            return;
        }
        for (i, current) in departures.iter().enumerate() {
            let next = &departures[(i + 1) % departures.len()];
            let minutes = stop_time(current.departure, next.departure);
            let carry = ((current.departure.minutes() + minutes) / MINUTES_PER_DAY) as u8;

            for day in 0..=MAX_ARRIVAL_DAY {
                let source = GraphNode::depart(station, &current.run_id, day);
                let edge = WaitEdge::between(station, next, minutes, day + carry);
                self.add_wait(source, edge);
            }
        }
    }

    /// Link every arrival to its own train leaving again, and to the earliest
    /// other train it can make.
    fn add_connections(&mut self, departures: &[Arc<Leg>], arrivals: &[Arc<Leg>]) {
        let mut next = 0;
        for arrival in arrivals {
            // Arrivals are sorted, so the admissible window only moves forward
            let earliest = arrival.arrival.minutes() + self.floor;
            while next < departures.len() && departures[next].departure.minutes() < earliest {
                next += 1;
            }

            if let Some(through) = through_departure(departures, arrival) {
                let floor = floor_between(arrival, through, self.floor);
                self.add_links(wait_links(arrival, through, floor));
            }
            if let Some(change) = earliest_change(departures, next, arrival, self.floor) {
                self.add_links(wait_links(arrival, change, self.floor));
            }
        }
    }

    fn add_links(&mut self, links: Result<Vec<(GraphNode, Edge)>, DomainError>) {
        match links {
            Ok(links) => {
                for (source, edge) in links {
                    self.graph.add_edge(source, edge);
                }
            }
            Err(e) => {
                warn!(error = %e, "Dropping connection");
                self.graph.stats.dropped_edges += 1;
            }
        }
    }

    fn add_wait(&mut self, source: GraphNode, edge: Result<WaitEdge, DomainError>) {
        match edge {
            Ok(wait) => self.graph.add_edge(source, Edge::Wait(wait)),
            Err(e) => {
                warn!(error = %e, "Dropping wait edge");
                self.graph.stats.dropped_edges += 1;
            }
        }
    }
}
