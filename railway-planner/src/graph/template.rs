//! The hub-restricted template graph.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::domain::{Leg, StationName};
use crate::repository::HubStations;

use super::{Edge, GraphNode, WaitEdge};

/// Counts gathered while building a template graph.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphStats {
    pub hubs: usize,
    pub nodes: usize,
    pub ride_edges: usize,
    pub wait_edges: usize,
    /// Edges refused because of bad data.
    pub dropped_edges: usize,
}

/// Time-expanded graph over the hub stations.
///
/// Immutable once built. Searches hold it through an `Arc` snapshot from
/// [`GraphStore`](super::GraphStore) and add their own endpoints with a
/// [`QueryOverlay`](super::QueryOverlay).
#[derive(Debug, Default)]
pub struct TemplateGraph {
    pub(super) version: u64,
    pub(super) hubs: HubStations,
    pub(super) edges: HashMap<GraphNode, Vec<Edge>>,
    /// Per hub, linked departures sorted by departure time.
    pub(super) hub_departures: HashMap<StationName, Vec<Arc<Leg>>>,
    /// Per hub, linked arrivals sorted by arrival time.
    pub(super) hub_arrivals: HashMap<StationName, Vec<Arc<Leg>>>,
    pub(super) stats: GraphStats,
}

impl TemplateGraph {
    pub(super) fn new(version: u64, hubs: HubStations) -> Self {
        Self {
            version,
            stats: GraphStats {
                hubs: hubs.len(),
                ..GraphStats::default()
            },
            hubs,
            ..Self::default()
        }
    }

    pub(super) fn add_edge(&mut self, from: GraphNode, edge: Edge) {
        match &edge {
            Edge::Ride(_) => self.stats.ride_edges += 1,
            Edge::Wait(_) => self.stats.wait_edges += 1,
        }
        self.edges.entry(from).or_default().push(edge);
    }

    /// Recount distinct nodes once all edges are in.
    pub(super) fn finish(&mut self) {
        let mut nodes: HashSet<GraphNode> = self.edges.keys().cloned().collect();
        for edges in self.edges.values() {
            nodes.extend(edges.iter().map(Edge::target));
        }
        self.stats.nodes = nodes.len();
    }

    /// Outgoing edges of `node`, in insertion order.
    pub fn edges(&self, node: &GraphNode) -> &[Edge] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn hubs(&self) -> &HubStations {
        &self.hubs
    }

    pub fn stats(&self) -> &GraphStats {
        &self.stats
    }

    /// Linked departures from a hub, sorted by departure time.
    pub fn departures_at(&self, station: &StationName) -> &[Arc<Leg>] {
        self.hub_departures
            .get(station)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Linked arrivals at a hub, sorted by arrival time.
    pub fn arrivals_at(&self, station: &StationName) -> &[Arc<Leg>] {
        self.hub_arrivals
            .get(station)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every wait edge with the node it leaves from.
    pub fn wait_edges(&self) -> impl Iterator<Item = (&GraphNode, &WaitEdge)> {
        self.edges.iter().flat_map(|(node, edges)| {
            edges.iter().filter_map(move |edge| match edge {
                Edge::Wait(wait) => Some((node, wait)),
                Edge::Ride(_) => None,
            })
        })
    }
}
