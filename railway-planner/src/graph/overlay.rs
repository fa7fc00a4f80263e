//! Per-query endpoint overlay.
//!
//! The template only knows hub stations. A query's origin and destination
//! are usually not hubs, so each search splices them in with a small edge
//! map of its own. The overlay is read alongside the template through a
//! [`GraphView`] and dropped with the request.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::{DomainError, Leg, MAX_ARRIVAL_DAY, StationName};
use crate::repository::{LegRepository, RepositoryError};

use super::transfer::{
    earliest_change, first_admissible, floor_between, nearest_per_run, through_departure,
    wait_links,
};
use super::{Edge, GraphNode, RideEdge, TemplateGraph};

/// Request-owned edges for one query's endpoints.
#[derive(Debug, Default)]
pub struct QueryOverlay {
    edges: HashMap<GraphNode, Vec<Edge>>,
}

impl QueryOverlay {
    /// Splice `origin` and `destination` into `template`.
    ///
    /// A leg may join at an endpoint only if its other end is a hub. Legs
    /// are reduced to one per train run, nearest hub first.
    pub async fn build<R: LegRepository>(
        repo: &R,
        template: &TemplateGraph,
        origin: &StationName,
        destination: &StationName,
        min_stop_minutes: u32,
    ) -> Result<Self, RepositoryError> {
        let hubs = template.hubs();
        let mut overlay = QueryOverlay::default();

        // Departures towards the destination, grouped by the hub they leave
        let mut final_legs: HashMap<StationName, Vec<Arc<Leg>>> = HashMap::new();
        if !hubs.contains(destination) {
            let incoming = repo.by_arrival_station(destination).await?;
            let incoming = nearest_per_run(
                incoming
                    .into_iter()
                    .filter(|l| hubs.contains(&l.from) && l.from != l.to),
            );
            for leg in incoming {
                overlay.add_rides(&leg);
                for arrival in template.arrivals_at(&leg.from) {
                    let floor = floor_between(arrival, &leg, min_stop_minutes);
                    overlay.add_links(wait_links(arrival, &leg, floor));
                }
                final_legs.entry(leg.from.clone()).or_default().push(leg);
            }
        }

        let outgoing = repo.by_departure_station(origin).await?;
        let outgoing = nearest_per_run(
            outgoing
                .into_iter()
                .filter(|l| hubs.contains(&l.to) && l.from != l.to),
        );
        for leg in &outgoing {
            overlay.add(GraphNode::Start, Edge::Ride(RideEdge::new(Arc::clone(leg), 0)));

            let departures = template.departures_at(&leg.to);
            if let Some(through) = through_departure(departures, leg) {
                overlay.add_links(wait_links(leg, through, 0));
            }
            let start = first_admissible(departures, leg.arrival, min_stop_minutes);
            if let Some(change) = earliest_change(departures, start, leg, min_stop_minutes) {
                overlay.add_links(wait_links(leg, change, min_stop_minutes));
            }
            for last in final_legs.get(&leg.to).into_iter().flatten() {
                let floor = floor_between(leg, last, min_stop_minutes);
                overlay.add_links(wait_links(leg, last, floor));
            }
        }

        debug!(
            origin = %origin,
            destination = %destination,
            first_legs = outgoing.len(),
            last_legs = final_legs.values().map(Vec::len).sum::<usize>(),
            edges = overlay.edge_count(),
            "Query overlay built"
        );

        Ok(overlay)
    }

    fn add(&mut self, from: GraphNode, edge: Edge) {
        self.edges.entry(from).or_default().push(edge);
    }

    fn add_rides(&mut self, leg: &Arc<Leg>) {
        for day in 0..=MAX_ARRIVAL_DAY {
            let ride = RideEdge::new(Arc::clone(leg), day);
            self.add(ride.source(), Edge::Ride(ride));
        }
    }

    fn add_links(&mut self, links: Result<Vec<(GraphNode, Edge)>, DomainError>) {
        match links {
            Ok(links) => {
                for (source, edge) in links {
                    self.add(source, edge);
                }
            }
            Err(e) => warn!(error = %e, "Dropping overlay connection"),
        }
    }

    /// Overlay edges leaving `node`.
    pub fn edges(&self, node: &GraphNode) -> &[Edge] {
        self.edges.get(node).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}

/// A template graph seen together with one query's overlay.
#[derive(Clone, Copy)]
pub struct GraphView<'a> {
    template: &'a TemplateGraph,
    overlay: &'a QueryOverlay,
}

impl<'a> GraphView<'a> {
    pub fn new(template: &'a TemplateGraph, overlay: &'a QueryOverlay) -> Self {
        Self { template, overlay }
    }

    /// Template edges of `node` followed by its overlay edges.
    pub fn edges(
        &self,
        node: &GraphNode,
    ) -> std::iter::Chain<std::slice::Iter<'a, Edge>, std::slice::Iter<'a, Edge>> {
        self.template
            .edges(node)
            .iter()
            .chain(self.overlay.edges(node).iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::leg::test_support::leg;
    use crate::domain::{Station, TrainRunId};
    use crate::graph::build_template;
    use crate::repository::{MemoryTimetable, StationRegistry};

    fn name(s: &str) -> StationName {
        StationName::new(s)
    }

    fn run(s: &str) -> TrainRunId {
        TrainRunId::new(s)
    }

    /// Hubs H1, H2; O and D are not hubs.
    fn timetable() -> MemoryTimetable {
        MemoryTimetable::from_parts(
            vec![
                Station::new(1, "O", "Origin", false),
                Station::new(2, "H1", "Hub One", true),
                Station::new(3, "H2", "Hub Two", true),
                Station::new(4, "D", "Destination", false),
            ],
            vec![
                leg(1, "K1", "K1-a", "O", "H1", "07:00", 60),
                leg(2, "G2", "G2-a", "H1", "H2", "08:30", 90),
                leg(3, "K3", "K3-a", "H2", "D", "10:30", 45),
                // K1 continues to H2
                leg(4, "K1", "K1-a", "H1", "H2", "08:05", 120),
                leg(5, "K1", "K1-a", "O", "H2", "07:00", 185),
                // O to D directly is not spliced
                leg(6, "K6", "K6-a", "O", "D", "06:00", 300),
            ],
        )
    }

    async fn setup() -> (MemoryTimetable, TemplateGraph) {
        let tt = timetable();
        let hubs = tt.hub_stations().await.unwrap();
        let graph = build_template(&tt, hubs, 15, 4, 1).await.unwrap();
        (tt, graph)
    }

    #[tokio::test]
    async fn start_rides_to_nearest_hub() {
        let (tt, graph) = setup().await;
        let overlay = QueryOverlay::build(&tt, &graph, &name("O"), &name("D"), 15)
            .await
            .unwrap();

        let starts: Vec<u64> = overlay
            .edges(&GraphNode::Start)
            .iter()
            .map(|e| match e {
                Edge::Ride(r) => r.leg.id,
                Edge::Wait(_) => panic!("start only rides"),
            })
            .collect();
        assert_eq!(starts, vec![1]);
    }

    #[tokio::test]
    async fn origin_arrival_links_into_hub() {
        let (tt, graph) = setup().await;
        let overlay = QueryOverlay::build(&tt, &graph, &name("O"), &name("D"), 15)
            .await
            .unwrap();

        let out = overlay.edges(&GraphNode::arrive(&name("H1"), &run("K1-a"), 0));
        let targets: Vec<(GraphNode, u32)> = out.iter().map(|e| (e.target(), e.minutes())).collect();
        // Stay on K1 (5 minutes, no floor) or change to G2 (30 minutes)
        assert!(targets.contains(&(GraphNode::depart(&name("H1"), &run("K1-a"), 0), 5)));
        assert!(targets.contains(&(GraphNode::depart(&name("H1"), &run("G2-a"), 0), 30)));
        assert_eq!(targets.len(), 2);
    }

    #[tokio::test]
    async fn destination_legs_graft_onto_hub_arrivals() {
        let (tt, graph) = setup().await;
        let overlay = QueryOverlay::build(&tt, &graph, &name("O"), &name("D"), 15)
            .await
            .unwrap();

        for day in 0..=2 {
            let rides = overlay.edges(&GraphNode::depart(&name("H2"), &run("K3-a"), day));
            assert_eq!(rides.len(), 1);
            assert_eq!(
                rides[0].target(),
                GraphNode::arrive(&name("D"), &run("K3-a"), day)
            );
        }

        // G2 reaches H2 at 10:00; K3 leaves 10:30
        let from_g2 = overlay.edges(&GraphNode::arrive(&name("H2"), &run("G2-a"), 0));
        assert_eq!(from_g2.len(), 1);
        assert_eq!(from_g2[0].minutes(), 30);
    }

    #[tokio::test]
    async fn hub_destination_needs_no_grafting() {
        let (tt, graph) = setup().await;
        let overlay = QueryOverlay::build(&tt, &graph, &name("O"), &name("H2"), 15)
            .await
            .unwrap();
        assert!(
            overlay
                .edges(&GraphNode::depart(&name("H2"), &run("K3-a"), 0))
                .is_empty()
        );
        assert!(!overlay.edges(&GraphNode::Start).is_empty());
    }

    #[tokio::test]
    async fn view_chains_template_and_overlay() {
        let (tt, graph) = setup().await;
        let overlay = QueryOverlay::build(&tt, &graph, &name("O"), &name("D"), 15)
            .await
            .unwrap();
        let view = GraphView::new(&graph, &overlay);

        let node = GraphNode::arrive(&name("H2"), &run("G2-a"), 0);
        assert_eq!(
            view.edges(&node).count(),
            graph.edges(&node).len() + overlay.edges(&node).len()
        );
        assert_eq!(view.edges(&GraphNode::Start).count(), 1);
    }

    #[tokio::test]
    async fn overlay_leaves_template_untouched() {
        let (tt, graph) = setup().await;
        let before = graph.stats().clone();
        let _overlay = QueryOverlay::build(&tt, &graph, &name("O"), &name("D"), 15)
            .await
            .unwrap();
        assert_eq!(graph.stats(), &before);
        assert!(graph.edges(&GraphNode::Start).is_empty());
    }
}
