//! Graph nodes and edges.
//!
//! Nodes are value types: a station, a train run and a relative day. Two
//! nodes built from the same parts compare and hash equal, so the edge map
//! can be keyed on them directly.

use std::sync::Arc;

use crate::domain::{DomainError, Leg, StationName, TrainRunId};

/// Where a train run is, on which relative day of the itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stop {
    pub station: StationName,
    pub run: TrainRunId,
    /// 0, 1 or 2 for reachable nodes.
    pub day: u8,
}

impl Stop {
    pub fn new(station: StationName, run: TrainRunId, day: u8) -> Self {
        Self { station, run, day }
    }
}

/// A node of the time-expanded graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GraphNode {
    /// Virtual origin of a query.
    Start,
    /// A train run about to leave a station.
    Depart(Stop),
    /// A train run that has just reached a station.
    Arrive(Stop),
}

impl GraphNode {
    pub fn depart(station: &StationName, run: &TrainRunId, day: u8) -> Self {
        GraphNode::Depart(Stop::new(station.clone(), run.clone(), day))
    }

    pub fn arrive(station: &StationName, run: &TrainRunId, day: u8) -> Self {
        GraphNode::Arrive(Stop::new(station.clone(), run.clone(), day))
    }

    /// The station this node sits at. `None` for the virtual start.
    pub fn station(&self) -> Option<&StationName> {
        match self {
            GraphNode::Start => None,
            GraphNode::Depart(stop) | GraphNode::Arrive(stop) => Some(&stop.station),
        }
    }

    /// Relative day of the node. The start is day 0.
    pub fn day(&self) -> u8 {
        match self {
            GraphNode::Start => 0,
            GraphNode::Depart(stop) | GraphNode::Arrive(stop) => stop.day,
        }
    }
}

/// Riding a real leg, boarded on a given relative day.
#[derive(Debug, Clone)]
pub struct RideEdge {
    pub leg: Arc<Leg>,
    /// Day the leg departs on.
    pub day: u8,
}

impl RideEdge {
    pub fn new(leg: Arc<Leg>, day: u8) -> Self {
        Self { leg, day }
    }

    /// The departure node this edge leaves from.
    pub fn source(&self) -> GraphNode {
        GraphNode::depart(&self.leg.from, &self.leg.run_id, self.day)
    }

    pub fn target(&self) -> GraphNode {
        GraphNode::arrive(
            &self.leg.to,
            &self.leg.run_id,
            self.day + self.leg.arrival_day,
        )
    }
}

/// Waiting inside one station for a departure.
///
/// Covers dwelling on the same train, changing trains, and rolling over to a
/// later departure. The only way to build one is [`WaitEdge::between`], which
/// refuses to join two different stations.
#[derive(Debug, Clone)]
pub struct WaitEdge {
    station: StationName,
    run: TrainRunId,
    minutes: u32,
    target_day: u8,
}

impl WaitEdge {
    /// A wait at `station` until `departure` leaves, arriving at its
    /// departure node on `target_day`.
    ///
    /// # Errors
    ///
    /// Returns `StationMismatch` if `departure` does not leave from `station`.
    pub fn between(
        station: &StationName,
        departure: &Leg,
        minutes: u32,
        target_day: u8,
    ) -> Result<Self, DomainError> {
        if &departure.from != station {
            return Err(DomainError::StationMismatch {
                arrival: station.clone(),
                departure: departure.from.clone(),
            });
        }
        Ok(Self {
            station: station.clone(),
            run: departure.run_id.clone(),
            minutes,
            target_day,
        })
    }

    pub fn station(&self) -> &StationName {
        &self.station
    }

    /// Run of the departure this wait leads to.
    pub fn run(&self) -> &TrainRunId {
        &self.run
    }

    pub fn minutes(&self) -> u32 {
        self.minutes
    }

    pub fn target(&self) -> GraphNode {
        GraphNode::depart(&self.station, &self.run, self.target_day)
    }
}

/// An outgoing edge of a node.
#[derive(Debug, Clone)]
pub enum Edge {
    Ride(RideEdge),
    Wait(WaitEdge),
}

impl Edge {
    pub fn target(&self) -> GraphNode {
        match self {
            Edge::Ride(ride) => ride.target(),
            Edge::Wait(wait) => wait.target(),
        }
    }

    /// Minutes spent traversing the edge.
    pub fn minutes(&self) -> u32 {
        match self {
            Edge::Ride(ride) => ride.leg.running_minutes,
            Edge::Wait(wait) => wait.minutes,
        }
    }

    pub fn price(&self) -> f64 {
        match self {
            Edge::Ride(ride) => ride.leg.price,
            Edge::Wait(_) => 0.0,
        }
    }
}
