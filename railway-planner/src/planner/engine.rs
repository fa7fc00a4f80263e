//! Constrained cheapest-path search over the transfer graph.
//!
//! A Dijkstra variant with one label set per transfer count: a path that
//! reaches a node with fewer changes is never discarded in favour of a
//! cheaper one that used more. Within a layer, a label that is still aboard
//! its train or arrived on a tight dwell is kept apart from one that is free
//! to change, since each can reach places the other cannot. The queue is
//! ordered by the chosen cost, then by transfers.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};

use tracing::{debug, trace};

use crate::domain::{Leg, MAX_ARRIVAL_DAY, MINUTES_PER_DAY, SpeedFilter, StationName, TrainRunId};
use crate::graph::{Edge, GraphNode, GraphView};

use super::SearchError;

/// Which cost the engine minimises. The other breaks ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Criterion {
    Time,
    Price,
}

/// A train boarded along a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Boarding {
    pub run: TrainRunId,
    pub station: StationName,
}

impl Boarding {
    fn of(leg: &Leg) -> Self {
        Self {
            run: leg.run_id.clone(),
            station: leg.from.clone(),
        }
    }
}

/// Cost and history of a path from the virtual start.
#[derive(Debug, Clone)]
pub struct PathState {
    pub minutes: u32,
    pub price: f64,
    pub transfers: usize,
    /// Trains in boarding order. Staying on a train adds nothing.
    pub boardings: Vec<Boarding>,
    pub node: GraphNode,
    /// Reached by a dwell shorter than the minimum stop. Such a state may
    /// only continue on its own train.
    pub tight: bool,
    /// The train the passenger is still sitting on, if any.
    aboard: Option<TrainRunId>,
}

/// Labels at one node are kept apart when they can continue differently.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct LabelKey {
    node: GraphNode,
    tight: bool,
    aboard: bool,
}

impl PathState {
    fn start() -> Self {
        Self {
            minutes: 0,
            price: 0.0,
            transfers: 0,
            boardings: Vec::new(),
            node: GraphNode::Start,
            tight: false,
            aboard: None,
        }
    }

    fn key(&self) -> LabelKey {
        LabelKey {
            node: self.node.clone(),
            tight: self.tight,
            aboard: self.aboard.is_some(),
        }
    }

    /// (primary, secondary) cost under `criterion`.
    fn costs(&self, criterion: Criterion) -> (f64, f64) {
        match criterion {
            Criterion::Time => (self.minutes as f64, self.price),
            Criterion::Price => (self.price, self.minutes as f64),
        }
    }

    /// Relative day the path has reached.
    pub fn day(&self) -> u8 {
        self.node.day()
    }

    /// The first train boarded.
    pub fn lead_run(&self) -> Option<&TrainRunId> {
        self.boardings.first().map(|b| &b.run)
    }

    /// Follow `edge`, or `None` if the query forbids it.
    fn extend(&self, edge: &Edge, query: &EngineQuery<'_>) -> Option<PathState> {
        let node = edge.target();
        if node.day() > MAX_ARRIVAL_DAY {
            return None;
        }

        match edge {
            Edge::Wait(wait) => {
                if self.tight {
                    return None;
                }
                let tight = matches!(self.node, GraphNode::Arrive(_))
                    && wait.minutes() < query.min_stop_minutes;
                // Only a same-day dwell keeps the passenger on board
                let aboard = self
                    .aboard
                    .as_ref()
                    .filter(|run| *run == wait.run() && wait.minutes() < MINUTES_PER_DAY)
                    .cloned();
                Some(PathState {
                    minutes: self.minutes + wait.minutes(),
                    price: self.price,
                    transfers: self.transfers,
                    boardings: self.boardings.clone(),
                    node,
                    tight,
                    aboard,
                })
            }
            Edge::Ride(ride) => {
                let leg = &ride.leg;
                if query.forbidden.contains(&leg.run_id) || !query.speed.admits(leg) {
                    return None;
                }

                let mut transfers = self.transfers;
                let mut boardings = self.boardings.clone();
                match boardings.last() {
                    Some(last) if last.run == leg.run_id => {
                        // Getting back on the train just left, a day later,
                        // is never better than staying aboard
                        if self.aboard.as_ref() != Some(&leg.run_id) {
                            return None;
                        }
                    }
                    Some(_) => {
                        transfers += 1;
                        boardings.push(Boarding::of(leg));
                    }
                    None => boardings.push(Boarding::of(leg)),
                }
                if transfers > query.max_transfers {
                    return None;
                }

                Some(PathState {
                    minutes: self.minutes + leg.running_minutes,
                    price: self.price + leg.price,
                    transfers,
                    boardings,
                    node,
                    tight: false,
                    aboard: Some(leg.run_id.clone()),
                })
            }
        }
    }
}

/// What one engine run looks for.
#[derive(Debug, Clone)]
pub struct EngineQuery<'a> {
    pub destination: &'a StationName,
    /// Trains that may not be ridden.
    pub forbidden: &'a HashSet<TrainRunId>,
    pub max_transfers: usize,
    pub speed: SpeedFilter,
    pub criterion: Criterion,
    pub min_stop_minutes: u32,
    pub max_expansions: usize,
}

/// Priority queue entry. Ordered so the `BinaryHeap` pops the cheapest.
#[derive(Debug)]
struct QueueEntry {
    primary: f64,
    secondary: f64,
    transfers: usize,
    key: LabelKey,
}

impl QueueEntry {
    fn of(state: &PathState, criterion: Criterion) -> Self {
        let (primary, secondary) = state.costs(criterion);
        Self {
            primary,
            secondary,
            transfers: state.transfers,
            key: state.key(),
        }
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .primary
            .total_cmp(&self.primary)
            .then_with(|| other.transfers.cmp(&self.transfers))
            .then_with(|| other.secondary.total_cmp(&self.secondary))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

fn lexically_less(a: (f64, f64), b: (f64, f64)) -> bool {
    a.0.total_cmp(&b.0)
        .then_with(|| a.1.total_cmp(&b.1))
        .is_lt()
}

/// Find the cheapest path from the virtual start to any node at the
/// destination.
///
/// Returns `Ok(None)` when the destination cannot be reached within the
/// query's bounds.
///
/// # Errors
///
/// Returns `BudgetExhausted` after `max_expansions` node expansions.
pub fn cheapest_path(
    view: GraphView<'_>,
    query: &EngineQuery<'_>,
) -> Result<Option<PathState>, SearchError> {
    let criterion = query.criterion;
    // One layer per transfer count, grown as paths need them
    let mut best: Vec<HashMap<LabelKey, PathState>> = vec![HashMap::new()];
    let mut queue = BinaryHeap::new();

    let start = PathState::start();
    queue.push(QueueEntry::of(&start, criterion));
    best[0].insert(start.key(), start);

    let mut expansions = 0;

    while let Some(entry) = queue.pop() {
        let Some(state) = best[entry.transfers].get(&entry.key) else {
            continue;
        };
        // Superseded by a cheaper label since it was queued
        if state.costs(criterion) != (entry.primary, entry.secondary) {
            continue;
        }

        if entry.key.node.station() == Some(query.destination) {
            debug!(
                destination = %query.destination,
                minutes = state.minutes,
                price = state.price,
                transfers = state.transfers,
                expansions,
                "Cheapest path found"
            );
            return Ok(Some(state.clone()));
        }

        expansions += 1;
        if expansions > query.max_expansions {
            return Err(SearchError::BudgetExhausted {
                expansions: query.max_expansions,
            });
        }

        let state = state.clone();
        for edge in view.edges(&entry.key.node) {
            let Some(next) = state.extend(edge, query) else {
                continue;
            };

            if best.len() <= next.transfers {
                best.resize_with(next.transfers + 1, HashMap::new);
            }
            let layer = &mut best[next.transfers];
            let key = next.key();
            let improves = layer.get(&key).is_none_or(|current| {
                lexically_less(next.costs(criterion), current.costs(criterion))
            });
            if improves {
                trace!(node = ?next.node, minutes = next.minutes, "Relaxed");
                queue.push(QueueEntry::of(&next, criterion));
                layer.insert(key, next);
            }
        }
    }

    debug!(
        destination = %query.destination,
        expansions,
        "Destination unreachable"
    );
    Ok(None)
}
