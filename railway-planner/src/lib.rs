//! Railway itinerary planner.
//!
//! Answers: "which trains take me from this station to that one, and how
//! long and how much will it be?" Direct and one-change itineraries come
//! straight from timetable queries; journeys with more changes are found
//! over a transfer graph built on hub stations.

pub mod domain;
pub mod graph;
pub mod planner;
pub mod repository;
