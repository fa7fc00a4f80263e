//! Time-expanded transfer graph.
//!
//! A template graph over the hub stations is built once and published
//! through a [`GraphStore`]. Each search adds its own origin and destination
//! with a [`QueryOverlay`] and walks both through a [`GraphView`].

mod builder;
mod node;
mod overlay;
mod store;
mod template;
mod transfer;

pub use builder::build_template;
pub use node::{Edge, GraphNode, RideEdge, Stop, WaitEdge};
pub use overlay::{GraphView, QueryOverlay};
pub use store::GraphStore;
pub use template::{GraphStats, TemplateGraph};
