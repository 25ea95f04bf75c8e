//! Shapes exchanged with the maps agent.
//!
//! The agent reply is not a tagged union: which fields are populated tells the
//! caller what kind of content came back. `AgentResult` keeps that record form
//! and `view::ContentKinds` does the classification in one place.
pub mod result;
pub mod route;

pub use result::{AgentErrorDetail, AgentResult};
pub use route::{Bounds, Coordinates, Polyline, RouteDetail, RouteLeg, RouteStep, TextValue};
