//! Renderer-facing view of the dispatcher state.
//!
//! Renderers should not poke at `AgentResult` fields directly. `ContentKinds`
//! says what came back and `ResultView` says what to draw, including the
//! explicit "no data" fallback when a reply has nothing in it.
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

use crate::dispatcher::DispatchState;
use crate::models::{AgentResult, Coordinates, RouteDetail, RouteLeg, RouteStep, TextValue};

pub const NO_DATA_MESSAGE: &str = "No specific information to display.";
pub const LOADING_MESSAGE: &str = "Processing...";

lazy_static! {
    static ref LOCATION_IN_TEXT: Regex = Regex::new(r"(?i)\bat\s+(.*?)(?:\.|,|$)").unwrap();
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]*>").unwrap();
    static ref WHITESPACE: Regex = Regex::new(r"\s+").unwrap();
}

/// Which optional parts of a reply are populated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContentKinds {
    pub text: bool,
    pub point: bool,
    pub route: bool,
    pub map_html: bool,
    pub error: bool,
}

impl ContentKinds {
    pub fn of(result: &AgentResult) -> Self {
        Self {
            text: result.text.as_deref().is_some_and(|t| !t.trim().is_empty()),
            point: result.coordinates.is_some(),
            route: result.route.is_some(),
            map_html: result
                .map_html
                .as_deref()
                .is_some_and(|h| !h.trim().is_empty()),
            error: result.error.is_some(),
        }
    }

    pub fn has_map_data(&self) -> bool {
        self.point || self.route || self.map_html
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl fmt::Display for ContentKinds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = [
            (self.text, "text"),
            (self.point, "point"),
            (self.route, "route"),
            (self.map_html, "map_html"),
            (self.error, "error"),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .map(|(_, name)| *name)
        .collect();

        if names.is_empty() {
            write!(f, "none")
        } else {
            write!(f, "{}", names.join("+"))
        }
    }
}

/// What the map panel should show. At most one map is drawn per reply.
#[derive(Debug, Clone, PartialEq)]
pub enum MapView {
    /// Markup from the agent, to be embedded as-is. The agent is trusted to
    /// have sanitized it.
    Embedded(String),
    Route {
        center: Option<Coordinates>,
        path: Vec<Coordinates>,
        marker: Option<Coordinates>,
    },
    Point(Coordinates),
    None,
}

impl MapView {
    fn of(result: &AgentResult, kinds: &ContentKinds) -> Self {
        if kinds.map_html {
            if let Some(html) = &result.map_html {
                return MapView::Embedded(html.clone());
            }
        }
        if let Some(route) = &result.route {
            let path = route.path().unwrap_or_default();
            let center = route
                .bounds
                .map(|b| b.center())
                .or(result.coordinates)
                .or_else(|| path.first().copied());
            return MapView::Route {
                center,
                path,
                marker: result.coordinates,
            };
        }
        match result.coordinates {
            Some(point) => MapView::Point(point),
            None => MapView::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepView {
    pub instruction: String,
    pub distance: String,
    pub duration: String,
    pub maneuver: Option<String>,
}

impl From<&RouteStep> for StepView {
    fn from(step: &RouteStep) -> Self {
        Self {
            instruction: strip_html(&step.html_instructions),
            distance: step.distance.text.clone(),
            duration: step.duration.text.clone(),
            maneuver: step.maneuver.clone(),
        }
    }
}

/// One entry in the route details list. Values are carried over untouched.
#[derive(Debug, Clone, PartialEq)]
pub struct LegView {
    /// 1-based
    pub index: usize,
    pub distance: TextValue,
    pub duration: TextValue,
    pub start_address: String,
    pub end_address: String,
    pub steps: Vec<StepView>,
}

impl LegView {
    fn new(index: usize, leg: &RouteLeg) -> Self {
        Self {
            index,
            distance: leg.distance.clone(),
            duration: leg.duration.clone(),
            start_address: leg.start_address.clone(),
            end_address: leg.end_address.clone(),
            steps: leg.steps.iter().map(StepView::from).collect(),
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Leg {}: Distance: {} ({} meters) Duration: {} ({} seconds)",
            self.index,
            self.distance.text,
            self.distance.value,
            self.duration.text,
            self.duration.value
        )
    }
}

/// Everything needed to draw a successful reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultCard {
    pub kinds: ContentKinds,
    pub text: Option<String>,
    pub map: MapView,
    pub location: Option<String>,
    pub legs: Vec<LegView>,
    pub agent_error: Option<String>,
}

impl ResultCard {
    pub fn new(result: &AgentResult) -> Self {
        let kinds = ContentKinds::of(result);
        let text = result.text.clone().filter(|_| kinds.text);

        Self {
            kinds,
            map: MapView::of(result, &kinds),
            location: location_label(result),
            legs: result.route.as_ref().map(leg_views).unwrap_or_default(),
            agent_error: result.error.as_ref().map(|e| e.message.clone()),
            text,
        }
    }

    /// The "no data" message, shown only when the reply carried nothing at all.
    pub fn fallback(&self) -> Option<&'static str> {
        self.kinds.is_empty().then_some(NO_DATA_MESSAGE)
    }

    fn render_into(&self, out: &mut Vec<String>) {
        out.push("Agent Response".to_string());

        if let Some(text) = &self.text {
            out.push(text.clone());
        }

        match &self.map {
            MapView::Embedded(html) => {
                out.push("Map:".to_string());
                out.push(html.clone());
            }
            MapView::Route { center, path, .. } => {
                let mut line = format!("Map: route through {} points", path.len());
                if let Some(center) = center {
                    line.push_str(&format!(" centered at {}, {}", center.lat, center.lng));
                }
                out.push(line);
            }
            MapView::Point(point) => out.push(format!("Map for: {}, {}", point.lat, point.lng)),
            MapView::None => {}
        }

        if let Some(location) = &self.location {
            out.push(format!("Location: {}", location));
        }

        if let Some(error) = &self.agent_error {
            out.push(format!("Agent error: {}", error));
        }

        if self.kinds.route {
            out.push("Route Details:".to_string());
            for leg in &self.legs {
                out.push(leg.summary());
                if !leg.start_address.is_empty() || !leg.end_address.is_empty() {
                    out.push(format!("  From: {} To: {}", leg.start_address, leg.end_address));
                }
                for step in &leg.steps {
                    out.push(format!(
                        "  - {} ({}, {})",
                        step.instruction, step.distance, step.duration
                    ));
                }
            }
        }

        if let Some(fallback) = self.fallback() {
            out.push(fallback.to_string());
        }
    }
}

/// What a renderer should draw for a given dispatcher state.
#[derive(Debug, Clone, PartialEq)]
pub enum ResultView {
    Idle,
    Loading { query: String },
    Error { message: String },
    Card(ResultCard),
}

impl ResultView {
    pub fn from_state(state: &DispatchState) -> Self {
        match state {
            DispatchState::Idle => ResultView::Idle,
            DispatchState::Submitting { query, .. } => ResultView::Loading {
                query: query.clone(),
            },
            DispatchState::Failed { error, .. } => ResultView::Error {
                message: error.to_string(),
            },
            DispatchState::Success { result, .. } => ResultView::Card(ResultCard::new(result)),
        }
    }

    /// Plain-text rendering, one line per element.
    pub fn render_text(&self) -> String {
        let mut out = Vec::new();
        match self {
            ResultView::Idle => {}
            ResultView::Loading { .. } => out.push(LOADING_MESSAGE.to_string()),
            ResultView::Error { message } => {
                out.push("Error".to_string());
                out.push(message.clone());
            }
            ResultView::Card(card) => card.render_into(&mut out),
        }
        out.join("\n")
    }
}

fn leg_views(route: &RouteDetail) -> Vec<LegView> {
    route
        .legs
        .iter()
        .enumerate()
        .map(|(i, leg)| LegView::new(i + 1, leg))
        .collect()
}

/// A short label for where the reply points: the coordinates if present,
/// otherwise whatever follows "at" in the text.
pub fn location_label(result: &AgentResult) -> Option<String> {
    if let Some(point) = result.coordinates {
        return Some(format!("{}, {}", point.lat, point.lng));
    }
    let text = result.text.as_deref()?;
    LOCATION_IN_TEXT
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"");
    WHITESPACE.replace_all(text.trim(), " ").into_owned()
}
