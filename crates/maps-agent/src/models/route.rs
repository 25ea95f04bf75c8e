use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// A human readable measurement alongside its raw value, e.g. "5.2 km" / 5200.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    pub text: String,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteStep {
    pub distance: TextValue,
    pub duration: TextValue,
    #[serde(default)]
    pub html_instructions: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maneuver: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    /// Meters
    pub distance: TextValue,
    /// Seconds
    pub duration: TextValue,
    #[serde(default)]
    pub start_address: String,
    #[serde(default)]
    pub end_address: String,
    #[serde(default, deserialize_with = "lenient_steps")]
    pub steps: Vec<RouteStep>,
}

// Steps are optional detail, so a bad entry is dropped rather than failing the leg.
fn lenient_steps<'de, D>(deserializer: D) -> Result<Vec<RouteStep>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = match Value::deserialize(deserializer)? {
        Value::Array(entries) => entries,
        Value::Null => return Ok(Vec::new()),
        other => {
            tracing::warn!(value = %other, "dropping route steps that are not a list");
            return Ok(Vec::new());
        }
    };

    Ok(entries
        .into_iter()
        .enumerate()
        .filter_map(|(i, entry)| match serde_json::from_value(entry) {
            Ok(step) => Some(step),
            Err(e) => {
                tracing::warn!(index = i, error = %e, "dropping malformed route step");
                None
            }
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Polyline {
    pub points: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub northeast: Coordinates,
    pub southwest: Coordinates,
}

impl Bounds {
    pub fn center(&self) -> Coordinates {
        Coordinates {
            lat: (self.northeast.lat + self.southwest.lat) / 2.0,
            lng: (self.northeast.lng + self.southwest.lng) / 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteDetail {
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview_polyline: Option<Polyline>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,
}

impl RouteDetail {
    /// Decoded overview path, or None if there is no polyline or it is corrupt.
    pub fn path(&self) -> Option<Vec<Coordinates>> {
        self.overview_polyline
            .as_ref()
            .and_then(|p| decode_polyline(&p.points))
    }

    pub fn total_distance(&self) -> f64 {
        self.legs.iter().map(|leg| leg.distance.value).sum()
    }

    pub fn total_duration(&self) -> f64 {
        self.legs.iter().map(|leg| leg.duration.value).sum()
    }
}

/// Decode a polyline in the Google encoded polyline format at 1e-5 precision.
///
/// Each coordinate is a zig-zag encoded delta from the previous point, split
/// into 5-bit chunks offset by 63 with 0x20 marking continuation.
pub fn decode_polyline(encoded: &str) -> Option<Vec<Coordinates>> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;
    let mut path = Vec::new();

    while index < bytes.len() {
        lat += next_delta(bytes, &mut index)?;
        lng += next_delta(bytes, &mut index)?;

        let point = Coordinates::new(lat as f64 / 1e5, lng as f64 / 1e5);
        if !(-90.0..=90.0).contains(&point.lat) || !(-180.0..=180.0).contains(&point.lng) {
            return None;
        }
        path.push(point);
    }

    Some(path)
}

fn next_delta(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result: i64 = 0;
    let mut shift = 0;

    loop {
        let byte = *bytes.get(*index)?;
        *index += 1;
        if !(63..=126).contains(&byte) || shift > 30 {
            return None;
        }
        let chunk = (byte - 63) as i64;
        result |= (chunk & 0x1f) << shift;
        shift += 5;
        if chunk < 0x20 {
            break;
        }
    }

    Some(if result & 1 != 0 { !(result >> 1) } else { result >> 1 })
}
