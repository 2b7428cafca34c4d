//! Route hints and segment planning.

use common::HubId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Segment, ShipmentError};

/// Optional estimates for one leg of a route.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegHint {
    /// Estimated distance in metres.
    pub distance_m: Option<u64>,

    /// Estimated duration in minutes.
    pub duration_min: Option<u64>,
}

impl LegHint {
    pub fn new(distance_m: Option<u64>, duration_min: Option<u64>) -> Self {
        Self {
            distance_m,
            duration_min,
        }
    }

    fn from_value(leg: usize, value: &Value) -> Self {
        let Some(fields) = value.as_object() else {
            tracing::warn!(leg, "route hint is not an object, leg has no estimates");
            return Self::default();
        };

        Self {
            distance_m: estimate(leg, fields, &["distanceM", "distance_m", "distance"]),
            duration_min: estimate(leg, fields, &["durationMin", "duration_min", "duration"]),
        }
    }
}

fn estimate(leg: usize, fields: &serde_json::Map<String, Value>, keys: &[&str]) -> Option<u64> {
    let (key, value) = keys
        .iter()
        .find_map(|key| fields.get(*key).map(|value| (*key, value)))?;

    let parsed = match value {
        Value::Null => return None,
        Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && *f >= 0.0)
                .map(|f| f.trunc() as u64)
        }),
        _ => None,
    };

    if parsed.is_none() {
        tracing::warn!(leg, key, %value, "ignoring malformed route hint value");
    }
    parsed
}

/// Per-leg estimates supplied alongside a route.
///
/// Hints are advisory. Anything missing or malformed degrades to
/// "no estimate" and never fails shipment creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteHints {
    legs: Vec<LegHint>,
}

impl RouteHints {
    /// No hints at all.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(legs: Vec<LegHint>) -> Self {
        Self { legs }
    }

    /// Parses hints from a JSON array of `{"distanceM": .., "durationMin": ..}`
    /// objects. Snake-case keys are accepted too.
    pub fn parse(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(error) => {
                tracing::warn!(%error, "route hints are not valid JSON, ignoring them");
                return Self::none();
            }
        };

        let Some(entries) = value.as_array() else {
            tracing::warn!("route hints are not a JSON array, ignoring them");
            return Self::none();
        };

        Self {
            legs: entries
                .iter()
                .enumerate()
                .map(|(leg, entry)| LegHint::from_value(leg, entry))
                .collect(),
        }
    }

    /// Parses optional raw hints; blank input means no hints.
    pub fn parse_optional(raw: Option<&str>) -> Self {
        match raw {
            Some(raw) if !raw.trim().is_empty() => Self::parse(raw),
            _ => Self::none(),
        }
    }

    /// Returns the hint for a leg, or an empty hint when none was supplied.
    pub fn leg(&self, index: usize) -> LegHint {
        self.legs.get(index).copied().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.legs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.legs.is_empty()
    }
}

/// Builds pending segments from an ordered hub list: N hubs give N-1 legs.
pub fn plan_segments(route: &[HubId], hints: &RouteHints) -> Result<Vec<Segment>, ShipmentError> {
    if route.len() < 2 {
        return Err(ShipmentError::RouteTooShort { hubs: route.len() });
    }
    if route.iter().any(HubId::is_blank) {
        return Err(ShipmentError::HubRequired { role: "Route" });
    }

    if hints.len() > route.len() - 1 {
        tracing::warn!(
            hints = hints.len(),
            legs = route.len() - 1,
            "more route hints than legs, extra hints ignored"
        );
    }

    Ok(route
        .windows(2)
        .enumerate()
        .map(|(sequence, pair)| {
            let hint = hints.leg(sequence);
            Segment::create(
                sequence,
                pair[0].clone(),
                pair[1].clone(),
                hint.distance_m,
                hint.duration_min,
            )
        })
        .collect())
}
