//! Typed topic identifiers and parsing.

use std::fmt;

use serde::{Deserialize, Serialize};

use mediroute_core::types::{FacilityId, UnitId};

/// The three broadcast topic spaces of the tracking hub.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Topic {
    /// Location updates for a single unit.
    Unit(UnitId),
    /// Geofence events at a single facility.
    Facility(FacilityId),
    /// Everything: location updates, geofence events, transport updates.
    Global,
}

impl Topic {
    /// Parses a topic string (`unit:<id>`, `facility:<id>`, `global`).
    pub fn parse(topic: &str) -> Option<Self> {
        let parts: Vec<&str> = topic.splitn(2, ':').collect();
        match parts.as_slice() {
            ["unit", id] if !id.is_empty() => Some(Topic::Unit((*id).to_string())),
            ["facility", id] if !id.is_empty() => Some(Topic::Facility((*id).to_string())),
            ["global"] => Some(Topic::Global),
            _ => None,
        }
    }

    /// Shortcut for a unit topic.
    pub fn unit(id: impl Into<UnitId>) -> Self {
        Topic::Unit(id.into())
    }

    /// Shortcut for a facility topic.
    pub fn facility(id: impl Into<FacilityId>) -> Self {
        Topic::Facility(id.into())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Topic::Unit(id) => write!(f, "unit:{id}"),
            Topic::Facility(id) => write!(f, "facility:{id}"),
            Topic::Global => write!(f, "global"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_roundtrip() {
        for raw in ["unit:U1", "facility:F-42", "global"] {
            let topic = Topic::parse(raw).unwrap();
            assert_eq!(topic.to_string(), raw);
        }
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert_eq!(Topic::parse("unit:"), None);
        assert_eq!(Topic::parse("facility"), None);
        assert_eq!(Topic::parse("global:extra"), None);
        assert_eq!(Topic::parse("fleet:U1"), None);
        assert_eq!(Topic::parse(""), None);
    }
}
