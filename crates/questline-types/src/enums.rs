//! Enumeration types for the Questline data layer.

use serde::{Deserialize, Serialize};

/// The coarse type tag of a narrative event.
///
/// Resolved once when the event row is loaded; dispatch inside the draw
/// orchestrator matches on this variant rather than re-interpreting a
/// string column on every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Story event resolved through general logic and its results.
    Normal,
    /// Combat encounter routed to the external battle resolver.
    Battle,
    /// Scripted one-off event, resolved like [`EventKind::Normal`].
    Special,
}

impl EventKind {
    /// Database string form of this kind.
    pub const fn as_db_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Battle => "battle",
            Self::Special => "special",
        }
    }

    /// Parse the database string form. Returns `None` for unknown tags.
    pub fn from_db_str(s: &str) -> Option<Self> {
        match s {
            "normal" => Some(Self::Normal),
            "battle" => Some(Self::Battle),
            "special" => Some(Self::Special),
            _ => None,
        }
    }
}

impl core::fmt::Display for EventKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_db_str())
    }
}

/// Direction of a keyset-paginated listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageDirection {
    /// Ascending from the cursor (newer ids).
    Next,
    /// Descending from the cursor, returned in ascending order.
    Prev,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_kind_db_round_trip() {
        for kind in [EventKind::Normal, EventKind::Battle, EventKind::Special] {
            assert_eq!(EventKind::from_db_str(kind.as_db_str()), Some(kind));
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        assert_eq!(EventKind::from_db_str("boss"), None);
    }
}
