//! Type-safe identifier wrappers around [`Uuid`].
//!
//! Every entity in the game data layer has a strongly-typed ID to prevent
//! accidental mixing of identifiers at compile time. All IDs use UUID v7
//! (time-ordered) so primary-key indexes stay append-friendly and "stored
//! order" coincides with authoring order, which the event-result tie-break
//! policy relies on.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a newtype wrapper around [`Uuid`] with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new identifier using UUID v7 (time-ordered).
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Return the inner [`Uuid`] value.
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Unique identifier for a map (node in the world graph).
    MapId
}

define_id! {
    /// Unique identifier for a sub-area owned by a map.
    AreaId
}

define_id! {
    /// Unique identifier for a narrative event.
    EventId
}

define_id! {
    /// Unique identifier for an event's general logic record.
    LogicId
}

define_id! {
    /// Unique identifier for an event result (resolution branch).
    ResultId
}

define_id! {
    /// Unique identifier for a reward pool.
    RewardPoolId
}

define_id! {
    /// Unique identifier for a droppable item.
    ItemId
}

define_id! {
    /// Unique identifier for a monster.
    MonsterId
}

define_id! {
    /// Unique identifier for a monster pool.
    MonsterPoolId
}

define_id! {
    /// Unique identifier for a player's persistent game state.
    PlayerId
}

define_id! {
    /// Unique identifier for a character owned by a player.
    CharId
}

define_id! {
    /// Unique identifier for a character template.
    TemplateId
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_distinct_types() {
        let map = MapId::new();
        let area = AreaId::new();
        // These are different types -- the compiler enforces no mixing.
        assert_ne!(map.into_inner(), Uuid::nil());
        assert_ne!(area.into_inner(), Uuid::nil());
    }

    #[test]
    fn v7_ids_are_time_ordered() {
        let first = EventId::new();
        let second = EventId::new();
        assert!(first <= second);
    }

    #[test]
    fn display_round_trips_through_uuid() {
        let id = PlayerId::new();
        let raw: Uuid = id.into();
        assert_eq!(id.to_string(), raw.to_string());
        assert_eq!(PlayerId::from(raw), id);
    }
}
