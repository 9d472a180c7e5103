//! Shared types for the Questline game data layer.
//!
//! Questline tracks a persistent world graph of maps and sub-areas, assigns
//! weighted narrative events to locations, and manages player rosters. This
//! crate holds the vocabulary every other crate speaks:
//!
//! - [`ids`] -- strongly-typed UUID wrappers for every entity
//! - [`enums`] -- closed sets like the event kind tag
//! - [`entities`] -- entity structs and structured-list payloads
//!
//! Structured payloads (story paragraphs, condition lists, status-effect
//! deltas) are typed lists here and serialized to JSONB only at the storage
//! boundary -- the serialized form is never the canonical representation.

pub mod entities;
pub mod enums;
pub mod ids;

pub use entities::{
    BattleLogic, CharTemplate, ConditionEntry, EffectDelta, Event, EventResult, GeneralLogic, Map,
    MapArea, MapConnection, MapProgress, Monster, MonsterPool, MonsterPoolEntry, NpcSeed, Player,
    PlayerChar, RewardPool, RewardPoolItem, StoryParagraph, TeamMember,
};
pub use enums::{EventKind, PageDirection};
pub use ids::{
    AreaId, CharId, EventId, ItemId, LogicId, MapId, MonsterId, MonsterPoolId, PlayerId, ResultId,
    RewardPoolId, TemplateId,
};

/// Maximum number of characters in a player's active team.
pub const TEAM_CAPACITY: usize = 6;
