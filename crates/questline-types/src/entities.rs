//! Entity structs for the Questline data layer.
//!
//! These mirror the persisted tables one-to-one. Structured payloads
//! (story paragraphs, condition lists, status-effect deltas, initial NPC
//! rosters) are typed lists here; the store serializes them to JSONB at the
//! storage boundary and deserializes them back on load.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::enums::EventKind;
use crate::ids::{
    AreaId, CharId, EventId, ItemId, LogicId, MapId, MonsterId, MonsterPoolId, PlayerId, ResultId,
    RewardPoolId, TemplateId,
};

// ---------------------------------------------------------------------------
// World graph
// ---------------------------------------------------------------------------

/// A node in the world graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Map {
    /// Identity of this map.
    pub id: MapId,
    /// Display name.
    pub name: String,
    /// Flavor text shown when the map is entered.
    pub description: Option<String>,
    /// Reference to the map's backdrop image.
    pub image_url: Option<String>,
}

/// An undirected gated edge between two distinct maps.
///
/// The endpoint pair is stored in canonical order (`map_a < map_b`) and is
/// unique per unordered pair, so a single uniqueness constraint prevents
/// duplicate and reversed-duplicate edges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConnection {
    /// Lower endpoint of the canonical pair.
    pub map_a: MapId,
    /// Higher endpoint of the canonical pair.
    pub map_b: MapId,
    /// Whether the passage is currently locked.
    pub is_locked: bool,
    /// Item token required to traverse, if any. Evaluated against player
    /// state by an external collaborator, not here.
    pub required_item: Option<String>,
    /// Minimum player level required to traverse.
    pub required_level: u32,
}

/// A sub-area owned by exactly one map, with its own event pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapArea {
    /// Identity of this area.
    pub id: AreaId,
    /// The owning map.
    pub map_id: MapId,
    /// Display name.
    pub name: String,
    /// Flavor text.
    pub description: Option<String>,
    /// Reference to the area's backdrop image.
    pub image_url: Option<String>,
    /// NPCs initially present in the area.
    pub init_npcs: Vec<NpcSeed>,
}

/// An NPC placed in an area when it is first generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NpcSeed {
    /// Stable NPC identifier within the area.
    pub npc_id: u32,
    /// Display name.
    pub name: String,
    /// Narrative role, e.g. "guardian" or "merchant".
    pub role: String,
}

// ---------------------------------------------------------------------------
// Events and resolution branches
// ---------------------------------------------------------------------------

/// A narrative event that can be drawn at a location.
///
/// Created standalone, then linked into zero or more map/area pools via
/// weighted associations. Deleting an event cascades to its associations,
/// its general logic, and that logic's results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Identity of this event.
    pub id: EventId,
    /// Display name.
    pub name: String,
    /// Coarse type tag driving draw dispatch.
    pub kind: EventKind,
    /// Free-text description for authoring tools.
    pub description: Option<String>,
}

/// Narrative metadata attached to a non-battle event (one per event).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneralLogic {
    /// Identity of this logic record.
    pub id: LogicId,
    /// The owning event.
    pub event_id: EventId,
    /// Multi-paragraph story text shown before any result resolves.
    pub story_text: Vec<StoryParagraph>,
}

/// Combat metadata attached to a battle event.
///
/// Combat resolution itself is an external collaborator; this record only
/// names the monster pool to draw from and the reward pool at stake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleLogic {
    /// Identity of this logic record.
    pub id: LogicId,
    /// The owning event.
    pub event_id: EventId,
    /// Intro story text for the encounter.
    pub story_text: Vec<StoryParagraph>,
    /// Pool the opposing monster is drawn from.
    pub monster_pool_id: MonsterPoolId,
    /// Pool rewarded on victory.
    pub reward_pool_id: Option<RewardPoolId>,
}

/// A possible resolution branch of an event's general logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResult {
    /// Identity of this result.
    pub id: ResultId,
    /// The owning general logic record.
    pub logic_id: LogicId,
    /// Display name.
    pub name: String,
    /// Ordered requirements evaluated by the external condition checker.
    pub conditions: Vec<ConditionEntry>,
    /// Selection priority among passing results; highest wins, ties broken
    /// by stored order.
    pub priority: i32,
    /// Status-effect deltas applied to the active character on resolution.
    pub status_effects: Vec<EffectDelta>,
    /// Multi-paragraph outcome text.
    pub story_text: Vec<StoryParagraph>,
    /// Exclusively-owned reward pool, if this branch grants loot.
    pub reward_pool_id: Option<RewardPoolId>,
}

/// One paragraph of story text, optionally attributed to a speaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoryParagraph {
    /// Speaker or section name, if any.
    pub name: Option<String>,
    /// Paragraph body.
    pub text: String,
}

/// One requirement in an event result's condition list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionEntry {
    /// Condition key, e.g. `has_item`.
    pub key: String,
    /// Condition argument, e.g. `"torch"` or `3`.
    pub value: serde_json::Value,
}

/// One status-effect delta, e.g. `poison +3` or `heal +100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectDelta {
    /// Effect key.
    pub effect: String,
    /// Signed magnitude added to the character's current value.
    pub amount: i64,
}

// ---------------------------------------------------------------------------
// Weighted pools
// ---------------------------------------------------------------------------

/// A named pool of droppable items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPool {
    /// Identity of this pool.
    pub id: RewardPoolId,
    /// Display name for authoring tools.
    pub name: Option<String>,
}

/// A weighted item entry inside a reward pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardPoolItem {
    /// The owning pool.
    pub pool_id: RewardPoolId,
    /// The droppable item.
    pub item_id: ItemId,
    /// Draw weight relative to the other entries in the pool.
    pub probability: f64,
}

/// A monster that can be spawned by a battle event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    /// Identity of this monster.
    pub id: MonsterId,
    /// Display name.
    pub name: String,
    /// Hit points.
    pub hp: i32,
    /// Magic points.
    pub mp: i32,
    /// Attack stat.
    pub atk: i32,
    /// Speed stat.
    pub spd: i32,
    /// Defense stat.
    pub defense: i32,
    /// Pool of items this monster drops when defeated.
    pub drop_pool_id: Option<RewardPoolId>,
}

/// A named pool of spawnable monsters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsterPool {
    /// Identity of this pool.
    pub id: MonsterPoolId,
    /// Display name for authoring tools.
    pub name: Option<String>,
}

/// A weighted monster entry inside a monster pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonsterPoolEntry {
    /// The owning pool.
    pub pool_id: MonsterPoolId,
    /// The spawnable monster.
    pub monster_id: MonsterId,
    /// Draw weight relative to the other entries in the pool.
    pub probability: f64,
}

// ---------------------------------------------------------------------------
// Players, characters, rosters
// ---------------------------------------------------------------------------

/// A character template characters are instantiated from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharTemplate {
    /// Identity of this template.
    pub id: TemplateId,
    /// Display name.
    pub name: String,
    /// Base hit points copied on instantiation.
    pub base_hp: i32,
    /// Base magic points.
    pub base_mp: i32,
    /// Base attack.
    pub base_atk: i32,
    /// Base speed.
    pub base_spd: i32,
    /// Base defense.
    pub base_def: i32,
}

/// A player's persistent game state.
///
/// Account identity, authentication, and token issuance live in an external
/// collaborator; this record starts at the game-state boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Identity of this player's game state.
    pub id: PlayerId,
    /// Currency on hand.
    pub money: i64,
    /// Current map, if the player has entered the world.
    pub current_map: Option<MapId>,
    /// Current area within the current map.
    pub current_area: Option<AreaId>,
}

/// A character owned by a player, instantiated from a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerChar {
    /// Identity of this character.
    pub id: CharId,
    /// The owning player.
    pub player_id: PlayerId,
    /// Template this character was instantiated from.
    pub template_id: TemplateId,
    /// Current level.
    pub level: i32,
    /// Accumulated experience.
    pub exp: i64,
    /// Current hit points.
    pub hp: i32,
    /// Current magic points.
    pub mp: i32,
    /// Current attack.
    pub atk: i32,
    /// Current speed.
    pub spd: i32,
    /// Current defense.
    pub defense: i32,
    /// Active status effects keyed by effect name.
    pub status_effects: BTreeMap<String, i64>,
    /// Protects starter characters from accidental deletion.
    pub is_locked: bool,
}

/// One slot in a player's active team.
///
/// Position encodes turn and display order, 0-based. Unique per
/// (player, position) and per (player, character): no character may occupy
/// two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    /// The owning player.
    pub player_id: PlayerId,
    /// The assigned character.
    pub char_id: CharId,
    /// Slot index, 0 through 5.
    pub position: u8,
}

/// Per-(player, map) progress, created lazily on first visit.
///
/// Locked for the duration of an event draw so two concurrent draws for the
/// same player and map cannot interleave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapProgress {
    /// The player.
    pub player_id: PlayerId,
    /// The map.
    pub map_id: MapId,
    /// Coarse progress counter (e.g. events resolved).
    pub progress: i32,
    /// Whether the map has been completed.
    pub is_completed: bool,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn structured_lists_survive_serde() {
        let result = EventResult {
            id: ResultId::new(),
            logic_id: LogicId::new(),
            name: "open the chest".to_owned(),
            conditions: vec![ConditionEntry {
                key: "has_item".to_owned(),
                value: serde_json::json!("torch"),
            }],
            priority: 2,
            status_effects: vec![EffectDelta {
                effect: "heal".to_owned(),
                amount: 100,
            }],
            story_text: vec![StoryParagraph {
                name: Some("narrator".to_owned()),
                text: "The lid creaks open.".to_owned(),
            }],
            reward_pool_id: None,
        };

        let json = serde_json::to_string(&result).unwrap();
        let back: EventResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn effect_deltas_can_be_negative() {
        let delta = EffectDelta {
            effect: "poison".to_owned(),
            amount: -3,
        };
        assert!(delta.amount < 0);
    }
}
