//! Default starting world for a fresh Questline database.
//!
//! Builds a small connected region: three maps with gated connections,
//! a handful of areas, weighted event pools on each tier, one battle
//! event backed by a monster pool, and a starter character template.

use questline_db::{
    AssociationStore, Db, EventStore, GraphStore, PlayerStore, PoolStore, StoreError,
};
use questline_types::{
    AreaId, BattleLogic, CharTemplate, ConditionEntry, EffectDelta, Event, EventId, EventKind,
    EventResult, GeneralLogic, ItemId, LogicId, Map, MapArea, MapId, Monster, MonsterId,
    MonsterPool, MonsterPoolId, NpcSeed, ResultId, RewardPool, RewardPoolId, StoryParagraph,
    TemplateId,
};

/// Helper to build a [`Map`].
fn map(id: MapId, name: &str, desc: &str) -> Map {
    Map {
        id,
        name: name.to_owned(),
        description: Some(desc.to_owned()),
        image_url: None,
    }
}

/// Helper to build a [`MapArea`].
fn area(id: AreaId, map_id: MapId, name: &str, desc: &str, npcs: Vec<NpcSeed>) -> MapArea {
    MapArea {
        id,
        map_id,
        name: name.to_owned(),
        description: Some(desc.to_owned()),
        image_url: None,
        init_npcs: npcs,
    }
}

/// Helper to build an unattributed [`StoryParagraph`].
fn para(text: &str) -> StoryParagraph {
    StoryParagraph {
        name: None,
        text: text.to_owned(),
    }
}

/// Helper to build a speaker-attributed [`StoryParagraph`].
fn spoken(name: &str, text: &str) -> StoryParagraph {
    StoryParagraph {
        name: Some(name.to_owned()),
        text: text.to_owned(),
    }
}

/// Identifiers for the seeded starting world, returned so callers can
/// reference specific rows for player placement and smoke tests.
#[derive(Debug, Clone)]
pub struct StartingWorldIds {
    /// Willow Village: the starting map.
    pub village: MapId,
    /// The village square area, where new players are placed.
    pub village_square: AreaId,
    /// Duskwood: first wilderness map, reachable from the village.
    pub duskwood: MapId,
    /// Emberpeak Pass: locked until the player finds the pass permit.
    pub emberpeak: MapId,
    /// The starter character template.
    pub starter_template: TemplateId,
}

/// Seed the default starting world into an empty database.
///
/// Idempotency is not attempted: run this once against a freshly
/// migrated database.
///
/// # Errors
///
/// Returns [`StoreError`] if any insert fails.
#[allow(clippy::too_many_lines)]
pub async fn seed_starting_world(db: &Db) -> Result<StartingWorldIds, StoreError> {
    let pool = db.pool();
    let graph = GraphStore::new(pool);
    let events = EventStore::new(pool);
    let associations = AssociationStore::new(pool);
    let pools = PoolStore::new(pool);
    let players = PlayerStore::new(pool);

    // ---------------------------------------------------------------
    // Maps and connections
    // ---------------------------------------------------------------

    let village = MapId::new();
    let duskwood = MapId::new();
    let emberpeak = MapId::new();

    graph
        .create_map(&map(
            village,
            "Willow Village",
            "A sleepy farming village at the edge of the Duskwood.",
        ))
        .await?;
    graph
        .create_map(&map(
            duskwood,
            "Duskwood",
            "An old forest where the canopy swallows the daylight.",
        ))
        .await?;
    graph
        .create_map(&map(
            emberpeak,
            "Emberpeak Pass",
            "A narrow mountain pass, closed to travelers without a permit.",
        ))
        .await?;

    graph
        .upsert_connection(village, duskwood, false, None, 0)
        .await?;
    graph
        .upsert_connection(duskwood, emberpeak, true, Some("pass permit"), 5)
        .await?;

    // ---------------------------------------------------------------
    // Areas
    // ---------------------------------------------------------------

    let village_square = AreaId::new();
    graph
        .create_area(&area(
            village_square,
            village,
            "Village Square",
            "Market stalls ring a mossy stone well.",
            vec![
                NpcSeed {
                    npc_id: 1,
                    name: "Elder Rowan".to_owned(),
                    role: "guide".to_owned(),
                },
                NpcSeed {
                    npc_id: 2,
                    name: "Merla".to_owned(),
                    role: "merchant".to_owned(),
                },
            ],
        ))
        .await?;

    let forest_path = AreaId::new();
    graph
        .create_area(&area(
            forest_path,
            duskwood,
            "Forest Path",
            "A rutted cart track winding between black trunks.",
            Vec::new(),
        ))
        .await?;

    // ---------------------------------------------------------------
    // Reward pools and monsters
    // ---------------------------------------------------------------

    let herb_pool = RewardPoolId::new();
    pools
        .create_reward_pool(&RewardPool {
            id: herb_pool,
            name: Some("duskwood herbs".to_owned()),
        })
        .await?;
    pools.upsert_reward_item(herb_pool, ItemId::new(), 3.0).await?;
    pools.upsert_reward_item(herb_pool, ItemId::new(), 1.0).await?;

    let wolf_loot = RewardPoolId::new();
    pools
        .create_reward_pool(&RewardPool {
            id: wolf_loot,
            name: Some("wolf pelts".to_owned()),
        })
        .await?;
    pools.upsert_reward_item(wolf_loot, ItemId::new(), 1.0).await?;

    let grey_wolf = MonsterId::new();
    pools
        .create_monster(&Monster {
            id: grey_wolf,
            name: "Grey Wolf".to_owned(),
            hp: 40,
            mp: 0,
            atk: 8,
            spd: 12,
            defense: 4,
            drop_pool_id: Some(wolf_loot),
        })
        .await?;
    let dire_wolf = MonsterId::new();
    pools
        .create_monster(&Monster {
            id: dire_wolf,
            name: "Dire Wolf".to_owned(),
            hp: 75,
            mp: 0,
            atk: 14,
            spd: 10,
            defense: 7,
            drop_pool_id: Some(wolf_loot),
        })
        .await?;

    let wolf_pack = MonsterPoolId::new();
    pools
        .create_monster_pool(&MonsterPool {
            id: wolf_pack,
            name: Some("duskwood wolves".to_owned()),
        })
        .await?;
    pools.upsert_monster_entry(wolf_pack, grey_wolf, 4.0).await?;
    pools.upsert_monster_entry(wolf_pack, dire_wolf, 1.0).await?;

    // ---------------------------------------------------------------
    // Events
    // ---------------------------------------------------------------

    // A merchant encounter on the village map.
    let merchant = EventId::new();
    events
        .create_event(&Event {
            id: merchant,
            name: "Traveling Merchant".to_owned(),
            kind: EventKind::Normal,
            description: Some("A peddler with an overloaded cart.".to_owned()),
        })
        .await?;
    let merchant_logic = LogicId::new();
    events
        .create_general_logic(&GeneralLogic {
            id: merchant_logic,
            event_id: merchant,
            story_text: vec![
                para("A cart creaks to a halt beside you."),
                spoken("Peddler", "Care to see my wares, traveler?"),
            ],
        })
        .await?;
    events
        .create_event_result(&EventResult {
            id: ResultId::new(),
            logic_id: merchant_logic,
            name: "generous discount".to_owned(),
            conditions: vec![ConditionEntry {
                key: "min_money".to_owned(),
                value: serde_json::json!(50),
            }],
            priority: 2,
            status_effects: Vec::new(),
            story_text: vec![spoken("Peddler", "For a customer of means, half price!")],
            reward_pool_id: None,
        })
        .await?;
    events
        .create_event_result(&EventResult {
            id: ResultId::new(),
            logic_id: merchant_logic,
            name: "a free sample".to_owned(),
            conditions: Vec::new(),
            priority: 0,
            status_effects: vec![EffectDelta {
                effect: "heal".to_owned(),
                amount: 10,
            }],
            story_text: vec![para("The peddler presses a bitter tonic into your hand.")],
            reward_pool_id: None,
        })
        .await?;

    // A foraging encounter in the Duskwood, with a reward pool.
    let foraging = EventId::new();
    events
        .create_event(&Event {
            id: foraging,
            name: "Herb Patch".to_owned(),
            kind: EventKind::Normal,
            description: Some("Medicinal herbs growing in a clearing.".to_owned()),
        })
        .await?;
    let foraging_logic = LogicId::new();
    events
        .create_general_logic(&GeneralLogic {
            id: foraging_logic,
            event_id: foraging,
            story_text: vec![para("Pale flowers catch the light in a small clearing.")],
        })
        .await?;
    events
        .create_event_result(&EventResult {
            id: ResultId::new(),
            logic_id: foraging_logic,
            name: "gather herbs".to_owned(),
            conditions: Vec::new(),
            priority: 0,
            status_effects: Vec::new(),
            story_text: vec![para("You fill your satchel.")],
            reward_pool_id: Some(herb_pool),
        })
        .await?;

    // A wolf ambush in the Duskwood.
    let ambush = EventId::new();
    events
        .create_event(&Event {
            id: ambush,
            name: "Wolf Ambush".to_owned(),
            kind: EventKind::Battle,
            description: None,
        })
        .await?;
    events
        .create_battle_logic(&BattleLogic {
            id: LogicId::new(),
            event_id: ambush,
            story_text: vec![para("Yellow eyes glint between the trees.")],
            monster_pool_id: wolf_pack,
            reward_pool_id: Some(wolf_loot),
        })
        .await?;

    // ---------------------------------------------------------------
    // Associations
    // ---------------------------------------------------------------

    associations
        .upsert(questline_db::EventSite::Map(village), merchant, 1.0)
        .await?;
    associations
        .upsert(questline_db::EventSite::Map(duskwood), foraging, 2.0)
        .await?;
    associations
        .upsert(questline_db::EventSite::Map(duskwood), ambush, 3.0)
        .await?;
    associations
        .upsert(questline_db::EventSite::Area(forest_path), ambush, 1.0)
        .await?;

    // ---------------------------------------------------------------
    // Starter template
    // ---------------------------------------------------------------

    let starter_template = TemplateId::new();
    players
        .create_template(&CharTemplate {
            id: starter_template,
            name: "Village Recruit".to_owned(),
            base_hp: 100,
            base_mp: 20,
            base_atk: 10,
            base_spd: 10,
            base_def: 8,
        })
        .await?;

    tracing::info!(
        village = %village,
        duskwood = %duskwood,
        emberpeak = %emberpeak,
        "starting world seeded"
    );

    Ok(StartingWorldIds {
        village,
        village_square,
        duskwood,
        emberpeak,
        starter_template,
    })
}
