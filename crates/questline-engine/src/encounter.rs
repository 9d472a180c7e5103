//! The event draw orchestrator.
//!
//! Composes position lookup, the association index, and the weighted draw
//! engine to answer "what does this player encounter now". The whole draw
//! runs while holding an exclusive lock on the player's per-map progress
//! row, so two concurrent draws for the same player and map serialize: the
//! second blocks until the first commits and then observes its progress.
//! Any failure after the lock is acquired drops the transaction, which
//! rolls back every mutation including the lock itself.

use rand::Rng;

use questline_core::{ConditionEvaluator, Weighted, choose, choose_index, select_result};
use questline_db::{AssociationStore, Db, EventSite, EventStore, PlayerStore, PoolStore, StoreError};
use questline_types::{
    EffectDelta, EventId, EventKind, ItemId, Monster, MonsterId, PlayerId, RewardPoolId,
    StoryParagraph,
};

use crate::error::EngineError;

/// The outcome of one event draw.
#[derive(Debug, Clone)]
pub enum Encounter {
    /// A general event, resolved through its logic and result branches.
    Resolved(Resolution),
    /// A battle event; combat itself is the external resolver's job.
    Battle(BattleSetup),
}

/// Resolution context for a general (non-battle) event.
#[derive(Debug, Clone)]
pub struct Resolution {
    /// The drawn event.
    pub event_id: EventId,
    /// Its kind tag.
    pub kind: EventKind,
    /// Story text from the event's general logic.
    pub story_text: Vec<StoryParagraph>,
    /// Name of the selected result branch, if one passed its conditions.
    pub result_name: Option<String>,
    /// Outcome text of the selected branch.
    pub result_story: Vec<StoryParagraph>,
    /// Status-effect deltas applied to the team lead.
    pub effects: Vec<EffectDelta>,
    /// Item drawn from the branch's reward pool, if any.
    pub reward: Option<ItemId>,
}

/// Everything the external combat resolver needs to start a battle.
#[derive(Debug, Clone)]
pub struct BattleSetup {
    /// The drawn event.
    pub event_id: EventId,
    /// Intro story text from the battle logic.
    pub story_text: Vec<StoryParagraph>,
    /// The monster drawn from the battle's monster pool.
    pub monster: Monster,
    /// Pool rewarded on victory, if any.
    pub reward_pool_id: Option<RewardPoolId>,
}

/// Orchestrates event draws against the shared database handle.
pub struct EncounterEngine<'a> {
    db: &'a Db,
}

impl<'a> EncounterEngine<'a> {
    /// Create an engine bound to a database handle.
    pub const fn new(db: &'a Db) -> Self {
        Self { db }
    }

    /// Draw and resolve one event for a player at their current position.
    ///
    /// The candidate pool is the union of the current map's and current
    /// area's event associations; an event associated with both
    /// contributes both weights. Eligibility filtering happened upstream
    /// (the pools are taken as stored); result-branch conditions are
    /// checked through `evaluator`.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Store`] wrapping `NotFound` when the player does
    ///   not exist
    /// - [`EngineError::PositionUnset`] when map or area is unset
    /// - [`EngineError::NoCandidates`] when the pool union is empty or
    ///   zero-weighted -- "nothing to encounter", not a fault
    /// - [`EngineError::InvalidWeight`] on a negative stored weight
    /// - [`EngineError::MissingLogic`] when the drawn event lacks the
    ///   logic record its kind requires
    pub async fn draw_event<E, R>(
        &self,
        player_id: PlayerId,
        evaluator: &E,
        rng: &mut R,
    ) -> Result<Encounter, EngineError>
    where
        E: ConditionEvaluator,
        R: Rng,
    {
        let pool = self.db.pool();
        let players = PlayerStore::new(pool);

        // 1. Resolve the player's position.
        let player = players
            .get_player(player_id)
            .await?
            .ok_or_else(|| questline_db::StoreError::not_found("player", player_id))?;
        let (map, area) = match (player.current_map, player.current_area) {
            (Some(map), Some(area)) => (map, area),
            _ => return Err(EngineError::PositionUnset(player_id)),
        };

        // 2. Serialize against concurrent draws for this player and map.
        let mut tx = self.db.begin().await?;
        let progress = PlayerStore::lock_progress(&mut tx, player_id, map).await?;
        tracing::debug!(player = %player_id, map = %map, progress = progress.progress, "locked progress row");

        // 3-5. Union the two pools and draw.
        let associations = AssociationStore::new(pool);
        let mut candidates = associations.candidates(EventSite::Map(map)).await?;
        candidates.extend(associations.candidates(EventSite::Area(area)).await?);
        if candidates.is_empty() {
            return Err(EngineError::NoCandidates);
        }

        let weighted: Vec<Weighted<usize>> = candidates
            .iter()
            .enumerate()
            .map(|(idx, c)| Weighted::new(idx, c.probability))
            .collect();
        let winner_idx = choose_index(rng, &weighted)?;
        let winner = candidates
            .get(winner_idx)
            .ok_or(EngineError::NoCandidates)?;

        tracing::debug!(player = %player_id, event = %winner.event_id, kind = %winner.kind, "drew event");

        // 6-7. Dispatch on the kind tag and commit.
        let encounter = match winner.kind {
            EventKind::Battle => {
                let setup = self.battle_setup(winner.event_id, rng).await?;
                Encounter::Battle(setup)
            }
            EventKind::Normal | EventKind::Special => {
                let resolution = self
                    .resolve_general(&mut tx, player_id, winner.event_id, winner.kind, evaluator, rng)
                    .await?;
                Encounter::Resolved(resolution)
            }
        };

        PlayerStore::advance_progress(&mut tx, player_id, map, 1, None).await?;
        tx.commit().await.map_err(StoreError::from)?;

        Ok(encounter)
    }

    /// Resolve a general event: pick the result branch, apply its effects
    /// to the team lead, and draw its reward if it carries a pool.
    async fn resolve_general<E, R>(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        player_id: PlayerId,
        event_id: EventId,
        kind: EventKind,
        evaluator: &E,
        rng: &mut R,
    ) -> Result<Resolution, EngineError>
    where
        E: ConditionEvaluator,
        R: Rng,
    {
        let pool = self.db.pool();
        let events = EventStore::new(pool);

        let logic = events
            .general_logic_for_event(event_id)
            .await?
            .ok_or(EngineError::MissingLogic(event_id))?;
        let results = events.results_for_logic(logic.id).await?;
        let chosen = select_result(&results, evaluator);

        let mut resolution = Resolution {
            event_id,
            kind,
            story_text: logic.story_text,
            result_name: None,
            result_story: Vec::new(),
            effects: Vec::new(),
            reward: None,
        };

        let Some(result) = chosen else {
            return Ok(resolution);
        };
        resolution.result_name = Some(result.name.clone());
        resolution.result_story = result.story_text.clone();
        resolution.effects = result.status_effects.clone();

        // Effects land on the team lead; with an empty roster they are
        // returned in the resolution but applied to no one.
        if !result.status_effects.is_empty() {
            let team = PlayerStore::new(pool).team_of(player_id).await?;
            if let Some(lead) = team.first() {
                PlayerStore::apply_status_effects(tx, lead.char_id, &result.status_effects)
                    .await?;
            }
        }

        if let Some(reward_pool) = result.reward_pool_id {
            resolution.reward = self.draw_reward(reward_pool, rng).await?;
        }

        Ok(resolution)
    }

    /// Draw one item from a reward pool. An empty or zero-weight pool
    /// grants nothing rather than failing the whole encounter.
    async fn draw_reward<R: Rng>(
        &self,
        pool_id: RewardPoolId,
        rng: &mut R,
    ) -> Result<Option<ItemId>, EngineError> {
        let items = PoolStore::new(self.db.pool()).reward_items(pool_id).await?;
        let weighted: Vec<Weighted<ItemId>> = items
            .into_iter()
            .map(|i| Weighted::new(i.item_id, i.probability))
            .collect();

        match choose(rng, &weighted) {
            Ok(item) => Ok(Some(*item)),
            Err(questline_core::DrawError::NoCandidates) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Build the battle setup for the external combat resolver: load the
    /// battle logic and draw the opposing monster from its pool.
    async fn battle_setup<R: Rng>(
        &self,
        event_id: EventId,
        rng: &mut R,
    ) -> Result<BattleSetup, EngineError> {
        let pool = self.db.pool();
        let logic = EventStore::new(pool)
            .battle_logic_for_event(event_id)
            .await?
            .ok_or(EngineError::MissingLogic(event_id))?;

        let pools = PoolStore::new(pool);
        let entries = pools.monster_entries(logic.monster_pool_id).await?;
        let weighted: Vec<Weighted<MonsterId>> = entries
            .into_iter()
            .map(|e| Weighted::new(e.monster_id, e.probability))
            .collect();
        let monster_id = *choose(rng, &weighted)?;
        let monster = pools
            .get_monster(monster_id)
            .await?
            .ok_or_else(|| questline_db::StoreError::not_found("monster", monster_id))?;

        Ok(BattleSetup {
            event_id,
            story_text: logic.story_text,
            monster,
            reward_pool_id: logic.reward_pool_id,
        })
    }
}
