//! Event persistence: events, their general/battle logic, and result
//! branches.
//!
//! Structured payloads (story paragraphs, condition lists, status-effect
//! deltas) cross the storage boundary as JSONB and are deserialized into
//! their typed forms on every load; nothing downstream ever sees the
//! serialized representation.

use sqlx::PgPool;
use uuid::Uuid;

use questline_types::{
    BattleLogic, ConditionEntry, EffectDelta, Event, EventId, EventKind, EventResult,
    GeneralLogic, LogicId, ResultId, StoryParagraph,
};

use crate::error::StoreError;

#[derive(sqlx::FromRow)]
struct EventRow {
    id: Uuid,
    name: String,
    kind: String,
    description: Option<String>,
}

impl TryFrom<EventRow> for Event {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, StoreError> {
        let kind = EventKind::from_db_str(&row.kind)
            .ok_or_else(|| StoreError::UnknownEventKind(row.kind.clone()))?;
        Ok(Self {
            id: row.id.into(),
            name: row.name,
            kind,
            description: row.description,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LogicRow {
    id: Uuid,
    event_id: Uuid,
    story_text: serde_json::Value,
}

impl TryFrom<LogicRow> for GeneralLogic {
    type Error = StoreError;

    fn try_from(row: LogicRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.id.into(),
            event_id: row.event_id.into(),
            story_text: serde_json::from_value(row.story_text)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct BattleRow {
    id: Uuid,
    event_id: Uuid,
    story_text: serde_json::Value,
    monster_pool_id: Uuid,
    reward_pool_id: Option<Uuid>,
}

impl TryFrom<BattleRow> for BattleLogic {
    type Error = StoreError;

    fn try_from(row: BattleRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.id.into(),
            event_id: row.event_id.into(),
            story_text: serde_json::from_value(row.story_text)?,
            monster_pool_id: row.monster_pool_id.into(),
            reward_pool_id: row.reward_pool_id.map(Into::into),
        })
    }
}

#[derive(sqlx::FromRow)]
struct ResultRow {
    id: Uuid,
    logic_id: Uuid,
    name: String,
    conditions: serde_json::Value,
    priority: i32,
    status_effects: serde_json::Value,
    story_text: serde_json::Value,
    reward_pool_id: Option<Uuid>,
}

impl TryFrom<ResultRow> for EventResult {
    type Error = StoreError;

    fn try_from(row: ResultRow) -> Result<Self, StoreError> {
        Ok(Self {
            id: row.id.into(),
            logic_id: row.logic_id.into(),
            name: row.name,
            conditions: serde_json::from_value(row.conditions)?,
            priority: row.priority,
            status_effects: serde_json::from_value(row.status_effects)?,
            story_text: serde_json::from_value(row.story_text)?,
            reward_pool_id: row.reward_pool_id.map(Into::into),
        })
    }
}

/// Operations on the `events`, `general_event_logic`, `battle_event_logic`,
/// and `event_results` tables.
pub struct EventStore<'a> {
    pool: &'a PgPool,
}

impl<'a> EventStore<'a> {
    /// Create an event store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------
    // Events
    // -----------------------------------------------------------------

    /// Insert an event.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the insert fails.
    pub async fn create_event(&self, event: &Event) -> Result<(), StoreError> {
        sqlx::query(r"INSERT INTO events (id, name, kind, description) VALUES ($1, $2, $3, $4)")
            .bind(event.id.into_inner())
            .bind(&event.name)
            .bind(event.kind.as_db_str())
            .bind(&event.description)
            .execute(self.pool)
            .await?;

        tracing::debug!(event = %event.id, kind = %event.kind, "created event");
        Ok(())
    }

    /// Fetch an event by id, its kind tag resolved to [`EventKind`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownEventKind`] for an unrecognized tag.
    pub async fn get_event(&self, id: EventId) -> Result<Option<Event>, StoreError> {
        let row = sqlx::query_as::<_, EventRow>(
            r"SELECT id, name, kind, description FROM events WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    /// Update an event's name and description; `None` leaves a field
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event does not exist.
    pub async fn update_event(
        &self,
        id: EventId,
        name: Option<&str>,
        description: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE events SET
                name = COALESCE($2, name),
                description = COALESCE($3, description)
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .bind(name)
        .bind(description)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("event", id));
        }
        Ok(())
    }

    /// Delete an event and everything hanging off it.
    ///
    /// One transaction removes the event (map/area associations, general
    /// logic, that logic's results, and battle logic cascade from it) and
    /// then the reward pools those results exclusively owned, so no
    /// association or orphan pool survives. Returns `false` when the event
    /// was already absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if any statement fails; the
    /// transaction rolls back and nothing is deleted.
    pub async fn delete_event(&self, id: EventId) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let owned_pools: Vec<(Uuid,)> = sqlx::query_as(
            r"SELECT er.reward_pool_id
              FROM event_results er
              JOIN general_event_logic gl ON gl.id = er.logic_id
              WHERE gl.event_id = $1 AND er.reward_pool_id IS NOT NULL",
        )
        .bind(id.into_inner())
        .fetch_all(&mut *tx)
        .await?;

        let result = sqlx::query(r"DELETE FROM events WHERE id = $1")
            .bind(id.into_inner())
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if !owned_pools.is_empty() {
            let pool_ids: Vec<Uuid> = owned_pools.into_iter().map(|(p,)| p).collect();
            sqlx::query(r"DELETE FROM reward_pools WHERE id = ANY($1)")
                .bind(&pool_ids)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!(event = %id, "deleted event with cascade");
        Ok(true)
    }

    // -----------------------------------------------------------------
    // General logic
    // -----------------------------------------------------------------

    /// Attach a general logic record to an event (one per event).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event does not exist and
    /// [`StoreError::Sqlx`] if the event already has a logic record.
    pub async fn create_general_logic(&self, logic: &GeneralLogic) -> Result<(), StoreError> {
        if self.get_event(logic.event_id).await?.is_none() {
            return Err(StoreError::not_found("event", logic.event_id));
        }

        sqlx::query(
            r"INSERT INTO general_event_logic (id, event_id, story_text) VALUES ($1, $2, $3)",
        )
        .bind(logic.id.into_inner())
        .bind(logic.event_id.into_inner())
        .bind(serde_json::to_value(&logic.story_text)?)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the general logic attached to an event, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the story payload is
    /// corrupt.
    pub async fn general_logic_for_event(
        &self,
        event: EventId,
    ) -> Result<Option<GeneralLogic>, StoreError> {
        let row = sqlx::query_as::<_, LogicRow>(
            r"SELECT id, event_id, story_text FROM general_event_logic WHERE event_id = $1",
        )
        .bind(event.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(GeneralLogic::try_from).transpose()
    }

    /// Replace a logic record's story text.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the logic record does not
    /// exist.
    pub async fn set_logic_story(
        &self,
        logic: LogicId,
        story: &[StoryParagraph],
    ) -> Result<(), StoreError> {
        let result =
            sqlx::query(r"UPDATE general_event_logic SET story_text = $2 WHERE id = $1")
                .bind(logic.into_inner())
                .bind(serde_json::to_value(story)?)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("general logic", logic));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Battle logic
    // -----------------------------------------------------------------

    /// Attach a battle logic record to an event (one per event).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the event does not exist.
    pub async fn create_battle_logic(&self, logic: &BattleLogic) -> Result<(), StoreError> {
        if self.get_event(logic.event_id).await?.is_none() {
            return Err(StoreError::not_found("event", logic.event_id));
        }

        sqlx::query(
            r"INSERT INTO battle_event_logic
                (id, event_id, story_text, monster_pool_id, reward_pool_id)
              VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(logic.id.into_inner())
        .bind(logic.event_id.into_inner())
        .bind(serde_json::to_value(&logic.story_text)?)
        .bind(logic.monster_pool_id.into_inner())
        .bind(logic.reward_pool_id.map(questline_types::RewardPoolId::into_inner))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Fetch the battle logic attached to an event, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the story payload is
    /// corrupt.
    pub async fn battle_logic_for_event(
        &self,
        event: EventId,
    ) -> Result<Option<BattleLogic>, StoreError> {
        let row = sqlx::query_as::<_, BattleRow>(
            r"SELECT id, event_id, story_text, monster_pool_id, reward_pool_id
              FROM battle_event_logic WHERE event_id = $1",
        )
        .bind(event.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(BattleLogic::try_from).transpose()
    }

    // -----------------------------------------------------------------
    // Event results
    // -----------------------------------------------------------------

    /// Insert a resolution branch under a logic record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the logic record does not
    /// exist.
    pub async fn create_event_result(&self, result: &EventResult) -> Result<(), StoreError> {
        let logic: Option<(Uuid,)> =
            sqlx::query_as(r"SELECT id FROM general_event_logic WHERE id = $1")
                .bind(result.logic_id.into_inner())
                .fetch_optional(self.pool)
                .await?;
        if logic.is_none() {
            return Err(StoreError::not_found("general logic", result.logic_id));
        }

        sqlx::query(
            r"INSERT INTO event_results
                (id, logic_id, name, conditions, priority, status_effects, story_text, reward_pool_id)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(result.id.into_inner())
        .bind(result.logic_id.into_inner())
        .bind(&result.name)
        .bind(serde_json::to_value(&result.conditions)?)
        .bind(result.priority)
        .bind(serde_json::to_value(&result.status_effects)?)
        .bind(serde_json::to_value(&result.story_text)?)
        .bind(result.reward_pool_id.map(questline_types::RewardPoolId::into_inner))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Patch a resolution branch; `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the result does not exist.
    pub async fn update_event_result(
        &self,
        id: ResultId,
        priority: Option<i32>,
        conditions: Option<&[ConditionEntry]>,
        status_effects: Option<&[EffectDelta]>,
        story: Option<&[StoryParagraph]>,
    ) -> Result<(), StoreError> {
        let conditions = conditions.map(serde_json::to_value).transpose()?;
        let status_effects = status_effects.map(serde_json::to_value).transpose()?;
        let story = story.map(serde_json::to_value).transpose()?;

        let result = sqlx::query(
            r"UPDATE event_results SET
                priority = COALESCE($2, priority),
                conditions = COALESCE($3, conditions),
                status_effects = COALESCE($4, status_effects),
                story_text = COALESCE($5, story_text)
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .bind(priority)
        .bind(conditions)
        .bind(status_effects)
        .bind(story)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("event result", id));
        }
        Ok(())
    }

    /// All resolution branches of a logic record.
    ///
    /// Ordered by priority descending, then id ascending. The engine's
    /// tie-break ("first stored branch wins on equal priority") depends on
    /// this ordering being stable across reads.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if a structured payload is
    /// corrupt.
    pub async fn results_for_logic(&self, logic: LogicId) -> Result<Vec<EventResult>, StoreError> {
        let rows = sqlx::query_as::<_, ResultRow>(
            r"SELECT id, logic_id, name, conditions, priority, status_effects, story_text, reward_pool_id
              FROM event_results
              WHERE logic_id = $1
              ORDER BY priority DESC, id ASC",
        )
        .bind(logic.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(EventResult::try_from).collect()
    }
}
