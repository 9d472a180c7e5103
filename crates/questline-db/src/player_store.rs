//! Player persistence: game state, owned characters, the active team
//! roster, and per-map progress.
//!
//! Roster replacement is all-or-nothing: validation happens before any
//! row is touched, and the clear-then-repopulate runs in one transaction.
//! Progress rows are the serialization point for event draws -- the
//! orchestrator locks one for the duration of a draw, so the lock helpers
//! here operate on a caller-owned transaction rather than the pool.

use std::collections::BTreeMap;

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use questline_types::{
    CharId, CharTemplate, EffectDelta, MapId, MapProgress, Player, PlayerChar, PlayerId,
    TEAM_CAPACITY, TeamMember, TemplateId,
};

use crate::error::StoreError;

#[derive(sqlx::FromRow)]
struct PlayerRow {
    id: Uuid,
    money: i64,
    current_map: Option<Uuid>,
    current_area: Option<Uuid>,
}

impl From<PlayerRow> for Player {
    fn from(row: PlayerRow) -> Self {
        Self {
            id: row.id.into(),
            money: row.money,
            current_map: row.current_map.map(Into::into),
            current_area: row.current_area.map(Into::into),
        }
    }
}

#[derive(sqlx::FromRow)]
struct CharRow {
    id: Uuid,
    player_id: Uuid,
    template_id: Uuid,
    level: i32,
    exp: i64,
    hp: i32,
    mp: i32,
    atk: i32,
    spd: i32,
    defense: i32,
    status_effects: serde_json::Value,
    is_locked: bool,
}

impl TryFrom<CharRow> for PlayerChar {
    type Error = StoreError;

    fn try_from(row: CharRow) -> Result<Self, StoreError> {
        let status_effects: BTreeMap<String, i64> = serde_json::from_value(row.status_effects)?;
        Ok(Self {
            id: row.id.into(),
            player_id: row.player_id.into(),
            template_id: row.template_id.into(),
            level: row.level,
            exp: row.exp,
            hp: row.hp,
            mp: row.mp,
            atk: row.atk,
            spd: row.spd,
            defense: row.defense,
            status_effects,
            is_locked: row.is_locked,
        })
    }
}

#[derive(sqlx::FromRow)]
struct TemplateRow {
    id: Uuid,
    name: String,
    base_hp: i32,
    base_mp: i32,
    base_atk: i32,
    base_spd: i32,
    base_def: i32,
}

impl From<TemplateRow> for CharTemplate {
    fn from(row: TemplateRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            base_hp: row.base_hp,
            base_mp: row.base_mp,
            base_atk: row.base_atk,
            base_spd: row.base_spd,
            base_def: row.base_def,
        }
    }
}

/// Operations on the player, character, team, and progress tables.
pub struct PlayerStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PlayerStore<'a> {
    /// Create a player store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------
    // Players
    // -----------------------------------------------------------------

    /// Insert a player's game state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the insert fails.
    pub async fn create_player(&self, player: &Player) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO players (id, money, current_map, current_area)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(player.id.into_inner())
        .bind(player.money)
        .bind(player.current_map.map(MapId::into_inner))
        .bind(player.current_area.map(questline_types::AreaId::into_inner))
        .execute(self.pool)
        .await?;

        tracing::debug!(player = %player.id, "created player");
        Ok(())
    }

    /// Fetch a player's game state.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn get_player(&self, id: PlayerId) -> Result<Option<Player>, StoreError> {
        let row = sqlx::query_as::<_, PlayerRow>(
            r"SELECT id, money, current_map, current_area FROM players WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Player::from))
    }

    /// Move the player to a new map and area.
    ///
    /// Whether the move is legal (adjacency, gates) is validated by the
    /// movement collaborator before this is called.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the player does not exist.
    pub async fn set_position(
        &self,
        player: PlayerId,
        map: MapId,
        area: questline_types::AreaId,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE players SET current_map = $2, current_area = $3 WHERE id = $1",
        )
        .bind(player.into_inner())
        .bind(map.into_inner())
        .bind(area.into_inner())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("player", player));
        }
        Ok(())
    }

    // -----------------------------------------------------------------
    // Templates and characters
    // -----------------------------------------------------------------

    /// Insert a character template.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the insert fails.
    pub async fn create_template(&self, template: &CharTemplate) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO char_templates (id, name, base_hp, base_mp, base_atk, base_spd, base_def)
              VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(template.id.into_inner())
        .bind(&template.name)
        .bind(template.base_hp)
        .bind(template.base_mp)
        .bind(template.base_atk)
        .bind(template.base_spd)
        .bind(template.base_def)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Instantiate a character for a player from a template.
    ///
    /// Base stats are copied from the template at level 1 with no status
    /// effects, per the character/template contract.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the template or player does not
    /// exist.
    pub async fn create_char_from_template(
        &self,
        player: PlayerId,
        template_id: TemplateId,
    ) -> Result<PlayerChar, StoreError> {
        let template: Option<TemplateRow> = sqlx::query_as(
            r"SELECT id, name, base_hp, base_mp, base_atk, base_spd, base_def
              FROM char_templates WHERE id = $1",
        )
        .bind(template_id.into_inner())
        .fetch_optional(self.pool)
        .await?;
        let template =
            CharTemplate::from(template.ok_or_else(|| StoreError::not_found("template", template_id))?);

        if self.get_player(player).await?.is_none() {
            return Err(StoreError::not_found("player", player));
        }

        let character = PlayerChar {
            id: CharId::new(),
            player_id: player,
            template_id,
            level: 1,
            exp: 0,
            hp: template.base_hp,
            mp: template.base_mp,
            atk: template.base_atk,
            spd: template.base_spd,
            defense: template.base_def,
            status_effects: BTreeMap::new(),
            is_locked: false,
        };

        sqlx::query(
            r"INSERT INTO player_chars
                (id, player_id, template_id, level, exp, hp, mp, atk, spd, defense, status_effects, is_locked)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(character.id.into_inner())
        .bind(character.player_id.into_inner())
        .bind(character.template_id.into_inner())
        .bind(character.level)
        .bind(character.exp)
        .bind(character.hp)
        .bind(character.mp)
        .bind(character.atk)
        .bind(character.spd)
        .bind(character.defense)
        .bind(serde_json::to_value(&character.status_effects)?)
        .bind(character.is_locked)
        .execute(self.pool)
        .await?;

        tracing::debug!(char = %character.id, player = %player, "instantiated character");
        Ok(character)
    }

    /// Fetch a character by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Serialization`] if the status-effect payload
    /// is corrupt.
    pub async fn get_char(&self, id: CharId) -> Result<Option<PlayerChar>, StoreError> {
        let row = sqlx::query_as::<_, CharRow>(
            r"SELECT id, player_id, template_id, level, exp, hp, mp, atk, spd, defense, status_effects, is_locked
              FROM player_chars WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(PlayerChar::try_from).transpose()
    }

    /// All characters owned by a player, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn owned_chars(&self, player: PlayerId) -> Result<Vec<PlayerChar>, StoreError> {
        let rows = sqlx::query_as::<_, CharRow>(
            r"SELECT id, player_id, template_id, level, exp, hp, mp, atk, spd, defense, status_effects, is_locked
              FROM player_chars WHERE player_id = $1 ORDER BY id",
        )
        .bind(player.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(PlayerChar::try_from).collect()
    }

    // -----------------------------------------------------------------
    // Team roster
    // -----------------------------------------------------------------

    /// Replace the player's entire active team in one atomic operation.
    ///
    /// Slot positions are assigned 0..n-1 in input order -- position
    /// encodes turn and display order and is never re-sorted. The previous
    /// roster is discarded wholesale, not merged. An empty list clears the
    /// roster.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::TeamTooLarge`] for more than six entries, or
    /// [`StoreError::CharsNotOwned`] when any entry does not exist or
    /// belongs to another player. Both are checked before any mutation, so
    /// a failed call leaves the prior roster untouched.
    pub async fn set_team(
        &self,
        player: PlayerId,
        ordered_chars: &[CharId],
    ) -> Result<(), StoreError> {
        if ordered_chars.len() > TEAM_CAPACITY {
            return Err(StoreError::TeamTooLarge(ordered_chars.len()));
        }

        if !ordered_chars.is_empty() {
            let ids: Vec<Uuid> = ordered_chars.iter().copied().map(CharId::into_inner).collect();
            let (owned,): (i64,) = sqlx::query_as(
                r"SELECT COUNT(*) FROM player_chars WHERE id = ANY($1) AND player_id = $2",
            )
            .bind(&ids)
            .bind(player.into_inner())
            .fetch_one(self.pool)
            .await?;

            let owned = usize::try_from(owned).unwrap_or(0);
            if owned != ordered_chars.len() {
                return Err(StoreError::CharsNotOwned {
                    requested: ordered_chars.len(),
                    owned,
                });
            }
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query(r"DELETE FROM team_members WHERE player_id = $1")
            .bind(player.into_inner())
            .execute(&mut *tx)
            .await?;

        for (position, char_id) in ordered_chars.iter().enumerate() {
            sqlx::query(
                r"INSERT INTO team_members (player_id, char_id, position) VALUES ($1, $2, $3)",
            )
            .bind(player.into_inner())
            .bind(char_id.into_inner())
            .bind(i16::try_from(position).unwrap_or(i16::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::debug!(player = %player, size = ordered_chars.len(), "replaced team roster");
        Ok(())
    }

    /// The player's active team, ordered by slot position.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn team_of(&self, player: PlayerId) -> Result<Vec<TeamMember>, StoreError> {
        let rows: Vec<(Uuid, Uuid, i16)> = sqlx::query_as(
            r"SELECT player_id, char_id, position FROM team_members
              WHERE player_id = $1 ORDER BY position",
        )
        .bind(player.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(player_id, char_id, position)| TeamMember {
                player_id: player_id.into(),
                char_id: char_id.into(),
                position: u8::try_from(position).unwrap_or(u8::MAX),
            })
            .collect())
    }

    // -----------------------------------------------------------------
    // Transaction-scoped helpers for the draw orchestrator
    // -----------------------------------------------------------------

    /// Lock the (player, map) progress row for the transaction's lifetime,
    /// creating it with zero progress on first visit.
    ///
    /// `SELECT ... FOR UPDATE` serializes concurrent draws for the same
    /// player and map: the second caller blocks here until the first
    /// commits or rolls back.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the insert or locking read fails.
    pub async fn lock_progress(
        tx: &mut Transaction<'_, Postgres>,
        player: PlayerId,
        map: MapId,
    ) -> Result<MapProgress, StoreError> {
        sqlx::query(
            r"INSERT INTO map_progress (player_id, map_id) VALUES ($1, $2)
              ON CONFLICT (player_id, map_id) DO NOTHING",
        )
        .bind(player.into_inner())
        .bind(map.into_inner())
        .execute(&mut **tx)
        .await?;

        let (progress, is_completed): (i32, bool) = sqlx::query_as(
            r"SELECT progress, is_completed FROM map_progress
              WHERE player_id = $1 AND map_id = $2
              FOR UPDATE",
        )
        .bind(player.into_inner())
        .bind(map.into_inner())
        .fetch_one(&mut **tx)
        .await?;

        Ok(MapProgress {
            player_id: player,
            map_id: map,
            progress,
            is_completed,
        })
    }

    /// Advance the locked progress row.
    ///
    /// Must run on the same transaction that holds the lock from
    /// [`Self::lock_progress`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the update fails.
    pub async fn advance_progress(
        tx: &mut Transaction<'_, Postgres>,
        player: PlayerId,
        map: MapId,
        delta: i32,
        completed: Option<bool>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r"UPDATE map_progress SET
                progress = progress + $3,
                is_completed = COALESCE($4, is_completed)
              WHERE player_id = $1 AND map_id = $2",
        )
        .bind(player.into_inner())
        .bind(map.into_inner())
        .bind(delta)
        .bind(completed)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }

    /// Merge status-effect deltas into a character's effect map.
    ///
    /// Runs on the caller's transaction so effect application commits or
    /// rolls back together with the draw that produced it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the character does not exist.
    pub async fn apply_status_effects(
        tx: &mut Transaction<'_, Postgres>,
        char_id: CharId,
        effects: &[EffectDelta],
    ) -> Result<(), StoreError> {
        if effects.is_empty() {
            return Ok(());
        }

        let row: Option<(serde_json::Value,)> = sqlx::query_as(
            r"SELECT status_effects FROM player_chars WHERE id = $1 FOR UPDATE",
        )
        .bind(char_id.into_inner())
        .fetch_optional(&mut **tx)
        .await?;
        let (raw,) = row.ok_or_else(|| StoreError::not_found("character", char_id))?;

        let mut current: BTreeMap<String, i64> = serde_json::from_value(raw)?;
        for delta in effects {
            let merged = current
                .get(&delta.effect)
                .copied()
                .unwrap_or(0)
                .saturating_add(delta.amount);
            current.insert(delta.effect.clone(), merged);
        }

        sqlx::query(r"UPDATE player_chars SET status_effects = $2 WHERE id = $1")
            .bind(char_id.into_inner())
            .bind(serde_json::to_value(&current)?)
            .execute(&mut **tx)
            .await?;
        Ok(())
    }
}
