//! Reward and monster pool persistence.
//!
//! Both pool families share the weighted-candidate shape the draw engine
//! consumes: a composite-keyed entry row carrying a draw weight. The store
//! returns entries as-is; drawing a winner is the engine's job.

use sqlx::PgPool;
use uuid::Uuid;

use questline_types::{
    ItemId, Monster, MonsterId, MonsterPool, MonsterPoolEntry, MonsterPoolId, RewardPool,
    RewardPoolId, RewardPoolItem,
};

use crate::error::StoreError;

#[derive(sqlx::FromRow)]
struct MonsterRow {
    id: Uuid,
    name: String,
    hp: i32,
    mp: i32,
    atk: i32,
    spd: i32,
    defense: i32,
    drop_pool_id: Option<Uuid>,
}

impl From<MonsterRow> for Monster {
    fn from(row: MonsterRow) -> Self {
        Self {
            id: row.id.into(),
            name: row.name,
            hp: row.hp,
            mp: row.mp,
            atk: row.atk,
            spd: row.spd,
            defense: row.defense,
            drop_pool_id: row.drop_pool_id.map(Into::into),
        }
    }
}

/// Operations on the reward- and monster-pool tables.
pub struct PoolStore<'a> {
    pool: &'a PgPool,
}

impl<'a> PoolStore<'a> {
    /// Create a pool store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------
    // Reward pools
    // -----------------------------------------------------------------

    /// Insert a reward pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the insert fails.
    pub async fn create_reward_pool(&self, pool: &RewardPool) -> Result<(), StoreError> {
        sqlx::query(r"INSERT INTO reward_pools (id, name) VALUES ($1, $2)")
            .bind(pool.id.into_inner())
            .bind(&pool.name)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Delete a reward pool and its entries. Returns `false` when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the delete fails (e.g. the pool is
    /// still referenced by an event result).
    pub async fn delete_reward_pool(&self, id: RewardPoolId) -> Result<bool, StoreError> {
        let result = sqlx::query(r"DELETE FROM reward_pools WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert or reweight an item entry in a reward pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the pool does not exist.
    pub async fn upsert_reward_item(
        &self,
        pool: RewardPoolId,
        item: ItemId,
        probability: f64,
    ) -> Result<(), StoreError> {
        if !self.reward_pool_exists(pool).await? {
            return Err(StoreError::not_found("reward pool", pool));
        }

        sqlx::query(
            r"INSERT INTO reward_pool_items (pool_id, item_id, probability)
              VALUES ($1, $2, $3)
              ON CONFLICT (pool_id, item_id) DO UPDATE SET probability = EXCLUDED.probability",
        )
        .bind(pool.into_inner())
        .bind(item.into_inner())
        .bind(probability)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Remove an item entry from a reward pool. No-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the delete fails.
    pub async fn remove_reward_item(
        &self,
        pool: RewardPoolId,
        item: ItemId,
    ) -> Result<(), StoreError> {
        sqlx::query(r"DELETE FROM reward_pool_items WHERE pool_id = $1 AND item_id = $2")
            .bind(pool.into_inner())
            .bind(item.into_inner())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// All weighted item entries of a reward pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn reward_items(&self, pool: RewardPoolId) -> Result<Vec<RewardPoolItem>, StoreError> {
        let rows: Vec<(Uuid, f64)> = sqlx::query_as(
            r"SELECT item_id, probability FROM reward_pool_items
              WHERE pool_id = $1 ORDER BY item_id",
        )
        .bind(pool.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(item_id, probability)| RewardPoolItem {
                pool_id: pool,
                item_id: item_id.into(),
                probability,
            })
            .collect())
    }

    // -----------------------------------------------------------------
    // Monsters and monster pools
    // -----------------------------------------------------------------

    /// Insert a monster.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the insert fails.
    pub async fn create_monster(&self, monster: &Monster) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO monsters (id, name, hp, mp, atk, spd, defense, drop_pool_id)
              VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(monster.id.into_inner())
        .bind(&monster.name)
        .bind(monster.hp)
        .bind(monster.mp)
        .bind(monster.atk)
        .bind(monster.spd)
        .bind(monster.defense)
        .bind(monster.drop_pool_id.map(RewardPoolId::into_inner))
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Fetch a monster by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn get_monster(&self, id: MonsterId) -> Result<Option<Monster>, StoreError> {
        let row = sqlx::query_as::<_, MonsterRow>(
            r"SELECT id, name, hp, mp, atk, spd, defense, drop_pool_id
              FROM monsters WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Monster::from))
    }

    /// Insert a monster pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the insert fails.
    pub async fn create_monster_pool(&self, pool: &MonsterPool) -> Result<(), StoreError> {
        sqlx::query(r"INSERT INTO monster_pools (id, name) VALUES ($1, $2)")
            .bind(pool.id.into_inner())
            .bind(&pool.name)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Insert or reweight a monster entry in a monster pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the pool or monster does not
    /// exist.
    pub async fn upsert_monster_entry(
        &self,
        pool: MonsterPoolId,
        monster: MonsterId,
        probability: f64,
    ) -> Result<(), StoreError> {
        let pool_row: Option<(Uuid,)> =
            sqlx::query_as(r"SELECT id FROM monster_pools WHERE id = $1")
                .bind(pool.into_inner())
                .fetch_optional(self.pool)
                .await?;
        if pool_row.is_none() {
            return Err(StoreError::not_found("monster pool", pool));
        }
        if self.get_monster(monster).await?.is_none() {
            return Err(StoreError::not_found("monster", monster));
        }

        sqlx::query(
            r"INSERT INTO monster_pool_entries (pool_id, monster_id, probability)
              VALUES ($1, $2, $3)
              ON CONFLICT (pool_id, monster_id) DO UPDATE SET probability = EXCLUDED.probability",
        )
        .bind(pool.into_inner())
        .bind(monster.into_inner())
        .bind(probability)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// All weighted monster entries of a monster pool.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn monster_entries(
        &self,
        pool: MonsterPoolId,
    ) -> Result<Vec<MonsterPoolEntry>, StoreError> {
        let rows: Vec<(Uuid, f64)> = sqlx::query_as(
            r"SELECT monster_id, probability FROM monster_pool_entries
              WHERE pool_id = $1 ORDER BY monster_id",
        )
        .bind(pool.into_inner())
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(monster_id, probability)| MonsterPoolEntry {
                pool_id: pool,
                monster_id: monster_id.into(),
                probability,
            })
            .collect())
    }

    async fn reward_pool_exists(&self, id: RewardPoolId) -> Result<bool, StoreError> {
        let row: Option<(Uuid,)> = sqlx::query_as(r"SELECT id FROM reward_pools WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.is_some())
    }
}
