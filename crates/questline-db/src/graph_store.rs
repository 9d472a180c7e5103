//! World-graph persistence: maps, sub-areas, and gated connections.
//!
//! Connections are undirected edges stored once per unordered pair. The
//! canonical order (lower UUID first) turns "no duplicate or reversed
//! duplicate edges" into a plain primary-key constraint checked at write
//! time, and spares every adjacency read an OR over both directions of a
//! doubled edge table.

use sqlx::PgPool;
use uuid::Uuid;

use questline_types::{Map, MapArea, MapConnection, MapId, NpcSeed, PageDirection};

use crate::error::StoreError;

/// One page of a keyset-paginated map listing.
#[derive(Debug, Clone)]
pub struct MapPage {
    /// The maps on this page, in ascending id order.
    pub items: Vec<Map>,
    /// Cursor for the following page, if any rows were returned.
    pub next_cursor: Option<MapId>,
    /// Cursor for the preceding page, if any rows were returned.
    pub prev_cursor: Option<MapId>,
    /// Whether more rows exist beyond this page in the fetch direction.
    pub has_more: bool,
}

#[derive(sqlx::FromRow)]
struct MapRow {
    id: Uuid,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
}

impl From<MapRow> for Map {
    fn from(row: MapRow) -> Self {
        Self {
            id: MapId::from(row.id),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AreaRow {
    id: Uuid,
    map_id: Uuid,
    name: String,
    description: Option<String>,
    image_url: Option<String>,
    init_npcs: serde_json::Value,
}

impl TryFrom<AreaRow> for MapArea {
    type Error = StoreError;

    fn try_from(row: AreaRow) -> Result<Self, StoreError> {
        let init_npcs: Vec<NpcSeed> = serde_json::from_value(row.init_npcs)?;
        Ok(Self {
            id: row.id.into(),
            map_id: row.map_id.into(),
            name: row.name,
            description: row.description,
            image_url: row.image_url,
            init_npcs,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ConnectionRow {
    map_a: Uuid,
    map_b: Uuid,
    is_locked: bool,
    required_item: Option<String>,
    required_level: i32,
}

impl From<ConnectionRow> for MapConnection {
    fn from(row: ConnectionRow) -> Self {
        Self {
            map_a: row.map_a.into(),
            map_b: row.map_b.into(),
            is_locked: row.is_locked,
            required_item: row.required_item,
            required_level: u32::try_from(row.required_level).unwrap_or(0),
        }
    }
}

/// Order an endpoint pair canonically, lower UUID first.
const fn ordered_pair(a: MapId, b: MapId) -> (Uuid, Uuid) {
    let (x, y) = (a.into_inner(), b.into_inner());
    // Uuid and PostgreSQL both compare UUIDs bytewise, so the canonical
    // order agrees between application and CHECK constraint.
    if x.as_u128() < y.as_u128() { (x, y) } else { (y, x) }
}

/// Operations on the `maps`, `map_areas`, and `map_connections` tables.
pub struct GraphStore<'a> {
    pool: &'a PgPool,
}

impl<'a> GraphStore<'a> {
    /// Create a graph store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    // -----------------------------------------------------------------
    // Maps
    // -----------------------------------------------------------------

    /// Insert a map node.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the insert fails.
    pub async fn create_map(&self, map: &Map) -> Result<(), StoreError> {
        sqlx::query(
            r"INSERT INTO maps (id, name, description, image_url)
              VALUES ($1, $2, $3, $4)",
        )
        .bind(map.id.into_inner())
        .bind(&map.name)
        .bind(&map.description)
        .bind(&map.image_url)
        .execute(self.pool)
        .await?;

        tracing::debug!(map = %map.id, name = map.name, "created map");
        Ok(())
    }

    /// Fetch a map by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn get_map(&self, id: MapId) -> Result<Option<Map>, StoreError> {
        let row = sqlx::query_as::<_, MapRow>(
            r"SELECT id, name, description, image_url FROM maps WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Map::from))
    }

    /// Update a map's basic fields; `None` leaves a field unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the map does not exist.
    pub async fn update_map_basic(
        &self,
        id: MapId,
        name: Option<&str>,
        description: Option<&str>,
        image_url: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"UPDATE maps SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                image_url = COALESCE($4, image_url)
              WHERE id = $1",
        )
        .bind(id.into_inner())
        .bind(name)
        .bind(description)
        .bind(image_url)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("map", id));
        }
        Ok(())
    }

    /// Delete a map.
    ///
    /// Cascades to its areas, event associations, connections, and progress
    /// rows. Returns `false` when the map was already absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the delete fails.
    pub async fn delete_map(&self, id: MapId) -> Result<bool, StoreError> {
        let result = sqlx::query(r"DELETE FROM maps WHERE id = $1")
            .bind(id.into_inner())
            .execute(self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::debug!(map = %id, "deleted map");
        }
        Ok(deleted)
    }

    /// List maps with keyset pagination.
    ///
    /// `Next` fetches rows after the cursor in ascending id order; `Prev`
    /// fetches rows before it and returns them re-ascended. One extra row
    /// is fetched to learn whether more pages exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn list_maps(
        &self,
        cursor: Option<MapId>,
        limit: u32,
        direction: PageDirection,
    ) -> Result<MapPage, StoreError> {
        let probe = i64::from(limit).saturating_add(1);
        let cursor_raw = cursor.map(MapId::into_inner);

        let sql = match direction {
            PageDirection::Next => {
                r"SELECT id, name, description, image_url FROM maps
                  WHERE $1::UUID IS NULL OR id > $1
                  ORDER BY id ASC LIMIT $2"
            }
            PageDirection::Prev => {
                r"SELECT id, name, description, image_url FROM maps
                  WHERE $1::UUID IS NULL OR id < $1
                  ORDER BY id DESC LIMIT $2"
            }
        };

        let mut rows = sqlx::query_as::<_, MapRow>(sql)
            .bind(cursor_raw)
            .bind(probe)
            .fetch_all(self.pool)
            .await?;

        let page_len = usize::try_from(limit).unwrap_or(usize::MAX);
        let has_more = rows.len() > page_len;
        if has_more {
            rows.truncate(page_len);
        }

        let mut items: Vec<Map> = rows.into_iter().map(Map::from).collect();
        if direction == PageDirection::Prev {
            items.reverse();
        }

        Ok(MapPage {
            next_cursor: items.last().map(|m| m.id),
            prev_cursor: items.first().map(|m| m.id),
            has_more,
            items,
        })
    }

    // -----------------------------------------------------------------
    // Areas
    // -----------------------------------------------------------------

    /// Insert a sub-area under an existing map.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the owning map does not exist.
    pub async fn create_area(&self, area: &MapArea) -> Result<(), StoreError> {
        if !self.map_exists(area.map_id).await? {
            return Err(StoreError::not_found("map", area.map_id));
        }

        sqlx::query(
            r"INSERT INTO map_areas (id, map_id, name, description, image_url, init_npcs)
              VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(area.id.into_inner())
        .bind(area.map_id.into_inner())
        .bind(&area.name)
        .bind(&area.description)
        .bind(&area.image_url)
        .bind(serde_json::to_value(&area.init_npcs)?)
        .execute(self.pool)
        .await?;

        tracing::debug!(area = %area.id, map = %area.map_id, "created area");
        Ok(())
    }

    /// Fetch an area by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails, or
    /// [`StoreError::Serialization`] if the NPC payload is corrupt.
    pub async fn get_area(
        &self,
        id: questline_types::AreaId,
    ) -> Result<Option<MapArea>, StoreError> {
        let row = sqlx::query_as::<_, AreaRow>(
            r"SELECT id, map_id, name, description, image_url, init_npcs
              FROM map_areas WHERE id = $1",
        )
        .bind(id.into_inner())
        .fetch_optional(self.pool)
        .await?;

        row.map(MapArea::try_from).transpose()
    }

    /// All areas owned by a map, in id order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn areas_of_map(&self, map: MapId) -> Result<Vec<MapArea>, StoreError> {
        let rows = sqlx::query_as::<_, AreaRow>(
            r"SELECT id, map_id, name, description, image_url, init_npcs
              FROM map_areas WHERE map_id = $1 ORDER BY id",
        )
        .bind(map.into_inner())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(MapArea::try_from).collect()
    }

    // -----------------------------------------------------------------
    // Connections
    // -----------------------------------------------------------------

    /// Insert or update the undirected edge between two maps.
    ///
    /// The pair is normalized before the write, so `(a, b)` and `(b, a)`
    /// address the same stored edge. When the edge already exists its
    /// gating fields are updated in place.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SelfLoop`] when both endpoints are the same
    /// map and [`StoreError::NotFound`] when either endpoint is missing.
    pub async fn upsert_connection(
        &self,
        a: MapId,
        b: MapId,
        is_locked: bool,
        required_item: Option<&str>,
        required_level: u32,
    ) -> Result<(), StoreError> {
        if a == b {
            return Err(StoreError::SelfLoop(a));
        }
        for endpoint in [a, b] {
            if !self.map_exists(endpoint).await? {
                return Err(StoreError::not_found("map", endpoint));
            }
        }

        let (lo, hi) = ordered_pair(a, b);
        sqlx::query(
            r"INSERT INTO map_connections (map_a, map_b, is_locked, required_item, required_level)
              VALUES ($1, $2, $3, $4, $5)
              ON CONFLICT (map_a, map_b) DO UPDATE SET
                is_locked = EXCLUDED.is_locked,
                required_item = EXCLUDED.required_item,
                required_level = EXCLUDED.required_level",
        )
        .bind(lo)
        .bind(hi)
        .bind(is_locked)
        .bind(required_item)
        .bind(i32::try_from(required_level).unwrap_or(i32::MAX))
        .execute(self.pool)
        .await?;

        tracing::debug!(map_a = %lo, map_b = %hi, is_locked, "upserted connection");
        Ok(())
    }

    /// Remove the edge between two maps. No-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the delete fails.
    pub async fn remove_connection(&self, a: MapId, b: MapId) -> Result<(), StoreError> {
        let (lo, hi) = ordered_pair(a, b);
        sqlx::query(r"DELETE FROM map_connections WHERE map_a = $1 AND map_b = $2")
            .bind(lo)
            .bind(hi)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Fetch the stored edge between two maps, in either argument order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn get_connection(
        &self,
        a: MapId,
        b: MapId,
    ) -> Result<Option<MapConnection>, StoreError> {
        let (lo, hi) = ordered_pair(a, b);
        let row = sqlx::query_as::<_, ConnectionRow>(
            r"SELECT map_a, map_b, is_locked, required_item, required_level
              FROM map_connections WHERE map_a = $1 AND map_b = $2",
        )
        .bind(lo)
        .bind(hi)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(MapConnection::from))
    }

    /// Maps reachable from `map` via exactly one edge, in either endpoint
    /// role. One-hop adjacency, not pathfinding.
    ///
    /// With `include_locked` false, edges whose lock flag is set are
    /// excluded; whether the player satisfies an unlocked edge's item and
    /// level gates is the movement validator's concern, not this query's.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the query fails.
    pub async fn neighbors(
        &self,
        map: MapId,
        include_locked: bool,
    ) -> Result<Vec<Map>, StoreError> {
        let rows = sqlx::query_as::<_, MapRow>(
            r"SELECT m.id, m.name, m.description, m.image_url
              FROM map_connections c
              JOIN maps m
                ON m.id = CASE WHEN c.map_a = $1 THEN c.map_b ELSE c.map_a END
              WHERE (c.map_a = $1 OR c.map_b = $1)
                AND ($2 OR NOT c.is_locked)
              ORDER BY m.id",
        )
        .bind(map.into_inner())
        .bind(include_locked)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Map::from).collect())
    }

    async fn map_exists(&self, id: MapId) -> Result<bool, StoreError> {
        let row: Option<(Uuid,)> = sqlx::query_as(r"SELECT id FROM maps WHERE id = $1")
            .bind(id.into_inner())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_ordering_is_symmetric() {
        let a = MapId::new();
        let b = MapId::new();
        assert_eq!(ordered_pair(a, b), ordered_pair(b, a));
    }

    #[test]
    fn pair_ordering_puts_lower_first() {
        let a = MapId::new();
        let b = MapId::new();
        let (lo, hi) = ordered_pair(a, b);
        assert!(lo.as_u128() < hi.as_u128());
    }
}
