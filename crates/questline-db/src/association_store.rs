//! Weighted event associations for maps and areas.
//!
//! Both tiers share one shape: a composite-keyed join row carrying a
//! floating-point draw weight. [`EventSite`] lets one API address either
//! tier; the two tables stay separate so each cascades from its own
//! location row.

use sqlx::PgPool;
use uuid::Uuid;

use questline_types::{AreaId, EventId, EventKind, MapId};

use crate::error::StoreError;

/// A location that can carry an event pool: a map or one of its areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSite {
    /// The map-level pool.
    Map(MapId),
    /// An area-level pool.
    Area(AreaId),
}

impl EventSite {
    const fn table(self) -> &'static str {
        match self {
            Self::Map(_) => "map_event_associations",
            Self::Area(_) => "area_event_associations",
        }
    }

    const fn key_column(self) -> &'static str {
        match self {
            Self::Map(_) => "map_id",
            Self::Area(_) => "area_id",
        }
    }

    const fn id(self) -> Uuid {
        match self {
            Self::Map(id) => id.into_inner(),
            Self::Area(id) => id.into_inner(),
        }
    }

    const fn entity(self) -> &'static str {
        match self {
            Self::Map(_) => "map",
            Self::Area(_) => "area",
        }
    }

    const fn site_table(self) -> &'static str {
        match self {
            Self::Map(_) => "maps",
            Self::Area(_) => "map_areas",
        }
    }
}

/// One candidate in a location's draw pool.
#[derive(Debug, Clone, PartialEq)]
pub struct EventCandidate {
    /// The associated event.
    pub event_id: EventId,
    /// The event's display name.
    pub name: String,
    /// The event's kind tag, resolved at load time.
    pub kind: EventKind,
    /// Draw weight of this candidate at this location.
    pub probability: f64,
}

#[derive(sqlx::FromRow)]
struct CandidateRow {
    event_id: Uuid,
    name: String,
    kind: String,
    probability: f64,
}

impl TryFrom<CandidateRow> for EventCandidate {
    type Error = StoreError;

    fn try_from(row: CandidateRow) -> Result<Self, StoreError> {
        let kind = EventKind::from_db_str(&row.kind)
            .ok_or_else(|| StoreError::UnknownEventKind(row.kind.clone()))?;
        Ok(Self {
            event_id: row.event_id.into(),
            name: row.name,
            kind,
            probability: row.probability,
        })
    }
}

/// Operations on the map- and area-level event association tables.
pub struct AssociationStore<'a> {
    pool: &'a PgPool,
}

impl<'a> AssociationStore<'a> {
    /// Create an association store bound to a connection pool.
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert or replace the weight of an (site, event) association.
    ///
    /// Idempotent: a second upsert for the same pair replaces the weight.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the site or the event does not
    /// exist.
    pub async fn upsert(
        &self,
        site: EventSite,
        event: EventId,
        probability: f64,
    ) -> Result<(), StoreError> {
        self.ensure_site_exists(site).await?;
        if !self.event_exists(event).await? {
            return Err(StoreError::not_found("event", event));
        }

        let sql = format!(
            "INSERT INTO {table} ({key}, event_id, probability)
             VALUES ($1, $2, $3)
             ON CONFLICT ({key}, event_id) DO UPDATE SET probability = EXCLUDED.probability",
            table = site.table(),
            key = site.key_column(),
        );
        sqlx::query(&sql)
            .bind(site.id())
            .bind(event.into_inner())
            .bind(probability)
            .execute(self.pool)
            .await?;

        tracing::debug!(site = %site.id(), event = %event, probability, "upserted association");
        Ok(())
    }

    /// Remove an association. No-op when absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the delete fails.
    pub async fn remove(&self, site: EventSite, event: EventId) -> Result<(), StoreError> {
        let sql = format!(
            "DELETE FROM {table} WHERE {key} = $1 AND event_id = $2",
            table = site.table(),
            key = site.key_column(),
        );
        sqlx::query(&sql)
            .bind(site.id())
            .bind(event.into_inner())
            .execute(self.pool)
            .await?;
        Ok(())
    }

    /// Rescale every weight at the site so they sum to 1.0.
    ///
    /// Runs in one transaction so a concurrent reader never observes a
    /// half-rescaled pool. Returns `false` without touching anything when
    /// the current sum is zero or negative -- an empty or all-zero pool is
    /// a valid authoring state, not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Sqlx`] if the transaction fails.
    pub async fn normalize(&self, site: EventSite) -> Result<bool, StoreError> {
        let mut tx = self.pool.begin().await?;

        let sum_sql = format!(
            "SELECT COALESCE(SUM(probability), 0) FROM {table} WHERE {key} = $1",
            table = site.table(),
            key = site.key_column(),
        );
        let (total,): (f64,) = sqlx::query_as(&sum_sql)
            .bind(site.id())
            .fetch_one(&mut *tx)
            .await?;

        if !(total > 0.0) {
            return Ok(false);
        }

        let scale_sql = format!(
            "UPDATE {table} SET probability = probability / $2 WHERE {key} = $1",
            table = site.table(),
            key = site.key_column(),
        );
        sqlx::query(&scale_sql)
            .bind(site.id())
            .bind(total)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(site = %site.id(), total, "normalized association weights");
        Ok(true)
    }

    /// The full (event, weight) pool at a site, unfiltered.
    ///
    /// Eligibility filtering against player state belongs to the caller;
    /// this returns every association including zero-weight ones.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::UnknownEventKind`] if a stored row carries a
    /// kind tag this build does not recognize.
    pub async fn candidates(&self, site: EventSite) -> Result<Vec<EventCandidate>, StoreError> {
        let sql = format!(
            "SELECT a.event_id, e.name, e.kind, a.probability
             FROM {table} a
             JOIN events e ON e.id = a.event_id
             WHERE a.{key} = $1
             ORDER BY a.event_id",
            table = site.table(),
            key = site.key_column(),
        );
        let rows = sqlx::query_as::<_, CandidateRow>(&sql)
            .bind(site.id())
            .fetch_all(self.pool)
            .await?;

        rows.into_iter().map(EventCandidate::try_from).collect()
    }

    async fn ensure_site_exists(&self, site: EventSite) -> Result<(), StoreError> {
        let sql = format!("SELECT id FROM {} WHERE id = $1", site.site_table());
        let row: Option<(Uuid,)> = sqlx::query_as(&sql)
            .bind(site.id())
            .fetch_optional(self.pool)
            .await?;
        if row.is_none() {
            return Err(StoreError::NotFound {
                entity: site.entity(),
                id: site.id(),
            });
        }
        Ok(())
    }

    async fn event_exists(&self, event: EventId) -> Result<bool, StoreError> {
        let row: Option<(Uuid,)> = sqlx::query_as(r"SELECT id FROM events WHERE id = $1")
            .bind(event.into_inner())
            .fetch_optional(self.pool)
            .await?;
        Ok(row.is_some())
    }
}
