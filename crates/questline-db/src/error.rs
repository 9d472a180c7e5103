//! Error types for the persistence layer.
//!
//! Validation errors ([`StoreError::NotFound`], [`StoreError::SelfLoop`],
//! [`StoreError::TeamTooLarge`], [`StoreError::CharsNotOwned`]) are raised
//! before any mutation, so a failed operation never leaves partial state.

use uuid::Uuid;

/// Errors that can occur in the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of the missing entity, e.g. `"map"`.
        entity: &'static str,
        /// The identifier that failed to resolve.
        id: Uuid,
    },

    /// A map connection referenced the same map on both ends.
    #[error("map {0} cannot connect to itself")]
    SelfLoop(questline_types::MapId),

    /// A team replacement listed more than the allowed six characters.
    #[error("team of {0} exceeds the maximum of 6 characters")]
    TeamTooLarge(usize),

    /// A team replacement referenced characters the player does not own.
    #[error("{owned} of {requested} selected characters belong to the player")]
    CharsNotOwned {
        /// How many characters the replacement listed.
        requested: usize,
        /// How many of those are owned by the player and exist.
        owned: usize,
    },

    /// A stored event row carried a kind tag this build does not know.
    #[error("unknown event kind in storage: {0:?}")]
    UnknownEventKind(String),

    /// A `PostgreSQL` operation failed.
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    /// A migration failed to apply.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A structured payload failed to (de)serialize at the storage boundary.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A configuration value could not be parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

impl StoreError {
    /// Shorthand for a [`StoreError::NotFound`] with a typed id.
    pub fn not_found(entity: &'static str, id: impl Into<Uuid>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }
}
