//! Event draw orchestration for Questline.
//!
//! This crate owns the one operation in the data layer that needs explicit
//! mutual exclusion: drawing an event for a player. Everything else it
//! exposes -- adjacency queries, roster replacement, the authoring
//! mutations -- is a re-export of the store APIs, so callers wire one
//! crate.
//!
//! External collaborators plug in at two seams: a
//! [`questline_core::ConditionEvaluator`] filters event-result branches
//! against player state, and the combat resolver consumes the
//! [`BattleSetup`] a battle draw produces.

pub mod encounter;
pub mod error;

pub use encounter::{BattleSetup, Encounter, EncounterEngine, Resolution};
pub use error::EngineError;

// The exposed operation surface beyond drawing: graph and association
// authoring, neighbor queries, and roster management.
pub use questline_core::ConditionEvaluator;
pub use questline_db::{
    AssociationStore, Db, DbConfig, EventSite, EventStore, GraphStore, PlayerStore, PoolStore,
    StoreError,
};
