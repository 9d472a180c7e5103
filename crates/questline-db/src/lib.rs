//! `PostgreSQL` persistence layer for the Questline game data.
//!
//! One ACID relational store holds the world graph, weighted event
//! associations, event logic, pools, and player state. Each aggregate has
//! its own store type bound to a shared [`sqlx::PgPool`]; nothing here is
//! a process-wide singleton -- callers construct a [`Db`] and hand it (or
//! a transaction begun from it) to every operation explicitly.
//!
//! # Modules
//!
//! - [`postgres`] -- connection pool, configuration, migrations
//! - [`graph_store`] -- maps, areas, gated connections, adjacency
//! - [`association_store`] -- weighted (location, event) pools
//! - [`event_store`] -- events, logic records, result branches
//! - [`pool_store`] -- reward and monster pools
//! - [`player_store`] -- players, characters, rosters, progress locks
//! - [`error`] -- shared error taxonomy

pub mod association_store;
pub mod error;
pub mod event_store;
pub mod graph_store;
pub mod player_store;
pub mod pool_store;
pub mod postgres;

// Re-export primary types for convenience.
pub use association_store::{AssociationStore, EventCandidate, EventSite};
pub use error::StoreError;
pub use event_store::EventStore;
pub use graph_store::{GraphStore, MapPage};
pub use player_store::PlayerStore;
pub use pool_store::PoolStore;
pub use postgres::{Db, DbConfig};
