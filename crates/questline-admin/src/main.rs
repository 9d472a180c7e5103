//! Administrative binary for the Questline data layer.
//!
//! Connects to `PostgreSQL`, applies pending schema migrations, and
//! optionally seeds the default starting world. Intended for local
//! development bring-up and deployment hooks; the data layer itself is
//! a library and has no server loop here.
//!
//! # Startup Sequence
//!
//! 1. Initialize structured logging (tracing)
//! 2. Load configuration from `questline.yaml`
//! 3. Connect to the database
//! 4. Apply pending migrations
//! 5. Seed the starting world if enabled
//! 6. Log a world summary

mod config;
mod seed;

use std::path::Path;

use questline_db::{Db, DbConfig, GraphStore, PlayerStore};
use questline_types::{PageDirection, Player, PlayerId};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AdminConfig;

/// Application entry point for the admin tool.
///
/// # Errors
///
/// Returns an error if configuration loading, the database connection,
/// migrations, or seeding fails.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("questline-admin starting");

    // 2. Load configuration.
    let config = AdminConfig::load(Path::new("questline.yaml"))?;
    info!(
        max_connections = config.database.max_connections,
        seed_enabled = config.seed.enabled,
        "Configuration loaded"
    );

    // 3. Connect to the database.
    let db_config =
        DbConfig::new(&config.database.url).with_max_connections(config.database.max_connections);
    let db = Db::connect(&db_config).await?;
    info!("Database connection established");

    // 4. Apply pending migrations.
    db.run_migrations().await?;
    info!("Schema migrations applied");

    // 5. Seed the starting world if enabled.
    if config.seed.enabled {
        let ids = seed::seed_starting_world(&db).await?;
        info!(
            starting_map = %ids.village,
            starting_area = %ids.village_square,
            starter_template = %ids.starter_template,
            "Starting world seeded"
        );

        // A smoke-test player placed at the starting position, with one
        // starter character fielded as the team lead.
        let players = PlayerStore::new(db.pool());
        let player = Player {
            id: PlayerId::new(),
            money: 100,
            current_map: Some(ids.village),
            current_area: Some(ids.village_square),
        };
        players.create_player(&player).await?;
        let starter = players
            .create_char_from_template(player.id, ids.starter_template)
            .await?;
        players.set_team(player.id, &[starter.id]).await?;
        info!(player = %player.id, char = %starter.id, "Smoke-test player created");
    }

    // 6. Log a world summary.
    let graph = GraphStore::new(db.pool());
    let page = graph.list_maps(None, 50, PageDirection::Next).await?;
    info!(map_count = page.items.len(), "questline-admin done");
    for m in &page.items {
        let neighbors = graph.neighbors(m.id, true).await?;
        info!(map = %m.id, name = m.name, degree = neighbors.len(), "map");
    }

    Ok(())
}
