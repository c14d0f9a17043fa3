use neo4rs::query;
use tracing::info;

use crate::error::{GraphError, Result};
use crate::GraphClient;

/// Uniqueness constraints on natural identifiers.
pub const CONSTRAINTS: [&str; 2] = [
    "CREATE CONSTRAINT user_id IF NOT EXISTS FOR (u:User) REQUIRE u.id IS UNIQUE",
    "CREATE CONSTRAINT movie_id IF NOT EXISTS FOR (m:Movie) REQUIRE m.id IS UNIQUE",
];

/// Secondary indexes for lookup by name.
pub const INDEXES: [&str; 1] = ["CREATE INDEX movie_title IF NOT EXISTS FOR (m:Movie) ON (m.title)"];

/// Run idempotent schema migrations: constraints, indexes.
/// Safe to re-run against an already-initialized database.
pub async fn migrate(client: &GraphClient) -> Result<()> {
    let g = &client.graph;

    info!("Running schema migrations...");

    for statement in CONSTRAINTS {
        g.run(query(statement))
            .await
            .map_err(|source| GraphError::SchemaSetup { statement, source })?;
    }
    info!("Uniqueness constraints created");

    for statement in INDEXES {
        g.run(query(statement))
            .await
            .map_err(|source| GraphError::SchemaSetup { statement, source })?;
    }
    info!("Property indexes created");

    Ok(())
}
