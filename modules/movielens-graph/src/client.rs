use neo4rs::{query, ConfigBuilder, Graph};
use tracing::info;

use movielens_common::Config;

use crate::error::{GraphError, Result};

/// Thin wrapper around neo4rs::Graph providing connection setup.
#[derive(Clone)]
pub struct GraphClient {
    pub(crate) graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given credentials.
    ///
    /// The pool dials lazily, so a trivial query is run here to surface an
    /// unreachable server or rejected credentials as a connection error.
    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let connection_error = |source: neo4rs::Error| GraphError::Connection {
            uri: uri.to_string(),
            source,
        };
        let config = ConfigBuilder::default()
            .uri(uri)
            .user(user)
            .password(password)
            .fetch_size(500)
            .max_connections(10)
            .build()
            .map_err(connection_error)?;
        let graph = Graph::connect(config).await.map_err(connection_error)?;
        graph
            .run(query("RETURN 1"))
            .await
            .map_err(connection_error)?;
        info!(uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Connect using the Neo4j settings from `config`.
    pub async fn from_config(config: &Config) -> Result<Self> {
        Self::connect(&config.neo4j_uri, &config.neo4j_user, &config.neo4j_password).await
    }

    /// Get a reference to the underlying neo4rs Graph.
    pub fn inner(&self) -> &Graph {
        &self.graph
    }
}
