use thiserror::Error;

pub type Result<T> = std::result::Result<T, GraphError>;

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Failed to connect to Neo4j at {uri}: {source}")]
    Connection {
        uri: String,
        #[source]
        source: neo4rs::Error,
    },

    #[error("Schema setup failed on `{statement}`: {source}")]
    SchemaSetup {
        statement: &'static str,
        #[source]
        source: neo4rs::Error,
    },

    #[error("Session error: {0}")]
    Session(#[source] neo4rs::Error),

    #[error("Failed to write {what} batch of {size}: {source}")]
    Write {
        what: &'static str,
        size: usize,
        #[source]
        source: neo4rs::Error,
    },

    #[error("Query failed: {0}")]
    Query(#[from] neo4rs::Error),
}
