pub mod client;
pub mod error;
pub mod migrate;
pub mod reader;
pub mod writer;

#[cfg(feature = "test-utils")]
pub mod testutil;

pub use client::GraphClient;
pub use error::GraphError;
pub use neo4rs::query;
pub use reader::{GraphReader, NodeLabel, RelType};
pub use writer::{GraphLoader, LoadSession};
