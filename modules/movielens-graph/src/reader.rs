use neo4rs::query;

use crate::error::Result;
use crate::GraphClient;

/// Node labels the loader writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeLabel {
    User,
    Movie,
    Genre,
}

impl NodeLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeLabel::User => "User",
            NodeLabel::Movie => "Movie",
            NodeLabel::Genre => "Genre",
        }
    }
}

/// Read-side queries for summaries and verification.
#[derive(Clone)]
pub struct GraphReader {
    client: GraphClient,
}

impl GraphReader {
    pub fn new(client: GraphClient) -> Self {
        Self { client }
    }

    pub async fn count_nodes(&self, label: NodeLabel) -> Result<i64> {
        let cypher = format!("MATCH (n:{}) RETURN count(n) AS n", label.as_str());
        self.scalar_count(query(&cypher)).await
    }

    pub async fn count_relationships(&self, rel_type: RelType) -> Result<i64> {
        let cypher = format!("MATCH ()-[r:{}]->() RETURN count(r) AS n", rel_type.as_str());
        self.scalar_count(query(&cypher)).await
    }

    /// Number of RATED edges from one user to one movie.
    pub async fn count_rated(&self, user_id: i64, movie_id: i64) -> Result<i64> {
        let q = query(
            "MATCH (:User {id: $user_id})-[r:RATED]->(:Movie {id: $movie_id})
             RETURN count(r) AS n",
        )
        .param("user_id", user_id)
        .param("movie_id", movie_id);
        self.scalar_count(q).await
    }

    /// Genre names linked to a movie, sorted.
    pub async fn genres_of(&self, movie_id: i64) -> Result<Vec<String>> {
        let q = query(
            "MATCH (:Movie {id: $movie_id})-[:HAS_GENRE]->(g:Genre)
             RETURN g.name AS name ORDER BY name",
        )
        .param("movie_id", movie_id);

        let mut stream = self.client.graph.execute(q).await?;
        let mut genres = Vec::new();
        while let Some(row) = stream.next().await? {
            if let Ok(name) = row.get::<String>("name") {
                genres.push(name);
            }
        }
        Ok(genres)
    }

    pub async fn movie_title(&self, movie_id: i64) -> Result<Option<String>> {
        let q = query("MATCH (m:Movie {id: $movie_id}) RETURN m.title AS title")
            .param("movie_id", movie_id);

        let mut stream = self.client.graph.execute(q).await?;
        match stream.next().await? {
            Some(row) => Ok(row.get::<Option<String>>("title").ok().flatten()),
            None => Ok(None),
        }
    }

    async fn scalar_count(&self, q: neo4rs::Query) -> Result<i64> {
        let mut stream = self.client.graph.execute(q).await?;
        if let Some(row) = stream.next().await? {
            return Ok(row.get::<i64>("n").unwrap_or(0));
        }
        Ok(0)
    }
}

/// Relationship types the loader writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelType {
    Rated,
    HasGenre,
}

impl RelType {
    pub fn as_str(self) -> &'static str {
        match self {
            RelType::Rated => "RATED",
            RelType::HasGenre => "HAS_GENRE",
        }
    }
}
