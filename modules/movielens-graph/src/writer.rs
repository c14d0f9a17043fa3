use chrono::SecondsFormat;
use neo4rs::{query, BoltFloat, BoltInteger, BoltMap, BoltString, BoltType, Txn};
use tracing::{debug, info, warn};

use movielens_common::{Config, Movie, Rating};

use crate::error::{GraphError, Result};
use crate::migrate::migrate;
use crate::GraphClient;

/// Merge movies by id, overwrite titles, and link each genre once.
const MERGE_MOVIES: &str = "UNWIND $movies AS movie
     MERGE (m:Movie {id: movie.movie_id})
     SET m.title = movie.title
     WITH m, movie
     UNWIND movie.genres AS genre
     MERGE (g:Genre {name: genre})
     MERGE (m)-[:HAS_GENRE]->(g)";

/// Merge users and movies by id, then CREATE one RATED edge per row.
///
/// RATED edges are a fact log, not a single mutable opinion: loading the
/// same rows twice produces parallel edges. Movies and genres are merge-only
/// and safe to reload; ratings are not.
const CREATE_RATINGS: &str = "UNWIND $ratings AS rating
     MERGE (u:User {id: rating.user_id})
     MERGE (m:Movie {id: rating.movie_id})
     CREATE (u)-[:RATED {rating: rating.rating, timestamp: datetime(rating.timestamp)}]->(m)";

/// One unit of work against the graph, backed by a transaction.
///
/// Writes become visible only on `commit`. A session that is rolled back or
/// dropped without committing persists nothing.
pub struct LoadSession {
    txn: Txn,
    statements: usize,
}

impl LoadSession {
    async fn run(&mut self, q: neo4rs::Query) -> std::result::Result<(), neo4rs::Error> {
        self.statements += 1;
        self.txn.run(q).await
    }

    pub async fn commit(self) -> Result<()> {
        debug!(statements = self.statements, "Committing session");
        self.txn.commit().await.map_err(GraphError::Session)
    }

    pub async fn rollback(self) -> Result<()> {
        debug!(statements = self.statements, "Rolling back session");
        self.txn.rollback().await.map_err(GraphError::Session)
    }
}

/// Write side of the graph: schema setup at construction, then batch upserts.
pub struct GraphLoader {
    client: GraphClient,
}

impl GraphLoader {
    /// Wrap a connected client and run schema migrations once.
    /// A migration failure is fatal; no loader is returned without constraints in place.
    pub async fn new(client: GraphClient) -> Result<Self> {
        migrate(&client).await?;
        Ok(Self { client })
    }

    /// Connect with the Neo4j settings from `config` and run migrations.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = GraphClient::from_config(config).await?;
        Self::new(client).await
    }

    pub fn client(&self) -> &GraphClient {
        &self.client
    }

    /// Open a scoped session for one batch of writes.
    pub async fn session(&self) -> Result<LoadSession> {
        let txn = self
            .client
            .graph
            .start_txn()
            .await
            .map_err(GraphError::Session)?;
        Ok(LoadSession { txn, statements: 0 })
    }

    /// Upsert a batch of movies and their genres in a single statement.
    pub async fn create_movie(&self, movies: &[Movie], session: &mut LoadSession) -> Result<()> {
        if movies.is_empty() {
            return Ok(());
        }

        let q = query(MERGE_MOVIES).param("movies", movie_params(movies));
        session.run(q).await.map_err(|source| GraphError::Write {
            what: "movie",
            size: movies.len(),
            source,
        })
    }

    /// Create RATED edges for a batch of ratings, merging any missing users or movies.
    pub async fn create_rating(&self, ratings: &[Rating], session: &mut LoadSession) -> Result<()> {
        if ratings.is_empty() {
            return Ok(());
        }

        let q = query(CREATE_RATINGS).param("ratings", rating_params(ratings));
        session.run(q).await.map_err(|source| GraphError::Write {
            what: "rating",
            size: ratings.len(),
            source,
        })
    }

    /// Write one batch of movies in its own session.
    pub async fn load_movies(&self, movies: &[Movie]) -> Result<()> {
        let mut session = self.session().await?;
        let outcome = self.create_movie(movies, &mut session).await;
        finish(session, outcome).await?;
        debug!(count = movies.len(), "Movie batch written");
        Ok(())
    }

    /// Write one batch of ratings in its own session.
    pub async fn load_ratings(&self, ratings: &[Rating]) -> Result<()> {
        let mut session = self.session().await?;
        let outcome = self.create_rating(ratings, &mut session).await;
        finish(session, outcome).await?;
        debug!(count = ratings.len(), "Rating batch written");
        Ok(())
    }

    /// Release the connection pool. Dropping the loader has the same effect.
    pub fn close(self) {
        drop(self.client);
        info!("Neo4j connection closed");
    }
}

/// Commit on success; roll back and keep the original error on failure.
async fn finish(session: LoadSession, outcome: Result<()>) -> Result<()> {
    match outcome {
        Ok(()) => session.commit().await,
        Err(err) => {
            if let Err(rollback_err) = session.rollback().await {
                warn!(error = %rollback_err, "Rollback failed after write error");
            }
            Err(err)
        }
    }
}

// --- Parameter building ---

fn bolt_map<const N: usize>(entries: [(&str, BoltType); N]) -> BoltType {
    BoltType::Map(BoltMap::from_iter(
        entries
            .into_iter()
            .map(|(key, value)| (BoltString::from(key), value)),
    ))
}

fn movie_params(movies: &[Movie]) -> Vec<BoltType> {
    movies
        .iter()
        .map(|movie| {
            bolt_map([
                ("movie_id", BoltType::Integer(BoltInteger::new(movie.movie_id()))),
                ("title", BoltType::String(BoltString::from(movie.title()))),
                ("genres", BoltType::from(movie.genres().to_vec())),
            ])
        })
        .collect()
}

fn rating_params(ratings: &[Rating]) -> Vec<BoltType> {
    ratings
        .iter()
        .map(|rating| {
            bolt_map([
                ("user_id", BoltType::Integer(BoltInteger::new(rating.user_id()))),
                ("movie_id", BoltType::Integer(BoltInteger::new(rating.movie_id()))),
                ("rating", BoltType::Float(BoltFloat::new(rating.rating()))),
                ("timestamp", BoltType::String(BoltString::from(format_timestamp(rating).as_str()))),
            ])
        })
        .collect()
}

fn format_timestamp(rating: &Rating) -> String {
    rating.timestamp().to_rfc3339_opts(SecondsFormat::Secs, true)
}
