#![cfg(feature = "test-utils")]

// Graph loader integration tests.
//
// These tests verify schema setup, movie/genre merges and rating edge
// creation against a real Neo4j.
//
// Requirements: Docker (for Neo4j via testcontainers)
//
// Run with: cargo test -p movielens-graph --features test-utils --test loader_test

use chrono::{DateTime, Utc};
use movielens_common::{Movie, Rating};
use movielens_graph::migrate::migrate;
use movielens_graph::{
    query, GraphClient, GraphError, GraphLoader, GraphReader, NodeLabel, RelType,
};

async fn setup() -> (impl std::any::Any, GraphLoader, GraphReader) {
    let (container, client) = movielens_graph::testutil::neo4j_container().await;
    let reader = GraphReader::new(client.clone());
    let loader = GraphLoader::new(client)
        .await
        .expect("schema setup should succeed");
    (container, loader, reader)
}

fn at(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

fn movie(id: i64, title: &str, genres: &[&str]) -> Movie {
    Movie::new(id, title, genres.iter().map(|g| g.to_string()).collect()).unwrap()
}

fn rating(user: i64, movie: i64, score: f64, secs: i64) -> Rating {
    Rating::new(user, movie, score, at(secs)).unwrap()
}

async fn schema_names(client: &GraphClient, cypher: &str) -> Vec<String> {
    let mut stream = client
        .inner()
        .execute(query(cypher))
        .await
        .unwrap();
    let mut names = Vec::new();
    while let Some(row) = stream.next().await.unwrap() {
        names.push(row.get::<String>("name").unwrap());
    }
    names
}

#[tokio::test]
async fn schema_setup_is_idempotent() {
    let (_container, loader, _reader) = setup().await;

    migrate(loader.client()).await.expect("second migration");
    migrate(loader.client()).await.expect("third migration");

    let constraints = schema_names(loader.client(), "SHOW CONSTRAINTS YIELD name RETURN name").await;
    assert!(constraints.contains(&"user_id".to_string()));
    assert!(constraints.contains(&"movie_id".to_string()));

    let indexes = schema_names(loader.client(), "SHOW INDEXES YIELD name RETURN name").await;
    assert!(indexes.contains(&"movie_title".to_string()));
}

#[tokio::test]
async fn rejected_credentials_are_a_connection_error() {
    let (_container, uri) = movielens_graph::testutil::neo4j_uri().await;

    match GraphClient::connect(&uri, "neo4j", "wrong-password").await {
        Err(GraphError::Connection { uri: failed, .. }) => assert_eq!(failed, uri),
        Err(other) => panic!("expected Connection error, got {other}"),
        Ok(_) => panic!("connect should fail with bad credentials"),
    }
}

#[tokio::test]
async fn movie_batches_merge_by_id() {
    let (_container, loader, reader) = setup().await;
    let batch = vec![
        movie(1, "Finding Nimo", &["Action", "Comedy"]),
        movie(2, "Finding Asoom", &["Drama", "Comedy"]),
        movie(3, "Blank Slate", &[]),
    ];

    loader.load_movies(&batch).await.unwrap();
    loader.load_movies(&batch).await.unwrap();

    assert_eq!(reader.count_nodes(NodeLabel::Movie).await.unwrap(), 3);
    assert_eq!(reader.count_nodes(NodeLabel::Genre).await.unwrap(), 3);
    assert_eq!(reader.count_relationships(RelType::HasGenre).await.unwrap(), 4);
    assert_eq!(
        reader.genres_of(1).await.unwrap(),
        vec!["Action".to_string(), "Comedy".to_string()]
    );
    assert!(reader.genres_of(3).await.unwrap().is_empty());
}

#[tokio::test]
async fn reloading_a_movie_overwrites_its_title() {
    let (_container, loader, reader) = setup().await;

    loader.load_movies(&[movie(7, "Old Title", &["Drama"])]).await.unwrap();
    loader.load_movies(&[movie(7, "New Title", &["Drama"])]).await.unwrap();

    assert_eq!(reader.count_nodes(NodeLabel::Movie).await.unwrap(), 1);
    assert_eq!(reader.movie_title(7).await.unwrap().as_deref(), Some("New Title"));
}

#[tokio::test]
async fn rating_batches_create_parallel_edges_on_reload() {
    let (_container, loader, reader) = setup().await;
    loader
        .load_movies(&[movie(1, "Finding Nimo", &["Action"])])
        .await
        .unwrap();
    let batch = vec![rating(1, 1, 4.0, 1_400_000_000), rating(2, 1, 5.0, 1_500_000_000)];

    loader.load_ratings(&batch).await.unwrap();
    assert_eq!(reader.count_rated(1, 1).await.unwrap(), 1);

    loader.load_ratings(&batch).await.unwrap();
    assert_eq!(reader.count_rated(1, 1).await.unwrap(), 2);
    assert_eq!(reader.count_relationships(RelType::Rated).await.unwrap(), 4);
    assert_eq!(reader.count_nodes(NodeLabel::User).await.unwrap(), 2);
    assert_eq!(reader.count_nodes(NodeLabel::Movie).await.unwrap(), 1);
}

#[tokio::test]
async fn ratings_create_stub_movies_when_missing() {
    let (_container, loader, reader) = setup().await;

    loader
        .load_ratings(&[rating(5, 99, 3.5, 1_400_000_000)])
        .await
        .unwrap();

    assert_eq!(reader.count_nodes(NodeLabel::Movie).await.unwrap(), 1);
    assert_eq!(reader.movie_title(99).await.unwrap(), None);

    // Loading the catalog afterwards fills in the stub rather than duplicating it.
    loader
        .load_movies(&[movie(99, "Late Arrival", &["Horror"])])
        .await
        .unwrap();
    assert_eq!(reader.count_nodes(NodeLabel::Movie).await.unwrap(), 1);
    assert_eq!(reader.movie_title(99).await.unwrap().as_deref(), Some("Late Arrival"));
}

#[tokio::test]
async fn rating_edges_carry_score_and_timestamp() {
    let (_container, loader, _reader) = setup().await;
    loader
        .load_ratings(&[rating(1, 1, 4.5, 1_400_000_000)])
        .await
        .unwrap();

    let mut stream = loader
        .client()
        .inner()
        .execute(query(
            "MATCH (:User {id: 1})-[r:RATED]->(:Movie {id: 1})
             RETURN r.rating AS rating, r.timestamp.epochSeconds AS secs",
        ))
        .await
        .unwrap();
    let row = stream.next().await.unwrap().expect("rated edge");
    assert_eq!(row.get::<f64>("rating").unwrap(), 4.5);
    assert_eq!(row.get::<i64>("secs").unwrap(), 1_400_000_000);
}

#[tokio::test]
async fn rolled_back_session_writes_nothing() {
    let (_container, loader, reader) = setup().await;

    let mut session = loader.session().await.unwrap();
    loader
        .create_movie(&[movie(1, "Never Saved", &["Drama"])], &mut session)
        .await
        .unwrap();
    session.rollback().await.unwrap();

    assert_eq!(reader.count_nodes(NodeLabel::Movie).await.unwrap(), 0);
    assert_eq!(reader.count_nodes(NodeLabel::Genre).await.unwrap(), 0);
}

#[tokio::test]
async fn empty_batches_are_no_ops() {
    let (_container, loader, reader) = setup().await;

    loader.load_movies(&[]).await.unwrap();
    loader.load_ratings(&[]).await.unwrap();

    assert_eq!(reader.count_nodes(NodeLabel::Movie).await.unwrap(), 0);
    assert_eq!(reader.count_nodes(NodeLabel::User).await.unwrap(), 0);
}
