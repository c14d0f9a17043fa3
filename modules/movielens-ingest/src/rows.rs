//! Raw CSV row shapes and their conversion into validated records.
//!
//! Every cell is read as text so that a malformed number surfaces as a
//! per-row `ValidationError` instead of a deserialization failure.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use movielens_common::{
    parse_epoch_field, parse_field, parse_genres, Movie, Rating, Tag, ValidationError,
};

/// A CSV row type that knows its required header columns and how to become a record.
pub trait CsvRow: DeserializeOwned {
    type Record;

    /// Record kind used in log lines.
    const KIND: &'static str;

    /// Header names that must be present.
    const COLUMNS: &'static [&'static str];

    fn into_record(self) -> Result<Self::Record, ValidationError>;
}

/// `ratings.csv`: `userId,movieId,rating,timestamp` (timestamp in epoch seconds).
#[derive(Debug, Clone, Deserialize)]
pub struct RatingRow {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "movieId")]
    pub movie_id: String,
    pub rating: String,
    pub timestamp: String,
}

impl CsvRow for RatingRow {
    type Record = Rating;
    const KIND: &'static str = "rating";
    const COLUMNS: &'static [&'static str] = &["userId", "movieId", "rating", "timestamp"];

    fn into_record(self) -> Result<Rating, ValidationError> {
        Rating::from_fields(
            parse_field(&self.user_id),
            parse_field(&self.movie_id),
            parse_field(&self.rating),
            parse_epoch_field(&self.timestamp),
        )
    }
}

/// `movies.csv`: `movieId,title,genres` (genres pipe-delimited).
#[derive(Debug, Clone, Deserialize)]
pub struct MovieRow {
    #[serde(rename = "movieId")]
    pub movie_id: String,
    pub title: String,
    pub genres: String,
}

impl CsvRow for MovieRow {
    type Record = Movie;
    const KIND: &'static str = "movie";
    const COLUMNS: &'static [&'static str] = &["movieId", "title", "genres"];

    fn into_record(self) -> Result<Movie, ValidationError> {
        Movie::from_fields(
            parse_field(&self.movie_id),
            Ok(self.title),
            parse_genres(&self.genres),
        )
    }
}

/// `tags.csv`: `userId,movieId,tag,timestamp`.
#[derive(Debug, Clone, Deserialize)]
pub struct TagRow {
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "movieId")]
    pub movie_id: String,
    pub tag: String,
    pub timestamp: String,
}

impl CsvRow for TagRow {
    type Record = Tag;
    const KIND: &'static str = "tag";
    const COLUMNS: &'static [&'static str] = &["userId", "movieId", "tag", "timestamp"];

    fn into_record(self) -> Result<Tag, ValidationError> {
        Tag::from_fields(
            parse_field(&self.user_id),
            parse_field(&self.movie_id),
            Ok(self.tag),
            parse_epoch_field(&self.timestamp),
        )
    }
}
