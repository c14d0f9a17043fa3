use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::error::{ValidationError, Violation};

pub const RATING_MIN: f64 = 0.5;
pub const RATING_MAX: f64 = 5.0;

/// Genre field value MovieLens uses for movies without any genre.
pub const NO_GENRES_SENTINEL: &str = "(no genres listed)";

/// A raw field that either parsed into `T` or carries the reason it did not.
pub type FieldResult<T> = Result<T, String>;

// --- Records ---

/// One user's score for one movie at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Rating {
    user_id: i64,
    movie_id: i64,
    rating: f64,
    timestamp: DateTime<Utc>,
}

impl Rating {
    pub fn new(
        user_id: i64,
        movie_id: i64,
        rating: f64,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::from_fields(Ok(user_id), Ok(movie_id), Ok(rating), Ok(timestamp))
    }

    /// Build a rating from fields that may already have failed to parse.
    /// Parse failures and constraint failures are reported together.
    pub fn from_fields(
        user_id: FieldResult<i64>,
        movie_id: FieldResult<i64>,
        rating: FieldResult<f64>,
        timestamp: FieldResult<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let mut v = Violations::new("Rating");
        let user_id = v.positive("user_id", user_id);
        let movie_id = v.positive("movie_id", movie_id);
        let rating = v.in_range("rating", rating, RATING_MIN, RATING_MAX);
        let timestamp = v.present("timestamp", timestamp);

        match (user_id, movie_id, rating, timestamp) {
            (Some(user_id), Some(movie_id), Some(rating), Some(timestamp)) => Ok(Self {
                user_id,
                movie_id,
                rating,
                timestamp,
            }),
            _ => Err(v.into_error()),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn movie_id(&self) -> i64 {
        self.movie_id
    }

    pub fn rating(&self) -> f64 {
        self.rating
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// A catalog entry. `genres` keeps source order and is empty for the no-genre sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Movie {
    movie_id: i64,
    title: String,
    genres: Vec<String>,
}

impl Movie {
    pub fn new(
        movie_id: i64,
        title: impl Into<String>,
        genres: Vec<String>,
    ) -> Result<Self, ValidationError> {
        Self::from_fields(Ok(movie_id), Ok(title.into()), Ok(genres))
    }

    pub fn from_fields(
        movie_id: FieldResult<i64>,
        title: FieldResult<String>,
        genres: FieldResult<Vec<String>>,
    ) -> Result<Self, ValidationError> {
        let mut v = Violations::new("Movie");
        let movie_id = v.positive("movie_id", movie_id);
        let title = v.non_empty("title", title);
        let genres = v.present("genres", genres);

        match (movie_id, title, genres) {
            (Some(movie_id), Some(title), Some(genres)) => Ok(Self {
                movie_id,
                title,
                genres,
            }),
            _ => Err(v.into_error()),
        }
    }

    pub fn movie_id(&self) -> i64 {
        self.movie_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn genres(&self) -> &[String] {
        &self.genres
    }
}

/// A user-supplied free-text tag. Readable from `tags.csv`; not written to the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    user_id: i64,
    movie_id: i64,
    tag: String,
    timestamp: DateTime<Utc>,
}

impl Tag {
    pub fn new(
        user_id: i64,
        movie_id: i64,
        tag: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        Self::from_fields(Ok(user_id), Ok(movie_id), Ok(tag.into()), Ok(timestamp))
    }

    pub fn from_fields(
        user_id: FieldResult<i64>,
        movie_id: FieldResult<i64>,
        tag: FieldResult<String>,
        timestamp: FieldResult<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        let mut v = Violations::new("Tag");
        let user_id = v.positive("user_id", user_id);
        let movie_id = v.positive("movie_id", movie_id);
        let tag = v.non_empty("tag", tag);
        let timestamp = v.present("timestamp", timestamp);

        match (user_id, movie_id, tag, timestamp) {
            (Some(user_id), Some(movie_id), Some(tag), Some(timestamp)) => Ok(Self {
                user_id,
                movie_id,
                tag,
                timestamp,
            }),
            _ => Err(v.into_error()),
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn movie_id(&self) -> i64 {
        self.movie_id
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// --- Violation accumulator ---

/// Collects every failed check for one record before deciding whether it is valid.
#[derive(Debug)]
pub struct Violations {
    record: &'static str,
    items: Vec<Violation>,
}

impl Violations {
    pub fn new(record: &'static str) -> Self {
        Self {
            record,
            items: Vec::new(),
        }
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.items.push(Violation {
            field,
            message: message.into(),
        });
    }

    pub fn present<T>(&mut self, field: &'static str, value: FieldResult<T>) -> Option<T> {
        match value {
            Ok(v) => Some(v),
            Err(message) => {
                self.push(field, message);
                None
            }
        }
    }

    pub fn positive(&mut self, field: &'static str, value: FieldResult<i64>) -> Option<i64> {
        let value = self.present(field, value)?;
        if value > 0 {
            Some(value)
        } else {
            self.push(field, format!("must be greater than 0, got {value}"));
            None
        }
    }

    pub fn in_range(
        &mut self,
        field: &'static str,
        value: FieldResult<f64>,
        min: f64,
        max: f64,
    ) -> Option<f64> {
        let value = self.present(field, value)?;
        // NaN fails `contains`
        if (min..=max).contains(&value) {
            Some(value)
        } else {
            self.push(field, format!("must be between {min} and {max}, got {value}"));
            None
        }
    }

    pub fn non_empty(&mut self, field: &'static str, value: FieldResult<String>) -> Option<String> {
        let value = self.present(field, value)?;
        if value.trim().is_empty() {
            self.push(field, "must not be empty");
            None
        } else {
            Some(value)
        }
    }

    pub fn into_error(self) -> ValidationError {
        ValidationError {
            record: self.record,
            violations: self.items,
        }
    }
}

// --- Raw field helpers ---

/// Parse a raw CSV cell, keeping the reason on failure.
pub fn parse_field<T>(raw: &str) -> FieldResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("missing value".to_string());
    }
    trimmed
        .parse()
        .map_err(|e| format!("invalid value {trimmed:?}: {e}"))
}

/// Convert Unix epoch seconds into a UTC timestamp.
pub fn datetime_from_epoch_seconds(secs: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
}

/// Parse a raw epoch-seconds cell into a UTC timestamp.
pub fn parse_epoch_field(raw: &str) -> FieldResult<DateTime<Utc>> {
    let secs: i64 = parse_field(raw)?;
    datetime_from_epoch_seconds(secs).ok_or_else(|| format!("epoch seconds {secs} out of range"))
}

/// Split a pipe-delimited genre cell. The no-genre sentinel yields an empty list.
pub fn parse_genres(raw: &str) -> FieldResult<Vec<String>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err("missing value".to_string());
    }
    if trimmed == NO_GENRES_SENTINEL {
        return Ok(Vec::new());
    }
    Ok(trimmed
        .split('|')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(String::from)
        .collect())
}
