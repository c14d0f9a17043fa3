use std::collections::VecDeque;
use std::fs::{self, File};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tracing::{debug, error, info, warn};

use movielens_common::Config;

use crate::error::{ProcessError, Result};
use crate::rows::{CsvRow, MovieRow, RatingRow, TagRow};

pub type RatingStream = RecordStream<RatingRow>;
pub type MovieStream = RecordStream<MovieRow>;
pub type TagStream = RecordStream<TagRow>;

/// Turns the raw MovieLens CSV files into streams of validated records.
///
/// Each `process_*` call opens its file anew, so a stream can be restarted
/// by calling again but never resumed halfway through.
#[derive(Debug, Clone)]
pub struct DataProcessor {
    raw_data_dir: PathBuf,
    processed_data_dir: PathBuf,
    ratings_file: String,
    movies_file: String,
    tags_file: String,
    batch_size: usize,
}

impl DataProcessor {
    /// Create the processor and make sure the raw and processed directories exist.
    pub fn new(config: &Config) -> Result<Self> {
        let processor = Self {
            raw_data_dir: config.raw_data_dir.clone(),
            processed_data_dir: config.processed_data_dir.clone(),
            ratings_file: config.ratings_file.clone(),
            movies_file: config.movies_file.clone(),
            tags_file: config.tags_file.clone(),
            batch_size: config.batch_size.max(1),
        };
        processor.ensure_directories()?;
        Ok(processor)
    }

    fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.raw_data_dir, &self.processed_data_dir] {
            fs::create_dir_all(dir).map_err(|source| ProcessError::Io {
                path: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Stream ratings, reading `batch_size` rows at a time.
    pub fn process_ratings(&self) -> Result<RatingStream> {
        RecordStream::open(
            self.raw_data_dir.join(&self.ratings_file),
            Chunking::Rows(self.batch_size),
        )
    }

    /// Stream movies. The catalog is small, so the whole file is read up front.
    pub fn process_movies(&self) -> Result<MovieStream> {
        RecordStream::open(self.raw_data_dir.join(&self.movies_file), Chunking::WholeFile)
    }

    /// Stream user tags, chunked like ratings.
    pub fn process_tags(&self) -> Result<TagStream> {
        RecordStream::open(
            self.raw_data_dir.join(&self.tags_file),
            Chunking::Rows(self.batch_size),
        )
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[derive(Debug, Clone, Copy)]
enum Chunking {
    Rows(usize),
    WholeFile,
}

/// Lazy, forward-only sequence of validated records read from one CSV file.
///
/// Raw rows are pulled from disk one chunk at a time. Rows that fail to
/// parse or validate are logged and skipped; they never end the stream.
pub struct RecordStream<R> {
    path: PathBuf,
    reader: csv::Reader<File>,
    headers: StringRecord,
    chunking: Chunking,
    buffer: VecDeque<StringRecord>,
    exhausted: bool,
    finished: bool,
    yielded: u64,
    skipped: u64,
    _row: PhantomData<fn() -> R>,
}

impl<R: CsvRow> RecordStream<R> {
    fn open(path: PathBuf, chunking: Chunking) -> Result<Self> {
        if !path.exists() {
            return Err(ProcessError::FileNotFound { path });
        }

        info!(path = %path.display(), "Processing {}s", R::KIND);

        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_path(&path)
            .map_err(|source| csv_error(&path, source))?;
        let headers = reader
            .headers()
            .map_err(|source| csv_error(&path, source))?
            .clone();

        // A zero-byte file has no header row and simply yields nothing.
        let exhausted = headers.is_empty();
        if !exhausted {
            for column in R::COLUMNS {
                if !headers.iter().any(|h| h == *column) {
                    return Err(ProcessError::MissingColumn {
                        path,
                        column: *column,
                    });
                }
            }
        }

        let mut stream = Self {
            path,
            reader,
            headers,
            chunking,
            buffer: VecDeque::new(),
            exhausted,
            finished: false,
            yielded: 0,
            skipped: 0,
            _row: PhantomData,
        };

        if let Chunking::WholeFile = chunking {
            stream.fill();
        }

        Ok(stream)
    }

    /// Read the next chunk of raw rows into the buffer.
    fn fill(&mut self) {
        let limit = match self.chunking {
            Chunking::Rows(n) => n,
            Chunking::WholeFile => usize::MAX,
        };

        while self.buffer.len() < limit {
            let mut record = StringRecord::new();
            match self.reader.read_record(&mut record) {
                Ok(true) => self.buffer.push_back(record),
                Ok(false) => {
                    self.exhausted = true;
                    break;
                }
                Err(err) if err.is_io_error() => {
                    error!(path = %self.path.display(), error = %err, "Read failed, ending {} stream", R::KIND);
                    self.exhausted = true;
                    break;
                }
                Err(err) => {
                    self.skipped += 1;
                    warn!(
                        line = err.position().map(|p| p.line()),
                        error = %err,
                        "Error reading {} row, skipping", R::KIND
                    );
                }
            }
        }

        debug!(rows = self.buffer.len(), kind = R::KIND, "Read chunk");
    }

    fn convert(&self, record: &StringRecord) -> std::result::Result<R::Record, String> {
        let row: R = record
            .deserialize(Some(&self.headers))
            .map_err(|e| e.to_string())?;
        row.into_record().map_err(|e| e.to_string())
    }

    /// Records yielded so far.
    pub fn yielded(&self) -> u64 {
        self.yielded
    }

    /// Rows skipped so far because they failed to read, parse or validate.
    pub fn skipped(&self) -> u64 {
        self.skipped
    }
}

impl<R: CsvRow> Iterator for RecordStream<R> {
    type Item = R::Record;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some(record) = self.buffer.pop_front() else {
                if self.exhausted {
                    if !self.finished {
                        self.finished = true;
                        info!(
                            path = %self.path.display(),
                            processed = self.yielded,
                            skipped = self.skipped,
                            "Finished processing {}s", R::KIND
                        );
                    }
                    return None;
                }
                self.fill();
                continue;
            };

            match self.convert(&record) {
                Ok(item) => {
                    self.yielded += 1;
                    return Some(item);
                }
                Err(error) => {
                    self.skipped += 1;
                    warn!(
                        line = record.position().map(|p| p.line()),
                        row = ?record,
                        error = %error,
                        "Error processing {}, skipping", R::KIND
                    );
                }
            }
        }
    }
}

fn csv_error(path: &Path, source: csv::Error) -> ProcessError {
    ProcessError::Csv {
        path: path.to_path_buf(),
        source,
    }
}
