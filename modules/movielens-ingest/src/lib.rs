pub mod batches;
pub mod error;
pub mod processor;
pub mod rows;

pub use batches::{Batches, BatchesExt};
pub use error::ProcessError;
pub use processor::{DataProcessor, MovieStream, RatingStream, RecordStream, TagStream};
