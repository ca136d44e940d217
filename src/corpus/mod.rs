//! Corpus loading: sources that produce the canonical books and the cache
//! that holds them for the life of the process.

mod cache;
mod error;
mod source;

pub use cache::{CorpusCache, DEFAULT_LOAD_TIMEOUT};
pub use error::LoadError;
pub use source::{CorpusSource, JsonFileSource, StoreCorpusSource, parse_records};
