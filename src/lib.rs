pub mod bridge;
pub mod cache;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod source;
pub mod tag_decoder;

#[cfg(test)]
mod test_support;

pub use cache::{BlobCache, DatasetCache, NoCache};
pub use config::LexiconConfig;
pub use error::{LexiconError, Result};
pub use lexicon::{Lexicon, SearchOutcome, WordDetails, WordForm};
pub use source::{DatasetSource, FileSource, HttpSource};
pub use tag_decoder::decode_tag;
