// Service exports
pub mod corpus;

pub use corpus::{CorpusError, CorpusStore};
