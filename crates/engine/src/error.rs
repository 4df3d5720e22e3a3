use skilldex_cache::CacheError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The corpus has not been supplied yet. Recoverable: callers show a
    /// loading state and retry, as opposed to a valid empty result.
    #[error("corpus is not available yet")]
    CorpusUnavailable,

    #[error("cache error: {0}")]
    Cache(#[from] CacheError),
}
