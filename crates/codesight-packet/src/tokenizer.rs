//! Token counting.
//!
//! Counts are exact only for the `cl100k_base` encoding. Everything else in
//! the pipeline depends on the [`TokenCounter`] trait so tests can use a
//! cheap deterministic counter.

use codesight_utils::error::CodesightError;
use tiktoken_rs::CoreBPE;

/// Measures the token cost of a piece of text.
///
/// Shared read-only between assembly workers.
pub trait TokenCounter: Send + Sync {
    fn count(&self, text: &str) -> usize;

    /// Name of the encoding, for summaries and logs
    fn encoding_name(&self) -> &str;
}

/// `cl100k_base` via tiktoken
pub struct TiktokenCounter {
    bpe: CoreBPE,
}

impl TiktokenCounter {
    /// Load the bundled `cl100k_base` ranks.
    pub fn cl100k() -> Result<Self, CodesightError> {
        let bpe = tiktoken_rs::cl100k_base()
            .map_err(|e| CodesightError::Tokenizer(e.to_string()))?;
        Ok(Self { bpe })
    }
}

impl std::fmt::Debug for TiktokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TiktokenCounter")
            .field("encoding", &"cl100k_base")
            .finish()
    }
}

impl TokenCounter for TiktokenCounter {
    /// Special-token text such as `<|endoftext|>` is counted as ordinary text.
    fn count(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    fn encoding_name(&self) -> &str {
        "cl100k_base"
    }
}

/// One token per whitespace-separated word. Deterministic and fast, for tests.
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Default, Clone, Copy)]
pub struct WordCounter;

#[cfg(any(test, feature = "test-utils"))]
impl TokenCounter for WordCounter {
    fn count(&self, text: &str) -> usize {
        text.split_whitespace().count()
    }

    fn encoding_name(&self) -> &str {
        "words"
    }
}
