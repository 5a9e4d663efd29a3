//! Knowledge-bank port - quiz source material.
//!
//! The bank holds text chunks grouped by category (subject). Chunks are
//! produced upstream (document extraction and chunking) and served here
//! for quiz generation.

use async_trait::async_trait;

use crate::domain::quiz::KnowledgeChunk;

/// Port for the quiz knowledge bank.
#[async_trait]
pub trait KnowledgeBank: Send + Sync {
    /// Drops the cached bank and re-reads every category.
    async fn reload(&self) -> Result<BankStats, BankError>;

    /// Currently loaded category names, sorted.
    async fn categories(&self) -> Vec<String>;

    /// Number of chunks loaded for the category; zero when unknown.
    async fn chunk_count(&self, category: &str) -> usize;

    /// Picks a uniformly random chunk from the category.
    async fn pick(&self, category: &str) -> Result<KnowledgeChunk, BankError>;
}

/// Bank size after a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BankStats {
    /// Number of categories loaded.
    pub categories: usize,
    /// Total chunks across all categories.
    pub chunks: usize,
}

/// Knowledge-bank errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum BankError {
    /// No such category is loaded.
    #[error("unknown category {0:?}")]
    UnknownCategory(String),

    /// The category exists but holds no chunks.
    #[error("category {0:?} has no chunks")]
    EmptyCategory(String),

    /// Reading the bank directory failed.
    #[error("bank I/O error: {0}")]
    Io(String),
}
