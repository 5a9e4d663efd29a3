//! Directory-backed knowledge bank.
//!
//! One `<category>.json` file per category, each holding a JSON array of
//! chunks. The whole directory is read into memory on `reload`; quiz
//! generation only ever reads the cache.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::RwLock;

use crate::domain::quiz::KnowledgeChunk;
use crate::ports::{BankError, BankStats, KnowledgeBank};

/// File-backed knowledge bank with an in-memory cache.
pub struct DirKnowledgeBank {
    dir: PathBuf,
    cache: RwLock<HashMap<String, Vec<KnowledgeChunk>>>,
}

impl DirKnowledgeBank {
    /// Creates a bank over the given directory. Call
    /// [`reload`](KnowledgeBank::reload) to populate the cache.
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    async fn read_categories(&self) -> Result<HashMap<String, Vec<KnowledgeChunk>>, BankError> {
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| BankError::Io(e.to_string()))?;

        let mut loaded = HashMap::new();
        let mut entries = fs::read_dir(&self.dir)
            .await
            .map_err(|e| BankError::Io(e.to_string()))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| BankError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(category) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let raw = fs::read_to_string(&path)
                .await
                .map_err(|e| BankError::Io(e.to_string()))?;

            match serde_json::from_str::<Vec<KnowledgeChunk>>(&raw) {
                Ok(chunks) => {
                    tracing::info!(category, chunks = chunks.len(), "loaded category");
                    loaded.insert(category.to_string(), chunks);
                }
                Err(e) => {
                    // A corrupt category must not block the rest of the bank.
                    tracing::error!(category, error = %e, "skipping corrupt category file");
                }
            }
        }

        Ok(loaded)
    }
}

#[async_trait]
impl KnowledgeBank for DirKnowledgeBank {
    async fn reload(&self) -> Result<BankStats, BankError> {
        let loaded = self.read_categories().await?;
        let stats = BankStats {
            categories: loaded.len(),
            chunks: loaded.values().map(Vec::len).sum(),
        };

        *self.cache.write().await = loaded;
        Ok(stats)
    }

    async fn categories(&self) -> Vec<String> {
        let mut names: Vec<String> = self.cache.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    async fn chunk_count(&self, category: &str) -> usize {
        self.cache
            .read()
            .await
            .get(category)
            .map(Vec::len)
            .unwrap_or(0)
    }

    async fn pick(&self, category: &str) -> Result<KnowledgeChunk, BankError> {
        let cache = self.cache.read().await;
        let chunks = cache
            .get(category)
            .ok_or_else(|| BankError::UnknownCategory(category.to_string()))?;

        chunks
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or_else(|| BankError::EmptyCategory(category.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_category(dir: &TempDir, category: &str, chunks: &[KnowledgeChunk]) {
        let json = serde_json::to_string(chunks).unwrap();
        std::fs::write(dir.path().join(format!("{}.json", category)), json).unwrap();
    }

    fn chunk(category: &str, content: &str) -> KnowledgeChunk {
        KnowledgeChunk {
            category: category.to_string(),
            source: "doc.txt".to_string(),
            content: content.to_string(),
        }
    }

    #[tokio::test]
    async fn reload_reads_every_category_file() {
        let dir = TempDir::new().unwrap();
        write_category(&dir, "歷史", &[chunk("歷史", "a"), chunk("歷史", "b")]);
        write_category(&dir, "physics", &[chunk("physics", "c")]);

        let bank = DirKnowledgeBank::new(dir.path());
        let stats = bank.reload().await.unwrap();

        assert_eq!(stats.categories, 2);
        assert_eq!(stats.chunks, 3);
        assert_eq!(bank.categories().await, vec!["physics", "歷史"]);
    }

    #[tokio::test]
    async fn missing_directory_is_created_and_empty() {
        let dir = TempDir::new().unwrap();
        let bank = DirKnowledgeBank::new(dir.path().join("bank"));

        let stats = bank.reload().await.unwrap();
        assert_eq!(stats.categories, 0);
        assert!(bank.categories().await.is_empty());
    }

    #[tokio::test]
    async fn pick_unknown_category_is_reported() {
        let dir = TempDir::new().unwrap();
        let bank = DirKnowledgeBank::new(dir.path());
        bank.reload().await.unwrap();

        assert!(matches!(
            bank.pick("歷史").await,
            Err(BankError::UnknownCategory(_))
        ));
    }

    #[tokio::test]
    async fn pick_empty_category_is_reported() {
        let dir = TempDir::new().unwrap();
        write_category(&dir, "歷史", &[]);

        let bank = DirKnowledgeBank::new(dir.path());
        bank.reload().await.unwrap();

        assert!(matches!(
            bank.pick("歷史").await,
            Err(BankError::EmptyCategory(_))
        ));
    }

    #[tokio::test]
    async fn pick_returns_a_chunk_of_the_category() {
        let dir = TempDir::new().unwrap();
        write_category(&dir, "歷史", &[chunk("歷史", "a"), chunk("歷史", "b")]);

        let bank = DirKnowledgeBank::new(dir.path());
        bank.reload().await.unwrap();

        let picked = bank.pick("歷史").await.unwrap();
        assert_eq!(picked.category, "歷史");
        assert!(picked.content == "a" || picked.content == "b");
    }

    #[tokio::test]
    async fn chunk_count_reports_per_category_sizes() {
        let dir = TempDir::new().unwrap();
        write_category(&dir, "歷史", &[chunk("歷史", "a"), chunk("歷史", "b")]);

        let bank = DirKnowledgeBank::new(dir.path());
        bank.reload().await.unwrap();

        assert_eq!(bank.chunk_count("歷史").await, 2);
        assert_eq!(bank.chunk_count("physics").await, 0);
    }

    #[tokio::test]
    async fn corrupt_category_is_skipped_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_category(&dir, "physics", &[chunk("physics", "ok")]);
        std::fs::write(dir.path().join("broken.json"), "[not json").unwrap();

        let bank = DirKnowledgeBank::new(dir.path());
        let stats = bank.reload().await.unwrap();

        assert_eq!(stats.categories, 1);
        assert_eq!(bank.categories().await, vec!["physics"]);
    }

    #[tokio::test]
    async fn reload_drops_removed_categories() {
        let dir = TempDir::new().unwrap();
        write_category(&dir, "physics", &[chunk("physics", "x")]);

        let bank = DirKnowledgeBank::new(dir.path());
        bank.reload().await.unwrap();

        std::fs::remove_file(dir.path().join("physics.json")).unwrap();
        let stats = bank.reload().await.unwrap();
        assert_eq!(stats.categories, 0);
    }
}
