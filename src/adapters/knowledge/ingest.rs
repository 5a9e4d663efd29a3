//! Source-document ingestion.
//!
//! Scans a source directory laid out as one sub-folder per category,
//! splits each text document into chunks, and merges them into the
//! category's bank file. Documents already present in a bank file are
//! skipped, so ingestion is resumable. Text extraction from richer
//! formats (PDF and friends) happens upstream of this repository; the
//! ingest accepts plain-text documents.

use std::collections::HashSet;
use std::path::Path;
use tokio::fs;

use crate::domain::quiz::KnowledgeChunk;
use crate::ports::BankError;

/// Characters per chunk.
pub const CHUNK_SIZE: usize = 1000;

/// Chunks at or below this many characters carry too little context to
/// quiz on and are dropped.
pub const MIN_CHUNK_CHARS: usize = 50;

/// Extensions accepted as ingestible text documents.
const TEXT_EXTENSIONS: [&str; 2] = ["txt", "md"];

/// What an ingest run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Category folders visited.
    pub categories: usize,
    /// Chunks appended across all categories.
    pub new_chunks: usize,
    /// Documents skipped because their chunks were already banked.
    pub skipped_sources: usize,
}

/// Splits text into fixed-size character chunks, dropping fragments too
/// short to be useful.
pub fn chunk_text(text: &str) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(CHUNK_SIZE)
        .filter(|chunk| chunk.len() > MIN_CHUNK_CHARS)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Ingests every category folder of `source_dir` into `bank_dir`.
pub async fn ingest_sources(source_dir: &Path, bank_dir: &Path) -> Result<IngestReport, BankError> {
    if !source_dir.exists() {
        return Err(BankError::Io(format!(
            "source directory not found: {}",
            source_dir.display()
        )));
    }
    fs::create_dir_all(bank_dir)
        .await
        .map_err(|e| BankError::Io(e.to_string()))?;

    let mut report = IngestReport::default();
    let mut entries = fs::read_dir(source_dir)
        .await
        .map_err(|e| BankError::Io(e.to_string()))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| BankError::Io(e.to_string()))?
    {
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(category) = path.file_name().and_then(|s| s.to_str()).map(String::from) else {
            continue;
        };

        report.categories += 1;
        ingest_category(&category, &path, bank_dir, &mut report).await?;
    }

    Ok(report)
}

/// Ingests one category folder, merging into its bank file.
async fn ingest_category(
    category: &str,
    folder: &Path,
    bank_dir: &Path,
    report: &mut IngestReport,
) -> Result<(), BankError> {
    let bank_file = bank_dir.join(format!("{}.json", category));

    // Resume from the existing bank file; a corrupt one starts over.
    let mut chunks: Vec<KnowledgeChunk> = if bank_file.exists() {
        let raw = fs::read_to_string(&bank_file)
            .await
            .map_err(|e| BankError::Io(e.to_string()))?;
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::error!(category, error = %e, "corrupt bank file, re-ingesting from scratch");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    let banked_sources: HashSet<String> = chunks.iter().map(|c| c.source.clone()).collect();
    let mut added = 0usize;

    let mut entries = fs::read_dir(folder)
        .await
        .map_err(|e| BankError::Io(e.to_string()))?;

    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| BankError::Io(e.to_string()))?
    {
        let path = entry.path();
        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| TEXT_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
            .unwrap_or(false);
        if !is_text {
            continue;
        }
        let Some(source) = path.file_name().and_then(|s| s.to_str()).map(String::from) else {
            continue;
        };

        if banked_sources.contains(&source) {
            report.skipped_sources += 1;
            continue;
        }

        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                // One unreadable document must not abort the category.
                tracing::error!(category, source = %source, error = %e, "failed to read source");
                continue;
            }
        };

        for content in chunk_text(&text) {
            chunks.push(KnowledgeChunk {
                category: category.to_string(),
                source: source.clone(),
                content,
            });
            added += 1;
        }
        tracing::info!(category, source = %source, "ingested source document");
    }

    if added > 0 {
        let json = serde_json::to_string_pretty(&chunks)
            .map_err(|e| BankError::Io(e.to_string()))?;
        fs::write(&bank_file, json)
            .await
            .map_err(|e| BankError::Io(e.to_string()))?;
        report.new_chunks += added;
    }

    Ok(())
}
