//! Knowledge-bank adapters: the directory bank and source ingestion.

mod bank;
mod ingest;

pub use bank::DirKnowledgeBank;
pub use ingest::{chunk_text, ingest_sources, IngestReport, CHUNK_SIZE, MIN_CHUNK_CHARS};
