pub mod embedder;
pub mod generator;
pub mod vector_store;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::Result;
use crate::indexer::chunker::Chunker;
use crate::indexer::extractor::extract_pdf_text;
use crate::models::{AskResponse, FileOutcome, IngestReport, SourceRef, StatsResponse};
use self::embedder::Embedder;
use self::generator::Generator;
use self::vector_store::{ChunkRecord, RetrievedMatch, VectorStore};

/// Separator between chunks in the assembled context.
const CONTEXT_DELIMITER: &str = "\n\n";

/// Returned verbatim, with empty sources, when the store has no matches for
/// a question. A valid terminal state, not an error.
pub const NO_MATCH_ANSWER: &str =
    "No relevant documents found. Upload your study materials first, then ask again.";

const SNIPPET_CHARS: usize = 300;

#[derive(Debug, Clone, Copy)]
pub struct AnswerOptions {
    pub top_k: u64,
    pub context_chunks: usize,
    pub max_context_chars: usize,
}

impl Default for AnswerOptions {
    fn default() -> Self {
        Self { top_k: 6, context_chunks: 3, max_context_chars: 2000 }
    }
}

/// Orchestrates both sides of the system: the write side (PDF -> chunks ->
/// embeddings -> store) and the read side (question -> retrieval -> prompt ->
/// LLM). All collaborators are injected once at startup and reused across
/// requests; the engine itself keeps no mutable state.
pub struct RagEngine {
    chunker: Chunker,
    embedder: Embedder,
    store: VectorStore,
    generator: Generator,
}

impl RagEngine {
    pub fn new(chunker: Chunker, embedder: Embedder, store: VectorStore, generator: Generator) -> Self {
        Self { chunker, embedder, store, generator }
    }

    /// Ingest one uploaded PDF: extract, chunk, embed (one batch call),
    /// upsert (one batched call). Returns the number of chunks added.
    pub async fn ingest_document(&self, filename: &str, bytes: &[u8]) -> Result<usize> {
        let text = extract_pdf_text(filename, bytes)?;
        let chunks: Vec<String> = self.chunker.split(&text).map(str::to_string).collect();
        tracing::info!("Chunked '{}' into {} chunks", filename, chunks.len());

        let vectors = self.embedder.embed_many(&chunks)?;
        let records = chunks
            .into_iter()
            .zip(vectors)
            .enumerate()
            .map(|(index, (text, vector))| ChunkRecord {
                id: chunk_id(filename, index),
                vector,
                text,
                source: filename.to_string(),
            })
            .collect::<Vec<_>>();

        let count = records.len();
        self.store.upsert(records).await?;
        Ok(count)
    }

    /// Ingest a batch of uploads. One file's failure is recorded in the
    /// report and does not stop the remaining files.
    pub async fn ingest_batch(&self, files: Vec<(String, Vec<u8>)>) -> IngestReport {
        let mut outcomes = Vec::with_capacity(files.len());
        for (filename, bytes) in files {
            match self.ingest_document(&filename, &bytes).await {
                Ok(chunks_added) => {
                    outcomes.push(FileOutcome { filename, chunks_added, error: None });
                }
                Err(e) => {
                    tracing::warn!("Failed to ingest '{}': {}", filename, e);
                    outcomes.push(FileOutcome {
                        filename,
                        chunks_added: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }
        IngestReport::from_outcomes(outcomes)
    }

    /// Answer a question from the ingested corpus.
    pub async fn answer(&self, question: &str, opts: AnswerOptions) -> Result<AskResponse> {
        let query_vector = self.embedder.embed(question)?;
        let matches = self.store.query(query_vector, opts.top_k).await?;
        tracing::info!("Retrieved {} matches for question", matches.len());

        if matches.is_empty() {
            return Ok(AskResponse { answer: NO_MATCH_ANSWER.to_string(), sources: Vec::new() });
        }

        let context = assemble_context(&matches, opts.context_chunks, opts.max_context_chars);
        let prompt = build_prompt(question, &context);
        let answer = self.generator.generate(&prompt).await?;

        Ok(AskResponse { answer, sources: distinct_sources(&matches, opts.context_chunks) })
    }

    pub async fn stats(&self) -> Result<StatsResponse> {
        let stats = self.store.stats().await?;
        Ok(StatsResponse {
            total_vector_count: stats.total_vector_count,
            capacity: stats.capacity,
        })
    }

    pub async fn llm_reachable(&self) -> bool {
        self.generator.health_check().await
    }
}

/// Stable id for a chunk: the same file and position always map to the same
/// point, so re-ingesting a document overwrites instead of duplicating. The
/// sha256 digest is folded into a UUID, the id form the store accepts.
fn chunk_id(source: &str, index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update([0u8]);
    hasher.update(index.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

/// Concatenate up to `max_chunks` match texts, `\n\n`-separated, never
/// exceeding `max_chars` characters. Whole chunks are kept while they fit;
/// if the first chunk alone is over budget it is cut at a char boundary.
fn assemble_context(matches: &[RetrievedMatch], max_chunks: usize, max_chars: usize) -> String {
    let mut context = String::new();
    let mut used_chars = 0usize;

    for m in matches.iter().take(max_chunks) {
        let chunk_chars = m.text.chars().count();
        let sep_chars = if context.is_empty() { 0 } else { CONTEXT_DELIMITER.chars().count() };

        if used_chars + sep_chars + chunk_chars > max_chars {
            if context.is_empty() {
                context.extend(m.text.chars().take(max_chars));
            }
            break;
        }

        if sep_chars > 0 {
            context.push_str(CONTEXT_DELIMITER);
        }
        context.push_str(&m.text);
        used_chars += sep_chars + chunk_chars;
    }

    context
}

fn build_prompt(question: &str, context: &str) -> String {
    format!(
        "Answer the question using only the context below, taken from the \
         user's study materials. If the context does not contain enough \
         information to answer, say so instead of guessing.\n\n\
         Context from study materials:\n{context}\n\n\
         Question: {question}\n\n\
         Answer:"
    )
}

/// Citations for the selected matches: first occurrence per filename, in the
/// matches' similarity-descending order, with a short snippet preview.
fn distinct_sources(matches: &[RetrievedMatch], limit: usize) -> Vec<SourceRef> {
    let mut seen: Vec<&str> = Vec::new();
    let mut sources = Vec::new();
    for m in matches.iter().take(limit) {
        if seen.contains(&m.source.as_str()) {
            continue;
        }
        seen.push(&m.source);
        sources.push(SourceRef {
            source: m.source.clone(),
            snippet: m.text.chars().take(SNIPPET_CHARS).collect(),
            score: m.score,
        });
    }
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(text: &str, source: &str, score: f32) -> RetrievedMatch {
        RetrievedMatch { text: text.to_string(), source: source.to_string(), score }
    }

    #[test]
    fn context_keeps_whole_chunks_within_budget() {
        let matches = vec![m(&"a".repeat(900), "x.pdf", 0.9), m(&"b".repeat(900), "y.pdf", 0.8), m(&"c".repeat(900), "z.pdf", 0.7)];
        let context = assemble_context(&matches, 3, 2000);
        // Two chunks plus one separator fit; the third would overflow.
        assert_eq!(context.chars().count(), 900 + 2 + 900);
        assert!(context.starts_with('a'));
        assert!(context.ends_with('b'));
    }

    #[test]
    fn context_never_exceeds_max_chars() {
        let matches = vec![m(&"a".repeat(3000), "x.pdf", 0.9)];
        let context = assemble_context(&matches, 3, 2000);
        assert_eq!(context.chars().count(), 2000);
    }

    #[test]
    fn context_selects_at_most_max_chunks() {
        let matches: Vec<_> = (0..6).map(|i| m("tiny", &format!("{i}.pdf"), 0.5)).collect();
        let context = assemble_context(&matches, 3, 2000);
        assert_eq!(context, "tiny\n\ntiny\n\ntiny");
    }

    #[test]
    fn context_truncates_multibyte_text_safely() {
        let matches = vec![m(&"あ".repeat(3000), "x.pdf", 0.9)];
        let context = assemble_context(&matches, 3, 2000);
        assert_eq!(context.chars().count(), 2000);
    }

    #[test]
    fn sources_are_distinct_and_keep_score_order() {
        let matches = vec![
            m("first", "notes.pdf", 0.93),
            m("second", "paper.pdf", 0.88),
            m("third", "notes.pdf", 0.71),
        ];
        let sources = distinct_sources(&matches, 3);
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].source, "notes.pdf");
        assert_eq!(sources[1].source, "paper.pdf");
        assert!(sources[0].score >= sources[1].score);
        assert_eq!(sources[0].snippet, "first");
    }

    #[test]
    fn sources_only_come_from_selected_matches() {
        let matches: Vec<_> = (0..6).map(|i| m("t", &format!("{i}.pdf"), 0.5)).collect();
        assert_eq!(distinct_sources(&matches, 3).len(), 3);
    }

    #[test]
    fn snippets_are_bounded() {
        let matches = vec![m(&"x".repeat(1000), "notes.pdf", 0.9)];
        let sources = distinct_sources(&matches, 3);
        assert_eq!(sources[0].snippet.chars().count(), 300);
    }

    #[test]
    fn chunk_ids_are_stable_per_source_and_index() {
        assert_eq!(chunk_id("notes.pdf", 0), chunk_id("notes.pdf", 0));
        assert_ne!(chunk_id("notes.pdf", 0), chunk_id("notes.pdf", 1));
        assert_ne!(chunk_id("notes.pdf", 0), chunk_id("paper.pdf", 0));
        // Must parse as a UUID, the id form the store accepts.
        assert!(Uuid::parse_str(&chunk_id("notes.pdf", 0)).is_ok());
    }

    #[test]
    fn prompt_embeds_question_and_context() {
        let prompt = build_prompt("What is entropy?", "Entropy measures disorder.");
        assert!(prompt.contains("What is entropy?"));
        assert!(prompt.contains("Entropy measures disorder."));
        assert!(prompt.contains("only the context"));
    }
}
