use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use crate::error::{RagError, Result};

/// Dimensionality of every vector in the corpus; the store's collection is
/// created with the same value.
pub const EMBEDDING_DIM: usize = 768;

/// Wraps the local embedding model behind the `text -> vector` contract used
/// by both pipelines. Deterministic for a fixed model version; no internal
/// retries.
pub struct Embedder {
    model: TextEmbedding,
}

impl Embedder {
    pub fn new() -> Result<Self> {
        tracing::info!("Initializing embedding model ({:?})", EmbeddingModel::BGEBaseENV15);
        let model = TextEmbedding::try_new(InitOptions {
            model_name: EmbeddingModel::BGEBaseENV15,
            show_download_progress: true,
            ..Default::default()
        })
        .map_err(|e| RagError::EmbeddingService(format!("failed to initialize embedding model: {e}")))?;
        tracing::info!("Embedding model ready");
        Ok(Self { model })
    }

    /// Embed a batch of texts in one call, preserving input order.
    pub fn embed_many(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        self.model
            .embed(refs, None)
            .map_err(|e| RagError::EmbeddingService(e.to_string()))
    }

    pub fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self
            .model
            .embed(vec![text], None)
            .map_err(|e| RagError::EmbeddingService(e.to_string()))?;
        vectors
            .pop()
            .ok_or_else(|| RagError::EmbeddingService("model returned no vector".to_string()))
    }
}
