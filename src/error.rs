use thiserror::Error;

/// Errors surfaced by the ingestion and answer pipelines.
///
/// Every variant carries a message fit for direct display to the user;
/// handlers convert them to HTTP responses without rewording.
#[derive(Debug, Error)]
pub enum RagError {
    /// Bad chunking or service parameters. Fatal at startup.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// A document yields no extractable text (e.g. a scanned-image PDF
    /// without an OCR layer). Reported per file, never aborts a batch.
    #[error("no extractable text in '{filename}': {reason}")]
    UnsupportedDocument { filename: String, reason: String },

    /// The embedding backend failed to produce vectors.
    #[error("embedding service error: {0}")]
    EmbeddingService(String),

    /// The vector store could not be reached or rejected the request.
    #[error("vector store unavailable: {0}")]
    VectorStoreUnavailable(String),

    /// The vector store refused the write for capacity reasons.
    #[error("vector store capacity exceeded (the free tier limit may be reached): {0}")]
    VectorStoreCapacity(String),

    /// The local model runtime did not answer at the transport level.
    #[error("local model runtime unreachable at {url} ({message}); make sure it is running")]
    LocalModelUnavailable { url: String, message: String },

    /// The model runtime answered but could not generate (bad model name,
    /// overloaded backend, malformed response).
    #[error("generation failed: {0}")]
    GenerationFailed(String),

    /// The remote LLM API rejected or failed the request.
    #[error("remote LLM API failure: {0}")]
    RemoteApiFailure(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RagError>;
