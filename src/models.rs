use serde::{Deserialize, Serialize};

fn default_top_k() -> u64 {
    6
}

fn default_context_chunks() -> usize {
    3
}

fn default_max_context_chars() -> usize {
    2000
}

#[derive(Debug, Clone, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(default = "default_top_k")]
    pub top_k: u64,
    #[serde(default = "default_context_chunks")]
    pub context_chunks: usize,
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// One citation backing an answer: the originating file, a short preview of
/// the matched chunk, and its similarity score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceRef {
    pub source: String,
    pub snippet: String,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub filename: String,
    pub chunks_added: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub message: String,
    pub chunks_added: usize,
    pub files_processed: usize,
    pub files: Vec<FileOutcome>,
}

impl IngestReport {
    pub fn from_outcomes(files: Vec<FileOutcome>) -> Self {
        let chunks_added: usize = files.iter().map(|f| f.chunks_added).sum();
        let files_processed = files.iter().filter(|f| f.error.is_none()).count();
        Self {
            message: format!("Successfully added {chunks_added} chunks from {files_processed} file(s)"),
            chunks_added,
            files_processed,
            files,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsResponse {
    pub total_vector_count: u64,
    /// Remaining capacity if the backing store reports one; qdrant does not,
    /// so this is null there.
    pub capacity: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_message_counts_successes_only() {
        let report = IngestReport::from_outcomes(vec![
            FileOutcome { filename: "notes.pdf".into(), chunks_added: 12, error: None },
            FileOutcome {
                filename: "scan.pdf".into(),
                chunks_added: 0,
                error: Some("no extractable text".into()),
            },
            FileOutcome { filename: "slides.pdf".into(), chunks_added: 5, error: None },
        ]);
        assert_eq!(report.message, "Successfully added 17 chunks from 2 file(s)");
        assert_eq!(report.chunks_added, 17);
        assert_eq!(report.files_processed, 2);
        assert_eq!(report.files.len(), 3);
    }

    #[test]
    fn ask_request_defaults() {
        let req: AskRequest = serde_json::from_str(r#"{"question":"what is a b-tree?"}"#).unwrap();
        assert_eq!(req.top_k, 6);
        assert_eq!(req.context_chunks, 3);
        assert_eq!(req.max_context_chars, 2000);
    }
}
