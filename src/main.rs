use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{Method, StatusCode},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use study_rag::config::Config;
use study_rag::error::RagError;
use study_rag::indexer::chunker::Chunker;
use study_rag::models::{AskRequest, AskResponse, IngestReport, StatsResponse};
use study_rag::rag::embedder::Embedder;
use study_rag::rag::generator::Generator;
use study_rag::rag::vector_store::VectorStore;
use study_rag::rag::{AnswerOptions, RagEngine};

struct AppState {
    engine: RagEngine,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    tracing::info!("Vector store: {}", config.vector_store_url);
    if let Some(ref region) = config.vector_store_region {
        tracing::info!("Vector store region: {}", region);
    }
    tracing::info!("LLM backend: {}", config.llm.describe());

    let chunker = Chunker::new(config.chunk_size, config.chunk_overlap)?;
    let embedder = Embedder::new()?;
    let store = VectorStore::connect(
        &config.vector_store_url,
        config.vector_store_api_key.clone(),
        &config.collection,
    )
    .await?;
    let generator = Generator::new(config.llm.clone());

    let state = Arc::new(AppState {
        engine: RagEngine::new(chunker, embedder, store, generator),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let app = Router::new()
        .route("/api/documents", post(upload_documents_handler))
        .route("/api/ask", post(ask_handler))
        .route("/api/stats", get(stats_handler))
        .route("/api/health", get(health_check))
        // PDFs routinely exceed the 2 MB default request body cap.
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Study assistant listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}

fn error_response(err: &RagError) -> (StatusCode, String) {
    let status = match err {
        RagError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        RagError::UnsupportedDocument { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        RagError::EmbeddingService(_) => StatusCode::BAD_GATEWAY,
        RagError::VectorStoreUnavailable(_) => StatusCode::BAD_GATEWAY,
        RagError::VectorStoreCapacity(_) => StatusCode::INSUFFICIENT_STORAGE,
        RagError::LocalModelUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        RagError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
        RagError::RemoteApiFailure(_) => StatusCode::BAD_GATEWAY,
        RagError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, err.to_string())
}

async fn upload_documents_handler(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<IngestReport>, (StatusCode, String)> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Malformed upload: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| (StatusCode::BAD_REQUEST, format!("Failed to read '{filename}': {e}")))?;
        files.push((filename, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "No files in upload".to_string()));
    }

    tracing::info!("Processing upload of {} file(s)", files.len());
    Ok(Json(state.engine.ingest_batch(files).await))
}

async fn ask_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, (StatusCode, String)> {
    if request.question.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Question must not be empty".to_string()));
    }

    let request_id = Uuid::new_v4();
    tracing::info!("Answering question {} ({} chars)", request_id, request.question.len());

    let opts = AnswerOptions {
        top_k: request.top_k,
        context_chunks: request.context_chunks,
        max_context_chars: request.max_context_chars,
    };

    let response = state.engine.answer(&request.question, opts).await.map_err(|e| {
        tracing::error!("Answer pipeline failed for {}: {}", request_id, e);
        error_response(&e)
    })?;

    Ok(Json(response))
}

async fn stats_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let stats = state.engine.stats().await.map_err(|e| {
        tracing::error!("Stats query failed: {}", e);
        error_response(&e)
    })?;
    Ok(Json(stats))
}

async fn health_check(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let llm_healthy = state.engine.llm_reachable().await;

    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "services": {
            "llm": llm_healthy
        }
    }))
}
