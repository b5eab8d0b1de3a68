//! RAG study assistant: ingest PDF study materials into a vector store and
//! answer questions about them with retrieval-augmented generation.

pub mod config;
pub mod error;
pub mod indexer;
pub mod models;
pub mod rag;
