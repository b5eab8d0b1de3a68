use crate::error::{RagError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 800;
pub const DEFAULT_CHUNK_OVERLAP: usize = 150;

/// Runtime configuration, read from the environment once at startup.
///
/// Both binaries call [`Config::from_env`] after `dotenv` and pass the result
/// down explicitly; nothing reads environment variables after this point.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub vector_store_url: String,
    pub vector_store_api_key: Option<String>,
    pub vector_store_region: Option<String>,
    pub collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub llm: LlmConfig,
}

/// Which LLM backend answers questions.
///
/// Presence of `LLM_API_KEY` selects the remote mode; otherwise a locally
/// running Ollama instance is expected.
#[derive(Debug, Clone)]
pub enum LlmConfig {
    Local { url: String, model: String },
    Remote { base_url: String, api_key: String, model: String },
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse(name: &str, default: usize) -> Result<usize> {
    match env_opt(name) {
        None => Ok(default),
        Some(raw) => raw
            .parse()
            .map_err(|_| RagError::InvalidConfiguration(format!("{name} must be a positive integer, got '{raw}'"))),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let chunk_size = env_parse("CHUNK_SIZE", DEFAULT_CHUNK_SIZE)?;
        let chunk_overlap = env_parse("CHUNK_OVERLAP", DEFAULT_CHUNK_OVERLAP)?;

        let llm = match env_opt("LLM_API_KEY") {
            Some(api_key) => LlmConfig::Remote {
                base_url: env_opt("LLM_API_URL")
                    .unwrap_or_else(|| "https://api.groq.com/openai/v1".to_string()),
                api_key,
                model: env_opt("LLM_MODEL").unwrap_or_else(|| "llama-3.1-8b-instant".to_string()),
            },
            None => LlmConfig::Local {
                url: env_opt("OLLAMA_URL").unwrap_or_else(|| "http://localhost:11434".to_string()),
                model: env_opt("LLM_MODEL").unwrap_or_else(|| "llama3.2".to_string()),
            },
        };

        Ok(Self {
            bind_addr: env_opt("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:8080".to_string()),
            vector_store_url: env_opt("VECTOR_STORE_URL")
                .unwrap_or_else(|| "http://localhost:6334".to_string()),
            vector_store_api_key: env_opt("VECTOR_STORE_API_KEY"),
            vector_store_region: env_opt("VECTOR_STORE_REGION"),
            collection: env_opt("VECTOR_STORE_COLLECTION").unwrap_or_else(|| "study-notes".to_string()),
            chunk_size,
            chunk_overlap,
            llm,
        })
    }
}

impl LlmConfig {
    pub fn describe(&self) -> String {
        match self {
            LlmConfig::Local { url, model } => format!("local runtime at {url} (model {model})"),
            LlmConfig::Remote { base_url, model, .. } => format!("remote API at {base_url} (model {model})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Env-var tests mutate process state; keep them in one test so they
    // cannot race under the parallel test runner.
    #[test]
    fn mode_selection_and_overrides() {
        std::env::remove_var("LLM_API_KEY");
        std::env::remove_var("CHUNK_SIZE");
        let config = Config::from_env().unwrap();
        assert!(matches!(config.llm, LlmConfig::Local { .. }));
        assert_eq!(config.chunk_size, DEFAULT_CHUNK_SIZE);
        assert_eq!(config.chunk_overlap, DEFAULT_CHUNK_OVERLAP);

        std::env::set_var("LLM_API_KEY", "gsk_test");
        std::env::set_var("CHUNK_SIZE", "400");
        let config = Config::from_env().unwrap();
        assert!(matches!(config.llm, LlmConfig::Remote { .. }));
        assert_eq!(config.chunk_size, 400);

        std::env::set_var("CHUNK_SIZE", "not-a-number");
        assert!(matches!(
            Config::from_env(),
            Err(RagError::InvalidConfiguration(_))
        ));

        std::env::remove_var("LLM_API_KEY");
        std::env::remove_var("CHUNK_SIZE");
    }
}
