use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Config;

const DEFAULT_ENDPOINT: &str = "https://api-inference.huggingface.co/models/google/flan-t5-base";

/// How a generation call can fail. Callers downgrade these at their own
/// boundary: the extractor to an empty candidate list, the composer to a
/// fixed apology.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error("inference endpoint unreachable: {0}")]
    Transport(String),
    #[error("inference endpoint returned status {0}")]
    Status(u16),
    #[error("inference endpoint returned an unexpected body: {0}")]
    Malformed(String),
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
    parameters: GenerateParameters,
}

#[derive(Debug, Serialize)]
struct GenerateParameters {
    max_length: u32,
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

/// Client for a hosted text-generation endpoint. One POST per call, bearer
/// auth, no retries.
#[derive(Debug, Clone)]
pub struct InferenceClient {
    api_key: String,
    endpoint: String,
    http: Client,
}

impl InferenceClient {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, DEFAULT_ENDPOINT.to_string())
    }

    /// Point the client at a different endpoint. Used by tests with a
    /// fixture server and by self-hosted models.
    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            endpoint,
            http: Client::new(),
        }
    }

    /// Send `inputs` and return the first generated text.
    pub async fn generate(&self, inputs: &str, max_length: u32) -> Result<String, InferenceError> {
        let request = GenerateRequest {
            inputs,
            parameters: GenerateParameters { max_length },
        };

        let res = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| InferenceError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            return Err(InferenceError::Status(status.as_u16()));
        }

        let generations: Vec<Generation> = res
            .json()
            .await
            .map_err(|e| InferenceError::Malformed(e.to_string()))?;

        generations
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .ok_or_else(|| InferenceError::Malformed("generation list was empty".into()))
    }
}

/// Construct the inference client from config. Missing credentials are a
/// startup-fatal condition for any session that selected an
/// inference-backed extractor or composer.
pub fn inference_client_from_config(config: &Config) -> anyhow::Result<InferenceClient> {
    let api_key = config.inference_api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured for the inference endpoint.\n\
             Hint: run `skychat configure inference` and enter your API key,\n\
             or set the INFERENCE_API_KEY environment variable."
        )
    })?;

    let client = match config.inference_endpoint() {
        Some(endpoint) => InferenceClient::with_endpoint(api_key, endpoint.to_string()),
        None => InferenceClient::new(api_key),
    };

    Ok(client)
}
