use async_trait::async_trait;

use crate::inference::InferenceClient;

use super::LocationExtractor;

const MAX_LENGTH: u32 = 50;

fn extraction_prompt(text: &str) -> String {
    format!(
        "Extract the place names mentioned in the message below. \
         Answer with only the place names, separated by commas.\n\n\
         Message: {text}\nPlaces:"
    )
}

/// Take the first non-empty line of the generation (minus any echoed
/// prompt) and split it on commas.
fn parse_place_list(generated: &str, prompt: &str) -> Vec<String> {
    let answer = generated.trim();
    let answer = answer.strip_prefix(prompt.trim()).unwrap_or(answer);

    let line = answer
        .lines()
        .find(|line| !line.trim().is_empty())
        .unwrap_or("");

    line.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

/// Asks a text-generation model for the place names in the sentence. Any
/// transport or parse failure degrades to an empty candidate list so the
/// caller can fall back; nothing is raised.
#[derive(Debug, Clone)]
pub struct InferenceExtractor {
    client: InferenceClient,
}

impl InferenceExtractor {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LocationExtractor for InferenceExtractor {
    async fn extract(&self, text: &str) -> Vec<String> {
        let prompt = extraction_prompt(text);

        match self.client.generate(&prompt, MAX_LENGTH).await {
            Ok(generated) => parse_place_list(&generated, &prompt),
            Err(err) => {
                tracing::debug!("location extraction failed: {err}");
                Vec::new()
            }
        }
    }
}
