use std::convert::TryFrom;

use crate::inference::InferenceClient;
use crate::model::WeatherRecord;

/// Returned by the generative composer whenever the endpoint fails; raw
/// errors never reach the transcript.
pub const COMPOSITION_APOLOGY: &str =
    "Sorry, I couldn't put together a reply just now. Please ask again.";

const REPLY_MAX_LENGTH: u32 = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComposeMode {
    Template,
    Generative,
}

impl ComposeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComposeMode::Template => "template",
            ComposeMode::Generative => "generative",
        }
    }

    pub const fn all() -> &'static [ComposeMode] {
        &[ComposeMode::Template, ComposeMode::Generative]
    }
}

impl std::fmt::Display for ComposeMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ComposeMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "template" => Ok(ComposeMode::Template),
            "generative" => Ok(ComposeMode::Generative),
            _ => Err(anyhow::anyhow!(
                "Unknown compose mode '{value}'. Supported modes: template, generative."
            )),
        }
    }
}

/// Deterministic reply sentence. Byte-stable for a given record, so it can
/// be golden-tested.
pub fn format_reply(record: &WeatherRecord) -> String {
    format!(
        "The weather in {} is {} with {}°C, {}% humidity, and wind speed of {} m/s.",
        record.city,
        record.description,
        format_quantity(record.temperature_c),
        record.humidity_pct,
        format_quantity(record.wind_speed_mps),
    )
}

/// Whole numbers render without a decimal point: 18.0 -> "18", 4.1 -> "4.1".
fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

fn conversational_prompt(question: &str, record: &WeatherRecord) -> String {
    format!(
        "The user asked: {question}\n\
         Current weather in {}: {}, {}°C, {}% humidity, wind {} m/s.\n\
         Reply conversationally in one or two sentences:",
        record.city,
        record.description,
        format_quantity(record.temperature_c),
        record.humidity_pct,
        format_quantity(record.wind_speed_mps),
    )
}

/// Drop surrounding whitespace and a leading prompt echo. A colon-terminated
/// prefix counts as echo only when it occurs in the prompt itself, so a
/// genuine reply like "Yes: bring an umbrella" survives intact.
fn strip_prompt_echo<'a>(generated: &'a str, prompt: &str) -> &'a str {
    let text = generated.trim();
    let text = text
        .strip_prefix(prompt.trim())
        .map(str::trim_start)
        .unwrap_or(text);

    match text.split_once(':') {
        Some((prefix, rest)) if prompt.contains(prefix.trim()) => rest.trim(),
        _ => text,
    }
}

/// Sends the question plus the normalized record to the text-generation
/// endpoint and returns its freeform reply. Infallible by contract: every
/// failure becomes the fixed apology.
#[derive(Debug, Clone)]
pub struct GenerativeComposer {
    client: InferenceClient,
}

impl GenerativeComposer {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }

    pub async fn compose(&self, question: &str, record: &WeatherRecord) -> String {
        let prompt = conversational_prompt(question, record);

        match self.client.generate(&prompt, REPLY_MAX_LENGTH).await {
            Ok(generated) => {
                let reply = strip_prompt_echo(&generated, &prompt);
                if reply.is_empty() {
                    COMPOSITION_APOLOGY.to_string()
                } else {
                    reply.to_string()
                }
            }
            Err(err) => {
                tracing::warn!("reply composition failed: {err}");
                COMPOSITION_APOLOGY.to_string()
            }
        }
    }
}

/// The pipeline's reply seam: template or generative, chosen per session.
#[derive(Debug)]
pub enum ReplyComposer {
    Template,
    Generative(GenerativeComposer),
}

impl ReplyComposer {
    pub async fn compose(&self, question: &str, record: &WeatherRecord) -> String {
        match self {
            ReplyComposer::Template => format_reply(record),
            ReplyComposer::Generative(composer) => composer.compose(question, record).await,
        }
    }
}
