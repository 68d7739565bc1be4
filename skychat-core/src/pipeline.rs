use crate::Config;
use crate::compose::{ComposeMode, GenerativeComposer, ReplyComposer};
use crate::extract::{ExtractorId, LocationExtractor, extractor_from_config};
use crate::inference::inference_client_from_config;
use crate::model::{Transcript, Utterance};
use crate::provider::{LookupError, ProviderId, WeatherProvider, provider_from_config};

/// Sentinel that ends the session, matched case-insensitively after trim.
pub const QUIT_COMMAND: &str = "quit";

/// Fixed notice for the quit sentinel. The transcript is left untouched.
pub const SESSION_ENDED: &str = "Chat session ended. Start skychat again for a new conversation.";

/// Fixed reply when extraction produces no candidates.
pub const MISSING_LOCATION: &str = "Please include a location for weather updates.";

/// What one turn produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The quit sentinel was received; the session should end.
    Quit,
    /// The assistant's reply, already appended to the transcript.
    Reply(String),
}

/// Per-location failure sentences. Composed here, at the caller of the
/// lookup, so providers stay free of presentation concerns.
pub fn lookup_failure_line(location: &str, err: &LookupError) -> String {
    match err {
        LookupError::NotFound => {
            format!("Sorry, I couldn't find weather data for {location}.")
        }
        LookupError::Transport(_) => {
            format!("Sorry, the weather service could not be reached for {location}.")
        }
        LookupError::Malformed(_) => {
            format!("Sorry, the weather service sent back something I couldn't read for {location}.")
        }
    }
}

/// One user turn: extract locations, look each one up in extraction order,
/// compose a line per location. Holds no state between turns; the
/// transcript belongs to the calling session.
#[derive(Debug)]
pub struct ChatPipeline {
    extractor: Box<dyn LocationExtractor>,
    provider: Box<dyn WeatherProvider>,
    composer: ReplyComposer,
}

impl ChatPipeline {
    pub fn new(
        extractor: Box<dyn LocationExtractor>,
        provider: Box<dyn WeatherProvider>,
        composer: ReplyComposer,
    ) -> Self {
        Self { extractor, provider, composer }
    }

    /// Run one turn. Every external call is awaited in sequence; a reply is
    /// appended to the transcript together with the user line, the quit
    /// sentinel leaves the transcript as it was.
    pub async fn run_turn(&self, transcript: &mut Transcript, input: &str) -> TurnOutcome {
        let text = input.trim();

        if text.eq_ignore_ascii_case(QUIT_COMMAND) {
            return TurnOutcome::Quit;
        }

        let reply = self.answer(text).await;

        transcript.push(Utterance::user(text));
        transcript.push(Utterance::assistant(reply.clone()));

        TurnOutcome::Reply(reply)
    }

    async fn answer(&self, text: &str) -> String {
        let locations = self.extractor.extract(text).await;

        if locations.is_empty() {
            return MISSING_LOCATION.to_string();
        }

        // One line per location, in extraction order. A failed lookup is
        // reported inline and never aborts the remaining locations.
        let mut lines = Vec::with_capacity(locations.len());
        for location in &locations {
            let line = match self.provider.current(location).await {
                Ok(record) => self.composer.compose(text, &record).await,
                Err(err) => lookup_failure_line(location, &err),
            };
            lines.push(line);
        }

        lines.join("\n")
    }
}

/// Per-session choices; `None` falls back to the config file's setting (or
/// its documented default).
#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub provider: Option<ProviderId>,
    pub extractor: Option<ExtractorId>,
    pub compose: Option<ComposeMode>,
}

/// Assemble a pipeline from config plus per-session overrides. Any
/// component that needs a missing credential fails here, before the first
/// turn runs.
pub fn pipeline_from_config(config: &Config, options: &PipelineOptions) -> anyhow::Result<ChatPipeline> {
    let provider_id = match options.provider {
        Some(id) => id,
        None => config.default_provider_id()?,
    };
    let extractor_id = match options.extractor {
        Some(id) => id,
        None => config.extractor_id()?,
    };
    let compose_mode = match options.compose {
        Some(mode) => mode,
        None => config.compose_mode()?,
    };

    let provider = provider_from_config(provider_id, config)?;
    let extractor = extractor_from_config(extractor_id, config)?;

    let composer = match compose_mode {
        ComposeMode::Template => ReplyComposer::Template,
        ComposeMode::Generative => {
            ReplyComposer::Generative(GenerativeComposer::new(inference_client_from_config(config)?))
        }
    };

    Ok(ChatPipeline::new(extractor, provider, composer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Role, WeatherRecord};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use std::collections::HashMap;

    #[derive(Debug)]
    struct FixedExtractor(Vec<String>);

    #[async_trait]
    impl LocationExtractor for FixedExtractor {
        async fn extract(&self, _text: &str) -> Vec<String> {
            self.0.clone()
        }
    }

    #[derive(Debug, Default)]
    struct FixtureProvider {
        records: HashMap<String, WeatherRecord>,
    }

    impl FixtureProvider {
        fn with_record(mut self, record: WeatherRecord) -> Self {
            self.records.insert(record.city.clone(), record);
            self
        }
    }

    #[async_trait]
    impl WeatherProvider for FixtureProvider {
        async fn current(&self, location: &str) -> Result<WeatherRecord, LookupError> {
            self.records.get(location).cloned().ok_or(LookupError::NotFound)
        }
    }

    fn record(city: &str, temp: f64) -> WeatherRecord {
        WeatherRecord {
            city: city.to_string(),
            temperature_c: temp,
            description: "Clear sky".to_string(),
            humidity_pct: 40,
            wind_speed_mps: 2.0,
            observed_at: Utc.with_ymd_and_hms(2026, 8, 5, 10, 0, 0).unwrap(),
        }
    }

    fn template_pipeline(locations: Vec<&str>, provider: FixtureProvider) -> ChatPipeline {
        ChatPipeline::new(
            Box::new(FixedExtractor(locations.into_iter().map(String::from).collect())),
            Box::new(provider),
            ReplyComposer::Template,
        )
    }

    #[tokio::test]
    async fn quit_is_case_insensitive_and_leaves_transcript_alone() {
        let pipeline = template_pipeline(vec![], FixtureProvider::default());
        let mut transcript = Transcript::new();

        for input in ["quit", "QUIT", "Quit", "  quit  "] {
            let outcome = pipeline.run_turn(&mut transcript, input).await;
            assert_eq!(outcome, TurnOutcome::Quit);
        }

        assert!(transcript.is_empty());
    }

    #[tokio::test]
    async fn empty_extraction_short_circuits() {
        let pipeline = template_pipeline(vec![], FixtureProvider::default());
        let mut transcript = Transcript::new();

        let outcome = pipeline.run_turn(&mut transcript, "what is the weather").await;

        assert_eq!(outcome, TurnOutcome::Reply(MISSING_LOCATION.to_string()));
        assert_eq!(transcript.len(), 2);
    }

    #[tokio::test]
    async fn turn_appends_user_then_assistant() {
        let provider = FixtureProvider::default().with_record(record("Paris", 18.0));
        let pipeline = template_pipeline(vec!["Paris"], provider);
        let mut transcript = Transcript::new();

        pipeline.run_turn(&mut transcript, "Weather in Paris?").await;

        let entries = transcript.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].role, Role::User);
        assert_eq!(entries[0].text, "Weather in Paris?");
        assert_eq!(entries[1].role, Role::Assistant);
    }

    #[tokio::test]
    async fn partial_failure_reports_every_location_in_order() {
        let provider = FixtureProvider::default()
            .with_record(record("Paris", 18.0))
            .with_record(record("Tokyo", 27.0));
        let pipeline = template_pipeline(vec!["Paris", "Atlantis", "Tokyo"], provider);
        let mut transcript = Transcript::new();

        let outcome = pipeline.run_turn(&mut transcript, "Paris Atlantis Tokyo").await;

        let TurnOutcome::Reply(reply) = outcome else {
            panic!("expected a reply");
        };
        let lines: Vec<&str> = reply.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("The weather in Paris"));
        assert_eq!(lines[1], "Sorry, I couldn't find weather data for Atlantis.");
        assert!(lines[2].starts_with("The weather in Tokyo"));
    }

    #[test]
    fn factory_builds_template_pipeline_from_config() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());

        let pipeline = pipeline_from_config(&cfg, &PipelineOptions::default());
        assert!(pipeline.is_ok());
    }

    #[test]
    fn factory_rejects_generative_mode_without_inference_key() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "KEY".into());

        let options = PipelineOptions {
            compose: Some(ComposeMode::Generative),
            ..PipelineOptions::default()
        };

        let err = pipeline_from_config(&cfg, &options).unwrap_err();
        assert!(err.to_string().contains("No API key configured for the inference endpoint"));
    }

    #[test]
    fn failure_lines_are_distinct_per_error_kind() {
        let not_found = lookup_failure_line("X", &LookupError::NotFound);
        let transport = lookup_failure_line("X", &LookupError::Transport("timeout".into()));
        let malformed = lookup_failure_line("X", &LookupError::Malformed("bad json".into()));

        assert_ne!(not_found, transport);
        assert_ne!(transport, malformed);
        assert_ne!(not_found, malformed);
    }
}
