use crate::{Config, inference::inference_client_from_config};
use async_trait::async_trait;
use std::{convert::TryFrom, fmt::Debug};

pub mod inference;
pub mod keyword;

pub use inference::InferenceExtractor;
pub use keyword::{ENGLISH_STOPWORDS, KeywordExtractor, filter_stopwords};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractorId {
    Keyword,
    Inference,
    Auto,
}

impl ExtractorId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractorId::Keyword => "keyword",
            ExtractorId::Inference => "inference",
            ExtractorId::Auto => "auto",
        }
    }

    pub const fn all() -> &'static [ExtractorId] {
        &[ExtractorId::Keyword, ExtractorId::Inference, ExtractorId::Auto]
    }
}

impl std::fmt::Display for ExtractorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ExtractorId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "keyword" => Ok(ExtractorId::Keyword),
            "inference" => Ok(ExtractorId::Inference),
            "auto" => Ok(ExtractorId::Auto),
            _ => Err(anyhow::anyhow!(
                "Unknown extractor '{value}'. Supported extractors: keyword, inference, auto."
            )),
        }
    }
}

/// Pulls candidate location names out of a raw user sentence. Extraction
/// never fails: a strategy that cannot produce candidates returns an empty
/// list and the pipeline answers with its fixed missing-location message.
///
/// Neither strategy validates that a candidate is a real place name; a
/// downstream lookup failure is the only check. Known accuracy gap.
#[async_trait]
pub trait LocationExtractor: Send + Sync + Debug {
    async fn extract(&self, text: &str) -> Vec<String>;
}

/// Inference first; keyword filtering when the model gives nothing usable.
#[derive(Debug)]
pub struct CompositeExtractor {
    inference: InferenceExtractor,
    keyword: KeywordExtractor,
}

impl CompositeExtractor {
    pub fn new(inference: InferenceExtractor, keyword: KeywordExtractor) -> Self {
        Self { inference, keyword }
    }
}

#[async_trait]
impl LocationExtractor for CompositeExtractor {
    async fn extract(&self, text: &str) -> Vec<String> {
        let candidates = self.inference.extract(text).await;
        if !candidates.is_empty() {
            return candidates;
        }

        self.keyword.extract(text).await
    }
}

/// Construct an extractor from config and explicit ExtractorId. The
/// inference-backed variants need credentials and fail here, at startup,
/// when they are missing.
pub fn extractor_from_config(
    id: ExtractorId,
    config: &Config,
) -> anyhow::Result<Box<dyn LocationExtractor>> {
    let boxed: Box<dyn LocationExtractor> = match id {
        ExtractorId::Keyword => Box::new(KeywordExtractor::default()),
        ExtractorId::Inference => {
            Box::new(InferenceExtractor::new(inference_client_from_config(config)?))
        }
        ExtractorId::Auto => Box::new(CompositeExtractor::new(
            InferenceExtractor::new(inference_client_from_config(config)?),
            KeywordExtractor::default(),
        )),
    };

    Ok(boxed)
}
