//! Core library for the `skychat` assistant.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Location extraction strategies (keyword filtering and inference-backed)
//! - Abstraction over weather providers
//! - Reply composition (template and generative)
//! - The per-turn chat pipeline and transcript model
//!
//! It is used by `skychat-cli`, but can also be reused by other binaries or services.

pub mod compose;
pub mod config;
pub mod extract;
pub mod inference;
pub mod model;
pub mod pipeline;
pub mod provider;

pub use compose::ComposeMode;
pub use config::{Config, InferenceConfig, ProviderConfig};
pub use extract::{ExtractorId, LocationExtractor};
pub use inference::{InferenceClient, InferenceError};
pub use model::{Role, Transcript, Utterance, WeatherRecord};
pub use pipeline::{ChatPipeline, PipelineOptions, TurnOutcome, pipeline_from_config};
pub use provider::{LookupError, ProviderId, WeatherProvider};
