use std::io::Write;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use inquire::{InquireError, Password, PasswordDisplayMode, Text};

use skychat_core::pipeline::SESSION_ENDED;
use skychat_core::{
    ComposeMode, Config, ExtractorId, PipelineOptions, ProviderId, Transcript, TurnOutcome,
    pipeline_from_config,
};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skychat", version, about = "Conversational weather assistant")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store an API key for a weather provider or for "inference".
    Configure {
        /// "openweather", "weatherstack" or "inference".
        target: String,
    },

    /// Start an interactive chat session.
    Chat {
        #[command(flatten)]
        options: SessionArgs,
    },

    /// Ask a single question and print the reply.
    Ask {
        /// Free-text question, e.g. "Should I carry an umbrella in Paris?".
        question: String,

        #[command(flatten)]
        options: SessionArgs,
    },
}

/// Per-session overrides; the config file supplies anything left out.
#[derive(Debug, clap::Args)]
pub struct SessionArgs {
    /// Weather provider: "openweather" or "weatherstack".
    #[arg(long)]
    provider: Option<String>,

    /// Location extraction strategy: "keyword", "inference" or "auto".
    #[arg(long)]
    extractor: Option<String>,

    /// Reply mode: "template" or "generative".
    #[arg(long)]
    compose: Option<String>,
}

impl SessionArgs {
    fn parse_options(&self) -> anyhow::Result<PipelineOptions> {
        let provider = self
            .provider
            .as_deref()
            .map(ProviderId::try_from)
            .transpose()?;
        let extractor = self
            .extractor
            .as_deref()
            .map(ExtractorId::try_from)
            .transpose()?;
        let compose = self
            .compose
            .as_deref()
            .map(ComposeMode::try_from)
            .transpose()?;

        Ok(PipelineOptions { provider, extractor, compose })
    }
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure { target } => configure(&target),
            Command::Chat { options } => chat(&options).await,
            Command::Ask { question, options } => ask(&question, &options).await,
        }
    }
}

fn configure(target: &str) -> anyhow::Result<()> {
    let mut config = Config::load()?;

    if target.eq_ignore_ascii_case("inference") {
        let key = prompt_api_key("API key for the inference endpoint:")?;
        config.upsert_inference_api_key(key);
    } else {
        let id = ProviderId::try_from(target)?;
        let key = prompt_api_key(&format!("API key for {id}:"))?;
        config.upsert_provider_api_key(id, key);
    }

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());

    Ok(())
}

fn prompt_api_key(message: &str) -> anyhow::Result<String> {
    Password::new(message)
        .with_display_mode(PasswordDisplayMode::Masked)
        .without_confirmation()
        .prompt()
        .context("API key entry cancelled")
}

async fn ask(question: &str, options: &SessionArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let pipeline = pipeline_from_config(&config, &options.parse_options()?)?;

    let mut transcript = Transcript::new();
    match pipeline.run_turn(&mut transcript, question).await {
        TurnOutcome::Quit => println!("{SESSION_ENDED}"),
        TurnOutcome::Reply(reply) => println!("{reply}"),
    }

    Ok(())
}

async fn chat(options: &SessionArgs) -> anyhow::Result<()> {
    let config = Config::load()?;
    let pipeline = pipeline_from_config(&config, &options.parse_options()?)?;

    println!("Ask about the weather anywhere (type 'quit' to stop).");

    // The session owns the transcript; the pipeline only appends to it.
    let mut transcript = Transcript::new();

    loop {
        let line = match Text::new("you:").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => {
                println!("{SESSION_ENDED}");
                break;
            }
            Err(err) => return Err(err.into()),
        };

        if line.trim().is_empty() {
            continue;
        }

        match pipeline.run_turn(&mut transcript, &line).await {
            TurnOutcome::Quit => {
                println!("{SESSION_ENDED}");
                break;
            }
            TurnOutcome::Reply(reply) => reveal("bot:", &reply).await,
        }
    }

    Ok(())
}

/// Word-by-word reveal of a reply. Presentation only; the transcript holds
/// the full text from the moment the turn completed.
async fn reveal(tag: &str, reply: &str) {
    for line in reply.lines() {
        print!("{tag}");
        for word in line.split_whitespace() {
            print!(" {word}");
            let _ = std::io::stdout().flush();
            tokio::time::sleep(Duration::from_millis(40)).await;
        }
        println!();
    }
}
