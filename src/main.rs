use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use studycast::{
    ObjectResultStore, PollySpeechService, ResultStore, ServiceConfig, StoreError,
    SynthesisEngine, SynthesisRequest,
    core::keys::{FileKey, Folder},
    core::pipeline::{NarrationTarget, Narrator},
    core::speech::check_audio,
    store::read_transcript,
};

/// Study-material result cache and speech narration
#[derive(Parser, Debug)]
#[command(name = "studycast")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (YAML)
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the deterministic identifier of a media reference
    Identify { reference: String },

    /// Print an artifact key
    Key {
        #[arg(long)]
        identity: String,
        #[arg(long)]
        folder: String,
        #[arg(long)]
        job: String,
        #[arg(long, default_value = "json")]
        format: String,
        #[arg(long)]
        model_id: Option<String>,
        #[arg(long)]
        language: Option<String>,
        /// Append the current time so the key is unique to this call
        #[arg(long)]
        timestamped: bool,
    },

    /// Split text into sentence-aligned chunks, one per line
    Chunk {
        #[arg(short = 'm', long)]
        max_length: usize,
        /// Input file (reads stdin if not specified)
        file: Option<PathBuf>,
    },

    /// Narrate text into the given audio key
    Synthesize {
        #[arg(long)]
        audio_key: String,
        #[arg(short = 'l', long)]
        language: String,
        /// Skip the synchronous path
        #[arg(long)]
        force_async: bool,
        file: Option<PathBuf>,
    },

    /// Cache text as a summary artifact and narrate it
    Narrate {
        #[arg(long)]
        identity: String,
        #[arg(long)]
        job: String,
        #[arg(short = 'l', long)]
        language: String,
        #[arg(long)]
        model_id: Option<String>,
        file: Option<PathBuf>,
    },

    /// Poll an asynchronous synthesis task
    CheckAudio { task_id: String },

    /// Print a stored transcript
    Transcript {
        #[arg(long)]
        identity: String,
        #[arg(long)]
        job: String,
    },
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            Ok(text)
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<ServiceConfig> {
    let config = match path {
        Some(config_path) => {
            info!("Loading configuration from {}", config_path.display());
            ServiceConfig::from_file(config_path)?
        }
        None => ServiceConfig::from_env()?,
    };
    info!("Using media bucket {}", config.media_bucket);
    Ok(config)
}

struct Services {
    config: ServiceConfig,
    store: Arc<dyn ResultStore>,
    speech: Arc<PollySpeechService>,
}

impl Services {
    async fn connect(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = load_config(config_path)?;
        let store: Arc<dyn ResultStore> = Arc::new(ObjectResultStore::s3(&config)?);
        let speech = Arc::new(PollySpeechService::from_config(&config).await);
        Ok(Self {
            config,
            store,
            speech,
        })
    }

    fn engine(&self) -> SynthesisEngine {
        SynthesisEngine::new(self.store.clone(), self.speech.clone())
            .with_limits(self.config.synthesis_limits)
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists (must be done before config loading)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Identify { reference } => {
            println!("{}", studycast::identify(&reference));
        }
        Commands::Key {
            identity,
            folder,
            job,
            format,
            model_id,
            language,
            timestamped,
        } => {
            let mut key = FileKey::new(identity, Folder::parse(&folder), job).format(format);
            if let Some(model_id) = model_id {
                key = key.model_id(model_id);
            }
            if let Some(language) = language {
                key = key.language(language);
            }
            if timestamped {
                key = key.timestamped();
            }
            println!("{key}");
        }
        Commands::Chunk { max_length, file } => {
            let text = read_input(file.as_deref())?;
            for chunk in studycast::chunk_text(&text, max_length) {
                println!("{chunk}");
            }
        }
        Commands::Synthesize {
            audio_key,
            language,
            force_async,
            file,
        } => {
            let text = read_input(file.as_deref())?;
            let services = Services::connect(config_path).await?;
            let outcome = services
                .engine()
                .get_or_synthesize(SynthesisRequest {
                    audio_key: &audio_key,
                    text: text.trim(),
                    format: services.config.audio_format,
                    language_code: &language,
                    force_async,
                })
                .await?;
            print_json(&outcome)?;
        }
        Commands::Narrate {
            identity,
            job,
            language,
            model_id,
            file,
        } => {
            let text = read_input(file.as_deref())?;
            let services = Services::connect(config_path).await?;
            let format = services.config.audio_format;

            let mut text_key = FileKey::new(&identity, Folder::SUMMARIES, &job);
            if let Some(model_id) = model_id {
                text_key = text_key.model_id(model_id);
            }
            let text_key = text_key.build();
            let audio_key = FileKey::new(&identity, Folder::SUMMARIES.audios(), &job)
                .language(&language)
                .format(format.extension())
                .build();

            let narrator = Narrator::new(services.store.clone(), services.engine());
            let target = NarrationTarget {
                text_key: &text_key,
                audio_key: &audio_key,
                language_code: &language,
                format,
            };
            let artifact = narrator
                .narrate(target, || async move {
                    Ok::<_, StoreError>(text.trim().to_string())
                })
                .await?;
            print_json(&artifact)?;
        }
        Commands::CheckAudio { task_id } => {
            let services = Services::connect(config_path).await?;
            let status = check_audio(services.speech.as_ref(), &task_id)
                .await
                .map_err(|e| anyhow!("Failed to check synthesis task {}: {}", task_id, e))?;
            print_json(&status)?;
        }
        Commands::Transcript { identity, job } => {
            let services = Services::connect(config_path).await?;
            let transcript = read_transcript(services.store.as_ref(), &identity, &job).await?;
            println!("{transcript}");
        }
    }

    Ok(())
}
