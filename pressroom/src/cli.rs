///
/// This module implements the CLI for pressroom: command parsing, collaborator wiring,
/// and user-visible output.
///
/// All pipeline logic (cleaning, segmentation, registry, the job itself) lives in the
/// [`pressroom-core`] crate. This module builds the concrete clients from config and
/// environment and hands them to the core.
///
/// ## Commands
/// - `run`: process one job described by `REQUEST_ID`, `REQUEST_BODY`, `CONTENT_TYPE`
///   and `CONTENT_CONFIG`, then publish and notify.
/// - `generate`: generate and clean a document and print it. Publishes nothing.
/// - `clean`: strip markup from a file or stdin.
/// - `generators`: list registered generators.
/// - `telegraph-token`: create a Telegraph account and print its access token.
///
/// `run` and `generate` cancel cleanly on Ctrl-C.
///
/// [`pressroom-core`]: ../../pressroom-core/
use crate::email::EmailNotifier;
use crate::gemini::GeminiClient;
use crate::load_config::{load_config, AssistantSection, Provider};
use crate::ollama::OllamaClient;
use crate::telegraph::{create_account, TelegraphPublisher};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use pressroom_core::assistant::Assistant;
use pressroom_core::content::clean_text;
use pressroom_core::generators::{register_builtin, GeneratorRegistry};
use pressroom_core::job::{Drafter, JobInput, JobProcessor};
use pressroom_core::request::{ContentRequest, GeneratorConfig};
use serde_json::{Map, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// CLI for pressroom: generate, clean, publish and announce long-form content.
#[derive(Parser)]
#[clap(
    name = "pressroom",
    version,
    about = "Generate long-form content with a language model, clean it, publish it and send a notification"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Process one job from REQUEST_ID, REQUEST_BODY, CONTENT_TYPE and CONTENT_CONFIG
    Run {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Generate and clean a document and print it, without publishing
    Generate {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Registered generator name
        #[clap(long)]
        generator: String,
        /// Request body as a JSON object
        #[clap(long)]
        body: String,
        /// Model tier (`pro`, `basic`) or a model identifier
        #[clap(long)]
        model: Option<String>,
    },
    /// Strip Markdown, HTML, LaTeX and escapes from a file (or stdin)
    Clean {
        /// Input file; stdin when omitted
        #[clap(long)]
        input: Option<PathBuf>,
    },
    /// List the registered generators
    Generators,
    /// Create a Telegraph account and print its access token (for TELEGRAPH_API_KEY)
    TelegraphToken {
        /// Account short name; falls back to TELEGRAPH_SHORT_NAME
        #[clap(long)]
        short_name: Option<String>,
        /// Default author name; falls back to TELEGRAPH_AUTHOR_NAME
        #[clap(long)]
        author_name: Option<String>,
        /// Default author profile link; falls back to TELEGRAPH_AUTHOR_URL
        #[clap(long)]
        author_url: Option<String>,
        /// Telegraph API endpoint
        #[clap(long, default_value = "https://api.telegra.ph")]
        base_url: String,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "run", "Starting content job");
            let drafter = Drafter::new(builtin_registry(), build_assistant(&config.assistant)?);
            let publisher = TelegraphPublisher::from_env(&config.publisher)
                .map_err(|e| anyhow!("Failed to construct publisher: {e}"))?;
            let notifier = EmailNotifier::from_env(&config.notifier)
                .map_err(|e| anyhow!("Failed to construct notifier: {e}"))?;
            let processor = JobProcessor::new(drafter, Arc::new(publisher), Arc::new(notifier));

            let cancel = cancel_on_ctrl_c();
            match processor.process(&JobInput::from_env(), &cancel).await {
                Ok(report) => {
                    tracing::info!(command = "run", ?report, "Content job complete");
                    println!("Published \"{}\" at {}", report.title, report.location);
                    Ok(())
                }
                Err(e) => {
                    tracing::error!(command = "run", stage = %e.stage(), error = %e, "Content job failed");
                    Err(anyhow::Error::new(e))
                }
            }
        }
        Commands::Generate {
            config,
            generator,
            body,
            model,
        } => {
            let config = load_config(config)?;
            tracing::info!(command = "generate", generator = %generator, "Generating preview");
            let drafter = Drafter::new(builtin_registry(), build_assistant(&config.assistant)?);

            let body: Map<String, Value> =
                serde_json::from_str(&body).context("--body must be a JSON object")?;
            let request = ContentRequest::new(Uuid::new_v4(), body);
            let mut options = Map::new();
            if let Some(model) = model {
                options.insert("model".to_string(), Value::String(model));
            }
            let generator_config = GeneratorConfig::new(options)?;

            let cancel = cancel_on_ctrl_c();
            let draft = drafter
                .draft(&generator, &request, generator_config, &cancel)
                .await?;
            tracing::info!(command = "generate", model = %draft.model, "Preview ready");
            println!("{}", draft.document);
            Ok(())
        }
        Commands::Clean { input } => {
            let text = match input {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buffer = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut buffer)
                        .await
                        .context("Failed to read stdin")?;
                    buffer
                }
            };
            println!("{}", clean_text(&text));
            Ok(())
        }
        Commands::Generators => {
            for name in builtin_registry().names() {
                println!("{name}");
            }
            Ok(())
        }
        Commands::TelegraphToken {
            short_name,
            author_name,
            author_url,
            base_url,
        } => {
            let short_name = or_env(short_name, "TELEGRAPH_SHORT_NAME").ok_or_else(|| {
                anyhow!("--short-name is required (or set TELEGRAPH_SHORT_NAME)")
            })?;
            let author_name = or_env(author_name, "TELEGRAPH_AUTHOR_NAME");
            let author_url = or_env(author_url, "TELEGRAPH_AUTHOR_URL");

            let token = create_account(
                &base_url,
                &short_name,
                author_name.as_deref(),
                author_url.as_deref(),
            )
            .await
            .map_err(|e| anyhow!("Failed to create Telegraph account: {e}"))?;
            tracing::info!(command = "telegraph-token", "Telegraph account created");
            println!("{token}");
            Ok(())
        }
    }
}

/// A registry holding every generator shipped with pressroom.
pub fn builtin_registry() -> Arc<GeneratorRegistry> {
    let registry = GeneratorRegistry::new();
    register_builtin(&registry);
    Arc::new(registry)
}

/// The configured assistant backend.
pub fn build_assistant(section: &AssistantSection) -> Result<Arc<dyn Assistant>> {
    let assistant: Arc<dyn Assistant> = match section.provider {
        Provider::Gemini => Arc::new(
            GeminiClient::from_env(section)
                .map_err(|e| anyhow!("Failed to construct Gemini client: {e}"))?,
        ),
        Provider::Ollama => Arc::new(OllamaClient::from_config(section)),
    };
    Ok(assistant)
}

/// A non-blank flag value, else a non-blank environment variable.
fn or_env(flag: Option<String>, var: &str) -> Option<String> {
    flag.or_else(|| std::env::var(var).ok())
        .filter(|value| !value.trim().is_empty())
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            trigger.cancel();
        }
    });
    cancel
}
