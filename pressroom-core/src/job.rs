//! # job: one content run, from encoded request to notification
//!
//! The processor walks a fixed sequence of stages and stops at the first failure:
//!
//! 1. **Intake**: parse the request id and base64 JSON body.
//! 2. **Configure**: parse the optional base64 JSON generator config.
//! 3. **Model selection**: map the config's `model` tier and bind it into the [`RunContext`].
//! 4. **Resolve**: build the named generator through the [`GeneratorRegistry`].
//! 5. **Generate**: let the generator produce a [`Document`] via the [`Assistant`].
//! 6. **Clean**: [`Document::clean`].
//! 7. **Publish**: hand the document to the [`Publisher`].
//! 8. **Notify**: send the published location to the [`Notifier`].
//!
//! Every failure is a [`JobError`] whose [`stage`](JobError::stage) names where
//! the run stopped. Nothing is retried here and nothing is rolled back.
//!
//! Cancellation is checked before each stage, and the generate, publish and
//! notify calls are raced against the token.
//!
//! [`Drafter`] covers stages 3 to 6 on their own, for previews that should not
//! publish anything.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, Instrument};
use url::Url;
use uuid::Uuid;

use crate::assistant::{effective_model, select_model, Assistant, RunContext};
use crate::contract::{BoxError, Notifier, Publisher};
use crate::document::Document;
use crate::generators::{GeneratorRegistry, RegistryError};
use crate::request::{ConfigError, ContentRequest, GeneratorConfig, IntakeError};

pub const REQUEST_ID_VAR: &str = "REQUEST_ID";
pub const REQUEST_BODY_VAR: &str = "REQUEST_BODY";
pub const CONTENT_TYPE_VAR: &str = "CONTENT_TYPE";
pub const CONTENT_CONFIG_VAR: &str = "CONTENT_CONFIG";

/// Raw, still-encoded job parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobInput {
    pub request_id: Option<String>,
    /// Base64 JSON object.
    pub request_body: Option<String>,
    /// Generator name.
    pub content_type: Option<String>,
    /// Base64 JSON object; optional.
    pub content_config: Option<String>,
}

impl JobInput {
    /// Reads `REQUEST_ID`, `REQUEST_BODY`, `CONTENT_TYPE` and `CONTENT_CONFIG`.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            request_id: var(REQUEST_ID_VAR),
            request_body: var(REQUEST_BODY_VAR),
            content_type: var(CONTENT_TYPE_VAR),
            content_config: var(CONTENT_CONFIG_VAR),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Intake,
    Configure,
    SelectModel,
    Resolve,
    Generate,
    Clean,
    Publish,
    Notify,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Intake => "intake",
            Stage::Configure => "configure",
            Stage::SelectModel => "model selection",
            Stage::Resolve => "resolve",
            Stage::Generate => "generate",
            Stage::Clean => "clean",
            Stage::Publish => "publish",
            Stage::Notify => "notify",
        };
        f.write_str(name)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("invalid request: {0}")]
    Intake(#[from] IntakeError),
    #[error("failed getting config: {0}")]
    Configure(#[from] ConfigError),
    #[error("failed creating generator: no generator name given")]
    MissingGenerator,
    #[error("failed creating generator: {0}")]
    Resolve(#[from] RegistryError),
    #[error("content generation error: {0}")]
    Generate(#[source] BoxError),
    #[error("publish error: {0}")]
    Publish(#[source] BoxError),
    #[error("failed sending notification: {0}")]
    Notify(#[source] BoxError),
    #[error("run cancelled during {stage}")]
    Cancelled { stage: Stage },
}

impl JobError {
    /// The stage the run stopped in.
    pub fn stage(&self) -> Stage {
        match self {
            JobError::Intake(_) => Stage::Intake,
            JobError::Configure(_) => Stage::Configure,
            JobError::MissingGenerator | JobError::Resolve(_) => Stage::Resolve,
            JobError::Generate(_) => Stage::Generate,
            JobError::Publish(_) => Stage::Publish,
            JobError::Notify(_) => Stage::Notify,
            JobError::Cancelled { stage } => *stage,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobReport {
    pub request_id: Uuid,
    pub generator: String,
    pub model: String,
    pub title: String,
    pub sections: usize,
    pub location: Url,
}

/// A cleaned document and the model that wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub document: Document,
    pub model: String,
}

/// Model selection, generation and cleaning, without publishing.
#[derive(Clone)]
pub struct Drafter {
    registry: Arc<GeneratorRegistry>,
    assistant: Arc<dyn Assistant>,
}

impl Drafter {
    pub fn new(registry: Arc<GeneratorRegistry>, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            registry,
            assistant,
        }
    }

    /// Runs stages 3 to 6 for `request` with the named generator.
    ///
    /// A blank `generator` fails the resolve stage, after the model is selected.
    pub async fn draft(
        &self,
        generator: &str,
        request: &ContentRequest,
        config: GeneratorConfig,
        cancel: &CancellationToken,
    ) -> Result<Draft, JobError> {
        ensure_live(cancel, Stage::SelectModel)?;
        let ctx = RunContext::new(cancel.clone());
        let ctx = match config.model() {
            Some(tier) => self.assistant.with_model(&ctx, &select_model(tier)),
            None => ctx,
        };
        let model = effective_model(self.assistant.as_ref(), &ctx);
        info!(model = %model, "[JOB] Model selected");

        ensure_live(cancel, Stage::Resolve)?;
        let generator = generator.trim();
        if generator.is_empty() {
            return Err(JobError::MissingGenerator);
        }
        let generator_impl = self.registry.create(generator, config)?;
        info!(generator, "[JOB] Generator resolved");

        let mut document = race(
            cancel,
            Stage::Generate,
            generator_impl.generate(&ctx, request, self.assistant.as_ref()),
        )
        .await?
        .map_err(JobError::Generate)?;
        info!(
            title = %document.title,
            sections = document.sections.len(),
            "[JOB] Document generated"
        );

        ensure_live(cancel, Stage::Clean)?;
        document.clean();
        info!(
            paragraphs = document.paragraph_count(),
            chars = document.content_len(),
            "[JOB] Document cleaned"
        );

        Ok(Draft { document, model })
    }
}

/// Drives a full run: intake to notification.
pub struct JobProcessor {
    drafter: Drafter,
    publisher: Arc<dyn Publisher>,
    notifier: Arc<dyn Notifier>,
}

impl JobProcessor {
    pub fn new(
        drafter: Drafter,
        publisher: Arc<dyn Publisher>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            drafter,
            publisher,
            notifier,
        }
    }

    pub async fn process(
        &self,
        input: &JobInput,
        cancel: &CancellationToken,
    ) -> Result<JobReport, JobError> {
        let span = info_span!(
            "job",
            request_id = input.request_id.as_deref().unwrap_or("-"),
            generator = input.content_type.as_deref().unwrap_or("-"),
        );
        async {
            info!("[JOB] Starting run");
            let result = self.run(input, cancel).await;
            match &result {
                Ok(report) => info!(location = %report.location, "[JOB] Run completed"),
                Err(e) => error!(stage = %e.stage(), error = %e, "[JOB][ERROR] Run failed"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        input: &JobInput,
        cancel: &CancellationToken,
    ) -> Result<JobReport, JobError> {
        ensure_live(cancel, Stage::Intake)?;
        let request = ContentRequest::from_encoded(
            input.request_id.as_deref(),
            input.request_body.as_deref(),
        )?;
        info!(keys = request.body.len(), "[JOB] Request accepted");

        ensure_live(cancel, Stage::Configure)?;
        let config = GeneratorConfig::from_encoded(input.content_config.as_deref())?;

        let generator = input.content_type.as_deref().unwrap_or_default().trim();

        let Draft { document, model } = self
            .drafter
            .draft(generator, &request, config, cancel)
            .await?;

        let ctx = RunContext::new(cancel.clone()).with_model(model.clone());
        let location = race(cancel, Stage::Publish, self.publisher.publish(&ctx, &document))
            .await?
            .map_err(JobError::Publish)?;
        info!(location = %location, "[JOB] Document published");

        race(
            cancel,
            Stage::Notify,
            self.notifier.notify(&location, &document.title),
        )
        .await?
        .map_err(JobError::Notify)?;
        info!("[JOB] Notification sent");

        Ok(JobReport {
            request_id: request.id,
            generator: generator.to_owned(),
            model,
            title: document.title,
            sections: document.sections.len(),
            location,
        })
    }
}

fn ensure_live(cancel: &CancellationToken, stage: Stage) -> Result<(), JobError> {
    if cancel.is_cancelled() {
        return Err(JobError::Cancelled { stage });
    }
    Ok(())
}

async fn race<T>(
    cancel: &CancellationToken,
    stage: Stage,
    work: impl Future<Output = Result<T, BoxError>>,
) -> Result<Result<T, BoxError>, JobError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(JobError::Cancelled { stage }),
        out = work => Ok(out),
    }
}
