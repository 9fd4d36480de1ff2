//! # contract: the collaborators the job processor drives
//!
//! This module defines the seams between the core pipeline and everything it
//! does not implement itself:
//!
//! - [`ContentGenerator`]: a pluggable strategy turning a request into a [`Document`].
//! - [`Publisher`]: puts a cleaned document somewhere public and returns its URL.
//! - [`Notifier`]: tells an operator where the document went.
//!
//! The language-model backend lives in [`crate::assistant`].
//!
//! ## Errors
//! All methods return boxed error trait objects. The job processor does not
//! inspect them; it tags them with the failing stage and stops the run.
//!
//! ## Mocking & Testing
//! `Publisher` and `Notifier` carry `mockall` annotations; the mocks are exported
//! under the `test-export-mocks` feature so downstream crates can use them too.

use async_trait::async_trait;
use url::Url;

#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;

use crate::assistant::{Assistant, RunContext};
use crate::document::Document;
use crate::request::ContentRequest;

/// Error type at collaborator boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Produces a document for one request, using the assistant for all text.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(
        &self,
        ctx: &RunContext,
        request: &ContentRequest,
        assistant: &dyn Assistant,
    ) -> Result<Document, BoxError>;
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publishes `document` and returns where it can be read.
    async fn publish(&self, ctx: &RunContext, document: &Document) -> Result<Url, BoxError>;
}

#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, location: &Url, title: &str) -> Result<(), BoxError>;
}
