//! Publishes documents as Telegraph pages via `createPage`.
//!
//! Each section becomes an `h3` node followed by one `p` node per paragraph.
//! [`create_account`] mints the access token the publisher needs.

use async_trait::async_trait;
use pressroom_core::assistant::RunContext;
use pressroom_core::contract::{BoxError, Publisher};
use pressroom_core::document::Document;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use url::Url;

use crate::load_config::{require_env, PublisherSection, TELEGRAPH_API_KEY_VAR};

/// Telegraph rejects longer titles and author names.
const MAX_TITLE_CHARS: usize = 256;
const MAX_AUTHOR_CHARS: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub tag: &'static str,
    pub children: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreatePageRequest<'a> {
    access_token: &'a str,
    title: String,
    author_name: String,
    content: Vec<Node>,
    return_content: bool,
}

#[derive(Debug, Deserialize)]
struct CreatePageResponse {
    ok: bool,
    result: Option<Page>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page {
    url: String,
}

#[derive(Debug, Serialize)]
struct CreateAccountRequest<'a> {
    short_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    author_url: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct CreateAccountResponse {
    ok: bool,
    result: Option<Account>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Account {
    access_token: Option<String>,
}

/// Creates a Telegraph account and returns its access token.
pub async fn create_account(
    base_url: &str,
    short_name: &str,
    author_name: Option<&str>,
    author_url: Option<&str>,
) -> Result<String, BoxError> {
    let request = CreateAccountRequest {
        short_name,
        author_name,
        author_url,
    };
    info!(short_name, "[PUBLISH] Creating Telegraph account");
    let response = reqwest::Client::new()
        .post(format!("{}/createAccount", base_url.trim_end_matches('/')))
        .json(&request)
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        error!(status = status.as_u16(), body = %body, "[PUBLISH][ERROR] Telegraph account request failed");
        return Err(format!("telegraph returned {status}: {body}").into());
    }

    let parsed: CreateAccountResponse = response.json().await?;
    if !parsed.ok {
        let reason = parsed.error.unwrap_or_else(|| "unknown error".to_string());
        return Err(format!("telegraph rejected the account: {reason}").into());
    }
    parsed
        .result
        .and_then(|account| account.access_token)
        .ok_or_else(|| "no access token received".into())
}

pub struct TelegraphPublisher {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl TelegraphPublisher {
    pub fn new(base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        }
    }

    /// Builds a publisher from the publisher settings and `TELEGRAPH_API_KEY`.
    pub fn from_env(section: &PublisherSection) -> Result<Self, BoxError> {
        let access_token = require_env(TELEGRAPH_API_KEY_VAR)?;
        info!(base_url = %section.base_url, "Initialized Telegraph publisher from environment");
        Ok(Self::new(&section.base_url, access_token))
    }
}

/// Telegraph content nodes for `document`, in reading order.
pub fn content_nodes(document: &Document) -> Vec<Node> {
    let mut nodes = Vec::new();
    for section in &document.sections {
        nodes.push(Node {
            tag: "h3",
            children: vec![section.title.clone()],
        });
        for paragraph in &section.paragraphs {
            nodes.push(Node {
                tag: "p",
                children: vec![paragraph.clone()],
            });
        }
    }
    nodes
}

fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

#[async_trait]
impl Publisher for TelegraphPublisher {
    async fn publish(&self, _ctx: &RunContext, document: &Document) -> Result<Url, BoxError> {
        let request = CreatePageRequest {
            access_token: &self.access_token,
            title: truncate_chars(&document.title, MAX_TITLE_CHARS),
            author_name: truncate_chars(&document.author, MAX_AUTHOR_CHARS),
            content: content_nodes(document),
            return_content: false,
        };
        info!(
            title = %request.title,
            nodes = request.content.len(),
            "[PUBLISH] Creating Telegraph page"
        );

        let response = self
            .http
            .post(format!("{}/createPage", self.base_url))
            .json(&request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = status.as_u16(), body = %body, "[PUBLISH][ERROR] Telegraph request failed");
            return Err(format!("telegraph returned {status}: {body}").into());
        }

        let parsed: CreatePageResponse = response.json().await?;
        match parsed {
            CreatePageResponse {
                ok: true,
                result: Some(page),
                ..
            } => {
                let url = Url::parse(&page.url)?;
                info!(url = %url, "[PUBLISH] Page created");
                Ok(url)
            }
            CreatePageResponse { error, .. } => {
                let reason = error.unwrap_or_else(|| "unknown error".to_string());
                error!(reason = %reason, "[PUBLISH][ERROR] Telegraph rejected the page");
                Err(format!("telegraph rejected the page: {reason}").into())
            }
        }
    }
}
