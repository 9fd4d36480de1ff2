//! The `article` generator: outline first, then one ask per section.
//!
//! Request body:
//! - `topic` (string, required)
//! - `sections` (integer, optional, default 4, at most 12)
//!
//! Config:
//! - `author` (string, optional, default `"Pressroom"`)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::assistant::{Assistant, RunContext};
use crate::contract::{BoxError, ContentGenerator};
use crate::document::Document;
use crate::request::{ContentRequest, GeneratorConfig};

pub const NAME: &str = "article";

const DEFAULT_AUTHOR: &str = "Pressroom";
const DEFAULT_SECTIONS: u64 = 4;
const MAX_SECTIONS: u64 = 12;

const PERSONA: &str = "You are a careful long-form writer. You write clear, factual prose \
in complete sentences, grouped into paragraphs separated by blank lines. You never use \
lists, tables, headings or code.";

#[derive(Debug, Deserialize)]
struct Outline {
    title: String,
    sections: Vec<OutlineSection>,
}

#[derive(Debug, Deserialize)]
struct OutlineSection {
    title: String,
    #[serde(default)]
    brief: String,
}

fn outline_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "title": { "type": "string" },
            "sections": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "title": { "type": "string" },
                        "brief": { "type": "string" }
                    },
                    "required": ["title", "brief"]
                }
            }
        },
        "required": ["title", "sections"]
    })
}

#[derive(Debug, Clone)]
pub struct ArticleGenerator {
    author: String,
}

impl ArticleGenerator {
    pub fn new(author: impl Into<String>) -> Self {
        Self {
            author: author.into(),
        }
    }

    pub fn from_config(config: &GeneratorConfig) -> Self {
        Self::new(config.get_str("author").unwrap_or(DEFAULT_AUTHOR))
    }
}

/// Registry factory for [`ArticleGenerator`].
pub fn factory(config: GeneratorConfig) -> Result<Box<dyn ContentGenerator>, BoxError> {
    Ok(Box::new(ArticleGenerator::from_config(&config)))
}

#[async_trait]
impl ContentGenerator for ArticleGenerator {
    async fn generate(
        &self,
        ctx: &RunContext,
        request: &ContentRequest,
        assistant: &dyn Assistant,
    ) -> Result<Document, BoxError> {
        let topic = request
            .get_str("topic")
            .filter(|t| !t.trim().is_empty())
            .ok_or("request body is missing 'topic'")?;
        let wanted = request
            .body
            .get("sections")
            .and_then(Value::as_u64)
            .unwrap_or(DEFAULT_SECTIONS)
            .clamp(1, MAX_SECTIONS) as usize;

        info!(topic, sections = wanted, "[ARTICLE] Requesting outline");
        let prompt = format!(
            "Plan an article about: {topic}\n\
             Give it a title and exactly {wanted} sections. For each section give a short \
             title and a one-sentence brief of what it covers."
        );
        let outline = assistant
            .structured_ask(ctx, PERSONA, &prompt, &outline_schema())
            .await?;
        let outline: Outline = serde_json::from_value(outline)?;
        if outline.sections.is_empty() {
            return Err("outline has no sections".into());
        }

        let mut document = Document::new(outline.title, self.author.clone());
        for section in outline.sections.into_iter().take(wanted) {
            debug!(section = %section.title, "[ARTICLE] Writing section");
            let prompt = format!(
                "Article: {}\nWrite the section \"{}\". It covers: {}\n\
                 Write three to five paragraphs.",
                document.title, section.title, section.brief
            );
            let body = assistant.ask(ctx, PERSONA, &prompt).await?;
            document.add_section(section.title, &body);
        }

        info!(
            title = %document.title,
            sections = document.sections.len(),
            "[ARTICLE] Draft complete"
        );
        Ok(document)
    }
}
