//! In-memory article produced by a generator and handed to the publisher.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::content::{clean_text, split_paragraphs};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub title: String,
    pub author: String,
    pub sections: Vec<DocumentSection>,
}

/// A titled run of paragraphs.
///
/// `paragraphs` always comes out of [`split_paragraphs`]: no empty entries, no
/// single sentences, each ending in `.`, `!` or `?`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub title: String,
    pub paragraphs: Vec<String>,
}

impl Document {
    pub fn new(title: impl Into<String>, author: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            sections: Vec::new(),
        }
    }

    /// Appends a section, segmenting `body` into paragraphs.
    ///
    /// The section is kept even when no paragraph survives segmentation.
    pub fn add_section(&mut self, title: impl Into<String>, body: &str) {
        self.sections.push(DocumentSection {
            title: title.into(),
            paragraphs: split_paragraphs(body),
        });
    }

    /// Strips markup from every text field in place.
    ///
    /// Cleaned paragraphs are segmented again, so a paragraph that was only
    /// markup, or that no longer ends in terminal punctuation, is dropped.
    pub fn clean(&mut self) {
        self.title = clean_text(&self.title);
        self.author = clean_text(&self.author);
        for section in &mut self.sections {
            section.title = clean_text(&section.title);
            section.paragraphs = section
                .paragraphs
                .iter()
                .map(|paragraph| clean_text(paragraph))
                .flat_map(|paragraph| split_paragraphs(&paragraph))
                .collect();
        }
    }

    pub fn paragraph_count(&self) -> usize {
        self.sections.iter().map(|s| s.paragraphs.len()).sum()
    }

    /// Characters of prose: section titles and paragraphs.
    pub fn content_len(&self) -> usize {
        self.sections
            .iter()
            .map(|s| {
                s.title.chars().count()
                    + s.paragraphs
                        .iter()
                        .map(|p| p.chars().count())
                        .sum::<usize>()
            })
            .sum()
    }
}

/// Plain-text rendering with Markdown-style headings, used for previews.
impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "# {}", self.title)?;
        writeln!(f)?;
        writeln!(f, "{}", self.author)?;
        for section in &self.sections {
            writeln!(f)?;
            writeln!(f, "## {}", section.title)?;
            for paragraph in &section.paragraphs {
                writeln!(f)?;
                writeln!(f, "{paragraph}")?;
            }
        }
        Ok(())
    }
}
