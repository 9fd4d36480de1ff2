//! # content: markup stripping and paragraph segmentation
//!
//! Generated text arrives as an unknown mix of Markdown, HTML, LaTeX and stray
//! backslash escapes. [`clean_text`] runs four independent stages over it, in a
//! fixed order, and always returns plain text:
//!
//! 1. [`markdown::clean_markdown`]
//! 2. [`html::clean_html`]
//! 3. [`latex::clean_latex`]
//! 4. [`escapes::clean_escapes`]
//!
//! LaTeX must run before the escape stage: LaTeX commands are recognised by their
//! leading backslash, which the escape stage deletes.
//!
//! Each stage is a pure function over a published, ordered list of [`Rule`]s
//! (`markdown_rules()`, `html_rules()`, ...). Later rules assume earlier rules
//! already ran, so the order is part of the contract and is asserted in the tests.
//!
//! Nothing here returns an error. Unbalanced or malformed markup is reduced to
//! whatever the remaining rules (and the final catch-alls) leave behind.

pub mod escapes;
pub mod html;
pub mod latex;
pub mod markdown;
pub mod paragraphs;

use regex::{Captures, Regex};

pub use escapes::{clean_escapes, escape_rules};
pub use html::{clean_html, html_rules};
pub use latex::{clean_latex, latex_rules};
pub use markdown::{clean_markdown, markdown_rules};
pub use paragraphs::split_paragraphs;

/// How a matched span is rewritten.
pub enum Replacement {
    /// A `regex` replacement template, e.g. `"${1}"`.
    Template(&'static str),
    /// Computed from the captures, for rewrites a template cannot express.
    With(fn(&Captures<'_>) -> String),
}

/// One substitution step of a cleaning stage.
pub struct Rule {
    /// Short, stable description of what the rule strips. Tests look rules up by it.
    pub intent: &'static str,
    pattern: Regex,
    replacement: Replacement,
}

impl Rule {
    pub(crate) fn template(intent: &'static str, pattern: &str, template: &'static str) -> Self {
        Self::build(intent, pattern, Replacement::Template(template))
    }

    pub(crate) fn with(
        intent: &'static str,
        pattern: &str,
        rewrite: fn(&Captures<'_>) -> String,
    ) -> Self {
        Self::build(intent, pattern, Replacement::With(rewrite))
    }

    fn build(intent: &'static str, pattern: &str, replacement: Replacement) -> Self {
        let pattern = Regex::new(pattern)
            .unwrap_or_else(|e| panic!("invalid pattern for rule '{intent}': {e}"));
        Self {
            intent,
            pattern,
            replacement,
        }
    }

    /// Applies this rule to every non-overlapping match in `text`.
    pub fn apply(&self, text: &str) -> String {
        match &self.replacement {
            Replacement::Template(template) => {
                self.pattern.replace_all(text, *template).into_owned()
            }
            Replacement::With(rewrite) => self
                .pattern
                .replace_all(text, |caps: &Captures<'_>| rewrite(caps))
                .into_owned(),
        }
    }
}

impl std::fmt::Debug for Rule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rule")
            .field("intent", &self.intent)
            .field("pattern", &self.pattern.as_str())
            .finish()
    }
}

/// Runs `rules` over `text` in order.
pub fn apply_rules(text: &str, rules: &[Rule]) -> String {
    rules
        .iter()
        .fold(text.to_owned(), |acc, rule| rule.apply(&acc))
}

/// Trims every line, then the whole text.
pub(crate) fn trim_lines(text: &str) -> String {
    text.split('\n')
        .map(str::trim)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_owned()
}

/// Strips Markdown, HTML, LaTeX and escape artifacts from `text`, in that order.
pub fn clean_text(text: &str) -> String {
    let result = clean_markdown(text);
    let result = clean_html(&result);
    let result = clean_latex(&result);
    clean_escapes(&result)
}
