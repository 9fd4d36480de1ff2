use once_cell::sync::Lazy;

use super::{apply_rules, Rule};

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::template("fenced code block", r"(?s)```[a-zA-Z]*\n?(.*?)```", "${1}"),
        Rule::template("inline code", r"`([^`]+)`", "${1}"),
        // Images first: the link rules would otherwise leave a stray "!".
        Rule::template("inline image", r"!\[([^\]]*)\]\([^)]*\)", "${1}"),
        Rule::template("reference image", r"!\[([^\]]*)\]\[[^\]]*\]", "${1}"),
        Rule::template("inline link", r"\[([^\]]+)\]\([^)]*\)", "${1}"),
        Rule::template("reference link", r"\[([^\]]+)\]\[[^\]]*\]", "${1}"),
        Rule::template("strikethrough", r"~~([^~]+)~~", "${1}"),
        Rule::template("bold asterisks", r"\*\*([^*]+)\*\*", "${1}"),
        Rule::template("bold underscores", r"__([^_]+)__", "${1}"),
        Rule::template("italic asterisks", r"\*([^*\n]+)\*", "${1}"),
        Rule::template("italic underscores", r"_([^_\n]+)_", "${1}"),
        Rule::template("header line", r"(?m)^#{1,6}(?:[ \t].*)?$", ""),
        Rule::template("horizontal rule", r"(?m)^[-*_]{3,}\s*$", ""),
        Rule::template("blockquote marker", r"(?m)^>\s+(.+)$", "${1}"),
        Rule::template("bullet list marker", r"(?m)^(\s*)[-*+]\s+(.+)$", "${1}${2}"),
        Rule::template("numbered list marker", r"(?m)^(\s*)\d+\.\s+(.+)$", "${1}${2}"),
        Rule::template("blank line run", r"\n{3,}", "\n\n"),
    ]
});

/// Ordered substitution rules of the Markdown stage.
pub fn markdown_rules() -> &'static [Rule] {
    &RULES
}

/// Removes Markdown syntax, keeping the readable text.
///
/// Header lines are dropped entirely; list, blockquote and emphasis markers are
/// removed around their content.
pub fn clean_markdown(text: &str) -> String {
    apply_rules(text, markdown_rules()).trim().to_owned()
}
