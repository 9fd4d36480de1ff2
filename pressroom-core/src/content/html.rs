use once_cell::sync::Lazy;

use super::{apply_rules, trim_lines, Rule};

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::template(
            "image alt text",
            r#"(?i)<img\b[^>]*alt\s*=\s*["']([^"']*)["'][^>]*>"#,
            "${1}",
        ),
        Rule::template("image without alt", r"(?i)<img\b[^>]*>", ""),
        Rule::template("line break", r"(?i)<br\s*/?>", "\n"),
        Rule::template("anchor", r"(?is)<a\b[^>]*>(.*?)</a>", "${1}"),
        Rule::template("preformatted block", r"(?is)<pre\b[^>]*>(.*?)</pre>", "${1}"),
        Rule::template("code span", r"(?is)<code\b[^>]*>(.*?)</code>", "${1}"),
        Rule::template("strikethrough tag", r"(?i)</?(?:s|strike|del)\b[^>]*>", ""),
        Rule::template("underline tag", r"(?i)</?u\b[^>]*>", ""),
        Rule::template("bold tag", r"(?i)</?(?:b|strong)\b[^>]*>", ""),
        Rule::template("italic tag", r"(?i)</?(?:i|em)\b[^>]*>", ""),
        Rule::template("header tag", r"(?i)</?h[1-6]\b[^>]*>", "\n"),
        Rule::template("horizontal rule tag", r"(?i)<hr\b[^>]*>", "\n"),
        Rule::template("blockquote tag", r"(?i)</?blockquote\b[^>]*>", "\n"),
        Rule::template("list container tag", r"(?i)</?(?:ul|ol)\b[^>]*>", "\n"),
        Rule::template("list item tag", r"(?i)</?li\b[^>]*>", "\n"),
        Rule::template("paragraph tag", r"(?i)</?p\b[^>]*>", "\n"),
        Rule::template("div tag", r"(?i)</?div\b[^>]*>", ""),
        Rule::template("entity nbsp", r"&nbsp;", " "),
        Rule::template("entity lt", r"&lt;", "<"),
        Rule::template("entity gt", r"&gt;", ">"),
        Rule::template("entity quot", r"&quot;", "\""),
        Rule::template("entity apos", r"&apos;", "'"),
        Rule::template("entity numeric apostrophe", r"&#39;", "'"),
        Rule::template("entity mdash", r"&mdash;", "\u{2014}"),
        Rule::template("entity ndash", r"&ndash;", "\u{2013}"),
        // Last, so "&amp;lt;" decodes once to "&lt;" and not on to "<".
        Rule::template("entity amp", r"&amp;", "&"),
        Rule::template("blank line run", r"\n{3,}", "\n\n"),
        Rule::template("space run", r"[ \t]+", " "),
    ]
});

/// Ordered substitution rules of the HTML stage.
pub fn html_rules() -> &'static [Rule] {
    &RULES
}

/// Removes HTML tags, keeping their text, and decodes the common named entities.
///
/// Block-level tags (headers, paragraphs, list items, blockquotes, `<hr>`) become
/// line breaks; inline tags are dropped. Images are replaced by their `alt` text.
pub fn clean_html(text: &str) -> String {
    trim_lines(&apply_rules(text, html_rules()))
}
