use once_cell::sync::Lazy;

use super::{apply_rules, Rule};

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::template("octal escape", r"\\[0-7]{1,3}", ""),
        Rule::template("hex escape", r"\\x[0-9A-Fa-f]{1,2}", ""),
        Rule::template("short unicode escape", r"\\u[0-9A-Fa-f]{4}", ""),
        Rule::template("long unicode escape", r"\\U[0-9A-Fa-f]{8}", ""),
        Rule::template("control character", r"[\n\r\t\x08\x0c\x0b\x07]", ""),
        Rule::template("backslash", r"\\", ""),
    ]
});

/// Ordered substitution rules of the escape stage.
pub fn escape_rules() -> &'static [Rule] {
    &RULES
}

/// Deletes escape sequences, control characters and any remaining backslash.
///
/// Escapes are removed, never decoded: `\x41` disappears rather than becoming `A`.
/// Newlines count as control characters, so the output is always a single line.
pub fn clean_escapes(text: &str) -> String {
    apply_rules(text, escape_rules())
}
