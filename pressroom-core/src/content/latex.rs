use once_cell::sync::Lazy;
use regex::Captures;

use super::{apply_rules, trim_lines, Rule};

/// Anything but a letter, space, `*` or `\` can delimit `\verb`.
const VERB_DELIMITERS: &str = "|!\"#$%&'()+,-./:;<=>?@[]^_`{}~";

/// One alternative per delimiter; the regex crate has no backreferences.
fn verbatim_pattern() -> String {
    let alternatives: Vec<String> = VERB_DELIMITERS
        .chars()
        .map(|delimiter| {
            let d = regex::escape(&delimiter.to_string());
            format!("{d}([^{d}\n]*){d}")
        })
        .collect();
    format!(r"\\verb\*?(?:{})", alternatives.join("|"))
}

/// Body of whichever delimiter alternative matched.
fn verbatim(caps: &Captures<'_>) -> String {
    caps.iter()
        .skip(1)
        .flatten()
        .next()
        .map(|m| m.as_str().to_owned())
        .unwrap_or_default()
}

/// `\item` keeps its text (braced or bare) on a line of its own.
fn list_item(caps: &Captures<'_>) -> String {
    let text = caps
        .get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().trim())
        .unwrap_or_default();
    format!("{text}\n")
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        Rule::template("comment", r"(?m)(^|[^\\])%.*$", "${1}"),
        // Display math before inline math: "$$" would otherwise pair up as two "$...$".
        // Each takes the surrounding blanks with it so exactly one space remains.
        Rule::template("display math brackets", r"(?s)[ \t]*\\\[.*?\\\][ \t]*", " "),
        Rule::template("display math dollars", r"(?s)[ \t]*\$\$.*?\$\$[ \t]*", " "),
        Rule::template("inline math parens", r"(?s)[ \t]*\\\(.*?\\\)[ \t]*", " "),
        Rule::template("inline math dollars", r"[ \t]*\$[^$\n]+\$[ \t]*", " "),
        Rule::template("href", r"\\href\{[^}]*\}\{([^}]+)\}", "${1}"),
        Rule::template("url", r"\\url\{([^}]+)\}", "${1}"),
        Rule::with("verbatim", &verbatim_pattern(), verbatim),
        Rule::template("texttt", r"\\texttt\{([^}]+)\}", "${1}"),
        Rule::template("sout", r"\\sout\{([^}]+)\}", "${1}"),
        Rule::template("underline", r"\\underline\{([^}]+)\}", "${1}"),
        Rule::template("textbf", r"\\textbf\{([^}]+)\}", "${1}"),
        Rule::template("bfseries", r"\\bfseries\b", ""),
        Rule::template("textit", r"\\textit\{([^}]+)\}", "${1}"),
        Rule::template("emph", r"\\emph\{([^}]+)\}", "${1}"),
        Rule::template("itshape", r"\\itshape\b", ""),
        Rule::template("part", r"\\part\*?\{([^}]+)\}", "${1}\n\n"),
        Rule::template("chapter", r"\\chapter\*?\{([^}]+)\}", "${1}\n\n"),
        Rule::template("section", r"\\section\*?\{([^}]+)\}", "${1}\n\n"),
        Rule::template("subsection", r"\\subsection\*?\{([^}]+)\}", "${1}\n"),
        Rule::template("subsubsection", r"\\subsubsection\*?\{([^}]+)\}", "${1}\n"),
        Rule::template("paragraph", r"\\paragraph\*?\{([^}]+)\}", "${1}\n"),
        Rule::template("subparagraph", r"\\subparagraph\*?\{([^}]+)\}", "${1}\n"),
        Rule::template("quote environment", r"(?s)\\begin\{quote\}(.*?)\\end\{quote\}", "${1}"),
        Rule::template(
            "quotation environment",
            r"(?s)\\begin\{quotation\}(.*?)\\end\{quotation\}",
            "${1}",
        ),
        Rule::template(
            "list environment",
            r"(?s)\\begin\{(?:itemize|enumerate)\}(.*?)\\end\{(?:itemize|enumerate)\}",
            "${1}",
        ),
        Rule::with(
            "list item",
            r"\\item\s*(?:\[[^\]]*\])?\s*(?:\{([^}]+)\}|([^\\{]+))",
            list_item,
        ),
        Rule::template("rule", r"\\hrule\b|\\rule\{[^}]*\}\{[^}]*\}", ""),
        Rule::template("center environment", r"(?s)\\begin\{center\}(.*?)\\end\{center\}", "${1}"),
        Rule::template(
            "flushleft environment",
            r"(?s)\\begin\{flushleft\}(.*?)\\end\{flushleft\}",
            "${1}",
        ),
        Rule::template(
            "flushright environment",
            r"(?s)\\begin\{flushright\}(.*?)\\end\{flushright\}",
            "${1}",
        ),
        Rule::template(
            "layout command",
            r"\\(?:newpage|clearpage|pagebreak|vspace|hspace|vfill|hfill|label|ref|cite|footnote|maketitle|tableofcontents)\b\*?(?:\{[^}]*\})?",
            "",
        ),
        // Catch-all; must stay after every rule that needs to see a command name.
        Rule::template("any command", r"\\[a-zA-Z]+\b\*?", ""),
        Rule::template("blank line run", r"\n{3,}", "\n\n"),
        Rule::template("long space run", r"[ \t]{3,}", " "),
    ]
});

/// Ordered substitution rules of the LaTeX stage.
pub fn latex_rules() -> &'static [Rule] {
    &RULES
}

/// Removes LaTeX commands, environments, math and comments, keeping readable text.
///
/// Math is replaced by a single space. Sectioning commands keep their title on its
/// own line. Runs of one or two spaces are left alone; three or more collapse.
pub fn clean_latex(text: &str) -> String {
    trim_lines(&apply_rules(text, latex_rules()))
}
