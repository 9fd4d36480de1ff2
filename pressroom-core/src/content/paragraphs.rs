use once_cell::sync::Lazy;
use regex::Regex;

static PARAGRAPH_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n\s*\n").expect("paragraph break pattern"));

const TERMINALS: [char; 3] = ['.', '!', '?'];

/// Splits `text` on blank lines and keeps only the blocks that read like prose.
///
/// A block survives when it is non-empty after trimming, contains at least two
/// terminal characters (`.`, `!`, `?`) and ends in one. Terminal characters are
/// counted, not sentences, so "U.S.A." alone already counts three.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .filter(|candidate| !is_single_sentence(candidate))
        .filter(|candidate| has_ending_punctuation(candidate))
        .map(str::to_owned)
        .collect()
}

/// True when `text` holds at most one terminal character.
pub fn is_single_sentence(text: &str) -> bool {
    text.chars().filter(|c| TERMINALS.contains(c)).count() <= 1
}

pub fn has_ending_punctuation(text: &str) -> bool {
    text.chars().last().is_some_and(|c| TERMINALS.contains(&c))
}
