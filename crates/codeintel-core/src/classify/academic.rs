//! Academic-content heuristic for documentation files

use lazy_static::lazy_static;
use regex::Regex;

/// Signals needed before a document counts as academic
pub const ACADEMIC_THRESHOLD: usize = 2;

lazy_static! {
    static ref SIGNALS: Vec<Regex> = [
        r"\\begin\{(theorem|lemma|proof|equation|align|abstract)\}",
        r"(?im)^\s*#*\s*(abstract|bibliography|references)\s*$",
        r"(?im)^\s*#*\s*(theorem|lemma|corollary|proposition|definition)\s+\d",
        r"(?i)\bproof\.",
        r"(?i)\barxiv:\s*\d{4}\.\d{4,5}",
        r"(?i)\bdoi:\s*10\.\d{4,9}/",
        r"\$\$[^$]+\$\$",
        r"\\cite\{[^}]+\}",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect();
}

/// Number of distinct academic signals present in `text`
pub fn academic_score(text: &str) -> usize {
    SIGNALS.iter().filter(|re| re.is_match(text)).count()
}

pub fn is_academic(text: &str) -> bool {
    academic_score(text) >= ACADEMIC_THRESHOLD
}
