use std::path::Path;

use regex::Regex;

use crate::error::Result;

pub const MATCH_ALL: &str = ".*";

/// Selects compile commands by regex search over their absolute path.
/// All patterns are combined into a single alternation.
#[derive(Debug, Clone)]
pub struct PathFilter {
    regex: Regex,
}

impl PathFilter {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let joined = if patterns.is_empty() {
            MATCH_ALL.to_string()
        } else {
            patterns
                .iter()
                .map(AsRef::as_ref)
                .collect::<Vec<_>>()
                .join("|")
        };
        Ok(Self {
            regex: Regex::new(&joined)?,
        })
    }

    pub fn matches(&self, path: &Path) -> bool {
        self.regex.is_match(&path.to_string_lossy())
    }
}
