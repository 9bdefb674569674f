use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::ops::Range;

/// Built-in URL pattern. Trailing punctuation such as `.`, `,` or `)` is only
/// part of a match when more URL characters follow it.
pub const URL_PATTERN: &str =
    r"\bhttps?://[-A-Za-z0-9+&@#/%?=~_()|!:,.;']*[-A-Za-z0-9+&@#/%=~_(|]";

lazy_static! {
    static ref URL_REGEX: Regex = Regex::new(URL_PATTERN).expect("Invalid URL_PATTERN regex");
}

/// A located match, as a half-open byte range over the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UrlSpan {
    pub start: usize,
    pub end: usize,
}

impl UrlSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn as_str<'a>(&self, text: &'a str) -> Option<&'a str> {
        text.get(self.range())
    }
}

#[derive(Debug, Clone)]
pub struct UrlMatcher {
    regex: Regex,
}

impl UrlMatcher {
    /// Matcher for the built-in pattern only.
    pub fn builtin() -> Self {
        Self {
            regex: URL_REGEX.clone(),
        }
    }

    /// Builds a matcher from the built-in pattern plus an optional
    /// supplementary one. Blank supplementary patterns are ignored.
    pub fn new(supplementary: Option<&str>) -> Result<Self> {
        match supplementary.map(str::trim).filter(|p| !p.is_empty()) {
            None => Ok(Self::builtin()),
            Some(extra) => {
                let pattern = combined_pattern(extra);
                let regex = Regex::new(&pattern)
                    .with_context(|| format!("Invalid file_folder_regex: {}", extra))?;
                Ok(Self { regex })
            }
        }
    }

    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }

    /// All non-overlapping, leftmost-first matches in text order.
    pub fn find_all(&self, text: &str) -> Vec<UrlSpan> {
        self.regex
            .find_iter(text)
            .filter(|m| !m.is_empty())
            .map(|m| UrlSpan::new(m.start(), m.end()))
            .collect()
    }
}

impl Default for UrlMatcher {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Alternation of the built-in pattern and a supplementary one, each in its
/// own group so either branch can match.
pub fn combined_pattern(supplementary: &str) -> String {
    format!("({})|({})", URL_PATTERN, supplementary)
}
