use crate::types::{Paper, Result};
use std::path::Path;
use tracing::{info, warn};

/// Keyword ruleset: each rule is an AND of keywords, the rules are OR'ed.
///
/// File format: one rule per line, keywords separated by whitespace,
/// blank lines and `#` comments ignored. Keywords are matched lowercase.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordRules {
    rules: Vec<Vec<String>>,
}

impl KeywordRules {
    pub fn new(rules: Vec<Vec<String>>) -> Self {
        let rules = rules
            .into_iter()
            .map(|rule| {
                rule.into_iter()
                    .map(|kw| kw.trim().to_lowercase())
                    .filter(|kw| !kw.is_empty())
                    .collect::<Vec<_>>()
            })
            .filter(|rule| !rule.is_empty())
            .collect();
        Self { rules }
    }

    pub fn parse(content: &str) -> Self {
        let rules = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| line.split_whitespace().map(str::to_string).collect())
            .collect();
        Self::new(rules)
    }

    /// Read rules from `path`. A missing file means "accept everything".
    pub fn load(path: &Path) -> Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(content) => {
                let rules = Self::parse(&content);
                info!("Loaded {} keyword rules from {}", rules.len(), path.display());
                Ok(rules)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(
                    "Keyword config file not found: {}; accepting all papers",
                    path.display()
                );
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn rules(&self) -> &[Vec<String>] {
        &self.rules
    }

    /// Union of the keywords of every satisfied rule, in rule order.
    /// `None` when no rule is fully satisfied.
    pub fn matched_keywords(&self, text: &str) -> Option<Vec<String>> {
        let text = text.to_lowercase();
        let mut matched: Vec<String> = Vec::new();
        let mut any_rule = false;

        for rule in &self.rules {
            if rule.iter().all(|kw| contains_word(&text, kw)) {
                any_rule = true;
                for kw in rule {
                    if !matched.contains(kw) {
                        matched.push(kw.clone());
                    }
                }
            }
        }

        any_rule.then_some(matched)
    }
}

pub struct KeywordFilter {
    rules: KeywordRules,
}

impl KeywordFilter {
    pub fn new(rules: KeywordRules) -> Self {
        Self { rules }
    }

    /// Keep the papers that satisfy at least one rule, annotating `keywords` and `keyword_score`.
    pub fn filter(&self, papers: Vec<Paper>) -> Vec<Paper> {
        if self.rules.is_empty() {
            info!("No keyword rules defined, accepting all {} papers", papers.len());
            return papers
                .into_iter()
                .map(|mut paper| {
                    paper.keywords = Vec::new();
                    paper.keyword_score = 0;
                    paper
                })
                .collect();
        }

        let total = papers.len();
        let filtered: Vec<Paper> = papers
            .into_iter()
            .filter_map(|mut paper| {
                let keywords = self.rules.matched_keywords(&paper.search_text())?;
                paper.keyword_score = keywords.len();
                paper.keywords = keywords;
                Some(paper)
            })
            .collect();

        info!("Filtered {} papers out of {} (matched keywords)", filtered.len(), total);
        filtered
    }
}

/// Whole-word search: the match must start and end on a word boundary,
/// a word character being alphanumeric or `_`.
pub fn contains_word(haystack: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }

    let mut from = 0;
    while let Some(pos) = haystack[from..].find(needle) {
        let start = from + pos;
        let end = start + needle.len();
        if is_boundary(haystack, start) && is_boundary(haystack, end) {
            return true;
        }
        // Step one character so overlapping candidates are still considered
        from = start + haystack[start..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_boundary(text: &str, idx: usize) -> bool {
    let before = text[..idx].chars().next_back().is_some_and(is_word_char);
    let after = text[idx..].chars().next().is_some_and(is_word_char);
    before != after
}
