use regex::Regex;

use crate::error::{LedgerizeError, Result};
use crate::models::Rule;

/// Translate a glob pattern to an unanchored regex: `*` matches any
/// sequence (including empty), `?` any single character, everything else
/// is literal. No anchors — matching is a substring search, so a pattern
/// with no wildcards still matches anywhere in the description.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    for c in pattern.chars() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            _ => out.push_str(&regex::escape(&c.to_string())),
        }
    }
    out
}

/// A rule list with its patterns compiled once for the run.
pub struct CompiledRules<'a> {
    rules: Vec<(&'a Rule, Regex)>,
}

impl<'a> CompiledRules<'a> {
    pub fn compile(rules: &'a [Rule]) -> Result<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let regex = Regex::new(&glob_to_regex(&rule.pattern.to_lowercase()))
                .map_err(|e| LedgerizeError::Config(format!("bad pattern '{}': {e}", rule.pattern)))?;
            compiled.push((rule, regex));
        }
        Ok(Self { rules: compiled })
    }

    /// First rule (configured order) whose pattern is found anywhere in the
    /// lowercased description. Case-insensitive; an empty description only
    /// matches patterns that can match the empty string.
    pub fn match_rule(&self, description: &str) -> Option<&'a Rule> {
        let haystack = description.to_lowercase();
        self.rules
            .iter()
            .find(|(_, regex)| regex.is_match(&haystack))
            .map(|(rule, _)| *rule)
    }
}

/// One-shot variant for callers without a precompiled set.
pub fn match_rule<'a>(description: &str, rules: &'a [Rule]) -> Result<Option<&'a Rule>> {
    Ok(CompiledRules::compile(rules)?.match_rule(description))
}
