//! Fixed phrase rules that flag gendered or loaded wording and suggest a
//! neutral alternative. Independent of the learned model.

use std::borrow::Cow;

use regex::{NoExpand, Regex, RegexBuilder};
use serde::Serialize;

use crate::Result;

/// One flagged phrase with its hint and neutral replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PhraseRule {
    pub phrase: String,
    pub hint: String,
    pub replacement: String,
}

impl PhraseRule {
    pub fn new(
        phrase: impl Into<String>,
        hint: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            phrase: phrase.into(),
            hint: hint.into(),
            replacement: replacement.into(),
        }
    }
}

const DEFAULT_RULES: [(&str, &str, &str); 11] = [
    ("female engineer", "Use the role without gender unless relevant.", "engineer"),
    ("female leader", "Use the role without gender unless relevant.", "leader"),
    ("girls", "Use when age matters; otherwise consider \u{201c}women.\u{201d}", "women"),
    (
        "guys",
        "Use a more inclusive word like \u{201c}everyone\u{201d} or \u{201c}folks.\u{201d}",
        "everyone",
    ),
    ("women shouldn't", "Avoid generalizations about a group.", "people shouldn't"),
    ("men shouldn't", "Avoid generalizations about a group.", "people shouldn't"),
    ("women can't", "Avoid blanket limitations by gender.", "people can't"),
    ("men can't", "Avoid blanket limitations by gender.", "people can't"),
    ("hysterical", "Loaded descriptor; try neutral language.", "overwhelmed"),
    ("bossy", "Loaded descriptor; try specific behavior instead.", "assertive"),
    ("emotional", "Loaded descriptor; be specific and fair.", "passionate"),
];

/// A rule that matched, with the number of occurrences replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleHit {
    pub phrase: String,
    pub hint: String,
    pub replacement: String,
    pub occurrences: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleAnalysis {
    /// HTML-escaped input with every match wrapped in `<mark>...</mark>`.
    pub highlighted: String,
    /// Input with every match replaced by its neutral alternative.
    pub improved: String,
    pub hits: Vec<RuleHit>,
}

impl RuleAnalysis {
    pub fn is_clean(&self) -> bool {
        self.hits.is_empty()
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: PhraseRule,
    pattern: Regex,
}

/// Ordered phrase rules, applied one after another.
///
/// Matching is case-insensitive and anchored on word boundaries, so
/// `men can't` does not fire inside `women can't`.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<CompiledRule>,
}

impl RuleSet {
    pub fn new(rules: impl IntoIterator<Item = PhraseRule>) -> Result<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let pattern = phrase_pattern(&rule.phrase)?;
                Ok(CompiledRule { rule, pattern })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { rules })
    }

    pub fn rules(&self) -> impl Iterator<Item = &PhraseRule> {
        self.rules.iter().map(|compiled| &compiled.rule)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn analyze(&self, text: &str) -> RuleAnalysis {
        let mut highlighted = escape_html(text).into_owned();
        let mut improved = text.to_owned();
        let mut hits = Vec::new();

        for CompiledRule { rule, pattern } in &self.rules {
            highlighted = pattern
                .replace_all(&highlighted, "<mark>$0</mark>")
                .into_owned();

            let occurrences = pattern.find_iter(&improved).count();
            if occurrences > 0 {
                improved = pattern
                    .replace_all(&improved, NoExpand(&rule.replacement))
                    .into_owned();
                hits.push(RuleHit {
                    phrase: rule.phrase.clone(),
                    hint: rule.hint.clone(),
                    replacement: rule.replacement.clone(),
                    occurrences,
                });
            }
        }

        RuleAnalysis {
            highlighted,
            improved,
            hits,
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        let rules = DEFAULT_RULES
            .iter()
            .map(|&(phrase, hint, replacement)| PhraseRule::new(phrase, hint, replacement))
            .map(|rule| CompiledRule {
                pattern: phrase_pattern(&rule.phrase)
                    .expect("built-in phrases compile to valid patterns"),
                rule,
            })
            .collect();
        Self { rules }
    }
}

fn phrase_pattern(phrase: &str) -> std::result::Result<Regex, regex::Error> {
    let starts_word = phrase.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = phrase.chars().last().is_some_and(char::is_alphanumeric);
    let pattern = format!(
        "{}{}{}",
        if starts_word { r"\b" } else { "" },
        regex::escape(phrase),
        if ends_word { r"\b" } else { "" },
    );
    RegexBuilder::new(&pattern).case_insensitive(true).build()
}

fn escape_html(text: &str) -> Cow<'_, str> {
    if !text.contains(['&', '<', '>']) {
        return Cow::Borrowed(text);
    }
    let mut escaped = String::with_capacity(text.len() + 8);
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(ch),
        }
    }
    Cow::Owned(escaped)
}
