//! Redirect rule table.
//!
//! An ordered list of `source pattern -> destination` rules. Rules are tried
//! in declaration order and the first match wins; there is no other
//! priority.

mod pattern;

pub use pattern::{Pattern, PatternKind};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rule table configuration errors.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("malformed pattern `{pattern}`: {reason}")]
    MalformedPattern { pattern: String, reason: String },

    #[error("destination `{destination}` references unknown token `:{token}`")]
    UnknownToken { destination: String, token: String },

    #[error("failed to compile pattern `{pattern}`")]
    Regex {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// A single redirect rule as declared in config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RedirectRule {
    /// Source pattern (exact, wildcard or parameterized).
    pub source: String,
    /// Destination template.
    pub destination: String,
    /// Permanent (308) or temporary (307) redirect.
    #[serde(default = "default_permanent")]
    pub permanent: bool,
}

fn default_permanent() -> bool {
    true
}

impl RedirectRule {
    pub fn new(source: impl Into<String>, destination: impl Into<String>, permanent: bool) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            permanent,
        }
    }
}

#[derive(Debug, Clone)]
struct CompiledRule {
    rule: RedirectRule,
    pattern: Pattern,
}

/// The rule that matched a path, with its substituted destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMatch<'a> {
    /// Position of the rule in the table.
    pub index: usize,
    pub rule: &'a RedirectRule,
    pub destination: String,
}

/// Ordered, compiled rule table.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    rules: Vec<CompiledRule>,
}

impl RuleTable {
    /// Compile every rule. Fails on the first malformed rule.
    pub fn new(rules: Vec<RedirectRule>) -> Result<Self, RuleError> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                let pattern = Pattern::parse(&rule.source)?;
                pattern.check_template(&rule.destination)?;
                Ok(CompiledRule { rule, pattern })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;
        Ok(Self { rules })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&RedirectRule, PatternKind)> {
        self.rules.iter().map(|c| (&c.rule, c.pattern.kind()))
    }

    /// One sample source path per rule with the destination it is sent to.
    pub fn samples(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.rules.iter().map(|c| {
            let source = c.pattern.sample();
            let capture = c.pattern.capture(&source).flatten();
            let destination = c.pattern.substitute(&c.rule.destination, capture);
            (source, destination)
        })
    }

    /// First rule (in declaration order) matching `path`.
    pub fn first_match(&self, path: &str) -> Option<RuleMatch<'_>> {
        self.rules.iter().enumerate().find_map(|(index, c)| {
            let capture = c.pattern.capture(path)?;
            Some(RuleMatch {
                index,
                rule: &c.rule,
                destination: c.pattern.substitute(&c.rule.destination, capture),
            })
        })
    }

    /// Whether any rule matches `path`.
    pub fn matches_any(&self, path: &str) -> bool {
        self.rules.iter().any(|c| c.pattern.matches(path))
    }
}

/// Check a single path against a single pattern.
pub fn matches(path: &str, pattern: &str) -> Result<bool, RuleError> {
    Ok(Pattern::parse(pattern)?.matches(path))
}

/// Destination `path` would be sent to by `pattern -> template`, or `None`
/// when the pattern does not match.
pub fn destination_for(
    path: &str,
    pattern: &str,
    template: &str,
) -> Result<Option<String>, RuleError> {
    let pattern = Pattern::parse(pattern)?;
    pattern.check_template(template)?;
    Ok(pattern
        .capture(path)
        .map(|capture| pattern.substitute(template, capture)))
}
