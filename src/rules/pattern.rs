//! Source pattern compilation and matching.
//!
//! Three pattern kinds:
//!
//! | Kind     | Example          | Matches                                   |
//! |----------|------------------|-------------------------------------------|
//! | exact    | `/diwali2020`    | the identical path                        |
//! | wildcard | `/microsoft*`    | `*` = any character sequence              |
//! | param    | `/blog/:slug*`   | `:name` = one segment, `:name*` = the rest |
//!
//! Param patterns carry at most one token. The token's capture is
//! substituted into the destination template wherever the template names it.

use regex::Regex;

use super::RuleError;
use crate::utils::pattern::escape_literal;

/// Capture group name used for the single parameter token.
const GROUP: &str = "param";

/// Stand-in for `*` and parameter captures in [`Pattern::sample`].
const SAMPLE: &str = "sample";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    Exact,
    Wildcard,
    Param,
}

impl PatternKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Wildcard => "wildcard",
            Self::Param => "param",
        }
    }
}

/// A `:name` or `:name*` token inside a pattern or template.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    name: String,
    /// `:name*` (remainder) rather than `:name` (one segment).
    rest: bool,
    /// Byte range of the whole token, including `:` and `*`.
    start: usize,
    end: usize,
}

/// A compiled source pattern.
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    kind: PatternKind,
    regex: Option<Regex>,
    token: Option<Token>,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Self, RuleError> {
        let malformed = |reason: &str| RuleError::MalformedPattern {
            pattern: source.to_string(),
            reason: reason.to_string(),
        };

        if source.is_empty() {
            return Err(malformed("pattern is empty"));
        }
        if !source.starts_with('/') {
            return Err(malformed("pattern must start with `/`"));
        }

        let mut tokens = scan_tokens(source);
        if tokens.len() > 1 {
            return Err(malformed("only one parameter token is supported"));
        }

        if let Some(token) = tokens.pop() {
            let prefix = &source[..token.start];
            let suffix = &source[token.end..];
            if prefix.contains('*') || suffix.contains('*') {
                return Err(malformed("`*` cannot be combined with a parameter token"));
            }
            let regex = compile(source, &param_regex(prefix, &token, suffix))?;
            return Ok(Self {
                source: source.to_string(),
                kind: PatternKind::Param,
                regex: Some(regex),
                token: Some(token),
            });
        }

        if source.contains('*') {
            let body = source
                .split('*')
                .map(escape_literal)
                .collect::<Vec<_>>()
                .join(".*");
            let regex = compile(source, &format!("^{body}$"))?;
            return Ok(Self {
                source: source.to_string(),
                kind: PatternKind::Wildcard,
                regex: Some(regex),
                token: None,
            });
        }

        Ok(Self {
            source: source.to_string(),
            kind: PatternKind::Exact,
            regex: None,
            token: None,
        })
    }

    #[inline]
    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// A path this pattern matches, with `*` and the token filled in.
    pub fn sample(&self) -> String {
        match self.kind {
            PatternKind::Exact => self.source.clone(),
            PatternKind::Wildcard => self.source.replace('*', SAMPLE),
            PatternKind::Param => self.substitute(&self.source, Some(SAMPLE)),
        }
    }

    /// Name of the parameter token, if any.
    pub fn param(&self) -> Option<&str> {
        self.token.as_ref().map(|t| t.name.as_str())
    }

    pub fn matches(&self, path: &str) -> bool {
        match &self.regex {
            Some(re) => re.is_match(path),
            None => path == self.source,
        }
    }

    /// Match `path` and return the parameter capture.
    ///
    /// `None` when the path does not match. `Some(None)` for a match on a
    /// pattern without parameter token.
    pub fn capture<'p>(&self, path: &'p str) -> Option<Option<&'p str>> {
        let Some(re) = &self.regex else {
            return (path == self.source).then_some(None);
        };
        let caps = re.captures(path)?;
        if self.token.is_none() {
            return Some(None);
        }
        Some(Some(caps.name(GROUP).map_or("", |m| m.as_str())))
    }

    /// Check that `template` only references this pattern's token.
    pub fn check_template(&self, template: &str) -> Result<(), RuleError> {
        for token in scan_tokens(template) {
            if self.param() != Some(token.name.as_str()) {
                return Err(RuleError::UnknownToken {
                    destination: template.to_string(),
                    token: token.name,
                });
            }
        }
        Ok(())
    }

    /// Substitute `capture` for this pattern's token in `template`.
    ///
    /// Both `:name` and `:name*` spellings are replaced.
    pub fn substitute(&self, template: &str, capture: Option<&str>) -> String {
        let (Some(name), Some(value)) = (self.param(), capture) else {
            return template.to_string();
        };

        let mut out = String::with_capacity(template.len() + value.len());
        let mut last = 0;
        for token in scan_tokens(template) {
            if token.name == name {
                out.push_str(&template[last..token.start]);
                out.push_str(value);
                last = token.end;
            }
        }
        out.push_str(&template[last..]);
        out
    }
}

fn compile(source: &str, regex: &str) -> Result<Regex, RuleError> {
    Regex::new(regex).map_err(|e| RuleError::Regex {
        pattern: source.to_string(),
        source: e,
    })
}

/// Regex for a param pattern split around its token.
///
/// A rest token right after `/` makes that slash optional together with the
/// capture, so `/blog/:slug*` also matches `/blog`.
fn param_regex(prefix: &str, token: &Token, suffix: &str) -> String {
    let suffix = escape_literal(suffix);
    if !token.rest {
        let prefix = escape_literal(prefix);
        return format!("^{prefix}(?P<{GROUP}>[^/]+){suffix}$");
    }
    match prefix.strip_suffix('/') {
        Some(base) => {
            let base = escape_literal(base);
            format!("^{base}(?:/(?P<{GROUP}>.*))?{suffix}$")
        }
        None => {
            let prefix = escape_literal(prefix);
            format!("^{prefix}(?P<{GROUP}>.*){suffix}$")
        }
    }
}

/// Find `:ident` / `:ident*` tokens.
///
/// A `:` not followed by an identifier start (`https://`, `:8080`) is literal.
fn scan_tokens(text: &str) -> Vec<Token> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b':' {
            i += 1;
            continue;
        }
        let start = i;
        let mut end = i + 1;
        if end < bytes.len() && (bytes[end].is_ascii_alphabetic() || bytes[end] == b'_') {
            while end < bytes.len() && (bytes[end].is_ascii_alphanumeric() || bytes[end] == b'_')
            {
                end += 1;
            }
            let name = text[start + 1..end].to_string();
            let rest = bytes.get(end) == Some(&b'*');
            if rest {
                end += 1;
            }
            tokens.push(Token {
                name,
                rest,
                start,
                end,
            });
        }
        i = end;
    }

    tokens
}
