//! Line classification for preprocessor directives.

use std::path::{Component, Path};
use std::sync::OnceLock;

use regex::Regex;

/// Literal that marks a line as an inclusion directive.
pub const INCLUDE_MARKER: &str = "#include";

/// Include guard every library header carries near its top. Guards are one line;
/// a line is a guard when, trimmed, it equals the literal.
pub const DEFAULT_GUARD: &str = "#pragma once";

const INCLUDE_PATTERN: &str = r"^#include\s*<([^<>]+)>";

fn include_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(INCLUDE_PATTERN).expect("include pattern is a valid regex"))
}

/// What a single source line means to the amalgamator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive<'a> {
    /// `#include <target>`; `target` is the bracketed text verbatim.
    Include { target: &'a str },
    /// The include-guard line.
    Guard,
    /// Anything else, copied through subject to blank-line collapsing.
    Text,
}

/// Why a directive line was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Malformed {
    pub reason: String,
}

impl Malformed {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DirectiveParser {
    guard: String,
}

impl Default for DirectiveParser {
    fn default() -> Self {
        Self::new(DEFAULT_GUARD)
    }
}

impl DirectiveParser {
    pub fn new(guard: impl Into<String>) -> Self {
        Self {
            guard: guard.into(),
        }
    }

    pub fn guard(&self) -> &str {
        &self.guard
    }

    /// Classify one line. Lines starting with [`INCLUDE_MARKER`] must carry a
    /// bracketed target; anything after the closing `>` is ignored.
    pub fn classify<'a>(&self, line: &'a str) -> Result<Directive<'a>, Malformed> {
        if line.starts_with(INCLUDE_MARKER) {
            let caps = include_regex()
                .captures(line)
                .ok_or_else(|| Malformed::new("expected `#include <target>`"))?;
            let target = caps
                .get(1)
                .map(|m| m.as_str().trim())
                .filter(|t| !t.is_empty())
                .ok_or_else(|| Malformed::new("empty include target"))?;
            return Ok(Directive::Include { target });
        }

        if !self.guard.is_empty() && line.trim() == self.guard {
            return Ok(Directive::Guard);
        }

        Ok(Directive::Text)
    }
}

/// A target is local when it lives in the library's own namespace.
pub fn is_local(target: &str, prefix: &str) -> bool {
    target.starts_with(prefix)
}

/// Local targets must stay inside the include root: relative, no `..`.
pub fn validate_identifier(target: &str) -> Result<(), Malformed> {
    let path = Path::new(target);
    for component in path.components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => {
                return Err(Malformed::new("include target escapes the include root"))
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Malformed::new("include target must be a relative path"))
            }
        }
    }
    Ok(())
}
