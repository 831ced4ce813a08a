//! Glob-set evaluation for override blocks.
//!
//! Paths are slash-separated and relative to the config root. `*` and `?`
//! stay within one path segment, `**` spans any number of segments, and a
//! pattern must match the whole path (`**/` at the front lets it float).

use crate::{ConfigError, Result};
use std::path::{Component, Path};

const MATCH_OPTIONS: glob::MatchOptions = glob::MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// A compiled, immutable set of glob patterns.
#[derive(Debug, Clone, Default)]
pub struct PatternSet {
    sources: Vec<String>,
    /// Compiled globs paired with the index of the source pattern they came from.
    globs: Vec<(usize, glob::Pattern)>,
}

impl PatternSet {
    /// Compile every pattern, failing on the first malformed one.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for (index, source) in patterns.into_iter().enumerate() {
            let source = source.as_ref();
            let normalized = normalize_pattern(source);
            if normalized.is_empty() {
                return Err(syntax_error(source, "empty pattern"));
            }

            let expanded = expand_braces(&normalized).map_err(|msg| syntax_error(source, msg))?;
            for alternative in expanded {
                let compiled = glob::Pattern::new(&alternative)
                    .map_err(|e| syntax_error(source, e.msg))?;
                set.globs.push((index, compiled));
            }
            set.sources.push(source.to_string());
        }
        tracing::trace!(
            patterns = set.sources.len(),
            globs = set.globs.len(),
            "Compiled pattern set"
        );
        Ok(set)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    /// The patterns as written in the config.
    #[must_use]
    pub fn patterns(&self) -> &[String] {
        &self.sources
    }

    /// Whether any pattern in the set matches `path`.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.matching_pattern(path).is_some()
    }

    /// The first source pattern (as written) that matches `path`.
    #[must_use]
    pub fn matching_pattern(&self, path: &str) -> Option<&str> {
        self.globs
            .iter()
            .find(|(_, glob)| glob.matches_with(path, MATCH_OPTIONS))
            .map(|(index, _)| self.sources[*index].as_str())
    }
}

impl PartialEq for PatternSet {
    fn eq(&self, other: &Self) -> bool {
        self.sources == other.sources
    }
}

impl Eq for PatternSet {}

/// Whether `path` is selected: matched by some include pattern (or the
/// include set is empty) and by no exclude pattern.
#[must_use]
pub fn matches(path: &str, include: &PatternSet, exclude: &PatternSet) -> bool {
    let included = include.is_empty() || include.is_match(path);
    included && !exclude.is_match(path)
}

/// Convert a file system path into the slash-separated form matched against
/// patterns, relative to `root` when the path lies under it.
#[must_use]
pub fn normalize_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(segment) => segments.push(segment.to_string_lossy().into_owned()),
            Component::ParentDir => segments.push("..".to_string()),
            Component::CurDir | Component::RootDir | Component::Prefix(_) => {}
        }
    }
    segments.join("/").replace('\\', "/")
}

fn syntax_error(pattern: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::PatternSyntax {
        pattern: pattern.to_string(),
        message: message.into(),
    }
}

/// Normalize a glob pattern for consistent matching
///
/// Handles:
/// - Leading "./" prefix (removes it)
/// - Leading "/" prefix (removes it - patterns are relative to the config root)
/// - Consecutive slashes (collapses to single slash)
fn normalize_pattern(pattern: &str) -> String {
    let mut normalized = pattern.trim();

    while let Some(rest) = normalized.strip_prefix("./") {
        normalized = rest;
    }
    let mut normalized = normalized.trim_start_matches('/').to_string();

    while normalized.contains("//") {
        normalized = normalized.replace("//", "/");
    }

    normalized
}

/// Expand brace patterns like "src/**/*.{ts,tsx}" into separate patterns.
///
/// Groups may repeat and nest: `{a,b}/{c,d{e,f}}` yields six patterns.
fn expand_braces(pattern: &str) -> std::result::Result<Vec<String>, &'static str> {
    let Some(open) = pattern.find(['{', '}']) else {
        return Ok(vec![pattern.to_string()]);
    };
    if pattern[open..].starts_with('}') {
        return Err("unmatched '}'");
    }

    let mut depth = 0usize;
    let mut close = None;
    let mut splits = Vec::new();
    for (offset, ch) in pattern[open..].char_indices() {
        let index = open + offset;
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(index);
                    break;
                }
            }
            ',' if depth == 1 => splits.push(index),
            _ => {}
        }
    }
    let close = close.ok_or("unclosed '{'")?;

    let before = &pattern[..open];
    let after = &pattern[close + 1..];
    let mut bounds = vec![open];
    bounds.extend(splits);
    bounds.push(close);

    let mut expanded = Vec::new();
    for window in bounds.windows(2) {
        let option = &pattern[window[0] + 1..window[1]];
        expanded.extend(expand_braces(&format!("{before}{option}{after}"))?);
    }
    Ok(expanded)
}
