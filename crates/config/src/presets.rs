//! Named configs that others can extend.

use crate::config::{ConfigFile, EXTENDS_KEY};
use crate::value::{ConfigRecord, Value};
use crate::{ConfigError, Result};
use std::collections::HashMap;

/// Supplies the record behind an extends identifier.
///
/// Loaders run before resolution, never during it: the resolver only reads
/// an already materialized [`Presets`] registry.
pub trait Loader: Send + Sync {
    /// Fetch the config named `identifier`.
    ///
    /// Returns [`ConfigError::NotFound`] if nothing is registered under
    /// that name.
    fn lookup(&self, identifier: &str) -> Result<ConfigRecord>;

    /// The registry key for `identifier` as written by the config registered
    /// under `referrer` (`None` for the root config).
    ///
    /// Identifiers are used as written unless the loader knows where they
    /// live.
    fn canonicalize(&self, identifier: &str, referrer: Option<&str>) -> String {
        let _ = referrer;
        identifier.to_string()
    }
}

/// The materialized registry of extendable configs.
///
/// Records are parsed into [`ConfigFile`]s on insertion, so a preset with a
/// malformed override pattern is rejected when it is registered.
#[derive(Debug, Clone, Default)]
pub struct Presets {
    entries: HashMap<String, PresetEntry>,
}

#[derive(Debug, Clone)]
struct PresetEntry {
    raw: ConfigRecord,
    parsed: ConfigFile,
}

impl Presets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `record` under `identifier`, replacing any earlier entry.
    pub fn insert(&mut self, identifier: impl Into<String>, record: ConfigRecord) -> Result<()> {
        let identifier = identifier.into();
        let parsed = ConfigFile::from_record(record.clone())?;
        tracing::debug!(identifier = %identifier, extends = parsed.extends().len(), "Registered preset");
        self.entries.insert(
            identifier,
            PresetEntry {
                raw: record,
                parsed,
            },
        );
        Ok(())
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, identifier: impl Into<String>, record: ConfigRecord) -> Result<Self> {
        self.insert(identifier, record)?;
        Ok(self)
    }

    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&ConfigFile> {
        self.entries.get(identifier).map(|entry| &entry.parsed)
    }

    #[must_use]
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries.contains_key(identifier)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered identifiers, sorted.
    #[must_use]
    pub fn identifiers(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Build the error for a missing identifier, with a "did you mean"
    /// suggestion when a registered name is close.
    #[must_use]
    pub fn not_found(&self, identifier: &str) -> ConfigError {
        ConfigError::NotFound {
            identifier: identifier.to_string(),
            suggestion: closest_match(identifier, self.entries.keys().map(String::as_str)),
        }
    }

    /// Walk the extends closure of `roots` through `loader` and register
    /// every config reached.
    ///
    /// Identifiers are registered under the key [`Loader::canonicalize`]
    /// gives them, and every registered config's `extends` is rewritten to
    /// those keys. Returns the keys for `roots`, in order.
    ///
    /// Identifiers already present are not fetched again, so this doubles as
    /// a way to top up an existing registry.
    #[tracing::instrument(skip(self, roots, loader), fields(roots = roots.len()))]
    pub fn materialize(&mut self, roots: &[String], loader: &dyn Loader) -> Result<Vec<String>> {
        let roots: Vec<String> = roots
            .iter()
            .map(|identifier| loader.canonicalize(identifier, None))
            .collect();

        let mut pending: Vec<String> = roots.iter().rev().cloned().collect();
        while let Some(identifier) = pending.pop() {
            if self.contains(&identifier) {
                continue;
            }
            tracing::debug!(identifier = %identifier, "Loading extends target");
            let mut record = loader.lookup(&identifier)?;

            let extends: Vec<String> = ConfigFile::from_record(record.clone())?
                .extends()
                .iter()
                .map(|target| loader.canonicalize(target, Some(&identifier)))
                .collect();
            if !extends.is_empty() {
                let keys = extends.iter().map(|key| Value::from(key.as_str())).collect();
                record.insert(EXTENDS_KEY, Value::List(keys));
            }

            pending.extend(extends.into_iter().rev());
            self.insert(identifier, record)?;
        }
        tracing::debug!(presets = self.len(), "Materialized presets");
        Ok(roots)
    }
}

impl Loader for Presets {
    fn lookup(&self, identifier: &str) -> Result<ConfigRecord> {
        self.entries
            .get(identifier)
            .map(|entry| entry.raw.clone())
            .ok_or_else(|| self.not_found(identifier))
    }
}

/// Find the closest candidate by normalized Levenshtein similarity.
pub(crate) fn closest_match<'a>(
    identifier: &str,
    candidates: impl Iterator<Item = &'a str>,
) -> Option<String> {
    const THRESHOLD: f64 = 0.7;

    candidates
        .map(|candidate| (candidate, strsim::normalized_levenshtein(identifier, candidate)))
        .filter(|(_, score)| *score >= THRESHOLD)
        .max_by(|a, b| a.1.total_cmp(&b.1).then_with(|| b.0.cmp(a.0)))
        .map(|(candidate, _)| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record(value: serde_json::Value) -> ConfigRecord {
        ConfigRecord::from_json(value).unwrap()
    }

    /// Loader that counts lookups.
    struct CountingLoader {
        inner: Presets,
        calls: AtomicUsize,
    }

    impl Loader for CountingLoader {
        fn lookup(&self, identifier: &str) -> Result<ConfigRecord> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.lookup(identifier)
        }
    }

    #[test]
    fn test_lookup_missing_suggests_close_name() {
        let presets = Presets::new()
            .with("base-a", record(json!({"indent": 2})))
            .unwrap();

        let err = presets.lookup("base-b").unwrap_err();
        match err {
            ConfigError::NotFound {
                identifier,
                suggestion,
            } => {
                assert_eq!(identifier, "base-b");
                assert_eq!(suggestion.as_deref(), Some("base-a"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_lookup_missing_without_close_name() {
        let presets = Presets::new()
            .with("base-a", record(json!({"indent": 2})))
            .unwrap();
        let err = presets.lookup("nonexistent").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { suggestion: None, .. }));
    }

    #[test]
    fn test_insert_rejects_bad_override_patterns() {
        let mut presets = Presets::new();
        let err = presets
            .insert(
                "broken",
                record(json!({"overrides": [{"files": "a**", "rules": {}}]})),
            )
            .unwrap_err();
        assert!(matches!(err, ConfigError::PatternSyntax { .. }));
        assert!(presets.is_empty());
    }

    #[test]
    fn test_materialize_follows_nested_extends_once() {
        let source = Presets::new()
            .with("app", record(json!({"extends": ["shared", "style"]})))
            .unwrap()
            .with("shared", record(json!({"extends": "style", "env": {"es6": true}})))
            .unwrap()
            .with("style", record(json!({"rules": {"semi": "error"}})))
            .unwrap()
            .with("unused", record(json!({})))
            .unwrap();
        let loader = CountingLoader {
            inner: source,
            calls: AtomicUsize::new(0),
        };

        let mut presets = Presets::new();
        presets.materialize(&["app".to_string()], &loader).unwrap();

        assert_eq!(presets.identifiers(), vec!["app", "shared", "style"]);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 3);
    }

    /// Loader that namespaces every identifier by the config that wrote it.
    struct ScopedLoader(Presets);

    impl Loader for ScopedLoader {
        fn lookup(&self, identifier: &str) -> Result<ConfigRecord> {
            let name = identifier.rsplit('/').next().unwrap_or(identifier);
            self.0.lookup(name)
        }

        fn canonicalize(&self, identifier: &str, referrer: Option<&str>) -> String {
            match referrer {
                Some(referrer) => format!("{referrer}/{identifier}"),
                None => identifier.to_string(),
            }
        }
    }

    #[test]
    fn test_materialize_rewrites_extends_to_canonical_keys() {
        let source = Presets::new()
            .with("app", record(json!({"extends": "common"})))
            .unwrap()
            .with("common", record(json!({"indent": 2})))
            .unwrap();

        let mut presets = Presets::new();
        let roots = presets
            .materialize(&["app".to_string()], &ScopedLoader(source))
            .unwrap();

        assert_eq!(roots, vec!["app"]);
        assert_eq!(presets.identifiers(), vec!["app", "app/common"]);
        assert_eq!(presets.get("app").unwrap().extends(), ["app/common"]);
        assert_eq!(
            presets.lookup("app").unwrap().get("extends"),
            Some(&Value::List(vec![Value::from("app/common")]))
        );
    }

    #[test]
    fn test_materialize_surfaces_missing_target() {
        let source = Presets::new()
            .with("app", record(json!({"extends": ["missing-preset"]})))
            .unwrap();

        let mut presets = Presets::new();
        let err = presets.materialize(&["app".to_string()], &source).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { ref identifier, .. } if identifier == "missing-preset"));
    }

    #[test]
    fn test_materialize_tolerates_cycles() {
        let source = Presets::new()
            .with("a", record(json!({"extends": "b"})))
            .unwrap()
            .with("b", record(json!({"extends": "a"})))
            .unwrap();

        let mut presets = Presets::new();
        presets.materialize(&["a".to_string()], &source).unwrap();
        assert_eq!(presets.len(), 2);
    }
}
