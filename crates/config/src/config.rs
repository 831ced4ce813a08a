use crate::matcher::{self, PatternSet};
use crate::value::{ConfigRecord, Value};
use crate::{ConfigError, Result};

pub(crate) const EXTENDS_KEY: &str = "extends";
const OVERRIDES_KEY: &str = "overrides";
const FILES_KEY: &str = "files";
const EXCLUDED_FILES_KEYS: &[&str] = &["excludedFiles", "excludeFiles"];
const OPTIONS_KEY: &str = "options";

/// A glob-scoped patch, applied on top of the resolved config for every path
/// it selects.
///
/// Accepted shapes in a config file:
///
/// ```yaml
/// # ESLint style: patch keys inline
/// overrides:
///   - files: ["**/*.test.js"]
///     excludedFiles: ["vendor/**"]
///     env:
///       mocha: true
///
/// # Prettier style: patch under `options`
/// overrides:
///   - files: "*.hbs"
///     options:
///       singleQuote: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideBlock {
    include: PatternSet,
    exclude: PatternSet,
    data: ConfigRecord,
}

impl OverrideBlock {
    /// Build a block, compiling its patterns up front.
    pub fn new<I, E, S>(include: I, exclude: E, data: ConfigRecord) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Ok(Self {
            include: PatternSet::new(include)?,
            exclude: PatternSet::new(exclude)?,
            data,
        })
    }

    /// Parse one entry of an `overrides` list.
    pub fn from_record(record: &ConfigRecord) -> Result<Self> {
        let mut data = record.clone();

        let include = data
            .remove(FILES_KEY)
            .map(|v| string_list(&v, FILES_KEY))
            .transpose()?
            .unwrap_or_default();

        let mut exclude = Vec::new();
        for key in EXCLUDED_FILES_KEYS {
            if let Some(value) = data.remove(key) {
                exclude.extend(string_list(&value, key)?);
            }
        }

        if let Some(Value::Record(options)) = data.get(OPTIONS_KEY).cloned() {
            data.remove(OPTIONS_KEY);
            overlay(&mut data, options);
        }

        Self::new(include, exclude, data)
    }

    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        matcher::matches(path, &self.include, &self.exclude)
    }

    #[must_use]
    pub const fn include(&self) -> &PatternSet {
        &self.include
    }

    #[must_use]
    pub const fn exclude(&self) -> &PatternSet {
        &self.exclude
    }

    #[must_use]
    pub const fn data(&self) -> &ConfigRecord {
        &self.data
    }
}

/// Copy `patch` into `target` as written. Records present on both sides are
/// combined key by key; `null` and `$unset` markers are kept so they still
/// act when the block is applied.
fn overlay(target: &mut ConfigRecord, patch: ConfigRecord) {
    for (key, value) in patch {
        match (target.get(&key).cloned(), value) {
            (Some(Value::Record(mut existing)), Value::Record(nested)) => {
                overlay(&mut existing, nested);
                target.insert(key, Value::Record(existing));
            }
            (_, value) => {
                target.insert(key, value);
            }
        }
    }
}

/// A config as written in a file or preset: what it extends, its own data,
/// and its override blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigFile {
    extends: Vec<String>,
    data: ConfigRecord,
    overrides: Vec<OverrideBlock>,
}

impl ConfigFile {
    #[must_use]
    pub fn new(data: ConfigRecord) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_extends<I, S>(mut self, identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extends.extend(identifiers.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn with_override(mut self, block: OverrideBlock) -> Self {
        self.overrides.push(block);
        self
    }

    /// Split a raw record into extends, overrides and local data.
    ///
    /// Every override pattern is compiled here, so a malformed glob fails
    /// when the config is loaded rather than when a path is resolved.
    pub fn from_record(record: ConfigRecord) -> Result<Self> {
        let mut data = record;

        let extends = data
            .remove(EXTENDS_KEY)
            .map(|v| string_list(&v, EXTENDS_KEY))
            .transpose()?
            .unwrap_or_default();

        let overrides = match data.remove(OVERRIDES_KEY) {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::List(entries)) => entries
                .iter()
                .enumerate()
                .map(|(index, entry)| {
                    let record = entry.as_record().ok_or_else(|| {
                        ConfigError::shape(format!(
                            "'{OVERRIDES_KEY}[{index}]' must be a record, found {}",
                            entry.kind()
                        ))
                    })?;
                    OverrideBlock::from_record(record)
                })
                .collect::<Result<Vec<_>>>()?,
            Some(other) => {
                return Err(ConfigError::shape(format!(
                    "'{OVERRIDES_KEY}' must be a list, found {}",
                    other.kind()
                )))
            }
        };

        tracing::trace!(
            extends = extends.len(),
            overrides = overrides.len(),
            keys = data.len(),
            "Parsed config record"
        );

        Ok(Self {
            extends,
            data,
            overrides,
        })
    }

    /// Identifiers this config extends, in application order.
    #[must_use]
    pub fn extends(&self) -> &[String] {
        &self.extends
    }

    pub(crate) fn set_extends(&mut self, identifiers: Vec<String>) {
        self.extends = identifiers;
    }

    /// The config's own data, without `extends` and `overrides`.
    #[must_use]
    pub const fn data(&self) -> &ConfigRecord {
        &self.data
    }

    #[must_use]
    pub fn overrides(&self) -> &[OverrideBlock] {
        &self.overrides
    }
}

impl TryFrom<ConfigRecord> for ConfigFile {
    type Error = ConfigError;

    fn try_from(record: ConfigRecord) -> Result<Self> {
        Self::from_record(record)
    }
}

/// Accept either a single string or a list of strings.
fn string_list(value: &Value, field: &str) -> Result<Vec<String>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::String(s) => Ok(vec![s.clone()]),
        Value::List(items) => items
            .iter()
            .map(|item| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ConfigError::shape(format!(
                        "'{field}' entries must be strings, found {}",
                        item.kind()
                    ))
                })
            })
            .collect(),
        other => Err(ConfigError::shape(format!(
            "'{field}' must be a string or a list of strings, found {}",
            other.kind()
        ))),
    }
}
