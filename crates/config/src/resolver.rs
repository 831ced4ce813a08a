//! Per-file config resolution.
//!
//! Layers are applied in this order, each merged on top of the previous:
//!
//! 1. every extends target, depth-first: the target's own extends, then its
//!    data, then those of its overrides that select the path
//! 2. the config's own data
//! 3. the config's overrides that select the path, in declaration order
//!
//! A target reached more than once (a shared base behind two presets) is
//! applied only where it is first reached, so it always sits below every
//! config that extends it.
//!
//! Every extends target is looked up before anything is merged, so a
//! missing or cyclic target fails the whole resolution up front.

use crate::config::{ConfigFile, OverrideBlock};
use crate::matcher::normalize_path;
use crate::merge::{merge_record, MergeOptions};
use crate::presets::Presets;
use crate::rule::RuleSetting;
use crate::value::{ConfigRecord, Value};
use crate::{ConfigError, Result};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// One step that contributed to a resolved config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Layer {
    /// Data of an extends target.
    Extends { identifier: String },
    /// An override block declared inside an extends target.
    ExtendsOverride {
        identifier: String,
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
    /// The config's own data.
    Local,
    /// One of the config's own override blocks.
    Override {
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        pattern: Option<String>,
    },
}

/// The flattened config for one path, plus the layers that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedConfig {
    path: String,
    record: ConfigRecord,
    layers: Vec<Layer>,
}

impl ResolvedConfig {
    /// The path this config was resolved for.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub const fn record(&self) -> &ConfigRecord {
        &self.record
    }

    #[must_use]
    pub fn into_record(self) -> ConfigRecord {
        self.record
    }

    #[must_use]
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.record.get(key)
    }

    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        self.record.get_path(path)
    }

    /// String entries of the `plugins` list.
    #[must_use]
    pub fn plugins(&self) -> Vec<&str> {
        self.record
            .get("plugins")
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Typed setting for rule `name`, if the rule is configured.
    pub fn rule(&self, name: &str) -> Result<Option<RuleSetting>> {
        self.rules_table()
            .and_then(|rules| rules.get(name))
            .map(|value| RuleSetting::from_value(name, value))
            .transpose()
    }

    /// Every configured rule in declaration order.
    pub fn rules(&self) -> Result<Vec<(&str, RuleSetting)>> {
        let Some(rules) = self.rules_table() else {
            return Ok(Vec::new());
        };
        rules
            .iter()
            .map(|(name, value)| RuleSetting::from_value(name, value).map(|setting| (name, setting)))
            .collect()
    }

    fn rules_table(&self) -> Option<&ConfigRecord> {
        self.record.get("rules").and_then(Value::as_record)
    }
}

/// Resolves per-file configs from a config and its materialized presets.
///
/// Immutable after construction; `resolve` can run from many threads at
/// once.
#[derive(Debug, Clone)]
pub struct Resolver {
    config: ConfigFile,
    presets: Arc<Presets>,
    options: MergeOptions,
}

impl Resolver {
    #[must_use]
    pub fn new(config: ConfigFile, presets: Arc<Presets>) -> Self {
        Self {
            config,
            presets,
            options: MergeOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &ConfigFile {
        &self.config
    }

    #[must_use]
    pub fn presets(&self) -> &Presets {
        &self.presets
    }

    #[must_use]
    pub const fn options(&self) -> MergeOptions {
        self.options
    }

    /// Resolve the config for a slash-separated path relative to the config
    /// root.
    #[tracing::instrument(skip(self), fields(overrides = self.config.overrides().len()))]
    pub fn resolve(&self, path: &str) -> Result<ResolvedConfig> {
        let chain = self.extends_chain()?;
        tracing::trace!(targets = chain.len(), "Extends chain resolved");

        let mut record = ConfigRecord::new();
        let mut layers = Vec::new();

        for (identifier, target) in chain {
            tracing::trace!(identifier, "Applying extends target");
            merge_record(&mut record, target.data(), self.options, "")?;
            layers.push(Layer::Extends {
                identifier: identifier.to_string(),
            });
            for (index, block) in matching(target.overrides(), path) {
                merge_record(&mut record, block.data(), self.options, "")?;
                layers.push(Layer::ExtendsOverride {
                    identifier: identifier.to_string(),
                    index,
                    pattern: matched_pattern(block, path),
                });
            }
        }

        merge_record(&mut record, self.config.data(), self.options, "")?;
        layers.push(Layer::Local);

        for (index, block) in matching(self.config.overrides(), path) {
            tracing::trace!(index, "Applying override");
            merge_record(&mut record, block.data(), self.options, "")?;
            layers.push(Layer::Override {
                index,
                pattern: matched_pattern(block, path),
            });
        }

        tracing::debug!(layers = layers.len(), keys = record.len(), "Resolved config");
        Ok(ResolvedConfig {
            path: path.to_string(),
            record,
            layers,
        })
    }

    /// Resolve the config for a file system path, made relative to `root`.
    pub fn resolve_file(&self, path: &Path, root: &Path) -> Result<ResolvedConfig> {
        self.resolve(&normalize_path(path, root))
    }

    /// Extends targets in application order, depth-first.
    fn extends_chain(&self) -> Result<Vec<(&str, &ConfigFile)>> {
        let mut chain = Vec::new();
        let mut stack = Vec::new();
        self.collect_extends(self.config.extends(), &mut stack, &mut chain)?;
        Ok(chain)
    }

    fn collect_extends<'a>(
        &'a self,
        identifiers: &'a [String],
        stack: &mut Vec<&'a str>,
        chain: &mut Vec<(&'a str, &'a ConfigFile)>,
    ) -> Result<()> {
        for identifier in identifiers {
            let identifier = identifier.as_str();
            if stack.contains(&identifier) {
                let mut cycle: Vec<String> = stack.iter().map(|s| (*s).to_string()).collect();
                cycle.push(identifier.to_string());
                return Err(ConfigError::ExtendsCycle { chain: cycle });
            }
            if chain.iter().any(|(applied, _)| *applied == identifier) {
                tracing::trace!(identifier, "Extends target already applied");
                continue;
            }

            let target = self
                .presets
                .get(identifier)
                .ok_or_else(|| self.presets.not_found(identifier))?;

            stack.push(identifier);
            self.collect_extends(target.extends(), stack, chain)?;
            stack.pop();

            chain.push((identifier, target));
        }
        Ok(())
    }
}

/// Override blocks that select `path`, with their declaration index.
fn matching<'a>(
    blocks: &'a [OverrideBlock],
    path: &'a str,
) -> impl Iterator<Item = (usize, &'a OverrideBlock)> + 'a {
    blocks
        .iter()
        .enumerate()
        .filter(move |(_, block)| block.matches(path))
}

fn matched_pattern(block: &OverrideBlock, path: &str) -> Option<String> {
    block.include().matching_pattern(path).map(str::to_string)
}
