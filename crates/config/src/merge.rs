//! Record merging.
//!
//! `merge(base, patch)` is key-wise:
//! - keys only in `base` are kept, keys only in `patch` are added
//! - two records merge recursively
//! - two lists of scalars are concatenated with duplicates removed, keeping
//!   the first occurrence
//! - anything else: the patch value replaces the base value
//!
//! A `Null` patch value leaves the key untouched. `Unset` removes it.

use crate::value::{ConfigRecord, Value};
use crate::{ConfigError, Result};

/// Options controlling how conflicting value types are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeOptions {
    /// Fail with [`ConfigError::MergeConflict`] when a record meets a
    /// non-record value at the same key instead of letting the patch win.
    pub strict: bool,
}

impl MergeOptions {
    #[must_use]
    pub const fn strict() -> Self {
        Self { strict: true }
    }
}

/// Merge `patch` on top of `base` with the default (patch-wins) policy.
///
/// Neither input is modified.
#[must_use]
pub fn merge(base: &ConfigRecord, patch: &ConfigRecord) -> ConfigRecord {
    let mut merged = base.clone();
    merge_record(&mut merged, patch, MergeOptions::default(), "")
        .unwrap_or_else(|_| unreachable!("non-strict merges never conflict"));
    merged
}

/// Merge `patch` on top of `base`, honoring `options`.
pub fn merge_with(
    base: &ConfigRecord,
    patch: &ConfigRecord,
    options: MergeOptions,
) -> Result<ConfigRecord> {
    let mut merged = base.clone();
    merge_record(&mut merged, patch, options, "")?;
    Ok(merged)
}

/// Merge `patch` into `target` in place.
pub(crate) fn merge_record(
    target: &mut ConfigRecord,
    patch: &ConfigRecord,
    options: MergeOptions,
    prefix: &str,
) -> Result<()> {
    for (key, patch_value) in patch.iter() {
        let path = if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{prefix}.{key}")
        };

        match patch_value {
            Value::Null => continue,
            Value::Unset => {
                target.remove(key);
                continue;
            }
            _ => {}
        }

        match target.entry(key.to_string()) {
            indexmap::map::Entry::Vacant(entry) => {
                entry.insert(detached(patch_value));
            }
            indexmap::map::Entry::Occupied(mut entry) => {
                merge_value(entry.get_mut(), patch_value, options, &path)?;
            }
        }
    }
    Ok(())
}

fn merge_value(
    base: &mut Value,
    patch: &Value,
    options: MergeOptions,
    path: &str,
) -> Result<()> {
    match (&mut *base, patch) {
        (Value::Record(base_record), Value::Record(patch_record)) => {
            merge_record(base_record, patch_record, options, path)
        }
        (Value::List(base_items), Value::List(patch_items))
            if is_scalar_list(base_items.as_slice()) && is_scalar_list(patch_items) =>
        {
            *base_items = union(base_items.as_slice(), patch_items);
            Ok(())
        }
        (base_value, patch_value) => {
            let record_mismatch = matches!(base_value, Value::Record(_))
                != matches!(patch_value, Value::Record(_));
            if options.strict && record_mismatch && !base_value.is_null() {
                return Err(ConfigError::MergeConflict {
                    key: path.to_string(),
                    base_kind: base_value.kind(),
                    patch_kind: patch_value.kind(),
                });
            }
            *base_value = detached(patch_value);
            Ok(())
        }
    }
}

/// Copy a patch value for insertion, applying nested `Null`/`Unset` markers
/// against an empty base so neither leaks into the result.
fn detached(value: &Value) -> Value {
    match value {
        Value::Record(record) => {
            let mut fresh = ConfigRecord::new();
            merge_record(&mut fresh, record, MergeOptions::default(), "")
                .unwrap_or_else(|_| unreachable!("non-strict merges never conflict"));
            Value::Record(fresh)
        }
        other => other.clone(),
    }
}

fn is_scalar_list(items: &[Value]) -> bool {
    items.iter().all(Value::is_scalar)
}

fn union(base: &[Value], patch: &[Value]) -> Vec<Value> {
    let mut merged: Vec<Value> = Vec::with_capacity(base.len() + patch.len());
    for item in base.iter().chain(patch) {
        if !merged.contains(item) {
            merged.push(item.clone());
        }
    }
    merged
}
