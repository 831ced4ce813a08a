//! Layered configuration resolution for linters and formatters.
//!
//! A config extends named presets and declares glob-scoped override blocks.
//! [`Resolver::resolve`] flattens all of that into one [`ConfigRecord`] for a
//! given file path.

mod config;
mod error;
mod loader;
mod matcher;
mod merge;
mod presets;
mod resolver;
mod rule;
mod value;

pub use config::{ConfigFile, OverrideBlock};
pub use error::{ConfigError, Result};
pub use loader::{
    find_config, lexical_clean, load_config, load_config_from_str, load_record, load_resolver,
    FsLoader,
};
pub use matcher::{matches, normalize_path, PatternSet};
pub use merge::{merge, merge_with, MergeOptions};
pub use presets::{Loader, Presets};
pub use resolver::{Layer, ResolvedConfig, Resolver};
pub use rule::{RuleSetting, RuleSeverity};
pub use value::{ConfigRecord, Value, UNSET_SENTINEL};
