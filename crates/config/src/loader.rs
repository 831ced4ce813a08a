use crate::presets::{closest_match, Loader, Presets};
use crate::resolver::Resolver;
use crate::value::ConfigRecord;
use crate::{ConfigError, ConfigFile, Result};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Config file names to search for, in order of preference
const CONFIG_FILES: &[&str] = &[
    ".lintrc.yml",
    ".lintrc.yaml",
    ".lintrc.json",
    ".lintrc.toml",
    ".lintrc",
];

/// Extensions tried, in order, when looking up a bare preset identifier.
const PRESET_EXTENSIONS: &[&str] = &["yml", "yaml", "json", "toml"];

/// Directory next to a config file that is also searched for presets.
const PRESETS_DIR: &str = "presets";

/// Find a config file by walking up the directory tree from the given start directory.
/// Returns the path to the config file if found.
#[tracing::instrument(fields(start = %start_dir.display()))]
pub fn find_config(start_dir: &Path) -> Result<Option<PathBuf>> {
    let mut current_dir = start_dir.to_path_buf();
    let mut checked_dirs = 0;

    loop {
        tracing::trace!(dir = %current_dir.display(), "Checking directory for config files");
        for file_name in CONFIG_FILES {
            let config_path = current_dir.join(file_name);
            if config_path.is_file() {
                tracing::info!(path = %config_path.display(), checked_dirs, "Found config file");
                return Ok(Some(config_path));
            }
        }

        checked_dirs += 1;
        if !current_dir.pop() {
            tracing::debug!(checked_dirs, "No config file found");
            break;
        }
    }

    Ok(None)
}

/// Load and parse a config file.
/// Automatically detects the format based on file extension.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    let config = ConfigFile::from_record(load_record(path)?)?;
    tracing::info!(
        extends = config.extends().len(),
        overrides = config.overrides().len(),
        "Config loaded successfully"
    );
    Ok(config)
}

/// Load a config from a string.
/// The path is used for error messages and format detection.
#[tracing::instrument(skip(contents), fields(path = %path.display(), size = contents.len()))]
pub fn load_config_from_str(contents: &str, path: &Path) -> Result<ConfigFile> {
    ConfigFile::from_record(parse_record(contents, path)?)
}

/// Read a file into a raw record without interpreting `extends` or
/// `overrides`.
pub fn load_record(path: &Path) -> Result<ConfigRecord> {
    tracing::debug!(path = %path.display(), "Reading config file");
    let contents = fs::read_to_string(path)?;
    parse_record(&contents, path)
}

fn parse_record(contents: &str, path: &Path) -> Result<ConfigRecord> {
    let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("");

    tracing::debug!(extension, file_name, "Detecting config format");

    match extension {
        "yml" | "yaml" => {
            tracing::trace!("Parsing as YAML");
            parse_yaml(contents, path)
        }
        "json" => {
            tracing::trace!("Parsing as JSON");
            parse_json(contents, path)
        }
        "toml" => {
            tracing::trace!("Parsing as TOML");
            parse_toml(contents, path)
        }
        "" if file_name == ".lintrc" => {
            // .lintrc without extension - try YAML first, then JSON
            tracing::trace!("Trying YAML then JSON for .lintrc");
            parse_yaml(contents, path).or_else(|_| parse_json(contents, path))
        }
        _ => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Parse YAML configuration
fn parse_yaml(contents: &str, path: &Path) -> Result<ConfigRecord> {
    // An empty document deserializes as null rather than a record.
    if contents.trim().is_empty() {
        return Ok(ConfigRecord::new());
    }
    serde_yaml::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("YAML parse error: {e}"),
    })
}

/// Parse JSON configuration
fn parse_json(contents: &str, path: &Path) -> Result<ConfigRecord> {
    serde_json::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("JSON parse error: {e}"),
    })
}

/// Parse TOML configuration
fn parse_toml(contents: &str, path: &Path) -> Result<ConfigRecord> {
    toml::from_str(contents).map_err(|e| ConfigError::Invalid {
        path: path.to_path_buf(),
        message: format!("TOML parse error: {e}"),
    })
}

/// Looks up extends identifiers as files under a list of directories.
///
/// - `./shared.json`, `../base.yml` and absolute paths resolve against the
///   first directory.
/// - Bare identifiers map `:` to `/` and try each directory with each of
///   `yml`, `yaml`, `json`, `toml`: `plugin:ember/recommended` becomes
///   `<dir>/plugin/ember/recommended.yml`, and so on.
#[derive(Debug, Clone, Default)]
pub struct FsLoader {
    dirs: Vec<PathBuf>,
}

impl FsLoader {
    #[must_use]
    pub fn new<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    #[must_use]
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Candidate files for `identifier`, in lookup order.
    #[must_use]
    pub fn candidates(&self, identifier: &str) -> Vec<PathBuf> {
        if is_path_like(identifier) {
            return vec![lexical_clean(&self.root().join(identifier))];
        }

        let relative = identifier.replace(':', "/");
        let relative = relative.as_str();
        self.dirs
            .iter()
            .flat_map(|dir| {
                PRESET_EXTENSIONS
                    .iter()
                    .map(move |ext| dir.join(format!("{relative}.{ext}")))
            })
            .collect()
    }

    /// The file `identifier` resolves to, if it exists.
    #[must_use]
    pub fn locate(&self, identifier: &str) -> Option<PathBuf> {
        self.candidates(identifier)
            .into_iter()
            .find(|candidate| candidate.is_file())
    }

    fn root(&self) -> PathBuf {
        self.dirs.first().cloned().unwrap_or_default()
    }

    /// Identifiers of the preset files sitting directly in the search
    /// directories, used for suggestions.
    fn known_identifiers(&self) -> Vec<String> {
        let mut known = Vec::new();
        for dir in &self.dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                let supported = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| PRESET_EXTENSIONS.contains(&ext));
                if let (true, Some(stem)) = (supported, path.file_stem().and_then(|s| s.to_str()))
                {
                    known.push(stem.to_string());
                }
            }
        }
        known
    }
}

impl Loader for FsLoader {
    #[tracing::instrument(skip(self), fields(dirs = self.dirs.len()))]
    fn lookup(&self, identifier: &str) -> Result<ConfigRecord> {
        if let Some(path) = self.locate(identifier) {
            tracing::debug!(path = %path.display(), "Found preset file");
            return load_record(&path);
        }

        let known = self.known_identifiers();
        Err(ConfigError::NotFound {
            identifier: identifier.to_string(),
            suggestion: closest_match(identifier, known.iter().map(String::as_str)),
        })
    }

    /// Path-like identifiers are relative to the file that wrote them: the
    /// config directory for the root config, the preset's own directory for
    /// a preset. The key is the cleaned path relative to the config
    /// directory, so `./common.yml` written in two different directories
    /// names two different presets.
    fn canonicalize(&self, identifier: &str, referrer: Option<&str>) -> String {
        if !is_path_like(identifier) {
            return identifier.to_string();
        }

        let root = lexical_clean(&self.root());
        let base = referrer
            .and_then(|referrer| self.locate(referrer))
            .and_then(|path| path.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| root.clone());
        relative_key(&lexical_clean(&base.join(identifier)), &root)
    }
}

/// `path` as a `./`- or `../`-prefixed key relative to `root`. Falls back to
/// the full path when no relative form exists.
fn relative_key(path: &Path, root: &Path) -> String {
    let full = || path.to_string_lossy().replace('\\', "/");
    if path.is_absolute() != root.is_absolute() {
        return full();
    }

    let path_parts: Vec<Component> = path.components().collect();
    let root_parts: Vec<Component> = root.components().collect();
    let common = path_parts
        .iter()
        .zip(&root_parts)
        .take_while(|(a, b)| a == b)
        .count();
    if root_parts[common..]
        .iter()
        .any(|part| !matches!(part, Component::Normal(_)))
    {
        return full();
    }

    let mut parts: Vec<String> = vec!["..".to_string(); root_parts.len() - common];
    parts.extend(
        path_parts[common..]
            .iter()
            .map(|part| part.as_os_str().to_string_lossy().into_owned()),
    );
    let key = parts.join("/");
    if key.starts_with("..") {
        key
    } else {
        format!("./{key}")
    }
}

/// Resolve `.` and `..` components without touching the file system.
#[must_use]
pub fn lexical_clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(cleaned.components().next_back(), Some(Component::Normal(_))) {
                    cleaned.pop();
                } else {
                    cleaned.push("..");
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

fn is_path_like(identifier: &str) -> bool {
    identifier.starts_with("./")
        || identifier.starts_with("../")
        || Path::new(identifier).is_absolute()
        || Path::new(identifier)
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| PRESET_EXTENSIONS.contains(&ext))
}

/// Load a config file and everything it extends, ready to resolve paths.
///
/// Extends targets are looked up next to the config file and in its
/// `presets/` subdirectory.
#[tracing::instrument(fields(path = %path.display()))]
pub fn load_resolver(path: &Path) -> Result<Resolver> {
    let mut config = load_config(path)?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let loader = FsLoader::new([base_dir.to_path_buf(), base_dir.join(PRESETS_DIR)]);

    let mut presets = Presets::new();
    let extends = presets.materialize(config.extends(), &loader)?;
    config.set_extends(extends);

    Ok(Resolver::new(config, Arc::new(presets)))
}
