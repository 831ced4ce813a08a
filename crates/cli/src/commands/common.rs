use crate::{ExitCode, GlobalOptions, OutputFormat};
use anyhow::{Context, Result};
use colored::Colorize;
use lintrc_config::{
    find_config, lexical_clean, load_resolver, normalize_path, MergeOptions, Resolver,
};
use std::path::{Path, PathBuf};

/// Common context for all CLI commands: the located config and a resolver
/// with every extends target already loaded.
pub struct CommandContext {
    pub config_path: PathBuf,
    pub base_dir: PathBuf,
    pub resolver: Resolver,
}

impl CommandContext {
    /// Locate and load the config for a command.
    ///
    /// Uses `--config` when given, otherwise searches upwards from the
    /// current directory.
    pub fn load(options: &GlobalOptions) -> Result<Self> {
        let config_path = locate_config(options.config_path.as_deref())?;

        let resolver = load_resolver(&config_path)
            .with_context(|| format!("Failed to load config {}", config_path.display()))?;
        let resolver = if options.strict {
            resolver.with_options(MergeOptions::strict())
        } else {
            resolver
        };

        let base_dir = config_path
            .parent()
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        tracing::info!(
            config = %config_path.display(),
            presets = resolver.presets().len(),
            overrides = resolver.config().overrides().len(),
            "Loaded config"
        );

        Ok(Self {
            config_path,
            base_dir,
            resolver,
        })
    }

    /// The slash-separated path of `file` relative to the config directory,
    /// which is what override patterns are matched against.
    pub fn relative_path(&self, file: &Path) -> Result<String> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        Ok(relative_to(file, &cwd, &self.base_dir))
    }
}

/// The config file to use: the explicit one, or the nearest one found by
/// walking up from the current directory.
pub fn locate_config(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }
    let current_dir = std::env::current_dir().context("Failed to read current directory")?;
    find_config(&current_dir)
        .context("Failed to search for config")?
        .context("No lintrc config file found")
}

/// Report `error` in the requested format and exit with its exit code.
pub fn fail(error: &anyhow::Error, format: OutputFormat) -> ! {
    match format {
        OutputFormat::Human => eprintln!("{} {error:#}", "✗".red().bold()),
        OutputFormat::Json | OutputFormat::Yaml => {
            eprintln!("{}", serde_json::json!({ "error": format!("{error:#}") }));
        }
    }
    ExitCode::for_error(error).exit()
}

fn relative_to(file: &Path, cwd: &Path, base_dir: &Path) -> String {
    let file = lexical_clean(&cwd.join(file));
    let base_dir = lexical_clean(&cwd.join(base_dir));
    if !file.starts_with(&base_dir) {
        tracing::warn!(
            file = %file.display(),
            base = %base_dir.display(),
            "File is outside the config directory"
        );
    }
    normalize_path(&file, &base_dir)
}
