use crate::commands::common::{fail, CommandContext};
use crate::{GlobalOptions, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use lintrc_config::{ConfigRecord, Layer, ResolvedConfig, Resolver};
use serde::Serialize;
use std::path::Path;

/// Why a file ended up with its config.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation<'a> {
    pub path: &'a str,
    pub layers: &'a [Layer],
    pub skipped: Vec<SkippedOverride<'a>>,
    pub resolved: &'a ConfigRecord,
}

/// A local override block that does not select the file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedOverride<'a> {
    pub index: usize,
    pub files: &'a [String],
    #[serde(skip_serializing_if = "no_patterns")]
    pub excluded_files: &'a [String],
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn no_patterns(patterns: &&[String]) -> bool {
    patterns.is_empty()
}

impl<'a> Explanation<'a> {
    pub fn new(resolver: &'a Resolver, resolved: &'a ResolvedConfig) -> Self {
        let path = resolved.path();
        let skipped = resolver
            .config()
            .overrides()
            .iter()
            .enumerate()
            .filter(|(_, block)| !block.matches(path))
            .map(|(index, block)| SkippedOverride {
                index,
                files: block.include().patterns(),
                excluded_files: block.exclude().patterns(),
            })
            .collect();

        Self {
            path,
            layers: resolved.layers(),
            skipped,
            resolved: resolved.record(),
        }
    }
}

#[tracing::instrument(skip(options, format), fields(file = %file.display()))]
pub fn run(options: &GlobalOptions, file: &Path, format: OutputFormat) -> Result<()> {
    let ctx = CommandContext::load(options).unwrap_or_else(|e| fail(&e, format));
    let path = ctx
        .relative_path(file)
        .unwrap_or_else(|e| fail(&e, format));
    let resolved = ctx
        .resolver
        .resolve(&path)
        .unwrap_or_else(|e| fail(&anyhow::Error::from(e), format));
    let explanation = Explanation::new(&ctx.resolver, &resolved);

    match format {
        OutputFormat::Human => {
            println!(
                "{} {} {}",
                "Config for".bold(),
                path.cyan(),
                format!("({})", ctx.config_path.display()).dimmed()
            );
            println!();
            for line in describe(&explanation) {
                println!("{line}");
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&explanation)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&explanation)?),
    }
    Ok(())
}

/// Human-readable lines for an explanation.
fn describe(explanation: &Explanation<'_>) -> Vec<String> {
    let mut lines = vec!["Applied layers:".bold().to_string()];
    for (position, layer) in explanation.layers.iter().enumerate() {
        lines.push(format!("  {}. {}", position + 1, describe_layer(layer)));
    }

    if !explanation.skipped.is_empty() {
        lines.push(String::new());
        lines.push("Skipped overrides:".bold().to_string());
        for skipped in &explanation.skipped {
            let mut line = format!(
                "  {} files: {}",
                format!("override #{}", skipped.index).yellow(),
                skipped.files.join(", ")
            );
            if !skipped.excluded_files.is_empty() {
                line.push_str(&format!(
                    " excluding: {}",
                    skipped.excluded_files.join(", ")
                ));
            }
            lines.push(line);
        }
    }
    lines
}

fn describe_layer(layer: &Layer) -> String {
    let matched = |pattern: &Option<String>| {
        pattern.as_deref().map_or_else(String::new, |p| {
            format!(" {}", format!("(matched {p})").dimmed())
        })
    };

    match layer {
        Layer::Extends { identifier } => format!("extends {}", identifier.cyan()),
        Layer::ExtendsOverride {
            identifier,
            index,
            pattern,
        } => format!(
            "extends {} override #{index}{}",
            identifier.cyan(),
            matched(pattern)
        ),
        Layer::Local => "local config".to_string(),
        Layer::Override { index, pattern } => {
            format!("{}{}", format!("override #{index}").green(), matched(pattern))
        }
    }
}
