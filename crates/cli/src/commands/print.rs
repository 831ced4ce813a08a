use crate::commands::common::{fail, CommandContext};
use crate::{GlobalOptions, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use lintrc_config::ConfigRecord;
use std::path::Path;

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

    if matches!(format, OutputFormat::Human) && options.show_info {
        println!(
            "{} {} {}",
            "Config for".bold(),
            path.cyan(),
            format!("({})", ctx.config_path.display()).dimmed()
        );
    }
    print!("{}", render(resolved.record(), format)?);
    Ok(())
}

/// Serialize a resolved record. Human output is YAML.
pub fn render(record: &ConfigRecord, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Json => format!("{}\n", serde_json::to_string_pretty(record)?),
        OutputFormat::Human | OutputFormat::Yaml => serde_yaml::to_string(record)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record() -> ConfigRecord {
        ConfigRecord::from_json(json!({
            "singleQuote": false,
            "rules": {"indent": ["error", 2]}
        }))
        .unwrap()
    }

    #[test]
    fn test_render_json_keeps_key_order() {
        let rendered = render(&record(), OutputFormat::Json).unwrap();
        assert_eq!(
            rendered,
            "{\n  \"singleQuote\": false,\n  \"rules\": {\n    \"indent\": [\n      \"error\",\n      2\n    ]\n  }\n}\n"
        );
    }

    #[test]
    fn test_render_yaml() {
        let rendered = render(&record(), OutputFormat::Yaml).unwrap();
        assert!(rendered.starts_with("singleQuote: false\nrules:\n  indent:\n"));
        assert!(rendered.contains("- error\n"));
    }

    #[test]
    fn test_render_empty_record() {
        let rendered = render(&ConfigRecord::new(), OutputFormat::Json).unwrap();
        assert_eq!(rendered, "{}\n");
    }
}
