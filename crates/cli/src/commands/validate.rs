use crate::commands::common::{fail, CommandContext};
use crate::{ExitCode, GlobalOptions, OutputFormat};
use anyhow::Result;
use colored::Colorize;
use lintrc_config::{merge_with, ConfigRecord, MergeOptions, Resolver, RuleSetting};
use serde::Serialize;

/// Path resolved when no `--probe` is given.
pub const DEFAULT_PROBE: &str = "index.js";

/// Something wrong with a config that loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Problem {
    /// Where the problem was found, e.g. `override #1` or `preset 'base'`.
    pub source: String,
    pub message: String,
}

impl Problem {
    fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

#[tracing::instrument(skip(options, format))]
pub fn run(options: &GlobalOptions, probe: &str, format: OutputFormat) -> Result<()> {
    // Loading parses the file, compiles every override pattern and
    // materializes every extends target.
    let ctx = CommandContext::load(options).unwrap_or_else(|e| fail(&e, format));
    let problems = check(&ctx.resolver, probe);
    tracing::debug!(problems = problems.len(), "Validation finished");

    match format {
        OutputFormat::Human => {
            if problems.is_empty() {
                if options.show_info {
                    println!(
                        "{} {} {}",
                        "✓".green().bold(),
                        "Config is valid:".green(),
                        ctx.config_path.display()
                    );
                    println!(
                        "  {} presets, {} overrides",
                        ctx.resolver.presets().len(),
                        ctx.resolver.config().overrides().len()
                    );
                }
            } else {
                for problem in &problems {
                    eprintln!(
                        "{} {}: {}",
                        "✗".red().bold(),
                        problem.source.yellow(),
                        problem.message
                    );
                }
                eprintln!(
                    "\n{}",
                    format!("✗ Found {} problem(s)", problems.len()).red().bold()
                );
            }
        }
        OutputFormat::Json | OutputFormat::Yaml => {
            let report = serde_json::json!({
                "valid": problems.is_empty(),
                "config": ctx.config_path.display().to_string(),
                "presets": ctx.resolver.presets().identifiers(),
                "overrides": ctx.resolver.config().overrides().len(),
                "problems": problems,
            });
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print!("{}", serde_yaml::to_string(&report)?);
            }
        }
    }

    if !problems.is_empty() {
        ExitCode::ValidationError.exit();
    }
    Ok(())
}

/// Check a loaded config for problems that only show up while resolving.
///
/// - `probe` is resolved in strict mode, so a record meeting a non-record
///   value anywhere along the extends chain is reported
/// - each local override block is merged strictly onto that result, whether
///   or not it selects `probe`
/// - rule settings are checked where they are written, so an inherited bad
///   rule is reported once under the preset that declares it
pub fn check(resolver: &Resolver, probe: &str) -> Vec<Problem> {
    let strict = resolver.clone().with_options(MergeOptions::strict());
    let mut problems = Vec::new();

    for identifier in resolver.presets().identifiers() {
        if let Some(preset) = resolver.presets().get(identifier) {
            let source = format!("preset '{identifier}'");
            check_rules(&source, preset.data(), &mut problems);
            for (index, block) in preset.overrides().iter().enumerate() {
                check_rules(
                    &format!("{source} override #{index}"),
                    block.data(),
                    &mut problems,
                );
            }
        }
    }

    let resolved = match strict.resolve(probe) {
        Ok(resolved) => resolved,
        Err(err) => {
            problems.push(Problem::new(format!("resolving '{probe}'"), err.to_string()));
            return problems;
        }
    };
    check_rules("config", resolver.config().data(), &mut problems);

    for (index, block) in resolver.config().overrides().iter().enumerate() {
        let source = format!("override #{index}");
        if let Err(err) = merge_with(resolved.record(), block.data(), MergeOptions::strict()) {
            problems.push(Problem::new(&source, err.to_string()));
        }
        check_rules(&source, block.data(), &mut problems);
    }

    problems
}

fn check_rules(source: &str, record: &ConfigRecord, problems: &mut Vec<Problem>) {
    let Some(rules) = record.get("rules") else {
        return;
    };
    let Some(rules) = rules.as_record() else {
        problems.push(Problem::new(
            source,
            format!("'rules' must be a record, found {}", rules.kind()),
        ));
        return;
    };
    for (name, value) in rules.iter() {
        if let Err(err) = RuleSetting::from_value(name, value) {
            problems.push(Problem::new(source, err.to_string()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintrc_config::{ConfigFile, Presets};
    use serde_json::json;
    use std::sync::Arc;

    fn record(value: serde_json::Value) -> ConfigRecord {
        ConfigRecord::from_json(value).unwrap()
    }

    fn resolver(config: serde_json::Value, presets: Presets) -> Resolver {
        Resolver::new(
            ConfigFile::from_record(record(config)).unwrap(),
            Arc::new(presets),
        )
    }

    #[test]
    fn test_valid_config_has_no_problems() {
        let presets = Presets::new()
            .with("base", record(json!({"rules": {"semi": ["error", "always"]}})))
            .unwrap();
        let resolver = resolver(
            json!({
                "extends": "base",
                "rules": {"curly": 2},
                "overrides": [{"files": "*.test.js", "rules": {"semi": "off"}}]
            }),
            presets,
        );
        assert!(check(&resolver, DEFAULT_PROBE).is_empty());
    }

    #[test]
    fn test_strict_conflict_along_extends_chain() {
        let presets = Presets::new()
            .with("base", record(json!({"env": {"browser": true}})))
            .unwrap();
        let resolver = resolver(json!({"extends": "base", "env": "browser"}), presets);

        let problems = check(&resolver, DEFAULT_PROBE);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].source, "resolving 'index.js'");
        assert!(problems[0].message.contains("env"));
    }

    #[test]
    fn test_conflict_in_unmatched_override_is_reported() {
        let resolver = resolver(
            json!({
                "parserOptions": {"ecmaVersion": 2017},
                "overrides": [{"files": "legacy/**", "parserOptions": "es5"}]
            }),
            Presets::new(),
        );

        let problems = check(&resolver, DEFAULT_PROBE);
        assert_eq!(problems.len(), 1);
        assert_eq!(problems[0].source, "override #0");
    }

    #[test]
    fn test_bad_rule_settings() {
        let presets = Presets::new()
            .with("base", record(json!({"rules": {"eqeqeq": "sometimes"}})))
            .unwrap();
        let resolver = resolver(
            json!({
                "extends": "base",
                "overrides": [{"files": "*.js", "rules": {"indent": []}}]
            }),
            presets,
        );

        let sources: Vec<String> = check(&resolver, "lib/a.ts")
            .into_iter()
            .map(|problem| problem.source)
            .collect();
        assert_eq!(sources, vec!["preset 'base'", "override #0"]);
    }

    #[test]
    fn test_each_bad_rule_is_reported_once() {
        let presets = Presets::new()
            .with(
                "base",
                record(json!({
                    "rules": {"semi": "error"},
                    "overrides": [{"files": "*.test.js", "rules": {"no-undef": "loud"}}]
                })),
            )
            .unwrap();
        let resolver = resolver(
            json!({
                "extends": "base",
                "rules": {"quotes": "sometimes"},
                "overrides": [
                    {"files": "*.js", "rules": {"curly": "warn"}},
                    {"files": "src/**", "env": {"node": true}}
                ]
            }),
            presets,
        );

        let problems = check(&resolver, "src/a.test.js");
        let sources: Vec<&str> = problems.iter().map(|p| p.source.as_str()).collect();
        assert_eq!(sources, vec!["preset 'base' override #0", "config"]);
        assert!(problems[0].message.contains("no-undef"));
        assert!(problems[1].message.contains("quotes"));
    }

    #[test]
    fn test_rules_must_be_a_record() {
        let resolver = resolver(json!({"rules": ["semi"]}), Presets::new());
        let problems = check(&resolver, DEFAULT_PROBE);
        assert_eq!(
            problems,
            vec![Problem::new("config", "'rules' must be a record, found list")]
        );
    }
}
