use crate::value::Value;
use crate::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity level for a lint rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[non_exhaustive]
pub enum RuleSeverity {
    Off,
    Warn,
    Error,
}

impl RuleSeverity {
    /// Read a severity from its string (`"off"`, `"warn"`, `"error"`) or
    /// numeric (`0`, `1`, `2`) form.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => match s.as_str() {
                "off" => Some(Self::Off),
                "warn" => Some(Self::Warn),
                "error" => Some(Self::Error),
                _ => None,
            },
            Value::Number(_) => match value.as_i64()? {
                0 => Some(Self::Off),
                1 => Some(Self::Warn),
                2 => Some(Self::Error),
                _ => None,
            },
            _ => None,
        }
    }
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Off => write!(f, "off"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Typed view over one entry of a resolved `rules` table.
///
/// Supports both shapes:
/// ```yaml
/// # Simple severity
/// eqeqeq: error
/// curly: 2
///
/// # Array: [severity, ...options]
/// indent: [error, 2, { SwitchCase: 1 }]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSetting {
    pub severity: RuleSeverity,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<Value>,
}

impl RuleSetting {
    pub fn from_value(rule: &str, value: &Value) -> Result<Self> {
        let invalid = |message: String| ConfigError::InvalidRule {
            rule: rule.to_string(),
            message,
        };

        match value {
            Value::List(items) => {
                let (first, options) = items
                    .split_first()
                    .ok_or_else(|| invalid("empty rule setting".to_string()))?;
                let severity = RuleSeverity::from_value(first)
                    .ok_or_else(|| invalid(format!("unknown severity: {first}")))?;
                Ok(Self {
                    severity,
                    options: options.to_vec(),
                })
            }
            other => RuleSeverity::from_value(other)
                .map(|severity| Self {
                    severity,
                    options: Vec::new(),
                })
                .ok_or_else(|| invalid(format!("unknown severity: {other}"))),
        }
    }

    /// Whether the rule is turned on (warn or error).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.severity != RuleSeverity::Off
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_severity() {
        let setting = RuleSetting::from_value("eqeqeq", &Value::from("error")).unwrap();
        assert_eq!(setting.severity, RuleSeverity::Error);
        assert!(setting.options.is_empty());
        assert!(setting.is_enabled());
    }

    #[test]
    fn test_numeric_severity() {
        let setting = RuleSetting::from_value("import/first", &Value::from(2_i64)).unwrap();
        assert_eq!(setting.severity, RuleSeverity::Error);

        let off = RuleSetting::from_value("import/first", &Value::from(0_i64)).unwrap();
        assert!(!off.is_enabled());
    }

    #[test]
    fn test_array_with_options() {
        let value = Value::from(json!(["error", 2, { "SwitchCase": 1 }]));
        let setting = RuleSetting::from_value("indent", &value).unwrap();
        assert_eq!(setting.severity, RuleSeverity::Error);
        assert_eq!(
            setting.options,
            vec![Value::from(2_i64), Value::from(json!({ "SwitchCase": 1 }))]
        );
    }

    #[test]
    fn test_invalid_settings() {
        for value in [json!("fatal"), json!(3), json!([]), json!(["loud"]), json!({"a": 1})] {
            let err = RuleSetting::from_value("semi", &Value::from(value)).unwrap_err();
            assert!(matches!(err, ConfigError::InvalidRule { ref rule, .. } if rule == "semi"));
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(RuleSeverity::Off < RuleSeverity::Warn);
        assert!(RuleSeverity::Warn < RuleSeverity::Error);
    }
}
