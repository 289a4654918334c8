//! Rule kinds and rule values

use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::fmt;

use crate::error::{Result, RulesError};

/// Value stored for defaults and overrides.
pub type RuleValue = Value;

/// The five independent rule tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    /// Used when the inbound record supplied no data for the field
    Default,
    /// Forced regardless of inbound data
    Override,
    /// `(pattern, replacement)` applied to matching inbound data
    Substitution,
    /// Prepended to the value
    Prefix,
    /// Appended to the value
    Postfix,
}

impl RuleKind {
    pub const ALL: [RuleKind; 5] = [
        RuleKind::Default,
        RuleKind::Override,
        RuleKind::Substitution,
        RuleKind::Prefix,
        RuleKind::Postfix,
    ];

    /// Section name in a rules document.
    pub fn section(self) -> &'static str {
        match self {
            RuleKind::Default => "defaults",
            RuleKind::Override => "overrides",
            RuleKind::Substitution => "substitutions",
            RuleKind::Prefix => "prefixes",
            RuleKind::Postfix => "postfixes",
        }
    }

    pub fn from_section(section: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.section() == section)
    }
}

impl fmt::Display for RuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RuleKind::Default => "default",
            RuleKind::Override => "override",
            RuleKind::Substitution => "substitution",
            RuleKind::Prefix => "prefix",
            RuleKind::Postfix => "postfix",
        };
        f.write_str(name)
    }
}

/// Pattern and replacement, always stored as a pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub pattern: String,
    pub replacement: String,
}

impl Substitution {
    pub fn new(pattern: impl Into<String>, replacement: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            replacement: replacement.into(),
        }
    }

    /// Build from a `[pattern, replacement]` list.
    pub fn from_list<S: AsRef<str>>(operator: &str, list: &[S]) -> Result<Self> {
        match list {
            [pattern, replacement] => Ok(Self::new(pattern.as_ref(), replacement.as_ref())),
            _ => Err(RulesError::MalformedSubstitution {
                operator: operator.to_string(),
                len: list.len(),
            }),
        }
    }
}

/// A typed rule value tagged with its table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Rule {
    Default(RuleValue),
    Override(RuleValue),
    Substitution(Substitution),
    Prefix(String),
    Postfix(String),
}

impl Rule {
    pub fn kind(&self) -> RuleKind {
        match self {
            Rule::Default(_) => RuleKind::Default,
            Rule::Override(_) => RuleKind::Override,
            Rule::Substitution(_) => RuleKind::Substitution,
            Rule::Prefix(_) => RuleKind::Prefix,
            Rule::Postfix(_) => RuleKind::Postfix,
        }
    }

    /// Convert one `operator: value` entry of a document section.
    ///
    /// Defaults and overrides take any YAML value. Substitutions need a
    /// two-element sequence of scalars. Prefixes and postfixes need a scalar,
    /// numbers and booleans are stringified.
    pub fn from_yaml(kind: RuleKind, operator: &str, value: &Value) -> Result<Self> {
        match kind {
            RuleKind::Default => Ok(Rule::Default(value.clone())),
            RuleKind::Override => Ok(Rule::Override(value.clone())),
            RuleKind::Substitution => {
                let Some(items) = value.as_sequence() else {
                    return Err(RulesError::MalformedSubstitution {
                        operator: operator.to_string(),
                        len: 0,
                    });
                };
                let parts: Vec<String> = items
                    .iter()
                    .map(|item| wrapper_text(kind, operator, item))
                    .collect::<Result<_>>()?;
                Substitution::from_list(operator, parts.as_slice()).map(Rule::Substitution)
            }
            RuleKind::Prefix => wrapper_text(kind, operator, value).map(Rule::Prefix),
            RuleKind::Postfix => wrapper_text(kind, operator, value).map(Rule::Postfix),
        }
    }
}

fn wrapper_text(kind: RuleKind, operator: &str, value: &Value) -> Result<String> {
    scalar_to_string(value).ok_or_else(|| RulesError::UnsupportedValue {
        kind,
        operator: operator.to_string(),
    })
}

/// Text form of a YAML scalar; `None` for null, sequences and mappings.
pub(crate) fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn yaml(src: &str) -> Value {
        serde_yaml::from_str(src).unwrap()
    }

    #[test]
    fn test_section_names_round_trip() {
        for kind in RuleKind::ALL {
            assert_eq!(RuleKind::from_section(kind.section()), Some(kind));
        }
        assert_eq!(RuleKind::from_section("aliases"), None);
    }

    #[test]
    fn test_substitution_from_sequence() {
        let rule = Rule::from_yaml(RuleKind::Substitution, "code", &yaml("['-', '_']")).unwrap();
        assert_eq!(rule, Rule::Substitution(Substitution::new("-", "_")));
    }

    #[test]
    fn test_substitution_wrong_length_is_rejected() {
        let err = Rule::from_yaml(RuleKind::Substitution, "code", &yaml("['-']")).unwrap_err();
        assert!(matches!(err, RulesError::MalformedSubstitution { len: 1, .. }));

        let err = Rule::from_yaml(RuleKind::Substitution, "code", &yaml("'-'")).unwrap_err();
        assert!(matches!(err, RulesError::MalformedSubstitution { len: 0, .. }));
    }

    #[test]
    fn test_substitution_nested_value_is_rejected() {
        let err = Rule::from_yaml(RuleKind::Substitution, "code", &yaml("[[a], b]")).unwrap_err();
        assert!(matches!(
            err,
            RulesError::UnsupportedValue { kind: RuleKind::Substitution, .. }
        ));
        assert!(err.to_string().contains("expected a scalar"));
    }

    #[test]
    fn test_prefix_stringifies_scalars() {
        let rule = Rule::from_yaml(RuleKind::Prefix, "ref", &yaml("42")).unwrap();
        assert_eq!(rule, Rule::Prefix("42".to_string()));

        let err = Rule::from_yaml(RuleKind::Postfix, "ref", &yaml("{a: 1}")).unwrap_err();
        assert!(matches!(err, RulesError::UnsupportedValue { kind: RuleKind::Postfix, .. }));
    }

    #[test]
    fn test_default_keeps_structured_value() {
        let value = yaml("[1, 2, 3]");
        let rule = Rule::from_yaml(RuleKind::Default, "tags", &value).unwrap();
        assert_eq!(rule.kind(), RuleKind::Default);
        assert_eq!(rule, Rule::Default(value));
    }
}
