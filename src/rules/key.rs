//! Rule keying
//!
//! Every rule lives under a `(class identity, operator)` cell. The import
//! engine addresses cells through a [`MethodBinding`], programmatic and YAML
//! configuration address them with an explicit class and operator name. Both
//! paths resolve to the same [`RuleKey`].
//!
//! Keys are compared as exact, case-sensitive strings after trimming
//! surrounding whitespace. The same rule applies to class names and operator
//! names in all five tables.

use serde::{Deserialize, Serialize};
use std::fmt;

fn normalize(raw: &str) -> String {
    raw.trim().to_string()
}

/// Name-based identity of a target class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassIdentity(String);

impl ClassIdentity {
    /// Identity for a type that declares its import class name.
    pub fn of<T: ImportTarget + ?Sized>() -> Self {
        Self::named(T::CLASS_NAME)
    }

    pub fn named(name: impl AsRef<str>) -> Self {
        Self(normalize(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClassIdentity {
    fn from(name: &str) -> Self {
        Self::named(name)
    }
}

impl From<String> for ClassIdentity {
    fn from(name: String) -> Self {
        Self::named(name)
    }
}

/// Field, column or accessor name on a target class.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Operator(String);

impl Operator {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(normalize(name.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Operator {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Operator {
    fn from(name: String) -> Self {
        Self::new(name)
    }
}

impl From<&String> for Operator {
    fn from(name: &String) -> Self {
        Self::new(name)
    }
}

/// A type the import engine populates.
///
/// ```ignore
/// struct Project;
/// impl ImportTarget for Project {
///     const CLASS_NAME: &'static str = "Project";
/// }
/// ```
pub trait ImportTarget {
    const CLASS_NAME: &'static str;
}

/// Binding of a target class to one of its operators, as handed over by the
/// import engine at population time. Read-only from the registry's side.
pub trait MethodBinding {
    fn class_identity(&self) -> ClassIdentity;
    fn operator(&self) -> &str;
}

impl<B: MethodBinding + ?Sized> MethodBinding for &B {
    fn class_identity(&self) -> ClassIdentity {
        (**self).class_identity()
    }

    fn operator(&self) -> &str {
        (**self).operator()
    }
}

/// Plain binding for callers that have no binding type of their own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldBinding {
    pub class: ClassIdentity,
    pub operator: String,
}

impl FieldBinding {
    pub fn new(class: impl Into<ClassIdentity>, operator: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            operator: operator.into(),
        }
    }
}

impl MethodBinding for FieldBinding {
    fn class_identity(&self) -> ClassIdentity {
        self.class.clone()
    }

    fn operator(&self) -> &str {
        &self.operator
    }
}

/// Canonical address of a rule cell.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RuleKey {
    pub class: ClassIdentity,
    pub operator: Operator,
}

impl RuleKey {
    /// Resolve from an explicit class and operator name.
    pub fn from_class(class: &ClassIdentity, operator: impl Into<Operator>) -> Self {
        Self {
            class: class.clone(),
            operator: operator.into(),
        }
    }

    /// Resolve from a method binding's own class identity and operator.
    pub fn from_binding<B: MethodBinding + ?Sized>(binding: &B) -> Self {
        Self {
            class: binding.class_identity(),
            operator: Operator::new(binding.operator()),
        }
    }
}

impl fmt::Display for RuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.class, self.operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Project;

    impl ImportTarget for Project {
        const CLASS_NAME: &'static str = "Project";
    }

    #[test]
    fn test_class_identity_is_name_based() {
        assert_eq!(ClassIdentity::of::<Project>(), ClassIdentity::named("Project"));
        assert_eq!(ClassIdentity::from(" Project "), ClassIdentity::named("Project"));
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        assert_ne!(Operator::new("Status"), Operator::new("status"));
        assert_ne!(ClassIdentity::named("project"), ClassIdentity::of::<Project>());
    }

    #[test]
    fn test_binding_and_class_resolve_to_same_key() {
        let class = ClassIdentity::of::<Project>();
        let binding = FieldBinding::new("Project", "status");

        assert_eq!(RuleKey::from_binding(&binding), RuleKey::from_class(&class, "status"));
        assert_eq!(
            RuleKey::from_class(&class, String::from("status ")),
            RuleKey::from_class(&class, "status")
        );
    }

    #[test]
    fn test_rule_key_display() {
        let key = RuleKey::from_class(&ClassIdentity::named("Project"), "name");
        assert_eq!(key.to_string(), "Project.name");
    }
}
