//! Per-locale rules registry
//!
//! The `RulesRegistry` owns one [`RuleStore`] per locale. Stores are created
//! on first access and live as long as the registry; [`RulesRegistry::reset`]
//! swaps in a fresh store for one locale without touching the others.
//!
//! The registry is an ordinary value: construct it once and hand it (or an
//! `Arc` of it) to whatever needs rules.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use super::config::{apply_class_document, class_document, load_document, ConfigureReport};
use super::key::{ClassIdentity, MethodBinding, Operator, RuleKey};
use super::rule::{Rule, RuleKind};
use super::store::RuleStore;
use crate::error::Result;

/// Locale used when the caller does not name one.
pub const DEFAULT_LOCALE: &str = "en";

/// Registry of rule stores keyed by locale
pub struct RulesRegistry {
    /// Map of locale -> store
    stores: RwLock<HashMap<String, Arc<RuleStore>>>,
    default_locale: String,
}

impl RulesRegistry {
    pub fn new() -> Self {
        Self::with_default_locale(DEFAULT_LOCALE)
    }

    pub fn with_default_locale(locale: impl Into<String>) -> Self {
        Self {
            stores: RwLock::new(HashMap::new()),
            default_locale: locale.into(),
        }
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    fn resolve<'a>(&'a self, locale: Option<&'a str>) -> &'a str {
        locale.unwrap_or(&self.default_locale)
    }

    /// Get the store for `locale`, creating it on first request.
    ///
    /// Concurrent first requests for the same locale all receive the same
    /// store: the existence check and the insert happen under one write lock.
    pub fn instance(&self, locale: &str) -> Arc<RuleStore> {
        {
            let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(store) = stores.get(locale) {
                return Arc::clone(store);
            }
        }

        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        let store = stores.entry(locale.to_string()).or_insert_with(|| {
            debug!(locale, "Creating rule store");
            Arc::new(RuleStore::new())
        });
        Arc::clone(store)
    }

    /// Store for the default locale
    pub fn default_instance(&self) -> Arc<RuleStore> {
        self.instance(&self.default_locale)
    }

    fn store(&self, locale: Option<&str>) -> Arc<RuleStore> {
        self.instance(self.resolve(locale))
    }

    /// Replace the store for `locale` with an empty one.
    ///
    /// Holders of the previous `Arc<RuleStore>` keep their (now detached) copy.
    pub fn reset(&self, locale: &str) {
        let mut stores = self.stores.write().unwrap_or_else(PoisonError::into_inner);
        stores.insert(locale.to_string(), Arc::new(RuleStore::new()));
        info!(locale, "Reset rule store");
    }

    /// Locales that currently have a store
    pub fn locales(&self) -> Vec<String> {
        let stores = self.stores.read().unwrap_or_else(PoisonError::into_inner);
        let mut locales: Vec<String> = stores.keys().cloned().collect();
        locales.sort();
        locales
    }

    /// Configure `class` from a rules document on disk.
    ///
    /// The file is expanded as a handlebars template against `context`,
    /// narrowed to `section` when given, and the `class` entry applied to the
    /// store for `locale`. A missing file, section or class entry applies
    /// nothing and is not an error.
    pub fn configure_from(
        &self,
        locale: Option<&str>,
        class: &ClassIdentity,
        path: impl AsRef<Path>,
        section: Option<&str>,
        context: &serde_json::Value,
    ) -> Result<ConfigureReport> {
        let path = path.as_ref();
        let Some(document) = load_document(path, context, section)? else {
            return Ok(ConfigureReport::default());
        };

        match class_document(&document, class) {
            Some(class_doc) => Ok(self.configure_from_document(locale, class, class_doc)),
            None => {
                debug!(%class, path = %path.display(), "No rules for class in document");
                Ok(ConfigureReport::default())
            }
        }
    }

    /// Apply an already parsed class document to the store for `locale`.
    pub fn configure_from_document(
        &self,
        locale: Option<&str>,
        class: &ClassIdentity,
        document: &serde_yaml::Value,
    ) -> ConfigureReport {
        let locale = self.resolve(locale);
        let report = apply_class_document(&self.instance(locale), class, document);
        info!(
            locale,
            %class,
            applied = report.applied,
            skipped = report.skipped,
            "Configured population rules"
        );
        report
    }

    /// Rule of `kind` for the field a binding refers to.
    pub fn rule(
        &self,
        locale: Option<&str>,
        kind: RuleKind,
        binding: &impl MethodBinding,
    ) -> Option<Rule> {
        self.store(locale)
            .get_rule(kind, &RuleKey::from_binding(binding))
    }

    pub fn has_rule(
        &self,
        locale: Option<&str>,
        kind: RuleKind,
        binding: &impl MethodBinding,
    ) -> bool {
        self.store(locale)
            .has_rule(kind, &RuleKey::from_binding(binding))
    }

    /// Rule of `kind` for an explicit class and operator.
    pub fn rule_on(
        &self,
        locale: Option<&str>,
        kind: RuleKind,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
    ) -> Option<Rule> {
        self.store(locale)
            .get_rule(kind, &RuleKey::from_class(class, operator))
    }

    pub fn set_rule_on(
        &self,
        locale: Option<&str>,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
        rule: Rule,
    ) -> Rule {
        self.store(locale).set_rule_on(class, operator, rule)
    }
}

impl Default for RulesRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::key::FieldBinding;
    use crate::rules::rule::RuleValue;

    fn project() -> ClassIdentity {
        ClassIdentity::named("Project")
    }

    #[test]
    fn test_instance_is_cached() {
        let registry = RulesRegistry::new();
        let first = registry.instance("en");
        let second = registry.instance("en");

        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &registry.default_instance()));
        assert_eq!(registry.locales(), vec!["en".to_string()]);
    }

    #[test]
    fn test_reset_only_touches_one_locale() {
        let registry = RulesRegistry::new();
        registry.instance("en").set_prefix_on(&project(), "name", "PRJ-");
        registry.instance("de").set_prefix_on(&project(), "name", "PRJ-DE-");

        let before = registry.instance("en");
        registry.reset("en");

        let key = RuleKey::from_class(&project(), "name");
        assert!(!Arc::ptr_eq(&before, &registry.instance("en")));
        for kind in RuleKind::ALL {
            assert!(!registry.instance("en").has_rule(kind, &key));
        }
        assert_eq!(registry.instance("de").get_prefix(&key), Some("PRJ-DE-".to_string()));
    }

    #[test]
    fn test_custom_default_locale() {
        let registry = RulesRegistry::with_default_locale("fr");
        let rule = Rule::Default(RuleValue::from("en cours"));
        registry.set_rule_on(None, &project(), "status", rule);

        assert_eq!(registry.default_locale(), "fr");
        assert!(registry
            .rule_on(Some("fr"), RuleKind::Default, &project(), "status")
            .is_some());
        assert!(registry
            .rule_on(Some("en"), RuleKind::Default, &project(), "status")
            .is_none());
    }

    #[test]
    fn test_rule_by_binding_matches_rule_by_class() {
        let registry = RulesRegistry::new();
        registry.set_rule_on(None, &project(), "name", Rule::Prefix("PRJ-".to_string()));

        let binding = FieldBinding::new("Project", "name");
        assert_eq!(
            registry.rule(None, RuleKind::Prefix, &binding),
            registry.rule_on(None, RuleKind::Prefix, &project(), "name")
        );
        assert!(registry.has_rule(None, RuleKind::Prefix, &binding));
        assert!(!registry.has_rule(None, RuleKind::Postfix, &binding));
    }

    #[test]
    fn test_configure_from_document_example() {
        let registry = RulesRegistry::new();
        let doc: serde_yaml::Value = serde_yaml::from_str(
            r#"
Project:
  defaults:
    status: pending
  prefixes:
    name: PRJ-
"#,
        )
        .unwrap();

        let class_doc = class_document(&doc, &project()).unwrap();
        let report = registry.configure_from_document(None, &project(), class_doc);

        assert_eq!(report.applied, 2);
        let store = registry.default_instance();
        assert_eq!(
            store.get_default(&RuleKey::from_class(&project(), "status")),
            Some(RuleValue::from("pending"))
        );
        assert_eq!(
            store.get_prefix(&RuleKey::from_class(&project(), "name")),
            Some("PRJ-".to_string())
        );
        assert!(!store.has_override(&RuleKey::from_class(&project(), "status")));
    }
}
