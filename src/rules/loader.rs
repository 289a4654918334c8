//! Rules directory loader
//!
//! Resolves rule documents relative to a rules directory taken from
//! `POPULATION_RULES_DIR` (default `config/population`).

use std::path::{Path, PathBuf};
use tracing::info;

use super::config::ConfigureReport;
use super::key::ClassIdentity;
use super::registry::RulesRegistry;
use crate::error::Result;

/// Environment variable naming the rules directory
pub const RULES_DIR_ENV: &str = "POPULATION_RULES_DIR";

const DEFAULT_RULES_DIR: &str = "config/population";

pub struct RulesLoader {
    rules_dir: PathBuf,
}

impl RulesLoader {
    pub fn new(rules_dir: impl Into<PathBuf>) -> Self {
        Self {
            rules_dir: rules_dir.into(),
        }
    }

    /// Create loader from POPULATION_RULES_DIR or default to "config/population"
    pub fn from_env() -> Self {
        let dir = std::env::var(RULES_DIR_ENV).unwrap_or_else(|_| DEFAULT_RULES_DIR.to_string());
        Self::new(dir)
    }

    pub fn rules_dir(&self) -> &Path {
        &self.rules_dir
    }

    /// Path of a document; `name` without extension gets `.yaml`.
    pub fn path_for(&self, name: &str) -> PathBuf {
        let path = self.rules_dir.join(name);
        if path.extension().is_some() {
            path
        } else {
            path.with_extension("yaml")
        }
    }

    /// Configure each class in `classes` from document `name`.
    pub fn configure(
        &self,
        registry: &RulesRegistry,
        locale: Option<&str>,
        classes: &[ClassIdentity],
        name: &str,
        section: Option<&str>,
        context: &serde_json::Value,
    ) -> Result<ConfigureReport> {
        let path = self.path_for(name);
        info!(path = %path.display(), classes = classes.len(), "Loading population rules");

        let mut total = ConfigureReport::default();
        for class in classes {
            total.merge(registry.configure_from(locale, class, &path, section, context)?);
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::key::RuleKey;

    #[test]
    fn test_from_env_default() {
        std::env::remove_var(RULES_DIR_ENV);
        let loader = RulesLoader::from_env();
        assert_eq!(loader.rules_dir(), Path::new("config/population"));
    }

    #[test]
    fn test_path_for_adds_yaml_extension() {
        let loader = RulesLoader::new("rules");
        assert_eq!(loader.path_for("projects"), PathBuf::from("rules/projects.yaml"));
        assert_eq!(loader.path_for("projects.yml"), PathBuf::from("rules/projects.yml"));
    }

    #[test]
    fn test_configure_several_classes() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("import.yaml"),
            r#"
Project:
  defaults:
    status: pending
Task:
  postfixes:
    title: " [{{batch}}]"
"#,
        )
        .unwrap();

        let loader = RulesLoader::new(dir.path());
        let registry = RulesRegistry::new();
        let classes = [ClassIdentity::named("Project"), ClassIdentity::named("Task")];
        let context = serde_json::json!({ "batch": "B12" });

        let report = loader
            .configure(&registry, None, &classes, "import", None, &context)
            .unwrap();

        assert_eq!(report.applied, 2);
        let key = RuleKey::from_class(&classes[1], "title");
        assert_eq!(
            registry.default_instance().get_postfix(&key),
            Some(" [B12]".to_string())
        );
    }
}
