//! Bulk configuration from YAML rule documents
//!
//! A rules document is expanded as a handlebars template against a JSON
//! context, parsed as YAML, optionally narrowed to a top-level section
//! (typically a locale), and then keyed by class name:
//!
//! ```yaml
//! Project:
//!   defaults:
//!     status: pending
//!     owner: "{{importer}}"
//!   substitutions:
//!     code: ["-", "_"]
//!   prefixes:
//!     name: PRJ-
//! ```
//!
//! Missing files, sections and class keys are not errors: configuration is
//! additive and best-effort. Only unreadable files, template failures and
//! YAML syntax errors propagate.

use handlebars::Handlebars;
use serde::Serialize;
use serde_yaml::Value;
use std::path::Path;
use tracing::{debug, info, warn};

use super::key::ClassIdentity;
use super::rule::{scalar_to_string, Rule, RuleKind};
use super::store::RuleStore;
use crate::error::{Result, RulesError};

/// Outcome of applying one class document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConfigureReport {
    /// Rules written to the store
    pub applied: usize,
    /// Entries dropped because their value had the wrong shape
    pub skipped: usize,
}

impl ConfigureReport {
    pub fn merge(&mut self, other: ConfigureReport) {
        self.applied += other.applied;
        self.skipped += other.skipped;
    }
}

/// Read and template-expand a rules document.
///
/// Returns `Ok(None)` when the file does not exist.
pub fn render_document(path: &Path, context: &serde_json::Value) -> Result<Option<String>> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Rules document not found, skipping");
            return Ok(None);
        }
        Err(source) => {
            return Err(RulesError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);

    handlebars
        .render_template(&raw, context)
        .map(Some)
        .map_err(|e| RulesError::Template {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

/// Load a rules document, narrowed to `section` when given.
///
/// Returns `Ok(None)` when the file or the section is missing.
pub fn load_document(
    path: &Path,
    context: &serde_json::Value,
    section: Option<&str>,
) -> Result<Option<Value>> {
    let Some(rendered) = render_document(path, context)? else {
        return Ok(None);
    };

    let parse_error = |source| RulesError::Parse {
        path: path.to_path_buf(),
        source,
    };
    let mut document: Value = serde_yaml::from_str(&rendered).map_err(parse_error)?;
    // Resolve `<<: *anchor` merge keys
    document.apply_merge().map_err(parse_error)?;

    match section {
        None => Ok(Some(document)),
        Some(section) => {
            let narrowed = document.get(section).cloned();
            if narrowed.is_none() {
                debug!(path = %path.display(), section, "Section not present in rules document");
            }
            Ok(narrowed)
        }
    }
}

/// The sub-document for `class`, if the document has one.
pub fn class_document<'a>(document: &'a Value, class: &ClassIdentity) -> Option<&'a Value> {
    document.get(class.as_str())
}

/// Apply the five rule sections of a class document to `store`.
///
/// Sections that are absent or not a mapping are skipped. Entries whose value
/// has the wrong shape for their kind, or whose key is not a scalar, are
/// skipped with a warning; everything else is still applied.
pub fn apply_class_document(
    store: &RuleStore,
    class: &ClassIdentity,
    document: &Value,
) -> ConfigureReport {
    let mut report = ConfigureReport::default();

    if let Some(sections) = document.as_mapping() {
        for name in sections.keys().filter_map(|key| key.as_str()) {
            if RuleKind::from_section(name).is_none() {
                debug!(%class, section = name, "Ignoring unknown rules section");
            }
        }
    }

    for kind in RuleKind::ALL {
        let Some(section) = document.get(kind.section()) else {
            continue;
        };
        let Some(entries) = section.as_mapping() else {
            debug!(%class, section = kind.section(), "Section is not a mapping, skipping");
            continue;
        };

        for (operator, value) in entries {
            let Some(operator) = scalar_to_string(operator) else {
                warn!(%class, section = kind.section(), "Ignoring rule with non-scalar operator key");
                report.skipped += 1;
                continue;
            };

            match Rule::from_yaml(kind, &operator, value) {
                Ok(rule) => {
                    info!(%class, %operator, %kind, value = ?value, "Applying population rule");
                    store.set_rule_on(class, operator.as_str(), rule);
                    report.applied += 1;
                }
                Err(e) => {
                    warn!(%class, %operator, %kind, "Skipping rule: {}", e);
                    report.skipped += 1;
                }
            }
        }
    }

    report
}
