//! Population Rules Registry
//!
//! Rules consulted by a bulk import engine while it maps inbound records onto
//! target objects. For every (target class, operator) pair the registry can
//! hold a default value, a forced override, a substitution, and prefix/postfix
//! text. The registry stores and returns rule data; applying it is the import
//! engine's job.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Import engine (queries by MethodBinding at population time)    │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    RulesRegistry                                 │
//! │              locale -> Arc<RuleStore>                            │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      RuleStore                                   │
//! │  defaults | overrides | substitutions | prefixes | postfixes     │
//! │          class identity -> operator -> value                     │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use ob_population_rules::{ClassIdentity, FieldBinding, RulesRegistry};
//!
//! let registry = RulesRegistry::new();
//! let project = ClassIdentity::named("Project");
//!
//! // Bulk configuration from YAML (handlebars-expanded first)
//! registry.configure_from(None, &project, "config/population/projects.yaml", None, &context)?;
//!
//! // At population time
//! let store = registry.default_instance();
//! if let Some(default) = store.default_for(&FieldBinding::new("Project", "status")) {
//!     // ...
//! }
//! ```

pub mod error;
pub mod rules;

pub use error::{Result, RulesError};
pub use rules::{
    ClassIdentity, ConfigureReport, FieldBinding, ImportTarget, MethodBinding, Operator, Rule,
    RuleKey, RuleKind, RuleSnapshot, RuleStore, RuleValue, RulesLoader, RulesRegistry,
    Substitution, DEFAULT_LOCALE, RULES_DIR_ENV,
};
