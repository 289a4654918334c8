//! Population rules
//!
//! - `key`: class identities, operators, method bindings and rule keys
//! - `rule`: rule kinds and typed rule values
//! - `store`: the five rule tables of one locale
//! - `registry`: locale -> store, plus bulk configuration entry points
//! - `config`: YAML document loading and application
//! - `loader`: env-driven rules directory

pub mod config;
pub mod key;
pub mod loader;
pub mod registry;
pub mod rule;
pub mod store;

pub use config::{apply_class_document, class_document, load_document, ConfigureReport};
pub use key::{ClassIdentity, FieldBinding, ImportTarget, MethodBinding, Operator, RuleKey};
pub use loader::{RulesLoader, RULES_DIR_ENV};
pub use registry::{RulesRegistry, DEFAULT_LOCALE};
pub use rule::{Rule, RuleKind, RuleValue, Substitution};
pub use store::{RuleSnapshot, RuleStore};
