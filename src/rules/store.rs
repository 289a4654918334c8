//! Rule store
//!
//! Holds the five rule tables for exactly one locale. Each table maps
//! `class identity -> operator -> value` and is independent of the others, so
//! a single cell may carry any subset of the five rule kinds.
//!
//! Reading a class that has no bucket yet inserts an empty one. Lookups
//! therefore only ever miss at the operator level, and a single read is
//! enough for the class to show up in [`RuleStore::classes`].

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::key::{ClassIdentity, MethodBinding, Operator, RuleKey};
use super::rule::{Rule, RuleKind, RuleValue, Substitution};
use crate::error::Result;

type RuleTable<V> = HashMap<ClassIdentity, HashMap<Operator, V>>;

#[derive(Debug, Default)]
struct RuleTables {
    defaults: RuleTable<RuleValue>,
    overrides: RuleTable<RuleValue>,
    substitutions: RuleTable<Substitution>,
    prefixes: RuleTable<String>,
    postfixes: RuleTable<String>,
}

/// Static selector for one of the five tables.
trait TableSlot {
    type Value: Clone;

    fn table(tables: &RuleTables) -> &RuleTable<Self::Value>;
    fn table_mut(tables: &mut RuleTables) -> &mut RuleTable<Self::Value>;
}

macro_rules! table_slot {
    ($slot:ident, $field:ident, $value:ty) => {
        struct $slot;

        impl TableSlot for $slot {
            type Value = $value;

            fn table(tables: &RuleTables) -> &RuleTable<$value> {
                &tables.$field
            }

            fn table_mut(tables: &mut RuleTables) -> &mut RuleTable<$value> {
                &mut tables.$field
            }
        }
    };
}

table_slot!(Defaults, defaults, RuleValue);
table_slot!(Overrides, overrides, RuleValue);
table_slot!(Substitutions, substitutions, Substitution);
table_slot!(Prefixes, prefixes, String);
table_slot!(Postfixes, postfixes, String);

/// Serializable copy of a store's non-empty buckets, sorted for stable output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RuleSnapshot {
    pub defaults: BTreeMap<ClassIdentity, BTreeMap<Operator, RuleValue>>,
    pub overrides: BTreeMap<ClassIdentity, BTreeMap<Operator, RuleValue>>,
    pub substitutions: BTreeMap<ClassIdentity, BTreeMap<Operator, Substitution>>,
    pub prefixes: BTreeMap<ClassIdentity, BTreeMap<Operator, String>>,
    pub postfixes: BTreeMap<ClassIdentity, BTreeMap<Operator, String>>,
}

fn sorted<V: Clone>(table: &RuleTable<V>) -> BTreeMap<ClassIdentity, BTreeMap<Operator, V>> {
    table
        .iter()
        .filter(|(_, bucket)| !bucket.is_empty())
        .map(|(class, bucket)| {
            let bucket = bucket
                .iter()
                .map(|(op, value)| (op.clone(), value.clone()))
                .collect();
            (class.clone(), bucket)
        })
        .collect()
}

/// The five rule tables of one locale.
///
/// Safe to share between threads. Every write is a single insert under the
/// table lock, so concurrent writers to the same cell end with one of the
/// written values (last write wins).
#[derive(Debug, Default)]
pub struct RuleStore {
    tables: RwLock<RuleTables>,
}

impl RuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    // Every critical section leaves the maps consistent, so a poisoned lock
    // still guards valid data.
    fn read(&self) -> RwLockReadGuard<'_, RuleTables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RuleTables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Discard every rule in all five tables.
    pub fn clear(&self) {
        *self.write() = RuleTables::default();
    }

    /// Run `f` on the class bucket, inserting an empty bucket first if absent.
    fn with_bucket<S, R>(
        &self,
        class: &ClassIdentity,
        f: impl FnOnce(&HashMap<Operator, S::Value>) -> R,
    ) -> R
    where
        S: TableSlot,
    {
        {
            let tables = self.read();
            if let Some(bucket) = S::table(&tables).get(class) {
                return f(bucket);
            }
        }
        let mut tables = self.write();
        let bucket = S::table_mut(&mut tables).entry(class.clone()).or_default();
        f(bucket)
    }

    fn lookup<S: TableSlot>(&self, key: &RuleKey) -> Option<S::Value> {
        self.with_bucket::<S, _>(&key.class, |bucket| bucket.get(&key.operator).cloned())
    }

    fn contains<S: TableSlot>(&self, key: &RuleKey) -> bool {
        self.with_bucket::<S, _>(&key.class, |bucket| bucket.contains_key(&key.operator))
    }

    fn insert<S: TableSlot>(&self, key: &RuleKey, value: S::Value) -> S::Value {
        let mut tables = self.write();
        S::table_mut(&mut tables)
            .entry(key.class.clone())
            .or_default()
            .insert(key.operator.clone(), value.clone());
        value
    }

    fn operators<S: TableSlot>(&self, class: &ClassIdentity) -> Vec<Operator> {
        self.with_bucket::<S, _>(class, |bucket| {
            let mut ops: Vec<Operator> = bucket.keys().cloned().collect();
            ops.sort();
            ops
        })
    }

    /// Operators with a rule of `kind` for `class`.
    ///
    /// Creates the empty class bucket when it does not exist yet.
    pub fn table_for(&self, kind: RuleKind, class: &ClassIdentity) -> Vec<Operator> {
        match kind {
            RuleKind::Default => self.operators::<Defaults>(class),
            RuleKind::Override => self.operators::<Overrides>(class),
            RuleKind::Substitution => self.operators::<Substitutions>(class),
            RuleKind::Prefix => self.operators::<Prefixes>(class),
            RuleKind::Postfix => self.operators::<Postfixes>(class),
        }
    }

    /// Classes that have a bucket in the `kind` table, empty or not.
    /// Does not create anything.
    pub fn classes(&self, kind: RuleKind) -> Vec<ClassIdentity> {
        let tables = self.read();
        let mut classes: Vec<ClassIdentity> = match kind {
            RuleKind::Default => tables.defaults.keys().cloned().collect(),
            RuleKind::Override => tables.overrides.keys().cloned().collect(),
            RuleKind::Substitution => tables.substitutions.keys().cloned().collect(),
            RuleKind::Prefix => tables.prefixes.keys().cloned().collect(),
            RuleKind::Postfix => tables.postfixes.keys().cloned().collect(),
        };
        classes.sort();
        classes
    }

    // Defaults

    pub fn get_default(&self, key: &RuleKey) -> Option<RuleValue> {
        self.lookup::<Defaults>(key)
    }

    pub fn has_default(&self, key: &RuleKey) -> bool {
        self.contains::<Defaults>(key)
    }

    pub fn set_default(&self, key: &RuleKey, value: RuleValue) -> RuleValue {
        self.insert::<Defaults>(key, value)
    }

    pub fn default_for(&self, binding: &impl MethodBinding) -> Option<RuleValue> {
        self.get_default(&RuleKey::from_binding(binding))
    }

    pub fn has_default_for(&self, binding: &impl MethodBinding) -> bool {
        self.has_default(&RuleKey::from_binding(binding))
    }

    pub fn set_default_on(
        &self,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
        value: RuleValue,
    ) -> RuleValue {
        self.set_default(&RuleKey::from_class(class, operator), value)
    }

    // Overrides

    pub fn get_override(&self, key: &RuleKey) -> Option<RuleValue> {
        self.lookup::<Overrides>(key)
    }

    pub fn has_override(&self, key: &RuleKey) -> bool {
        self.contains::<Overrides>(key)
    }

    pub fn set_override(&self, key: &RuleKey, value: RuleValue) -> RuleValue {
        self.insert::<Overrides>(key, value)
    }

    pub fn override_for(&self, binding: &impl MethodBinding) -> Option<RuleValue> {
        self.get_override(&RuleKey::from_binding(binding))
    }

    pub fn has_override_for(&self, binding: &impl MethodBinding) -> bool {
        self.has_override(&RuleKey::from_binding(binding))
    }

    pub fn set_override_on(
        &self,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
        value: RuleValue,
    ) -> RuleValue {
        self.set_override(&RuleKey::from_class(class, operator), value)
    }

    // Substitutions

    pub fn get_substitution(&self, key: &RuleKey) -> Option<Substitution> {
        self.lookup::<Substitutions>(key)
    }

    pub fn has_substitution(&self, key: &RuleKey) -> bool {
        self.contains::<Substitutions>(key)
    }

    pub fn set_substitution(&self, key: &RuleKey, value: Substitution) -> Substitution {
        self.insert::<Substitutions>(key, value)
    }

    pub fn substitution_for(&self, binding: &impl MethodBinding) -> Option<Substitution> {
        self.get_substitution(&RuleKey::from_binding(binding))
    }

    pub fn has_substitution_for(&self, binding: &impl MethodBinding) -> bool {
        self.has_substitution(&RuleKey::from_binding(binding))
    }

    pub fn set_substitution_on(
        &self,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
        value: Substitution,
    ) -> Substitution {
        self.set_substitution(&RuleKey::from_class(class, operator), value)
    }

    /// Set a substitution from a `[pattern, replacement]` list.
    ///
    /// Any other length is rejected and leaves the table untouched.
    pub fn set_substitution_on_list<S: AsRef<str>>(
        &self,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
        list: &[S],
    ) -> Result<Substitution> {
        let key = RuleKey::from_class(class, operator);
        let substitution = Substitution::from_list(key.operator.as_str(), list)?;
        Ok(self.set_substitution(&key, substitution))
    }

    // Prefixes

    pub fn get_prefix(&self, key: &RuleKey) -> Option<String> {
        self.lookup::<Prefixes>(key)
    }

    pub fn has_prefix(&self, key: &RuleKey) -> bool {
        self.contains::<Prefixes>(key)
    }

    pub fn set_prefix(&self, key: &RuleKey, value: impl Into<String>) -> String {
        self.insert::<Prefixes>(key, value.into())
    }

    pub fn prefix_for(&self, binding: &impl MethodBinding) -> Option<String> {
        self.get_prefix(&RuleKey::from_binding(binding))
    }

    pub fn has_prefix_for(&self, binding: &impl MethodBinding) -> bool {
        self.has_prefix(&RuleKey::from_binding(binding))
    }

    pub fn set_prefix_on(
        &self,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
        value: impl Into<String>,
    ) -> String {
        self.set_prefix(&RuleKey::from_class(class, operator), value)
    }

    // Postfixes

    pub fn get_postfix(&self, key: &RuleKey) -> Option<String> {
        self.lookup::<Postfixes>(key)
    }

    pub fn has_postfix(&self, key: &RuleKey) -> bool {
        self.contains::<Postfixes>(key)
    }

    pub fn set_postfix(&self, key: &RuleKey, value: impl Into<String>) -> String {
        self.insert::<Postfixes>(key, value.into())
    }

    pub fn postfix_for(&self, binding: &impl MethodBinding) -> Option<String> {
        self.get_postfix(&RuleKey::from_binding(binding))
    }

    pub fn has_postfix_for(&self, binding: &impl MethodBinding) -> bool {
        self.has_postfix(&RuleKey::from_binding(binding))
    }

    pub fn set_postfix_on(
        &self,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
        value: impl Into<String>,
    ) -> String {
        self.set_postfix(&RuleKey::from_class(class, operator), value)
    }

    // Kind-tagged access

    /// Look up the rule of `kind` at `key`.
    pub fn get_rule(&self, kind: RuleKind, key: &RuleKey) -> Option<Rule> {
        match kind {
            RuleKind::Default => self.get_default(key).map(Rule::Default),
            RuleKind::Override => self.get_override(key).map(Rule::Override),
            RuleKind::Substitution => self.get_substitution(key).map(Rule::Substitution),
            RuleKind::Prefix => self.get_prefix(key).map(Rule::Prefix),
            RuleKind::Postfix => self.get_postfix(key).map(Rule::Postfix),
        }
    }

    pub fn has_rule(&self, kind: RuleKind, key: &RuleKey) -> bool {
        match kind {
            RuleKind::Default => self.has_default(key),
            RuleKind::Override => self.has_override(key),
            RuleKind::Substitution => self.has_substitution(key),
            RuleKind::Prefix => self.has_prefix(key),
            RuleKind::Postfix => self.has_postfix(key),
        }
    }

    /// Store `rule` in the table its variant names.
    pub fn set_rule_on(
        &self,
        class: &ClassIdentity,
        operator: impl Into<Operator>,
        rule: Rule,
    ) -> Rule {
        match rule {
            Rule::Default(value) => Rule::Default(self.set_default_on(class, operator, value)),
            Rule::Override(value) => Rule::Override(self.set_override_on(class, operator, value)),
            Rule::Substitution(value) => {
                Rule::Substitution(self.set_substitution_on(class, operator, value))
            }
            Rule::Prefix(value) => Rule::Prefix(self.set_prefix_on(class, operator, value)),
            Rule::Postfix(value) => Rule::Postfix(self.set_postfix_on(class, operator, value)),
        }
    }

    /// Number of rules across all five tables.
    pub fn rule_count(&self) -> usize {
        let tables = self.read();
        fn count<V>(table: &RuleTable<V>) -> usize {
            table.values().map(HashMap::len).sum()
        }
        count(&tables.defaults)
            + count(&tables.overrides)
            + count(&tables.substitutions)
            + count(&tables.prefixes)
            + count(&tables.postfixes)
    }

    pub fn snapshot(&self) -> RuleSnapshot {
        let tables = self.read();
        RuleSnapshot {
            defaults: sorted(&tables.defaults),
            overrides: sorted(&tables.overrides),
            substitutions: sorted(&tables.substitutions),
            prefixes: sorted(&tables.prefixes),
            postfixes: sorted(&tables.postfixes),
        }
    }
}
