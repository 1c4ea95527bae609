//! Action policies
//!
//! An action policy is what `x` adds on top of a plain `cargo <action>`:
//! environment overrides for the child and extra arguments placed right after
//! the action token. Policies live in a [`PolicyTable`]; actions missing from
//! the table resolve to the empty policy and are forwarded untouched.

mod preset;

pub use preset::Preset;

use serde::Deserialize;
use std::collections::BTreeMap;

/// How an override combines with a value already present in the environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvMode {
    /// Extend the existing value, separated by a single space.
    /// An unset variable counts as empty.
    #[default]
    Append,
    /// Replace whatever the caller had.
    Set,
}

/// One environment variable touched by a policy.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct EnvOverride {
    pub name: String,
    pub value: String,
    #[serde(default)]
    pub mode: EnvMode,
}

impl EnvOverride {
    pub fn set(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            mode: EnvMode::Set,
        }
    }

    pub fn append(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
            mode: EnvMode::Append,
        }
    }
}

/// Environment overrides and extra arguments for one action.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct ActionPolicy {
    /// Applied in order; the same variable may appear more than once.
    #[serde(default)]
    pub env: Vec<EnvOverride>,

    /// Inserted between the action and the user's own arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

static EMPTY: ActionPolicy = ActionPolicy {
    env: Vec::new(),
    args: Vec::new(),
};

impl ActionPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(mut self, ov: EnvOverride) -> Self {
        self.env.push(ov);
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.env.is_empty() && self.args.is_empty()
    }
}

/// Action name to policy lookup. Matching is exact and case-sensitive.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PolicyTable {
    policies: BTreeMap<String, ActionPolicy>,
}

impl PolicyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, action: &str, policy: ActionPolicy) -> Self {
        self.insert(action, policy);
        self
    }

    /// Adds or replaces the policy for `action`.
    pub fn insert(&mut self, action: &str, policy: ActionPolicy) {
        self.policies.insert(action.to_string(), policy);
    }

    /// Never fails: unknown actions get the empty policy.
    pub fn resolve(&self, action: &str) -> &ActionPolicy {
        self.policies.get(action).unwrap_or(&EMPTY)
    }

    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.policies.keys().map(String::as_str)
    }
}
