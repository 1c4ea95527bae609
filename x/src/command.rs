//! Composing the build tool command line
//!
//! Composition is pure: the inherited environment is passed in as a snapshot
//! and the result is a new map for the child. The parent's own environment
//! is never modified.

use crate::policy::{ActionPolicy, EnvMode, EnvOverride};
use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::process::{Command, Stdio};

pub type Environment = BTreeMap<OsString, OsString>;

/// Snapshot of the current process environment.
pub fn inherited_env() -> Environment {
    std::env::vars_os().collect()
}

/// What the user asked for: `x <action> [trailing...]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InvocationRequest {
    pub action: String,
    pub trailing: Vec<OsString>,
}

/// The program that receives the action, e.g. `cargo` or `cargo +nightly`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tool {
    pub program: OsString,
    pub toolchain: Option<String>,
}

impl Default for Tool {
    fn default() -> Self {
        Self {
            program: OsString::from("cargo"),
            toolchain: None,
        }
    }
}

/// Final argument vector and environment for one child process.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ComposedCommand {
    program: OsString,
    args: Vec<OsString>,
    env: Environment,
    /// Index of the action token in `args`.
    action_at: usize,
    /// Variables touched by the policy, in first-touch order.
    overridden: Vec<OsString>,
}

/// Builds `[tool][+toolchain][action][policy args][trailing]` and the child's
/// environment.
pub fn compose(
    tool: &Tool,
    request: &InvocationRequest,
    policy: &ActionPolicy,
    inherited: &Environment,
) -> ComposedCommand {
    let mut args = Vec::with_capacity(2 + policy.args.len() + request.trailing.len());
    if let Some(tc) = &tool.toolchain {
        args.push(OsString::from(format!("+{tc}")));
    }
    let action_at = args.len();
    args.push(OsString::from(&request.action));
    args.extend(policy.args.iter().map(OsString::from));
    args.extend(request.trailing.iter().cloned());

    let mut overridden: Vec<OsString> = Vec::new();
    for ov in &policy.env {
        let name = OsString::from(&ov.name);
        if !overridden.contains(&name) {
            overridden.push(name);
        }
    }

    ComposedCommand {
        program: tool.program.clone(),
        args,
        env: merge_env(inherited, &policy.env),
        action_at,
        overridden,
    }
}

/// Applies `overrides` in order on top of a copy of `inherited`.
pub fn merge_env(inherited: &Environment, overrides: &[EnvOverride]) -> Environment {
    let mut env = inherited.clone();
    for ov in overrides {
        let name = OsString::from(&ov.name);
        let value = match (ov.mode, env.get(&name)) {
            (EnvMode::Append, Some(existing)) if !existing.is_empty() => {
                let mut v = existing.clone();
                v.push(" ");
                v.push(&ov.value);
                v
            }
            _ => OsString::from(&ov.value),
        };
        env.insert(name, value);
    }
    env
}

impl ComposedCommand {
    pub fn program(&self) -> &OsStr {
        &self.program
    }

    /// Full argument vector, program first.
    pub fn argv(&self) -> Vec<&OsStr> {
        std::iter::once(self.program.as_os_str())
            .chain(self.args.iter().map(OsString::as_os_str))
            .collect()
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn env_var(&self, name: &str) -> Option<&OsStr> {
        self.env.get(OsStr::new(name)).map(OsString::as_os_str)
    }

    /// The action token as passed to the tool.
    pub fn action(&self) -> &OsStr {
        self.args[self.action_at].as_os_str()
    }

    /// A `std::process::Command` with the exact environment and inherited stdio.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .env_clear()
            .envs(&self.env)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl fmt::Display for ComposedCommand {
    /// Shell-like rendering listing only the overridden variables.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut words: Vec<String> = Vec::new();
        for name in &self.overridden {
            if let Some(value) = self.env.get(name) {
                words.push(format!(
                    "{}={}",
                    name.to_string_lossy(),
                    shell_quote(&value.to_string_lossy())
                ));
            }
        }
        words.extend(self.argv().iter().map(|a| shell_quote(&a.to_string_lossy())));
        write!(f, "{}", words.join(" "))
    }
}

fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_+=,./:@%".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}
