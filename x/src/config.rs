//! Configuration file support for x
//!
//! Reads x.toml from the current directory to pick a preset, the tool to
//! run, and per-action policy replacements.

use crate::command::Tool;
use crate::policy::{ActionPolicy, PolicyTable, Preset};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "x.toml";

#[derive(Debug, Default, Deserialize)]
pub struct XConfig {
    /// Built-in policy table to start from.
    #[serde(default)]
    pub preset: Option<Preset>,

    /// Program to invoke instead of `cargo`.
    #[serde(default)]
    pub tool: Option<String>,

    /// Toolchain passed as `+<name>`. An empty string drops the preset's pin.
    #[serde(default)]
    pub toolchain: Option<String>,

    #[serde(default)]
    pub verbose: bool,

    /// Replaces the preset's policy for each listed action.
    #[serde(default)]
    pub actions: BTreeMap<String, ActionPolicy>,

    /// Where this config came from; `None` means built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl XConfig {
    /// Load config from x.toml (or use defaults if the file doesn't exist)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(XConfig::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let mut config =
            Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: XConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.tool.as_deref() == Some("") {
            bail!("`tool` must not be empty");
        }
        for (action, policy) in &self.actions {
            if action.is_empty() {
                bail!("[actions] entry with an empty action name");
            }
            for ov in &policy.env {
                if ov.name.is_empty() || ov.name.contains(['=', '\0']) {
                    bail!("actions.{action}: invalid environment variable name {:?}", ov.name);
                }
                if ov.value.contains('\0') {
                    bail!("actions.{action}: value of {} contains a NUL byte", ov.name);
                }
            }
        }
        Ok(())
    }

    /// The preset's table with this config's action entries applied on top.
    pub fn policy_table(&self, preset: Preset) -> PolicyTable {
        let mut table = preset.table();
        for (action, policy) in &self.actions {
            table.insert(action, policy.clone());
        }
        table
    }

    pub fn tool(&self, preset: Preset) -> Tool {
        let program = self
            .tool
            .as_deref()
            .map_or_else(|| Tool::default().program, OsString::from);
        let toolchain = match self.toolchain.as_deref() {
            Some("") => None,
            Some(tc) => Some(tc.to_string()),
            None => preset.toolchain().map(str::to_string),
        };
        Tool { program, toolchain }
    }
}
