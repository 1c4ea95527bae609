use crate::command::InvocationRequest;
use crate::policy::Preset;
use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use std::ffi::OsString;

#[derive(Debug, Parser)]
#[command(name = "x")]
#[command(disable_help_subcommand = true)]
#[command(about = "Run a cargo action with the environment and features it needs")]
#[command(
    override_usage = "x [OPTIONS] <ACTION> [ARGS]...",
    after_help = "Everything after <ACTION> is passed to cargo untouched.\n\
                  Options for x itself must come before the action."
)]
pub struct Cli {
    /// Print the composed command line on stderr before running it.
    #[arg(short, long)]
    pub verbose: bool,

    /// Print the composed command line and exit without running it.
    #[arg(short = 'n', long = "dry-run")]
    pub dry_run: bool,

    /// Built-in policy table to use (overrides `preset` in x.toml).
    #[arg(long, value_enum)]
    pub preset: Option<Preset>,

    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Debug, Subcommand)]
pub enum Cmd {
    /// `<action> [args...]`, captured verbatim.
    #[command(external_subcommand)]
    Action(Vec<OsString>),
}

impl Cli {
    /// Splits the captured tokens into the action and the trailing arguments.
    pub fn request(&self) -> Result<InvocationRequest> {
        let Cmd::Action(tokens) = &self.cmd;
        let (action, trailing) = tokens.split_first().context("usage: x <action> [args...]")?;
        let action = action
            .to_str()
            .ok_or_else(|| anyhow!("action {:?} is not valid UTF-8", action))?;
        if action.is_empty() {
            bail!("usage: x <action> [args...] (the action must not be empty)");
        }
        Ok(InvocationRequest {
            action: action.to_string(),
            trailing: trailing.to_vec(),
        })
    }
}
