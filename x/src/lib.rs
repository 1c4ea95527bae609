//! `x <action> [args...]`: run a cargo action with the environment variables
//! and feature flags that action needs in this workspace.

pub mod app;
pub mod cli;
pub mod command;
pub mod config;
pub mod invoke;
pub mod policy;
