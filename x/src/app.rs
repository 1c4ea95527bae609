use crate::command::{compose, inherited_env};
use crate::config::XConfig;
use anyhow::Result;
use std::env;

pub fn run(cli: crate::cli::Cli) -> Result<()> {
    // Usage errors surface before anything else is looked at.
    let request = cli.request()?;

    let config = XConfig::load()?;
    let verbose = cli.verbose || config.verbose || verbose_from_env();
    let preset = cli.preset.or(config.preset).unwrap_or_default();

    if verbose {
        match &config.source {
            Some(path) => eprintln!("[info] Config: {}", path.display()),
            None => eprintln!("[info] Config: built-in defaults"),
        }
        eprintln!("[info] Preset: {}", preset.name());
    }

    let table = config.policy_table(preset);
    let policy = table.resolve(&request.action);
    if verbose && policy.is_empty() {
        eprintln!(
            "[info] No policy for `{}` (known: {}), passing through",
            request.action,
            table.actions().collect::<Vec<_>>().join(", ")
        );
    }
    let cmd = compose(&config.tool(preset), &request, policy, &inherited_env());

    if cli.dry_run {
        println!("{cmd}");
        return Ok(());
    }
    if verbose {
        eprintln!("[info] Running: {cmd}");
    }

    let status = crate::invoke::run(&cmd)?;
    crate::invoke::check(&cmd, status)
}

fn verbose_from_env() -> bool {
    env::var_os("X_VERBOSE").is_some_and(|v| !v.is_empty() && v != "0")
}
