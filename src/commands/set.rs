use crate::linux::chage::Reconciler;
use crate::utils::{
    config::{load_config, parse_days, ChageDate, DesiredState, TargetConfig},
    error::ChageError,
    tools::{CommandRunner, SystemRunner},
};
use clap::ArgMatches;
use log::{debug, info};
use std::io::{stdout, Write};

#[derive(Debug)]
pub struct Target {
    pub user: String,
    pub chage_path: Option<String>,
    pub desired: DesiredState,
}

fn desired_from_args(cmd: &ArgMatches) -> Result<DesiredState, ChageError> {
    let date = |name: &str, field: &'static str| {
        cmd.get_one::<String>(name)
            .map(|v| ChageDate::from_arg(field, v))
            .transpose()
    };
    let days = |name: &str, field: &'static str| {
        cmd.get_one::<String>(name)
            .map(|v| parse_days(field, v))
            .transpose()
    };
    Ok(DesiredState {
        last_day: date("last-day", "last_day")?,
        expire_date: date("expire-date", "expire_date")?,
        inactive: days("inactive", "inactive")?,
        min_days: days("min-days", "min_days")?,
        max_days: days("max-days", "max_days")?,
        warn_days: days("warn-days", "warn_days")?,
    })
}

/// Combines the config file (if any) with flags, flags taking precedence.
pub fn resolve_target(cmd: &ArgMatches) -> Result<Target, ChageError> {
    let mut config = match cmd.get_one::<String>("config") {
        Some(path) => load_config(path)?,
        None => TargetConfig::default(),
    };
    config.desired.merge(desired_from_args(cmd)?);
    let user = cmd
        .get_one::<String>("user")
        .cloned()
        .or(config.user)
        .ok_or(ChageError::MissingUser)?;
    let chage_path = cmd.get_one::<String>("chage-path").cloned().or(config.chage_path);
    Ok(Target {
        user,
        chage_path,
        desired: config.desired,
    })
}

/// Reconciles the resolved target through `runner` and writes the outcome to `out`.
pub fn run<R: CommandRunner, W: Write>(
    cmd: &ArgMatches,
    runner: R,
    out: &mut W,
) -> Result<(), ChageError> {
    let target = resolve_target(cmd)?;
    let check_mode = cmd.is_present("check");
    if target.desired.is_empty() {
        info!("No attributes requested for {}", target.user);
    }
    debug!("Target {:?}", target);

    let mut reconciler = Reconciler::new(runner);
    if let Some(path) = &target.chage_path {
        reconciler = reconciler.with_program(path);
    }
    let outcome = reconciler.reconcile(&target.user, &target.desired, check_mode)?;

    writeln!(out, "{}", serde_json::to_string_pretty(&outcome)?)?;
    Ok(())
}

pub fn main(cmd: &ArgMatches) -> Result<(), ChageError> {
    run(cmd, SystemRunner, &mut stdout())
}
