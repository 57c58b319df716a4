use crate::utils::{
    config::DesiredState,
    error::ChageError,
    tools::{CmdResult, CommandRunner},
    user::AgingInfo,
};
use log::{debug, info, warn};
use serde::Serialize;

pub const DEFAULT_CHAGE: &str = "chage";

#[derive(Debug, Serialize)]
pub struct Outcome {
    pub user: String,
    pub changed: bool,
    pub check_mode: bool,
    pub drifted: Vec<&'static str>,
}

/// Brings the password aging attributes of an account in line with a
/// [`DesiredState`] through the `chage` utility.
pub struct Reconciler<R: CommandRunner> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> Reconciler<R> {
    pub fn new(runner: R) -> Reconciler<R> {
        Reconciler {
            runner,
            program: DEFAULT_CHAGE.to_owned(),
        }
    }

    pub fn with_program(mut self, program: &str) -> Reconciler<R> {
        self.program = program.to_owned();
        self
    }

    fn exec(&self, cmd: Vec<String>) -> Result<CmdResult, ChageError> {
        let res = self.runner.run(&cmd)?;
        if !res.status.success() {
            return Err(ChageError::Execution {
                command: cmd.join(" "),
                status: res.status,
                stderr: res.err.trim().to_owned(),
            });
        }
        Ok(res)
    }

    pub fn observe(&self, user: &str) -> Result<AgingInfo, ChageError> {
        let res = self.exec(vec![self.program.clone(), "-l".to_owned(), user.to_owned()])?;
        let info = AgingInfo::parse(&res.out)?;
        info!("{}: {}", user, info);
        Ok(info)
    }

    /// Writes every field set in `desired` in a single `chage` call.
    pub fn apply(&self, user: &str, desired: &DesiredState) -> Result<(), ChageError> {
        let mut cmd = vec![self.program.clone()];
        cmd.extend(chage_flags(desired));
        cmd.push(user.to_owned());
        self.exec(cmd)?;
        info!("Updated password aging for {}", user);
        Ok(())
    }

    pub fn reconcile(
        &self,
        user: &str,
        desired: &DesiredState,
        check_mode: bool,
    ) -> Result<Outcome, ChageError> {
        let observed = self.observe(user)?;
        let drifted = drifted_fields(&observed, desired);
        for field in &drifted {
            warn!("{}: {} differs from the desired value", user, field);
        }
        let changed = !drifted.is_empty();
        if changed {
            if check_mode {
                warn!("Check mode, not updating {}", user);
            } else {
                self.apply(user, desired)?;
            }
        } else {
            debug!("{} already matches", user);
        }
        Ok(Outcome {
            user: user.to_owned(),
            changed,
            check_mode,
            drifted,
        })
    }
}

/// Names of the compared fields whose desired value differs from `observed`.
///
/// `inactive` is never compared: `chage -l` reports the inactivity cutoff as a
/// date, not as the day count that `--inactive` takes.
pub fn drifted_fields(observed: &AgingInfo, desired: &DesiredState) -> Vec<&'static str> {
    let checks = [
        ("last_day", desired.last_day.map(|d| d != observed.last_change)),
        (
            "expire_date",
            desired.expire_date.map(|d| d != observed.account_expires),
        ),
        ("min_days", desired.min_days.map(|d| d != observed.min_days)),
        ("max_days", desired.max_days.map(|d| d != observed.max_days)),
        ("warn_days", desired.warn_days.map(|d| d != observed.warn_days)),
    ];
    checks
        .into_iter()
        .filter(|(_, differs)| differs.unwrap_or(false))
        .map(|(name, _)| name)
        .collect()
}

pub fn needs_change(observed: &AgingInfo, desired: &DesiredState) -> bool {
    !drifted_fields(observed, desired).is_empty()
}

fn chage_flags(desired: &DesiredState) -> Vec<String> {
    let values = [
        ("--lastday", desired.last_day.map(|d| d.to_flag_value())),
        ("--expiredate", desired.expire_date.map(|d| d.to_flag_value())),
        ("--inactive", desired.inactive.map(|n| n.to_string())),
        ("--mindays", desired.min_days.map(|n| n.to_string())),
        ("--maxdays", desired.max_days.map(|n| n.to_string())),
        ("--warndays", desired.warn_days.map(|n| n.to_string())),
    ];
    let mut out = Vec::new();
    for (flag, value) in values {
        if let Some(value) = value {
            out.push(flag.to_owned());
            out.push(value);
        }
    }
    out
}
