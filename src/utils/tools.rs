use crate::utils::error::ChageError;
use log::debug;
use std::ffi::OsString;
use subprocess::{ExitStatus, Popen, PopenConfig, Redirection};

pub struct CmdResult {
    pub out: String,
    pub err: String,
    pub status: ExitStatus,
}

/// Runs an external command line, `cmd[0]` being the program.
///
/// Exit codes are not interpreted here; callers decide what a failure means.
pub trait CommandRunner {
    fn run(&self, cmd: &[String]) -> Result<CmdResult, ChageError>;
}

/// Spawns real processes with the C locale so tools print untranslated labels.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &[String]) -> Result<CmdResult, ChageError> {
        debug!("Running {}", cmd.join(" "));
        let mut env = PopenConfig::current_env();
        env.retain(|(key, _)| key != "LC_ALL");
        env.push((OsString::from("LC_ALL"), OsString::from("C")));

        let mut p = Popen::create(
            cmd,
            PopenConfig {
                stdout: Redirection::Pipe,
                stderr: Redirection::Pipe,
                env: Some(env),
                ..Default::default()
            },
        )
        .map_err(|source| ChageError::Spawn {
            command: cmd.join(" "),
            source,
        })?;

        let (out, err) = p.communicate(None)?;
        let status = p.wait().map_err(|source| ChageError::Spawn {
            command: cmd.join(" "),
            source,
        })?;

        Ok(CmdResult {
            out: out.unwrap_or_default(),
            err: err.unwrap_or_default(),
            status,
        })
    }
}

/// Answers `chage -l` with a canned report and records every call.
#[cfg(test)]
pub(crate) struct FakeRunner {
    pub report: String,
    pub list_status: ExitStatus,
    pub write_status: ExitStatus,
    pub calls: std::cell::RefCell<Vec<Vec<String>>>,
}

#[cfg(test)]
impl FakeRunner {
    pub fn new(report: &str) -> FakeRunner {
        FakeRunner {
            report: report.to_owned(),
            list_status: ExitStatus::Exited(0),
            write_status: ExitStatus::Exited(0),
            calls: std::cell::RefCell::new(Vec::new()),
        }
    }

    /// Every recorded call except the `-l` queries.
    pub fn writes(&self) -> Vec<Vec<String>> {
        self.calls
            .borrow()
            .iter()
            .filter(|cmd| cmd.get(1).map(String::as_str) != Some("-l"))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
impl CommandRunner for &FakeRunner {
    fn run(&self, cmd: &[String]) -> Result<CmdResult, ChageError> {
        self.calls.borrow_mut().push(cmd.to_vec());
        if cmd.get(1).map(String::as_str) == Some("-l") {
            Ok(CmdResult {
                out: self.report.clone(),
                err: String::new(),
                status: self.list_status,
            })
        } else {
            Ok(CmdResult {
                out: String::new(),
                err: "chage: permission denied".to_owned(),
                status: self.write_status,
            })
        }
    }
}
