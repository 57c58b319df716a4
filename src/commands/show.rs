use crate::linux::chage::Reconciler;
use crate::utils::{error::ChageError, tools::SystemRunner};
use clap::ArgMatches;
use std::io::{stdout, Write};

pub fn main(cmd: &ArgMatches) -> Result<(), ChageError> {
    let user = cmd.get_one::<String>("user").ok_or(ChageError::MissingUser)?;
    let mut reconciler = Reconciler::new(SystemRunner);
    if let Some(path) = cmd.get_one::<String>("chage-path") {
        reconciler = reconciler.with_program(path);
    }
    let info = reconciler.observe(user)?;

    let mut out = stdout();
    writeln!(out, "{}", serde_json::to_string_pretty(&info)?)?;
    Ok(())
}
