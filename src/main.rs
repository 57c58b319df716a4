use clap::{App, AppSettings, Arg, SubCommand};

use chrono::prelude::*;
use log::error;
use simplelog::*;

use std::fs::File;

pub mod commands;
pub mod linux;
pub mod utils;

use utils::error::ChageError;

fn user_arg(required: bool) -> Arg<'static> {
    Arg::with_name("user")
        .short('u')
        .long("user")
        .takes_value(true)
        .required(required)
        .help("Account to manage")
}

fn chage_path_arg() -> Arg<'static> {
    Arg::with_name("chage-path")
        .long("chage-path")
        .takes_value(true)
        .help("Path to the chage binary (default: chage from PATH)")
}

fn value_arg(name: &'static str, help: &'static str) -> Arg<'static> {
    Arg::with_name(name)
        .long(name)
        .takes_value(true)
        .allow_hyphen_values(true)
        .help(help)
}

pub fn cli() -> App<'static> {
    App::new("chagesync")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Keeps password aging attributes of local accounts in a desired state")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .help("Log debug output"),
        )
        .arg(
            Arg::with_name("log-file")
                .long("log-file")
                .takes_value(true)
                .global(true)
                .help("Also log to this file, {timestamp} is replaced with the start time"),
        )
        .subcommand(
            SubCommand::with_name("set")
                .about("Apply password aging attributes if they differ")
                .arg(user_arg(false))
                .arg(
                    Arg::with_name("config")
                        .short('c')
                        .long("config")
                        .takes_value(true)
                        .help("JSON file with the user and desired attributes"),
                )
                .arg(value_arg("last-day", "Last password change, YYYY-MM-DD or never"))
                .arg(value_arg("expire-date", "Account expiry, YYYY-MM-DD or never"))
                .arg(value_arg("inactive", "Days of inactivity allowed after expiry"))
                .arg(value_arg("min-days", "Minimum days between password changes"))
                .arg(value_arg("max-days", "Maximum days between password changes"))
                .arg(value_arg("warn-days", "Days of warning before the password expires"))
                .arg(
                    Arg::with_name("check")
                        .long("check")
                        .help("Report what would change without changing it"),
                )
                .arg(chage_path_arg()),
        )
        .subcommand(
            SubCommand::with_name("show")
                .about("Print the current password aging attributes as JSON")
                .arg(user_arg(true))
                .arg(chage_path_arg()),
        )
}

fn init_logging(verbose: bool, log_file: Option<&String>) -> Result<(), ChageError> {
    let level = match verbose {
        true => LevelFilter::Debug,
        false => LevelFilter::Info,
    };
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        let dt = Local::now();
        let path = path.replace(
            "{timestamp}",
            &dt.format("%Y_%m_%d_%H_%M_%S").to_string(),
        );
        loggers.push(WriteLogger::new(
            LevelFilter::Info,
            Config::default(),
            File::create(&path)?,
        ));
    }
    CombinedLogger::init(loggers)?;
    Ok(())
}

fn main() {
    let app = cli().get_matches();

    if let Err(e) = init_logging(app.is_present("verbose"), app.get_one::<String>("log-file")) {
        eprintln!("chagesync: {}", e);
        std::process::exit(1);
    }

    let res = match app.subcommand() {
        Some(("set", cmd)) => commands::set::main(cmd),
        Some(("show", cmd)) => commands::show::main(cmd),
        Some((x, _)) => unreachable!("unknown subcommand {}", x),
        None => unreachable!("a subcommand is required"),
    };
    if let Err(e) = res {
        error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn show_requires_user() {
        assert!(cli().try_get_matches_from(["chagesync", "show"]).is_err());
        assert!(cli()
            .try_get_matches_from(["chagesync", "show", "-u", "alice"])
            .is_ok());
    }
}
