use crate::utils::config::ChageDate;
use crate::utils::error::ChageError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Display;

pub const REPORT_DATE_FORMAT: &str = "%b %d, %Y";

pub const LAST_CHANGE: &str = "Last password change";
pub const PASSWORD_EXPIRES: &str = "Password expires";
pub const PASSWORD_INACTIVE: &str = "Password inactive";
pub const ACCOUNT_EXPIRES: &str = "Account expires";
pub const MIN_DAYS: &str = "Minimum number of days between password change";
pub const MAX_DAYS: &str = "Maximum number of days between password change";
pub const WARN_DAYS: &str = "Number of days of warning before password expires";

/// Password aging state of one account, as reported by `chage -l`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgingInfo {
    pub last_change: ChageDate,
    pub password_expires: ChageDate,
    pub password_inactive: ChageDate,
    pub account_expires: ChageDate,
    pub min_days: i64,
    pub max_days: i64,
    pub warn_days: i64,
}

impl AgingInfo {
    pub fn parse(report: &str) -> Result<AgingInfo, ChageError> {
        let mut fields: HashMap<&str, &str> = HashMap::new();
        for line in report.lines() {
            if let Some((key, val)) = line.split_once(':') {
                fields.insert(key.trim(), val.trim());
            }
        }
        Ok(AgingInfo {
            last_change: date_field(&fields, LAST_CHANGE)?,
            password_expires: date_field(&fields, PASSWORD_EXPIRES)?,
            password_inactive: date_field(&fields, PASSWORD_INACTIVE)?,
            account_expires: date_field(&fields, ACCOUNT_EXPIRES)?,
            min_days: days_field(&fields, MIN_DAYS)?,
            max_days: days_field(&fields, MAX_DAYS)?,
            warn_days: days_field(&fields, WARN_DAYS)?,
        })
    }
}

fn field<'a>(fields: &HashMap<&str, &'a str>, label: &str) -> Result<&'a str, ChageError> {
    fields
        .get(label)
        .copied()
        .ok_or_else(|| ChageError::Parse(format!("missing \"{}\"", label)))
}

/// Reads `never` or a `%b %d, %Y` date.
///
/// Anything else fails, including the "password must be changed" that `chage -l`
/// prints after `--lastday 0` (`--last-day 1970-01-01`). Once an account is in
/// that state every later run for it fails until the last change date is reset
/// by other means, so that input is not idempotent.
fn date_field(fields: &HashMap<&str, &str>, label: &str) -> Result<ChageDate, ChageError> {
    let val = field(fields, label)?;
    if val == "never" {
        return Ok(ChageDate::Never);
    }
    NaiveDate::parse_from_str(val, REPORT_DATE_FORMAT)
        .map(ChageDate::On)
        .map_err(|_| ChageError::parse(label, val))
}

fn days_field(fields: &HashMap<&str, &str>, label: &str) -> Result<i64, ChageError> {
    let val = field(fields, label)?;
    val.parse().map_err(|_| ChageError::parse(label, val))
}

/// `chage -l` output for an account changed on 2023-01-01 with a 5/90/7 day
/// policy and no account expiry.
#[cfg(test)]
pub(crate) const REPORT: &str = "Last password change\t\t\t\t\t: Jan 01, 2023
Password expires\t\t\t\t\t: Apr 01, 2023
Password inactive\t\t\t\t\t: never
Account expires\t\t\t\t\t\t: never
Minimum number of days between password change\t\t: 5
Maximum number of days between password change\t\t: 90
Number of days of warning before password expires\t: 7
";

impl Display for AgingInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "last change {} | password expires {} | inactive {} | account expires {} | min {} | max {} | warn {}",
            self.last_change,
            self.password_expires,
            self.password_inactive,
            self.account_expires,
            self.min_days,
            self.max_days,
            self.warn_days
        )
    }
}
