use crate::utils::error::ChageError;
use chrono::NaiveDate;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::Display;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

pub const ARG_DATE_FORMAT: &str = "%Y-%m-%d";

/// A date field as `chage` understands it. `Never` is the "unset" sentinel and
/// is distinct from every calendar date, including the epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChageDate {
    Never,
    On(NaiveDate),
}

impl ChageDate {
    /// Parses caller input: `never`, `-1` or `YYYY-MM-DD`.
    pub fn from_arg(field: &'static str, value: &str) -> Result<ChageDate, ChageError> {
        match value.trim() {
            "never" | "-1" => Ok(ChageDate::Never),
            v => NaiveDate::parse_from_str(v, ARG_DATE_FORMAT)
                .map(ChageDate::On)
                .map_err(|_| ChageError::InvalidArgument {
                    field,
                    value: value.to_owned(),
                }),
        }
    }

    /// Value handed to `chage` on write.
    pub fn to_flag_value(&self) -> String {
        match self {
            ChageDate::Never => "-1".to_owned(),
            ChageDate::On(date) => date.format(ARG_DATE_FORMAT).to_string(),
        }
    }
}

impl Display for ChageDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChageDate::Never => write!(f, "never"),
            ChageDate::On(date) => write!(f, "{}", date.format(ARG_DATE_FORMAT)),
        }
    }
}

impl Serialize for ChageDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawDate {
    Text(String),
    Days(i64),
}

impl<'de> Deserialize<'de> for ChageDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match RawDate::deserialize(deserializer)? {
            RawDate::Text(s) => ChageDate::from_arg("date", &s).map_err(de::Error::custom),
            RawDate::Days(-1) => Ok(ChageDate::Never),
            RawDate::Days(n) => Err(de::Error::custom(format!(
                "expected -1, \"never\" or YYYY-MM-DD, got {}",
                n
            ))),
        }
    }
}

/// Desired aging attributes. `None` means the field is left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DesiredState {
    pub last_day: Option<ChageDate>,
    pub expire_date: Option<ChageDate>,
    pub inactive: Option<i64>,
    pub min_days: Option<i64>,
    pub max_days: Option<i64>,
    pub warn_days: Option<i64>,
}

impl DesiredState {
    pub fn is_empty(&self) -> bool {
        *self == DesiredState::default()
    }

    /// Fills every field set in `other` into `self`, `other` winning.
    pub fn merge(&mut self, other: DesiredState) {
        self.last_day = other.last_day.or(self.last_day);
        self.expire_date = other.expire_date.or(self.expire_date);
        self.inactive = other.inactive.or(self.inactive);
        self.min_days = other.min_days.or(self.min_days);
        self.max_days = other.max_days.or(self.max_days);
        self.warn_days = other.warn_days.or(self.warn_days);
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(from = "RawTarget")]
pub struct TargetConfig {
    pub user: Option<String>,
    pub chage_path: Option<String>,
    pub desired: DesiredState,
}

/// On-disk shape of the target file. A misspelt key would otherwise drop its
/// constraint and report the account as in sync.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawTarget {
    user: Option<String>,
    chage_path: Option<String>,
    last_day: Option<ChageDate>,
    expire_date: Option<ChageDate>,
    inactive: Option<i64>,
    min_days: Option<i64>,
    max_days: Option<i64>,
    warn_days: Option<i64>,
}

impl From<RawTarget> for TargetConfig {
    fn from(raw: RawTarget) -> TargetConfig {
        TargetConfig {
            user: raw.user,
            chage_path: raw.chage_path,
            desired: DesiredState {
                last_day: raw.last_day,
                expire_date: raw.expire_date,
                inactive: raw.inactive,
                min_days: raw.min_days,
                max_days: raw.max_days,
                warn_days: raw.warn_days,
            },
        }
    }
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<TargetConfig, ChageError> {
    let file = File::open(path.as_ref()).map_err(|source| ChageError::Config {
        path: path.as_ref().display().to_string(),
        source,
    })?;
    let config: TargetConfig = serde_json::from_reader(BufReader::new(file))?;
    Ok(config)
}

pub fn parse_days(field: &'static str, value: &str) -> Result<i64, ChageError> {
    value
        .trim()
        .parse()
        .map_err(|_| ChageError::InvalidArgument {
            field,
            value: value.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_date_arguments() {
        assert_eq!(
            ChageDate::from_arg("last_day", "2023-01-01").unwrap(),
            ChageDate::On(ymd(2023, 1, 1))
        );
        assert_eq!(
            ChageDate::from_arg("last_day", "never").unwrap(),
            ChageDate::Never
        );
        assert_eq!(ChageDate::from_arg("last_day", "-1").unwrap(), ChageDate::Never);
        assert!(matches!(
            ChageDate::from_arg("expire_date", "01/01/2023"),
            Err(ChageError::InvalidArgument {
                field: "expire_date",
                ..
            })
        ));
    }

    #[test]
    fn never_only_matches_never() {
        assert_eq!(ChageDate::Never, ChageDate::Never);
        assert_ne!(ChageDate::Never, ChageDate::On(ymd(1970, 1, 1)));
        assert_ne!(ChageDate::On(ymd(2023, 1, 1)), ChageDate::Never);
    }

    #[test]
    fn flag_values() {
        assert_eq!(ChageDate::Never.to_flag_value(), "-1");
        assert_eq!(ChageDate::On(ymd(2024, 2, 29)).to_flag_value(), "2024-02-29");
        assert_eq!(ChageDate::Never.to_string(), "never");
    }

    #[test]
    fn deserializes_target_config() {
        let config: TargetConfig = serde_json::from_str(
            r#"{"user": "alice", "last_day": -1, "expire_date": "2030-06-01",
                "inactive": 7, "max_days": 90}"#,
        )
        .unwrap();
        assert_eq!(config.user.as_deref(), Some("alice"));
        assert_eq!(config.chage_path, None);
        assert_eq!(config.desired.last_day, Some(ChageDate::Never));
        assert_eq!(
            config.desired.expire_date,
            Some(ChageDate::On(ymd(2030, 6, 1)))
        );
        assert_eq!(config.desired.inactive, Some(7));
        assert_eq!(config.desired.max_days, Some(90));
        assert_eq!(config.desired.min_days, None);
    }

    #[test]
    fn rejects_day_counts_other_than_minus_one() {
        let res: Result<TargetConfig, _> = serde_json::from_str(r#"{"last_day": 19000}"#);
        assert!(res.is_err());
    }

    #[test]
    fn rejects_unknown_keys() {
        let res: Result<TargetConfig, _> =
            serde_json::from_str(r#"{"user": "alice", "max_day": 30}"#);
        let msg = res.unwrap_err().to_string();
        assert!(msg.contains("max_day"), "{}", msg);
    }

    #[test]
    fn unknown_key_in_file_fails_loading() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"user": "alice", "warndays": 7}}"#).unwrap();
        let err = load_config(file.path()).unwrap_err();
        assert!(matches!(err, ChageError::Json(_)));
    }

    #[test]
    fn merge_prefers_other() {
        let mut base = DesiredState {
            min_days: Some(1),
            max_days: Some(90),
            ..Default::default()
        };
        base.merge(DesiredState {
            max_days: Some(60),
            warn_days: Some(7),
            ..Default::default()
        });
        assert_eq!(base.min_days, Some(1));
        assert_eq!(base.max_days, Some(60));
        assert_eq!(base.warn_days, Some(7));
        assert!(!base.is_empty());
        assert!(DesiredState::default().is_empty());
    }

    #[test]
    fn loads_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"user": "bob", "expire_date": "never", "warn_days": 14}}"#).unwrap();
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.user.as_deref(), Some("bob"));
        assert_eq!(config.desired.expire_date, Some(ChageDate::Never));
        assert_eq!(config.desired.warn_days, Some(14));
    }

    #[test]
    fn missing_config_file() {
        let err = load_config("/nonexistent/chagesync.json").unwrap_err();
        assert!(matches!(err, ChageError::Config { .. }));
    }

    #[test]
    fn parses_day_counts() {
        assert_eq!(parse_days("inactive", "-1").unwrap(), -1);
        assert_eq!(parse_days("max_days", " 99999 ").unwrap(), 99999);
        assert!(parse_days("min_days", "five").is_err());
    }
}
