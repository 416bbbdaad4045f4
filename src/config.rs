use std::{env, path::{Path, PathBuf}, time::Duration};

use confique::{serde::{self, Deserialize as _}, Config as _};

use crate::{
    log::LogConfig,
    prelude::*,
    ramp::RampConfig,
    report::ReportConfig,
    target::TargetConfig,
    workload::WorkloadConfig,
};


/// Env variable that can specify the config file location.
pub const PATH_ENV: &str = "SEATRUSH_CONFIG_PATH";

/// Locations that are checked (in order) if no config path is given.
pub const DEFAULT_PATHS: &[&str] = &["seatrush.toml", "/etc/seatrush/config.toml"];


/// Loads the config. If `path` is `None`, `SEATRUSH_CONFIG_PATH` and then
/// `DEFAULT_PATHS` are tried. If no file is found at all, only defaults and
/// env variables are used, which is a perfectly valid configuration.
///
/// Returns the path of the file that was loaded, if any.
pub fn load(path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    let path = match path {
        Some(path) => Some(path.to_owned()),
        None => match env::var_os(PATH_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => DEFAULT_PATHS.iter().map(PathBuf::from).find(|p| p.exists()),
        },
    };

    let mut builder = Config::builder().env();
    if let Some(path) = &path {
        if !path.exists() {
            bail!("config file '{}' does not exist", path.display());
        }
        builder = builder.file(path);
    }

    let config = builder.load().with_context(|| match &path {
        Some(path) => format!("failed to load config file '{}'", path.display()),
        None => "failed to load config from defaults and environment".into(),
    })?;

    Ok((config, path))
}

pub fn template() -> String {
    let mut options = confique::toml::FormatOptions::default();
    options.general.nested_field_gap = 2;
    confique::toml::template::<Config>(options)
}

#[derive(Debug, confique::Config)]
pub struct Config {
    #[config(nested)]
    pub target: TargetConfig,

    #[config(nested)]
    pub workload: WorkloadConfig,

    #[config(nested)]
    pub ramp: RampConfig,

    #[config(nested)]
    pub report: ReportConfig,

    #[config(nested)]
    pub log: LogConfig,
}


pub fn validate_not_empty<T>(list: &[T]) -> Result<(), &'static str> {
    if list.is_empty() {
        return Err("must not be empty");
    }
    Ok(())
}

/// Custom format for durations. We allow a couple useful units and required
/// a unit to increase readability of config files.
pub fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where D: serde::Deserializer<'de>,
{
    use serde::de::Error;

    let s = String::deserialize(deserializer)?;
    parse_duration(&s).map_err(D::Error::custom)
}

fn parse_duration(s: &str) -> Result<Duration, String> {
    // Allow unit-less zeroes
    if s == "0" {
        return Ok(Duration::ZERO);
    }

    let start_unit = s.find(|c: char| !c.is_ascii_digit())
        .ok_or_else(|| "no time unit for duration".to_owned())?;
    let (num, unit) = s.split_at(start_unit);
    let num: u32 = num.parse()
        .map_err(|e| format!("invalid integer for duration: {}", e))?;
    let num: u64 = num.into();

    match unit {
        "ms" => Ok(Duration::from_millis(num)),
        "s" => Ok(Duration::from_secs(num)),
        "min" => Ok(Duration::from_secs(num * 60)),
        "h" => Ok(Duration::from_secs(num * 60 * 60)),
        "d" => Ok(Duration::from_secs(num * 60 * 60 * 24)),
        _ => Err("invalid unit of time for duration".into()),
    }
}
