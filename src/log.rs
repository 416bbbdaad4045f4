use std::{
    collections::HashMap,
    fs::OpenOptions,
    path::PathBuf,
};

use serde::Deserialize;
use tracing::Level;
use tracing_subscriber::{
    filter::{FilterFn, LevelFilter},
    prelude::*,
};

use crate::prelude::*;


#[derive(Debug, confique::Config)]
pub(crate) struct LogConfig {
    /// Specifies what log messages to emit, based on the module path and log level.
    ///
    /// This is a map where the key specifies a module path prefix, and the
    /// value specifies a minimum log level. For each log message, the map
    /// entry with the longest prefix matching the log's module path is chosen.
    /// If no such entry exists, the log is not emitted. Otherwise, that
    /// entry's level is used to check whether the log message should be
    /// emitted. Valid log levels: off, error, warn, info, debug, trace.
    ///
    /// Example: the following only allows ≥"info" logs from seatrush
    /// generally, but every single request is logged by the `workload`
    /// module. ≥"info" messages of the load test engine `goose` and ≥"debug"
    /// messages of the HTTP library `reqwest` are shown.
    ///
    ///    [log]
    ///    filters.seatrush = "info"
    ///    filters."seatrush::workload" = "trace"
    ///    filters.goose = "info"
    ///    filters.reqwest = "debug"
    #[config(default = { "seatrush": "info" })]
    pub(crate) filters: Filters,

    /// If this is set, log messages are also written to this file.
    pub(crate) file: Option<PathBuf>,

    /// If this is set to `false`, log messages are not written to stdout.
    #[config(default = true)]
    pub(crate) stdout: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(try_from = "HashMap<String, String>")]
pub(crate) struct Filters(HashMap<String, LevelFilter>);

impl TryFrom<HashMap<String, String>> for Filters {
    type Error = String;
    fn try_from(value: HashMap<String, String>) -> Result<Self, Self::Error> {
        value.into_iter()
            .map(|(target_prefix, level)| {
                let level = parse_level_filter(&level)?;
                Ok((target_prefix, level))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }
}

impl Filters {
    /// Whether a message with `level` from `target` passes. See the config doc
    /// comment for the logic behind this.
    fn allows(&self, target: &str, level: &Level) -> bool {
        // With many filters, a prefix tree would be worth it. In practice
        // there are only very few entries.
        self.0.iter()
            .filter(|(target_prefix, _)| target.starts_with(target_prefix.as_str()))
            .max_by_key(|(target_prefix, _)| target_prefix.len())
            .map(|(_, level_filter)| level <= level_filter)
            .unwrap_or(false)
    }

    fn max_level(&self) -> LevelFilter {
        self.0.values().max().copied().unwrap_or(LevelFilter::OFF)
    }
}

fn parse_level_filter(s: &str) -> Result<LevelFilter, String> {
    match s {
        "off" => Ok(LevelFilter::OFF),
        "trace" => Ok(LevelFilter::TRACE),
        "debug" => Ok(LevelFilter::DEBUG),
        "info" => Ok(LevelFilter::INFO),
        "warn" => Ok(LevelFilter::WARN),
        "error" => Ok(LevelFilter::ERROR),
        other => Err(format!("invalid log level '{other}'")),
    }
}

pub(crate) fn init(config: &LogConfig) -> Result<()> {
    let filter = {
        let filters = config.filters.clone();
        let max_level = filters.max_level();
        FilterFn::new(move |metadata| filters.allows(metadata.target(), metadata.level()))
            .with_max_level_hint(max_level)
    };

    macro_rules! subscriber {
        ($writer:expr) => {
            tracing_subscriber::fmt::layer().with_writer($writer)
        };
    }

    let stdout_output = if config.stdout {
        Some(subscriber!(std::io::stdout))
    } else {
        None
    };

    let file_output = if let Some(path) = &config.file {
        use std::io::Write;

        let mut file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path)
            .with_context(|| format!("failed to open/create log file '{}'", path.display()))?;

        // Separate runs by an empty line, makes reading the file easier.
        file.write_all(b"\n\n").context("could not write to log file")?;

        Some(subscriber!(file).with_ansi(false))
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_output)
        .with(stdout_output)
        .try_init()
        .context("failed to install global log subscriber")?;

    Ok(())
}
