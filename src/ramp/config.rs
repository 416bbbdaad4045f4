use std::time::Duration;

use serde::{Deserialize, Deserializer};


#[derive(Debug, Clone, confique::Config)]
#[config(validate = Self::validate)]
pub struct RampConfig {
    /// The ramp schedule. Within each stage, the number of virtual users
    /// (VUs) changes linearly from the previous stage's `target` (0 for the
    /// first stage) to this stage's `target`. The run ends after the last
    /// stage. Durations have to be whole seconds.
    ///
    /// Example: ramp up to 50 VUs within one minute, keep them running for
    /// five minutes, ramp down within 30 seconds.
    ///
    ///    stages = [
    ///        { duration = "1min", target = 50 },
    ///        { duration = "5min", target = 50 },
    ///        { duration = "30s", target = 0 },
    ///    ]
    #[config(default = [
        { "duration": "10s", "target": "300" },
        { "duration": "30s", "target": "1500" },
        { "duration": "10s", "target": "0" },
    ])]
    pub stages: Vec<Stage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Stage {
    #[serde(deserialize_with = "crate::config::deserialize_duration")]
    pub duration: Duration,

    /// Number of VUs at the end of this stage. Accepts a number or a string
    /// containing one.
    #[serde(deserialize_with = "deserialize_target")]
    pub target: u32,
}

fn deserialize_target<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    use serde::de::Error;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Target {
        Number(u32),
        Text(String),
    }

    match Target::deserialize(deserializer)? {
        Target::Number(n) => Ok(n),
        Target::Text(s) => s.trim().parse()
            .map_err(|e| D::Error::custom(format!("invalid stage target '{s}': {e}"))),
    }
}

impl RampConfig {
    fn validate(&self) -> Result<(), String> {
        crate::config::validate_not_empty(&self.stages).map_err(|e| format!("`stages` {e}"))?;
        for (i, stage) in self.stages.iter().enumerate() {
            if stage.duration.is_zero() {
                return Err(format!("stage {} has a duration of zero", i + 1));
            }
            if stage.duration.subsec_nanos() != 0 {
                return Err(format!(
                    "duration of stage {} is not a whole number of seconds",
                    i + 1,
                ));
            }
        }

        Ok(())
    }

    /// The stages in goose's test plan notation, e.g. `300,10s;1500,30s;0,10s`.
    pub fn test_plan(&self) -> String {
        self.stages.iter()
            .map(|s| format!("{},{}s", s.target, s.duration.as_secs()))
            .collect::<Vec<_>>()
            .join(";")
    }

    /// Sum of all stage durations.
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|s| s.duration).sum()
    }

    /// Highest number of VUs at any point of the run.
    pub fn peak_users(&self) -> u32 {
        self.stages.iter().map(|s| s.target).fold(0, u32::max)
    }
}
