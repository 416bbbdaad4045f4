use std::time::SystemTime;


/// Who performs an iteration. The pair (`vu`, `iteration`) is unique within a
/// run, the timestamp additionally separates runs from one another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub vu: u64,
    pub iteration: u64,
    pub timestamp_ms: u128,
}

impl Identity {
    pub fn new(vu: u64, iteration: u64, timestamp_ms: u128) -> Self {
        Self { vu, iteration, timestamp_ms }
    }

    /// Identity stamped with the current wall-clock time.
    pub fn now(vu: u64, iteration: u64) -> Self {
        let timestamp_ms = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        Self::new(vu, iteration, timestamp_ms)
    }

    /// `<vu>-<iteration>-<timestamp>`. The separators make sure that e.g.
    /// VU 1 iteration 12 and VU 11 iteration 2 never produce the same string.
    pub fn unique_id(&self) -> String {
        format!("{}-{}-{}", self.vu, self.iteration, self.timestamp_ms)
    }

    pub fn email(&self, domain: &str) -> String {
        format!("user{}@{}", self.unique_id(), domain)
    }
}
