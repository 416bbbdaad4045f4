use std::{ops::RangeInclusive, time::Duration};

use rand::Rng;


#[derive(Debug, Clone, confique::Config)]
#[config(validate = Self::validate)]
pub struct WorkloadConfig {
    /// Password used for every simulated user.
    #[config(default = "password123")]
    pub password: String,

    /// Domain of the generated email addresses `user<vu>-<iter>-<ms>@<domain>`.
    #[config(default = "test.com")]
    pub email_domain: String,

    /// Lowest seat ID that exists in the system under test. Seat IDs to book
    /// are drawn uniformly from `first_seat..=last_seat`. The seat pool has
    /// to be seeded accordingly before the run.
    #[config(default = 1)]
    pub first_seat: u32,

    /// Highest seat ID that exists in the system under test (inclusive).
    #[config(default = 100)]
    pub last_seat: u32,

    /// After each iteration, a virtual user sleeps for a random duration
    /// between 0 and this value (exclusive), so that request bursts of
    /// different users spread out. "0" disables pacing.
    #[config(default = "500ms", deserialize_with = crate::config::deserialize_duration)]
    pub max_pacing: Duration,
}

impl WorkloadConfig {
    fn validate(&self) -> Result<(), String> {
        if self.first_seat > self.last_seat {
            return Err(format!(
                "`first_seat` ({}) must not be larger than `last_seat` ({})",
                self.first_seat,
                self.last_seat,
            ));
        }
        if self.email_domain.is_empty() || self.email_domain.contains('@') {
            return Err("`email_domain` must be a non-empty domain without '@'".into());
        }

        Ok(())
    }

    pub fn seats(&self) -> RangeInclusive<u32> {
        self.first_seat..=self.last_seat
    }

    /// Draws the seat ID for a booking attempt.
    pub fn draw_seat<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.random_range(self.seats())
    }

    /// Draws the pacing delay, in `[0, max_pacing)`.
    pub fn draw_pacing<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let max = u64::try_from(self.max_pacing.as_nanos()).unwrap_or(u64::MAX);
        if max == 0 {
            return Duration::ZERO;
        }
        Duration::from_nanos(rng.random_range(0..max))
    }
}
