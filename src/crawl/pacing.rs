use rand::Rng;
use std::time::Duration;

use crate::config::PacingConfig;

/// Random pause of `wait ± delta`, never below zero.
pub fn random_wait(wait: Duration, delta: Duration) -> Duration {
    let wait_ms = wait.as_millis() as i128;
    let delta_ms = delta.as_millis() as i128;
    let low = (wait_ms - delta_ms).unsigned_abs() as u64;
    let high = (wait_ms + delta_ms) as u64;

    let mut rng = rand::thread_rng();
    Duration::from_millis(rng.gen_range(low..=high))
}

impl PacingConfig {
    /// Draw the next inter-page pause
    pub fn next_wait(&self) -> Duration {
        random_wait(
            Duration::from_millis(self.wait_ms),
            Duration::from_millis(self.delta_ms),
        )
    }
}
