use std::time::Duration;

/// Which backoff curve the retry action applies between attempts (spec §4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Constant delay every attempt.
    Fixed,
    /// `delay = min(initial * multiplier^attempt, max)`.
    Exponential,
    /// Exponential, then perturbed by uniform noise in `[-25%, +25%]`.
    ExponentialJitter,
}

/// Computes the delay before a given retry attempt.
///
/// `attempt` is zero-based: the delay before the *first* retry (i.e. the
/// second overall attempt) is computed with `attempt = 0`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub strategy: BackoffStrategy,
    pub initial_delay: Duration,
    /// `Duration::ZERO` means unbounded.
    pub max_delay: Duration,
    pub multiplier: f64,
}

impl BackoffPolicy {
    /// Compute the delay before the given zero-based retry attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let raw = match self.strategy {
            BackoffStrategy::Fixed => self.initial_delay,
            BackoffStrategy::Exponential | BackoffStrategy::ExponentialJitter => {
                let scaled = self.initial_delay.as_secs_f64() * self.multiplier.powi(attempt as i32);
                let capped = if self.max_delay.is_zero() {
                    scaled
                } else {
                    scaled.min(self.max_delay.as_secs_f64())
                };
                Duration::from_secs_f64(capped.max(0.0))
            }
        };

        if self.strategy == BackoffStrategy::ExponentialJitter {
            jitter(raw)
        } else {
            raw
        }
    }
}

/// Apply uniform noise in `[-25%, +25%]` to a delay, using a CSPRNG-seeded
/// generator (spec §4.4). `fastrand`'s thread-local generator is reseeded
/// from system entropy on first use per thread.
fn jitter(delay: Duration) -> Duration {
    let factor = 1.0 + (fastrand::f64() * 0.5 - 0.25);
    Duration::from_secs_f64((delay.as_secs_f64() * factor).max(0.0))
}
