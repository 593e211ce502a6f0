//! Bounded exponential backoff for the `Error → Connecting` transition.
//!
//! Off by default: a failed connection stays in `Error` until the user asks
//! for a reconnect. When enabled, the delay for attempt `n` (0-based) is
//! `min(max, initial * multiplier^n)` spread by up to `±jitter`, and retries
//! stop after `max_attempts`.

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub enabled:      bool,
    pub initial_ms:   u64,
    pub max_ms:       u64,
    pub multiplier:   f64,
    /// Fraction of the delay, `0.0..=1.0`.
    pub jitter:       f64,
    pub max_attempts: u32,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        ReconnectPolicy {
            enabled:      false,
            initial_ms:   500,
            max_ms:       30_000,
            multiplier:   2.0,
            jitter:       0.2,
            max_attempts: 8,
        }
    }
}

impl ReconnectPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.initial_ms == 0 || self.max_ms < self.initial_ms {
            return Err(format!(
                "reconnect delays must satisfy 0 < initial_ms <= max_ms (got {} / {})",
                self.initial_ms, self.max_ms,
            ));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(format!("reconnect multiplier must be >= 1, got {}", self.multiplier));
        }
        if !(0.0..=1.0).contains(&self.jitter) {
            return Err(format!("reconnect jitter must be within 0..=1, got {}", self.jitter));
        }
        Ok(())
    }
}

/// Attempt counter over a [`ReconnectPolicy`].
#[derive(Clone, Debug)]
pub struct Backoff {
    policy:  ReconnectPolicy,
    attempt: u32,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Backoff { policy, attempt: 0 }
    }

    pub fn policy(&self)  -> &ReconnectPolicy { &self.policy }
    pub fn attempts(&self) -> u32             { self.attempt }

    /// Un-jittered delay for `attempt`, capped at `max_ms`.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let p = &self.policy;
        let exp = p.multiplier.powi(attempt.min(i32::MAX as u32) as i32);
        let ms = (p.initial_ms as f64 * exp).min(p.max_ms as f64);
        Duration::from_millis(ms as u64)
    }

    /// Delay before the next attempt, or `None` when disabled or exhausted.
    /// The result never exceeds `max_ms`.
    pub fn next_delay<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<Duration> {
        if !self.policy.enabled || self.attempt >= self.policy.max_attempts {
            return None;
        }
        let base = self.base_delay(self.attempt).as_millis() as f64;
        self.attempt += 1;

        let spread = if self.policy.jitter > 0.0 {
            rng.gen_range(-self.policy.jitter..=self.policy.jitter)
        } else {
            0.0
        };
        let ms = (base * (1.0 + spread)).clamp(0.0, self.policy.max_ms as f64);
        Some(Duration::from_millis(ms as u64))
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn enabled() -> ReconnectPolicy {
        ReconnectPolicy { enabled: true, ..ReconnectPolicy::default() }
    }

    #[test]
    fn disabled_by_default() {
        let mut b = Backoff::new(ReconnectPolicy::default());
        assert_eq!(b.next_delay(&mut StdRng::seed_from_u64(1)), None);
    }

    #[test]
    fn base_delay_doubles_then_caps() {
        let b = Backoff::new(enabled());
        assert_eq!(b.base_delay(0), Duration::from_millis(500));
        assert_eq!(b.base_delay(1), Duration::from_millis(1000));
        assert_eq!(b.base_delay(3), Duration::from_millis(4000));
        assert_eq!(b.base_delay(20), Duration::from_millis(30_000));
    }

    #[test]
    fn jittered_delays_stay_within_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        let policy = ReconnectPolicy { max_attempts: 50, ..enabled() };
        let mut b = Backoff::new(policy);
        for attempt in 0..50 {
            let d = b.next_delay(&mut rng).unwrap();
            let base = b.base_delay(attempt).as_millis() as f64;
            assert!(d <= Duration::from_millis(policy.max_ms));
            assert!(d.as_millis() as f64 >= (base * 0.8).floor() - 1.0);
        }
    }

    #[test]
    fn stops_after_max_attempts() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut b = Backoff::new(ReconnectPolicy { max_attempts: 3, ..enabled() });
        for _ in 0..3 {
            assert!(b.next_delay(&mut rng).is_some());
        }
        assert_eq!(b.next_delay(&mut rng), None);
        b.reset();
        assert!(b.next_delay(&mut rng).is_some());
    }

    #[test]
    fn zero_jitter_is_exact() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut b = Backoff::new(ReconnectPolicy { jitter: 0.0, ..enabled() });
        assert_eq!(b.next_delay(&mut rng), Some(Duration::from_millis(500)));
        assert_eq!(b.next_delay(&mut rng), Some(Duration::from_millis(1000)));
    }

    #[test]
    fn validation() {
        assert!(ReconnectPolicy::default().validate().is_ok());
        assert!(ReconnectPolicy { initial_ms: 0, ..enabled() }.validate().is_err());
        assert!(ReconnectPolicy { max_ms: 10, ..enabled() }.validate().is_err());
        assert!(ReconnectPolicy { multiplier: 0.5, ..enabled() }.validate().is_err());
        assert!(ReconnectPolicy { jitter: 1.5, ..enabled() }.validate().is_err());
    }
}
