use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Jittered exponential backoff used between optimistic-concurrency rounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub max_ms: u64,
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// Delay to wait before the given 1-based retry round.
    pub fn delay(&self, attempt: u32) -> Duration {
        calculate_backoff(attempt, self.base_ms, self.max_ms)
    }
}

/// Calculate exponential backoff delay with jitter.
///
/// Formula: `min(base_ms * 2^(attempt-1) + jitter, max_ms)` (0-25% jitter)
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::ZERO;
    }

    let exp_factor = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exp_factor);

    let jitter = if delay_ms > 0 {
        rand::rng().random_range(0..=delay_ms / 4)
    } else {
        0
    };

    Duration::from_millis(delay_ms.saturating_add(jitter).min(max_ms))
}
