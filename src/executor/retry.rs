//! Backoff schedule and deadline arithmetic for the retry loop.

use std::time::Duration;
use tokio::time::Instant;

/// Delay before the first retry; doubles for every retry after it.
pub const BASE_DELAY_MS: u64 = 100;

/// Delay to wait before retry number `retry` (1-based), capped at `cap`.
pub fn backoff_delay(retry: u32, cap: Duration) -> Duration {
    let shift = retry.saturating_sub(1).min(32);
    let delay = Duration::from_millis(BASE_DELAY_MS.saturating_mul(1u64 << shift));
    delay.min(cap)
}

/// Longest budget a deadline can represent; larger budgets are clamped.
const MAX_BUDGET: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Deadline `budget` from now, clamped so huge budgets cannot overflow.
pub fn deadline_after(budget: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(budget).unwrap_or_else(|| now + MAX_BUDGET.min(budget))
}

/// Time left before `deadline`, or `None` once it has passed.
pub fn remaining_until(deadline: Instant) -> Option<Duration> {
    let now = Instant::now();
    if now >= deadline {
        None
    } else {
        Some(deadline.saturating_duration_since(now))
    }
}
