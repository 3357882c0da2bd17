use rand::Rng;
use std::time::Duration;

/// Delay before the next keeper poll: uniform in `[3/4 * period, 5/4 * period]`.
///
/// Centered on `period`, so the mean poll rate matches the configured one while
/// keepers started together drift apart.
pub(crate) fn next_poll_delay(rng: &mut impl Rng, period: Duration) -> Duration {
    let spread = period / 4;
    if spread.is_zero() {
        return period;
    }
    period - spread + rng.gen_range(Duration::ZERO..=spread * 2)
}
