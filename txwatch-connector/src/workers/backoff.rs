use crate::config::Retry;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with equal jitter: each delay is drawn from
/// `[base / 2, base]`, where `base` grows by `multiplier` up to `max_backoff_ms`.
#[derive(Debug, Clone)]
pub(crate) struct Backoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    max_retries: Option<u32>,
    current: Duration,
    attempts: u32,
}

impl Backoff {
    pub fn new(config: &Retry) -> Self {
        let initial = Duration::from_millis(config.initial_backoff_ms.max(1));
        Self {
            initial,
            max: Duration::from_millis(config.max_backoff_ms).max(initial),
            multiplier: config.multiplier.max(1.0),
            max_retries: config.max_retries,
            current: initial,
            attempts: 0,
        }
    }

    /// Returns the delay before the next attempt, or `None` once the retry
    /// budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.max_retries.is_some_and(|max| self.attempts >= max) {
            return None;
        }
        self.attempts += 1;

        let base = self.current;
        self.current = Duration::try_from_secs_f64(base.as_secs_f64() * self.multiplier)
            .map_or(self.max, |next| next.min(self.max));

        let half = base / 2;
        let jitter = rand::thread_rng().gen_range(Duration::ZERO..=base - half);
        Some(half + jitter)
    }

    pub fn reset(&mut self) {
        self.current = self.initial;
        self.attempts = 0;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retry(max_retries: Option<u32>) -> Retry {
        Retry {
            initial_backoff_ms: 100,
            max_backoff_ms: 400,
            multiplier: 2.0,
            max_retries,
        }
    }

    #[test]
    fn delays_grow_and_saturate() {
        let mut backoff = Backoff::new(&retry(None));
        let bounds = [100, 200, 400, 400, 400];
        for upper in bounds {
            let delay = backoff.next_delay().unwrap();
            assert!(delay >= Duration::from_millis(upper / 2), "{delay:?} below {upper}/2");
            assert!(delay <= Duration::from_millis(upper), "{delay:?} above {upper}");
        }
        assert_eq!(backoff.attempts(), 5);
    }

    #[test]
    fn gives_up_after_max_retries() {
        let mut backoff = Backoff::new(&retry(Some(2)));
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_some());
        assert!(backoff.next_delay().is_none());
    }

    #[test]
    fn reset_restores_initial_delay() {
        let mut backoff = Backoff::new(&retry(Some(2)));
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.attempts(), 0);
        let delay = backoff.next_delay().unwrap();
        assert!(delay <= Duration::from_millis(100));
    }
}
