use std::time::Duration;

use crate::config::ReconnectPolicy;

/// Reconnect delay schedule for one link.
#[derive(Debug)]
pub(crate) struct Backoff {
    policy: ReconnectPolicy,
    current: Duration,
}

impl Backoff {
    pub(crate) fn new(policy: ReconnectPolicy) -> Self {
        let current = match policy {
            ReconnectPolicy::Immediate => Duration::ZERO,
            ReconnectPolicy::Backoff { initial, .. } => initial,
        };
        Self { policy, current }
    }

    /// Delay before the next attempt; `None` means retry immediately.
    pub(crate) fn next_delay(&mut self) -> Option<Duration> {
        match self.policy {
            ReconnectPolicy::Immediate => None,
            ReconnectPolicy::Backoff { max, .. } => {
                let delay = self.current.min(max);
                self.current = self.current.checked_mul(2).map_or(max, |next| next.min(max));
                Some(delay)
            }
        }
    }

    /// Called after a successful connect.
    pub(crate) fn reset(&mut self) {
        if let ReconnectPolicy::Backoff { initial, .. } = self.policy {
            self.current = initial;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn immediate_never_waits() {
        let mut backoff = Backoff::new(ReconnectPolicy::Immediate);
        for _ in 0..5 {
            assert_eq!(backoff.next_delay(), None);
        }
    }

    #[test]
    fn doubles_up_to_max() {
        let mut backoff = Backoff::new(ReconnectPolicy::Backoff {
            initial: ms(100),
            max: ms(500),
        });
        let delays: Vec<_> = (0..5).filter_map(|_| backoff.next_delay()).collect();
        assert_eq!(delays, vec![ms(100), ms(200), ms(400), ms(500), ms(500)]);
    }

    #[test]
    fn doubling_saturates_at_max() {
        let initial = Duration::from_secs(u64::MAX / 2 + 1);
        let mut backoff = Backoff::new(ReconnectPolicy::Backoff {
            initial,
            max: Duration::MAX,
        });
        let delays: Vec<_> = (0..3).filter_map(|_| backoff.next_delay()).collect();
        assert_eq!(delays, vec![initial, Duration::MAX, Duration::MAX]);
    }

    #[test]
    fn reset_restores_initial_delay() {
        let mut backoff = Backoff::new(ReconnectPolicy::Backoff {
            initial: ms(50),
            max: ms(1000),
        });
        backoff.next_delay();
        backoff.next_delay();
        backoff.reset();
        assert_eq!(backoff.next_delay(), Some(ms(50)));
    }
}
