use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Sleep the failure backoff and try again.
    Retry,
    /// Surface a recovery status, sleep the longer backoff, start over.
    Recover,
}

/// Advance the consecutive-failure counter. Returns the counter to carry
/// into the next iteration; reaching `max` resets it to zero.
pub fn register_failure(consecutive: u32, max: u32) -> (u32, FailureAction) {
    let attempt = consecutive + 1;
    if attempt >= max {
        (0, FailureAction::Recover)
    } else {
        (attempt, FailureAction::Retry)
    }
}

pub fn sleep_for(action: FailureAction, retry: Duration, recover: Duration) -> Duration {
    match action {
        FailureAction::Retry => retry,
        FailureAction::Recover => recover,
    }
}

#[cfg(test)]
mod backoff_test {
    use super::*;

    #[test]
    fn test_recovers_after_five_consecutive_failures() {
        let mut consecutive = 0;
        let mut actions = vec![];
        for _ in 0..5 {
            let (next, action) = register_failure(consecutive, 5);
            consecutive = next;
            actions.push(action);
        }

        assert_eq!(
            actions,
            vec![
                FailureAction::Retry,
                FailureAction::Retry,
                FailureAction::Retry,
                FailureAction::Retry,
                FailureAction::Recover,
            ]
        );
        // Counter resets so the next burst starts from scratch.
        assert_eq!(consecutive, 0);
    }

    #[test]
    fn test_sleep_durations() {
        let retry = Duration::from_secs(1);
        let recover = Duration::from_secs(2);
        assert_eq!(sleep_for(FailureAction::Retry, retry, recover), retry);
        assert_eq!(sleep_for(FailureAction::Recover, retry, recover), recover);
    }
}
