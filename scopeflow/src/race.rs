//! Deadline race: an operation against a timer under shared cancellation.

use crate::cancellation::CancellationToken;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// The cancellation reason recorded when the deadline timer wins the race.
pub const DEADLINE_ELAPSED_REASON: &str = "deadline elapsed";

/// The outcome of racing an operation against its deadline.
#[derive(Debug)]
pub enum RaceOutcome {
    /// The operation finished first, successfully or not.
    Finished(anyhow::Result<()>),
    /// The deadline elapsed, or the shared token was cancelled
    /// externally, before the operation finished.
    DeadlineElapsed,
}

impl RaceOutcome {
    /// Returns true if the operation finished before the deadline.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self, Self::Finished(_))
    }

    /// Returns true if the deadline won the race.
    #[must_use]
    pub fn is_deadline_elapsed(&self) -> bool {
        matches!(self, Self::DeadlineElapsed)
    }
}

/// Races `op` against a timer of length `deadline` under the shared
/// cancellation token.
///
/// If `op` finishes first its result is propagated and the timer is
/// dropped. If the timer fires first the token is cancelled with
/// [`DEADLINE_ELAPSED_REASON`] and `DeadlineElapsed` is returned. An
/// external cancellation of the token is a third input to the race and
/// behaves like the timer firing; the token's recorded reason tells the
/// two apart.
///
/// The race never forcibly terminates the operation's resources. Losing
/// the race drops the operation future: its destructors run, and any
/// inner work it spawned is expected to observe the token and unwind on
/// its own.
///
/// A zero deadline means an immediate timeout, except that the select is
/// biased toward the operation: an operation that resolves in the same
/// synchronous poll still wins.
pub async fn run_with_deadline<F>(
    op: F,
    deadline: Duration,
    token: &CancellationToken,
) -> RaceOutcome
where
    F: Future<Output = anyhow::Result<()>>,
{
    tokio::pin!(op);
    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    tokio::select! {
        biased;
        result = &mut op => RaceOutcome::Finished(result),
        () = token.cancelled() => {
            debug!(reason = ?token.reason(), "race lost to cancellation");
            RaceOutcome::DeadlineElapsed
        }
        () = &mut timer => {
            token.cancel(DEADLINE_ELAPSED_REASON);
            RaceOutcome::DeadlineElapsed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio_test::assert_ok;

    #[tokio::test]
    async fn test_operation_finishing_first_wins() {
        let token = CancellationToken::new();

        let outcome = run_with_deadline(
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            },
            Duration::from_millis(1000),
            &token,
        )
        .await;

        match outcome {
            RaceOutcome::Finished(result) => assert_ok!(result),
            RaceOutcome::DeadlineElapsed => panic!("deadline should not have won"),
        }
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_operation_error_propagates() {
        let token = CancellationToken::new();

        let outcome = run_with_deadline(
            async { anyhow::bail!("backend unavailable") },
            Duration::from_millis(1000),
            &token,
        )
        .await;

        match outcome {
            RaceOutcome::Finished(Err(e)) => {
                assert!(e.to_string().contains("backend unavailable"));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_deadline_wins_and_cancels_token() {
        let token = CancellationToken::new();

        let outcome = run_with_deadline(
            async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(())
            },
            Duration::from_millis(50),
            &token,
        )
        .await;

        assert!(outcome.is_deadline_elapsed());
        assert!(token.is_cancelled());
        assert_eq!(token.reason(), Some(DEADLINE_ELAPSED_REASON.to_string()));
    }

    #[tokio::test]
    async fn test_zero_deadline_times_out_pending_operation() {
        let token = CancellationToken::new();

        let outcome = run_with_deadline(
            async {
                tokio::time::sleep(Duration::from_millis(100)).await;
                Ok(())
            },
            Duration::ZERO,
            &token,
        )
        .await;

        assert!(outcome.is_deadline_elapsed());
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_zero_deadline_still_lets_synchronous_completion_win() {
        let token = CancellationToken::new();

        // The operation resolves in its first poll, so the biased select
        // sees it before the already-elapsed timer.
        let outcome = run_with_deadline(async { Ok(()) }, Duration::ZERO, &token).await;

        assert!(outcome.is_finished());
        assert!(!token.is_cancelled());
    }

    #[tokio::test]
    async fn test_external_cancellation_behaves_like_the_timer() {
        let token = CancellationToken::new();
        token.cancel("caller shut down");

        let outcome = run_with_deadline(
            async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                Ok(())
            },
            Duration::from_millis(1000),
            &token,
        )
        .await;

        assert!(outcome.is_deadline_elapsed());
        // The external reason is preserved; the race does not overwrite it
        assert_eq!(token.reason(), Some("caller shut down".to_string()));
    }
}
