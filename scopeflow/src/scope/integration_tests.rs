//! Integration tests for the full scope lifecycle.

#[cfg(test)]
mod tests {
    use crate::container::ObjectContainer;
    use crate::errors::ScopeError;
    use crate::race::DEADLINE_ELAPSED_REASON;
    use crate::scope::{FnChild, FnOperation, Scope, ScopeConfig, ScopeState};
    use crate::testing::{
        RecordingChild, RegisteringOperation, SlowChild, SlowOperation, TrackingResource,
    };
    use futures::FutureExt;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn quick_config() -> ScopeConfig {
        ScopeConfig::new().with_timeout_ms(1_000)
    }

    #[tokio::test]
    async fn test_completed_execution_cleans_exactly_once() {
        let first = TrackingResource::new("first");
        let second = TrackingResource::new("second");
        let probes = [first.release_probe(), second.release_probe()];

        let mut scope = Scope::new(quick_config());
        let mut op = RegisteringOperation::new(vec![first, second]);

        let report = scope.execute(&mut op).await.unwrap();

        assert!(report.outcome.is_completed());
        assert_eq!(report.sweep.attempted, 2);
        assert!(report.sweep.is_clean());
        assert!(scope.container().is_empty());
        for probe in &probes {
            assert_eq!(probe.count(), 1);
        }
    }

    #[tokio::test]
    async fn test_operation_fault_still_cleans() {
        let resource = TrackingResource::new("session");
        let probe = resource.release_probe();

        let mut scope = Scope::new(quick_config());
        let mut op = RegisteringOperation::new(vec![resource]).failing("backend rejected");

        let report = scope.execute(&mut op).await.unwrap();

        match report.outcome.fault() {
            Some(ScopeError::Operation { cause }) => {
                assert!(cause.to_string().contains("backend rejected"));
            }
            other => panic!("expected operation fault, got {other:?}"),
        }
        assert_eq!(probe.count(), 1);
        assert!(scope.container().is_empty());
        assert_eq!(scope.state(), ScopeState::Done);
    }

    #[tokio::test]
    async fn test_timeout_cleans_and_skips_children() {
        // timeout=100ms, operation takes 500ms
        let resource = TrackingResource::new("session");
        let probe = resource.release_probe();

        let child = RecordingChild::new("notify");
        let child_probe = child.run_probe();

        let mut scope = Scope::new(ScopeConfig::new().with_timeout_ms(100)).child(child);
        // Registered during setup so release is observable regardless of
        // how far the operation got before the deadline
        scope.container_mut().add_disposable(resource);

        let mut op = SlowOperation::new(Duration::from_millis(500));
        let report = scope.execute(&mut op).await.unwrap();

        assert!(report.outcome.is_timed_out());
        assert_eq!(child_probe.count(), 0);
        assert_eq!(probe.count(), 1);
        assert!(scope.container().is_empty());
        assert_eq!(
            scope.cancel_token().reason(),
            Some(DEADLINE_ELAPSED_REASON.to_string())
        );
        assert!(matches!(
            report.into_result(),
            Err(ScopeError::Timeout { timeout_ms: 100 })
        ));
    }

    #[tokio::test]
    async fn test_operation_finishing_before_deadline_never_times_out() {
        // timeout=1000ms, operation completes in 10ms
        let child = RecordingChild::new("notify");
        let child_probe = child.run_probe();

        let mut scope = Scope::new(quick_config()).child(child);
        let mut op = SlowOperation::with_delay_ms(10);

        let report = scope.execute(&mut op).await.unwrap();

        assert!(report.outcome.is_completed());
        assert_eq!(child_probe.count(), 1);
        assert!(scope.container().is_empty());
        assert!(!scope.cancel_token().is_cancelled());
    }

    #[tokio::test]
    async fn test_validation_failure_prevents_execution() {
        let ran = Arc::new(AtomicUsize::new(0));
        let ran_clone = ran.clone();

        let mut scope = Scope::new(
            quick_config()
                .require("endpoint")
                .require("tenant")
                .with_field("tenant", "acme"),
        );

        let mut op = FnOperation::new(move |container: &mut ObjectContainer, _token| {
            let ran = ran_clone.clone();
            async move {
                ran.fetch_add(1, Ordering::SeqCst);
                container.add("should never appear");
                Ok(())
            }
            .boxed()
        });

        let err = scope.execute(&mut op).await.unwrap_err();

        match err {
            ScopeError::Validation(e) => assert_eq!(e.missing, vec!["endpoint".to_string()]),
            other => panic!("expected validation error, got {other}"),
        }
        assert_eq!(ran.load(Ordering::SeqCst), 0);
        assert!(scope.container().is_empty());
        assert_eq!(scope.state(), ScopeState::Done);
    }

    #[tokio::test]
    async fn test_child_fault_cancels_siblings_then_cleans() {
        let resource = TrackingResource::new("session");
        let probe = resource.release_probe();

        let failing = RecordingChild::failing("publish", "broker unreachable");
        let slow = SlowChild::new("drain", Duration::from_secs(30));
        let cancelled = slow.cancellation_probe();
        let completed = slow.completion_probe();

        let mut scope = Scope::new(quick_config()).child(failing).child(slow);
        let mut op = RegisteringOperation::new(vec![resource]);

        let report = scope.execute(&mut op).await.unwrap();

        match report.outcome.fault() {
            Some(ScopeError::ChildFault { child, message }) => {
                assert_eq!(child, "publish");
                assert!(message.contains("broker unreachable"));
            }
            other => panic!("expected child fault, got {other:?}"),
        }
        // The sibling observed the cancellation instead of running out
        // its thirty-second delay, and cleanup still ran afterwards.
        assert_eq!(cancelled.count(), 1);
        assert_eq!(completed.count(), 0);
        assert_eq!(probe.count(), 1);
        assert!(scope.container().is_empty());
    }

    #[tokio::test]
    async fn test_children_read_resources_registered_by_the_operation() {
        let mut scope = Scope::new(quick_config()).child(FnChild::new(
            "reader",
            |container: &ObjectContainer, _token| {
                async move {
                    let resource = container
                        .get::<TrackingResource>()
                        .ok_or_else(|| anyhow::anyhow!("resource not visible to child"))?;
                    assert_eq!(resource.label(), "shared");
                    Ok(())
                }
                .boxed()
            },
        ));

        let mut op = RegisteringOperation::new(vec![TrackingResource::new("shared")]);
        let report = scope.execute(&mut op).await.unwrap();

        assert!(report.outcome.is_completed());
        assert!(scope.container().is_empty());
    }

    #[tokio::test]
    async fn test_disposal_isolation_across_three_resources() {
        let first = TrackingResource::new("first");
        let second = TrackingResource::failing("second", "stuck handle");
        let third = TrackingResource::new("third");
        let probes = [
            first.release_probe(),
            second.release_probe(),
            third.release_probe(),
        ];

        let mut scope = Scope::new(quick_config());
        let mut op = RegisteringOperation::new(vec![first, second, third]);

        let report = scope.execute(&mut op).await.unwrap();

        assert!(report.outcome.is_completed());
        for probe in &probes {
            assert_eq!(probe.count(), 1);
        }
        assert_eq!(report.disposal_failures().len(), 1);
        assert!(report.disposal_failures()[0].message.contains("stuck handle"));
        assert_eq!(report.sweep.released(), 2);
        assert!(scope.container().is_empty());
    }

    #[tokio::test]
    async fn test_external_cancellation_takes_the_deadline_path() {
        let mut scope = Scope::new(ScopeConfig::new().with_timeout_ms(10_000));
        let token = scope.cancel_token();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel("caller shut down");
        });

        let mut op = SlowOperation::new(Duration::from_secs(30));
        let report = scope.execute(&mut op).await.unwrap();

        assert!(report.outcome.is_timed_out());
        assert_eq!(
            scope.cancel_token().reason(),
            Some("caller shut down".to_string())
        );
    }

    #[tokio::test]
    async fn test_report_carries_timings_and_empty_output() {
        let mut scope = Scope::new(quick_config());
        let mut op = SlowOperation::with_delay_ms(10);

        let report = scope.execute(&mut op).await.unwrap();

        assert!(report.output.is_none());
        assert!(report.duration_ms >= 10.0);
        assert!(report.finished_at >= report.started_at);
    }

    #[tokio::test]
    async fn test_reset_allows_a_second_full_execution() {
        let mut scope = Scope::new(quick_config());

        let resource = TrackingResource::new("first-run");
        let probe = resource.release_probe();
        let mut op = RegisteringOperation::new(vec![resource]);
        scope.execute(&mut op).await.unwrap();
        assert_eq!(probe.count(), 1);

        scope.reset();

        let resource = TrackingResource::new("second-run");
        let probe = resource.release_probe();
        let mut op = RegisteringOperation::new(vec![resource]);
        let report = scope.execute(&mut op).await.unwrap();

        assert!(report.outcome.is_completed());
        assert_eq!(probe.count(), 1);
    }
}
