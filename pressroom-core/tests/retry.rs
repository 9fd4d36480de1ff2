use std::time::Duration;

use pressroom_core::assistant::AssistantError;
use pressroom_core::retry::{RetryError, RetryPolicy, Retryer};
use tokio_util::sync::CancellationToken;

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy {
        max_retries,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

#[tokio::test]
async fn succeeds_after_two_failures() {
    let mut calls = 0u32;
    let result = Retryer::new(fast_policy(3), |_: &&str| true, || {
        calls += 1;
        let n = calls;
        async move {
            if n <= 2 {
                Err("boom")
            } else {
                Ok(n)
            }
        }
    })
    .run(&CancellationToken::new())
    .await;

    assert_eq!(result.unwrap(), 3);
    assert_eq!(calls, 3);
}

#[tokio::test]
async fn zero_retries_runs_once_without_waiting() {
    let policy = RetryPolicy {
        max_retries: 0,
        initial_backoff: Duration::from_secs(60),
        max_backoff: Duration::from_secs(60),
    };
    let mut calls = 0u32;
    let token = CancellationToken::new();
    let run = Retryer::new(policy, |_: &&str| true, || {
        calls += 1;
        async { Err::<(), _>("boom") }
    })
    .run(&token);

    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("should not wait for a backoff");
    assert!(matches!(result, Err(RetryError::Failed("boom"))));
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn non_retryable_error_returns_immediately() {
    let mut calls = 0u32;
    let result = Retryer::new(fast_policy(5), |_: &&str| false, || {
        calls += 1;
        async { Err::<(), _>("fatal") }
    })
    .run(&CancellationToken::new())
    .await;

    assert!(matches!(result, Err(RetryError::Failed("fatal"))));
    assert_eq!(calls, 1);
}

#[tokio::test]
async fn exhausted_retries_return_the_last_error() {
    let mut calls = 0u32;
    let result = Retryer::new(fast_policy(2), |_: &String| true, || {
        calls += 1;
        let n = calls;
        async move { Err::<(), _>(format!("failure {n}")) }
    })
    .run(&CancellationToken::new())
    .await;

    assert_eq!(calls, 3);
    assert_eq!(result.unwrap_err().into_failure().as_deref(), Some("failure 3"));
}

#[tokio::test]
async fn cancellation_interrupts_the_backoff() {
    let policy = RetryPolicy {
        max_retries: 3,
        initial_backoff: Duration::from_secs(60),
        max_backoff: Duration::from_secs(60),
    };
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let run = Retryer::new(policy, |_: &&str| true, || async { Err::<(), _>("busy") }).run(&cancel);
    let result = tokio::time::timeout(Duration::from_secs(5), run)
        .await
        .expect("cancellation should end the wait");
    assert!(matches!(result, Err(RetryError::Cancelled)));
}

#[test]
fn backoff_doubles_and_caps() {
    let policy = RetryPolicy::default();
    assert_eq!(policy.max_retries, 3);
    assert_eq!(policy.backoff_for(0), Duration::from_secs(1));
    assert_eq!(policy.backoff_for(1), Duration::from_secs(2));
    assert_eq!(policy.backoff_for(2), Duration::from_secs(4));
    assert_eq!(policy.backoff_for(4), Duration::from_secs(16));
    assert_eq!(policy.backoff_for(5), Duration::from_secs(30));
    assert_eq!(policy.backoff_for(40), Duration::from_secs(30));
}

#[test]
fn retry_errors_map_onto_assistant_errors() {
    let cancelled: AssistantError = RetryError::<AssistantError>::Cancelled.into();
    assert!(matches!(cancelled, AssistantError::Cancelled));

    let failed: AssistantError =
        RetryError::Failed(AssistantError::RateLimited("slow down".into())).into();
    assert!(failed.is_rate_limit());
}
