use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use sf_app::{retry_with_backoff, RetryPolicy};

fn policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(max_attempts, Duration::from_millis(1000))
}

#[tokio::test(start_paused = true)]
async fn test_succeeds_after_n_failures_with_n_plus_one_attempts() {
    const FAILURES: u32 = 3;
    let calls = &AtomicU32::new(0);

    let result = retry_with_backoff(&policy(FAILURES + 1), || async move {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        if call < FAILURES {
            Err(anyhow::anyhow!("network request failed"))
        } else {
            Ok("uploaded")
        }
    })
    .await;

    assert_eq!(result.unwrap(), "uploaded");
    assert_eq!(calls.load(Ordering::SeqCst), FAILURES + 1);
}

#[tokio::test(start_paused = true)]
async fn test_always_failing_operation_is_invoked_exactly_k_times() {
    let calls = &AtomicU32::new(0);

    let result: Result<(), _> = retry_with_backoff(&policy(4), || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err(anyhow::anyhow!("503 service unavailable"))
    })
    .await;

    assert_eq!(result.unwrap_err().to_string(), "503 service unavailable");
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test(start_paused = true)]
async fn test_auth_failure_is_not_retried() {
    let calls = &AtomicU32::new(0);

    let result: Result<(), _> = retry_with_backoff(&policy(5), || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Err("Auth session missing".to_string())
    })
    .await;

    assert!(result.is_err());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_waits_between_attempts_but_not_after_the_last() {
    let start = tokio::time::Instant::now();
    let policy = RetryPolicy::new(3, Duration::from_millis(1000)).with_jitter(Duration::ZERO);

    let _: Result<(), _> =
        retry_with_backoff(&policy, || async move { Err("timeout".to_string()) }).await;

    // 1000 ms after the first failure, 2000 ms after the second, none after the third.
    let elapsed = start.elapsed();
    assert!(elapsed >= Duration::from_millis(3000));
    assert!(elapsed < Duration::from_millis(3100));
}
