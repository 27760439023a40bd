//! Integration tests for request coalescing
//!
//! These tests verify:
//! - Concurrent callers share one fetch
//! - Failures are delivered to every waiter and never cached
//! - Substring invalidation
//! - Clearing while a request is in flight
//! - A stale fetch never releases a newer pending request

use lullaby_core::cache::{ApiCache, CacheConfig};
use lullaby_core::CoreError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_test::{assert_err, assert_ok};

/// A fetcher that counts its calls and answers after `delay`
fn counting_fetcher(
    calls: &Arc<AtomicUsize>,
    delay: Duration,
    value: &'static str,
) -> impl FnOnce() -> futures::future::BoxFuture<'static, anyhow::Result<String>> {
    let calls = calls.clone();
    move || {
        Box::pin(async move {
            calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            Ok(value.to_string())
        })
    }
}

#[tokio::test]
async fn test_concurrent_callers_share_one_fetch() {
    let api = Arc::new(ApiCache::<String>::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let api = api.clone();
        let fetcher = counting_fetcher(&calls, Duration::from_millis(100), "calm");
        tasks.push(tokio::spawn(async move {
            api.get("sessions:u1", fetcher, None).await
        }));
    }

    for task in tasks {
        let value = assert_ok!(task.await.unwrap());
        assert_eq!(value, "calm");
    }

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.pending_count().await, 0);

    // Served from cache afterwards
    let value = assert_ok!(
        api.get("sessions:u1", counting_fetcher(&calls, Duration::ZERO, "other"), None)
            .await
    );
    assert_eq!(value, "calm");
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_distinct_keys_fetch_independently() {
    let api = ApiCache::<String>::new();
    let calls = Arc::new(AtomicUsize::new(0));

    let (a, b) = tokio::join!(
        api.get("quote:1", counting_fetcher(&calls, Duration::from_millis(20), "a"), None),
        api.get("quote:2", counting_fetcher(&calls, Duration::from_millis(20), "b"), None),
    );

    assert_eq!(assert_ok!(a), "a");
    assert_eq!(assert_ok!(b), "b");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_failure_reaches_every_waiter_and_is_retried() {
    let api = Arc::new(ApiCache::<String>::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let mut tasks = Vec::new();
    for _ in 0..3 {
        let api = api.clone();
        let calls = calls.clone();
        tasks.push(tokio::spawn(async move {
            api.get(
                "profile:u1",
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Err::<String, _>(anyhow::anyhow!("503 Service Unavailable"))
                },
                None,
            )
            .await
        }));
    }

    for task in tasks {
        let err = assert_err!(task.await.unwrap());
        assert!(matches!(err, CoreError::Fetch(_)));
        assert!(err.to_string().contains("503"));
    }
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(api.pending_count().await, 0);
    assert!(api.cache().is_empty().await);

    // The next call starts a fresh fetch
    let value = assert_ok!(
        api.get("profile:u1", counting_fetcher(&calls, Duration::ZERO, "ada"), None)
            .await
    );
    assert_eq!(value, "ada");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_invalidate_by_substring() {
    let api = ApiCache::<String>::new();
    let calls = Arc::new(AtomicUsize::new(0));

    for key in ["sessions-user1-a", "sessions-user1-b", "sessions-user2-a"] {
        assert_ok!(
            api.get(key, counting_fetcher(&calls, Duration::ZERO, "v"), None)
                .await
        );
    }

    let event = api.invalidate("user1").await;
    assert_eq!(event.count(), 2);

    assert!(!api.cache().contains_key("sessions-user1-a").await);
    assert!(!api.cache().contains_key("sessions-user1-b").await);
    assert!(api.cache().contains_key("sessions-user2-a").await);

    // Invalidated keys are fetched again
    assert_ok!(
        api.get("sessions-user1-a", counting_fetcher(&calls, Duration::ZERO, "v2"), None)
            .await
    );
    assert_eq!(calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn test_explicit_ttl() {
    let api = ApiCache::<String>::with_config(CacheConfig::api());
    let calls = Arc::new(AtomicUsize::new(0));

    assert_ok!(
        api.get(
            "streak:u1",
            counting_fetcher(&calls, Duration::ZERO, "3"),
            Some(Duration::from_millis(40)),
        )
        .await
    );
    tokio::time::sleep(Duration::from_millis(80)).await;

    assert_ok!(
        api.get("streak:u1", counting_fetcher(&calls, Duration::ZERO, "4"), None)
            .await
    );
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_clear_while_in_flight() {
    let api = Arc::new(ApiCache::<String>::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let first = {
        let api = api.clone();
        let fetcher = counting_fetcher(&calls, Duration::from_millis(100), "first");
        tokio::spawn(async move { api.get("k", fetcher, None).await })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(api.pending_count().await, 1);

    api.clear().await;
    assert_eq!(api.pending_count().await, 0);

    // A caller after the clear starts its own fetch instead of joining
    let second = assert_ok!(
        api.get("k", counting_fetcher(&calls, Duration::from_millis(150), "second"), None)
            .await
    );
    assert_eq!(second, "second");
    assert_eq!(assert_ok!(first.await.unwrap()), "first");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(api.pending_count().await, 0);
}

#[tokio::test]
async fn test_settled_fetch_does_not_release_newer_request() {
    let api = Arc::new(ApiCache::<String>::new());
    let calls = Arc::new(AtomicUsize::new(0));

    let first = {
        let api = api.clone();
        tokio::spawn(async move {
            api.get(
                "k",
                || async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Err::<String, _>(anyhow::anyhow!("stale request failed"))
                },
                None,
            )
            .await
        })
    };

    tokio::time::sleep(Duration::from_millis(20)).await;
    api.clear().await;

    let second = {
        let api = api.clone();
        let fetcher = counting_fetcher(&calls, Duration::from_millis(250), "second");
        tokio::spawn(async move { api.get("k", fetcher, None).await })
    };

    // The stale fetch settles while the newer one is still running
    assert_err!(first.await.unwrap());
    assert_eq!(api.pending_count().await, 1);

    let third = assert_ok!(
        api.get("k", counting_fetcher(&calls, Duration::ZERO, "third"), None)
            .await
    );
    assert_eq!(third, "second");
    assert_eq!(assert_ok!(second.await.unwrap()), "second");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
