// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Unit tests for `key_lock.rs`

#[cfg(test)]
mod tests {
    use crate::reconcilers::key_lock::KeyedLock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[derive(Default)]
    struct Probe {
        current: AtomicUsize,
        max: AtomicUsize,
    }

    impl Probe {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.max.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    async fn run(locks: Arc<KeyedLock>, probe: Arc<Probe>, key: &'static str) {
        let _guard = locks.lock(key).await;
        probe.enter();
        tokio::time::sleep(Duration::from_millis(20)).await;
        probe.exit();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_same_key_never_overlaps() {
        let locks = Arc::new(KeyedLock::new());
        let probe = Arc::new(Probe::default());

        let tasks: Vec<_> = (0..5)
            .map(|_| tokio::spawn(run(locks.clone(), probe.clone(), "cf/broker-a")))
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        assert_eq!(probe.max.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_distinct_keys_run_in_parallel() {
        let locks = Arc::new(KeyedLock::new());
        let probe = Arc::new(Probe::default());
        let held = locks.lock("cf/broker-a").await;

        // broker-b is not blocked by broker-a's guard
        tokio::time::timeout(
            Duration::from_secs(1),
            run(locks.clone(), probe.clone(), "cf/broker-b"),
        )
        .await
        .expect("distinct key must not wait");

        drop(held);
    }

    #[tokio::test]
    async fn test_released_keys_are_removed() {
        let locks = KeyedLock::new();

        {
            let _a = locks.lock("cf/a").await;
            let _b = locks.lock("cf/b").await;
            assert_eq!(locks.active_keys(), 2);
        }

        assert_eq!(locks.active_keys(), 0);
    }

    #[tokio::test]
    async fn test_waiter_keeps_entry_alive() {
        let locks = Arc::new(KeyedLock::new());
        let first = locks.lock("cf/a").await;

        let waiter = {
            let locks = locks.clone();
            tokio::spawn(async move {
                let _guard = locks.lock("cf/a").await;
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        drop(first);
        waiter.await.unwrap();
        assert_eq!(locks.active_keys(), 0);
    }
}
