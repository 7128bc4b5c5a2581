//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 模拟 e2e 测试（无需 Redis）：MockLineSource -> IngestionLoop -> Hub -> 订阅者 + DailyFileSink

#[cfg(test)]
mod contract_tests {
    use contracts::{Command, Item};

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_flush_command_wire_format() {
        let item = Item::command(Command::flush());
        assert_eq!(item.payload(), r#"{"command":"flush"}"#);
        assert!(item.is_command());
        assert!(!Item::new("plain event").is_command());
    }

    #[test]
    fn test_legacy_dir_matches_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(config_loader::REDIS_INPUT_FILE),
            "127.0.0.1:6379/0",
        )
        .unwrap();
        std::fs::write(dir.path().join(config_loader::REDIS_QUEUE_FILE), "analyzer:3:x").unwrap();

        let bp = config_loader::ConfigLoader::load_from_path(dir.path()).unwrap();
        assert_eq!(bp.http.bind, "127.0.0.1:1323");
        assert_eq!(bp.http.ws_path, "/ws");
        assert_eq!(bp.store.path, "./build/daily.json");
        assert_eq!(bp.source.redis_url(), "redis://127.0.0.1:6379/0");
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::future::Future;
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    use chrono::NaiveTime;
    use contracts::{HubConfig, Item, ThrottlePolicy};
    use dispatcher::{DailyFileSink, FlushTrigger, Hub, HubHandle, StoreHandle, Subscription};
    use ingestion::{IngestionLoop, IngestionLoopConfig, MockHandle, MockLineSource};
    use tempfile::TempDir;
    use tokio::task::JoinHandle;
    use tokio_util::sync::CancellationToken;

    const WAIT: Duration = Duration::from_secs(5);

    /// Mock source -> ingestion -> hub -> daily store, all running
    struct Harness {
        _dir: TempDir,
        store_path: PathBuf,
        feed: MockHandle,
        hub: HubHandle,
        store: StoreHandle,
        trigger: FlushTrigger,
        cancel: CancellationToken,
        tasks: Vec<JoinHandle<()>>,
    }

    impl Harness {
        fn start() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let store_path = dir.path().join("daily.json");

            let sink = DailyFileSink::open(&store_path).unwrap();
            let store = StoreHandle::spawn(sink, 1);

            let mut ingestion = IngestionLoop::new(IngestionLoopConfig::new(
                Duration::from_millis(10),
                1,
                ThrottlePolicy::RestartGate,
            ))
            .unwrap();
            let input = ingestion.take_receiver().unwrap();

            let cancel = CancellationToken::new();
            let (hub, handle) = Hub::new(&HubConfig::default(), input, store.sender());
            let trigger = FlushTrigger::new(
                NaiveTime::from_hms_opt(0, 0, 0).unwrap(),
                ingestion.sender(),
            );

            let source = MockLineSource::new("mock");
            let feed = source.handle();

            let tasks = vec![
                hub.spawn(cancel.clone()),
                ingestion.spawn(source, cancel.clone()),
            ];

            Self {
                _dir: dir,
                store_path,
                feed,
                hub: handle,
                store,
                trigger,
                cancel,
                tasks,
            }
        }

        fn store_lines(&self) -> Vec<String> {
            read_lines(&self.store_path)
        }

        async fn wait_for_store(&self, expected: &[&str]) {
            let path = self.store_path.clone();
            wait_until(|| {
                let lines = read_lines(&path);
                async move { lines == expected }
            })
            .await;
        }

        async fn stop(self) {
            self.cancel.cancel();
            for task in self.tasks {
                tokio::time::timeout(WAIT, task).await.unwrap().unwrap();
            }
            drop(self.trigger);
            tokio::time::timeout(WAIT, self.store.shutdown())
                .await
                .unwrap();
        }
    }

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    async fn wait_until<F, Fut>(mut check: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = bool>,
    {
        let deadline = tokio::time::Instant::now() + WAIT;
        while !check().await {
            assert!(
                tokio::time::Instant::now() < deadline,
                "condition not reached in time"
            );
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    async fn recv(sub: &mut Subscription) -> Item {
        tokio::time::timeout(WAIT, sub.recv())
            .await
            .expect("timed out waiting for item")
            .expect("subscription closed")
    }

    /// Late joiner, live events, daily flush
    ///
    /// 1. E1, E2 arrive with no viewer: persisted only
    /// 2. viewer A joins: no backfill, receives E3
    /// 3. flush: A receives the command, the file is emptied
    /// 4. E4 starts the new day
    #[tokio::test]
    async fn test_e2e_daily_cycle() {
        let h = Harness::start();

        h.feed.push_lines(["E1", "E2"]);
        h.wait_for_store(&["E1", "E2"]).await;

        let mut a = h.hub.register().await.unwrap();
        h.feed.push_line("E3");
        assert_eq!(recv(&mut a).await.payload(), "E3");
        h.wait_for_store(&["E1", "E2", "E3"]).await;

        h.trigger.fire().await.unwrap();
        let cmd = recv(&mut a).await;
        assert!(cmd.is_command());
        assert_eq!(cmd.payload(), r#"{"command":"flush"}"#);
        h.wait_for_store(&[]).await;

        h.feed.push_line("E4");
        assert_eq!(recv(&mut a).await.payload(), "E4");
        h.wait_for_store(&["E4"]).await;

        let snapshot = h.store.metrics().snapshot();
        assert_eq!(snapshot.write_count, 4);
        assert_eq!(snapshot.skipped_count, 1);
        assert_eq!(snapshot.reset_count, 1);

        h.stop().await;
    }

    #[tokio::test]
    async fn test_e2e_same_order_for_every_client() {
        let h = Harness::start();

        let mut a = h.hub.register().await.unwrap();
        let mut b = h.hub.register().await.unwrap();

        let expected: Vec<String> = (0..20).map(|i| format!("event-{i}")).collect();
        h.feed.push_lines(expected.clone());

        let mut got_a = Vec::new();
        let mut got_b = Vec::new();
        for _ in 0..expected.len() {
            got_a.push(recv(&mut a).await.payload().to_string());
            got_b.push(recv(&mut b).await.payload().to_string());
        }

        assert_eq!(got_a, expected);
        assert_eq!(got_b, expected);

        let expected_refs: Vec<&str> = expected.iter().map(String::as_str).collect();
        h.wait_for_store(&expected_refs).await;

        h.stop().await;
    }

    #[tokio::test]
    async fn test_e2e_failed_client_is_isolated() {
        let h = Harness::start();

        let mut a = h.hub.register().await.unwrap();
        let b = h.hub.register().await.unwrap();
        assert_eq!(h.hub.client_count(), 2);

        // B goes away without unregistering
        drop(b);

        h.feed.push_lines(["x", "y", "z"]);
        for expected in ["x", "y", "z"] {
            assert_eq!(recv(&mut a).await.payload(), expected);
        }

        let hub = h.hub.clone();
        wait_until(|| {
            let count = hub.client_count();
            async move { count == 1 }
        })
        .await;
        h.wait_for_store(&["x", "y", "z"]).await;

        h.stop().await;
    }

    #[tokio::test]
    async fn test_e2e_source_errors_do_not_lose_later_events() {
        let h = Harness::start();
        let mut a = h.hub.register().await.unwrap();

        h.feed.push_line("before");
        h.feed.push_error("connection reset");
        h.feed.push_line("after");

        assert_eq!(recv(&mut a).await.payload(), "before");
        assert_eq!(recv(&mut a).await.payload(), "after");
        h.wait_for_store(&["before", "after"]).await;

        h.stop().await;
    }

    #[tokio::test]
    async fn test_e2e_shutdown_ends_subscriptions() {
        let h = Harness::start();
        let mut a = h.hub.register().await.unwrap();

        h.cancel.cancel();
        let next = tokio::time::timeout(WAIT, a.recv()).await.unwrap();
        assert!(next.is_none());

        h.stop().await;
    }
}
