//! File-watch reload path: notify event, load, validate, channel.

use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;
use path_matcher::config::watcher::ConfigWatcher;
use path_matcher::config::GatewayConfig;

const INITIAL: &str = "[[routes]]\noperation = \"Initial\"\ntemplate = \"/initial\"\n";
const REWRITTEN: &str = "[[routes]]\noperation = \"Rewritten\"\ntemplate = \"/rewritten/{id}\"\n";

/// Parses, but fails validation; longer than `REWRITTEN` so an in-place write
/// leaves no trailing bytes behind.
const INVALID: &str = "[matcher]\nmax_segments = 0\n\n[[routes]]\noperation = \"\"\n\
                       method = \"G E T\"\ntemplate = \"/broken\"\n";

/// Wait until a config whose first route is `operation` arrives.
async fn wait_for(rx: &mut UnboundedReceiver<GatewayConfig>, operation: &str) -> GatewayConfig {
    loop {
        let config = timeout(Duration::from_secs(10), rx.recv())
            .await
            .expect("no reload within timeout")
            .expect("watcher channel closed");
        if config.routes.first().map(|r| r.operation.as_str()) == Some(operation) {
            return config;
        }
    }
}

#[tokio::test]
async fn test_watcher_forwards_valid_rewrites_only() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("routes.toml");
    std::fs::write(&path, INITIAL).unwrap();

    let (watcher, mut rx) = ConfigWatcher::new(&path);
    let _handle = watcher.run().unwrap();

    std::fs::write(&path, REWRITTEN).unwrap();
    let config = wait_for(&mut rx, "Rewritten").await;
    assert_eq!(config.routes.len(), 1);
    assert_eq!(config.routes[0].template, "/rewritten/{id}");
    assert_eq!(config.routes[0].method, "*");

    // Overwrite in place without truncating, so no empty file is ever observed.
    assert!(INVALID.len() > REWRITTEN.len());
    let mut file = std::fs::OpenOptions::new().write(true).open(&path).unwrap();
    file.write_all(INVALID.as_bytes()).unwrap();
    file.sync_all().unwrap();
    drop(file);

    // Late duplicates of the previous rewrite may still arrive; nothing else may.
    tokio::time::sleep(Duration::from_millis(500)).await;
    while let Ok(config) = rx.try_recv() {
        let operation = config.routes.first().map(|r| r.operation.as_str());
        assert_eq!(operation, Some("Rewritten"));
        assert_eq!(config.matcher.max_segments, 64);
    }
}
