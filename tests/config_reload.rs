//! Hot reload through a real filesystem watcher.

use std::path::{Path, PathBuf};
use std::time::Duration;

use path_rewrite_gateway::config::watcher::ConfigWatcher;
use path_rewrite_gateway::config::{GatewayConfig, RuleConfig};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::timeout;

const WAIT: Duration = Duration::from_secs(10);
const QUIET: Duration = Duration::from_millis(500);

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("gateway-watch-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn rules_toml(rules: &[(&str, &str)]) -> String {
    rules
        .iter()
        .map(|(from, to)| format!("[[rules]]\nfrom = \"{from}\"\nto = \"{to}\"\n\n"))
        .collect()
}

/// Replace the file the way editors do: write a sibling, rename it over.
fn save_atomically(path: &Path, contents: &str) {
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, contents).unwrap();
    std::fs::rename(&tmp, path).unwrap();
}

/// Receive until a config with `expected` rules arrives, returning every
/// config seen on the way.
async fn recv_rules(
    rx: &mut UnboundedReceiver<GatewayConfig>,
    expected: &[RuleConfig],
) -> Vec<GatewayConfig> {
    let mut seen = Vec::new();
    loop {
        let config = timeout(WAIT, rx.recv())
            .await
            .expect("timed out waiting for reload")
            .expect("watcher channel closed");
        let done = config.rules == expected;
        seen.push(config);
        if done {
            return seen;
        }
    }
}

/// Discard duplicate events from the previous save.
async fn drain(rx: &mut UnboundedReceiver<GatewayConfig>) {
    while let Ok(Some(_)) = timeout(QUIET, rx.recv()).await {}
}

#[tokio::test]
async fn test_reload_delivers_new_rules_and_drops_invalid() {
    let dir = temp_dir();
    let path = dir.join("gateway.toml");
    std::fs::write(&path, rules_toml(&[("/old", "/new")])).unwrap();

    let (watcher, mut rx) = ConfigWatcher::new(&path);
    let _watcher = watcher.run().unwrap();

    save_atomically(&path, &rules_toml(&[("/users/*", "/user/$1")]));
    let expected = vec![RuleConfig::new("/users/*", "/user/$1")];
    recv_rules(&mut rx, &expected).await;
    drain(&mut rx).await;

    // $1 with no wildcard in the pattern fails validation.
    save_atomically(&path, &rules_toml(&[("/a", "/b/$1")]));
    assert!(timeout(QUIET * 2, rx.recv()).await.is_err());

    save_atomically(&path, &rules_toml(&[("/a/*", "/b/$1"), ("/c", "/d")]));
    let expected = vec![RuleConfig::new("/a/*", "/b/$1"), RuleConfig::new("/c", "/d")];
    let seen = recv_rules(&mut rx, &expected).await;
    assert!(seen
        .iter()
        .all(|c| !c.rules.contains(&RuleConfig::new("/a", "/b/$1"))));

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_in_place_write_is_picked_up() {
    let dir = temp_dir();
    let path = dir.join("gateway.toml");
    std::fs::write(&path, rules_toml(&[("/old", "/new")])).unwrap();

    let (watcher, mut rx) = ConfigWatcher::new(&path);
    let _watcher = watcher.run().unwrap();

    std::fs::write(&path, rules_toml(&[("/x/*", "/y/$1")])).unwrap();
    recv_rules(&mut rx, &[RuleConfig::new("/x/*", "/y/$1")]).await;

    std::fs::remove_dir_all(&dir).unwrap();
}

#[tokio::test]
async fn test_sibling_files_do_not_trigger_reload() {
    let dir = temp_dir();
    let path = dir.join("gateway.toml");
    std::fs::write(&path, rules_toml(&[("/old", "/new")])).unwrap();

    let (watcher, mut rx) = ConfigWatcher::new(&path);
    let _watcher = watcher.run().unwrap();

    std::fs::write(dir.join("notes.txt"), "unrelated").unwrap();
    assert!(timeout(QUIET * 2, rx.recv()).await.is_err());

    std::fs::remove_dir_all(&dir).unwrap();
}
