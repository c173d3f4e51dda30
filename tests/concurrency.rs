//! Sharing engines across threads and swapping them under load.

use std::sync::Arc;
use std::thread;

use path_rewrite_gateway::http::RewriteHandle;
use path_rewrite_gateway::rewrite::{CompiledPattern, CompiledRule, Template};
use path_rewrite_gateway::{RewriteEngine, RewriteLayer};

fn assert_send_sync<T: Send + Sync>() {}

#[test]
fn test_engine_types_are_send_sync() {
    assert_send_sync::<RewriteEngine>();
    assert_send_sync::<CompiledRule>();
    assert_send_sync::<CompiledPattern>();
    assert_send_sync::<Template>();
    assert_send_sync::<RewriteHandle>();
    assert_send_sync::<RewriteLayer>();
}

#[test]
fn test_shared_engine_across_threads() {
    let engine = Arc::new(
        RewriteEngine::builder()
            .rule("/users/*/orders/*", "/user/$1/order/$2")
            .rule("/files/*", "/static/$1")
            .build()
            .unwrap(),
    );

    let workers: Vec<_> = (0..8)
        .map(|worker| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for i in 0..1_000 {
                    let path = format!("/users/{worker}/orders/{i}");
                    assert_eq!(
                        engine.apply(&path).path(),
                        format!("/user/{worker}/order/{i}")
                    );

                    let path = format!("/files/{worker}-{i}.css");
                    assert_eq!(engine.apply(&path).path(), format!("/static/{worker}-{i}.css"));

                    assert!(!engine.apply("/elsewhere").is_match());
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_readers_see_whole_engines_during_swaps() {
    let first = || RewriteEngine::builder().rule("/a/*", "/one/$1").build().unwrap();
    let second = || RewriteEngine::builder().rule("/a/*", "/two/$1").build().unwrap();
    let handle = RewriteHandle::new(first());

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let handle = handle.clone();
            tokio::spawn(async move {
                for i in 0..2_000 {
                    let rewritten = handle.load().apply(&format!("/a/{i}")).path().to_string();
                    assert!(
                        rewritten == format!("/one/{i}") || rewritten == format!("/two/{i}"),
                        "unexpected rewrite {rewritten}"
                    );
                    if i % 100 == 0 {
                        tokio::task::yield_now().await;
                    }
                }
            })
        })
        .collect();

    for i in 0..200 {
        handle.swap(if i % 2 == 0 { second() } else { first() });
        tokio::task::yield_now().await;
    }

    for reader in readers {
        reader.await.unwrap();
    }
}
