use super::*;
use crate::error::Error;
use ravensh_exec::InterpreterCommand;
use std::sync::Arc;
use std::time::Duration;

fn shell_manager() -> SessionManager {
    SessionManager::new(InterpreterCommand::new("sh"), SessionConfig::default())
}

async fn poll_until(manager: &SessionManager, key: &SessionKey, needle: &str) -> SessionOutput {
    let mut collected = SessionOutput::default();
    for _ in 0..40 {
        let out = manager.poll_output(key).await.unwrap();
        collected.stdout.push_str(&out.stdout);
        collected.stderr.push_str(&out.stderr);
        if collected.stdout.contains(needle) || collected.stderr.contains(needle) {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    collected
}

#[cfg(target_os = "linux")]
fn pid_exists(pid: u32) -> bool {
    std::path::Path::new(&format!("/proc/{}", pid)).exists()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_get_or_create_spawns_once() {
    let manager = Arc::new(shell_manager());
    let key = SessionKey::new("shared");

    let mut handles = Vec::new();
    for _ in 0..16 {
        let manager = manager.clone();
        let key = key.clone();
        handles.push(tokio::spawn(async move {
            manager.get_or_create(&key).await.unwrap().pid()
        }));
    }

    let mut pids = Vec::new();
    for handle in handles {
        pids.push(handle.await.unwrap());
    }
    pids.dedup();

    assert_eq!(pids.len(), 1);
    assert_eq!(manager.stats().await.spawned_total, 1);
    assert_eq!(manager.len().await, 1);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_submit_line_then_poll() {
    let manager = shell_manager();
    let key = SessionKey::generate();

    tokio_test::assert_ok!(manager.submit_line(&key, "echo 1").await);
    let out = poll_until(&manager, &key, "1\n").await;
    assert_eq!(out.stdout, "1\n");
    assert!(out.stderr.is_empty());

    manager.submit_line(&key, "echo bad 1>&2").await.unwrap();
    let out = poll_until(&manager, &key, "bad").await;
    assert_eq!(out.stderr, "bad\n");

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_submit_line_single_newline() {
    let manager = SessionManager::new(InterpreterCommand::new("cat"), SessionConfig::default());
    let key = SessionKey::new("cat");

    manager.submit_line(&key, "first\n").await.unwrap();
    manager.submit_line(&key, "second").await.unwrap();
    let out = poll_until(&manager, &key, "second\n").await;
    assert_eq!(out.stdout, "first\nsecond\n");

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_poll_with_nothing_pending_is_empty() {
    let manager = shell_manager();
    let key = SessionKey::new("quiet");

    let started = std::time::Instant::now();
    let out = manager.poll_output(&key).await.unwrap();
    assert!(out.is_empty());
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(manager.contains(&key).await);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let manager = shell_manager();
    let a = SessionKey::new("a");
    let b = SessionKey::new("b");

    manager.submit_line(&a, "X=alpha").await.unwrap();
    manager.submit_line(&b, "X=beta").await.unwrap();
    manager.submit_line(&a, "echo $X").await.unwrap();
    manager.submit_line(&b, "echo $X").await.unwrap();

    assert_eq!(poll_until(&manager, &a, "alpha").await.stdout, "alpha\n");
    assert_eq!(poll_until(&manager, &b, "beta").await.stdout, "beta\n");
    assert_eq!(manager.stats().await.spawned_total, 2);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_reset_kills_and_is_idempotent() {
    let manager = shell_manager();
    let key = SessionKey::new("reset-me");

    let process = manager.get_or_create(&key).await.unwrap();
    let pid = process.pid().unwrap();
    drop(process);

    assert!(manager.reset(&key).await);
    assert!(!manager.contains(&key).await);
    #[cfg(target_os = "linux")]
    assert!(!pid_exists(pid));

    assert!(!manager.reset(&key).await);
    assert!(!manager.reset(&SessionKey::new("never-seen")).await);
}

#[tokio::test]
async fn test_reset_then_use_starts_fresh_interpreter() {
    let manager = shell_manager();
    let key = SessionKey::new("fresh");

    manager.submit_line(&key, "X=kept").await.unwrap();
    manager.reset(&key).await;
    manager.submit_line(&key, "echo \"[$X]\"").await.unwrap();

    assert_eq!(poll_until(&manager, &key, "]").await.stdout, "[]\n");
    assert_eq!(manager.stats().await.spawned_total, 2);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_exited_interpreter_is_replaced() {
    let manager = shell_manager();
    let key = SessionKey::new("exits");

    manager.submit_line(&key, "exit 0").await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    manager.submit_line(&key, "echo back").await.unwrap();
    assert_eq!(poll_until(&manager, &key, "back").await.stdout, "back\n");
    assert_eq!(manager.stats().await.spawned_total, 2);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_spawn_failure_leaves_key_unregistered() {
    let manager = SessionManager::new(
        InterpreterCommand::new("/nonexistent/ravensh-interpreter"),
        SessionConfig::default(),
    );
    let key = SessionKey::new("broken");

    let err = tokio_test::assert_err!(manager.submit_line(&key, "hello").await);
    assert!(matches!(err, Error::SessionCreate { .. }));
    assert!(!manager.contains(&key).await);
    assert_eq!(manager.stats().await.spawned_total, 0);
}

#[tokio::test]
async fn test_reap_idle_evicts_only_stale_sessions() {
    let manager = shell_manager();
    let stale = SessionKey::new("stale");
    let recent = SessionKey::new("recent");

    let stale_pid = manager.get_or_create(&stale).await.unwrap().pid().unwrap();
    manager.get_or_create(&recent).await.unwrap();

    tokio::time::sleep(Duration::from_millis(250)).await;
    manager.get_or_create(&recent).await.unwrap();

    let evicted = manager.reap_idle(Duration::from_millis(200)).await;
    assert_eq!(evicted, 1);
    assert!(!manager.contains(&stale).await);
    assert!(manager.contains(&recent).await);
    #[cfg(target_os = "linux")]
    assert!(!pid_exists(stale_pid));

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_max_sessions_evicts_least_recent() {
    let manager = SessionManager::new(
        InterpreterCommand::new("sh"),
        SessionConfig {
            max_sessions: 2,
            ..SessionConfig::default()
        },
    );
    let first = SessionKey::new("first");
    let second = SessionKey::new("second");
    let third = SessionKey::new("third");

    manager.get_or_create(&first).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    manager.get_or_create(&second).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    manager.get_or_create(&third).await.unwrap();

    assert_eq!(manager.len().await, 2);
    assert!(!manager.contains(&first).await);
    assert!(manager.contains(&second).await);
    assert!(manager.contains(&third).await);

    manager.shutdown_all().await;
}

#[tokio::test]
async fn test_shutdown_all_empties_table() {
    let manager = shell_manager();
    for name in ["one", "two", "three"] {
        manager.get_or_create(&SessionKey::new(name)).await.unwrap();
    }

    assert_eq!(manager.shutdown_all().await, 3);
    assert!(manager.is_empty().await);
}

#[test]
fn test_session_key_display_and_generate() {
    let key = SessionKey::new("abc");
    assert_eq!(key.to_string(), "abc");
    assert_ne!(SessionKey::generate(), SessionKey::generate());
}
