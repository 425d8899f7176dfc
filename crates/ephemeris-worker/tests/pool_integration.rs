//! Pool lifecycle tests driven by a shell-scripted stand-in worker that
//! speaks the line-oriented IPC protocol (no kernel files needed).

use std::time::Duration;

use ephemeris_worker::{PoolConfig, WorkerError, WorkerPool};

/// A fake worker: prints the ready sentinel, then answers every request
/// line with `{"job_id":..., "result":42}`.
const ECHO_WORKER: &str = r#"echo ready
while read line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"job_id":"\([^"]*\)".*/\1/p')
  printf '{"job_id":"%s","result":42}\n' "$id"
done"#;

/// A fake worker that always reports a structured job error.
const ERROR_WORKER: &str = r#"echo ready
while read line; do
  id=$(printf '%s' "$line" | sed -n 's/.*"job_id":"\([^"]*\)".*/\1/p')
  printf '{"job_id":"%s","error":"boom"}\n' "$id"
done"#;

fn config(script: &str, worker_count: usize, queue_size: usize) -> PoolConfig {
    PoolConfig {
        command: "sh".to_string(),
        args: vec!["-c".to_string(), script.to_string()],
        worker_count,
        queue_size,
        job_timeout: Duration::from_secs(5),
        max_replacements_per_min: 10,
    }
}

#[tokio::test]
async fn submit_round_trips_through_a_worker_process() {
    let pool = WorkerPool::start(config(ECHO_WORKER, 1, 4)).await.unwrap();
    let result = pool.submit(serde_json::json!({"x": 1})).await.unwrap();
    assert_eq!(result, serde_json::json!(42));

    let health = pool.health().await;
    assert_eq!(health.jobs_completed, 1);
    assert_eq!(health.idle, 1);
    pool.shutdown().await;
}

#[tokio::test]
async fn structured_job_error_keeps_the_slot_alive() {
    let pool = WorkerPool::start(config(ERROR_WORKER, 1, 4)).await.unwrap();

    let err = pool.submit(serde_json::json!({})).await.unwrap_err();
    assert_eq!(err, WorkerError::JobFailed("boom".to_string()));

    // The same process must still be dispatchable: no replacement happened.
    let err = pool.submit(serde_json::json!({})).await.unwrap_err();
    assert!(matches!(err, WorkerError::JobFailed(_)));

    let health = pool.health().await;
    assert_eq!(health.dead, 0);
    assert_eq!(health.replacements_last_minute, 0);
    pool.shutdown().await;
}

#[tokio::test]
async fn draining_pool_refuses_new_jobs() {
    let pool = WorkerPool::start(config(ECHO_WORKER, 1, 4)).await.unwrap();
    pool.shutdown().await;
    let err = pool.submit(serde_json::json!({})).await.unwrap_err();
    assert_eq!(err, WorkerError::ShuttingDown);
}

#[tokio::test]
async fn concurrent_submissions_share_the_pool_fifo() {
    let pool = std::sync::Arc::new(WorkerPool::start(config(ECHO_WORKER, 2, 16)).await.unwrap());

    let mut handles = Vec::new();
    for _ in 0..8 {
        let pool = std::sync::Arc::clone(&pool);
        handles.push(tokio::spawn(async move { pool.submit(serde_json::json!({})).await }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().unwrap(), serde_json::json!(42));
    }

    let health = pool.health().await;
    assert_eq!(health.jobs_completed, 8);
    pool.shutdown().await;
}
