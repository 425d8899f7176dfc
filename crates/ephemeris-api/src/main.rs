//! Binary entry point: `serve` runs the HTTP edge, `worker` is the
//! subprocess entry point the pool spawns one copy of per slot.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use clap::{Parser, Subcommand};
use ephemeris_api::error::{map_compute_error, ApiError, ApiErrorCode, WireError};
use ephemeris_api::kernel_select::KernelSelector;
use ephemeris_api::state::AppState;
use ephemeris_api::worker_job::{to_compute_requests, JobBodyResult, JobRequest, JobResponse};
use ephemeris_api::{routes, types};
use ephemeris_cache::Cache;
use ephemeris_config::EphemerisConfig;
use ephemeris_core::compute::ObserverFrameUsed;
use ephemeris_ratelimit::{KeySource, RateLimiter, Rule, RuleSet};
use ephemeris_worker::ipc::{read_request, write_ready, write_response};
use ephemeris_worker::{PoolConfig, WireResponse, WorkerPool};
use tokio::io::{stdin, stdout, BufReader};

#[derive(Parser)]
#[command(name = "ephemeris-api", about = "Ephemeris position service")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP edge and supervise the worker pool.
    Serve {
        #[arg(long, default_value = "config.toml")]
        config: String,
    },
    /// Run a single worker subprocess (invoked by the pool, not directly).
    Worker {
        #[arg(long, default_value = "config.toml")]
        config: String,
    },
}

fn load_config(path: &str) -> EphemerisConfig {
    let mut config = match std::fs::read_to_string(path) {
        Ok(text) => EphemerisConfig::from_toml(&text).unwrap_or_else(|e| {
            eprintln!("failed to parse {path}: {e}, using defaults");
            EphemerisConfig::default()
        }),
        Err(_) => EphemerisConfig::default(),
    };
    config.apply_env();
    config
}

fn rule_set(config: &EphemerisConfig) -> RuleSet {
    let rules = config
        .rate_limit
        .rules
        .iter()
        .map(|r| Rule {
            path_prefix: r.path_prefix.clone(),
            key_source: if r.key_source == "client_ip" { KeySource::ClientIp } else { KeySource::Header(r.key_source.clone()) },
            limit: r.limit,
            period: std::time::Duration::from_secs(r.period_secs),
        })
        .collect();
    RuleSet::new(rules)
}

async fn serve(config_path: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path);
    let lsk = ephemeris_time::LeapSecondKernel::load(&PathBuf::from(&config.kernel.lsk_path))?;

    // Loaded once here purely to capture checksums for /healthz; the pool's
    // worker subprocesses load their own independent copy of the bundle.
    let selector = KernelSelector::load(&config.kernel)?;
    let kernel_bundle_checksums = Arc::new(selector.all_checksums());
    drop(selector);

    let current_exe = std::env::current_exe()?.to_string_lossy().into_owned();
    let pool = WorkerPool::start(PoolConfig {
        command: current_exe,
        args: vec!["worker".to_string(), "--config".to_string(), config_path.clone()],
        worker_count: config.worker_pool.worker_count,
        queue_size: config.worker_pool.queue_size,
        job_timeout: config.worker_pool.job_timeout(),
        max_replacements_per_min: config.worker_pool.max_replacements_per_min,
    })
    .await?;

    let cache = match &config.cache.l2_url {
        Some(url) => match ephemeris_cache::RedisL2Cache::connect(url).await {
            Ok(l2) => Cache::<types::PositionsResponse>::with_l2(
                config.cache.l1_capacity,
                config.cache.l1_ttl(),
                config.cache.l2_ttl(),
                Arc::new(l2),
            ),
            Err(e) => {
                tracing::warn!(error = %e, "L2 cache backing unreachable; continuing L1-only");
                Cache::new(config.cache.l1_capacity, config.cache.l1_ttl(), config.cache.l2_ttl())
            }
        },
        None => Cache::new(config.cache.l1_capacity, config.cache.l1_ttl(), config.cache.l2_ttl()),
    };
    let rate_limiter = match &config.rate_limit.storage_uri {
        Some(uri) => match ephemeris_ratelimit::RedisStore::connect(uri).await {
            Ok(store) => RateLimiter::with_store(rule_set(&config), Arc::new(store)),
            Err(e) => {
                tracing::warn!(error = %e, "rate-limit backing unreachable; enforcing per-instance limits");
                RateLimiter::new(rule_set(&config))
            }
        },
        None => RateLimiter::new(rule_set(&config)),
    };
    let geocoder = ephemeris_api::geocoder::Geocoder::new(config.time_resolver.geocoder_url.clone());
    let bind_address = config.api.bind_address.clone();

    let patches = match &config.time_resolver.patch_table_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)?;
            ephemeris_time::load_patch_table(&text)?
        }
        None => Vec::new(),
    };

    let state = AppState {
        config: Arc::new(config),
        pool: Arc::new(pool),
        cache: Arc::new(cache),
        rate_limiter: Arc::new(rate_limiter),
        kernel_bundle_checksums,
        started_at: Instant::now(),
        geocoder: Arc::new(geocoder),
        lsk: Arc::new(lsk),
        patches: Arc::new(patches),
    };

    let pool_for_drain = Arc::clone(&state.pool);
    let router = routes::build(state);
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    tracing::info!(%bind_address, "ephemeris-api listening");
    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("draining worker pool");
    pool_for_drain.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async { tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler") };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()).expect("failed to install SIGTERM handler").recv().await;
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

fn observer_frame_used_str(frame_used: ObserverFrameUsed) -> &'static str {
    match frame_used {
        ObserverFrameUsed::IersEop => "iers_eop",
        ObserverFrameUsed::FallbackMeanRotation => "fallback_mean_rotation",
        ObserverFrameUsed::NotApplicable => "not_applicable",
    }
}

fn error_line(job_id: String, api_error: ApiError) -> WireResponse {
    let wire = api_error.to_wire();
    WireResponse { job_id, result: None, error: Some(serde_json::to_string(&wire).unwrap_or_else(|_| wire.detail)) }
}

async fn worker(config_path: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&config_path);
    let selector = KernelSelector::load(&config.kernel)?;

    let mut stdout_handle = stdout();
    write_ready(&mut stdout_handle).await?;

    let stdin_handle = stdin();
    let mut reader = BufReader::new(stdin_handle);

    while let Some(request) = read_request(&mut reader).await? {
        let job_id = request.job_id.clone();

        let job: JobRequest = match serde_json::from_value(request.payload) {
            Ok(job) => job,
            Err(e) => {
                let resp = error_line(job_id, ApiError::new(ApiErrorCode::InputInvalidFormat, e.to_string()));
                write_response(&mut stdout_handle, &resp).await?;
                continue;
            }
        };

        let Some(requests) = to_compute_requests(&job) else {
            let resp = error_line(job_id, ApiError::new(ApiErrorCode::InputInvalid, "request fields did not resolve to a compute job"));
            write_response(&mut stdout_handle, &resp).await?;
            continue;
        };

        let epoch_tdb_s = ephemeris_time::jd_to_tdb_seconds(job.epoch_tdb_jd);
        let Some(bundle) = selector.select(epoch_tdb_s) else {
            let resp = error_line(
                job_id,
                ApiError::new(ApiErrorCode::RangeEphemerisOutside, format!("epoch {} is outside every loaded bundle's coverage", job.epoch_tdb_jd)),
            );
            write_response(&mut stdout_handle, &resp).await?;
            continue;
        };

        let mut results = Vec::with_capacity(requests.len());
        let mut failed: Option<WireError> = None;
        for (name, compute_request) in &requests {
            match bundle.core.compute(compute_request) {
                Ok(result) => results.push(JobBodyResult {
                    name: name.clone(),
                    lon_deg: Some(result.lon_deg),
                    lat_deg: Some(result.lat_deg),
                    ra_hours: result.ra_hours,
                    dec_deg: result.dec_deg,
                    distance_au: result.distance_au,
                    observer_frame_used: observer_frame_used_str(result.provenance.observer_frame_used).to_string(),
                    ayanamsha_id: result.provenance.ayanamsha_id,
                    aberration_applied: result.provenance.aberration_applied,
                }),
                Err(e) => {
                    failed = Some(map_compute_error(&e).to_wire());
                    break;
                }
            }
        }

        let resp = match failed {
            Some(wire) => WireResponse { job_id, result: None, error: Some(serde_json::to_string(&wire).unwrap_or_else(|_| wire.detail)) },
            None => {
                let job_response = JobResponse { bundle_id: bundle.id.clone(), results };
                match serde_json::to_value(&job_response) {
                    Ok(value) => WireResponse { job_id, result: Some(value), error: None },
                    Err(e) => error_line(job_id, ApiError::new(ApiErrorCode::ComputeEphemerisError, e.to_string())),
                }
            }
        };
        write_response(&mut stdout_handle, &resp).await?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve { config } => {
            tracing_subscriber::fmt().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).json().init();
            serve(config).await
        }
        Commands::Worker { config } => worker(config).await,
    }
}
