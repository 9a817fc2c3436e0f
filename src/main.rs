use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use conveyor::api::run_server;
use conveyor::config::EngineConfig;
use conveyor::engine::JobEngine;
use conveyor::shutdown::shutdown_token;

#[derive(Parser, Debug)]
#[command(name = "conveyor")]
#[command(version)]
#[command(about = "In-memory asynchronous job engine with backpressure, retries, and a DLQ")]
struct Args {
    /// Port to listen on for HTTP
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Number of worker slots in the pool
    #[arg(long, default_value = "3")]
    workers: usize,

    /// Admission queue capacity
    #[arg(long, default_value = "10")]
    queue_size: usize,

    /// Failed attempts before a job is moved to the DLQ
    #[arg(long, default_value = "3")]
    max_retries: u32,

    /// Injected failure probability per attempt (0.0 - 1.0)
    #[arg(long, default_value = "0.2")]
    failure_rate: f64,

    /// Scheduler tick interval in milliseconds
    #[arg(long, default_value = "100")]
    tick_ms: u64,

    /// Start the worker pool immediately instead of waiting for
    /// POST /workers/start
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let listen_addr = ([127, 0, 0, 1], args.port).into();
    let config = EngineConfig {
        worker_count: args.workers,
        max_queue_size: args.queue_size,
        max_retries: args.max_retries,
        failure_rate: args.failure_rate,
        tick_interval: Duration::from_millis(args.tick_ms),
        listen_addr,
    };

    tracing::info!(
        workers = config.worker_count,
        queue_size = config.max_queue_size,
        max_retries = config.max_retries,
        "Starting job engine"
    );

    let engine = JobEngine::new(config);

    if args.autostart {
        engine.start().await;
    }

    let shutdown = shutdown_token();

    run_server(listen_addr, engine.clone(), shutdown).await;

    // Server has drained; stop the scheduler before exiting.
    engine.stop().await;
}
