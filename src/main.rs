use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod config;
mod history;
mod middleware;
mod sampler;
mod server;

use config::Config;
use history::HistoryBuffer;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Bounded sample history — the sampler task writes, handlers read snapshots.
    pub history: Arc<HistoryBuffer>,

    /// Sampling cadence; the SSE stream pushes at the same rate.
    pub tick: Duration,
}

#[tokio::main]
async fn main() {
    let cfg = Config::parse();

    // RUST_LOG controls verbosity (default: info).
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    println!();
    println!("╔══════════════════════════════════════════════════╗");
    println!("║   🍓  RASPBERRY PI SYSTEM OBSERVATORY            ║");
    println!("╚══════════════════════════════════════════════════╝");
    println!();

    // ── 1. Build shared state ────────────────────────────────────
    let history = Arc::new(HistoryBuffer::new(cfg.history as usize));
    let state = Arc::new(AppState {
        history: Arc::clone(&history),
        tick: cfg.tick(),
    });

    // ── 2. Spawn the sampler loop ────────────────────────────────
    tokio::spawn(sampler::run_sampler(
        history,
        cfg.tick(),
        cfg.top_procs as usize,
    ));

    // ── 3. Build Axum router ─────────────────────────────────────
    let app = server::create_router(state, &cfg.static_dir);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(cfg.bind)
        .await
        .expect("Failed to bind — is the port already in use?");

    println!("Server listening on http://{}", cfg.bind);
    println!("Dashboard       → http://{}/", cfg.bind);
    println!("Stats JSON      → http://{}/api/stats", cfg.bind);
    println!("History JSON    → http://{}/api/history", cfg.bind);
    println!("Stats SSE       → http://{}/api/stats/stream", cfg.bind);
    println!();

    axum::serve(listener, app)
        .await
        .expect("Server exited with error");
}
