pub mod probe;
pub mod rpi;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::history::HistoryBuffer;
use probe::SystemProbe;
pub use rpi::ThrottleStatus;

// ─── Sample model ────────────────────────────────────────────────

/// One timestamped snapshot of system metrics. Immutable once built;
/// handlers only ever see clones pulled out of the history buffer.
#[derive(Debug, Clone, Serialize)]
pub struct Sample {
    pub timestamp: DateTime<Utc>,
    pub cpu: CpuStats,
    pub memory: MemoryStats,
    pub swap: SwapStats,
    pub disk: DiskStats,
    pub network: NetworkStats,
    /// `None` when no temperature source is readable on this host.
    pub temperature_c: Option<f32>,
    /// Firmware throttling flags; `None` off-Pi where `vcgencmd` is absent.
    pub throttle: Option<ThrottleStatus>,
    pub uptime_secs: u64,
    pub load_avg: LoadAverages,
    /// Top-N processes by CPU, hottest first.
    pub processes: Vec<ProcessInfo>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CpuStats {
    /// Overall usage across all cores, 0–100.
    pub percent: f32,
    pub per_core: Vec<f32>,
    pub frequency_mhz: u64,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MemoryStats {
    pub total: u64,
    pub used: u64,
    pub available: u64,
    pub percent: f32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SwapStats {
    pub total: u64,
    pub used: u64,
    pub percent: f32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DiskStats {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f32,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct NetworkStats {
    /// Cumulative counters since boot, summed across interfaces.
    pub bytes_sent: u64,
    pub bytes_recv: u64,
    /// Per-second rates over the last tick.
    pub tx_per_sec: f64,
    pub rx_per_sec: f64,
    pub interfaces: Vec<InterfaceInfo>,
}

#[derive(Debug, Clone, Serialize)]
pub struct InterfaceInfo {
    pub name: String,
    pub addrs: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadAverages {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
    pub cpu_percent: f32,
    pub mem_percent: f32,
}

// ─── Sampling loop ───────────────────────────────────────────────

/// Runs for the lifetime of the process: one probe cycle per tick,
/// each producing exactly one `Sample` appended to the history.
///
/// A metric that cannot be read degrades its field (see `SystemProbe`);
/// nothing in here is allowed to abort the loop.
pub async fn run_sampler(history: Arc<HistoryBuffer>, tick: Duration, top_procs: usize) {
    let mut probe = SystemProbe::new(top_procs);
    let mut ticker = tokio::time::interval(tick);

    loop {
        ticker.tick().await;
        let sample = probe.sample();
        tracing::trace!(
            cpu = sample.cpu.percent,
            mem = sample.memory.percent,
            "sampled"
        );
        history.append(sample);
    }
}

// ─── Test helpers ────────────────────────────────────────────────
