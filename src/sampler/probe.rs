use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Utc;
use sysinfo::{Disks, Networks, ProcessesToUpdate, System};
use tracing::warn;

use super::rpi;
use super::{
    CpuStats, DiskStats, InterfaceInfo, LoadAverages, MemoryStats, NetworkStats, ProcessInfo,
    Sample, SwapStats,
};

// ─── Probe ───────────────────────────────────────────────────────

/// Owns the `sysinfo` handles plus the cross-tick state needed to turn
/// cumulative counters into per-tick rates. One instance lives inside
/// the sampler task; nothing else touches it.
pub struct SystemProbe {
    sys: System,
    networks: Networks,
    disks: Disks,
    net_rates: RateTracker,
    last_tick: Instant,
    top_procs: usize,

    // Resolved once at construction; absent sources stay absent for
    // the process lifetime rather than being re-probed every tick.
    thermal_zone: Option<PathBuf>,
    throttle_enabled: bool,
}

impl SystemProbe {
    pub fn new(top_procs: usize) -> Self {
        let mut sys = System::new_all();
        // Prime the CPU counters; usage is a delta between refreshes.
        sys.refresh_cpu_usage();

        let thermal_zone = resolve_thermal_zone();
        if thermal_zone.is_none() {
            warn!("no readable thermal zone — temperature will be null");
        }

        let throttle_enabled = rpi::read_throttle().is_some();
        if !throttle_enabled {
            warn!("vcgencmd unavailable — throttle status will be null");
        }

        Self {
            sys,
            networks: Networks::new_with_refreshed_list(),
            disks: Disks::new_with_refreshed_list(),
            net_rates: RateTracker::new(),
            last_tick: Instant::now(),
            top_procs,
            thermal_zone,
            throttle_enabled,
        }
    }

    /// One probe cycle. Always returns a Sample; fields whose source
    /// cannot be read this tick come back as their sentinel instead of
    /// aborting the cycle.
    pub fn sample(&mut self) -> Sample {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_tick).as_secs_f64();
        self.last_tick = now;

        self.sys.refresh_cpu_usage();
        self.sys.refresh_memory();
        self.sys.refresh_processes(ProcessesToUpdate::All, true);
        self.networks.refresh(true);
        self.disks.refresh(true);

        let load = System::load_average();

        Sample {
            timestamp: Utc::now(),
            cpu: self.collect_cpu(),
            memory: self.collect_memory(),
            swap: self.collect_swap(),
            disk: collect_disk(&self.disks),
            network: self.collect_network(elapsed),
            temperature_c: self
                .thermal_zone
                .as_deref()
                .and_then(rpi::read_temp),
            throttle: if self.throttle_enabled {
                rpi::read_throttle()
            } else {
                None
            },
            uptime_secs: System::uptime(),
            load_avg: LoadAverages {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            },
            processes: collect_processes(&self.sys, self.top_procs),
        }
    }

    fn collect_cpu(&self) -> CpuStats {
        let per_core: Vec<f32> = self.sys.cpus().iter().map(|c| c.cpu_usage()).collect();
        CpuStats {
            percent: self.sys.global_cpu_usage(),
            frequency_mhz: self.sys.cpus().first().map(|c| c.frequency()).unwrap_or(0),
            count: per_core.len(),
            per_core,
        }
    }

    fn collect_memory(&self) -> MemoryStats {
        let total = self.sys.total_memory();
        let used = self.sys.used_memory();
        MemoryStats {
            total,
            used,
            available: self.sys.available_memory(),
            percent: percent(used, total),
        }
    }

    fn collect_swap(&self) -> SwapStats {
        let total = self.sys.total_swap();
        let used = self.sys.used_swap();
        SwapStats {
            total,
            used,
            percent: percent(used, total),
        }
    }

    fn collect_network(&mut self, elapsed_secs: f64) -> NetworkStats {
        let mut bytes_recv = 0u64;
        let mut bytes_sent = 0u64;
        let mut interfaces = Vec::new();

        for (name, data) in self.networks.iter() {
            bytes_recv += data.total_received();
            bytes_sent += data.total_transmitted();
            interfaces.push(InterfaceInfo {
                name: name.clone(),
                addrs: data.ip_networks().iter().map(|ip| ip.to_string()).collect(),
            });
        }
        interfaces.sort_by(|a, b| a.name.cmp(&b.name));

        let (rx_per_sec, tx_per_sec) = self.net_rates.rates(bytes_recv, bytes_sent, elapsed_secs);

        NetworkStats {
            bytes_sent,
            bytes_recv,
            tx_per_sec,
            rx_per_sec,
            interfaces,
        }
    }
}

// ─── Free collectors ─────────────────────────────────────────────

/// Root filesystem when mounted, otherwise the sum across disks
/// (containers and test rigs often have no `/` in the disk list).
fn collect_disk(disks: &Disks) -> DiskStats {
    let (total, available) = match disks.iter().find(|d| d.mount_point() == Path::new("/")) {
        Some(root) => (root.total_space(), root.available_space()),
        None => disks.iter().fold((0, 0), |(t, a), d| {
            (t + d.total_space(), a + d.available_space())
        }),
    };
    let used = total.saturating_sub(available);
    DiskStats {
        total,
        used,
        free: available,
        percent: percent(used, total),
    }
}

fn collect_processes(sys: &System, top_n: usize) -> Vec<ProcessInfo> {
    let total_mem = sys.total_memory();
    let mut procs: Vec<ProcessInfo> = sys
        .processes()
        .iter()
        .map(|(pid, p)| ProcessInfo {
            pid: pid.as_u32(),
            name: p.name().to_string_lossy().into_owned(),
            cpu_percent: p.cpu_usage(),
            mem_percent: percent(p.memory(), total_mem),
        })
        .collect();
    procs.sort_by(|a, b| {
        b.cpu_percent
            .partial_cmp(&a.cpu_percent)
            .unwrap_or(Ordering::Equal)
    });
    procs.truncate(top_n);
    procs
}

fn resolve_thermal_zone() -> Option<PathBuf> {
    let path = PathBuf::from(rpi::THERMAL_ZONE);
    rpi::read_temp(&path).map(|_| path)
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 * 100.0 / total as f64) as f32
    }
}

// ─── Rate tracking ───────────────────────────────────────────────

/// Turns cumulative interface counters into per-second rates by
/// retaining the previous tick's totals. The first observation has no
/// baseline and reports zero; a counter that moves backwards (interface
/// reset) also reports zero for that tick.
struct RateTracker {
    prev: Option<(u64, u64)>,
}

impl RateTracker {
    fn new() -> Self {
        Self { prev: None }
    }

    fn rates(&mut self, rx_total: u64, tx_total: u64, elapsed_secs: f64) -> (f64, f64) {
        let rates = match self.prev {
            Some((prev_rx, prev_tx)) if elapsed_secs > 0.0 => (
                rx_total.saturating_sub(prev_rx) as f64 / elapsed_secs,
                tx_total.saturating_sub(prev_tx) as f64 / elapsed_secs,
            ),
            _ => (0.0, 0.0),
        };
        self.prev = Some((rx_total, tx_total));
        rates
    }
}
