use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

/// Command-line configuration. Every flag can also be supplied through
/// the matching `PI_MONITOR_*` environment variable.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "pi-monitor",
    version,
    about = "Web dashboard serving live system stats and a bounded sample history"
)]
pub struct Config {
    /// Address the HTTP server binds to.
    #[arg(long, env = "PI_MONITOR_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Milliseconds between metric samples.
    #[arg(
        long,
        env = "PI_MONITOR_INTERVAL_MS",
        default_value_t = 1_000,
        value_parser = clap::value_parser!(u64).range(100..)
    )]
    pub interval_ms: u64,

    /// How many samples the history window retains.
    #[arg(
        long,
        env = "PI_MONITOR_HISTORY",
        default_value_t = 60,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub history: u64,

    /// How many top-CPU processes each sample carries.
    #[arg(long, env = "PI_MONITOR_TOP_PROCS", default_value_t = 10)]
    pub top_procs: u64,

    /// Directory the dashboard page is served from.
    #[arg(long, env = "PI_MONITOR_STATIC_DIR", default_value = "static")]
    pub static_dir: PathBuf,
}

impl Config {
    /// Sampling cadence as a [`Duration`].
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_dashboard_constants() {
        let cfg = Config::try_parse_from(["pi-monitor"]).unwrap();
        assert_eq!(cfg.interval_ms, 1_000);
        assert_eq!(cfg.history, 60);
        assert_eq!(cfg.top_procs, 10);
        assert_eq!(cfg.bind.port(), 5000);
    }

    #[test]
    fn zero_capacity_history_is_rejected() {
        assert!(Config::try_parse_from(["pi-monitor", "--history", "0"]).is_err());
    }

    #[test]
    fn sub_100ms_interval_is_rejected() {
        assert!(Config::try_parse_from(["pi-monitor", "--interval-ms", "50"]).is_err());
    }
}
