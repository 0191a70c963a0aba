use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub show_help: bool,
    pub run_seconds: Option<u64>,
    pub poll_interval: Duration,
    pub device_config: Option<PathBuf>,
    pub seed: Option<u64>,
    pub bind_addr: String,
    pub bridge_enabled: bool,
    pub stdout_enabled: bool,
    pub json_logs: bool,
    pub metrics_addr: Option<String>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            show_help: false,
            run_seconds: None,
            poll_interval: Duration::from_millis(500),
            device_config: None,
            seed: None,
            bind_addr: "127.0.0.1:7878".to_string(),
            bridge_enabled: true,
            stdout_enabled: true,
            json_logs: false,
            metrics_addr: None,
        }
    }
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self::from_args(&args)
    }

    pub fn from_args(args: &[String]) -> Self {
        let mut cfg = RuntimeConfig::default();
        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--run-seconds" => {
                    if i + 1 < args.len() {
                        cfg.run_seconds = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--poll-interval-ms" => {
                    if i + 1 < args.len() {
                        if let Ok(ms) = args[i + 1].parse::<u64>() {
                            cfg.poll_interval = Duration::from_millis(ms.max(1));
                        }
                        i += 1;
                    }
                }
                "--device-config" => {
                    if i + 1 < args.len() {
                        cfg.device_config = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--seed" => {
                    if i + 1 < args.len() {
                        cfg.seed = args[i + 1].parse::<u64>().ok();
                        i += 1;
                    }
                }
                "--bind" => {
                    if i + 1 < args.len() {
                        cfg.bind_addr = args[i + 1].clone();
                        i += 1;
                    }
                }
                "--no-bridge" => {
                    cfg.bridge_enabled = false;
                }
                "--no-stdout" => {
                    cfg.stdout_enabled = false;
                }
                "--json-logs" => {
                    cfg.json_logs = true;
                }
                "--metrics-addr" => {
                    if i + 1 < args.len() {
                        cfg.metrics_addr = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--help" | "-h" => {
                    cfg.show_help = true;
                    break;
                }
                _ => {}
            }
            i += 1;
        }
        cfg
    }

    pub fn print_help() {
        println!(
            r#"lathesim - Simulated lathe telemetry source

USAGE:
    lathesim [OPTIONS]

OPTIONS:
    --device-config <PATH>  JSON device configuration (name, spinup, runtime,
                            spindown, idletime, rpm, current)
    --poll-interval-ms <MS> Interval between polls [default: 500]
    --run-seconds <SECS>    Run for a fixed duration then exit
    --seed <N>              Seed the noise source for a reproducible run
    --bind <ADDR>           Bridge TCP bind address [default: 127.0.0.1:7878]
    --no-bridge             Disable the TCP bridge
    --no-stdout             Do not write readings to stdout
    --json-logs             Output logs in JSON format (for log aggregation)
    --metrics-addr <ADDR>   Enable Prometheus metrics server on address (e.g., 0.0.0.0:9090)
    -h, --help              Print this help message

ENVIRONMENT VARIABLES:
    RUST_LOG                Set log filter (e.g., RUST_LOG=debug,lathesim=trace)

EXAMPLES:
    # Stream readings to stdout at 4 Hz
    lathesim --no-bridge --poll-interval-ms 250

    # Serve a collector over TCP with metrics
    lathesim --no-stdout --bind 0.0.0.0:7878 --metrics-addr 0.0.0.0:9090

    # Short reproducible test run
    lathesim --run-seconds 10 --seed 42 --no-bridge
"#
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        std::iter::once("lathesim")
            .chain(list.iter().copied())
            .map(String::from)
            .collect()
    }

    #[test]
    fn defaults_without_flags() {
        let cfg = RuntimeConfig::from_args(&args(&[]));
        assert!(!cfg.show_help);
        assert!(cfg.bridge_enabled);
        assert!(cfg.stdout_enabled);
        assert!(!cfg.json_logs);
        assert_eq!(cfg.poll_interval, Duration::from_millis(500));
        assert_eq!(cfg.bind_addr, "127.0.0.1:7878");
        assert!(cfg.run_seconds.is_none());
        assert!(cfg.device_config.is_none());
        assert!(cfg.seed.is_none());
        assert!(cfg.metrics_addr.is_none());
    }

    #[test]
    fn parses_all_flags() {
        let cfg = RuntimeConfig::from_args(&args(&[
            "--run-seconds",
            "10",
            "--poll-interval-ms",
            "250",
            "--seed",
            "42",
            "--device-config",
            "/etc/lathesim/device.json",
            "--bind",
            "0.0.0.0:9000",
            "--no-bridge",
            "--no-stdout",
            "--json-logs",
            "--metrics-addr",
            "0.0.0.0:9090",
        ]));
        assert_eq!(cfg.run_seconds, Some(10));
        assert_eq!(cfg.poll_interval, Duration::from_millis(250));
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(
            cfg.device_config,
            Some(PathBuf::from("/etc/lathesim/device.json"))
        );
        assert_eq!(cfg.bind_addr, "0.0.0.0:9000");
        assert!(!cfg.bridge_enabled);
        assert!(!cfg.stdout_enabled);
        assert!(cfg.json_logs);
        assert_eq!(cfg.metrics_addr.as_deref(), Some("0.0.0.0:9090"));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let cfg = RuntimeConfig::from_args(&args(&["--poll-interval-ms", "0"]));
        assert_eq!(cfg.poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn unknown_flags_are_ignored() {
        let cfg = RuntimeConfig::from_args(&args(&["--frobnicate", "--seed", "7"]));
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn help_flag_short_circuits() {
        let cfg = RuntimeConfig::from_args(&args(&["-h", "--seed", "7"]));
        assert!(cfg.show_help);
        assert!(cfg.seed.is_none());
    }
}
