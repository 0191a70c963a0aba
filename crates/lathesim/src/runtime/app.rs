use crate::runtime::config::RuntimeConfig;
use crate::runtime::logging::init_tracing;
use crate::runtime::telemetry;
use lathe_core::{LatheConfig, LatheSimulator, Poller, PollerConfig, ReadingExchange};
use lathe_io::bridge::{Bridge, BridgeConfig};
use lathe_io::sink::JsonLineSink;
use std::path::Path;
use std::sync::{atomic::AtomicBool, Arc};
use std::thread;
use std::time::Duration;
use tracing::{error, info};

pub fn run_from_args() {
    let config = RuntimeConfig::from_env();
    if config.show_help {
        RuntimeConfig::print_help();
        return;
    }
    run(config);
}

pub fn run(config: RuntimeConfig) {
    init_tracing(config.json_logs);
    telemetry::init();

    let _metrics_handle = telemetry::start_metrics_server(&config.metrics_addr);

    let lathe_config = match load_device_config(config.device_config.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            error!(error = %err, "invalid device configuration");
            std::process::exit(1);
        }
    };

    info!(
        name = %lathe_config.name,
        cycle_seconds = lathe_config.cycle_secs(),
        rpm = lathe_config.rpm,
        "lathe simulation configured"
    );

    let simulator = match LatheSimulator::new(lathe_config) {
        Ok(sim) => Arc::new(sim),
        Err(err) => {
            error!(error = %err, "invalid device configuration");
            std::process::exit(1);
        }
    };
    match config.seed {
        Some(seed) => simulator.start_seeded(seed),
        None => simulator.start(),
    }

    let exchange = Arc::new(ReadingExchange::new());
    let stop = Arc::new(AtomicBool::new(false));

    let mut poller = Poller::new(
        Arc::clone(&simulator),
        PollerConfig {
            poll_interval: config.poll_interval,
        },
        Arc::clone(&exchange),
    );
    if config.stdout_enabled {
        poller.add_sink(Box::new(JsonLineSink::new(std::io::stdout())));
    }

    info!(
        poll_interval_ms = config.poll_interval.as_millis() as u64,
        "starting poller"
    );
    let stop_poller = Arc::clone(&stop);
    let poller_handle = thread::spawn(move || {
        poller.run(&stop_poller);
        poller.stats().clone()
    });

    let bridge_handle = if config.bridge_enabled {
        let bridge_config = BridgeConfig {
            bind_addr: config.bind_addr.clone(),
            ..Default::default()
        };
        match Bridge::bind(bridge_config) {
            Ok(bridge) => {
                info!(addr = %config.bind_addr, "starting bridge");
                let exchange_bridge = Arc::clone(&exchange);
                let stop_bridge = Arc::clone(&stop);
                Some(thread::spawn(move || {
                    bridge.run(exchange_bridge, &stop_bridge)
                }))
            }
            Err(err) => {
                error!(error = %err, addr = %config.bind_addr, "failed to bind bridge");
                std::process::exit(1);
            }
        }
    } else {
        info!("bridge disabled");
        None
    };

    let updater_handle = telemetry::start_metrics_updater(Arc::clone(&exchange), Arc::clone(&stop));

    info!("lathesim running");

    if let Some(seconds) = config.run_seconds {
        info!(seconds, "running for limited duration");
        thread::sleep(Duration::from_secs(seconds));
        stop.store(true, std::sync::atomic::Ordering::Relaxed);

        let stats = poller_handle.join().unwrap();
        if let Some(handle) = bridge_handle {
            let _ = handle.join();
        }
        let _ = updater_handle.join();

        info!(
            polls = stats.polls,
            readings = stats.readings_emitted,
            poll_errors = stats.poll_errors,
            overruns = stats.overruns,
            max_lag_us = stats.max_lag_us,
            "run complete"
        );
    } else {
        let _ = poller_handle.join();
        if let Some(handle) = bridge_handle {
            let _ = handle.join();
        }
        let _ = updater_handle.join();
    }
}

fn load_device_config(path: Option<&Path>) -> Result<LatheConfig, Box<dyn std::error::Error>> {
    let Some(path) = path else {
        return Ok(LatheConfig::default());
    };
    let text = std::fs::read_to_string(path)?;
    let doc: serde_json::Value = serde_json::from_str(&text)?;
    Ok(LatheConfig::from_value(&doc)?)
}
