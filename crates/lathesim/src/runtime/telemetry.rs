use lathe_core::{Reading, ReadingBatch, ReadingExchange};
use lathe_io::metrics::{
    init_metrics, serve_metrics, CURRENT_MA, CUT_DEPTH, IR_GEARBOX_C, IR_HEADSTOCK_C, IR_MOTOR_C,
    IR_TAILSTOCK_C, IR_TOOL_C, POLLS_TOTAL, READINGS_TOTAL, SPEED_RPM, TOOL_X, VIBRATION_HZ,
    VIBRATION_RMS,
};
use std::sync::{atomic::AtomicBool, Arc};
use std::thread;
use std::time::Duration;
use tracing::info;

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "starting metrics server");
        serve_metrics(addr.clone())
    })
}

/// Mirror the latest reading batch onto the Prometheus gauges.
pub fn start_metrics_updater(
    exchange: Arc<ReadingExchange>,
    stop: Arc<AtomicBool>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut last_sequence = 0u64;
        while !stop.load(std::sync::atomic::Ordering::Relaxed) {
            if let Some(batch) = exchange.latest() {
                if batch.sequence > last_sequence {
                    POLLS_TOTAL.inc_by(batch.sequence - last_sequence);
                    last_sequence = batch.sequence;
                    READINGS_TOTAL.inc_by(batch.readings.len() as u64);
                    update_gauges(&batch);
                }
            }
            thread::sleep(Duration::from_millis(200));
        }
    })
}

fn update_gauges(batch: &ReadingBatch) {
    for reading in &batch.readings {
        if reading.asset.ends_with("Vibration") {
            set_if_present(reading, "rms", &VIBRATION_RMS);
            set_if_present(reading, "frequency", &VIBRATION_HZ);
        } else if reading.asset.ends_with("Current") {
            set_if_present(reading, "current", &CURRENT_MA);
        } else if reading.asset.ends_with("IR") {
            set_if_present(reading, "gearbox", &IR_GEARBOX_C);
            set_if_present(reading, "motor", &IR_MOTOR_C);
            set_if_present(reading, "headstock", &IR_HEADSTOCK_C);
            set_if_present(reading, "tailstock", &IR_TAILSTOCK_C);
            set_if_present(reading, "tool", &IR_TOOL_C);
        } else {
            set_if_present(reading, "rpm", &SPEED_RPM);
            set_if_present(reading, "x", &TOOL_X);
            set_if_present(reading, "depth", &CUT_DEPTH);
        }
    }
}

fn set_if_present(reading: &Reading, field: &str, gauge: &prometheus::Gauge) {
    if let Some(value) = reading.float(field) {
        gauge.set(value);
    }
}
