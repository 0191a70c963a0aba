//! Prometheus metrics for the lathe simulation.
//!
//! Gauges track the most recently emitted value of every sensor field;
//! counters track poll and reading volume.

use prometheus::{Encoder, Gauge, IntCounter, Registry, TextEncoder};
use std::sync::LazyLock;
use std::thread;
use tiny_http::{Response, Server};

/// Global metrics registry
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn gauge(name: &str, help: &str) -> Gauge {
    let gauge = Gauge::new(name, help).unwrap();
    REGISTRY.register(Box::new(gauge.clone())).unwrap();
    gauge
}

fn counter(name: &str, help: &str) -> IntCounter {
    let counter = IntCounter::new(name, help).unwrap();
    REGISTRY.register(Box::new(counter.clone())).unwrap();
    counter
}

// ============================================================================
// Poll Volume
// ============================================================================

/// Total polls taken from the simulator
pub static POLLS_TOTAL: LazyLock<IntCounter> =
    LazyLock::new(|| counter("lathesim_polls_total", "Total polls taken from the simulator"));

/// Total measurement groups emitted
pub static READINGS_TOTAL: LazyLock<IntCounter> = LazyLock::new(|| {
    counter(
        "lathesim_readings_total",
        "Total measurement groups emitted across all polls",
    )
});

// ============================================================================
// Machine State
// ============================================================================

/// Spindle speed from the latest machine group
pub static SPEED_RPM: LazyLock<Gauge> =
    LazyLock::new(|| gauge("lathesim_speed_rpm", "Spindle speed in RPM"));

/// Lateral tool position
pub static TOOL_X: LazyLock<Gauge> =
    LazyLock::new(|| gauge("lathesim_tool_x", "Lateral tool position"));

/// Cutting depth
pub static CUT_DEPTH: LazyLock<Gauge> =
    LazyLock::new(|| gauge("lathesim_cut_depth_mm", "Cutting depth in millimetres"));

/// Current draw
pub static CURRENT_MA: LazyLock<Gauge> =
    LazyLock::new(|| gauge("lathesim_current_milliamps", "Current draw in milliamps"));

// ============================================================================
// Vibration
// ============================================================================

/// Vibration RMS amplitude
pub static VIBRATION_RMS: LazyLock<Gauge> =
    LazyLock::new(|| gauge("lathesim_vibration_rms", "Vibration RMS amplitude"));

/// Vibration peak frequency
pub static VIBRATION_HZ: LazyLock<Gauge> = LazyLock::new(|| {
    gauge(
        "lathesim_vibration_frequency_hz",
        "Vibration peak frequency in Hz",
    )
});

// ============================================================================
// Infrared Points
// ============================================================================

/// Gearbox temperature
pub static IR_GEARBOX_C: LazyLock<Gauge> =
    LazyLock::new(|| gauge("lathesim_ir_gearbox_celsius", "Gearbox temperature in °C"));

/// Motor temperature
pub static IR_MOTOR_C: LazyLock<Gauge> =
    LazyLock::new(|| gauge("lathesim_ir_motor_celsius", "Motor temperature in °C"));

/// Headstock temperature
pub static IR_HEADSTOCK_C: LazyLock<Gauge> = LazyLock::new(|| {
    gauge(
        "lathesim_ir_headstock_celsius",
        "Headstock temperature in °C",
    )
});

/// Tailstock temperature
pub static IR_TAILSTOCK_C: LazyLock<Gauge> = LazyLock::new(|| {
    gauge(
        "lathesim_ir_tailstock_celsius",
        "Tailstock temperature in °C",
    )
});

/// Tool tip temperature
pub static IR_TOOL_C: LazyLock<Gauge> =
    LazyLock::new(|| gauge("lathesim_ir_tool_celsius", "Tool tip temperature in °C"));

// ============================================================================
// Bridge
// ============================================================================

/// Bridge client connection status (1 = connected, 0 = disconnected)
pub static BRIDGE_CONNECTED: LazyLock<Gauge> = LazyLock::new(|| {
    gauge(
        "lathesim_bridge_connected",
        "Bridge client connection status (1=connected, 0=disconnected)",
    )
});

// ============================================================================
// Metrics HTTP Server
// ============================================================================

/// Start the metrics HTTP server on the given address.
/// Returns a join handle for the server thread.
pub fn serve_metrics(bind_addr: String) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let server = match Server::http(&bind_addr) {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("failed to start metrics server on {}: {}", bind_addr, e);
                return;
            }
        };

        tracing::info!("metrics server listening on http://{}/metrics", bind_addr);

        for request in server.incoming_requests() {
            match request.url() {
                "/metrics" => {
                    let encoder = TextEncoder::new();
                    let metric_families = REGISTRY.gather();
                    let mut buffer = Vec::new();

                    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
                        tracing::warn!("failed to encode metrics: {}", e);
                        let _ = request.respond(
                            Response::from_string("Internal Server Error").with_status_code(500),
                        );
                        continue;
                    }

                    let response = Response::from_data(buffer).with_header(
                        tiny_http::Header::from_bytes(
                            &b"Content-Type"[..],
                            &b"text/plain; version=0.0.4"[..],
                        )
                        .unwrap(),
                    );
                    let _ = request.respond(response);
                }
                "/health" => {
                    let _ = request.respond(Response::from_string("OK"));
                }
                "/ready" => {
                    // Ready once the poller has taken at least one reading
                    if POLLS_TOTAL.get() > 0 {
                        let _ = request.respond(Response::from_string("Ready"));
                    } else {
                        let _ = request
                            .respond(Response::from_string("Not Ready").with_status_code(503));
                    }
                }
                _ => {
                    let _ =
                        request.respond(Response::from_string("Not Found").with_status_code(404));
                }
            }
        }
    })
}

/// Initialize all metrics (forces lazy initialization)
pub fn init_metrics() {
    let _ = POLLS_TOTAL.get();
    let _ = READINGS_TOTAL.get();
    let _ = SPEED_RPM.get();
    let _ = TOOL_X.get();
    let _ = CUT_DEPTH.get();
    let _ = CURRENT_MA.get();
    let _ = VIBRATION_RMS.get();
    let _ = VIBRATION_HZ.get();
    let _ = IR_GEARBOX_C.get();
    let _ = IR_MOTOR_C.get();
    let _ = IR_HEADSTOCK_C.get();
    let _ = IR_TAILSTOCK_C.get();
    let _ = IR_TOOL_C.get();
    let _ = BRIDGE_CONNECTED.get();
}
