pub mod bridge;
pub mod metrics;
pub mod sink;

pub use bridge::{Bridge, BridgeConfig};
pub use metrics::{init_metrics, serve_metrics};
pub use sink::JsonLineSink;
