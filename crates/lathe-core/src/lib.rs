pub mod clock;
pub mod config;
pub mod device;
pub mod exchange;
pub mod phase;
pub mod poller;
pub mod reading;
pub mod simulator;
pub mod thermal;

pub use clock::CycleClock;
pub use config::{ConfigError, LatheConfig};
pub use device::{Device, DeviceError};
pub use exchange::{ReadingBatch, ReadingExchange};
pub use phase::{Phase, PhaseModel, PhaseSample};
pub use poller::{Poller, PollerConfig, PollerStats, ReadingSink};
pub use reading::{Datapoint, DatapointValue, Reading};
pub use simulator::LatheSimulator;
pub use thermal::IrSample;
