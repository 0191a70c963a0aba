use crate::clock::{self, CycleClock};
use crate::config::{ConfigError, LatheConfig};
use crate::device::{Device, DeviceError};
use crate::phase::PhaseModel;
use crate::reading::Reading;
use crate::thermal;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Mutex;

struct Inner {
    config: LatheConfig,
    clock: Option<CycleClock>,
    rng: Option<StdRng>,
    model: PhaseModel,
    /// Alternating-emission gate for the vibration group. Initialised to
    /// suppress the first poll.
    send_vibration: bool,
    /// Wall-clock second of the last infrared emission.
    last_ir_second: Option<u64>,
}

/// A simulated lathe.
///
/// Configuration and run state live behind one mutex; `poll` and
/// `reconfigure` hold it for their full duration, so a reconfiguration that
/// completes before a poll is always observed by that poll, and concurrent
/// pollers cannot tear the emission gates. The emission gates are owned per
/// instance, so several simulated lathes can run in one process without
/// interfering.
pub struct LatheSimulator {
    inner: Mutex<Inner>,
}

impl LatheSimulator {
    /// Construct a simulator from a validated configuration.
    pub fn new(config: LatheConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "lathe simulation '{}' cycle time {}s",
            config.name,
            config.cycle_secs()
        );
        Ok(Self {
            inner: Mutex::new(Inner {
                config,
                clock: None,
                rng: None,
                model: PhaseModel::new(),
                send_vibration: false,
                last_ir_second: None,
            }),
        })
    }

    /// Begin the simulation run: capture the cycle epoch and seed the noise
    /// source from entropy. Calling again restarts the cycle from zero.
    pub fn start(&self) {
        self.start_with(StdRng::from_entropy());
    }

    /// As `start`, but with a fixed seed for reproducible runs.
    pub fn start_seeded(&self, seed: u64) {
        self.start_with(StdRng::seed_from_u64(seed));
    }

    fn start_with(&self, rng: StdRng) {
        let mut inner = self.inner.lock().unwrap();
        log::debug!("lathe simulation starting");
        inner.clock = Some(CycleClock::new());
        inner.rng = Some(rng);
    }

    /// Take one set of readings.
    ///
    /// Always produces the machine and current groups, in that order. The
    /// vibration group joins on every other call and the infrared group at
    /// most once per wall-clock second; both gates persist across polls,
    /// nothing else is cached.
    pub fn poll(&self) -> Result<Vec<Reading>, DeviceError> {
        let mut guard = self.inner.lock().unwrap();
        let inner = &mut *guard;
        let lathe_clock = inner.clock.as_ref().ok_or(DeviceError::NotStarted)?;
        let rng = inner.rng.as_mut().ok_or(DeviceError::NotStarted)?;

        let offset_ms = lathe_clock.offset_ms(inner.config.cycle_ms());
        let sample = inner.model.sample(offset_ms, &inner.config, rng);
        log::debug!("lathe simulation state {}", sample.phase.label());

        let ts_ms = clock::unix_ms();
        let mut readings = Vec::with_capacity(4);

        readings.push(
            Reading::new(inner.config.name.clone(), ts_ms)
                .with("rpm", sample.speed_rpm)
                .with("x", sample.tool_x)
                .with("depth", sample.cut_depth)
                .with("state", sample.phase.label()),
        );

        readings.push(
            Reading::new(format!("{}Current", inner.config.name), ts_ms)
                .with("current", sample.current_ma),
        );

        // The vibration sensor reports at half the primary cadence.
        if inner.send_vibration {
            readings.push(
                Reading::new(format!("{}Vibration", inner.config.name), ts_ms)
                    .with("rms", sample.vibration_rms)
                    .with("frequency", sample.vibration_hz),
            );
        }
        inner.send_vibration = !inner.send_vibration;

        // The infrared camera frames once a second regardless of poll rate.
        let second = clock::unix_seconds();
        if inner.last_ir_second != Some(second) {
            inner.last_ir_second = Some(second);
            let frame = thermal::sample(sample.phase, offset_ms, &inner.config, rng);
            readings.push(
                Reading::new(format!("{}IR", inner.config.name), ts_ms)
                    .with("gearbox", frame.gearbox)
                    .with("motor", frame.motor)
                    .with("headstock", frame.headstock)
                    .with("tailstock", frame.tailstock)
                    .with("tool", frame.tool),
            );
        }

        Ok(readings)
    }

    /// Atomically replace the configuration.
    ///
    /// The cycle epoch is left untouched: the running timeline is simply
    /// reinterpreted under the new phase durations, which may move the
    /// simulation to a different phase in one step.
    pub fn reconfigure(&self, config: LatheConfig) -> Result<(), ConfigError> {
        config.validate()?;
        let mut inner = self.inner.lock().unwrap();
        log::info!(
            "lathe simulation '{}' cycle time {}s",
            config.name,
            config.cycle_secs()
        );
        inner.config = config;
        Ok(())
    }

    /// Drop run state. Further polls fail with `NotStarted` until the next
    /// `start`.
    pub fn shutdown(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.clock = None;
        inner.rng = None;
        log::debug!("lathe simulation stopped");
    }
}

impl Device for LatheSimulator {
    fn poll(&self) -> Result<Vec<Reading>, DeviceError> {
        LatheSimulator::poll(self)
    }

    fn shutdown(&self) {
        LatheSimulator::shutdown(self)
    }
}
