use crate::config::LatheConfig;
use crate::phase::Phase;
use rand::rngs::StdRng;
use rand::Rng;

// Ambient baselines for the five thermal points, in °C.
const GEARBOX_BASELINE_C: f64 = 25.4;
const MOTOR_BASELINE_C: f64 = 27.6;
const HEADSTOCK_BASELINE_C: f64 = 24.0;
const TAILSTOCK_BASELINE_C: f64 = 20.5;
const TOOL_BASELINE_C: f64 = 18.0;

/// One frame from the infrared camera pointed at the lathe: two drive-train
/// points, two housing points and the tool tip.
#[derive(Debug, Clone, Copy)]
pub struct IrSample {
    pub gearbox: f64,
    pub motor: f64,
    pub headstock: f64,
    pub tailstock: f64,
    pub tool: f64,
}

/// Compute one thermal frame for the current phase.
///
/// Drive-train temperatures jitter widest around spin-up, accumulate drift
/// proportional to elapsed cutting time while the tool is engaged, and trend
/// upward (positive-only noise) during spin-down while residual heat is
/// still dissipating.
pub fn sample(
    phase: Phase,
    offset_ms: u64,
    config: &LatheConfig,
    rng: &mut StdRng,
) -> IrSample {
    let mut gearbox = GEARBOX_BASELINE_C;
    let mut motor = MOTOR_BASELINE_C;
    let mut headstock = HEADSTOCK_BASELINE_C;
    let mut tailstock = TAILSTOCK_BASELINE_C;
    let mut tool = TOOL_BASELINE_C;

    match phase {
        Phase::Idle => {
            gearbox += rng.gen_range(0..500) as f64 / 200.0 - 1.25;
            motor += rng.gen_range(0..500) as f64 / 200.0 - 1.25;
            headstock += rng.gen_range(0..200) as f64 / 100.0 - 1.0;
            tailstock += rng.gen_range(0..200) as f64 / 100.0 - 1.0;
            tool += rng.gen_range(0..200) as f64 / 100.0 - 1.0;
        }
        Phase::SpinningUp => {
            gearbox += rng.gen_range(0..500) as f64 / 100.0 - 2.5;
            motor += rng.gen_range(0..500) as f64 / 100.0 - 2.5;
            headstock += rng.gen_range(0..200) as f64 / 100.0 - 1.0;
            tailstock += rng.gen_range(0..200) as f64 / 150.0 - 1.0;
            tool += rng.gen_range(0..200) as f64 / 100.0 - 1.0;
            gearbox += offset_ms as f64 / 2500.0;
            motor += offset_ms as f64 / 2000.0;
        }
        Phase::Cutting => {
            let cut_ms = (offset_ms - config.spinup_end_ms()) as f64;
            gearbox += cut_ms / 8000.0;
            motor += cut_ms / 10_000.0;
            tool += cut_ms / 4000.0;
            tool += rng.gen_range(0..600) as f64 / 100.0 - 3.0;
            headstock += rng.gen_range(0..200) as f64 / 100.0;
            tailstock += rng.gen_range(0..200) as f64 / 150.0;
        }
        Phase::SpinningDown => {
            gearbox += rng.gen_range(0..500) as f64 / 400.0;
            motor += rng.gen_range(0..500) as f64 / 400.0;
        }
    }

    IrSample {
        gearbox,
        motor,
        headstock,
        tailstock,
        tool,
    }
}
