use crate::config::LatheConfig;
use rand::rngs::StdRng;
use rand::Rng;

/// Tool depth reading when fully retracted, and the ceiling it cuts from.
pub const MAX_CUT_DEPTH: f64 = 40.0;

/// Current draw floor when the spindle is at rest, in milliamps.
const IDLE_CURRENT_MA: f64 = 150.0;

/// Vibration RMS base amplitude while the tool is in contact.
const CUTTING_RMS_BASE: f64 = 1000.0;

/// Motor inrush current decays to zero over this window after power-on.
const INRUSH_WINDOW_MS: u64 = 1500;

/// Discrete operating mode of the lathe, derived purely from the cycle
/// offset. One cycle runs SpinningUp → Cutting → SpinningDown → Idle and
/// repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    SpinningUp,
    Cutting,
    SpinningDown,
    Idle,
}

impl Phase {
    /// Human-readable phase name carried in the machine reading group.
    pub fn label(&self) -> &'static str {
        match self {
            Phase::SpinningUp => "Spinning Up",
            Phase::Cutting => "Cutting",
            Phase::SpinningDown => "Spinning Down",
            Phase::Idle => "Idle",
        }
    }
}

/// Derive the active phase from a cycle offset.
///
/// Phase intervals are contiguous and exhaustive over `[0, cycle_ms)`.
pub fn phase_at(offset_ms: u64, config: &LatheConfig) -> Phase {
    if offset_ms < config.spinup_end_ms() {
        Phase::SpinningUp
    } else if offset_ms < config.cutting_end_ms() {
        Phase::Cutting
    } else if offset_ms < config.spindown_end_ms() {
        Phase::SpinningDown
    } else {
        Phase::Idle
    }
}

/// One poll's worth of derived quantities.
#[derive(Debug, Clone, Copy)]
pub struct PhaseSample {
    pub phase: Phase,
    pub speed_rpm: f64,
    pub current_ma: f64,
    pub vibration_rms: f64,
    pub vibration_hz: f64,
    /// Lateral tool position relative to the cut origin.
    pub tool_x: f64,
    /// Distance from tool tip to the workpiece centre line.
    pub cut_depth: f64,
}

/// Per-phase numeric model.
///
/// Everything is recomputed from the cycle offset on every call; the only
/// state carried between polls is the lateral tool position, which walks
/// back and forth across the workpiece during a cut.
#[derive(Debug, Clone, Default)]
pub struct PhaseModel {
    tool_x: f64,
}

impl PhaseModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample(
        &mut self,
        offset_ms: u64,
        config: &LatheConfig,
        rng: &mut StdRng,
    ) -> PhaseSample {
        let phase = phase_at(offset_ms, config);
        let rpm = f64::from(config.rpm);
        let nominal_ma = f64::from(config.current_ma);

        match phase {
            Phase::SpinningUp => {
                // Speed ramps linearly to nominal across the whole phase;
                // inrush current decays away over the first 1.5 seconds.
                let inrush = if offset_ms < INRUSH_WINDOW_MS {
                    (INRUSH_WINDOW_MS - offset_ms) as f64 / 10.0
                } else {
                    0.0
                };
                self.tool_x = 0.0;
                PhaseSample {
                    phase,
                    speed_rpm: rpm * offset_ms as f64 / config.spinup_end_ms() as f64,
                    current_ma: nominal_ma + inrush,
                    vibration_rms: offset_ms as f64 / config.spinup_secs as f64,
                    vibration_hz: rpm / 60.0,
                    tool_x: self.tool_x,
                    cut_depth: MAX_CUT_DEPTH,
                }
            }
            Phase::Cutting => {
                let elapsed_cut_ms = offset_ms - config.spinup_end_ms();
                let remaining_secs = config.runtime_secs.saturating_sub(elapsed_cut_ms / 1000);
                // The tool walks one step per poll, reversing direction each
                // quarter of the cut.
                let quarter = elapsed_cut_ms * 4 / (config.runtime_secs * 1000);
                if quarter % 2 == 1 {
                    self.tool_x -= 1.0;
                } else {
                    self.tool_x += 1.0;
                }
                let jitter_pct = rng.gen_range(-5i64..=5) as f64;
                PhaseSample {
                    phase,
                    speed_rpm: rpm * (100.0 + jitter_pct) / 100.0,
                    current_ma: nominal_ma + rng.gen_range(0..50) as f64,
                    // Vibration swings hardest at first contact and settles
                    // as the cut approaches completion.
                    vibration_rms: CUTTING_RMS_BASE
                        + rng.gen_range(-10i64..=10) as f64 * remaining_secs as f64,
                    // Cutting contact excites the fourth harmonic.
                    vibration_hz: 4.0 * rpm / 60.0,
                    tool_x: self.tool_x,
                    cut_depth: MAX_CUT_DEPTH - (self.tool_x / 5.0).sin().abs() * 30.0,
                }
            }
            Phase::SpinningDown => {
                let down_ms = offset_ms - config.cutting_end_ms();
                let spindown_ms = (config.spindown_end_ms() - config.cutting_end_ms()) as f64;
                self.tool_x = 0.0;
                PhaseSample {
                    phase,
                    speed_rpm: rpm * (1.0 - down_ms as f64 / spindown_ms),
                    // Hyperbolic decay from nominal toward the idle floor.
                    current_ma: IDLE_CURRENT_MA + nominal_ma / (1.0 + down_ms as f64),
                    vibration_rms: CUTTING_RMS_BASE,
                    vibration_hz: rpm / 60.0,
                    tool_x: self.tool_x,
                    cut_depth: MAX_CUT_DEPTH,
                }
            }
            Phase::Idle => {
                self.tool_x = 0.0;
                PhaseSample {
                    phase,
                    speed_rpm: 0.0,
                    current_ma: IDLE_CURRENT_MA,
                    vibration_rms: 0.0,
                    vibration_hz: 0.0,
                    tool_x: self.tool_x,
                    cut_depth: MAX_CUT_DEPTH,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn config() -> LatheConfig {
        LatheConfig::default()
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn phase_labels() {
        assert_eq!(Phase::SpinningUp.label(), "Spinning Up");
        assert_eq!(Phase::Cutting.label(), "Cutting");
        assert_eq!(Phase::SpinningDown.label(), "Spinning Down");
        assert_eq!(Phase::Idle.label(), "Idle");
    }

    #[test]
    fn phase_boundaries_are_contiguous() {
        let config = config();
        assert_eq!(phase_at(0, &config), Phase::SpinningUp);
        assert_eq!(phase_at(4_999, &config), Phase::SpinningUp);
        assert_eq!(phase_at(5_000, &config), Phase::Cutting);
        assert_eq!(phase_at(34_999, &config), Phase::Cutting);
        assert_eq!(phase_at(35_000, &config), Phase::SpinningDown);
        assert_eq!(phase_at(39_999, &config), Phase::SpinningDown);
        assert_eq!(phase_at(40_000, &config), Phase::Idle);
        assert_eq!(phase_at(54_999, &config), Phase::Idle);
    }

    #[test]
    fn phase_is_monotonic_within_one_cycle() {
        let config = config();
        let mut last = Phase::SpinningUp;
        for offset in (0..config.cycle_ms()).step_by(100) {
            let phase = phase_at(offset, &config);
            assert!(phase >= last, "phase went backwards at offset {offset}");
            last = phase;
        }
    }

    #[test]
    fn cycle_start_is_at_rest() {
        let sample = PhaseModel::new().sample(0, &config(), &mut rng());
        assert_eq!(sample.phase, Phase::SpinningUp);
        assert_eq!(sample.speed_rpm, 0.0);
        assert_eq!(sample.tool_x, 0.0);
        assert_eq!(sample.cut_depth, MAX_CUT_DEPTH);
    }

    #[test]
    fn spinup_speed_ramps_linearly() {
        // Half way through a 5s spinup at 1000 rpm the ramp reads 500.
        let sample = PhaseModel::new().sample(2_500, &config(), &mut rng());
        assert_eq!(sample.phase, Phase::SpinningUp);
        assert_eq!(sample.speed_rpm, 500.0);
    }

    #[test]
    fn spinup_inrush_decays_to_zero() {
        let config = config();
        let mut model = PhaseModel::new();
        let at_start = model.sample(0, &config, &mut rng());
        assert_eq!(at_start.current_ma, 1_500.0 + 150.0);
        let mid_window = model.sample(1_000, &config, &mut rng());
        assert_eq!(mid_window.current_ma, 1_500.0 + 50.0);
        let after_window = model.sample(2_000, &config, &mut rng());
        assert_eq!(after_window.current_ma, 1_500.0);
    }

    #[test]
    fn spinup_vibration_ramps_to_base() {
        let config = config();
        let mut model = PhaseModel::new();
        assert_eq!(model.sample(0, &config, &mut rng()).vibration_rms, 0.0);
        let near_end = model.sample(4_999, &config, &mut rng());
        assert!((near_end.vibration_rms - CUTTING_RMS_BASE).abs() < 1.0);
        assert_eq!(near_end.vibration_hz, 1000.0 / 60.0);
    }

    #[test]
    fn cutting_speed_jitters_within_five_percent() {
        let config = config();
        let mut model = PhaseModel::new();
        let mut rng = rng();
        for _ in 0..200 {
            let sample = model.sample(10_000, &config, &mut rng);
            assert!(sample.speed_rpm >= 950.0 && sample.speed_rpm <= 1_050.0);
            assert!(sample.current_ma >= 1_500.0 && sample.current_ma < 1_550.0);
        }
    }

    #[test]
    fn cutting_vibration_settles_toward_completion() {
        let config = config();
        let mut model = PhaseModel::new();
        let mut rng = rng();
        // 25s into the 30s cut: 5s remain, so swings stay within ±50.
        for _ in 0..200 {
            let sample = model.sample(30_000, &config, &mut rng);
            assert!((sample.vibration_rms - CUTTING_RMS_BASE).abs() <= 50.0);
        }
        // Final second of the cut: one second remains, swings within ±10.
        for _ in 0..200 {
            let sample = model.sample(34_999, &config, &mut rng);
            assert!((sample.vibration_rms - CUTTING_RMS_BASE).abs() <= 10.0);
        }
    }

    #[test]
    fn cutting_excites_fourth_harmonic() {
        let sample = PhaseModel::new().sample(10_000, &config(), &mut rng());
        assert_eq!(sample.vibration_hz, 4.0 * 1000.0 / 60.0);
    }

    #[test]
    fn cutting_depth_stays_bounded() {
        let config = config();
        let mut model = PhaseModel::new();
        let mut rng = rng();
        for _ in 0..500 {
            let sample = model.sample(12_000, &config, &mut rng);
            assert!(sample.cut_depth >= MAX_CUT_DEPTH - 30.0);
            assert!(sample.cut_depth <= MAX_CUT_DEPTH);
        }
    }

    #[test]
    fn tool_reverses_each_quarter_of_the_cut() {
        let config = config();
        let mut model = PhaseModel::new();
        let mut rng = rng();
        // First quarter: the tool advances one step per poll.
        let first = model.sample(6_000, &config, &mut rng).tool_x;
        let second = model.sample(6_000, &config, &mut rng).tool_x;
        assert_eq!(first, 1.0);
        assert_eq!(second, 2.0);
        // Second quarter: direction reverses.
        let third = model.sample(14_000, &config, &mut rng).tool_x;
        assert_eq!(third, 1.0);
    }

    #[test]
    fn tool_retracts_outside_the_cut() {
        let config = config();
        let mut model = PhaseModel::new();
        let mut rng = rng();
        model.sample(6_000, &config, &mut rng);
        model.sample(6_000, &config, &mut rng);
        let idle = model.sample(50_000, &config, &mut rng);
        assert_eq!(idle.tool_x, 0.0);
        assert_eq!(idle.cut_depth, MAX_CUT_DEPTH);
    }

    #[test]
    fn spindown_ramps_speed_back_to_zero() {
        let config = config();
        let mut model = PhaseModel::new();
        let mut rng = rng();
        let at_start = model.sample(35_000, &config, &mut rng);
        assert_eq!(at_start.phase, Phase::SpinningDown);
        assert_eq!(at_start.speed_rpm, 1_000.0);
        let half_way = model.sample(37_500, &config, &mut rng);
        assert_eq!(half_way.speed_rpm, 500.0);
        let near_end = model.sample(39_999, &config, &mut rng);
        assert!(near_end.speed_rpm < 1.0);
        assert_eq!(near_end.vibration_rms, CUTTING_RMS_BASE);
    }

    #[test]
    fn spindown_current_decays_hyperbolically() {
        let config = config();
        let mut model = PhaseModel::new();
        let mut rng = rng();
        let at_start = model.sample(35_000, &config, &mut rng);
        assert_eq!(at_start.current_ma, 150.0 + 1_500.0);
        let later = model.sample(36_000, &config, &mut rng);
        assert!(later.current_ma < 153.0);
        assert!(later.current_ma > 150.0);
    }

    #[test]
    fn idle_is_quiescent() {
        let sample = PhaseModel::new().sample(45_000, &config(), &mut rng());
        assert_eq!(sample.phase, Phase::Idle);
        assert_eq!(sample.speed_rpm, 0.0);
        assert_eq!(sample.current_ma, 150.0);
        assert_eq!(sample.vibration_rms, 0.0);
        assert_eq!(sample.vibration_hz, 0.0);
        assert_eq!(sample.cut_depth, MAX_CUT_DEPTH);
    }
}
