//! Static characterization.
//!
//! Ramps an open-loop output linearly with elapsed time until the axis
//! breaks away (measured velocity reaches the threshold), records that
//! output and holds neutral. The breakaway output is the static friction
//! (plus gravity) term used to fit feedforward gains offline.

use hoist_common::superstructure::config::CharacterizationConfig;
use serde::Serialize;
use tracing::info;

use super::AxisContext;
use super::profiled::ProfiledAxis;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CharacterizationPhase {
    Ramping,
    Holding,
}

/// Result of a characterization run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CharacterizationResult {
    pub axis: &'static str,
    /// Output at breakaway, `None` if the run ended before breakaway.
    pub breakaway_output: Option<f64>,
    /// Time from start to breakaway or finish [s].
    pub elapsed_s: f64,
}

/// One running static characterization.
#[derive(Debug, Clone)]
pub struct StaticCharacterization {
    config: CharacterizationConfig,
    phase: CharacterizationPhase,
    elapsed: f64,
    output: f64,
    breakaway: Option<f64>,
}

impl StaticCharacterization {
    /// Start on `axis`; its profile is suspended until [`Self::finish`].
    pub fn start(config: CharacterizationConfig, axis: &mut ProfiledAxis) -> Self {
        info!("{}: static characterization started", axis.name());
        axis.suspend();
        Self {
            config,
            phase: CharacterizationPhase::Ramping,
            elapsed: 0.0,
            output: 0.0,
            breakaway: None,
        }
    }

    /// Advance one tick; call after the axis has read its inputs.
    pub fn tick(&mut self, axis: &mut ProfiledAxis, ctx: &AxisContext) {
        match self.phase {
            CharacterizationPhase::Ramping => {
                if axis.velocity() >= self.config.velocity_threshold {
                    axis.stop();
                    self.breakaway = Some(self.output);
                    self.phase = CharacterizationPhase::Holding;
                    info!(
                        "{}: breakaway at output {:.4} after {:.2}s",
                        axis.name(),
                        self.output,
                        self.elapsed
                    );
                } else {
                    self.elapsed += ctx.dt;
                    self.output = self.config.ramp_rate * self.elapsed;
                    axis.run_open_loop(self.output, ctx);
                }
            }
            CharacterizationPhase::Holding => axis.stop(),
        }
    }

    /// Stop and restore closed-loop control.
    pub fn finish(self, axis: &mut ProfiledAxis) -> CharacterizationResult {
        axis.stop();
        axis.resume();
        info!("{}: static characterization finished", axis.name());
        CharacterizationResult {
            axis: axis.name(),
            breakaway_output: self.breakaway,
            elapsed_s: self.elapsed,
        }
    }

    pub fn phase(&self) -> CharacterizationPhase {
        self.phase
    }

    /// Current open-loop output.
    pub fn output(&self) -> f64 {
        self.output
    }

    pub fn breakaway_output(&self) -> Option<f64> {
        self.breakaway
    }
}

// ─── Tests ──────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use hoist_common::superstructure::config::AxisConfig;
    use hoist_hal::{SimAxis, SimAxisHandle, SimAxisParams};

    const DT: f64 = 0.02;

    fn pivot() -> (ProfiledAxis, SimAxisHandle) {
        let cfg = AxisConfig::pivot_default();
        let (io, handle) = SimAxis::new(SimAxisParams::from_axis_config("pivot", &cfg, DT));
        (ProfiledAxis::new("pivot", Box::new(io), &cfg), handle)
    }

    #[test]
    fn ramps_until_breakaway_then_holds() {
        let (mut axis, handle) = pivot();
        let ctx = AxisContext::enabled(DT);
        let mut run = StaticCharacterization::start(CharacterizationConfig::default(), &mut axis);
        assert!(axis.is_suspended());

        let mut prev_output = 0.0;
        for _ in 0..200 {
            axis.tick(&ctx);
            run.tick(&mut axis, &ctx);
            if run.phase() == CharacterizationPhase::Holding {
                break;
            }
            assert!(run.output() > prev_output);
            prev_output = run.output();
        }
        assert_eq!(run.phase(), CharacterizationPhase::Holding);
        let breakaway = run.breakaway_output().unwrap();
        // Above the simulated 0.05 V static friction.
        assert!(breakaway > 0.05);

        axis.tick(&ctx);
        run.tick(&mut axis, &ctx);
        assert!(handle.is_neutral());

        let result = run.finish(&mut axis);
        assert_eq!(result.axis, "pivot");
        assert_eq!(result.breakaway_output, Some(breakaway));
        assert!(!axis.is_suspended());
    }

    #[test]
    fn finish_before_breakaway_has_no_result() {
        let (mut axis, _handle) = pivot();
        let ctx = AxisContext::enabled(DT);
        let mut run = StaticCharacterization::start(CharacterizationConfig::default(), &mut axis);
        axis.tick(&ctx);
        run.tick(&mut axis, &ctx);
        let result = run.finish(&mut axis);
        assert_eq!(result.breakaway_output, None);
        assert!((result.elapsed_s - DT).abs() < 1e-12);
    }
}
