//! Sample extruder positions across a queue of configured moves.

use crate::config::Config;
use anyhow::{Context, Result};
use scherzo_extruder::{
    itersolve::StepperKinematics,
    kinematics::extruder::ExtruderKin,
    trap_queue::{Coord, Move, TrapQueue},
};
use serde::Serialize;

/// Upper bound on samples produced by one run.
pub const MAX_SAMPLES: usize = 1_000_000;

/// Extruder position at one print time
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub print_time: f64,
    /// Position without pressure advance
    pub nominal: f64,
    /// Commanded position with smoothed pressure advance
    pub position: f64,
}

impl Sample {
    pub fn advance(&self) -> f64 {
        self.position - self.nominal
    }
}

/// Queue the configured moves, then hold the final position for `hold_t`.
///
/// The hold gives the smoothing window moves to integrate over past the
/// last extrusion.
pub fn build_queue(config: &Config, hold_t: f64) -> TrapQueue {
    let mut trapq = TrapQueue::new();
    let mut print_time = 0.0;
    let mut e = 0.0;
    for m in &config.moves {
        print_time = m.print_time.unwrap_or(print_time);
        trapq.append_extrude(
            print_time,
            m.accel_t,
            m.cruise_t,
            m.decel_t,
            e,
            m.start_v,
            m.cruise_v,
            m.accel,
            m.can_pressure_advance,
        );
        trapq.check_sentinels();
        e = trapq.tail_sentinel().start_pos.x;
        print_time += m.duration();
    }
    if hold_t > 0.0 {
        trapq.add_move(Move {
            print_time,
            move_t: hold_t,
            start_pos: Coord {
                x: e,
                ..Coord::default()
            },
            ..Move::default()
        });
        trapq.check_sentinels();
    }
    trapq
}

/// Sample nominal and pressure advanced positions at the configured interval.
pub fn run(config: &Config) -> Result<Vec<Sample>> {
    let mut kin = ExtruderKin::new();
    let margins = config
        .extruder
        .apply(&mut kin)
        .context("invalid [extruder] section")?;
    let mut nominal = ExtruderKin::new();

    let interval = config.sample.interval;
    let mut trapq = build_queue(config, 2.0 * margins.post + interval);

    let Some((active_start, active_end)) = kin.active_window(&trapq) else {
        tracing::info!("No extruder activity to sample");
        return Ok(Vec::new());
    };
    let start = config.sample.start.unwrap_or(active_start);
    let end = config.sample.end.unwrap_or(active_end);
    if end < start {
        anyhow::bail!("sample window ends at {end} before it starts at {start}");
    }

    let span = ((end - start) / interval).floor();
    if span.is_nan() || span >= MAX_SAMPLES as f64 {
        anyhow::bail!(
            "sampling {start:.6}..{end:.6} every {interval}s exceeds {MAX_SAMPLES} samples"
        );
    }
    let count = span as usize + 1;
    let mut samples = Vec::with_capacity(count);
    let mut retired = 0;
    for i in 0..count {
        let print_time = start + i as f64 * interval;
        // Keep the pre-active margin behind this sample, plus one interval
        retired += trapq.finalize_moves(print_time - margins.pre - interval);
        let position = kin
            .position_at(&trapq, print_time)
            .with_context(|| format!("failed to evaluate extruder at {print_time:.6}"))?;
        let nominal = nominal
            .position_at(&trapq, print_time)
            .with_context(|| format!("failed to evaluate extruder at {print_time:.6}"))?;
        samples.push(Sample {
            print_time,
            nominal,
            position,
        });
    }

    tracing::info!(
        samples = samples.len(),
        retired,
        "Sampled extruder from {start:.6} to {end:.6}"
    );
    Ok(samples)
}
