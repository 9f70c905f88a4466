//! Extruder kinematics with smoothed pressure advance.
//!
//! Without pressure advance the extruder stepper follows the nominal
//! position. With it, extra filament is pushed in while the extruder
//! accelerates and withdrawn while it decelerates:
//!
//! ```text
//! pa(t) = pressure_advance * nominal_velocity(t)
//! ```
//!
//! That length is averaged with a triangular weight of half width
//! `hst = smooth_time / 2` so the correction never jumps:
//!
//! ```text
//! smooth_position(t) = nominal_position(t)
//!     + integral(pa(x) * (hst - |t - x|), x = t - hst..t + hst) / hst^2
//! ```

use crate::{
    itersolve::{ActiveFlags, ActiveMargins, CalcPositionCallback, StepperKinematics},
    kinematics::move_get_distance,
    trap_queue::{CursorError, MoveCursor},
};

pub mod integrate;

/// Extruder stepper kinematics.
///
/// Starts with smoothing disabled. While `half_smooth_time` is zero the
/// stepper follows the nominal position exactly; otherwise every position
/// query integrates over the moves around it, so the queue must hold at
/// least [`active_margins`](StepperKinematics::active_margins) of moves on
/// either side of the queried time.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtruderKin {
    pressure_advance: f64,
    half_smooth_time: f64,
    inv_half_smooth_time2: f64,
}

impl ExtruderKin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure pressure advance and its smoothing window.
    ///
    /// A zero `smooth_time` disables pressure advance entirely. Returns the
    /// margins the step generator must keep queued around extruder activity.
    pub fn set_pressure_advance(
        &mut self,
        pressure_advance: f64,
        smooth_time: f64,
    ) -> ActiveMargins {
        let half_smooth_time = smooth_time * 0.5;
        *self = if half_smooth_time == 0.0 {
            Self::default()
        } else {
            Self {
                pressure_advance,
                half_smooth_time,
                inv_half_smooth_time2: 1.0 / (half_smooth_time * half_smooth_time),
            }
        };
        tracing::debug!(
            pressure_advance = self.pressure_advance,
            smooth_time,
            "extruder pressure advance configured"
        );
        self.active_margins()
    }

    pub fn pressure_advance(&self) -> f64 {
        self.pressure_advance
    }

    pub fn smooth_time(&self) -> f64 {
        self.half_smooth_time * 2.0
    }

    pub fn is_smoothed(&self) -> bool {
        self.half_smooth_time != 0.0
    }
}

impl CalcPositionCallback for ExtruderKin {
    fn calc_position(&mut self, m: MoveCursor<'_>, move_time: f64) -> Result<f64, CursorError> {
        let base = m.start_pos.x + move_get_distance(&m, move_time);
        let hst = self.half_smooth_time;
        if hst == 0.0 {
            return Ok(base);
        }
        let area = integrate::integrate_window(m, move_time, self.pressure_advance, hst)?;
        Ok(base + area * self.inv_half_smooth_time2)
    }
}

impl StepperKinematics for ExtruderKin {
    fn active_flags(&self) -> ActiveFlags {
        ActiveFlags::new().with_x()
    }

    fn active_margins(&self) -> ActiveMargins {
        ActiveMargins::symmetric(self.half_smooth_time)
    }
}
