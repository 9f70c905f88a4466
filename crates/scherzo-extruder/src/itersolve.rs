// Stepper kinematics seam used by step generation

use crate::trap_queue::{Coord, CursorError, Move, MoveCursor, TrapQueue};
use std::collections::VecDeque;

// Active flags for axis filtering
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveFlags(u8);

impl ActiveFlags {
    const X: u8 = 1 << 0;

    pub const fn new() -> Self {
        Self(0)
    }

    pub const fn with_x(mut self) -> Self {
        self.0 |= Self::X;
        self
    }

    pub const fn has_x(&self) -> bool {
        self.0 & Self::X != 0
    }

    /// Whether a move travelling along `axes_r` touches any flagged axis.
    pub fn matches(&self, axes_r: &Coord) -> bool {
        self.has_x() && axes_r.x != 0.0
    }
}

/// How far around its own activity a stepper needs moves queued.
///
/// `pre` is the time before an active move at which step generation must
/// already run; `post` is the time after the last active move it must keep
/// running.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ActiveMargins {
    pub pre: f64,
    pub post: f64,
}

impl ActiveMargins {
    pub const fn symmetric(margin: f64) -> Self {
        Self {
            pre: margin,
            post: margin,
        }
    }
}

// Position callback trait - calculates position at a given time in a move
pub trait CalcPositionCallback {
    fn calc_position(&mut self, m: MoveCursor<'_>, move_time: f64) -> Result<f64, CursorError>;
}

/// A stepper's kinematics as seen by the step generator.
pub trait StepperKinematics: CalcPositionCallback {
    fn active_flags(&self) -> ActiveFlags;

    fn active_margins(&self) -> ActiveMargins {
        ActiveMargins::default()
    }

    // Check if a move is likely to cause movement on this stepper
    fn check_active(&self, m: &Move) -> bool {
        self.active_flags().matches(&m.axes_r)
    }

    /// Stepper position at an absolute print time.
    fn position_at(&mut self, trapq: &TrapQueue, print_time: f64) -> Result<f64, CursorError> {
        let m = trapq
            .cursor_at(print_time)
            .ok_or(CursorError::NotQueued { print_time })?;
        self.calc_position(m, print_time - m.print_time)
    }

    /// Position of a stepper resting at `coord`.
    fn calc_position_from_coord(&mut self, coord: Coord) -> Result<f64, CursorError> {
        // A long stationary move, sampled far from either end
        let moves = VecDeque::from([Move {
            move_t: 1000.0,
            start_pos: coord,
            ..Move::default()
        }]);
        self.calc_position(MoveCursor::new(&moves, 0), 500.0)
    }

    /// Span over which steps must be generated for the queued moves,
    /// widened by the active margins.
    fn active_window(&self, trapq: &TrapQueue) -> Option<(f64, f64)> {
        let mut active = trapq.active_moves().filter(|m| self.check_active(m));
        let first = active.next()?;
        let last = active.last().unwrap_or(first);
        let margins = self.active_margins();
        Some((first.print_time - margins.pre, last.end_time() + margins.post))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Mock kinematics that follows the X coordinate
    struct LinearKin {
        margins: ActiveMargins,
    }

    impl CalcPositionCallback for LinearKin {
        fn calc_position(&mut self, m: MoveCursor<'_>, move_time: f64) -> Result<f64, CursorError> {
            let move_dist = (m.start_v + m.half_accel * move_time) * move_time;
            Ok(m.start_pos.x + m.axes_r.x * move_dist)
        }
    }

    impl StepperKinematics for LinearKin {
        fn active_flags(&self) -> ActiveFlags {
            ActiveFlags::new().with_x()
        }

        fn active_margins(&self) -> ActiveMargins {
            self.margins
        }
    }

    fn kin(margin: f64) -> LinearKin {
        LinearKin {
            margins: ActiveMargins::symmetric(margin),
        }
    }

    #[test]
    fn flags_match_direction_ratios() {
        let flags = ActiveFlags::new().with_x();
        assert!(flags.has_x());
        assert!(flags.matches(&Coord {
            x: -1.0,
            y: 0.0,
            z: 0.0
        }));
        assert!(!flags.matches(&Coord {
            x: 0.0,
            y: 1.0,
            z: 1.0
        }));
        assert!(!ActiveFlags::new().matches(&Coord {
            x: 1.0,
            y: 0.0,
            z: 0.0
        }));
    }

    #[test]
    fn position_at_resolves_covering_move() {
        let mut trapq = TrapQueue::new();
        trapq.append_extrude(2.0, 0.0, 1.0, 0.0, 3.0, 4.0, 4.0, 0.0, true);
        let mut kin = kin(0.0);
        assert_eq!(kin.position_at(&trapq, 2.5).unwrap(), 5.0);
        // Inside the leading null move
        assert_eq!(kin.position_at(&trapq, 1.5).unwrap(), 3.0);
        assert_eq!(
            kin.position_at(&trapq, 3.5),
            Err(CursorError::NotQueued { print_time: 3.5 })
        );
    }

    #[test]
    fn calculates_position_from_coordinates() {
        let mut kin = kin(0.0);
        let pos = kin
            .calc_position_from_coord(Coord {
                x: 7.0,
                y: 2.0,
                z: 3.0,
            })
            .unwrap();
        assert_eq!(pos, 7.0);
    }

    #[test]
    fn active_window_skips_inactive_moves() {
        let mut trapq = TrapQueue::new();
        assert_eq!(kin(0.1).active_window(&trapq), None);

        trapq.append_extrude(2.0, 0.5, 0.5, 0.5, 0.0, 0.0, 1.0, 2.0, true);
        trapq.add_move(Move {
            print_time: 3.5,
            move_t: 1.0,
            ..Move::default()
        });
        let (start, end) = kin(0.25).active_window(&trapq).unwrap();
        assert_eq!(start, 1.75);
        assert_eq!(end, 3.75);
    }
}
