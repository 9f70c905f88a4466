//! Trapezoidal velocity movement queue.
//!
//! Tracks the extruder's active trapezoid segments (accel/cruise/decel),
//! fills gaps with null moves so kinematics always find history behind a
//! move, and retires moves once no position query can reach them. Kinematics read
//! the queue through [`MoveCursor`], which walks to neighbouring moves but
//! never past the sentinels.

use crate::kinematics::move_get_coord;
use std::{collections::VecDeque, ops::Deref};
use thiserror::Error;

const NEVER_TIME: f64 = 9_999_999_999_999_999.9;
const MAX_NULL_MOVE: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Move {
    pub print_time: f64,
    pub move_t: f64,
    pub start_v: f64,
    pub half_accel: f64,
    pub start_pos: Coord,
    pub axes_r: Coord,
    /// Pressure advance applies to this move. Retracts, primes and other
    /// extruder-only moves leave this unset; their nominal motion still counts.
    pub can_pressure_advance: bool,
}

impl Move {
    pub fn end_time(&self) -> f64 {
        self.print_time + self.move_t
    }
}

/// Raised when a traversal needs a move the queue does not hold.
#[derive(Clone, Copy, Debug, PartialEq, Error)]
pub enum CursorError {
    #[error("no move queued before print time {print_time:.6}")]
    NoPrevious { print_time: f64 },
    #[error("no move queued after print time {print_time:.6}")]
    NoNext { print_time: f64 },
    #[error("no queued move covers print time {print_time:.6}")]
    NotQueued { print_time: f64 },
}

/// Read-only position within a run of time-ordered moves.
#[derive(Clone, Copy, Debug)]
pub struct MoveCursor<'a> {
    moves: &'a VecDeque<Move>,
    first: usize,
    end: usize,
    index: usize,
}

impl<'a> MoveCursor<'a> {
    /// Cursor over every entry of `moves`, positioned at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn new(moves: &'a VecDeque<Move>, index: usize) -> Self {
        assert!(index < moves.len(), "cursor index out of bounds");
        Self {
            moves,
            first: 0,
            end: moves.len(),
            index,
        }
    }

    pub fn get(&self) -> &'a Move {
        &self.moves[self.index]
    }

    /// The move immediately preceding this one in time.
    pub fn prev_move(&self) -> Result<Self, CursorError> {
        if self.index <= self.first {
            return Err(CursorError::NoPrevious {
                print_time: self.get().print_time,
            });
        }
        Ok(Self {
            index: self.index - 1,
            ..*self
        })
    }

    /// The move immediately following this one in time.
    pub fn next_move(&self) -> Result<Self, CursorError> {
        if self.index + 1 >= self.end {
            return Err(CursorError::NoNext {
                print_time: self.get().end_time(),
            });
        }
        Ok(Self {
            index: self.index + 1,
            ..*self
        })
    }
}

impl Deref for MoveCursor<'_> {
    type Target = Move;

    fn deref(&self) -> &Move {
        self.get()
    }
}

pub struct TrapQueue {
    moves: VecDeque<Move>, // includes head and tail sentinels
}

impl Default for TrapQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TrapQueue {
    pub fn new() -> Self {
        let mut moves = VecDeque::new();
        // Head sentinel
        moves.push_back(Move {
            print_time: -1.0,
            ..Move::default()
        });
        // Tail sentinel
        moves.push_back(Move {
            print_time: NEVER_TIME,
            move_t: NEVER_TIME,
            ..Move::default()
        });
        Self { moves }
    }

    fn tail_index(&self) -> usize {
        self.moves.len() - 1
    }

    fn tail_mut(&mut self) -> &mut Move {
        let idx = self.tail_index();
        &mut self.moves[idx]
    }

    /// Update the tail sentinel's print_time and start_pos if it's marked stale.
    pub fn check_sentinels(&mut self) {
        let tail_idx = self.tail_index();
        if self.moves[tail_idx].print_time != 0.0 {
            return;
        }
        if tail_idx == 1 {
            let tail = self.tail_mut();
            tail.print_time = NEVER_TIME;
            tail.move_t = NEVER_TIME;
            return;
        }
        let prev = self.moves[tail_idx - 1];
        let tail = self.tail_mut();
        tail.print_time = prev.end_time();
        tail.move_t = 0.0;
        tail.start_pos = move_get_coord(&prev, prev.move_t);
    }

    /// Add a fully-prepared move, filling gaps with a null move when necessary.
    pub fn add_move(&mut self, m: Move) {
        let prev_idx = self.tail_index() - 1;
        let prev = self.moves[prev_idx];
        if prev.end_time() < m.print_time {
            let mut null_move = Move {
                start_pos: m.start_pos,
                ..Move::default()
            };
            // Only the lead-in after the head sentinel is shortened
            if prev_idx == 0 && m.print_time > MAX_NULL_MOVE {
                null_move.print_time = m.print_time - MAX_NULL_MOVE;
            } else {
                null_move.print_time = prev.end_time();
            }
            null_move.move_t = m.print_time - null_move.print_time;
            let insert_at = self.tail_index();
            self.moves.insert(insert_at, null_move);
        }
        let insert_at = self.tail_index();
        self.moves.insert(insert_at, m);
        // mark tail stale so check_sentinels recomputes
        let tail = self.tail_mut();
        tail.print_time = 0.0;
        tail.move_t = 0.0;
    }

    /// Queue one extrusion move, split into its accel/cruise/decel phases.
    ///
    /// Velocities are filament velocities along the extruder axis; negative
    /// values retract.
    #[allow(clippy::too_many_arguments)]
    pub fn append_extrude(
        &mut self,
        print_time: f64,
        accel_t: f64,
        cruise_t: f64,
        decel_t: f64,
        start_e: f64,
        start_v: f64,
        cruise_v: f64,
        accel: f64,
        can_pressure_advance: bool,
    ) {
        let mut cur_time = print_time;
        let mut cur_pos = Coord {
            x: start_e,
            ..Coord::default()
        };
        let axes_r = Coord {
            x: 1.0,
            ..Coord::default()
        };
        let phases = [
            (accel_t, start_v, 0.5 * accel),
            (cruise_t, cruise_v, 0.0),
            (decel_t, cruise_v, -0.5 * accel),
        ];
        for (move_t, start_v, half_accel) in phases {
            if move_t <= 0.0 {
                continue;
            }
            let m = Move {
                print_time: cur_time,
                move_t,
                start_v,
                half_accel,
                start_pos: cur_pos,
                axes_r,
                can_pressure_advance,
            };
            self.add_move(m);
            cur_time += move_t;
            cur_pos = move_get_coord(&m, move_t);
        }
    }

    /// Retire active moves that end at or before `print_time`.
    ///
    /// Returns how many moves were removed. Position queries need the moves
    /// within the pre-active margin behind them, so callers retire no later
    /// than `query_time - pre`.
    pub fn finalize_moves(&mut self, print_time: f64) -> usize {
        let mut retired = 0usize;
        while self.moves.len() > 2 {
            if self.moves[1].end_time() > print_time {
                break;
            }
            self.moves.remove(1);
            retired += 1;
        }

        if self.moves.len() == 2 {
            let tail = self.tail_mut();
            tail.print_time = NEVER_TIME;
            tail.move_t = NEVER_TIME;
        }

        if retired > 0 {
            tracing::debug!(
                retired,
                active = self.active_len(),
                "finalized moves up to {print_time:.6}"
            );
        }
        retired
    }

    /// Cursor at the active move covering `print_time`.
    ///
    /// A time exactly at the end of the last queued move resolves to that
    /// move. Returns `None` when no active move covers the time.
    pub fn cursor_at(&self, print_time: f64) -> Option<MoveCursor<'_>> {
        let (first, end) = (1, self.tail_index());
        let mut found = None;
        for index in first..end {
            let m = &self.moves[index];
            if m.print_time > print_time {
                break;
            }
            found = Some(index);
            if print_time < m.end_time() {
                break;
            }
        }
        let index = found?;
        if self.moves[index].end_time() < print_time {
            return None;
        }
        Some(MoveCursor {
            moves: &self.moves,
            first,
            end,
            index,
        })
    }

    /// Active moves in time order, excluding sentinels.
    pub fn active_moves(&self) -> impl Iterator<Item = &Move> {
        self.moves.range(1..self.tail_index())
    }

    /// Current active moves (excluding sentinels). Useful for tests/inspection.
    pub fn active_len(&self) -> usize {
        self.moves.len().saturating_sub(2)
    }

    pub fn tail_sentinel(&self) -> Move {
        self.moves[self.tail_index()]
    }
}
