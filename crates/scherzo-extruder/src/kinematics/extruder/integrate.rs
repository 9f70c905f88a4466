// Closed-form pressure advance integrals
//
// Within a move the advance length is linear in the move's local time:
//     pa(t) = delta_base + t * start_dv
// with delta_base = pressure_advance * start_v and
// start_dv = pressure_advance * 2 * half_accel.

use crate::trap_queue::{CursorError, Move, MoveCursor};

/// Definite integral of `pa(t)` over `start..end`.
pub fn integrate_pa(delta_base: f64, start_dv: f64, start: f64, end: f64) -> f64 {
    let half_dv = 0.5 * start_dv;
    let si = start * (delta_base + start * half_dv);
    let ei = end * (delta_base + end * half_dv);
    ei - si
}

/// Definite integral of the time weighted `t * pa(t)` over `start..end`.
pub fn integrate_pa_time(delta_base: f64, start_dv: f64, start: f64, end: f64) -> f64 {
    let half_db = 0.5 * delta_base;
    let third_dv = (1.0 / 3.0) * start_dv;
    let si = start * start * (half_db + start * third_dv);
    let ei = end * end * (half_db + end * third_dv);
    ei - si
}

/// Integral of `pa(t) * (t - pivot)` over the part of `start..end` that lies
/// inside the move.
///
/// With the pivot at the window's left edge this is the rising ramp of the
/// triangular weight; with the pivot at the right edge it is the negated
/// falling ramp.
pub fn integrate_move(m: &Move, pressure_advance: f64, start: f64, end: f64, pivot: f64) -> f64 {
    let mut start = start;
    let mut end = end;
    if start < 0.0 {
        start = 0.0;
    }
    if end > m.move_t {
        end = m.move_t;
    }
    let pressure_advance = if m.can_pressure_advance {
        pressure_advance
    } else {
        0.0
    };
    let delta_base = pressure_advance * m.start_v;
    let start_dv = pressure_advance * 2.0 * m.half_accel;
    let iext = integrate_pa(delta_base, start_dv, start, end);
    let wgt_ext = integrate_pa_time(delta_base, start_dv, start, end);
    wgt_ext - pivot * iext
}

/// Integral of `pa(x) * (hst - |move_time - x|)` over
/// `move_time - hst..move_time + hst`, following the window into
/// neighbouring moves as far as it reaches.
///
/// Fails when the queue does not hold enough moves before or after `m` to
/// cover the window.
pub fn integrate_window(
    m: MoveCursor<'_>,
    move_time: f64,
    pressure_advance: f64,
    hst: f64,
) -> Result<f64, CursorError> {
    let mut start = move_time - hst;
    let mut end = move_time + hst;
    let mut res = integrate_move(&m, pressure_advance, start, move_time, start);
    res -= integrate_move(&m, pressure_advance, move_time, end, end);

    let mut prev = m;
    while start < 0.0 {
        prev = prev.prev_move()?;
        start += prev.move_t;
        res += integrate_move(&prev, pressure_advance, start, prev.move_t, start);
    }

    let mut next = m;
    while end > next.move_t {
        end -= next.move_t;
        next = next.next_move()?;
        res -= integrate_move(&next, pressure_advance, 0.0, end, end);
    }

    Ok(res)
}
