// Kinematics for the extruder stepper

use crate::trap_queue::{Coord, Move};

pub mod extruder;

/// Calculate the distance traveled in a move at a given time
pub fn move_get_distance(m: &Move, move_time: f64) -> f64 {
    (m.start_v + m.half_accel * move_time) * move_time
}

/// Calculate the coordinate at a given time in a move
pub fn move_get_coord(m: &Move, move_time: f64) -> Coord {
    let move_dist = move_get_distance(m, move_time);
    Coord {
        x: m.start_pos.x + m.axes_r.x * move_dist,
        y: m.start_pos.y + m.axes_r.y * move_dist,
        z: m.start_pos.z + m.axes_r.z * move_dist,
    }
}
