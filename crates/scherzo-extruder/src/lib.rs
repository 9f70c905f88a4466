//! Extruder motion kinematics shared across Scherzo components.
//!
//! Computes the commanded extruder stepper position from queued trapezoid
//! moves, with optional smoothed pressure advance. This crate intentionally
//! avoids any transport- or MCU-specific dependencies.

pub mod config;
pub mod itersolve;
pub mod kinematics;
pub mod trap_queue;
