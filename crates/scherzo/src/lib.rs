//! Command-line tooling for inspecting Scherzo extruder kinematics.

pub mod config;
pub mod sample;
