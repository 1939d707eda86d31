//! Fixed point numbers, angles, and vertex types shared by the WAD and level
//! crates.

mod fixed_point;
mod fixed_vertex;

use std::f32::consts::PI;

pub use fixed_point::*;
pub use fixed_vertex::*;

const FRACUNIT_F: f32 = FRACUNIT as f32;

/// Convert a Doom `fixed_t` fixed-point float to `f32`
pub const fn fixed_to_float(value: i32) -> f32 {
    value as f32 / FRACUNIT_F
}

/// Convert an `f32` to a Doom `fixed_t`. Out of range values saturate.
pub fn float_to_fixed(value: f32) -> i32 {
    (value * FRACUNIT_F) as i32
}

const DEG_TO_RAD: f32 = PI / 180.0;

/// Convert a BAM (Binary Angle Measure) to radians
#[inline]
pub const fn bam_to_radian(value: u32) -> f32 {
    (value as f32 * 8.381_903e-8) * DEG_TO_RAD
}

/// Convert radians to a BAM, wrapping in to `0..2π`
pub fn radian_to_bam(rad: f64) -> u32 {
    let turns = (rad / std::f64::consts::TAU).rem_euclid(1.0);
    (turns * 4_294_967_296.0).round() as u64 as u32
}
