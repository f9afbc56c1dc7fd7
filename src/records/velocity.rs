//! Best-velocity solutions.
use serde::{Deserialize, Serialize};

use super::fields::{Fields, Reader};
use super::{position_type_code, solution_status_code};
use crate::framing::ProprietarySentence;
use crate::time::GnssTime;
use crate::Result;

/// A velocity solution (BESTVEL).
///
/// Speeds are horizontal ground speed and vertical speed in m/s; the track
/// is degrees clockwise from true north.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Velocity {
    pub time: GnssTime,
    pub solution_status: u32,
    pub velocity_type: u32,
    pub latency: f32,
    pub age: f32,
    pub horizontal_speed: f64,
    pub track_over_ground: f64,
    pub vertical_speed: f64,
}

pub(crate) const BINARY_LEN: usize = 44;

pub(crate) fn binary(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<Velocity> {
    let mut r = Reader::exact(kind, payload, BINARY_LEN)?;
    let velocity = Velocity {
        time,
        solution_status: r.u32()?,
        velocity_type: r.u32()?,
        latency: r.f32()?,
        age: r.f32()?,
        horizontal_speed: r.f64()?,
        track_over_ground: r.f64()?,
        vertical_speed: r.f64()?,
    };
    r.skip(4)?; // reserved
    Ok(velocity)
}

pub(crate) fn sentence(kind: &'static str, s: &ProprietarySentence) -> Result<Velocity> {
    let mut f = Fields::at_least(kind, &s.fields, 7)?;
    Ok(Velocity {
        time: s.time,
        solution_status: solution_status_code(kind, f.str()?)?,
        velocity_type: position_type_code(kind, f.str()?)?,
        latency: f.f32()?,
        age: f.f32()?,
        horizontal_speed: f.f64()?,
        track_over_ground: f.f64()?,
        vertical_speed: f.f64()?,
    })
}
