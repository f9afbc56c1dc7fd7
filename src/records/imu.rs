//! Raw and corrected inertial samples.
//!
//! CORRIMUDATA values are per-sample attitude-rate and acceleration
//! increments; multiplying by the sample rate converts them to rad/s and
//! m/s^2. The micro-framed CORRIMUDATAS and RAWIMUS variants share the same
//! payload layout as their full-framed counterparts.
use serde::{Deserialize, Serialize};

use super::fields::{payload_time, Reader};
use crate::time::GnssTime;
use crate::Result;

/// An error-corrected inertial sample (CORRIMUDATA / CORRIMUDATAS).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CorrectedImu {
    pub time: GnssTime,
    /// Increments around the body axes, radians per sample.
    pub pitch_rate: f64,
    pub roll_rate: f64,
    pub yaw_rate: f64,
    /// Increments along the body axes, m/s per sample.
    pub lateral_acceleration: f64,
    pub longitudinal_acceleration: f64,
    pub vertical_acceleration: f64,
}

pub(crate) const CORRIMU_LEN: usize = 60;

pub(crate) fn corrimudata(kind: &'static str, payload: &[u8], _header_time: GnssTime) -> Result<CorrectedImu> {
    let mut r = Reader::exact(kind, payload, CORRIMU_LEN)?;
    let week = r.u32()?;
    let seconds = r.f64()?;
    Ok(CorrectedImu {
        time: payload_time(kind, week, seconds)?,
        pitch_rate: r.f64()?,
        roll_rate: r.f64()?,
        yaw_rate: r.f64()?,
        lateral_acceleration: r.f64()?,
        longitudinal_acceleration: r.f64()?,
        vertical_acceleration: r.f64()?,
    })
}

/// An uncorrected inertial sample straight from the IMU (RAWIMU / RAWIMUS).
///
/// Counts are signed accumulations in the IMU's native scale; the y-axis
/// values are transmitted negated, as the sensor frame defines.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RawImu {
    pub time: GnssTime,
    pub imu_status: u32,
    pub z_accel: i32,
    pub y_accel_negated: i32,
    pub x_accel: i32,
    pub z_gyro: i32,
    pub y_gyro_negated: i32,
    pub x_gyro: i32,
}

pub(crate) const RAWIMU_LEN: usize = 40;

pub(crate) fn rawimu(kind: &'static str, payload: &[u8], _header_time: GnssTime) -> Result<RawImu> {
    let mut r = Reader::exact(kind, payload, RAWIMU_LEN)?;
    let week = r.u32()?;
    let seconds = r.f64()?;
    Ok(RawImu {
        time: payload_time(kind, week, seconds)?,
        imu_status: r.u32()?,
        z_accel: r.i32()?,
        y_accel_negated: r.i32()?,
        x_accel: r.i32()?,
        z_gyro: r.i32()?,
        y_gyro_negated: r.i32()?,
        x_gyro: r.i32()?,
    })
}
