//! Dual-antenna heading solutions.
use serde::{Deserialize, Serialize};

use super::fields::{Fields, Reader};
use super::{position_type_code, solution_status_code};
use crate::framing::ProprietarySentence;
use crate::time::GnssTime;
use crate::Result;

/// A dual-antenna baseline heading (HEADING).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Heading {
    pub time: GnssTime,
    pub solution_status: u32,
    pub position_type: u32,
    pub baseline_length: f32,
    pub heading: f32,
    pub pitch: f32,
    pub heading_sigma: f32,
    pub pitch_sigma: f32,
    pub station_id: String,
    pub satellites_tracked: u8,
    pub satellites_used: u8,
    pub satellites_above_mask: u8,
}

pub(crate) const BINARY_LEN: usize = 44;

pub(crate) fn binary(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<Heading> {
    let mut r = Reader::exact(kind, payload, BINARY_LEN)?;
    let solution_status = r.u32()?;
    let position_type = r.u32()?;
    let baseline_length = r.f32()?;
    let heading = r.f32()?;
    let pitch = r.f32()?;
    r.skip(4)?; // reserved
    let heading_sigma = r.f32()?;
    let pitch_sigma = r.f32()?;
    let mut station = [0u8; 4];
    for b in &mut station {
        *b = r.u8()?;
    }
    let satellites_tracked = r.u8()?;
    let satellites_used = r.u8()?;
    let satellites_above_mask = r.u8()?;
    r.skip(5)?; // multipath + reserved + status masks

    Ok(Heading {
        time,
        solution_status,
        position_type,
        baseline_length,
        heading,
        pitch,
        heading_sigma,
        pitch_sigma,
        station_id: station.iter().take_while(|&&b| b != 0).map(|&b| b as char).collect(),
        satellites_tracked,
        satellites_used,
        satellites_above_mask,
    })
}

pub(crate) fn sentence(kind: &'static str, s: &ProprietarySentence) -> Result<Heading> {
    let mut f = Fields::at_least(kind, &s.fields, 12)?;
    Ok(Heading {
        time: s.time,
        solution_status: solution_status_code(kind, f.str()?)?,
        position_type: position_type_code(kind, f.str()?)?,
        baseline_length: f.f32()?,
        heading: f.f32()?,
        pitch: f.f32()?,
        heading_sigma: {
            f.str()?; // reserved
            f.f32()?
        },
        pitch_sigma: f.f32()?,
        station_id: f.str()?.trim_matches('"').to_string(),
        satellites_tracked: f.u8()?,
        satellites_used: f.u8()?,
        satellites_above_mask: f.u8()?,
    })
}
