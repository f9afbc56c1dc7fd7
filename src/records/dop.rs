//! Dilution-of-precision reports.
use serde::{Deserialize, Serialize};

use super::fields::{Fields, Reader};
use crate::framing::ProprietarySentence;
use crate::time::GnssTime;
use crate::{Error, Result};

/// A dilution-of-precision report (PSRDOP) with the PRNs it was computed
/// from.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Dop {
    pub time: GnssTime,
    pub gdop: f32,
    pub pdop: f32,
    pub hdop: f32,
    pub htdop: f32,
    pub tdop: f32,
    pub elevation_cutoff: f32,
    pub prns: Vec<u32>,
}

pub(crate) const BINARY_MIN_LEN: usize = 28;

pub(crate) fn binary(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<Dop> {
    let mut r = Reader::at_least(kind, payload, BINARY_MIN_LEN)?;
    let gdop = r.f32()?;
    let pdop = r.f32()?;
    let hdop = r.f32()?;
    let htdop = r.f32()?;
    let tdop = r.f32()?;
    let elevation_cutoff = r.f32()?;
    let count = r.u32()? as usize;
    if r.remaining() != count * 4 {
        return Err(Error::payload(
            kind,
            format!("prn count {count} disagrees with {} trailing bytes", r.remaining()),
        ));
    }
    let mut prns = Vec::with_capacity(count);
    for _ in 0..count {
        prns.push(r.u32()?);
    }
    Ok(Dop {
        time,
        gdop,
        pdop,
        hdop,
        htdop,
        tdop,
        elevation_cutoff,
        prns,
    })
}

pub(crate) fn sentence(kind: &'static str, s: &ProprietarySentence) -> Result<Dop> {
    let mut f = Fields::at_least(kind, &s.fields, 7)?;
    let gdop = f.f32()?;
    let pdop = f.f32()?;
    let hdop = f.f32()?;
    let htdop = f.f32()?;
    let tdop = f.f32()?;
    let elevation_cutoff = f.f32()?;
    let count = f.u32()? as usize;
    if s.fields.len() != 7 + count {
        return Err(Error::payload(
            kind,
            format!("prn count {count} disagrees with {} fields", s.fields.len()),
        ));
    }
    let mut prns = Vec::with_capacity(count);
    for _ in 0..count {
        prns.push(f.u32()?);
    }
    Ok(Dop {
        time: s.time,
        gdop,
        pdop,
        hdop,
        htdop,
        tdop,
        elevation_cutoff,
        prns,
    })
}
