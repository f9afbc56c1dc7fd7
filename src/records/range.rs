//! Compressed range (observation) data.
use serde::{Deserialize, Serialize};

use super::fields::Reader;
use crate::time::GnssTime;
use crate::{Error, Result};

/// One compressed observation (24 bytes on the wire).
///
/// The tracking status word is unpacked; the remaining five words keep the
/// receiver's bit packing, which downstream observation consumers unpack
/// per signal type.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CompressedRange {
    pub tracking_status: u32,
    pub words: [u32; 5],
}

/// A compressed range report (RANGECMP).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RangeCmp {
    pub time: GnssTime,
    pub observations: Vec<CompressedRange>,
}

const ENTRY_LEN: usize = 24;

pub(crate) fn rangecmp(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<RangeCmp> {
    let mut r = Reader::at_least(kind, payload, 4)?;
    let count = r.u32()? as usize;
    if r.remaining() != count * ENTRY_LEN {
        return Err(Error::payload(
            kind,
            format!(
                "observation count {count} disagrees with {} trailing bytes",
                r.remaining()
            ),
        ));
    }
    let mut observations = Vec::with_capacity(count);
    for _ in 0..count {
        let tracking_status = r.u32()?;
        let mut words = [0u32; 5];
        for w in &mut words {
            *w = r.u32()?;
        }
        observations.push(CompressedRange {
            tracking_status,
            words,
        });
    }
    Ok(RangeCmp { time, observations })
}
