//! Inertial navigation solutions: attitude/velocity, extended solutions,
//! and solution standard deviations.
use serde::{Deserialize, Serialize};

use super::fields::{payload_time, Fields, Reader};
use super::ins_status_code;
use crate::framing::ProprietarySentence;
use crate::time::GnssTime;
use crate::Result;

/// A combined attitude/velocity INS solution (INSPVA).
///
/// The payload carries its own week/seconds pair, timestamped by the INS
/// filter rather than the log header.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsAttitude {
    pub time: GnssTime,
    pub latitude: f64,
    pub longitude: f64,
    pub height: f64,
    pub north_velocity: f64,
    pub east_velocity: f64,
    pub up_velocity: f64,
    /// Degrees, right-handed rotation around east.
    pub roll: f64,
    /// Degrees, right-handed rotation around north.
    pub pitch: f64,
    /// Degrees clockwise from true north.
    pub azimuth: f64,
    pub status: u32,
}

pub(crate) const INSPVA_LEN: usize = 88;

pub(crate) fn inspva(kind: &'static str, payload: &[u8], _header_time: GnssTime) -> Result<InsAttitude> {
    let mut r = Reader::exact(kind, payload, INSPVA_LEN)?;
    let week = r.u32()?;
    let seconds = r.f64()?;
    Ok(InsAttitude {
        time: payload_time(kind, week, seconds)?,
        latitude: r.f64()?,
        longitude: r.f64()?,
        height: r.f64()?,
        north_velocity: r.f64()?,
        east_velocity: r.f64()?,
        up_velocity: r.f64()?,
        roll: r.f64()?,
        pitch: r.f64()?,
        azimuth: r.f64()?,
        status: r.u32()?,
    })
}

pub(crate) fn inspva_sentence(kind: &'static str, s: &ProprietarySentence) -> Result<InsAttitude> {
    let mut f = Fields::exact(kind, &s.fields, 12)?;
    let week = f.u32()?;
    let seconds = f.f64()?;
    Ok(InsAttitude {
        time: payload_time(kind, week, seconds)?,
        latitude: f.f64()?,
        longitude: f.f64()?,
        height: f.f64()?,
        north_velocity: f.f64()?,
        east_velocity: f.f64()?,
        up_velocity: f.f64()?,
        roll: f.f64()?,
        pitch: f.f64()?,
        azimuth: f.f64()?,
        status: ins_status_code(kind, f.str()?)?,
    })
}

/// The extended INS solution (INSPVAX): position type, undulation, and
/// per-component standard deviations alongside the INSPVA fields.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsAttitudeX {
    pub time: GnssTime,
    pub ins_status: u32,
    pub position_type: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub height: f64,
    pub undulation: f32,
    pub north_velocity: f64,
    pub east_velocity: f64,
    pub up_velocity: f64,
    pub roll: f64,
    pub pitch: f64,
    pub azimuth: f64,
    pub latitude_sigma: f32,
    pub longitude_sigma: f32,
    pub height_sigma: f32,
    pub north_velocity_sigma: f32,
    pub east_velocity_sigma: f32,
    pub up_velocity_sigma: f32,
    pub roll_sigma: f32,
    pub pitch_sigma: f32,
    pub azimuth_sigma: f32,
    pub extended_status: u32,
    pub seconds_since_update: u16,
}

pub(crate) const INSPVAX_LEN: usize = 126;

pub(crate) fn inspvax(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<InsAttitudeX> {
    let mut r = Reader::exact(kind, payload, INSPVAX_LEN)?;
    Ok(InsAttitudeX {
        time,
        ins_status: r.u32()?,
        position_type: r.u32()?,
        latitude: r.f64()?,
        longitude: r.f64()?,
        height: r.f64()?,
        undulation: r.f32()?,
        north_velocity: r.f64()?,
        east_velocity: r.f64()?,
        up_velocity: r.f64()?,
        roll: r.f64()?,
        pitch: r.f64()?,
        azimuth: r.f64()?,
        latitude_sigma: r.f32()?,
        longitude_sigma: r.f32()?,
        height_sigma: r.f32()?,
        north_velocity_sigma: r.f32()?,
        east_velocity_sigma: r.f32()?,
        up_velocity_sigma: r.f32()?,
        roll_sigma: r.f32()?,
        pitch_sigma: r.f32()?,
        azimuth_sigma: r.f32()?,
        extended_status: r.u32()?,
        seconds_since_update: r.u16()?,
    })
}

/// INS solution standard deviations (INSSTDEV).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct InsStdev {
    pub time: GnssTime,
    pub latitude_sigma: f32,
    pub longitude_sigma: f32,
    pub height_sigma: f32,
    pub north_velocity_sigma: f32,
    pub east_velocity_sigma: f32,
    pub up_velocity_sigma: f32,
    pub roll_sigma: f32,
    pub pitch_sigma: f32,
    pub azimuth_sigma: f32,
    pub extended_status: u32,
    pub seconds_since_update: u16,
}

pub(crate) const INSSTDEV_LEN: usize = 44;

pub(crate) fn insstdev(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<InsStdev> {
    let mut r = Reader::exact(kind, payload, INSSTDEV_LEN)?;
    let out = InsStdev {
        time,
        latitude_sigma: r.f32()?,
        longitude_sigma: r.f32()?,
        height_sigma: r.f32()?,
        north_velocity_sigma: r.f32()?,
        east_velocity_sigma: r.f32()?,
        up_velocity_sigma: r.f32()?,
        roll_sigma: r.f32()?,
        pitch_sigma: r.f32()?,
        azimuth_sigma: r.f32()?,
        extended_status: r.u32()?,
        seconds_since_update: r.u16()?,
    };
    r.skip(2)?; // reserved
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn encode_inspva(v: &InsAttitude) -> Vec<u8> {
        let mut dat = Vec::with_capacity(INSPVA_LEN);
        dat.extend_from_slice(&v.time.week.to_le_bytes());
        dat.extend_from_slice(&v.time.seconds.to_le_bytes());
        for x in [
            v.latitude,
            v.longitude,
            v.height,
            v.north_velocity,
            v.east_velocity,
            v.up_velocity,
            v.roll,
            v.pitch,
            v.azimuth,
        ] {
            dat.extend_from_slice(&x.to_le_bytes());
        }
        dat.extend_from_slice(&v.status.to_le_bytes());
        dat
    }

    pub(crate) fn example_inspva(seconds: f64) -> InsAttitude {
        InsAttitude {
            time: GnssTime::new(2167, seconds),
            latitude: 51.116_37,
            longitude: -114.038_32,
            height: 1048.4,
            north_velocity: 0.02,
            east_velocity: -0.01,
            up_velocity: 0.003,
            roll: 1.25,
            pitch: -0.42,
            azimuth: 75.6,
            status: 3,
        }
    }

    #[test]
    fn inspva_round_trip() {
        let want = example_inspva(144_140.0);
        let got = inspva("INSPVA", &encode_inspva(&want), GnssTime::new(0, 0.0)).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn inspva_time_comes_from_payload_not_header() {
        let want = example_inspva(1000.5);
        let got = inspva("INSPVA", &encode_inspva(&want), GnssTime::new(9, 9.0)).unwrap();
        assert_eq!(got.time, GnssTime::new(2167, 1000.5));
    }

    #[test]
    fn inspva_sentence_decodes() {
        let fields: Vec<String> = [
            "2167",
            "144140.000000000",
            "51.11637",
            "-114.03832",
            "1048.4",
            "0.02",
            "-0.01",
            "0.003",
            "1.25",
            "-0.42",
            "75.6",
            "INS_SOLUTION_GOOD",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let s = ProprietarySentence {
            name: "INSPVAA".to_string(),
            time: GnssTime::new(2167, 144_140.0),
            header: vec![],
            fields,
        };
        let v = inspva_sentence("INSPVA", &s).unwrap();
        assert_eq!(v.status, 3);
        assert_eq!(v.azimuth, 75.6);
    }

    #[test]
    fn insstdev_round_trip() {
        let mut dat = Vec::with_capacity(INSSTDEV_LEN);
        for x in [0.03f32, 0.03, 0.05, 0.01, 0.01, 0.02, 0.1, 0.1, 0.3] {
            dat.extend_from_slice(&x.to_le_bytes());
        }
        dat.extend_from_slice(&0u32.to_le_bytes());
        dat.extend_from_slice(&4u16.to_le_bytes());
        dat.extend_from_slice(&[0u8; 2]);

        let got = insstdev("INSSTDEV", &dat, GnssTime::new(2167, 1.0)).unwrap();
        assert_eq!(got.azimuth_sigma, 0.3);
        assert_eq!(got.seconds_since_update, 4);
    }

    #[test]
    fn inspvax_length_is_exact() {
        assert!(inspvax("INSPVAX", &[0u8; INSPVAX_LEN - 1], GnssTime::new(0, 0.0)).is_err());
        assert!(inspvax("INSPVAX", &[0u8; INSPVAX_LEN], GnssTime::new(0, 0.0)).is_ok());
    }
}
