//! Broadcast ephemerides for the Keplerian constellations (GPS, BeiDou,
//! Galileo, QZSS) and the Cartesian GLONASS form.
use serde::{Deserialize, Serialize};

use super::fields::Reader;
use crate::time::GnssTime;
use crate::Result;

/// Keplerian broadcast ephemeris, shared by GPSEPHEM, BDSEPHEMERIS,
/// GALEPHEMERIS, and QZSSEPHEMERIS.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Ephemeris {
    pub time: GnssTime,
    pub prn: u32,
    pub week: u32,
    pub health: u32,
    /// Reference time of ephemeris, seconds of week.
    pub toe: f64,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub mean_anomaly: f64,
    pub mean_motion_diff: f64,
    pub omega0: f64,
    pub omega_dot: f64,
    pub inclination: f64,
    pub inclination_dot: f64,
    pub arg_perigee: f64,
    pub cuc: f64,
    pub cus: f64,
    pub crc: f64,
    pub crs: f64,
    pub cic: f64,
    pub cis: f64,
    /// Reference time of clock, seconds of week.
    pub toc: f64,
    pub af0: f64,
    pub af1: f64,
    pub af2: f64,
}

pub(crate) const EPHEMERIS_LEN: usize = 172;

pub(crate) fn ephemeris(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<Ephemeris> {
    let mut r = Reader::exact(kind, payload, EPHEMERIS_LEN)?;
    Ok(Ephemeris {
        time,
        prn: r.u32()?,
        week: r.u32()?,
        health: r.u32()?,
        toe: r.f64()?,
        semi_major_axis: r.f64()?,
        eccentricity: r.f64()?,
        mean_anomaly: r.f64()?,
        mean_motion_diff: r.f64()?,
        omega0: r.f64()?,
        omega_dot: r.f64()?,
        inclination: r.f64()?,
        inclination_dot: r.f64()?,
        arg_perigee: r.f64()?,
        cuc: r.f64()?,
        cus: r.f64()?,
        crc: r.f64()?,
        crs: r.f64()?,
        cic: r.f64()?,
        cis: r.f64()?,
        toc: r.f64()?,
        af0: r.f64()?,
        af1: r.f64()?,
        af2: r.f64()?,
    })
}

/// GLONASS broadcast ephemeris (GLOEPHEMERIS): PZ-90 position, velocity,
/// and acceleration with clock terms.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct GloEphemeris {
    pub time: GnssTime,
    pub slot: u16,
    pub frequency_offset: i16,
    pub health: u32,
    pub position: [f64; 3],
    pub velocity: [f64; 3],
    pub acceleration: [f64; 3],
    pub clock_bias: f64,
    pub relative_frequency_bias: f64,
    /// Frame reference time within the GLONASS day, seconds.
    pub reference_seconds: u32,
}

pub(crate) const GLOEPHEMERIS_LEN: usize = 100;

pub(crate) fn gloephemeris(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<GloEphemeris> {
    let mut r = Reader::exact(kind, payload, GLOEPHEMERIS_LEN)?;
    let slot = r.u16()?;
    let frequency_offset = r.i16()?;
    let health = r.u32()?;
    let mut triple = || -> Result<[f64; 3]> { Ok([r.f64()?, r.f64()?, r.f64()?]) };
    let position = triple()?;
    let velocity = triple()?;
    let acceleration = triple()?;
    let clock_bias = r.f64()?;
    let relative_frequency_bias = r.f64()?;
    let reference_seconds = r.u32()?;
    Ok(GloEphemeris {
        time,
        slot,
        frequency_offset,
        health,
        position,
        velocity,
        acceleration,
        clock_bias,
        relative_frequency_bias,
        reference_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(e: &Ephemeris) -> Vec<u8> {
        let mut dat = Vec::with_capacity(EPHEMERIS_LEN);
        dat.extend_from_slice(&e.prn.to_le_bytes());
        dat.extend_from_slice(&e.week.to_le_bytes());
        dat.extend_from_slice(&e.health.to_le_bytes());
        for x in [
            e.toe,
            e.semi_major_axis,
            e.eccentricity,
            e.mean_anomaly,
            e.mean_motion_diff,
            e.omega0,
            e.omega_dot,
            e.inclination,
            e.inclination_dot,
            e.arg_perigee,
            e.cuc,
            e.cus,
            e.crc,
            e.crs,
            e.cic,
            e.cis,
            e.toc,
            e.af0,
            e.af1,
            e.af2,
        ] {
            dat.extend_from_slice(&x.to_le_bytes());
        }
        dat
    }

    #[test]
    fn keplerian_round_trip() {
        let want = Ephemeris {
            time: GnssTime::new(2167, 144_140.0),
            prn: 25,
            week: 2167,
            health: 0,
            toe: 147_600.0,
            semi_major_axis: 26_560_221.4,
            eccentricity: 0.011_6,
            mean_anomaly: 1.27,
            mean_motion_diff: 4.4e-9,
            omega0: -2.1,
            omega_dot: -8.1e-9,
            inclination: 0.96,
            inclination_dot: 2.3e-10,
            arg_perigee: 0.72,
            cuc: -2.9e-6,
            cus: 9.1e-6,
            crc: 212.4,
            crs: -55.1,
            cic: 1.3e-7,
            cis: -5.6e-8,
            toc: 147_600.0,
            af0: -3.2e-4,
            af1: -2.0e-12,
            af2: 0.0,
        };
        let got = ephemeris("GPSEPHEM", &encode(&want), want.time).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn glonass_round_trip() {
        let mut dat = Vec::with_capacity(GLOEPHEMERIS_LEN);
        dat.extend_from_slice(&5u16.to_le_bytes());
        dat.extend_from_slice(&(-4i16).to_le_bytes());
        dat.extend_from_slice(&0u32.to_le_bytes());
        for x in [
            11_233.45e3, -7_821.10e3, 21_300.77e3, // position
            1_200.5, -300.25, 2.125, // velocity
            0.0, 9.3e-7, -2.8e-7, // acceleration
            -6.5e-5, 1.8e-11, // clock terms
        ] {
            dat.extend_from_slice(&f64::to_le_bytes(x));
        }
        dat.extend_from_slice(&45_000u32.to_le_bytes());

        let got = gloephemeris("GLOEPHEMERIS", &dat, GnssTime::new(2167, 1.0)).unwrap();
        assert_eq!(got.slot, 5);
        assert_eq!(got.frequency_offset, -4);
        assert_eq!(got.position[2], 21_300.77e3);
        assert_eq!(got.reference_seconds, 45_000);
    }

    #[test]
    fn rejects_wrong_length() {
        let t = GnssTime::new(0, 0.0);
        assert!(ephemeris("GPSEPHEM", &[0u8; EPHEMERIS_LEN - 8], t).is_err());
        assert!(gloephemeris("GLOEPHEMERIS", &[0u8; GLOEPHEMERIS_LEN + 2], t).is_err());
    }
}
