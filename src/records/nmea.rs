//! Standard NMEA sentence records: GGA, RMC, GSV, HDT.
use serde::{Deserialize, Serialize};

use super::fields::{dm_to_degrees, hms_to_seconds, Fields};
use crate::framing::NmeaSentence;
use crate::Result;

/// A GPGGA fix sentence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Gpgga {
    /// UTC seconds of day.
    pub utc_seconds: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub fix_quality: u32,
    pub satellites_used: u8,
    pub hdop: f32,
    pub altitude: f64,
    pub undulation: f64,
    pub differential_age: Option<f64>,
    pub station_id: String,
}

pub(crate) fn gpgga(s: &NmeaSentence) -> Result<Gpgga> {
    const KIND: &str = "GPGGA";
    let mut f = Fields::exact(KIND, &s.fields, 14)?;
    let utc_seconds = hms_to_seconds(f.f64()?);
    let lat = f.f64()?;
    let lat_dir = f.str()?;
    let lon = f.f64()?;
    let lon_dir = f.str()?;
    let fix_quality = f.u32()?;
    let satellites_used = f.u8()?;
    let hdop = f.f32()?;
    let altitude = f.f64()?;
    f.str()?; // altitude units, always M
    let undulation = f.f64()?;
    f.str()?; // undulation units, always M
    let differential_age = f.opt_f64()?;
    let station_id = f.str()?.to_string();
    Ok(Gpgga {
        utc_seconds,
        latitude: dm_to_degrees(lat, lat_dir),
        longitude: dm_to_degrees(lon, lon_dir),
        fix_quality,
        satellites_used,
        hdop,
        altitude,
        undulation,
        differential_age,
        station_id,
    })
}

/// A GPRMC recommended-minimum sentence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Gprmc {
    pub utc_seconds: f64,
    pub position_valid: bool,
    pub latitude: f64,
    pub longitude: f64,
    pub ground_speed_knots: f64,
    pub track_degrees: f64,
    /// ddmmyy as transmitted.
    pub date: String,
}

pub(crate) fn gprmc(s: &NmeaSentence) -> Result<Gprmc> {
    const KIND: &str = "GPRMC";
    let mut f = Fields::at_least(KIND, &s.fields, 9)?;
    let utc_seconds = hms_to_seconds(f.f64()?);
    let position_valid = f.str()? == "A";
    let lat = f.f64()?;
    let lat_dir = f.str()?;
    let lon = f.f64()?;
    let lon_dir = f.str()?;
    let ground_speed_knots = f.f64()?;
    let track_degrees = f.f64()?;
    let date = f.str()?.to_string();
    Ok(Gprmc {
        utc_seconds,
        position_valid,
        latitude: dm_to_degrees(lat, lat_dir),
        longitude: dm_to_degrees(lon, lon_dir),
        ground_speed_knots,
        track_degrees,
        date,
    })
}

/// One satellite entry within a GPGSV sentence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SatelliteInView {
    pub prn: u16,
    pub elevation: u16,
    pub azimuth: u16,
    /// Empty when the satellite is not being tracked.
    pub snr: Option<f64>,
}

/// A GPGSV satellites-in-view sentence (one page of up to four satellites).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Gpgsv {
    pub total_sentences: u8,
    pub sentence_number: u8,
    pub satellites_in_view: u8,
    pub satellites: Vec<SatelliteInView>,
}

pub(crate) fn gpgsv(s: &NmeaSentence) -> Result<Gpgsv> {
    const KIND: &str = "GPGSV";
    let mut f = Fields::at_least(KIND, &s.fields, 3)?;
    let total_sentences = f.u8()?;
    let sentence_number = f.u8()?;
    let satellites_in_view = f.u8()?;
    let entries = (s.fields.len() - 3) / 4;
    let mut satellites = Vec::with_capacity(entries);
    for _ in 0..entries {
        satellites.push(SatelliteInView {
            prn: f.u16()?,
            elevation: f.u16()?,
            azimuth: f.u16()?,
            snr: f.opt_f64()?,
        });
    }
    Ok(Gpgsv {
        total_sentences,
        sentence_number,
        satellites_in_view,
        satellites,
    })
}

/// A GPHDT true-heading sentence.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Gphdt {
    pub heading: f64,
}

pub(crate) fn gphdt(s: &NmeaSentence) -> Result<Gphdt> {
    const KIND: &str = "GPHDT";
    let mut f = Fields::exact(KIND, &s.fields, 2)?;
    let heading = f.f64()?;
    Ok(Gphdt { heading })
}
