//! Best-position solutions, GNSS-only position solutions, and local-grid
//! (projected) positions.
use serde::{Deserialize, Serialize};

use super::fields::{hms_to_seconds, Fields, Reader};
use super::{position_type_code, solution_status_code};
use crate::framing::{NmeaSentence, ProprietarySentence};
use crate::time::GnssTime;
use crate::{Error, Result};

/// A geodetic position solution (BESTPOS / BESTGNSSPOS).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Position {
    pub time: GnssTime,
    pub solution_status: u32,
    pub position_type: u32,
    pub latitude: f64,
    pub longitude: f64,
    pub height: f64,
    pub undulation: f32,
    pub datum_id: u32,
    pub latitude_sigma: f32,
    pub longitude_sigma: f32,
    pub height_sigma: f32,
    pub base_station_id: String,
    pub differential_age: f32,
    pub solution_age: f32,
    pub satellites_tracked: u8,
    pub satellites_used: u8,
}

pub(crate) const BINARY_LEN: usize = 72;

pub(crate) fn binary(kind: &'static str, payload: &[u8], time: GnssTime) -> Result<Position> {
    let mut r = Reader::exact(kind, payload, BINARY_LEN)?;
    let solution_status = r.u32()?;
    let position_type = r.u32()?;
    let latitude = r.f64()?;
    let longitude = r.f64()?;
    let height = r.f64()?;
    let undulation = r.f32()?;
    let datum_id = r.u32()?;
    let latitude_sigma = r.f32()?;
    let longitude_sigma = r.f32()?;
    let height_sigma = r.f32()?;
    let mut station = [0u8; 4];
    for b in &mut station {
        *b = r.u8()?;
    }
    let differential_age = r.f32()?;
    let solution_age = r.f32()?;
    let satellites_tracked = r.u8()?;
    let satellites_used = r.u8()?;
    r.skip(6)?; // reserved + extended status + signal mask

    Ok(Position {
        time,
        solution_status,
        position_type,
        latitude,
        longitude,
        height,
        undulation,
        datum_id,
        latitude_sigma,
        longitude_sigma,
        height_sigma,
        base_station_id: station_id(&station),
        differential_age,
        solution_age,
        satellites_tracked,
        satellites_used,
    })
}

pub(crate) fn sentence(kind: &'static str, s: &ProprietarySentence) -> Result<Position> {
    let mut f = Fields::at_least(kind, &s.fields, 15)?;
    Ok(Position {
        time: s.time,
        solution_status: solution_status_code(kind, f.str()?)?,
        position_type: position_type_code(kind, f.str()?)?,
        latitude: f.f64()?,
        longitude: f.f64()?,
        height: f.f64()?,
        undulation: f.f32()?,
        datum_id: {
            f.str()?; // datum name, fixed WGS84 on this receiver
            61
        },
        latitude_sigma: f.f32()?,
        longitude_sigma: f.f32()?,
        height_sigma: f.f32()?,
        base_station_id: f.str()?.trim_matches('"').to_string(),
        differential_age: f.f32()?,
        solution_age: f.f32()?,
        satellites_tracked: f.u8()?,
        satellites_used: f.u8()?,
    })
}

fn station_id(raw: &[u8; 4]) -> String {
    raw.iter()
        .take_while(|&&b| b != 0)
        .map(|&b| b as char)
        .collect()
}

/// A position in a local projected grid (PTNL,PJK sentence).
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PjkPosition {
    pub utc_seconds: f64,
    pub date: String,
    pub northing: f64,
    pub easting: f64,
    pub fix_quality: u32,
    pub satellites_used: u8,
    pub dop: f32,
    pub height: f64,
}

pub(crate) fn pjk(s: &NmeaSentence) -> Result<PjkPosition> {
    const KIND: &str = "PTNL,PJK";
    let mut f = Fields::exact(KIND, &s.fields, 12)?;
    let tag = f.str()?;
    if tag != "PJK" {
        return Err(Error::payload(KIND, format!("unexpected subtype {tag:?}")));
    }
    let utc_seconds = hms_to_seconds(f.f64()?);
    let date = f.str()?.to_string();
    let northing = f.f64()?;
    expect_literal(KIND, f.str()?, "N")?;
    let easting = f.f64()?;
    expect_literal(KIND, f.str()?, "E")?;
    let fix_quality = f.u32()?;
    let satellites_used = f.u8()?;
    let dop = f.f32()?;
    let height_field = f.str()?;
    let height = height_field
        .strip_prefix("EHT")
        .unwrap_or(height_field)
        .parse()
        .map_err(|_| Error::payload(KIND, format!("bad height field {height_field:?}")))?;
    expect_literal(KIND, f.str()?, "M")?;

    Ok(PjkPosition {
        utc_seconds,
        date,
        northing,
        easting,
        fix_quality,
        satellites_used,
        dop,
        height,
    })
}

fn expect_literal(kind: &'static str, got: &str, want: &str) -> Result<()> {
    if got == want {
        Ok(())
    } else {
        Err(Error::payload(
            kind,
            format!("expected literal {want:?}, got {got:?}"),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn encode(p: &Position) -> Vec<u8> {
        let mut dat = Vec::with_capacity(BINARY_LEN);
        dat.extend_from_slice(&p.solution_status.to_le_bytes());
        dat.extend_from_slice(&p.position_type.to_le_bytes());
        dat.extend_from_slice(&p.latitude.to_le_bytes());
        dat.extend_from_slice(&p.longitude.to_le_bytes());
        dat.extend_from_slice(&p.height.to_le_bytes());
        dat.extend_from_slice(&p.undulation.to_le_bytes());
        dat.extend_from_slice(&p.datum_id.to_le_bytes());
        dat.extend_from_slice(&p.latitude_sigma.to_le_bytes());
        dat.extend_from_slice(&p.longitude_sigma.to_le_bytes());
        dat.extend_from_slice(&p.height_sigma.to_le_bytes());
        let mut station = [0u8; 4];
        for (i, b) in p.base_station_id.bytes().take(4).enumerate() {
            station[i] = b;
        }
        dat.extend_from_slice(&station);
        dat.extend_from_slice(&p.differential_age.to_le_bytes());
        dat.extend_from_slice(&p.solution_age.to_le_bytes());
        dat.push(p.satellites_tracked);
        dat.push(p.satellites_used);
        dat.extend_from_slice(&[0u8; 6]);
        dat
    }

    fn example() -> Position {
        Position {
            time: GnssTime::new(2167, 144_140.0),
            solution_status: 0,
            position_type: 50,
            latitude: 51.116_320_830,
            longitude: -114.038_338_0,
            height: 1048.234,
            undulation: -16.27,
            datum_id: 61,
            latitude_sigma: 0.012,
            longitude_sigma: 0.011,
            height_sigma: 0.022,
            base_station_id: "AAAA".to_string(),
            differential_age: 1.0,
            solution_age: 0.0,
            satellites_tracked: 16,
            satellites_used: 12,
        }
    }

    #[test]
    fn binary_round_trip() {
        let want = example();
        let got = binary("BESTPOS", &encode(&want), want.time).unwrap();
        assert_eq!(got, want);
    }

    #[test]
    fn binary_rejects_short_payload() {
        let dat = encode(&example());
        let err = binary("BESTPOS", &dat[..70], example().time);
        assert!(matches!(err, Err(Error::Payload { .. })));
    }

    #[test]
    fn ascii_sentence_decodes() {
        let fields: Vec<String> = [
            "SOL_COMPUTED",
            "NARROW_INT",
            "51.11632083",
            "-114.03833800",
            "1048.234",
            "-16.27",
            "WGS84",
            "0.012",
            "0.011",
            "0.022",
            "\"AAAA\"",
            "1.0",
            "0.0",
            "16",
            "12",
            "0",
            "0",
            "0",
            "0",
            "02",
            "33",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let s = ProprietarySentence {
            name: "BESTPOSA".to_string(),
            time: GnssTime::new(2167, 144_140.0),
            header: vec![],
            fields,
        };
        let p = sentence("BESTPOS", &s).unwrap();
        assert_eq!(p.solution_status, 0);
        assert_eq!(p.position_type, 50);
        assert!((p.latitude - 51.116_320_83).abs() < 1e-12);
        assert_eq!(p.base_station_id, "AAAA");
        assert_eq!(p.satellites_used, 12);
    }

    #[test]
    fn pjk_sentence_decodes() {
        let fields: Vec<String> = [
            "PJK",
            "102823.80",
            "090121",
            "+3733431.907",
            "N",
            "+14820.297",
            "E",
            "3",
            "09",
            "1.9",
            "EHT+20.3",
            "M",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        let s = NmeaSentence {
            talker: "PTNL".to_string(),
            fields,
        };
        let p = pjk(&s).unwrap();
        assert!((p.northing - 3_733_431.907).abs() < 1e-9);
        assert!((p.easting - 14_820.297).abs() < 1e-9);
        assert_eq!(p.fix_quality, 3);
        assert!((p.height - 20.3).abs() < 1e-9);
        assert!((p.utc_seconds - (10.0 * 3600.0 + 28.0 * 60.0 + 23.8)).abs() < 1e-9);
    }
}
