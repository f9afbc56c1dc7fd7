//! Decoded receiver records.
//!
//! Every CRC-valid [Frame] maps to exactly one [Record] variant through
//! [`parse_frame`]. Binary frames and micro binary frames dispatch on the
//! numeric message id, NMEA sentences on the talker, and proprietary
//! sentences on the message name. The same record type backs the binary and
//! ASCII renditions of a log, so consumers never care which framing a value
//! arrived in.
mod dop;
mod ephemeris;
mod fields;
mod heading;
mod imu;
mod ins;
mod nmea;
mod position;
mod range;
mod velocity;

pub use dop::Dop;
pub use ephemeris::{Ephemeris, GloEphemeris};
pub use heading::Heading;
pub use imu::{CorrectedImu, RawImu};
pub use ins::{InsAttitude, InsAttitudeX, InsStdev};
pub use nmea::{Gpgga, Gpgsv, Gphdt, Gprmc, SatelliteInView};
pub use position::{PjkPosition, Position};
pub use range::{CompressedRange, RangeCmp};
pub use velocity::Velocity;

use serde::{Deserialize, Serialize};

use crate::framing::{Frame, MicroBinaryFrame, NmeaSentence, ProprietarySentence};
use crate::{Error, Result};

/// Numeric message ids used by the binary framings.
pub mod msgid {
    pub const GPSEPHEM: u16 = 7;
    pub const BESTPOS: u16 = 42;
    pub const BESTVEL: u16 = 99;
    pub const RANGECMP: u16 = 140;
    pub const PSRDOP: u16 = 174;
    pub const RAWIMU: u16 = 268;
    pub const RAWIMUS: u16 = 325;
    pub const INSPVA: u16 = 507;
    pub const GLOEPHEMERIS: u16 = 723;
    pub const CORRIMUDATA: u16 = 812;
    pub const CORRIMUDATAS: u16 = 813;
    pub const HEADING: u16 = 971;
    pub const GALEPHEMERIS: u16 = 1122;
    pub const QZSSEPHEMERIS: u16 = 1336;
    pub const BESTGNSSPOS: u16 = 1429;
    pub const INSPVAX: u16 = 1465;
    pub const BDSEPHEMERIS: u16 = 1696;
    pub const INSSTDEV: u16 = 2051;
}

/// Numeric solution status for an ASCII status name.
pub(crate) fn solution_status_code(kind: &'static str, name: &str) -> Result<u32> {
    let code = match name {
        "SOL_COMPUTED" => 0,
        "INSUFFICIENT_OBS" => 1,
        "NO_CONVERGENCE" => 2,
        "SINGULARITY" => 3,
        "COV_TRACE" => 4,
        "TEST_DIST" => 5,
        "COLD_START" => 6,
        "V_H_LIMIT" => 7,
        "VARIANCE" => 8,
        "RESIDUALS" => 9,
        _ => {
            return Err(Error::payload(
                kind,
                format!("unrecognized solution status {name:?}"),
            ))
        }
    };
    Ok(code)
}

/// Numeric position/velocity type for an ASCII type name.
pub(crate) fn position_type_code(kind: &'static str, name: &str) -> Result<u32> {
    let code = match name {
        "NONE" => 0,
        "FIXEDPOS" => 1,
        "FIXEDHEIGHT" => 2,
        "DOPPLER_VELOCITY" => 8,
        "SINGLE" => 16,
        "PSRDIFF" => 17,
        "WAAS" => 18,
        "PROPAGATED" => 19,
        "L1_FLOAT" => 32,
        "NARROW_FLOAT" => 34,
        "L1_INT" => 48,
        "WIDE_INT" => 49,
        "NARROW_INT" => 50,
        "INS_PSRSP" => 52,
        "INS_PSRDIFF" => 53,
        "INS_RTKFLOAT" => 54,
        "INS_RTKFIXED" => 55,
        "INS_SBAS" => 56,
        "PPP_CONVERGING" => 68,
        "PPP" => 69,
        _ => {
            return Err(Error::payload(
                kind,
                format!("unrecognized position type {name:?}"),
            ))
        }
    };
    Ok(code)
}

/// Numeric INS filter status for an ASCII status name.
pub(crate) fn ins_status_code(kind: &'static str, name: &str) -> Result<u32> {
    let code = match name {
        "INS_INACTIVE" => 0,
        "INS_ALIGNING" => 1,
        "INS_HIGH_VARIANCE" => 2,
        "INS_SOLUTION_GOOD" => 3,
        "INS_SOLUTION_FREE" => 6,
        "INS_ALIGNMENT_COMPLETE" => 7,
        "DETERMINING_ORIENTATION" => 8,
        "WAITING_INITIALPOS" => 9,
        _ => {
            return Err(Error::payload(
                kind,
                format!("unrecognized INS status {name:?}"),
            ))
        }
    };
    Ok(code)
}

/// A decoded record, one variant per supported log.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Record {
    BestPos(Position),
    BestGnssPos(Position),
    PjkPos(PjkPosition),
    BestVel(Velocity),
    Heading(Heading),
    Dop(Dop),
    Gpgga(Gpgga),
    Gprmc(Gprmc),
    Gpgsv(Gpgsv),
    Gphdt(Gphdt),
    InsAttitude(InsAttitude),
    InsAttitudeX(InsAttitudeX),
    InsStdev(InsStdev),
    CorrectedImu(CorrectedImu),
    RawImu(RawImu),
    GpsEphemeris(Ephemeris),
    BdsEphemeris(Ephemeris),
    GalEphemeris(Ephemeris),
    QzssEphemeris(Ephemeris),
    GloEphemeris(GloEphemeris),
    RangeCmp(RangeCmp),
}

/// Decode a checksum-valid frame into its record.
///
/// # Errors
/// [`Error::UnknownMessage`] for a log this crate does not decode, or
/// [`Error::Payload`] when the framing is recognized but the contents do not
/// parse.
pub fn parse_frame(frame: &Frame) -> Result<Record> {
    match frame {
        Frame::Binary(f) => {
            let (payload, time) = (f.payload.as_slice(), f.header.time);
            match f.header.message_id {
                msgid::BESTPOS => Ok(Record::BestPos(position::binary("BESTPOS", payload, time)?)),
                msgid::BESTGNSSPOS => Ok(Record::BestGnssPos(position::binary(
                    "BESTGNSSPOS",
                    payload,
                    time,
                )?)),
                msgid::BESTVEL => Ok(Record::BestVel(velocity::binary("BESTVEL", payload, time)?)),
                msgid::HEADING => Ok(Record::Heading(heading::binary("HEADING", payload, time)?)),
                msgid::PSRDOP => Ok(Record::Dop(dop::binary("PSRDOP", payload, time)?)),
                msgid::INSPVA => Ok(Record::InsAttitude(ins::inspva("INSPVA", payload, time)?)),
                msgid::INSPVAX => Ok(Record::InsAttitudeX(ins::inspvax("INSPVAX", payload, time)?)),
                msgid::INSSTDEV => Ok(Record::InsStdev(ins::insstdev("INSSTDEV", payload, time)?)),
                msgid::CORRIMUDATA => Ok(Record::CorrectedImu(imu::corrimudata(
                    "CORRIMUDATA",
                    payload,
                    time,
                )?)),
                msgid::RAWIMU => Ok(Record::RawImu(imu::rawimu("RAWIMU", payload, time)?)),
                msgid::GPSEPHEM => Ok(Record::GpsEphemeris(ephemeris::ephemeris(
                    "GPSEPHEM", payload, time,
                )?)),
                msgid::BDSEPHEMERIS => Ok(Record::BdsEphemeris(ephemeris::ephemeris(
                    "BDSEPHEMERIS",
                    payload,
                    time,
                )?)),
                msgid::GALEPHEMERIS => Ok(Record::GalEphemeris(ephemeris::ephemeris(
                    "GALEPHEMERIS",
                    payload,
                    time,
                )?)),
                msgid::QZSSEPHEMERIS => Ok(Record::QzssEphemeris(ephemeris::ephemeris(
                    "QZSSEPHEMERIS",
                    payload,
                    time,
                )?)),
                msgid::GLOEPHEMERIS => Ok(Record::GloEphemeris(ephemeris::gloephemeris(
                    "GLOEPHEMERIS",
                    payload,
                    time,
                )?)),
                msgid::RANGECMP => Ok(Record::RangeCmp(range::rangecmp("RANGECMP", payload, time)?)),
                id => Err(Error::UnknownMessage(format!("binary message id {id}"))),
            }
        }
        Frame::MicroBinary(f) => parse_micro(f),
        Frame::Nmea(s) => parse_nmea(s),
        Frame::Proprietary(s) => parse_proprietary(s),
    }
}

fn parse_micro(f: &MicroBinaryFrame) -> Result<Record> {
    let (payload, time) = (f.payload.as_slice(), f.header.time);
    match f.header.message_id {
        msgid::CORRIMUDATAS => Ok(Record::CorrectedImu(imu::corrimudata(
            "CORRIMUDATAS",
            payload,
            time,
        )?)),
        msgid::RAWIMUS => Ok(Record::RawImu(imu::rawimu("RAWIMUS", payload, time)?)),
        id => Err(Error::UnknownMessage(format!("micro binary message id {id}"))),
    }
}

fn parse_nmea(s: &NmeaSentence) -> Result<Record> {
    match s.talker.as_str() {
        "GPGGA" => Ok(Record::Gpgga(nmea::gpgga(s)?)),
        "GPRMC" => Ok(Record::Gprmc(nmea::gprmc(s)?)),
        "GPGSV" => Ok(Record::Gpgsv(nmea::gpgsv(s)?)),
        "GPHDT" => Ok(Record::Gphdt(nmea::gphdt(s)?)),
        "PTNL" => Ok(Record::PjkPos(position::pjk(s)?)),
        talker => Err(Error::UnknownMessage(format!("NMEA talker {talker}"))),
    }
}

fn parse_proprietary(s: &ProprietarySentence) -> Result<Record> {
    match s.name.as_str() {
        "BESTPOSA" => Ok(Record::BestPos(position::sentence("BESTPOS", s)?)),
        "BESTGNSSPOSA" => Ok(Record::BestGnssPos(position::sentence("BESTGNSSPOS", s)?)),
        "BESTVELA" => Ok(Record::BestVel(velocity::sentence("BESTVEL", s)?)),
        "HEADINGA" => Ok(Record::Heading(heading::sentence("HEADING", s)?)),
        "PSRDOPA" => Ok(Record::Dop(dop::sentence("PSRDOP", s)?)),
        "INSPVAA" => Ok(Record::InsAttitude(ins::inspva_sentence("INSPVA", s)?)),
        name => Err(Error::UnknownMessage(format!("sentence {name}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framing::{BinaryFrame, BinaryHeader};
    use crate::time::GnssTime;

    fn binary_frame(message_id: u16, payload: Vec<u8>) -> Frame {
        Frame::Binary(BinaryFrame {
            header: BinaryHeader {
                message_id,
                message_type: 0x02,
                port: 0x20,
                payload_len: payload.len() as u16,
                sequence: 0,
                idle_time: 0,
                time_status: 180,
                time: GnssTime::new(2167, 144_140.0),
                receiver_status: 0,
                sw_version: 0,
            },
            payload,
        })
    }

    #[test]
    fn dispatches_binary_bestpos() {
        let frame = binary_frame(msgid::BESTPOS, vec![0u8; position::BINARY_LEN]);
        assert!(matches!(parse_frame(&frame), Ok(Record::BestPos(_))));
    }

    #[test]
    fn unknown_binary_id_is_unknown_message() {
        let frame = binary_frame(9999, vec![]);
        assert!(matches!(
            parse_frame(&frame),
            Err(Error::UnknownMessage(_))
        ));
    }

    #[test]
    fn unknown_talker_is_unknown_message() {
        let s = NmeaSentence {
            talker: "GPZDA".to_string(),
            fields: vec![],
        };
        assert!(matches!(
            parse_frame(&Frame::Nmea(s)),
            Err(Error::UnknownMessage(_))
        ));
    }

    #[test]
    fn status_tables_resolve_manual_names() {
        assert_eq!(solution_status_code("BESTPOS", "SOL_COMPUTED").unwrap(), 0);
        assert_eq!(position_type_code("BESTPOS", "NARROW_INT").unwrap(), 50);
        assert_eq!(ins_status_code("INSPVA", "INS_SOLUTION_GOOD").unwrap(), 3);
        assert!(solution_status_code("BESTPOS", "BOGUS").is_err());
    }
}
