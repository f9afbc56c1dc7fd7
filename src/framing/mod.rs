//! Receiver wire-format framing.
//!
//! The receiver interleaves four framing conventions on one byte stream:
//! CRC-checked binary frames, a compact "micro" binary variant, checksummed
//! NMEA sentences, and proprietary `#`-prefixed sentences. The extractor in
//! this module finds complete, checksum-valid frames in an accumulating
//! buffer; everything downstream works on [Frame] values only.
mod extractor;

pub use extractor::{extract_frames, Extraction};

use crc::{Algorithm, Crc};
use serde::{Deserialize, Serialize};

use crate::time::GnssTime;

/// Synchronization prefix for full binary frames.
pub const BINARY_SYNC: [u8; 3] = [0xaa, 0x44, 0x12];
/// Synchronization prefix for micro binary frames.
pub const MICRO_SYNC: [u8; 3] = [0xaa, 0x44, 0x13];

/// Trailing CRC length for both binary framings.
pub const CRC_LEN: usize = 4;

/// Largest payload length the extractor will trust from a binary header.
pub(crate) const MAX_BINARY_PAYLOAD: usize = 8192;
/// Longest ASCII sentence the extractor will scan for a terminator.
pub(crate) const MAX_SENTENCE_LEN: usize = 1024;

/// The receiver's CRC-32: reflected 0x04C11DB7 with zero init and xorout.
pub const RECEIVER_CRC: Algorithm<u32> = Algorithm {
    width: 32,
    poly: 0x04c1_1db7,
    init: 0x0000_0000,
    refin: true,
    refout: true,
    xorout: 0x0000_0000,
    check: 0x2dfd_2d88,
    residue: 0x0000_0000,
};

/// CRC-32 over `dat` using the receiver's algorithm.
#[must_use]
pub fn crc32(dat: &[u8]) -> u32 {
    Crc::<u32>::new(&RECEIVER_CRC).checksum(dat)
}

/// NMEA-style checksum: XOR of every byte between the leading delimiter and
/// the `*`. Shared by NMEA and proprietary sentences.
#[must_use]
pub fn sentence_checksum(body: &[u8]) -> u8 {
    body.iter().fold(0u8, |acc, b| acc ^ b)
}

/// Header of a full binary frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BinaryHeader {
    pub message_id: u16,
    pub message_type: u8,
    pub port: u8,
    pub payload_len: u16,
    pub sequence: u16,
    pub idle_time: u8,
    pub time_status: u8,
    pub time: GnssTime,
    pub receiver_status: u32,
    pub sw_version: u16,
}

impl BinaryHeader {
    /// Fixed binary header length, recorded in byte 3 of the frame.
    pub const LEN: usize = 28;

    /// Construct from the provided bytes, or `None` if there are not enough
    /// bytes or the recorded header length disagrees.
    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Self> {
        if dat.len() < Self::LEN || dat[..3] != BINARY_SYNC || dat[3] as usize != Self::LEN {
            return None;
        }
        let week = u32::from(u16::from_le_bytes([dat[14], dat[15]]));
        let millis = u32::from_le_bytes([dat[16], dat[17], dat[18], dat[19]]);
        Some(BinaryHeader {
            message_id: u16::from_le_bytes([dat[4], dat[5]]),
            message_type: dat[6],
            port: dat[7],
            payload_len: u16::from_le_bytes([dat[8], dat[9]]),
            sequence: u16::from_le_bytes([dat[10], dat[11]]),
            idle_time: dat[12],
            time_status: dat[13],
            time: GnssTime::new(week, f64::from(millis) / 1e3),
            receiver_status: u32::from_le_bytes([dat[20], dat[21], dat[22], dat[23]]),
            sw_version: u16::from_le_bytes([dat[26], dat[27]]),
        })
    }
}

/// Header of a micro binary frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MicroHeader {
    pub message_id: u16,
    pub payload_len: u8,
    pub time: GnssTime,
}

impl MicroHeader {
    pub const LEN: usize = 12;

    #[must_use]
    pub fn decode(dat: &[u8]) -> Option<Self> {
        if dat.len() < Self::LEN || dat[..3] != MICRO_SYNC {
            return None;
        }
        let week = u32::from(u16::from_le_bytes([dat[6], dat[7]]));
        let millis = u32::from_le_bytes([dat[8], dat[9], dat[10], dat[11]]);
        Some(MicroHeader {
            payload_len: dat[3],
            message_id: u16::from_le_bytes([dat[4], dat[5]]),
            time: GnssTime::new(week, f64::from(millis) / 1e3),
        })
    }
}

/// A complete, CRC-valid binary frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct BinaryFrame {
    pub header: BinaryHeader,
    pub payload: Vec<u8>,
}

/// A complete, CRC-valid micro binary frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MicroBinaryFrame {
    pub header: MicroHeader,
    pub payload: Vec<u8>,
}

/// A checksum-valid NMEA sentence, split on commas.
///
/// `talker` is the first field (e.g. `GPGGA`), `fields` the remainder.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NmeaSentence {
    pub talker: String,
    pub fields: Vec<String>,
}

/// A checksum-valid proprietary sentence.
///
/// The part before the `;` is the header: message name, port, sequence, idle
/// time, time status, week, seconds-of-week. The part after is the
/// comma-split payload field list.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ProprietarySentence {
    pub name: String,
    pub time: GnssTime,
    pub header: Vec<String>,
    pub fields: Vec<String>,
}

/// A frame is only constructed once its checksum verifies; corrupt candidates
/// are discarded by the extractor and never surface here.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum Frame {
    Binary(BinaryFrame),
    MicroBinary(MicroBinaryFrame),
    Nmea(NmeaSentence),
    Proprietary(ProprietarySentence),
}
