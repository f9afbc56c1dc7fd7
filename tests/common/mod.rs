#![allow(dead_code)]

use bynav::framing::{crc32, sentence_checksum, BinaryHeader, MicroHeader, BINARY_SYNC, MICRO_SYNC};

/// Encode a full binary frame around `payload`.
pub fn binary_frame(message_id: u16, week: u16, millis: u32, payload: &[u8]) -> Vec<u8> {
    let mut dat = vec![0u8; BinaryHeader::LEN];
    dat[..3].copy_from_slice(&BINARY_SYNC);
    dat[3] = BinaryHeader::LEN as u8;
    dat[4..6].copy_from_slice(&message_id.to_le_bytes());
    dat[6] = 0x02;
    dat[7] = 0x20;
    dat[8..10].copy_from_slice(&(payload.len() as u16).to_le_bytes());
    dat[13] = 180;
    dat[14..16].copy_from_slice(&week.to_le_bytes());
    dat[16..20].copy_from_slice(&millis.to_le_bytes());
    dat.extend_from_slice(payload);
    let crc = crc32(&dat);
    dat.extend_from_slice(&crc.to_le_bytes());
    dat
}

/// Encode a micro binary frame around `payload`.
pub fn micro_frame(message_id: u16, week: u16, millis: u32, payload: &[u8]) -> Vec<u8> {
    let mut dat = vec![0u8; MicroHeader::LEN];
    dat[..3].copy_from_slice(&MICRO_SYNC);
    dat[3] = payload.len() as u8;
    dat[4..6].copy_from_slice(&message_id.to_le_bytes());
    dat[6..8].copy_from_slice(&week.to_le_bytes());
    dat[8..12].copy_from_slice(&millis.to_le_bytes());
    dat.extend_from_slice(payload);
    let crc = crc32(&dat);
    dat.extend_from_slice(&crc.to_le_bytes());
    dat
}

/// Encode an NMEA sentence from its body (everything between `$` and `*`).
pub fn nmea(body: &str) -> Vec<u8> {
    format!("${body}*{:02X}\r\n", sentence_checksum(body.as_bytes())).into_bytes()
}

/// Encode a proprietary sentence with a typical header.
pub fn proprietary(name: &str, week: u32, seconds: f64, fields: &str) -> Vec<u8> {
    let body = format!("{name},COM1,0,83.5,FINESTEERING,{week},{seconds:.3},02000020;{fields}");
    format!("#{body}*{:02X}\r\n", sentence_checksum(body.as_bytes())).into_bytes()
}

/// An 88-byte INSPVA payload with the given time and azimuth.
pub fn inspva_payload(week: u32, seconds: f64, azimuth: f64) -> Vec<u8> {
    let mut dat = Vec::with_capacity(88);
    dat.extend_from_slice(&week.to_le_bytes());
    dat.extend_from_slice(&seconds.to_le_bytes());
    for x in [51.116, -114.038, 1048.2, 0.01, -0.02, 0.0, 1.2, -0.4, azimuth] {
        dat.extend_from_slice(&f64::to_le_bytes(x));
    }
    dat.extend_from_slice(&3u32.to_le_bytes());
    dat
}

/// A 60-byte CORRIMUDATA payload with the given time.
pub fn corrimu_payload(week: u32, seconds: f64) -> Vec<u8> {
    let mut dat = Vec::with_capacity(60);
    dat.extend_from_slice(&week.to_le_bytes());
    dat.extend_from_slice(&seconds.to_le_bytes());
    for x in [1.0e-5, 2.0e-5, 3.0e-5, 1.0e-3, 2.0e-3, 9.81e-2] {
        dat.extend_from_slice(&f64::to_le_bytes(x));
    }
    dat
}
