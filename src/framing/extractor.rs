use tracing::{debug, trace};

use super::{
    crc32, sentence_checksum, BinaryFrame, BinaryHeader, Frame, MicroBinaryFrame, MicroHeader,
    NmeaSentence, ProprietarySentence, BINARY_SYNC, CRC_LEN, MAX_BINARY_PAYLOAD, MAX_SENTENCE_LEN,
    MICRO_SYNC,
};
use crate::time::GnssTime;

/// Result of one extraction pass over an accumulated buffer.
#[derive(Debug, Default)]
pub struct Extraction {
    /// Complete, checksum-valid frames in stream order.
    pub frames: Vec<Frame>,
    /// Leading bytes fully dealt with; the caller retains only the remainder.
    pub consumed: usize,
    /// Well-delimited frame candidates dropped for checksum or structure.
    pub discarded: usize,
    /// Bytes skipped with no sync pattern at all. Non-zero means the stream
    /// lost sync at some point; already-extracted frames are still valid.
    pub lost: usize,
}

enum Start {
    Binary,
    Micro,
    Sentence(u8),
    /// Buffer ends in a prefix of a binary sync sequence.
    PartialSync,
}

enum Scan {
    /// A complete frame of the given total encoded length.
    Complete(Box<Frame>, usize),
    /// The candidate needs more bytes; retain from its first byte.
    Incomplete,
    /// The candidate is corrupt or malformed; skip this many bytes.
    Invalid(usize),
}

/// Extract every complete frame from `buf`.
///
/// The scan walks all four framing conventions in arbitrary interleaving.
/// A partial frame at the tail is never consumed, so the caller can retain
/// it and retry once more bytes arrive. A candidate failing its CRC or
/// checksum is dropped alone; scanning resumes after it.
#[must_use]
pub fn extract_frames(buf: &[u8]) -> Extraction {
    let mut out = Extraction::default();
    let mut pos = 0;

    while pos < buf.len() {
        let rest = &buf[pos..];
        let Some((gap, start)) = find_candidate(rest) else {
            out.lost += count_noise(rest);
            pos = buf.len();
            out.consumed = pos;
            break;
        };
        out.lost += count_noise(&rest[..gap]);
        pos += gap;
        out.consumed = pos;

        let rest = &buf[pos..];
        let scan = match start {
            Start::PartialSync => Scan::Incomplete,
            Start::Binary => scan_binary(rest),
            Start::Micro => scan_micro(rest),
            Start::Sentence(delim) => scan_sentence(rest, delim),
        };
        match scan {
            Scan::Complete(frame, len) => {
                out.frames.push(*frame);
                pos += len;
                out.consumed = pos;
            }
            Scan::Incomplete => break,
            Scan::Invalid(skip) => {
                debug!(offset = pos, skip, "discarding corrupt frame candidate");
                out.discarded += 1;
                pos += skip;
                out.consumed = pos;
            }
        }
    }

    trace!(
        frames = out.frames.len(),
        consumed = out.consumed,
        discarded = out.discarded,
        lost = out.lost,
        "extraction pass"
    );
    out
}

/// Locate the earliest frame candidate, returning its offset and kind.
fn find_candidate(buf: &[u8]) -> Option<(usize, Start)> {
    for (i, &b) in buf.iter().enumerate() {
        match b {
            b'$' | b'#' => return Some((i, Start::Sentence(b))),
            0xaa => {
                if i + 2 < buf.len() {
                    if buf[i + 1] == 0x44 {
                        if buf[i + 2] == BINARY_SYNC[2] {
                            return Some((i, Start::Binary));
                        }
                        if buf[i + 2] == MICRO_SYNC[2] {
                            return Some((i, Start::Micro));
                        }
                    }
                } else if i + 1 == buf.len() || buf[i + 1] == 0x44 {
                    return Some((i, Start::PartialSync));
                }
            }
            _ => {}
        }
    }
    None
}

/// Gap bytes that indicate sync loss. Line terminators between sentences are
/// expected and not counted.
fn count_noise(gap: &[u8]) -> usize {
    gap.iter()
        .filter(|&&b| b != b'\r' && b != b'\n' && b != 0)
        .count()
}

fn scan_binary(rest: &[u8]) -> Scan {
    if rest.len() > 3 && rest[3] as usize != BinaryHeader::LEN {
        return Scan::Invalid(3);
    }
    if rest.len() < BinaryHeader::LEN {
        return Scan::Incomplete;
    }
    let Some(header) = BinaryHeader::decode(rest) else {
        return Scan::Invalid(3);
    };
    let payload_len = header.payload_len as usize;
    if payload_len > MAX_BINARY_PAYLOAD {
        return Scan::Invalid(3);
    }
    let total = BinaryHeader::LEN + payload_len + CRC_LEN;
    if rest.len() < total {
        return Scan::Incomplete;
    }
    let want = u32::from_le_bytes([
        rest[total - 4],
        rest[total - 3],
        rest[total - 2],
        rest[total - 1],
    ]);
    if crc32(&rest[..total - CRC_LEN]) != want {
        return Scan::Invalid(total);
    }
    let payload = rest[BinaryHeader::LEN..BinaryHeader::LEN + payload_len].to_vec();
    Scan::Complete(Box::new(Frame::Binary(BinaryFrame { header, payload })), total)
}

fn scan_micro(rest: &[u8]) -> Scan {
    if rest.len() < MicroHeader::LEN {
        return Scan::Incomplete;
    }
    let Some(header) = MicroHeader::decode(rest) else {
        return Scan::Invalid(3);
    };
    let total = MicroHeader::LEN + header.payload_len as usize + CRC_LEN;
    if rest.len() < total {
        return Scan::Incomplete;
    }
    let want = u32::from_le_bytes([
        rest[total - 4],
        rest[total - 3],
        rest[total - 2],
        rest[total - 1],
    ]);
    if crc32(&rest[..total - CRC_LEN]) != want {
        return Scan::Invalid(total);
    }
    let payload = rest[MicroHeader::LEN..total - CRC_LEN].to_vec();
    Scan::Complete(
        Box::new(Frame::MicroBinary(MicroBinaryFrame { header, payload })),
        total,
    )
}

fn scan_sentence(rest: &[u8], delim: u8) -> Scan {
    let limit = rest.len().min(MAX_SENTENCE_LEN);
    let mut star = None;
    for (i, &b) in rest.iter().enumerate().take(limit).skip(1) {
        match b {
            b'*' => {
                star = Some(i);
                break;
            }
            // A terminator before the checksum marker means the sentence was
            // truncated at the source.
            b'\r' | b'\n' => return Scan::Invalid(i),
            _ => {}
        }
    }
    let Some(star) = star else {
        if rest.len() >= MAX_SENTENCE_LEN {
            // Runaway sentence with no checksum marker, drop the delimiter
            // and rescan what follows.
            return Scan::Invalid(1);
        }
        return Scan::Incomplete;
    };
    if rest.len() < star + 3 {
        return Scan::Incomplete;
    }

    let mut total = star + 3;
    let Some(want) = std::str::from_utf8(&rest[star + 1..star + 3])
        .ok()
        .and_then(|h| u8::from_str_radix(h, 16).ok())
    else {
        return Scan::Invalid(total);
    };
    if sentence_checksum(&rest[1..star]) != want {
        return Scan::Invalid(total);
    }
    // Take any already-buffered line terminator along with the sentence.
    while total < rest.len() && (rest[total] == b'\r' || rest[total] == b'\n') {
        total += 1;
    }
    let Ok(body) = std::str::from_utf8(&rest[1..star]) else {
        return Scan::Invalid(total);
    };

    let frame = if delim == b'$' {
        let mut parts = body.split(',');
        let talker = parts.next().unwrap_or_default();
        if talker.is_empty() {
            return Scan::Invalid(total);
        }
        Frame::Nmea(NmeaSentence {
            talker: talker.to_string(),
            fields: parts.map(str::to_string).collect(),
        })
    } else {
        let Some((head, data)) = body.split_once(';') else {
            return Scan::Invalid(total);
        };
        let header: Vec<String> = head.split(',').map(str::to_string).collect();
        if header.len() < 7 {
            return Scan::Invalid(total);
        }
        let (Ok(week), Ok(seconds)) = (header[5].parse::<u32>(), header[6].parse::<f64>()) else {
            return Scan::Invalid(total);
        };
        let Some(time) = GnssTime::checked(week, seconds) else {
            return Scan::Invalid(total);
        };
        Frame::Proprietary(ProprietarySentence {
            name: header[0].clone(),
            time,
            header,
            fields: data.split(',').map(str::to_string).collect(),
        })
    };
    Scan::Complete(Box::new(frame), total)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_frame(message_id: u16, week: u16, millis: u32, payload: &[u8]) -> Vec<u8> {
        let mut dat = vec![0u8; BinaryHeader::LEN];
        dat[..3].copy_from_slice(&BINARY_SYNC);
        dat[3] = BinaryHeader::LEN as u8;
        dat[4..6].copy_from_slice(&message_id.to_le_bytes());
        dat[6] = 0x02;
        dat[7] = 0x20;
        dat[8..10].copy_from_slice(&(payload.len() as u16).to_le_bytes());
        dat[14..16].copy_from_slice(&week.to_le_bytes());
        dat[16..20].copy_from_slice(&millis.to_le_bytes());
        dat.extend_from_slice(payload);
        let crc = crc32(&dat);
        dat.extend_from_slice(&crc.to_le_bytes());
        dat
    }

    fn micro_frame(message_id: u16, week: u16, millis: u32, payload: &[u8]) -> Vec<u8> {
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

    fn sentence(delim: u8, body: &str) -> Vec<u8> {
        let mut dat = vec![delim];
        dat.extend_from_slice(body.as_bytes());
        dat.extend_from_slice(format!("*{:02X}\r\n", sentence_checksum(body.as_bytes())).as_bytes());
        dat
    }

    const PROPRIETARY_HEAD: &str = "COM1,0,83.5,FINESTEERING,2167,144140.000,02000020";

    #[test]
    fn empty_buffer_yields_nothing() {
        let ext = extract_frames(&[]);
        assert!(ext.frames.is_empty());
        assert_eq!(ext.consumed, 0);
    }

    #[test]
    fn mixed_framing_with_partial_tail() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&binary_frame(42, 2167, 1000, &[1, 2, 3, 4]));
        buf.extend_from_slice(&sentence(b'$', "GPHDT,75.5664,T"));
        buf.extend_from_slice(&micro_frame(813, 2167, 2000, &[9; 16]));
        buf.extend_from_slice(&sentence(b'#', &format!("BESTVELA,{PROPRIETARY_HEAD};0,0,0.25,4.0")));
        let whole = buf.len();
        let partial = &binary_frame(99, 2167, 3000, &[5; 44])[..20];
        buf.extend_from_slice(partial);

        let ext = extract_frames(&buf);
        assert_eq!(ext.frames.len(), 4);
        assert_eq!(ext.consumed, whole);
        assert_eq!(ext.discarded, 0);
        assert_eq!(ext.lost, 0);
        assert!(matches!(ext.frames[0], Frame::Binary(_)));
        assert!(matches!(ext.frames[1], Frame::Nmea(_)));
        assert!(matches!(ext.frames[2], Frame::MicroBinary(_)));
        assert!(matches!(ext.frames[3], Frame::Proprietary(_)));
    }

    #[test]
    fn single_corrupt_frame_dropped_neighbors_kept() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&binary_frame(42, 2167, 1000, &[1, 2, 3, 4]));
        let mut bad = binary_frame(99, 2167, 2000, &[7; 8]);
        let flip = BinaryHeader::LEN + 2;
        bad[flip] ^= 0xff;
        buf.extend_from_slice(&bad);
        buf.extend_from_slice(&binary_frame(971, 2167, 3000, &[8; 44]));

        let ext = extract_frames(&buf);
        assert_eq!(ext.frames.len(), 2);
        assert_eq!(ext.discarded, 1);
        assert_eq!(ext.consumed, buf.len());
        let Frame::Binary(ref first) = ext.frames[0] else {
            panic!("expected binary frame");
        };
        assert_eq!(first.header.message_id, 42);
        let Frame::Binary(ref second) = ext.frames[1] else {
            panic!("expected binary frame");
        };
        assert_eq!(second.header.message_id, 971);
    }

    #[test]
    fn corrupt_sentence_checksum_is_discarded() {
        let mut buf = sentence(b'$', "GPHDT,75.5664,T");
        let star = buf.iter().position(|&b| b == b'*').unwrap();
        buf[star + 1] = b'0';
        buf[star + 2] = b'0';
        buf.extend_from_slice(&sentence(b'$', "GPHDT,76.0000,T"));

        let ext = extract_frames(&buf);
        assert_eq!(ext.frames.len(), 1);
        assert_eq!(ext.discarded, 1);
        let Frame::Nmea(ref s) = ext.frames[0] else {
            panic!("expected sentence");
        };
        assert_eq!(s.fields[0], "76.0000");
    }

    #[test]
    fn garbage_between_frames_is_reported_lost() {
        let mut buf = vec![0x01, 0x02, 0x03];
        buf.extend_from_slice(&binary_frame(42, 2167, 1000, &[1, 2]));

        let ext = extract_frames(&buf);
        assert_eq!(ext.frames.len(), 1);
        assert_eq!(ext.lost, 3);
        assert_eq!(ext.consumed, buf.len());
    }

    #[test]
    fn line_terminators_between_sentences_are_benign() {
        let mut buf = sentence(b'$', "GPHDT,75.5664,T");
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&sentence(b'$', "GPHDT,76.0000,T"));

        let ext = extract_frames(&buf);
        assert_eq!(ext.frames.len(), 2);
        assert_eq!(ext.lost, 0);
    }

    #[test]
    fn partial_sync_prefix_is_retained() {
        let buf = [0x11, 0x22, 0xaa, 0x44];
        let ext = extract_frames(&buf);
        assert!(ext.frames.is_empty());
        assert_eq!(ext.consumed, 2);
        assert_eq!(ext.lost, 2);
    }

    #[test]
    fn proprietary_header_time_is_decoded() {
        let buf = sentence(b'#', &format!("HEADINGA,{PROPRIETARY_HEAD};0,0,1.44,75.56"));
        let ext = extract_frames(&buf);
        let Frame::Proprietary(ref s) = ext.frames[0] else {
            panic!("expected proprietary sentence");
        };
        assert_eq!(s.name, "HEADINGA");
        assert_eq!(s.time.week, 2167);
        assert!((s.time.seconds - 144_140.0).abs() < 1e-9);
        assert_eq!(s.fields.len(), 4);
    }

    #[test]
    fn proprietary_absurd_seconds_of_week_is_discarded() {
        let head = "COM1,0,83.5,FINESTEERING,2167,1e300,02000020";
        let mut buf = sentence(b'#', &format!("HEADINGA,{head};0,0,1.44,75.56"));
        buf.extend_from_slice(&sentence(b'$', "GPHDT,76.0000,T"));
        let ext = extract_frames(&buf);
        assert_eq!(ext.frames.len(), 1);
        assert_eq!(ext.discarded, 1);
        assert!(matches!(ext.frames[0], Frame::Nmea(_)));
    }

    #[test]
    fn truncated_sentence_before_star_is_discarded() {
        let mut buf = b"$GPGGA,134658.00\r\n".to_vec();
        buf.extend_from_slice(&sentence(b'$', "GPHDT,76.0000,T"));
        let ext = extract_frames(&buf);
        assert_eq!(ext.frames.len(), 1);
        assert_eq!(ext.discarded, 1);
    }
}
