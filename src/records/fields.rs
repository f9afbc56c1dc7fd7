//! Field extraction helpers shared by every parser.
//!
//! Binary payloads use little-endian fixed layouts read through [Reader];
//! ASCII sentences use comma-split fields read through [Fields] with
//! empty-field tolerance.
use crate::time::GnssTime;
use crate::{Error, Result};

/// Build a [GnssTime] from week/seconds fields carried inside a payload.
///
/// A checksum-valid frame can still carry garbage in its time fields, so
/// the seconds value is range-checked rather than trusted.
pub(crate) fn payload_time(kind: &'static str, week: u32, seconds: f64) -> Result<GnssTime> {
    GnssTime::checked(week, seconds)
        .ok_or_else(|| Error::payload(kind, format!("seconds-of-week {seconds} out of range")))
}

/// Little-endian cursor over a binary payload.
pub(crate) struct Reader<'a> {
    kind: &'static str,
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    /// A payload must match its schema length exactly; a short or oversized
    /// payload is rejected before any field is extracted.
    pub fn exact(kind: &'static str, buf: &'a [u8], want: usize) -> Result<Self> {
        if buf.len() != want {
            return Err(Error::payload(
                kind,
                format!("expected {want} bytes, got {}", buf.len()),
            ));
        }
        Ok(Reader { kind, buf, pos: 0 })
    }

    /// For variable-length payloads: require at least `want` bytes up front,
    /// the caller checks the trailing portion itself.
    pub fn at_least(kind: &'static str, buf: &'a [u8], want: usize) -> Result<Self> {
        if buf.len() < want {
            return Err(Error::payload(
                kind,
                format!("expected at least {want} bytes, got {}", buf.len()),
            ));
        }
        Ok(Reader { kind, buf, pos: 0 })
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::payload(self.kind, "payload ended mid-field"));
        }
        let out = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(out)
    }

    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn i16(&mut self) -> Result<i16> {
        let b = self.take(2)?;
        Ok(i16::from_le_bytes([b[0], b[1]]))
    }

    pub fn u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn i32(&mut self) -> Result<i32> {
        let b = self.take(4)?;
        Ok(i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn f32(&mut self) -> Result<f32> {
        let b = self.take(4)?;
        Ok(f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn f64(&mut self) -> Result<f64> {
        let b = self.take(8)?;
        Ok(f64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }
}

/// Cursor over the comma-split fields of an ASCII sentence.
///
/// Empty fields are legal NMEA and decode as `None`/zero; a field that is
/// present but unparseable is a payload error.
pub(crate) struct Fields<'a> {
    kind: &'static str,
    fields: &'a [String],
    pos: usize,
}

impl<'a> Fields<'a> {
    pub fn exact(kind: &'static str, fields: &'a [String], want: usize) -> Result<Self> {
        if fields.len() != want {
            return Err(Error::payload(
                kind,
                format!("expected {want} fields, got {}", fields.len()),
            ));
        }
        Ok(Fields {
            kind,
            fields,
            pos: 0,
        })
    }

    pub fn at_least(kind: &'static str, fields: &'a [String], want: usize) -> Result<Self> {
        if fields.len() < want {
            return Err(Error::payload(
                kind,
                format!("expected at least {want} fields, got {}", fields.len()),
            ));
        }
        Ok(Fields {
            kind,
            fields,
            pos: 0,
        })
    }

    pub fn str(&mut self) -> Result<&'a str> {
        let f = self
            .fields
            .get(self.pos)
            .ok_or_else(|| Error::payload(self.kind, "field list ended early"))?;
        self.pos += 1;
        Ok(f.as_str())
    }

    fn parse<T: std::str::FromStr>(&mut self, default: T) -> Result<T> {
        let pos = self.pos;
        let f = self.str()?;
        if f.is_empty() {
            return Ok(default);
        }
        f.parse().map_err(|_| {
            Error::payload(self.kind, format!("unparseable field {pos}: {f:?}"))
        })
    }

    pub fn f64(&mut self) -> Result<f64> {
        self.parse(0.0)
    }

    pub fn f32(&mut self) -> Result<f32> {
        self.parse(0.0)
    }

    pub fn u32(&mut self) -> Result<u32> {
        self.parse(0)
    }

    pub fn u16(&mut self) -> Result<u16> {
        self.parse(0)
    }

    pub fn u8(&mut self) -> Result<u8> {
        self.parse(0)
    }

    pub fn opt_f64(&mut self) -> Result<Option<f64>> {
        let pos = self.pos;
        let f = self.str()?;
        if f.is_empty() {
            return Ok(None);
        }
        f.parse()
            .map(Some)
            .map_err(|_| Error::payload(self.kind, format!("unparseable field {pos}: {f:?}")))
    }
}

/// NMEA `ddmm.mmmm` latitude / `dddmm.mmmm` longitude to signed degrees.
pub(crate) fn dm_to_degrees(dm: f64, hemisphere: &str) -> f64 {
    let degrees = (dm / 100.0).trunc();
    let minutes = dm - degrees * 100.0;
    let value = degrees + minutes / 60.0;
    match hemisphere {
        "S" | "W" => -value,
        _ => value,
    }
}

/// NMEA `hhmmss.ss` to seconds of day.
pub(crate) fn hms_to_seconds(hms: f64) -> f64 {
    let hours = (hms / 10000.0).trunc();
    let minutes = ((hms - hours * 10000.0) / 100.0).trunc();
    let seconds = hms - hours * 10000.0 - minutes * 100.0;
    hours * 3600.0 + minutes * 60.0 + seconds
}
