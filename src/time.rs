//! GNSS time handling.
//!
//! Receiver-reported times are a GPS week number plus seconds into that week.
//! Conversion to an absolute epoch goes through the GPST time scale, which
//! carries the GPS/UTC leap offset.
use hifitime::Epoch;
use serde::{Deserialize, Serialize};

/// Seconds in one GNSS week.
pub const SECONDS_PER_WEEK: u32 = 604_800;

/// A GNSS week number and seconds-of-week pair.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
pub struct GnssTime {
    pub week: u32,
    pub seconds: f64,
}

impl GnssTime {
    #[must_use]
    pub fn new(week: u32, seconds: f64) -> Self {
        GnssTime { week, seconds }.normalized()
    }

    /// Construct from an untrusted seconds-of-week value.
    ///
    /// `None` unless `seconds` is finite, non-negative, and at most one week
    /// past a rollover. Parsers use this for time fields read out of frame
    /// payloads, which a checksum-valid frame can still carry garbage in.
    #[must_use]
    pub fn checked(week: u32, seconds: f64) -> Option<Self> {
        if seconds.is_finite() && (0.0..2.0 * f64::from(SECONDS_PER_WEEK)).contains(&seconds) {
            Some(GnssTime::new(week, seconds))
        } else {
            None
        }
    }

    /// Wrap a seconds-of-week overflow into the week count.
    ///
    /// Receivers report seconds >= 604800 around week rollover; the week is
    /// incremented and seconds reduced so `0 <= seconds < 604800` holds.
    /// Non-finite or negative seconds are left untouched.
    #[must_use]
    pub fn normalized(self) -> Self {
        let week_len = f64::from(SECONDS_PER_WEEK);
        if !self.seconds.is_finite() || self.seconds < week_len {
            return self;
        }
        let wraps = (self.seconds / week_len).floor();
        GnssTime {
            week: self.week.saturating_add(wraps as u32),
            seconds: (self.seconds - wraps * week_len).clamp(0.0, week_len),
        }
    }

    /// Seconds since the GPS epoch (1980-01-06T00:00:00 UTC).
    #[must_use]
    pub fn total_seconds(&self) -> f64 {
        f64::from(self.week) * f64::from(SECONDS_PER_WEEK) + self.seconds
    }

    /// Absolute epoch for this time.
    #[must_use]
    pub fn epoch(&self) -> Epoch {
        Epoch::from_gpst_seconds(self.total_seconds())
    }
}
