//! The stream processor: transport reads, frame extraction, record dispatch,
//! and the derived inertial pairing.
//!
//! One execution context owns a [StreamProcessor] and calls
//! [`StreamProcessor::process_data`] in a loop. Decoded records land in
//! per-type [BoundedQueue]s grouped in [RecordQueues], which the host holds
//! through an `Arc` and drains on its own schedule.
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use typed_builder::TypedBuilder;

use crate::framing::{extract_frames, Frame};
use crate::queue::BoundedQueue;
use crate::records::{
    self, CorrectedImu, Dop, Ephemeris, GloEphemeris, Gpgga, Gpgsv, Gphdt, Gprmc, Heading,
    InsAttitude, InsAttitudeX, InsStdev, PjkPosition, Position, RangeCmp, RawImu, Record, Velocity,
};
use crate::time::GnssTime;
use crate::timesync::TimeSync;
use crate::transport::{ReadOutcome, Transport};
use crate::{Error, Result};

/// Widest timestamp difference, seconds, at which a corrected inertial
/// sample pairs with an attitude solution.
pub const PAIR_TOLERANCE: f64 = 0.0002;

/// Attitude arrivals an unpaired inertial sample survives before it is
/// dropped.
const MAX_PAIR_TRIES: u32 = 5;

/// Pending samples held on either side of the pairing.
const MAX_PENDING: usize = 10;

/// Sample rate assumed until one can be inferred from timestamp deltas.
const DEFAULT_IMU_RATE: f64 = 100.0;

/// Connection life cycle of a processor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    ReadError,
}

/// Outcome of one [`StreamProcessor::process_data`] call.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ReadResult {
    /// Bytes were read and every complete frame was handled.
    Success,
    /// No bytes within the read budget.
    Timeout,
    /// The read was aborted externally.
    Interrupted,
    /// The transport failed; the connection should be torn down.
    ReadError,
    /// The extractor skipped bytes with no recognizable framing.
    ParseFailed,
    /// A frame is still incomplete; retained for the next call.
    InsufficientData,
}

/// Host-supplied processor configuration.
#[derive(TypedBuilder, Debug, Clone)]
pub struct ReceiverConfig {
    /// Capacity of every per-type record queue.
    #[builder(default = 100)]
    pub queue_capacity: usize,
    /// Budget for a single transport read.
    #[builder(default = Duration::from_millis(50))]
    pub read_timeout: Duration,
    /// Forced derived-inertial output rate, Hz. When unset the receiver's
    /// native rate is inferred and no down-sampling happens.
    #[builder(default)]
    pub imu_rate: Option<f64>,
    /// Logs to request at connection setup: message name and interval in
    /// seconds. A negative interval requests the log once.
    #[builder(default)]
    pub logs: Vec<(String, f64)>,
}

/// A derived inertial measurement: one corrected inertial sample joined with
/// the attitude solution nearest in time, with increments scaled to rates by
/// the sample rate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImuMeasurement {
    pub time: GnssTime,
    pub roll: f64,
    pub pitch: f64,
    pub azimuth: f64,
    /// Body angular rates, radians per second.
    pub pitch_rate: f64,
    pub roll_rate: f64,
    pub yaw_rate: f64,
    /// Body accelerations, m/s^2.
    pub lateral_acceleration: f64,
    pub longitudinal_acceleration: f64,
    pub vertical_acceleration: f64,
    /// The most recent standard-deviation report, if any has arrived.
    pub stdev: Option<InsStdev>,
}

/// Every per-type record queue, shared with the host via `Arc`.
///
/// Each queue is independently locked, so the host can drain one type while
/// the processor enqueues another.
#[derive(Debug)]
pub struct RecordQueues {
    pub best_pos: BoundedQueue<Position>,
    pub best_gnss_pos: BoundedQueue<Position>,
    pub pjk_pos: BoundedQueue<PjkPosition>,
    pub best_vel: BoundedQueue<Velocity>,
    pub heading: BoundedQueue<Heading>,
    pub dop: BoundedQueue<Dop>,
    pub gpgga: BoundedQueue<Gpgga>,
    pub gprmc: BoundedQueue<Gprmc>,
    pub gpgsv: BoundedQueue<Gpgsv>,
    pub gphdt: BoundedQueue<Gphdt>,
    pub ins_attitude: BoundedQueue<InsAttitude>,
    pub ins_attitude_x: BoundedQueue<InsAttitudeX>,
    pub ins_stdev: BoundedQueue<InsStdev>,
    pub corrected_imu: BoundedQueue<CorrectedImu>,
    pub raw_imu: BoundedQueue<RawImu>,
    pub imu: BoundedQueue<ImuMeasurement>,
    pub gps_ephemeris: BoundedQueue<Ephemeris>,
    pub bds_ephemeris: BoundedQueue<Ephemeris>,
    pub gal_ephemeris: BoundedQueue<Ephemeris>,
    pub qzss_ephemeris: BoundedQueue<Ephemeris>,
    pub glo_ephemeris: BoundedQueue<GloEphemeris>,
    pub range_cmp: BoundedQueue<RangeCmp>,
}

impl RecordQueues {
    #[must_use]
    fn new(capacity: usize) -> Self {
        RecordQueues {
            best_pos: BoundedQueue::new(capacity),
            best_gnss_pos: BoundedQueue::new(capacity),
            pjk_pos: BoundedQueue::new(capacity),
            best_vel: BoundedQueue::new(capacity),
            heading: BoundedQueue::new(capacity),
            dop: BoundedQueue::new(capacity),
            gpgga: BoundedQueue::new(capacity),
            gprmc: BoundedQueue::new(capacity),
            gpgsv: BoundedQueue::new(capacity),
            gphdt: BoundedQueue::new(capacity),
            ins_attitude: BoundedQueue::new(capacity),
            ins_attitude_x: BoundedQueue::new(capacity),
            ins_stdev: BoundedQueue::new(capacity),
            corrected_imu: BoundedQueue::new(capacity),
            raw_imu: BoundedQueue::new(capacity),
            imu: BoundedQueue::new(capacity),
            gps_ephemeris: BoundedQueue::new(capacity),
            bds_ephemeris: BoundedQueue::new(capacity),
            gal_ephemeris: BoundedQueue::new(capacity),
            qzss_ephemeris: BoundedQueue::new(capacity),
            glo_ephemeris: BoundedQueue::new(capacity),
            range_cmp: BoundedQueue::new(capacity),
        }
    }

    /// Empty every queue.
    pub fn clear(&self) {
        self.best_pos.clear();
        self.best_gnss_pos.clear();
        self.pjk_pos.clear();
        self.best_vel.clear();
        self.heading.clear();
        self.dop.clear();
        self.gpgga.clear();
        self.gprmc.clear();
        self.gpgsv.clear();
        self.gphdt.clear();
        self.ins_attitude.clear();
        self.ins_attitude_x.clear();
        self.ins_stdev.clear();
        self.corrected_imu.clear();
        self.raw_imu.clear();
        self.imu.clear();
        self.gps_ephemeris.clear();
        self.bds_ephemeris.clear();
        self.gal_ephemeris.clear();
        self.qzss_ephemeris.clear();
        self.glo_ephemeris.clear();
        self.range_cmp.clear();
    }
}

/// Pairs corrected inertial samples with attitude solutions and governs the
/// derived output rate.
#[derive(Debug)]
struct InertialPairing {
    forced_rate: Option<f64>,
    inferred_rate: Option<f64>,
    last_sample_time: Option<f64>,
    last_output_time: Option<f64>,
    pending_samples: Vec<(CorrectedImu, u32)>,
    pending_attitudes: Vec<InsAttitude>,
    latest_stdev: Option<InsStdev>,
}

impl InertialPairing {
    fn new(forced_rate: Option<f64>) -> Self {
        InertialPairing {
            forced_rate,
            inferred_rate: None,
            last_sample_time: None,
            last_output_time: None,
            pending_samples: Vec::new(),
            pending_attitudes: Vec::new(),
            latest_stdev: None,
        }
    }

    fn reset(&mut self) {
        *self = InertialPairing::new(self.forced_rate);
    }

    fn rate(&self) -> f64 {
        self.forced_rate
            .or(self.inferred_rate)
            .unwrap_or(DEFAULT_IMU_RATE)
    }

    fn on_sample(&mut self, sample: CorrectedImu, out: &BoundedQueue<ImuMeasurement>) {
        let t = sample.time.total_seconds();
        if let Some(prev) = self.last_sample_time {
            let dt = t - prev;
            if dt > 0.0 {
                self.inferred_rate = Some((1.0 / dt).round());
            }
        }
        self.last_sample_time = Some(t);

        if self.pending_samples.len() == MAX_PENDING {
            debug!("dropping oldest unpaired inertial sample, pending full");
            self.pending_samples.remove(0);
        }
        self.pending_samples.push((sample, 0));
        self.pair(out);
    }

    fn on_attitude(&mut self, solution: InsAttitude, out: &BoundedQueue<ImuMeasurement>) {
        if self.pending_attitudes.len() == MAX_PENDING {
            self.pending_attitudes.remove(0);
        }
        self.pending_attitudes.push(solution);
        self.pair(out);

        // Samples the new solution still could not pair burn one try.
        let before = self.pending_samples.len();
        for (_, tries) in &mut self.pending_samples {
            *tries += 1;
        }
        self.pending_samples.retain(|(_, tries)| *tries < MAX_PAIR_TRIES);
        let dropped = before - self.pending_samples.len();
        if dropped > 0 {
            debug!(dropped, "dropping inertial samples no attitude matched");
        }
    }

    fn on_stdev(&mut self, stdev: InsStdev) {
        self.latest_stdev = Some(stdev);
    }

    fn pair(&mut self, out: &BoundedQueue<ImuMeasurement>) {
        while let Some((sample, _)) = self.pending_samples.first() {
            let t = sample.time.total_seconds();
            // On an exact tie the later-arriving solution wins.
            let mut best: Option<(usize, f64)> = None;
            for (i, sol) in self.pending_attitudes.iter().enumerate() {
                let diff = (sol.time.total_seconds() - t).abs();
                if diff <= PAIR_TOLERANCE && best.map_or(true, |(_, d)| diff <= d) {
                    best = Some((i, diff));
                }
            }
            let Some((idx, _)) = best else {
                break;
            };
            let (sample, _) = self.pending_samples.remove(0);
            let solution = self.pending_attitudes.remove(idx);
            self.emit(sample, &solution, out);
        }
    }

    fn emit(&mut self, sample: CorrectedImu, solution: &InsAttitude, out: &BoundedQueue<ImuMeasurement>) {
        let t = sample.time.total_seconds();
        let rate = self.rate();
        if let (Some(forced), Some(last)) = (self.forced_rate, self.last_output_time) {
            // Down-sample to the forced rate; never up-sample.
            if t - last < 1.0 / forced - 1e-6 {
                return;
            }
        }
        self.last_output_time = Some(t);
        out.push(ImuMeasurement {
            time: sample.time,
            roll: solution.roll,
            pitch: solution.pitch,
            azimuth: solution.azimuth,
            pitch_rate: sample.pitch_rate * rate,
            roll_rate: sample.roll_rate * rate,
            yaw_rate: sample.yaw_rate * rate,
            lateral_acceleration: sample.lateral_acceleration * rate,
            longitudinal_acceleration: sample.longitudinal_acceleration * rate,
            vertical_acceleration: sample.vertical_acceleration * rate,
            stdev: self.latest_stdev.clone(),
        });
    }
}

/// Drives the byte-to-record pipeline over one transport.
pub struct StreamProcessor<T: Transport> {
    transport: T,
    config: ReceiverConfig,
    state: ConnectionState,
    buffer: Vec<u8>,
    queues: Arc<RecordQueues>,
    pairing: InertialPairing,
    timesync: Option<Arc<TimeSync>>,
}

impl<T: Transport> StreamProcessor<T> {
    #[must_use]
    pub fn new(transport: T, config: ReceiverConfig) -> Self {
        let queues = Arc::new(RecordQueues::new(config.queue_capacity));
        let pairing = InertialPairing::new(config.imu_rate);
        StreamProcessor {
            transport,
            config,
            state: ConnectionState::Disconnected,
            buffer: Vec::new(),
            queues,
            pairing,
            timesync: None,
        }
    }

    /// Feed every decoded frame's receiver time into `timesync` as the
    /// message stream.
    pub fn attach_timesync(&mut self, timesync: Arc<TimeSync>) {
        self.timesync = Some(timesync);
    }

    /// The shared record queues; clone the `Arc` and drain from anywhere.
    #[must_use]
    pub fn queues(&self) -> Arc<RecordQueues> {
        self.queues.clone()
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Configure the receiver's log output and enter [ConnectionState::Connected].
    ///
    /// Silences everything on this port first, then requests each configured
    /// log. Commands go out in message-name order.
    ///
    /// # Errors
    /// [`Error::Io`] if a command write fails; the processor stays
    /// disconnected.
    pub fn connect(&mut self) -> Result<()> {
        self.state = ConnectionState::Connecting;
        let result = self.send_log_commands();
        match result {
            Ok(()) => {
                self.state = ConnectionState::Connected;
                info!(logs = self.config.logs.len(), "receiver configured");
                Ok(())
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                Err(e)
            }
        }
    }

    fn send_log_commands(&mut self) -> Result<()> {
        self.transport.write(b"UNLOGALL THISPORT\r\n")?;
        let mut logs = self.config.logs.clone();
        logs.sort_by(|a, b| a.0.cmp(&b.0));
        for (name, interval) in &logs {
            let cmd = if *interval < 0.0 {
                format!("LOG {name} ONCE\r\n")
            } else {
                format!("LOG {name} ONTIME {interval}\r\n")
            };
            debug!(%cmd, "requesting log");
            self.transport.write(cmd.as_bytes())?;
        }
        Ok(())
    }

    /// Send a factory reset. `target` defaults to `STANDARD`.
    ///
    /// # Errors
    /// [`Error::Io`] if the write fails.
    pub fn freset(&mut self, target: Option<&str>) -> Result<()> {
        let cmd = format!("FRESET {}\r\n", target.unwrap_or("STANDARD"));
        self.transport.write(cmd.as_bytes())?;
        Ok(())
    }

    /// Drop the connection: clear the raw buffer, every queue, and all
    /// pairing state.
    pub fn disconnect(&mut self) {
        self.buffer.clear();
        self.queues.clear();
        self.pairing.reset();
        self.state = ConnectionState::Disconnected;
    }

    /// One read-extract-parse-enqueue cycle.
    pub fn process_data(&mut self) -> ReadResult {
        if self.state != ConnectionState::Connected {
            return ReadResult::ReadError;
        }
        let dat = match self.transport.read(self.config.read_timeout) {
            Ok(ReadOutcome::Data(dat)) => dat,
            Ok(ReadOutcome::Timeout) => return ReadResult::Timeout,
            Ok(ReadOutcome::Interrupted) => return ReadResult::Interrupted,
            Err(err) => {
                warn!(%err, "transport fault");
                self.state = ConnectionState::ReadError;
                return ReadResult::ReadError;
            }
        };
        self.buffer.extend_from_slice(&dat);

        let extraction = extract_frames(&self.buffer);
        for frame in &extraction.frames {
            self.handle_frame(frame);
        }
        self.buffer.drain(..extraction.consumed);

        if extraction.lost > 0 {
            debug!(lost = extraction.lost, "stream lost sync");
            ReadResult::ParseFailed
        } else if extraction.frames.is_empty() && !self.buffer.is_empty() {
            ReadResult::InsufficientData
        } else {
            ReadResult::Success
        }
    }

    fn handle_frame(&mut self, frame: &Frame) {
        if let Some(timesync) = &self.timesync {
            if let Some(time) = frame_time(frame) {
                timesync.record_message(time.total_seconds());
            }
        }
        match records::parse_frame(frame) {
            Ok(record) => self.enqueue(record),
            Err(Error::UnknownMessage(what)) => debug!(%what, "skipping unknown message"),
            Err(err) => debug!(%err, "dropping undecodable record"),
        }
    }

    fn enqueue(&mut self, record: Record) {
        let q = &self.queues;
        match record {
            Record::BestPos(r) => q.best_pos.push(r),
            Record::BestGnssPos(r) => q.best_gnss_pos.push(r),
            Record::PjkPos(r) => q.pjk_pos.push(r),
            Record::BestVel(r) => q.best_vel.push(r),
            Record::Heading(r) => q.heading.push(r),
            Record::Dop(r) => q.dop.push(r),
            Record::Gpgga(r) => q.gpgga.push(r),
            Record::Gprmc(r) => q.gprmc.push(r),
            Record::Gpgsv(r) => q.gpgsv.push(r),
            Record::Gphdt(r) => q.gphdt.push(r),
            Record::InsAttitude(r) => {
                self.pairing.on_attitude(r.clone(), &q.imu);
                q.ins_attitude.push(r);
            }
            Record::InsAttitudeX(r) => q.ins_attitude_x.push(r),
            Record::InsStdev(r) => {
                self.pairing.on_stdev(r.clone());
                q.ins_stdev.push(r);
            }
            Record::CorrectedImu(r) => {
                self.pairing.on_sample(r.clone(), &q.imu);
                q.corrected_imu.push(r);
            }
            Record::RawImu(r) => q.raw_imu.push(r),
            Record::GpsEphemeris(r) => q.gps_ephemeris.push(r),
            Record::BdsEphemeris(r) => q.bds_ephemeris.push(r),
            Record::GalEphemeris(r) => q.gal_ephemeris.push(r),
            Record::QzssEphemeris(r) => q.qzss_ephemeris.push(r),
            Record::GloEphemeris(r) => q.glo_ephemeris.push(r),
            Record::RangeCmp(r) => q.range_cmp.push(r),
        }
    }
}

fn frame_time(frame: &Frame) -> Option<GnssTime> {
    match frame {
        Frame::Binary(f) => Some(f.header.time),
        Frame::MicroBinary(f) => Some(f.header.time),
        Frame::Proprietary(s) => Some(s.time),
        Frame::Nmea(_) => None,
    }
}
