//! Pulse-to-message time reconciliation.
//!
//! An external synchronization source produces pulse timestamps while the
//! decode path produces message timestamps; the two clocks drift against each
//! other. [TimeSync] pairs the two streams and maintains a rolling estimate
//! of the offset between them, which the host adds to every outgoing record
//! timestamp.
//!
//! Recording is lock-free so the pulse side can run from an interrupt-driven
//! context; only [`TimeSync::reconcile`] takes the state lock, and it holds
//! it for the whole matching pass so neither stream can tear the comparison.
use std::collections::VecDeque;
use std::sync::Mutex;

use crossbeam::channel::{bounded, Receiver, Sender};
use serde::Serialize;
use tracing::{debug, trace};

/// Widest pulse-to-message difference accepted as a match, seconds.
pub const MATCH_WINDOW: f64 = 0.49;

/// Offsets averaged for [`TimeSync::current_offset`].
pub const ROLLING_WINDOW: usize = 10;

/// Pending timestamps retained per stream between reconcile passes.
const QUEUE_CAP: usize = 100;

#[derive(Debug, Default)]
struct OffsetStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: Option<f64>,
    max: Option<f64>,
    window: VecDeque<f64>,
}

impl OffsetStats {
    fn record(&mut self, offset: f64) {
        self.count += 1;
        let delta = offset - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (offset - self.mean);
        self.min = Some(self.min.map_or(offset, |m| m.min(offset)));
        self.max = Some(self.max.map_or(offset, |m| m.max(offset)));
        if self.window.len() == ROLLING_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(offset);
    }

    fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    fn rolling_mean(&self) -> Option<f64> {
        if self.window.is_empty() {
            None
        } else {
            Some(self.window.iter().sum::<f64>() / self.window.len() as f64)
        }
    }
}

#[derive(Debug, Default)]
struct SyncState {
    pulses: VecDeque<f64>,
    messages: VecDeque<f64>,
    last_sync: Option<f64>,
    stats: OffsetStats,
}

/// Read-only view of the reconciliation state for host diagnostics.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct SyncSnapshot {
    pub matched: u64,
    pub mean_offset: f64,
    pub offset_variance: f64,
    pub min_offset: Option<f64>,
    pub max_offset: Option<f64>,
    pub rolling_offset: Option<f64>,
    pub last_sync: Option<f64>,
    pub pending_pulses: usize,
}

/// Reconciles an external pulse stream against decoded message times.
#[derive(Debug)]
pub struct TimeSync {
    pulse_tx: Sender<f64>,
    pulse_rx: Receiver<f64>,
    message_tx: Sender<f64>,
    message_rx: Receiver<f64>,
    state: Mutex<SyncState>,
}

impl Default for TimeSync {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSync {
    #[must_use]
    pub fn new() -> Self {
        let (pulse_tx, pulse_rx) = bounded(QUEUE_CAP);
        let (message_tx, message_rx) = bounded(QUEUE_CAP);
        TimeSync {
            pulse_tx,
            pulse_rx,
            message_tx,
            message_rx,
            state: Mutex::new(SyncState::default()),
        }
    }

    /// Record an external pulse timestamp, seconds.
    ///
    /// Dropped if [`TimeSync::reconcile`] has fallen `QUEUE_CAP` pulses
    /// behind; recording never blocks.
    pub fn record_pulse(&self, timestamp: f64) {
        if self.pulse_tx.try_send(timestamp).is_err() {
            debug!(timestamp, "pulse queue full, dropping");
        }
    }

    /// Record a decoded message timestamp, seconds.
    ///
    /// Same overflow policy as [`TimeSync::record_pulse`].
    pub fn record_message(&self, timestamp: f64) {
        if self.message_tx.try_send(timestamp).is_err() {
            debug!(timestamp, "message queue full, dropping");
        }
    }

    /// Run one matching pass over everything recorded so far.
    ///
    /// Matching is monotonic in both streams. Each pending pulse takes the
    /// nearest message within [MATCH_WINDOW]; earlier messages it skipped
    /// over are dropped. Messages left over once every pulse has been tried
    /// are dropped too, since a message can only ever pair with a pulse near
    /// its own time. Pulses whose message has not arrived yet stay pending.
    ///
    /// Returns the number of matches made this pass.
    pub fn reconcile(&self) -> usize {
        let mut state = self.state.lock().expect("timesync lock poisoned");
        for t in self.pulse_rx.try_iter() {
            if state.pulses.len() == QUEUE_CAP {
                state.pulses.pop_front();
            }
            state.pulses.push_back(t);
        }
        for t in self.message_rx.try_iter() {
            if state.messages.len() == QUEUE_CAP {
                state.messages.pop_front();
            }
            state.messages.push_back(t);
        }

        let mut matched = 0;
        let mut unmatched = VecDeque::new();
        while let Some(pulse) = state.pulses.pop_front() {
            match nearest_in_window(&state.messages, pulse) {
                Some(idx) => {
                    let message = state.messages[idx];
                    let skipped = idx;
                    state.messages.drain(..=idx);
                    let offset = pulse - message;
                    state.stats.record(offset);
                    state.last_sync = Some(pulse);
                    matched += 1;
                    trace!(pulse, message, offset, skipped, "matched pulse");
                }
                None => unmatched.push_back(pulse),
            }
        }
        state.pulses = unmatched;

        if !state.messages.is_empty() {
            debug!(
                dropped = state.messages.len(),
                "dropping message times no pulse claimed"
            );
            state.messages.clear();
        }
        matched
    }

    /// The current clock offset to add to outgoing timestamps.
    ///
    /// Rolling mean of the most recent matched offsets, or 0.0 before the
    /// first match.
    #[must_use]
    pub fn current_offset(&self) -> f64 {
        let state = self.state.lock().expect("timesync lock poisoned");
        state.stats.rolling_mean().unwrap_or(0.0)
    }

    #[must_use]
    pub fn snapshot(&self) -> SyncSnapshot {
        let state = self.state.lock().expect("timesync lock poisoned");
        SyncSnapshot {
            matched: state.stats.count,
            mean_offset: state.stats.mean,
            offset_variance: state.stats.variance(),
            min_offset: state.stats.min,
            max_offset: state.stats.max,
            rolling_offset: state.stats.rolling_mean(),
            last_sync: state.last_sync,
            pending_pulses: state.pulses.len(),
        }
    }
}

/// Index of the in-window message nearest to `pulse`.
///
/// Message times arrive in increasing order, so the scan can stop as soon as
/// a message is past the window's far edge.
fn nearest_in_window(messages: &VecDeque<f64>, pulse: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &t) in messages.iter().enumerate() {
        if t > pulse + MATCH_WINDOW {
            break;
        }
        let diff = (pulse - t).abs();
        if diff < MATCH_WINDOW && best.map_or(true, |(_, d)| diff <= d) {
            best = Some((i, diff));
        }
    }
    best.map(|(i, _)| i)
}
