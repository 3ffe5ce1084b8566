// Link supervisors for both ends of the radio link.
// This is the only place that looks at time; callers pass `now` in.

use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::codec::{self, WireFrame};
use crate::config::BoatConfig;
use crate::input::{InputSampler, InputSource};
use crate::link::{LinkLayer, Radio};
use crate::messages::{CommandFrame, LinkState, MotionState, VehicleStatus};
use crate::motor::{MotionController, MotorOutputSink};

/// Control station: sample, encode, send. Once per tick, no retries.
pub struct ControlSupervisor<R: Radio, I: InputSource> {
    link: LinkLayer<R>,
    sampler: InputSampler<I>,
    next_seq: u16,
    send_failures: u64,
    failing: bool,
}

impl<R: Radio, I: InputSource> ControlSupervisor<R, I> {
    pub fn new(link: LinkLayer<R>, sampler: InputSampler<I>) -> Self {
        Self {
            link,
            sampler,
            next_seq: 0,
            send_failures: 0,
            failing: false,
        }
    }

    /// Send the freshest input. A failed send is dropped; the next tick
    /// carries newer input anyway.
    pub fn tick(&mut self) -> CommandFrame {
        let command = self.sampler.sample();
        let bytes = codec::encode(&WireFrame::new(self.next_seq, command));
        self.next_seq = self.next_seq.wrapping_add(1);

        match self.link.send(&bytes) {
            Ok(()) => {
                if self.failing {
                    info!("Send recovered after {} failures", self.send_failures);
                    self.failing = false;
                }
            }
            Err(e) => {
                self.send_failures += 1;
                if !self.failing {
                    warn!("Send failed: {}", e);
                    self.failing = true;
                } else {
                    debug!("Send failed: {}", e);
                }
            }
        }

        command
    }

    pub fn send_failures(&self) -> u64 {
        self.send_failures
    }

    pub fn sampler(&self) -> &InputSampler<I> {
        &self.sampler
    }
}

/// Vehicle: drain the link, run the watchdog, drive the motors
pub struct VehicleSupervisor<R: Radio, S: MotorOutputSink> {
    link: LinkLayer<R>,
    controller: MotionController<S>,
    stale_after: Duration,
    link_timeout: Duration,
    last_valid: Option<Instant>,
    last_seq: Option<u16>,
    link_state: LinkState,
    rejected: u64,
}

impl<R: Radio, S: MotorOutputSink> VehicleSupervisor<R, S> {
    /// Starts Lost until the first valid frame
    pub fn new(link: LinkLayer<R>, controller: MotionController<S>, config: &BoatConfig) -> Self {
        Self {
            link,
            controller,
            stale_after: config.stale_after,
            link_timeout: config.link_timeout,
            last_valid: None,
            last_seq: None,
            link_state: LinkState::Lost,
            rejected: 0,
        }
    }

    pub fn tick(&mut self, now: Instant) -> VehicleStatus {
        // 1. Drain pending frames (non-blocking)
        while let Some((payload, _sender)) = self.link.receive(now) {
            self.accept(&payload, now);
        }

        // 2. Watchdog
        let state = self.evaluate(now);
        if state != self.link_state {
            match state {
                LinkState::Connected => info!("Link connected"),
                LinkState::Stale => warn!("Link stale, frames missing"),
                LinkState::Lost => warn!(
                    "Link lost: no valid frame for over {}ms",
                    self.link_timeout.as_millis()
                ),
            }
            self.link_state = state;
        }
        if state == LinkState::Lost {
            self.controller.enter_failsafe();
            // A restarted control station counts from zero again
            self.last_seq = None;
        }

        // 3. Motors, once per tick
        let outputs = self.controller.update();

        VehicleStatus {
            link: self.link_state,
            motion: self.controller.state(),
            outputs,
            rejected: self.rejected,
            discarded: self.link.discarded(),
        }
    }

    fn accept(&mut self, payload: &[u8], now: Instant) {
        let frame = match codec::decode(payload) {
            Ok(frame) => frame,
            Err(e) => {
                self.rejected += 1;
                warn!("Dropping frame: {}", e);
                return;
            }
        };

        if let Some(last) = self.last_seq {
            if !codec::is_newer(frame.seq, last) {
                self.rejected += 1;
                debug!("Dropping old frame seq={} (last={})", frame.seq, last);
                return;
            }
        }

        self.last_seq = Some(frame.seq);
        self.last_valid = Some(now);
        self.controller.on_command(frame.command);
    }

    fn evaluate(&self, now: Instant) -> LinkState {
        let Some(last) = self.last_valid else {
            return LinkState::Lost;
        };
        let age = now.saturating_duration_since(last);
        if age <= self.stale_after {
            LinkState::Connected
        } else if age <= self.link_timeout {
            LinkState::Stale
        } else {
            LinkState::Lost
        }
    }

    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    pub fn controller(&self) -> &MotionController<S> {
        &self.controller
    }
}

/// Control station view of the boat's published health.
/// Only link or motion changes are reported; counters alone are not news.
#[derive(Debug, Default)]
pub struct HealthMonitor {
    last: Option<(LinkState, MotionState)>,
    malformed: u64,
}

impl HealthMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse one health payload. Returns the status when it changed link or motion state.
    pub fn observe(&mut self, payload: &[u8]) -> Option<VehicleStatus> {
        let status: VehicleStatus = match serde_json::from_slice(payload) {
            Ok(status) => status,
            Err(e) => {
                self.malformed += 1;
                debug!("Ignoring malformed health payload: {}", e);
                return None;
            }
        };

        let state = (status.link, status.motion);
        if self.last == Some(state) {
            return None;
        }
        self.last = Some(state);

        match status.motion {
            MotionState::Failsafe => warn!(
                "Boat in failsafe: link={:?}, rejected={}, discarded={}",
                status.link, status.rejected, status.discarded
            ),
            MotionState::Running => info!("Boat running: link={:?}", status.link),
        }
        Some(status)
    }

    pub fn last(&self) -> Option<(LinkState, MotionState)> {
        self.last
    }

    pub fn malformed(&self) -> u64 {
        self.malformed
    }
}
