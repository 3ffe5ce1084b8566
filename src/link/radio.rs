// Radio channel abstraction plus an in-process loopback pair

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::address::PeerAddress;
use super::mailbox::{Mailbox, Postbox};
use crate::error::SendError;

/// One frame as it came off the air
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub payload: Vec<u8>,
    pub sender: PeerAddress,
}

/// Connectionless point-to-point channel addressed by hardware address.
/// Neither method may block the caller's tick.
pub trait Radio {
    fn local_address(&self) -> PeerAddress;

    /// Best-effort transmit, no internal retry
    fn transmit(&mut self, dest: PeerAddress, payload: &[u8]) -> Result<(), SendError>;

    /// Newest pending delivery, if any
    fn poll(&mut self) -> Option<Delivery>;
}

/// Shared on/off switch for a loopback pair, used to simulate fading out of range
#[derive(Clone, Default)]
pub struct AirGap(Arc<AtomicBool>);

impl AirGap {
    pub fn cut(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn restore(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    fn is_cut(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// In-process radio. Frames are delivered to the other end of the pair
/// only when addressed to it.
pub struct LoopbackRadio {
    local: PeerAddress,
    remote: PeerAddress,
    outbox: Postbox<Delivery>,
    inbox: Mailbox<Delivery>,
    inbox_postbox: Postbox<Delivery>,
    gap: AirGap,
}

impl LoopbackRadio {
    /// Two connected radios plus the switch that cuts the air between them
    pub fn pair(a: PeerAddress, b: PeerAddress) -> (LoopbackRadio, LoopbackRadio, AirGap) {
        let (to_a, inbox_a) = Mailbox::new();
        let (to_b, inbox_b) = Mailbox::new();
        let gap = AirGap::default();

        let radio_a = LoopbackRadio {
            local: a,
            remote: b,
            outbox: to_b.clone(),
            inbox: inbox_a,
            inbox_postbox: to_a.clone(),
            gap: gap.clone(),
        };
        let radio_b = LoopbackRadio {
            local: b,
            remote: a,
            outbox: to_a,
            inbox: inbox_b,
            inbox_postbox: to_b,
            gap: gap.clone(),
        };
        (radio_a, radio_b, gap)
    }

    /// Postbox for this radio's inbox, for injecting frames from arbitrary senders
    pub fn injector(&self) -> Postbox<Delivery> {
        self.inbox_postbox.clone()
    }
}

impl Radio for LoopbackRadio {
    fn local_address(&self) -> PeerAddress {
        self.local
    }

    fn transmit(&mut self, dest: PeerAddress, payload: &[u8]) -> Result<(), SendError> {
        if self.gap.is_cut() || dest != self.remote {
            return Err(SendError::PeerUnreachable);
        }
        self.outbox.post(Delivery {
            payload: payload.to_vec(),
            sender: self.local,
        });
        Ok(())
    }

    fn poll(&mut self) -> Option<Delivery> {
        self.inbox.take()
    }
}
