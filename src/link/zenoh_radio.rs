// Radio over zenoh.
// Key layout: boat/link/<dest>/<src>, both as 12 lowercase hex digits.

use tracing::{debug, warn};
use zenoh::pubsub::Subscriber;
use zenoh::qos::CongestionControl;
use zenoh::sample::Sample;
use zenoh::{Session, Wait};

use super::address::PeerAddress;
use super::mailbox::{Mailbox, Postbox};
use super::radio::{Delivery, Radio};
use crate::config::TOPIC_LINK_BASE;
use crate::error::SendError;

pub struct ZenohRadio {
    session: Session,
    local: PeerAddress,
    inbox: Mailbox<Delivery>,
    _subscriber: Subscriber<()>,
}

impl ZenohRadio {
    /// Subscribe to everything addressed to `local`.
    /// The callback only posts into the mailbox; the tick loop drains it.
    pub async fn open(session: Session, local: PeerAddress) -> zenoh::Result<Self> {
        let (postbox, inbox) = Mailbox::new();
        let key = format!("{}/{}/*", TOPIC_LINK_BASE, local.key_chunk());
        debug!("Subscribing radio inbox on {}", key);

        let subscriber = session
            .declare_subscriber(key)
            .callback(move |sample: Sample| on_sample(&postbox, sample))
            .await?;

        Ok(Self {
            session,
            local,
            inbox,
            _subscriber: subscriber,
        })
    }
}

fn on_sample(postbox: &Postbox<Delivery>, sample: Sample) {
    let key = sample.key_expr().as_str();
    let Some(sender) = key.rsplit('/').next().and_then(|s| s.parse().ok()) else {
        warn!("Dropping frame on unparseable key {}", key);
        return;
    };
    postbox.post(Delivery {
        payload: sample.payload().to_bytes().into_owned(),
        sender,
    });
}

impl Radio for ZenohRadio {
    fn local_address(&self) -> PeerAddress {
        self.local
    }

    fn transmit(&mut self, dest: PeerAddress, payload: &[u8]) -> Result<(), SendError> {
        let key = format!(
            "{}/{}/{}",
            TOPIC_LINK_BASE,
            dest.key_chunk(),
            self.local.key_chunk()
        );
        self.session
            .put(key, payload.to_vec())
            .congestion_control(CongestionControl::Drop)
            .wait()
            .map_err(|e| {
                debug!("zenoh put failed: {}", e);
                SendError::ChannelBusy
            })
    }

    fn poll(&mut self) -> Option<Delivery> {
        self.inbox.take()
    }
}
