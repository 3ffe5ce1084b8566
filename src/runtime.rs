// Tick loops for the vehicle and the control station.
// Each tick is one non-preemptible unit: radio callbacks only fill the
// mailbox, and nothing but the tick writes motor outputs.

use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use std::time::Instant;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{info, warn};
use zenoh::Session;
use zenoh::sample::Sample;

use crate::config::{BoatConfig, TOPIC_HEALTH};
use crate::input::{InputSampler, KeyboardInput};
use crate::link::mailbox::Mailbox;
use crate::link::{LinkLayer, Role, ZenohRadio};
use crate::messages::VehicleStatus;
use crate::motor::{HBridgeBridge, LogSink, MotionController, MotorOutputSink};
use crate::supervisor::{ControlSupervisor, HealthMonitor, VehicleSupervisor};

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type RuntimeResult = Result<(), BoxError>;

async fn open_link(
    config: &BoatConfig,
    role: Role,
) -> Result<(Session, LinkLayer<ZenohRadio>), BoxError> {
    config.validate()?;

    info!("Opening Zenoh session...");
    let session = zenoh::open(zenoh::Config::default()).await?;

    let local = config.addresses.local(role);
    let radio = ZenohRadio::open(session.clone(), local).await?;
    let mut link = LinkLayer::new(radio);
    link.configure(role, config.addresses.peer(role))?;
    Ok((session, link))
}

pub async fn run_vehicle(config: &BoatConfig) -> RuntimeResult {
    let (session, link) = open_link(config, Role::Vehicle).await?;

    match &config.motor_port {
        Some(port) => {
            let bridge = HBridgeBridge::open(port, config.pins)?;
            vehicle_loop(config, &session, link, bridge).await
        }
        None => {
            warn!("No motor port configured, running with simulated motors");
            vehicle_loop(config, &session, link, LogSink::new()).await
        }
    }
}

async fn vehicle_loop<S: MotorOutputSink>(
    config: &BoatConfig,
    session: &Session,
    link: LinkLayer<ZenohRadio>,
    sink: S,
) -> RuntimeResult {
    let pub_health = session.declare_publisher(TOPIC_HEALTH).await?;

    let controller = MotionController::new(sink, config.speed);
    let mut supervisor = VehicleSupervisor::new(link, controller, config);

    let mut tick = interval(config.vehicle_period());
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Vehicle started: {}Hz loop, {}ms link timeout",
        config.vehicle_hz,
        config.link_timeout.as_millis()
    );
    info!("Publishing health to: {}", TOPIC_HEALTH);

    let mut last_status: Option<VehicleStatus> = None;
    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down vehicle runtime");
                return Ok(());
            }
        }

        let status = supervisor.tick(Instant::now());

        // Health publish is best effort and never holds up the next tick
        let health_json = serde_json::to_string(&status)?;
        if let Err(e) = pub_health.put(health_json).await {
            warn!("Failed to publish health: {}", e);
        }

        if last_status.map(|s| (s.link, s.motion)) != Some((status.link, status.motion)) {
            info!("Status: link={:?}, motion={:?}", status.link, status.motion);
        }
        last_status = Some(status);
    }
}

pub async fn run_control(config: &BoatConfig) -> RuntimeResult {
    let (session, link) = open_link(config, Role::Control).await?;

    // Boat health arrives on a callback; the loop checks the newest one each tick
    let (health_postbox, mut health_inbox) = Mailbox::<Vec<u8>>::new();
    let _health_sub = session
        .declare_subscriber(TOPIC_HEALTH)
        .callback(move |sample: Sample| {
            health_postbox.post(sample.payload().to_bytes().into_owned())
        })
        .await?;
    info!("Watching boat health on: {}", TOPIC_HEALTH);

    let sampler = InputSampler::new(KeyboardInput::new(config.speed), config.dead_zone);
    let mut supervisor = ControlSupervisor::new(link, sampler);

    info!("Controls: WASD=move, P/space=stop, 1/2/3=presets, R/F=speed, Q/Ctrl-C=quit");
    info!("Speed: {} PWM", config.speed.default);

    enable_raw_mode()?;
    let mut monitor = HealthMonitor::new();
    let result = control_loop(config, &mut supervisor, &mut health_inbox, &mut monitor).await;
    disable_raw_mode()?;

    info!(
        "Control station stopped ({} failed sends)",
        supervisor.send_failures()
    );
    result
}

async fn control_loop(
    config: &BoatConfig,
    supervisor: &mut ControlSupervisor<ZenohRadio, KeyboardInput>,
    health_inbox: &mut Mailbox<Vec<u8>>,
    monitor: &mut HealthMonitor,
) -> RuntimeResult {
    let mut tick = interval(config.send_period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tick.tick().await;
        supervisor.tick();
        if let Some(payload) = health_inbox.take() {
            monitor.observe(&payload);
        }
        if supervisor.sampler().source().quit_requested() {
            return Ok(());
        }
    }
}
