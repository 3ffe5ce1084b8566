// Keyboard console: WASD move, P/space stop, 1/2/3 presets, R/F speed, Q or Ctrl-C quit
// Movement keys latch until another movement key or stop is pressed.

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::Duration;
use tracing::{info, warn};

use super::sampler::{InputSource, RawInput};
use crate::config::SpeedLimits;

/// Preset speeds for keys 1, 2, 3
pub const SPEED_PRESETS: [u8; 3] = [100, 180, 255];

/// Speed change per R/F press
pub const SPEED_STEP: u8 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Maneuver {
    Stop,
    Ahead,
    Astern,
    SpinLeft,
    SpinRight,
}

impl Maneuver {
    /// Sign pattern for (left, right)
    fn pattern(self) -> (f32, f32) {
        match self {
            Maneuver::Stop => (0.0, 0.0),
            Maneuver::Ahead => (1.0, 1.0),
            Maneuver::Astern => (-1.0, -1.0),
            Maneuver::SpinLeft => (-1.0, 1.0),
            Maneuver::SpinRight => (1.0, -1.0),
        }
    }
}

pub struct KeyboardInput {
    limits: SpeedLimits,
    maneuver: Maneuver,
    speed: u8,
    quit: bool,
}

impl KeyboardInput {
    /// Starts stopped, at the default speed
    pub fn new(limits: SpeedLimits) -> Self {
        Self {
            limits,
            maneuver: Maneuver::Stop,
            speed: limits.default,
            quit: false,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit
    }

    pub fn speed(&self) -> u8 {
        self.speed
    }

    pub fn maneuver(&self) -> Maneuver {
        self.maneuver
    }

    pub fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('w') => self.set_maneuver(Maneuver::Ahead),
            KeyCode::Char('s') => self.set_maneuver(Maneuver::Astern),
            KeyCode::Char('a') => self.set_maneuver(Maneuver::SpinLeft),
            KeyCode::Char('d') => self.set_maneuver(Maneuver::SpinRight),
            KeyCode::Char('p') | KeyCode::Char(' ') => self.set_maneuver(Maneuver::Stop),

            KeyCode::Char(c @ '1'..='3') => {
                let idx = (c as u8 - b'1') as usize;
                self.set_speed(SPEED_PRESETS[idx]);
            }
            KeyCode::Char('r') => self.set_speed(self.speed.saturating_add(SPEED_STEP)),
            KeyCode::Char('f') => self.set_speed(self.speed.saturating_sub(SPEED_STEP)),

            KeyCode::Char('q') | KeyCode::Esc => self.request_quit(),
            _ => {}
        }
    }

    /// Raw mode delivers Ctrl-C as a key, so it is handled here like `q`
    pub fn handle_event(&mut self, event: KeyEvent) {
        if event.code == KeyCode::Char('c') && event.modifiers.contains(KeyModifiers::CONTROL) {
            self.request_quit();
        } else {
            self.handle_key(event.code);
        }
    }

    // Quitting also sends one last stop
    fn request_quit(&mut self) {
        self.set_maneuver(Maneuver::Stop);
        self.quit = true;
    }

    fn set_maneuver(&mut self, maneuver: Maneuver) {
        if self.maneuver != maneuver {
            info!("{:?} @ {} PWM", maneuver, self.speed);
        }
        self.maneuver = maneuver;
    }

    fn set_speed(&mut self, speed: u8) {
        self.speed = speed.clamp(self.limits.min, self.limits.max);
        info!("Speed: {} PWM", self.speed);
    }

    fn current(&self) -> RawInput {
        let (left, right) = self.maneuver.pattern();
        let scale = self.speed as f32 / 255.0;
        RawInput::new(left * scale, right * scale)
    }
}

impl InputSource for KeyboardInput {
    /// Drain pending key events without waiting, then report the latched state
    fn read(&mut self) -> RawInput {
        loop {
            match event::poll(Duration::ZERO) {
                Ok(true) => match event::read() {
                    Ok(Event::Key(key))
                        if key.kind == KeyEventKind::Press || key.kind == KeyEventKind::Repeat =>
                    {
                        self.handle_event(key)
                    }
                    Ok(_) => {}
                    Err(e) => {
                        warn!("Keyboard read failed, stopping: {}", e);
                        self.maneuver = Maneuver::Stop;
                        break;
                    }
                },
                Ok(false) => break,
                Err(e) => {
                    warn!("Keyboard poll failed, stopping: {}", e);
                    self.maneuver = Maneuver::Stop;
                    break;
                }
            }
        }
        self.current()
    }
}
