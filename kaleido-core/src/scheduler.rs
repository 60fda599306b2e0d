//! Mode scheduler
//!
//! Cycles through the playlist. Each effect dwells for a random time, then
//! a two-phase transition runs: the screen fades to black, the next effect
//! is activated, and the screen fades back in. A transition can also be
//! requested at any time (button press); requests while one is already
//! running are ignored.

use rand::Rng;

use crate::config::{Playlist, SchedulerConfig};
use crate::effects::EffectKind;
use crate::time::elapsed_ms;

/// Full brightness
pub const FULL: u8 = 255;

/// Transition sub-state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// Showing the active effect at full brightness
    Idle,
    /// Dimming the outgoing effect
    FadingOut { since: u32 },
    /// Brightening the incoming effect
    FadingIn { since: u32 },
}

/// Events driving [`Phase`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhaseEvent {
    /// Button press or dwell timeout
    Request { now: u32 },
    /// Fade-out reached black; the next effect is now active
    Switched { now: u32 },
    /// Fade-in reached full brightness
    Settled,
}

impl Phase {
    /// Process an event and return the next phase
    ///
    /// Events that do not apply to the current phase leave it unchanged;
    /// in particular a request during a transition is a no-op.
    pub fn transition(self, event: PhaseEvent) -> Self {
        use Phase::*;
        use PhaseEvent::*;

        match (self, event) {
            (Idle, Request { now }) => FadingOut { since: now },
            (FadingOut { .. }, Switched { now }) => FadingIn { since: now },
            (FadingIn { .. }, Settled) => Idle,
            (phase, _) => phase,
        }
    }

    pub fn is_transitioning(&self) -> bool {
        !matches!(self, Phase::Idle)
    }

    /// Brightness for this phase at `now`, clamped to the fade length
    pub fn brightness(&self, now: u32, fade_ms: u32) -> u8 {
        let fade = fade_ms.max(1);
        match *self {
            Phase::Idle => FULL,
            Phase::FadingOut { since } => {
                let e = elapsed_ms(now, since).min(fade);
                FULL - (e as u64 * FULL as u64 / fade as u64) as u8
            }
            Phase::FadingIn { since } => {
                let e = elapsed_ms(now, since).min(fade);
                (e as u64 * FULL as u64 / fade as u64) as u8
            }
        }
    }
}

/// Outcome of one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tick {
    /// Brightness to apply to the frame just rendered
    pub brightness: u8,
    /// Effect to activate once this frame has been presented
    pub activate: Option<EffectKind>,
}

/// Playlist position, dwell timer and transition phase
pub struct ModeScheduler {
    playlist: Playlist,
    slot: usize,
    started: u32,
    dwell: u32,
    dwell_min: u32,
    dwell_max: u32,
    fade_ms: u32,
    phase: Phase,
}

impl ModeScheduler {
    /// Start at slot 0, idle, with a fresh dwell
    pub fn new<R: Rng>(config: &SchedulerConfig, now: u32, rng: &mut R) -> Self {
        let mut playlist = config.playlist.clone();
        if playlist.is_empty() {
            let _ = playlist.push(EffectKind::Plasma);
        }
        let dwell_min = config.dwell_min_ms.min(config.dwell_max_ms);
        let mut scheduler = Self {
            playlist,
            slot: 0,
            started: now,
            dwell: 0,
            dwell_min,
            dwell_max: config.dwell_max_ms,
            fade_ms: config.fade_ms.max(1),
            phase: Phase::Idle,
        };
        scheduler.dwell = scheduler.draw_dwell(rng);
        scheduler
    }

    fn draw_dwell<R: Rng>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.dwell_min..=self.dwell_max)
    }

    /// Effect in the current slot
    pub fn active(&self) -> EffectKind {
        self.playlist[self.slot]
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Randomized dwell duration drawn for the active effect
    pub fn dwell(&self) -> u32 {
        self.dwell
    }

    pub fn fade_ms(&self) -> u32 {
        self.fade_ms
    }

    /// Begin a transition unless one is already running
    ///
    /// Returns whether a new transition started.
    pub fn request_transition(&mut self, now: u32) -> bool {
        let next = self.phase.transition(PhaseEvent::Request { now });
        let started = next != self.phase;
        if started {
            debug!("scheduler: leaving {} at {}", self.active().name(), now);
        }
        self.phase = next;
        started
    }

    /// Request a transition if the dwell time is up
    pub fn poll_dwell(&mut self, now: u32) -> bool {
        if !self.phase.is_transitioning() && elapsed_ms(now, self.started) >= self.dwell {
            return self.request_transition(now);
        }
        false
    }

    /// Advance the transition at `now`
    ///
    /// When the fade-out completes the brightness is forced to 0 and the
    /// next slot becomes active; the caller initialises that effect after
    /// presenting the black frame.
    pub fn advance<R: Rng>(&mut self, now: u32, rng: &mut R) -> Tick {
        match self.phase {
            Phase::Idle => Tick {
                brightness: FULL,
                activate: None,
            },
            Phase::FadingOut { since } if elapsed_ms(now, since) >= self.fade_ms => {
                self.slot = (self.slot + 1) % self.playlist.len();
                self.started = now;
                self.dwell = self.draw_dwell(rng);
                self.phase = self.phase.transition(PhaseEvent::Switched { now });
                info!(
                    "scheduler: slot {} -> {} for {} ms",
                    self.slot,
                    self.active().name(),
                    self.dwell
                );
                Tick {
                    brightness: 0,
                    activate: Some(self.active()),
                }
            }
            Phase::FadingIn { since } if elapsed_ms(now, since) >= self.fade_ms => {
                self.phase = self.phase.transition(PhaseEvent::Settled);
                Tick {
                    brightness: FULL,
                    activate: None,
                }
            }
            phase => Tick {
                brightness: phase.brightness(now, self.fade_ms),
                activate: None,
            },
        }
    }
}
