//! Frame engine
//!
//! [`Engine`] owns every piece of per-frame state: canvas, palettes,
//! lookup tables, effect pools, scheduler, ambient sampler and the RNG.
//! The firmware calls [`Engine::frame`] once per tick; each call runs
//! input, palette, render, brightness, present, swap and ambient sampling
//! strictly in that order.
//!
//! Transition brightness is applied on the way to the panel. The canvas
//! keeps full-brightness pixels, so effects that grow on the previous
//! frame do not compound the fade.

use kaleido_hal::{DisplayError, IndexedDisplay, IndicatorStrip, WriteSession};
use rand::rngs::SmallRng;
use rand::SeedableRng;

use crate::ambient::AmbientSampler;
use crate::canvas::{Canvas, Surface};
use crate::color::{self, BLACK};
use crate::config::{BusPolicy, ConfigError, EngineConfig};
use crate::diff::{self, PushStats};
use crate::effects::{Cellular, EffectKind, Effects, Frame, InitContext, PushStrategy};
use crate::input::PressLatch;
use crate::lut::{DistanceField, SineTable};
use crate::palette::PaletteEngine;
use crate::scheduler::{ModeScheduler, Phase, FULL};
use crate::time::elapsed_ms;

/// What happened during one [`Engine::frame`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameReport {
    /// Effect that rendered this frame
    pub effect: EffectKind,
    /// Transition brightness applied to it
    pub brightness: u8,
    pub phase: Phase,
    pub strategy: PushStrategy,
    /// Outcome of the push; an error leaves the panel out of sync
    pub present: Result<PushStats, DisplayError>,
    /// Whether the indicator strip was refreshed
    pub lights: bool,
    /// Effect activated after this frame, if a switch happened
    pub activated: Option<EffectKind>,
}

pub struct Engine {
    canvas: Canvas,
    palette: PaletteEngine,
    sine: SineTable,
    distance: Option<DistanceField>,
    effects: Effects,
    scheduler: ModeScheduler,
    ambient: AmbientSampler,
    latch: PressLatch,
    rng: SmallRng,
    bus: BusPolicy,
    /// Bus currently held open by [`Engine::start`]
    holding: bool,
    /// Effect clock origin
    activated_at: u32,
    /// Panel contents unknown; push the next frame whole
    resync: bool,
    /// Brightness of the frame currently on the panel
    shown: u8,
    frames: u32,
}

impl Engine {
    /// Assemble the engine and activate the first playlist entry
    ///
    /// The canvas, automaton grids and distance field come from the
    /// board's memory pools; everything else is inline.
    pub fn new(
        config: &EngineConfig,
        canvas: Canvas,
        cellular: Cellular,
        distance: Option<DistanceField>,
        now: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut rng = SmallRng::seed_from_u64(config.seed);
        let scheduler = ModeScheduler::new(&config.scheduler, now, &mut rng);
        if distance.is_none() {
            warn!("engine: no distance field, plasma runs without radial term");
        }
        let mut engine = Self {
            canvas,
            palette: PaletteEngine::new(config.palette.first as usize, config.palette.blend_steps),
            sine: SineTable::new(),
            distance,
            effects: Effects::new(cellular),
            scheduler,
            ambient: AmbientSampler::new(&config.ambient),
            latch: PressLatch::new(),
            rng,
            bus: config.display.bus,
            holding: false,
            activated_at: now,
            resync: true,
            shown: FULL,
            frames: 0,
        };
        let first = engine.scheduler.active();
        engine.activate(first, now);
        info!(
            "engine: {}x{}, starting with {}",
            engine.canvas.width(),
            engine.canvas.height(),
            first.name()
        );
        Ok(engine)
    }

    /// Upload the device color table and, for a held bus, open the session
    pub fn start<D: IndexedDisplay + ?Sized>(&mut self, display: &mut D) -> Result<(), DisplayError> {
        let (w, h) = display.dimensions();
        if (w, h) != (self.canvas.width(), self.canvas.height()) {
            warn!("engine: panel is {}x{}, canvas is clipped", w, h);
        }
        {
            let mut session = WriteSession::open(display)?;
            session.set_palette(&color::device_palette())?;
        }
        if self.bus == BusPolicy::Held && !self.holding {
            display.begin_write()?;
            self.holding = true;
        }
        self.resync = true;
        Ok(())
    }

    /// Release a bus held since [`Engine::start`]
    pub fn stop<D: IndexedDisplay + ?Sized>(&mut self, display: &mut D) -> Result<(), DisplayError> {
        if self.holding {
            self.holding = false;
            display.end_write()?;
        }
        Ok(())
    }

    fn activate(&mut self, kind: EffectKind, now: u32) {
        // The panel is black at a switch; no effect inherits old pixels
        self.canvas.clear_all(BLACK);
        let mut ctx = InitContext {
            width: self.canvas.width() as usize,
            height: self.canvas.height() as usize,
            rng: &mut self.rng,
        };
        self.effects.init(kind, &mut ctx);
        self.activated_at = now;
    }

    /// Run one frame at `now` (milliseconds)
    ///
    /// `pressed` is the current level of the input line. Display and
    /// indicator failures are logged and reported, never fatal: a failed
    /// push makes the next frame a full push.
    pub fn frame<D, S>(&mut self, now: u32, pressed: bool, display: &mut D, lights: &mut S) -> FrameReport
    where
        D: IndexedDisplay + ?Sized,
        S: IndicatorStrip + ?Sized,
    {
        if self.latch.update(pressed) {
            self.scheduler.request_transition(now);
        } else {
            self.scheduler.poll_dwell(now);
        }

        self.palette.crossfade();

        let kind = self.scheduler.active();
        let (w, h) = (self.canvas.width() as usize, self.canvas.height() as usize);
        let (back, front) = self.canvas.split_mut();
        let mut frame = Frame {
            back,
            front,
            width: w,
            height: h,
            palette: self.palette.active(),
            sine: &self.sine,
            distance: self.distance.as_ref(),
            time_ms: elapsed_ms(now, self.activated_at),
            rng: &mut self.rng,
        };
        self.effects.render(kind, &mut frame);

        let tick = self.scheduler.advance(now, &mut self.rng);

        // Any brightness change touches every lit pixel on the panel
        let dimmed = tick.brightness < FULL || self.shown < FULL;
        let strategy = if self.resync || dimmed {
            PushStrategy::Full
        } else {
            kind.push_strategy()
        };
        let present = self.present(display, strategy, tick.brightness);
        match present {
            Ok(_) => {
                self.resync = false;
                self.shown = tick.brightness;
            }
            Err(e) => {
                warn!("engine: present failed: {}", e);
                self.resync = true;
            }
        }
        self.canvas.swap();

        if let Some(next) = tick.activate {
            self.activate(next, now);
        }

        let lights_updated = match self.ambient.tick(self.canvas.buffer(Surface::Front), w, h, lights) {
            Ok(updated) => updated,
            Err(e) => {
                warn!("engine: indicator update failed: {}", e);
                false
            }
        };

        self.frames = self.frames.wrapping_add(1);
        trace!("engine: frame {} {} b={}", self.frames, kind.name(), tick.brightness);

        FrameReport {
            effect: kind,
            brightness: tick.brightness,
            phase: self.scheduler.phase(),
            strategy,
            present,
            lights: lights_updated,
            activated: tick.activate,
        }
    }

    fn present<D: IndexedDisplay + ?Sized>(
        &mut self,
        display: &mut D,
        strategy: PushStrategy,
        level: u8,
    ) -> Result<PushStats, DisplayError> {
        let mut session = match self.bus {
            BusPolicy::Held if self.holding => WriteSession::held(display),
            _ => WriteSession::open(display)?,
        };
        let (w, h) = (self.canvas.width() as usize, self.canvas.height() as usize);
        let back = self.canvas.buffer(Surface::Back);
        match strategy {
            PushStrategy::Full if level == FULL => diff::present_full(&mut *session, back, w, h),
            PushStrategy::Full => diff::present_dimmed(&mut *session, back, w, h, level),
            PushStrategy::Diff => {
                diff::present_diff(&mut *session, back, self.canvas.buffer(Surface::Front), w, h)
            }
        }
    }

    /// Effect currently on screen (or fading in)
    pub fn active(&self) -> EffectKind {
        self.scheduler.active()
    }

    pub fn scheduler(&self) -> &ModeScheduler {
        &self.scheduler
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn ambient(&self) -> &AmbientSampler {
        &self.ambient
    }

    /// Frames run since boot
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Whether the bus is held open between frames
    pub fn is_holding_bus(&self) -> bool {
        self.holding
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{screensaver_playlist, SchedulerConfig};
    use crate::diff::testing::ModelDisplay;
    use kaleido_hal::{IndicatorError, Rgb8};
    use std::boxed::Box;
    use std::vec;
    use std::vec::Vec;

    const W: u16 = 48;
    const H: u16 = 32;

    #[derive(Default)]
    struct Lights {
        shows: usize,
        last: Vec<Rgb8>,
    }

    impl IndicatorStrip for Lights {
        fn len(&self) -> usize {
            10
        }

        fn show(&mut self, colors: &[Rgb8]) -> Result<(), IndicatorError> {
            self.shows += 1;
            self.last = colors.to_vec();
            Ok(())
        }
    }

    fn region(len: usize) -> &'static mut [u8] {
        Box::leak(vec![0u8; len].into_boxed_slice())
    }

    fn canvas() -> Canvas {
        canvas_of(W, H)
    }

    fn canvas_of(w: u16, h: u16) -> Canvas {
        let len = w as usize * h as usize;
        Canvas::from_regions(w, h, region(len), region(len)).unwrap()
    }

    /// What the panel should show: the front buffer at `brightness`
    fn shown(e: &Engine, brightness: u8) -> Vec<u8> {
        e.canvas()
            .buffer(Surface::Front)
            .iter()
            .map(|&c| color::dim(c, brightness))
            .collect()
    }

    fn config(playlist: crate::config::Playlist, bus: BusPolicy) -> EngineConfig {
        let mut config = EngineConfig {
            scheduler: SchedulerConfig {
                playlist,
                fade_ms: 200,
                ..SchedulerConfig::default()
            },
            ..EngineConfig::default()
        };
        config.display.bus = bus;
        config
    }

    fn engine(config: &EngineConfig) -> Engine {
        Engine::new(config, canvas(), Cellular::disabled(), None, 0).unwrap()
    }

    #[test]
    fn test_start_uploads_palette_and_holds_bus() {
        let mut e = engine(&EngineConfig::default());
        let mut display = ModelDisplay::new(W as usize, H as usize);
        e.start(&mut display).unwrap();
        assert_eq!(display.palette, Some(color::device_palette()));
        assert!(e.is_holding_bus());
        assert!(display.open);

        let mut lights = Lights::default();
        for t in 1..=5 {
            e.frame(t * 16, false, &mut display, &mut lights);
        }
        // One session for the upload, one held for the run
        assert_eq!(display.begins, 2);
        e.stop(&mut display).unwrap();
        assert!(!display.open);
    }

    #[test]
    fn test_per_frame_bus_brackets_every_frame() {
        let mut e = engine(&config(screensaver_playlist(), BusPolicy::PerFrame));
        let mut display = ModelDisplay::new(W as usize, H as usize);
        let mut lights = Lights::default();
        e.start(&mut display).unwrap();
        for t in 1..=10 {
            e.frame(t * 16, false, &mut display, &mut lights);
            assert!(!display.open);
        }
        assert_eq!(display.begins, 11);
        assert_eq!(display.ends, 11);
    }

    #[test]
    fn test_display_tracks_presented_frame() {
        for kind in EffectKind::ALL {
            let mut playlist = crate::config::Playlist::new();
            playlist.push(kind).unwrap();
            playlist.push(EffectKind::Mystify).unwrap();
            let mut e = engine(&config(playlist, BusPolicy::Held));
            let mut display = ModelDisplay::new(W as usize, H as usize);
            let mut lights = Lights::default();
            e.start(&mut display).unwrap();
            for t in 1..=40u32 {
                // Press mid-way so the fade and switch are covered too
                let report = e.frame(t * 16, t == 10, &mut display, &mut lights);
                assert!(report.present.is_ok());
                assert_eq!(display.pixels, shown(&e, report.brightness), "{}", kind.name());
            }
        }
    }

    #[test]
    fn test_first_frame_is_full_push() {
        let mut e = engine(&config(screensaver_playlist(), BusPolicy::Held));
        let mut display = ModelDisplay::new(W as usize, H as usize);
        let mut lights = Lights::default();
        e.start(&mut display).unwrap();
        let first = e.frame(16, false, &mut display, &mut lights);
        assert_eq!(first.strategy, PushStrategy::Full);
        let second = e.frame(32, false, &mut display, &mut lights);
        assert_eq!(second.strategy, EffectKind::Starfield.push_strategy());
    }

    #[test]
    fn test_press_runs_one_transition() {
        let mut e = engine(&config(screensaver_playlist(), BusPolicy::Held));
        let mut display = ModelDisplay::new(W as usize, H as usize);
        let mut lights = Lights::default();
        e.start(&mut display).unwrap();
        assert_eq!(e.active(), EffectKind::Starfield);

        let mut activations = Vec::new();
        let mut brightness = Vec::new();
        // Button held for the whole run
        for t in 1..=60u32 {
            let report = e.frame(t * 10, true, &mut display, &mut lights);
            brightness.push(report.brightness);
            activations.extend(report.activated);
        }
        assert_eq!(activations, vec![EffectKind::Matrix]);
        assert_eq!(e.active(), EffectKind::Matrix);
        assert_eq!(e.scheduler().phase(), Phase::Idle);
        assert!(brightness.contains(&0));
        assert_eq!(*brightness.last().unwrap(), 255);
    }

    #[test]
    fn test_failed_push_forces_full_resync() {
        let mut playlist = crate::config::Playlist::new();
        playlist.push(EffectKind::Starfield).unwrap();
        let mut e = engine(&config(playlist, BusPolicy::Held));
        let mut display = ModelDisplay::new(W as usize, H as usize);
        let mut lights = Lights::default();
        e.start(&mut display).unwrap();
        e.frame(16, false, &mut display, &mut lights);

        display.fail_pushes = 1;
        let failed = e.frame(32, false, &mut display, &mut lights);
        assert_eq!(failed.present, Err(DisplayError::Bus));
        assert_ne!(display.pixels, e.canvas().buffer(Surface::Front));

        let recovered = e.frame(48, false, &mut display, &mut lights);
        assert_eq!(recovered.strategy, PushStrategy::Full);
        assert_eq!(display.pixels, e.canvas().buffer(Surface::Front));
    }

    #[test]
    fn test_switch_clears_both_buffers() {
        let mut playlist = crate::config::Playlist::new();
        playlist.push(EffectKind::Starfield).unwrap();
        playlist.push(EffectKind::FlowField).unwrap();
        let mut e = engine(&config(playlist, BusPolicy::Held));
        let mut display = ModelDisplay::new(W as usize, H as usize);
        let mut lights = Lights::default();
        e.start(&mut display).unwrap();
        let mut t = 0;
        loop {
            t += 16;
            let report = e.frame(t, t == 16, &mut display, &mut lights);
            if report.activated == Some(EffectKind::FlowField) {
                break;
            }
        }
        assert!(e.canvas().buffer(Surface::Front).iter().all(|&b| b == BLACK));
        assert!(e.canvas().buffer(Surface::Back).iter().all(|&b| b == BLACK));
    }

    #[test]
    fn test_transition_dims_panel_not_canvas() {
        let mut playlist = crate::config::Playlist::new();
        playlist.push(EffectKind::Plasma).unwrap();
        playlist.push(EffectKind::Mystify).unwrap();
        let mut e = engine(&config(playlist, BusPolicy::Held));
        let mut display = ModelDisplay::new(W as usize, H as usize);
        let mut lights = Lights::default();
        e.start(&mut display).unwrap();

        let mut t = 16;
        let mut report = e.frame(t, true, &mut display, &mut lights);
        while report.brightness >= 128 {
            t += 16;
            report = e.frame(t, false, &mut display, &mut lights);
        }
        assert!(matches!(e.scheduler().phase(), Phase::FadingOut { .. }));
        assert_eq!(report.strategy, PushStrategy::Full);
        assert_eq!(display.pixels, shown(&e, report.brightness));
        // Plasma covers the canvas; at half level every lit channel drops
        assert_ne!(display.pixels, e.canvas().buffer(Surface::Front));
    }

    #[test]
    fn test_pipes_history_survives_fade_in() {
        let (w, h) = (160u16, 120u16);
        let mut playlist = crate::config::Playlist::new();
        playlist.push(EffectKind::Plasma).unwrap();
        playlist.push(EffectKind::Pipes).unwrap();
        let config = config(playlist, BusPolicy::Held);
        let mut e = Engine::new(&config, canvas_of(w, h), Cellular::disabled(), None, 0).unwrap();
        let mut display = ModelDisplay::new(w as usize, h as usize);
        let mut lights = Lights::default();
        e.start(&mut display).unwrap();

        let mut t = 0;
        loop {
            t += 16;
            let report = e.frame(t, t == 16, &mut display, &mut lights);
            if report.activated == Some(EffectKind::Pipes) {
                break;
            }
        }

        let (mut kept, mut redrawn, mut fade_frames) = (0usize, 0usize, 0);
        let mut prev = e.canvas().buffer(Surface::Front).to_vec();
        let mut prev_shown = display.pixels.clone();
        while e.scheduler().phase() != Phase::Idle {
            t += 16;
            let report = e.frame(t, false, &mut display, &mut lights);
            fade_frames += 1;
            let cur = e.canvas().buffer(Surface::Front);
            for i in 0..cur.len() {
                if prev[i] == BLACK {
                    continue;
                }
                if cur[i] == prev[i] {
                    kept += 1;
                    // Unchanged pipe pixels only get brighter on the panel
                    let (r0, g0, b0) = color::unpack(prev_shown[i]);
                    let (r1, g1, b1) = color::unpack(display.pixels[i]);
                    assert!(r1 >= r0 && g1 >= g0 && b1 >= b0);
                } else {
                    redrawn += 1;
                }
            }
            assert_eq!(display.pixels, shown(&e, report.brightness));
            prev = cur.to_vec();
            prev_shown = display.pixels.clone();
        }

        assert!(fade_frames > 5);
        assert!(kept > 0);
        // Only pipes crossing or joints overwrite earlier pixels
        assert!(redrawn * 10 < kept, "{} redrawn vs {} kept", redrawn, kept);
    }

    #[test]
    fn test_lights_follow_every_third_frame() {
        let mut e = engine(&EngineConfig::default());
        let mut display = ModelDisplay::new(W as usize, H as usize);
        let mut lights = Lights::default();
        e.start(&mut display).unwrap();
        for t in 1..=30 {
            e.frame(t * 16, false, &mut display, &mut lights);
        }
        assert_eq!(lights.shows, 10);
        assert_eq!(lights.last.len(), 10);
        assert_eq!(e.frames(), 30);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.scheduler.playlist.clear();
        assert!(matches!(
            Engine::new(&config, canvas(), Cellular::disabled(), None, 0),
            Err(ConfigError::EmptyPlaylist)
        ));
    }
}
