//! Frame task
//!
//! Drives the engine at a fixed period. Everything inside a frame is
//! synchronous; the task only yields while waiting for the next tick.

use defmt::*;
use embassy_rp::gpio::{Input, Output};
use embassy_rp::peripherals::{SPI0, SPI1};
use embassy_rp::spi::{Blocking, Spi};
use embassy_time::{Duration, Instant, Ticker};

use kaleido_core::Engine;
use kaleido_drivers::{Ili9341, Ws2812};

/// Panel on SPI0 with CS and DC lines
pub type Panel = Ili9341<Spi<'static, SPI0, Blocking>, Output<'static>, Output<'static>>;

/// Indicator chain on SPI1 MOSI
pub type Strip = Ws2812<Spi<'static, SPI1, Blocking>>;

/// Frames between timing reports
const REPORT_EVERY: u32 = 300;

#[embassy_executor::task]
pub async fn frame_task(
    engine: &'static mut Engine,
    mut panel: Panel,
    mut strip: Strip,
    button: Input<'static>,
    frame_ms: u32,
) {
    info!("Frame task started ({} ms period)", frame_ms);

    if let Err(e) = engine.start(&mut panel) {
        error!("Panel start failed: {}", e);
    }

    let start = Instant::now();
    let mut ticker = Ticker::every(Duration::from_millis(frame_ms as u64));
    let mut busy_us: u64 = 0;
    let mut overruns: u32 = 0;

    loop {
        ticker.next().await;

        let begun = Instant::now();
        let now_ms = begun.duration_since(start).as_millis() as u32;
        // Button pulls the line low
        let pressed = button.is_low();

        let report = engine.frame(now_ms, pressed, &mut panel, &mut strip);
        if let Some(kind) = report.activated {
            info!("Now showing {}", kind.name());
        }

        let took = begun.elapsed().as_micros();
        busy_us += took;
        if took > frame_ms as u64 * 1000 {
            overruns += 1;
        }

        if engine.frames() % REPORT_EVERY == 0 {
            debug!(
                "{} frames: avg {} us/frame, {} over budget, last push {}",
                REPORT_EVERY,
                busy_us / REPORT_EVERY as u64,
                overruns,
                report.present
            );
            busy_us = 0;
            overruns = 0;
        }
    }
}
