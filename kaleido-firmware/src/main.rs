//! Kaleido - Generative Art Frame Firmware
//!
//! Main firmware binary for an RP2040 driving a 320×240 ILI9341 panel and
//! a short WS2812 chain. Reads `frame.toml` (embedded at build time),
//! carves framebuffers out of static RAM and a small heap, then hands
//! everything to the frame task.

#![no_std]
#![no_main]

extern crate alloc;

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::spi::{self, Spi};
use embassy_time::{Delay, Timer};
use embedded_alloc::LlffHeap as Heap;
use static_cell::{ConstStaticCell, StaticCell};
use {defmt_rtt as _, panic_probe as _};

use kaleido_core::canvas::Canvas;
use kaleido_core::effects::Cellular;
use kaleido_core::lut::DistanceField;
use kaleido_core::Engine;
use kaleido_drivers::indicator::ws2812::SPI_HZ;
use kaleido_drivers::{Ili9341, Ili9341Config, Orientation, Ws2812};
use kaleido_hal::{Arena, MemoryPools, MemoryTier};

use crate::config::{parse_config, FrameConfig};

mod config;
mod tasks;

// Heap backs the fallback memory pool
#[global_allocator]
static HEAP: Heap = Heap::empty();

/// Heap size: room for both automaton grids
const HEAP_SIZE: usize = 48 * 1024;

/// Panel geometry
const WIDTH: u16 = 320;
const HEIGHT: u16 = 240;

/// Fast pool: exactly the canvas pair
const FAST_BYTES: usize = 2 * WIDTH as usize * HEIGHT as usize;

/// Fallback pool carved from the heap
const FALLBACK_BYTES: usize = 40 * 1024;

/// Indicator lights on the chain
const LIGHTS: usize = 10;

/// Panel SPI clock
const PANEL_HZ: u32 = 62_500_000;

/// Embedded configuration (compiled into firmware)
/// Edit frame.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../frame.toml");

// Placed in .bss; never moves through the stack
static FAST_MEM: ConstStaticCell<[u8; FAST_BYTES]> = ConstStaticCell::new([0; FAST_BYTES]);
static ENGINE: StaticCell<Engine> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Kaleido firmware starting...");

    init_heap();

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    // Memory pools: static SRAM first, heap second
    let mut fast = Arena::new(FAST_MEM.take(), MemoryTier::Fast);
    let mut fallback = Arena::new(
        alloc::vec![0u8; FALLBACK_BYTES].leak(),
        MemoryTier::Fallback,
    );
    let mut pools = MemoryPools::new(&mut fast, &mut fallback);

    let canvas = match Canvas::allocate(WIDTH, HEIGHT, &mut pools) {
        Ok(canvas) => canvas,
        Err(e) => defmt::panic!("No memory for the canvas: {}", e),
    };
    let cellular = Cellular::allocate(&mut pools);
    let distance = DistanceField::allocate(WIDTH, HEIGHT, &mut pools);
    info!(
        "Memory: {} fast / {} fallback bytes left",
        pools.fast.available(),
        pools.fallback.available()
    );

    // Panel on SPI0: SCK 18, MOSI 19, CS 17, DC 20, RST 21
    let mut panel_spi_config = spi::Config::default();
    panel_spi_config.frequency = PANEL_HZ;
    let panel_spi = Spi::new_blocking_txonly(p.SPI0, p.PIN_18, p.PIN_19, panel_spi_config);
    let cs = Output::new(p.PIN_17, Level::High);
    let dc = Output::new(p.PIN_20, Level::Low);
    let mut rst = Output::new(p.PIN_21, Level::High);

    rst.set_low();
    Timer::after_millis(10).await;
    rst.set_high();
    Timer::after_millis(120).await;

    let orientation = if config.flip {
        Orientation::LandscapeFlipped
    } else {
        Orientation::Landscape
    };
    let mut panel = Ili9341::new(
        panel_spi,
        cs,
        dc,
        Ili9341Config {
            width: WIDTH,
            height: HEIGHT,
            orientation,
        },
    );
    if let Err(e) = panel.init(&mut Delay) {
        error!("Panel init failed: {}", e);
    }
    info!("Panel initialized");

    // Indicator chain on SPI1: SCK 14 (unused), MOSI 15
    let mut strip_spi_config = spi::Config::default();
    strip_spi_config.frequency = SPI_HZ;
    let strip_spi = Spi::new_blocking_txonly(p.SPI1, p.PIN_14, p.PIN_15, strip_spi_config);
    let strip = Ws2812::new(strip_spi, if config.lights { LIGHTS } else { 0 });

    // Touch / button line on GPIO2, active low
    let button = Input::new(p.PIN_2, Pull::Up);

    let now_ms = embassy_time::Instant::now().as_millis() as u32;
    // load_config only hands out validated configurations
    let engine = match Engine::new(&config.engine, canvas, cellular, distance, now_ms) {
        Ok(engine) => ENGINE.init(engine),
        Err(e) => defmt::panic!("Engine rejected configuration: {}", e),
    };

    spawner
        .spawn(tasks::frame_task(engine, panel, strip, button, config.frame_ms))
        .unwrap();

    info!("Frame task spawned, firmware running");

    loop {
        Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Initialize the heap allocator
fn init_heap() {
    use core::mem::MaybeUninit;
    static mut HEAP_MEM: [MaybeUninit<u8>; HEAP_SIZE] = [MaybeUninit::uninit(); HEAP_SIZE];
    #[allow(static_mut_refs)]
    unsafe {
        HEAP.init(HEAP_MEM.as_ptr() as usize, HEAP_SIZE)
    }
}

/// Parse the embedded configuration, falling back to defaults
fn load_config() -> FrameConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Parsed embedded configuration: {} effects, {} ms frames",
                config.engine.scheduler.playlist.len(),
                config.frame_ms
            );
            config
        }
        Err(e) => {
            // Only happens during development; build.rs validates frame.toml
            error!("Failed to parse embedded config: {}", e);
            error!("Using default configuration");
            FrameConfig::default()
        }
    }
}
