//! ILI9341 TFT driver (4-wire SPI)
//!
//! The controller runs in 16-bit RGB565 mode. The engine hands it runs of
//! 8-bit indices; the driver looks each index up in its 256-entry table
//! and streams big-endian RGB565 words.
//!
//! # Protocol
//!
//! - DC low: command byte; DC high: parameters / pixel data
//! - CASET (0x2A) and PASET (0x2B) set an inclusive window
//! - RAMWR (0x2C) then streams pixels row-major into the window
//!
//! CS is driven by [`begin_write`](IndexedDisplay::begin_write) /
//! [`end_write`](IndexedDisplay::end_write) so the SPI bus can be shared.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use embedded_hal::spi::SpiBus;
use kaleido_hal::{DisplayError, IndexedDisplay};

/// ILI9341 commands
pub mod cmd {
    pub const SWRESET: u8 = 0x01;
    pub const SLPOUT: u8 = 0x11;
    pub const DISPON: u8 = 0x29;
    pub const CASET: u8 = 0x2A;
    pub const PASET: u8 = 0x2B;
    pub const RAMWR: u8 = 0x2C;
    pub const MADCTL: u8 = 0x36;
    pub const PIXFMT: u8 = 0x3A;
}

/// MADCTL bits
mod madctl {
    pub const MY: u8 = 0x80;
    pub const MX: u8 = 0x40;
    pub const MV: u8 = 0x20;
    pub const BGR: u8 = 0x08;
}

/// 16 bits per pixel on the MCU interface
const PIXFMT_16BPP: u8 = 0x55;

/// Pixels converted per SPI write
const CHUNK_PIXELS: usize = 64;

/// Panel orientation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Orientation {
    /// 320×240, connector on the left
    #[default]
    Landscape,
    /// 320×240, rotated 180°
    LandscapeFlipped,
}

impl Orientation {
    fn madctl(self) -> u8 {
        match self {
            Orientation::Landscape => madctl::MV | madctl::BGR,
            Orientation::LandscapeFlipped => madctl::MY | madctl::MX | madctl::MV | madctl::BGR,
        }
    }
}

/// Driver configuration
#[derive(Debug, Clone, Copy)]
pub struct Ili9341Config {
    pub width: u16,
    pub height: u16,
    pub orientation: Orientation,
}

impl Default for Ili9341Config {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            orientation: Orientation::Landscape,
        }
    }
}

/// ILI9341 over a blocking SPI bus with separate CS and DC lines
pub struct Ili9341<SPI, CS, DC> {
    spi: SPI,
    cs: CS,
    dc: DC,
    config: Ili9341Config,
    /// Index → RGB565 lookup
    palette: [u16; 256],
    initialized: bool,
    selected: bool,
}

impl<SPI, CS, DC> Ili9341<SPI, CS, DC>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
{
    /// Create a driver; the panel is untouched until [`init`](Self::init)
    pub fn new(spi: SPI, cs: CS, dc: DC, config: Ili9341Config) -> Self {
        Self {
            spi,
            cs,
            dc,
            config,
            palette: [0; 256],
            initialized: false,
            selected: false,
        }
    }

    /// Reset and configure the controller
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), DisplayError> {
        self.select()?;
        let result = self.init_sequence(delay);
        self.deselect()?;
        result?;
        self.initialized = true;
        Ok(())
    }

    fn init_sequence<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), DisplayError> {
        self.command(cmd::SWRESET, &[])?;
        delay.delay_ms(150);
        self.command(cmd::SLPOUT, &[])?;
        delay.delay_ms(120);
        self.command(cmd::PIXFMT, &[PIXFMT_16BPP])?;
        self.command(cmd::MADCTL, &[self.config.orientation.madctl()])?;
        self.command(cmd::DISPON, &[])?;
        delay.delay_ms(20);
        Ok(())
    }

    /// Release the bus and pins
    pub fn release(self) -> (SPI, CS, DC) {
        (self.spi, self.cs, self.dc)
    }

    fn select(&mut self) -> Result<(), DisplayError> {
        self.cs.set_low().map_err(|_| DisplayError::Bus)?;
        self.selected = true;
        Ok(())
    }

    fn deselect(&mut self) -> Result<(), DisplayError> {
        self.spi.flush().map_err(|_| DisplayError::Bus)?;
        self.cs.set_high().map_err(|_| DisplayError::Bus)?;
        self.selected = false;
        Ok(())
    }

    fn command(&mut self, command: u8, params: &[u8]) -> Result<(), DisplayError> {
        self.spi.flush().map_err(|_| DisplayError::Bus)?;
        self.dc.set_low().map_err(|_| DisplayError::Bus)?;
        self.spi.write(&[command]).map_err(|_| DisplayError::Bus)?;
        self.spi.flush().map_err(|_| DisplayError::Bus)?;
        self.dc.set_high().map_err(|_| DisplayError::Bus)?;
        if !params.is_empty() {
            self.spi.write(params).map_err(|_| DisplayError::Bus)?;
        }
        Ok(())
    }

    /// Set the inclusive drawing window and start a memory write
    fn window(&mut self, x0: u16, y0: u16, x1: u16, y1: u16) -> Result<(), DisplayError> {
        let [xa, xb] = x0.to_be_bytes();
        let [xc, xd] = x1.to_be_bytes();
        self.command(cmd::CASET, &[xa, xb, xc, xd])?;
        let [ya, yb] = y0.to_be_bytes();
        let [yc, yd] = y1.to_be_bytes();
        self.command(cmd::PASET, &[ya, yb, yc, yd])?;
        self.command(cmd::RAMWR, &[])
    }

    /// Translate indices to RGB565 and stream them
    fn stream(&mut self, pixels: &[u8]) -> Result<(), DisplayError> {
        let mut wire = [0u8; CHUNK_PIXELS * 2];
        for chunk in pixels.chunks(CHUNK_PIXELS) {
            for (out, &index) in wire.chunks_exact_mut(2).zip(chunk) {
                out.copy_from_slice(&self.palette[index as usize].to_be_bytes());
            }
            self.spi
                .write(&wire[..chunk.len() * 2])
                .map_err(|_| DisplayError::Bus)?;
        }
        Ok(())
    }
}

impl<SPI, CS, DC> IndexedDisplay for Ili9341<SPI, CS, DC>
where
    SPI: SpiBus,
    CS: OutputPin,
    DC: OutputPin,
{
    fn dimensions(&self) -> (u16, u16) {
        (self.config.width, self.config.height)
    }

    fn begin_write(&mut self) -> Result<(), DisplayError> {
        if !self.initialized {
            return Err(DisplayError::NotReady);
        }
        self.select()
    }

    fn end_write(&mut self) -> Result<(), DisplayError> {
        self.deselect()
    }

    fn push_image(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        pixels: &[u8],
    ) -> Result<(), DisplayError> {
        if !self.selected {
            return Err(DisplayError::NotReady);
        }
        if width == 0 || height == 0 {
            return Ok(());
        }
        let len = width as usize * height as usize;
        let fits = x as u32 + width as u32 <= self.config.width as u32
            && y as u32 + height as u32 <= self.config.height as u32;
        if !fits || pixels.len() < len {
            return Err(DisplayError::OutOfBounds);
        }
        self.window(x, y, x + width - 1, y + height - 1)?;
        self.stream(&pixels[..len])
    }

    fn display(&mut self) -> Result<(), DisplayError> {
        // GRAM is written directly; just drain the bus
        self.spi.flush().map_err(|_| DisplayError::Bus)
    }

    fn set_palette(&mut self, palette: &[u16; 256]) -> Result<(), DisplayError> {
        self.palette = *palette;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::cell::RefCell;
    use std::rc::Rc;
    use std::vec;
    use std::vec::Vec;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Op {
        Cs(bool),
        Dc(bool),
        Write(Vec<u8>),
    }

    type Log = Rc<RefCell<Vec<Op>>>;

    struct Spi(Log);

    impl embedded_hal::spi::ErrorType for Spi {
        type Error = Infallible;
    }

    impl SpiBus for Spi {
        fn read(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
            words.fill(0);
            Ok(())
        }

        fn write(&mut self, words: &[u8]) -> Result<(), Infallible> {
            self.0.borrow_mut().push(Op::Write(words.to_vec()));
            Ok(())
        }

        fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Infallible> {
            read.fill(0);
            self.write(write)
        }

        fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Infallible> {
            self.0.borrow_mut().push(Op::Write(words.to_vec()));
            Ok(())
        }

        fn flush(&mut self) -> Result<(), Infallible> {
            Ok(())
        }
    }

    struct Pin(Log, fn(bool) -> Op);

    impl embedded_hal::digital::ErrorType for Pin {
        type Error = Infallible;
    }

    impl OutputPin for Pin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().push((self.1)(false));
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.0.borrow_mut().push((self.1)(true));
            Ok(())
        }
    }

    struct NoDelay;

    impl DelayNs for NoDelay {
        fn delay_ns(&mut self, _: u32) {}
    }

    fn panel() -> (Ili9341<Spi, Pin, Pin>, Log) {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut lcd = Ili9341::new(
            Spi(log.clone()),
            Pin(log.clone(), Op::Cs),
            Pin(log.clone(), Op::Dc),
            Ili9341Config::default(),
        );
        lcd.init(&mut NoDelay).unwrap();
        log.borrow_mut().clear();
        (lcd, log)
    }

    /// Split the log into (command, data bytes) pairs
    fn commands(log: &Log) -> Vec<(u8, Vec<u8>)> {
        let mut out: Vec<(u8, Vec<u8>)> = Vec::new();
        let mut dc = true;
        for op in log.borrow().iter() {
            match op {
                Op::Dc(level) => dc = *level,
                Op::Write(bytes) if !dc => out.push((bytes[0], Vec::new())),
                Op::Write(bytes) => {
                    if let Some(last) = out.last_mut() {
                        last.1.extend_from_slice(bytes);
                    }
                }
                Op::Cs(_) => {}
            }
        }
        out
    }

    #[test]
    fn test_init_sequence() {
        let log: Log = Rc::new(RefCell::new(Vec::new()));
        let mut lcd = Ili9341::new(
            Spi(log.clone()),
            Pin(log.clone(), Op::Cs),
            Pin(log.clone(), Op::Dc),
            Ili9341Config::default(),
        );
        assert_eq!(lcd.begin_write(), Err(DisplayError::NotReady));
        lcd.init(&mut NoDelay).unwrap();
        let cmds: Vec<u8> = commands(&log).iter().map(|c| c.0).collect();
        assert_eq!(
            cmds,
            vec![cmd::SWRESET, cmd::SLPOUT, cmd::PIXFMT, cmd::MADCTL, cmd::DISPON]
        );
        assert_eq!(log.borrow().first(), Some(&Op::Cs(false)));
        assert_eq!(log.borrow().last(), Some(&Op::Cs(true)));
    }

    #[test]
    fn test_push_sets_window_and_translates() {
        let (mut lcd, log) = panel();
        let mut palette = [0u16; 256];
        palette[1] = 0xF800;
        palette[2] = 0x07E0;
        lcd.set_palette(&palette).unwrap();

        lcd.begin_write().unwrap();
        lcd.push_image(10, 5, 3, 1, &[1, 2, 1]).unwrap();
        lcd.end_write().unwrap();

        let cmds = commands(&log);
        assert_eq!(cmds[0], (cmd::CASET, vec![0, 10, 0, 12]));
        assert_eq!(cmds[1], (cmd::PASET, vec![0, 5, 0, 5]));
        assert_eq!(cmds[2], (cmd::RAMWR, vec![0xF8, 0x00, 0x07, 0xE0, 0xF8, 0x00]));
    }

    #[test]
    fn test_long_runs_stream_in_chunks() {
        let (mut lcd, log) = panel();
        lcd.begin_write().unwrap();
        let row = [7u8; 320];
        lcd.push_image(0, 239, 320, 1, &row).unwrap();
        let cmds = commands(&log);
        assert_eq!(cmds[0], (cmd::CASET, vec![0, 0, 0x01, 0x3F]));
        assert_eq!(cmds[2].1.len(), 640);
    }

    #[test]
    fn test_push_requires_session_and_bounds() {
        let (mut lcd, _) = panel();
        assert_eq!(lcd.push_image(0, 0, 1, 1, &[0]), Err(DisplayError::NotReady));
        lcd.begin_write().unwrap();
        assert_eq!(
            lcd.push_image(319, 0, 2, 1, &[0, 0]),
            Err(DisplayError::OutOfBounds)
        );
        assert_eq!(
            lcd.push_image(0, 0, 4, 1, &[0, 0]),
            Err(DisplayError::OutOfBounds)
        );
        assert_eq!(lcd.push_image(0, 0, 0, 1, &[]), Ok(()));
    }
}
