//! Indexed display abstractions
//!
//! The panel is addressed in canvas coordinates and accepts one byte per
//! pixel. The byte is an index into a 256-entry true-color table that the
//! driver holds (see [`IndexedDisplay::set_palette`]); translation to the
//! wire format happens inside the driver.

use core::ops::{Deref, DerefMut};

/// Display errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DisplayError {
    /// Transport (SPI/parallel bus) failure
    Bus,
    /// Region lies outside the panel or pixel data is too short
    OutOfBounds,
    /// Panel not initialized or write session not open
    NotReady,
}

/// 8-bit indexed display
///
/// Implementations may share their transport with other peripherals
/// (an SD card on the same SPI bus, for example). Callers must bracket
/// pushes with [`begin_write`](Self::begin_write) /
/// [`end_write`](Self::end_write) and must not perform other I/O on the
/// shared bus while a session is open. [`WriteSession`] does this for you.
pub trait IndexedDisplay {
    /// Panel dimensions in pixels (width, height)
    fn dimensions(&self) -> (u16, u16);

    /// Acquire the transport for a batch of writes
    fn begin_write(&mut self) -> Result<(), DisplayError>;

    /// Release the transport
    fn end_write(&mut self) -> Result<(), DisplayError>;

    /// Push a rectangle of indexed pixels
    ///
    /// - `x`, `y`: top-left corner in canvas coordinates
    /// - `width`, `height`: rectangle size (runs use `height = 1`)
    /// - `pixels`: row-major, `width * height` bytes
    fn push_image(
        &mut self,
        x: u16,
        y: u16,
        width: u16,
        height: u16,
        pixels: &[u8],
    ) -> Result<(), DisplayError>;

    /// Commit a batch of pushes
    ///
    /// Panels that write straight to GRAM may treat this as a flush.
    fn display(&mut self) -> Result<(), DisplayError>;

    /// Replace the index → RGB565 translation table
    fn set_palette(&mut self, palette: &[u16; 256]) -> Result<(), DisplayError>;
}

/// Scoped write session on an [`IndexedDisplay`]
///
/// An *owned* session calls `begin_write` on creation and `end_write` on
/// drop. A *held* session borrows a transport that was opened elsewhere
/// (for the whole runtime) and leaves it untouched.
pub struct WriteSession<'a, D: IndexedDisplay + ?Sized> {
    display: &'a mut D,
    owned: bool,
}

impl<'a, D: IndexedDisplay + ?Sized> WriteSession<'a, D> {
    /// Open a session that is released when dropped
    pub fn open(display: &'a mut D) -> Result<Self, DisplayError> {
        display.begin_write()?;
        Ok(Self {
            display,
            owned: true,
        })
    }

    /// Wrap a transport that is already held by the caller
    pub fn held(display: &'a mut D) -> Self {
        Self {
            display,
            owned: false,
        }
    }

    /// Whether dropping this session releases the transport
    pub fn is_owned(&self) -> bool {
        self.owned
    }
}

impl<D: IndexedDisplay + ?Sized> Deref for WriteSession<'_, D> {
    type Target = D;

    fn deref(&self) -> &D {
        self.display
    }
}

impl<D: IndexedDisplay + ?Sized> DerefMut for WriteSession<'_, D> {
    fn deref_mut(&mut self) -> &mut D {
        self.display
    }
}

impl<D: IndexedDisplay + ?Sized> Drop for WriteSession<'_, D> {
    fn drop(&mut self) {
        if self.owned {
            // Nothing useful to do with a failed release here; the next
            // begin_write reports the bus state.
            let _ = self.display.end_write();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Probe {
        begins: u32,
        ends: u32,
        fail_begin: bool,
    }

    impl IndexedDisplay for Probe {
        fn dimensions(&self) -> (u16, u16) {
            (4, 4)
        }

        fn begin_write(&mut self) -> Result<(), DisplayError> {
            if self.fail_begin {
                return Err(DisplayError::Bus);
            }
            self.begins += 1;
            Ok(())
        }

        fn end_write(&mut self) -> Result<(), DisplayError> {
            self.ends += 1;
            Ok(())
        }

        fn push_image(&mut self, _: u16, _: u16, _: u16, _: u16, _: &[u8]) -> Result<(), DisplayError> {
            Ok(())
        }

        fn display(&mut self) -> Result<(), DisplayError> {
            Ok(())
        }

        fn set_palette(&mut self, _: &[u16; 256]) -> Result<(), DisplayError> {
            Ok(())
        }
    }

    #[test]
    fn test_owned_session_releases_on_drop() {
        let mut probe = Probe::default();
        {
            let session = WriteSession::open(&mut probe).unwrap();
            assert!(session.is_owned());
        }
        assert_eq!(probe.begins, 1);
        assert_eq!(probe.ends, 1);
    }

    #[test]
    fn test_held_session_leaves_bus_alone() {
        let mut probe = Probe::default();
        {
            let mut session = WriteSession::held(&mut probe);
            session.display().unwrap();
        }
        assert_eq!(probe.begins, 0);
        assert_eq!(probe.ends, 0);
    }

    #[test]
    fn test_failed_begin_opens_nothing() {
        let mut probe = Probe {
            fail_begin: true,
            ..Default::default()
        };
        assert_eq!(WriteSession::open(&mut probe).err(), Some(DisplayError::Bus));
        assert_eq!(probe.ends, 0);
    }
}
