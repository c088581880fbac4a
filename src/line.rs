//! The bidirectional data line shared by the host and the sensor.
//!
//! The DHT11 protocol time-multiplexes one wire: the host drives it during
//! the start sequence, then lets it float so the sensor can pull it down.
//! [`DataLine`] captures that capability on top of the `embedded-hal` pin
//! traits, and [`OpenDrain`] provides it for any open-drain pin.

use embedded_hal::digital::{ErrorType, InputPin, OutputPin};

/// Direction of the data line.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineMode {
    /// The host controls the logic level.
    Driven,
    /// The host reads the level; the line is pulled passively high.
    Listening,
}

/// A digital line that can be switched between driving and listening.
///
/// `set_high`/`set_low` are only meaningful while [`LineMode::Driven`],
/// `is_high`/`is_low` only while [`LineMode::Listening`].
pub trait DataLine: InputPin + OutputPin {
    /// Switches the line direction.
    fn set_mode(&mut self, mode: LineMode) -> Result<(), Self::Error>;
}

impl<T: DataLine + ?Sized> DataLine for &mut T {
    fn set_mode(&mut self, mode: LineMode) -> Result<(), Self::Error> {
        T::set_mode(self, mode)
    }
}

/// [`DataLine`] for an open-drain pin with an external pull-up.
///
/// Listening means the pin is released (output high, so the transistor is
/// off and the pull-up or the sensor decides the level). Leaving
/// [`LineMode::Driven`] releases the line; switching to the mode the line is
/// already in does not touch the pin.
pub struct OpenDrain<P> {
    pin: P,
    mode: LineMode,
}

impl<P> OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    /// Wraps an open-drain pin. The line is assumed idle, i.e. released.
    pub fn new(pin: P) -> Self {
        OpenDrain {
            pin,
            mode: LineMode::Listening,
        }
    }

    /// Current direction of the line.
    pub fn mode(&self) -> LineMode {
        self.mode
    }

    /// Returns the wrapped pin.
    pub fn free(self) -> P {
        self.pin
    }
}

impl<P: ErrorType> ErrorType for OpenDrain<P> {
    type Error = P::Error;
}

impl<P: InputPin> InputPin for OpenDrain<P> {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_high()
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.pin.is_low()
    }
}

impl<P: OutputPin> OutputPin for OpenDrain<P> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        debug_assert_eq!(self.mode, LineMode::Driven, "write on a released line");
        self.pin.set_low()
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        debug_assert_eq!(self.mode, LineMode::Driven, "write on a released line");
        self.pin.set_high()
    }
}

impl<P> DataLine for OpenDrain<P>
where
    P: InputPin + OutputPin,
{
    fn set_mode(&mut self, mode: LineMode) -> Result<(), Self::Error> {
        if self.mode == mode {
            return Ok(());
        }
        if mode == LineMode::Listening {
            self.pin.set_high()?;
        }
        self.mode = mode;
        Ok(())
    }
}
