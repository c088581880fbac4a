use embedded_hal::delay::DelayNs;

use crate::error::DhtError;
use crate::line::{DataLine, LineMode};
use crate::reading::{FRAME_LEN, Reading};
use crate::timing::{SETTLE_STEP_MS, Timing, TimingError};

/// Driver for the DHT11 temperature and humidity sensor.
pub struct Dht11<LINE, D> {
    line: LINE,
    delay: D,
    timing: Timing,
}

impl<LINE, DELAY, E> Dht11<LINE, DELAY>
where
    LINE: DataLine<Error = E>,
    DELAY: DelayNs,
{
    /// Creates a new instance of the DHT11 driver with [`Timing::DEFAULT`].
    ///
    /// # Arguments
    ///
    /// * `line` - The data line the sensor is connected to. See [`crate::OpenDrain`]
    ///   for plain open-drain pins.
    /// * `delay` - A delay provider implementing the `DelayNs` trait, with
    ///   microsecond resolution (e.g. [`crate::MicrosecondTimer`]).
    pub fn new(line: LINE, delay: DELAY) -> Self {
        Dht11 {
            line,
            delay,
            timing: Timing::DEFAULT,
        }
    }

    /// Creates a new instance of the DHT11 driver with custom timing.
    ///
    /// # Errors
    ///
    /// Returns the [`TimingError`] reported by [`Timing::validate`].
    pub fn with_timing(line: LINE, delay: DELAY, timing: Timing) -> Result<Self, TimingError> {
        timing.validate()?;
        Ok(Dht11 {
            line,
            delay,
            timing,
        })
    }

    /// Timing used by this driver.
    pub fn timing(&self) -> &Timing {
        &self.timing
    }

    /// Releases the line and the delay provider.
    pub fn free(self) -> (LINE, DELAY) {
        (self.line, self.delay)
    }

    /// Acquires one temperature and humidity reading.
    ///
    /// This method performs the complete DHT11 transaction: settling the
    /// line, sending the start signal, checking the sensor's presence pulse,
    /// reading 5 bytes and validating the checksum. It blocks for the whole
    /// transaction, at most [`Timing::worst_case_us`].
    ///
    /// Whatever the outcome, the line is left in [`LineMode::Listening`].
    ///
    /// # Returns
    ///
    /// * `Ok(Reading)` if the read is successful and the checksum is valid.
    /// * `Err(DhtError)` if the sensor is absent, the frame is corrupted or a pin fails.
    pub fn acquire(&mut self) -> Result<Reading, DhtError<E>> {
        let result = self.transaction();
        let released = self.line.set_mode(LineMode::Listening);

        // Report the first error that occurred
        let reading = result?;
        released?;
        Ok(reading)
    }

    fn transaction(&mut self) -> Result<Reading, DhtError<E>> {
        self.start()?;
        let frame = masked(|| self.receive())?;
        trace!("dht11: frame {}", frame);

        let reading = Reading::from_frame(frame);
        let expected = reading.expected_checksum();
        if expected != reading.checksum {
            warn!(
                "dht11: checksum mismatch, expected {=u8:#x} received {=u8:#x}",
                expected, reading.checksum
            );
            return Err(DhtError::ChecksumMismatch {
                expected,
                actual: reading.checksum,
            });
        }
        Ok(reading)
    }

    /// Settles the line and sends the start signal.
    ///
    /// The line is held high for the settle period, pulled low for at least
    /// 18 ms, driven high for 20-40 µs and then released for the sensor.
    fn start(&mut self) -> Result<(), DhtError<E>> {
        debug!("dht11: start sequence");
        self.line.set_mode(LineMode::Driven)?;
        self.line.set_high()?;

        for _ in 0..self.timing.settle_ms / SETTLE_STEP_MS {
            self.delay.delay_ms(SETTLE_STEP_MS);
        }
        let rest = self.timing.settle_ms % SETTLE_STEP_MS;
        if rest > 0 {
            self.delay.delay_ms(rest);
        }

        // MCU sends start request
        self.line.set_low()?;
        self.delay.delay_ms(self.timing.start_low_ms);
        self.line.set_high()?;
        self.delay.delay_us(self.timing.release_us);
        self.line.set_mode(LineMode::Listening)?;
        Ok(())
    }

    /// Checks the presence pulse and reads the 5 bytes of the frame.
    fn receive(&mut self) -> Result<[u8; FRAME_LEN], DhtError<E>> {
        self.check_presence()?;

        let mut frame = [0; FRAME_LEN];
        for b in frame.iter_mut() {
            *b = self.read_byte()?;
        }
        Ok(frame)
    }

    /// Waits for the sensor's 80us low and 80us high acknowledgment.
    ///
    /// Returns once the high pulse is over, i.e. on the low marker of the
    /// first data bit.
    fn check_presence(&mut self) -> Result<(), DhtError<E>> {
        let timeout = self.timing.response_timeout_us;
        let no_presence = |err: DhtError<E>| match err {
            DhtError::Timeout => DhtError::NoPresence,
            other => other,
        };

        let acknowledged = self.wait_for_low(timeout).and_then(|()| self.wait_for_high(timeout));
        if let Err(err) = acknowledged {
            warn!("dht11: no presence pulse");
            return Err(no_presence(err));
        }
        self.wait_for_low(timeout).map_err(no_presence)
    }

    /// Reads one byte (8 bits, MSB first) from the sensor.
    ///
    /// # Returns
    ///
    /// * `Ok(u8)` with the read byte
    /// * `Err(DhtError)` on communication failure
    fn read_byte(&mut self) -> Result<u8, DhtError<E>> {
        let mut byte: u8 = 0;

        for i in 0..8 {
            let bit_mask = 1 << (7 - i);
            if self.read_bit()? {
                byte |= bit_mask;
            }
        }

        Ok(byte)
    }

    /// Reads a single bit from the sensor.
    ///
    /// Every bit starts with a ~50us low marker. The sensor then holds the
    /// line high for ~26us to send a `0` or ~70us to send a `1`, so the level
    /// `bit_sample_us` after the rising edge is the bit value. A pulse lasting
    /// exactly `bit_sample_us` is already over at the sample and reads as `0`.
    fn read_bit(&mut self) -> Result<bool, DhtError<E>> {
        let timeout = self.timing.edge_timeout_us;

        // Wait for the end of the low marker
        self.wait_for_high(timeout)?;

        self.delay.delay_us(self.timing.bit_sample_us);

        // If it is still High, then the bit value is 1
        let bit_is_one = self.line.is_high()?;
        if bit_is_one {
            self.wait_for_low(timeout)?;
        }

        Ok(bit_is_one)
    }

    /// Waits until the data line goes high or times out.
    fn wait_for_high(&mut self, timeout_us: u32) -> Result<(), DhtError<E>> {
        let step_us = self.timing.poll_step_us;
        Self::wait_for_state(&mut self.delay, timeout_us, step_us, || self.line.is_high())
    }

    /// Waits until the data line goes low or times out.
    fn wait_for_low(&mut self, timeout_us: u32) -> Result<(), DhtError<E>> {
        let step_us = self.timing.poll_step_us;
        Self::wait_for_state(&mut self.delay, timeout_us, step_us, || self.line.is_low())
    }

    /// Polls a pin condition every `step_us` until true or timeout.
    ///
    /// The bound is counted in microseconds waited, not in polls.
    ///
    /// # Errors
    ///
    /// Returns `DhtError::Timeout` if the condition does not hold within
    /// `timeout_us`.
    fn wait_for_state<F>(
        delay: &mut DELAY,
        timeout_us: u32,
        step_us: u32,
        mut condition: F,
    ) -> Result<(), DhtError<E>>
    where
        F: FnMut() -> Result<bool, E>,
    {
        let step_us = step_us.max(1);
        let mut waited_us = 0;
        while waited_us < timeout_us {
            if condition()? {
                return Ok(());
            }
            delay.delay_us(step_us);
            waited_us += step_us;
        }
        debug!("dht11: no edge within {=u32} us", timeout_us);
        Err(DhtError::Timeout)
    }
}

/// Runs the timing-critical part of a transaction with interrupts masked.
#[cfg(feature = "critical-section")]
fn masked<R>(f: impl FnOnce() -> R) -> R {
    critical_section::with(|_cs| f())
}

#[cfg(not(feature = "critical-section"))]
fn masked<R>(f: impl FnOnce() -> R) -> R {
    f()
}
