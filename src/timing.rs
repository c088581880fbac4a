//! Timing parameters for one DHT11 transaction.

/// Longest high pulse the sensor uses to send a `0` bit, in microseconds.
pub const ZERO_PULSE_MAX_US: u32 = 28;

/// Shortest high pulse the sensor uses to send a `1` bit, in microseconds.
pub const ONE_PULSE_MIN_US: u32 = 70;

/// Shortest start-low pulse the sensor is guaranteed to notice, in milliseconds.
pub const START_LOW_MIN_MS: u32 = 18;

/// Length of one settle step before the start sequence, in milliseconds.
pub const SETTLE_STEP_MS: u32 = 50;

/// Largest poll step that keeps edge detection well inside the bit window.
pub const MAX_POLL_STEP_US: u32 = 10;

/// Longest phase a bounded wait must cover: the 80 µs acknowledgment pulses.
const RESPONSE_PULSE_US: u32 = 80;

/// Timing of a transaction.
///
/// The defaults match the DHT11 datasheet. Every wait on the line is bounded
/// in microseconds, so as long as the delay provider waits exactly what it is
/// asked for, [`Timing::worst_case_us`] is an upper bound on the duration of
/// one acquisition even if the sensor hangs mid-frame.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timing {
    /// Idle-high settle time before the start pulse, in milliseconds.
    ///
    /// Guards against reading too soon after power-on or after the previous
    /// read. Can be set to 0 if the caller already spaces reads by a second
    /// or more.
    pub settle_ms: u32,
    /// Duration of the start-low pulse, in milliseconds.
    pub start_low_ms: u32,
    /// Time the line is held high after the start pulse before it is
    /// released, in microseconds. Must be within 20..=40.
    pub release_us: u32,
    /// Bound on each wait of the presence handshake, in microseconds.
    pub response_timeout_us: u32,
    /// Delay between a bit's rising edge and the sample, in microseconds.
    ///
    /// A high pulse reads as `1` only if it lasts strictly longer than this.
    pub bit_sample_us: u32,
    /// Bound on each edge wait during bit reception, in microseconds.
    pub edge_timeout_us: u32,
    /// Delay between two polls of the line while waiting for an edge, in
    /// microseconds.
    ///
    /// Must not be shorter than the shortest delay the provider can produce:
    /// use [`crate::timer::MIN_DELAY_US`] with [`crate::MicrosecondTimer`].
    pub poll_step_us: u32,
}

impl Timing {
    /// Datasheet timing with a one second settle period.
    pub const DEFAULT: Timing = Timing {
        settle_ms: 1_000,
        start_low_ms: START_LOW_MIN_MS,
        release_us: 20,
        response_timeout_us: 100,
        bit_sample_us: 40,
        edge_timeout_us: 100,
        poll_step_us: 1,
    };

    /// Returns a copy with a different settle period.
    pub const fn with_settle_ms(mut self, settle_ms: u32) -> Self {
        self.settle_ms = settle_ms;
        self
    }

    /// Returns a copy with a different poll step.
    pub const fn with_poll_step_us(mut self, poll_step_us: u32) -> Self {
        self.poll_step_us = poll_step_us;
        self
    }

    /// Checks the parameters against the sensor's protocol limits.
    pub fn validate(&self) -> Result<(), TimingError> {
        if self.start_low_ms < START_LOW_MIN_MS {
            return Err(TimingError::StartTooShort);
        }
        if !(20..=40).contains(&self.release_us) {
            return Err(TimingError::ReleaseOutOfRange);
        }
        if self.bit_sample_us <= ZERO_PULSE_MAX_US || self.bit_sample_us >= ONE_PULSE_MIN_US {
            return Err(TimingError::SampleOutsideWindow);
        }
        if self.response_timeout_us < RESPONSE_PULSE_US || self.edge_timeout_us < RESPONSE_PULSE_US
        {
            return Err(TimingError::TimeoutTooShort);
        }
        if !(1..=MAX_POLL_STEP_US).contains(&self.poll_step_us) {
            return Err(TimingError::PollStepOutOfRange);
        }
        Ok(())
    }

    /// Time a wait bounded by `timeout_us` may take: whole poll steps until
    /// the bound is reached.
    pub fn wait_bound_us(&self, timeout_us: u32) -> u64 {
        let step = u64::from(self.poll_step_us.max(1));
        u64::from(timeout_us).div_ceil(step) * step
    }

    /// Upper bound on the duration of one acquisition, in microseconds.
    pub fn worst_case_us(&self) -> u64 {
        let start = (u64::from(self.settle_ms) + u64::from(self.start_low_ms)) * 1_000
            + u64::from(self.release_us);
        let presence = 3 * self.wait_bound_us(self.response_timeout_us);
        let per_bit = 2 * self.wait_bound_us(self.edge_timeout_us) + u64::from(self.bit_sample_us);

        start + presence + 40 * per_bit
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Invalid [`Timing`] parameters.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimingError {
    /// The start-low pulse is shorter than the sensor requires.
    StartTooShort,
    /// The release time is outside 20..=40 µs.
    ReleaseOutOfRange,
    /// The bit sample delay does not separate `0` pulses from `1` pulses.
    SampleOutsideWindow,
    /// A wait bound is shorter than the pulse it waits out.
    TimeoutTooShort,
    /// The poll step is zero or longer than [`MAX_POLL_STEP_US`].
    PollStepOutOfRange,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert_eq!(Timing::default(), Timing::DEFAULT);
        assert_eq!(Timing::DEFAULT.validate(), Ok(()));
    }

    #[test]
    fn test_sample_window_is_exclusive() {
        let sample = |bit_sample_us| Timing {
            bit_sample_us,
            ..Timing::DEFAULT
        };

        assert_eq!(
            sample(ZERO_PULSE_MAX_US).validate(),
            Err(TimingError::SampleOutsideWindow)
        );
        assert_eq!(
            sample(ONE_PULSE_MIN_US).validate(),
            Err(TimingError::SampleOutsideWindow)
        );
        assert_eq!(sample(29).validate(), Ok(()));
        assert_eq!(sample(69).validate(), Ok(()));
    }

    #[test]
    fn test_invalid_start() {
        let timing = Timing {
            start_low_ms: 10,
            ..Timing::DEFAULT
        };
        assert_eq!(timing.validate(), Err(TimingError::StartTooShort));

        let timing = Timing {
            release_us: 50,
            ..Timing::DEFAULT
        };
        assert_eq!(timing.validate(), Err(TimingError::ReleaseOutOfRange));
    }

    #[test]
    fn test_timeout_too_short() {
        let timing = Timing {
            edge_timeout_us: 60,
            ..Timing::DEFAULT
        };
        assert_eq!(timing.validate(), Err(TimingError::TimeoutTooShort));
    }

    #[test]
    fn test_worst_case() {
        let timing = Timing::DEFAULT.with_settle_ms(0);

        // 18 ms + 20 us + 3 * 100 us + 40 * (100 + 40 + 100) us
        assert_eq!(timing.worst_case_us(), 18_000 + 20 + 300 + 9_600);
    }

    #[test]
    fn test_poll_step_range() {
        assert_eq!(
            Timing::DEFAULT.with_poll_step_us(0).validate(),
            Err(TimingError::PollStepOutOfRange)
        );
        assert_eq!(
            Timing::DEFAULT.with_poll_step_us(MAX_POLL_STEP_US + 1).validate(),
            Err(TimingError::PollStepOutOfRange)
        );
        assert_eq!(Timing::DEFAULT.with_poll_step_us(2).validate(), Ok(()));
    }

    #[test]
    fn test_worst_case_counts_whole_poll_steps() {
        let timing = Timing::DEFAULT.with_settle_ms(0).with_poll_step_us(3);

        // 100 us bounds end after 34 polls of 3 us
        assert_eq!(timing.wait_bound_us(100), 102);
        assert_eq!(timing.worst_case_us(), 18_000 + 20 + 3 * 102 + 40 * (2 * 102 + 40));
    }
}
