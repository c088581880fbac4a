use core::fmt;

/// Possible errors from a DHT11 acquisition.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, PartialEq, Eq)]
pub enum DhtError<E> {
    /// The sensor did not acknowledge the start sequence.
    NoPresence,
    /// A frame was received but its checksum byte did not match the data.
    ChecksumMismatch {
        /// Sum of the four data bytes, modulo 256.
        expected: u8,
        /// Checksum byte sent by the sensor.
        actual: u8,
    },
    /// Timed out waiting for a bit edge in the middle of a frame.
    Timeout,
    /// Error from the GPIO pin (input/output).
    PinError(E),
}

impl<E> DhtError<E> {
    /// Returns `true` if the next poll cycle may simply try again.
    ///
    /// Only pin errors are reported by the HAL itself and are left to the
    /// caller to judge.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::PinError(_))
    }
}

impl<E> From<E> for DhtError<E> {
    fn from(value: E) -> Self {
        Self::PinError(value)
    }
}

impl<E: fmt::Debug> fmt::Display for DhtError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPresence => write!(f, "sensor did not answer the start sequence"),
            Self::ChecksumMismatch { expected, actual } => write!(
                f,
                "checksum mismatch: expected {expected:#04x}, received {actual:#04x}"
            ),
            Self::Timeout => write!(f, "timed out waiting for a bit edge"),
            Self::PinError(e) => write!(f, "pin error: {e:?}"),
        }
    }
}

impl<E: fmt::Debug> core::error::Error for DhtError<E> {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_error_from() {
        let err: DhtError<u8> = 7.into();
        assert_eq!(err, DhtError::PinError(7));
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable() {
        assert!(DhtError::<()>::NoPresence.is_recoverable());
        assert!(DhtError::<()>::Timeout.is_recoverable());
        assert!(
            DhtError::<()>::ChecksumMismatch {
                expected: 0x4F,
                actual: 0x50
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_display() {
        let err = DhtError::<()>::ChecksumMismatch {
            expected: 0x4F,
            actual: 0x50,
        };
        assert_eq!(
            err.to_string(),
            "checksum mismatch: expected 0x4f, received 0x50"
        );
    }
}
