use core::fmt;

/// Number of bytes in one DHT11 frame.
pub const FRAME_LEN: usize = 5;

/// Reading returned by the DHT11 sensor.
///
/// The sensor reports each quantity as an integral byte and a decimal byte.
/// No scaling is applied: `temperature_integral = 24` and
/// `temperature_decimal = 5` means 24.5 °C.
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Reading {
    /// Integral part of the relative humidity, in percent.
    pub humidity_integral: u8,
    /// Decimal part of the relative humidity.
    pub humidity_decimal: u8,
    /// Integral part of the temperature, in degrees Celsius.
    pub temperature_integral: u8,
    /// Decimal part of the temperature.
    pub temperature_decimal: u8,
    /// Checksum byte as transmitted by the sensor.
    pub checksum: u8,
}

impl Reading {
    /// Builds a reading from the five bytes of a frame, in wire order.
    ///
    /// The checksum is not verified here; see [`Reading::is_valid`].
    pub const fn from_frame(frame: [u8; FRAME_LEN]) -> Self {
        let [
            humidity_integral,
            humidity_decimal,
            temperature_integral,
            temperature_decimal,
            checksum,
        ] = frame;

        Reading {
            humidity_integral,
            humidity_decimal,
            temperature_integral,
            temperature_decimal,
            checksum,
        }
    }

    /// Sum of the four data bytes, modulo 256.
    pub fn expected_checksum(&self) -> u8 {
        [
            self.humidity_integral,
            self.humidity_decimal,
            self.temperature_integral,
            self.temperature_decimal,
        ]
        .iter()
        .fold(0u8, |sum, v| sum.wrapping_add(*v))
    }

    /// Returns `true` if the transmitted checksum matches the data bytes.
    pub fn is_valid(&self) -> bool {
        self.expected_checksum() == self.checksum
    }
}

impl From<[u8; FRAME_LEN]> for Reading {
    fn from(frame: [u8; FRAME_LEN]) -> Self {
        Self::from_frame(frame)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{} °C, {}.{} %RH",
            self.temperature_integral,
            self.temperature_decimal,
            self.humidity_integral,
            self.humidity_decimal
        )
    }
}
