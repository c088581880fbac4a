//! DHT11 Sensor Driver for Embedded Rust
//!
//! This crate provides a platform-agnostic driver for the DHT11 temperature
//! and humidity sensor, built on top of the [`embedded-hal`] traits.
//!
//! The sensor talks over a single bidirectional wire. The host pulls the line
//! low to request a measurement, releases it, and the sensor answers with a
//! presence pulse followed by 40 bits whose value is encoded in the width of
//! each high pulse. The last byte is a checksum of the first four.
//!
//! # Features
//! - Blocking synchronous API using `embedded-hal` traits
//! - Designed for `no_std` environments
//! - Every wait on the line is bounded: a missing or wedged sensor yields an
//!   error instead of hanging the caller
//! - A microsecond delay provider for one-shot hardware countdown timers
//!
//! # Dependencies
//! This driver depends on the following `embedded-hal` traits:
//! - [`InputPin`] and [`OutputPin`] for GPIO access, through [`DataLine`]
//! - [`DelayNs`] for accurate timing
//!
//! # Optional Features
//! - `defmt`: Implements `defmt::Format` for logging support and logs
//!   protocol failures
//! - `critical-section`: Masks interrupts while the sensor is transmitting
//!
//! # Example
//!
//! ```ignore
//! let line = OpenDrain::new(pin);
//! let delay = MicrosecondTimer::new(tim15);
//! let mut dht = Dht11::new(line, delay);
//!
//! match dht.acquire() {
//!     Ok(reading) => info!("{}", reading),
//!     Err(e) if e.is_recoverable() => { /* try again on the next poll */ }
//!     Err(e) => panic!("{:?}", e),
//! }
//! ```
//!
//! [`embedded-hal`]: https://docs.rs/embedded-hal
//! [`InputPin`]: embedded_hal::digital::InputPin
//! [`OutputPin`]: embedded_hal::digital::OutputPin
//! [`DelayNs`]: embedded_hal::delay::DelayNs

#![cfg_attr(not(test), no_std)]

// Must stay first so the macros are in scope for the modules below
#[macro_use]
mod logging;

pub mod dht11;
pub mod error;
pub mod line;
pub mod reading;
pub mod timer;
pub mod timing;

pub use dht11::Dht11;
pub use error::DhtError;
pub use line::{DataLine, LineMode, OpenDrain};
pub use reading::Reading;
pub use timer::{Countdown, MicrosecondTimer};
pub use timing::{Timing, TimingError};
