//! This is a platform-agnostic Rust driver for the SHT20, SHT21, SHT25, HTU20, HTU21, Si7013,
//! Si7020 and Si7021 humidity and temperature digital sensors using the [`embedded-hal`] traits.
//!
//! [`embedded-hal`]: https://github.com/rust-embedded/embedded-hal/tree/master/embedded-hal
//!
//! This driver allows you to:
//! - Check the device is present and soft reset it.
//! - Read temperature and relative humidity, with checksum validation.
//! - Read the status field of the last measurement.
//! - Switch the on-chip heater on and off, with a heat timeout and a 3 minute cooldown.
//! - Set and read the heater current level (Si70xx).
//! - Set and read the measurement resolution.
//! - Check the end-of-battery flag.
//! - Read the electronic ID and firmware revision (Si70xx, HTU2x).
//!
//! This driver does not support the following device features:
//! - Hold master measurement mode (clock stretching).
//! - Non-blocking measurement.  [`Sht2x::last_request`] is exposed for callers that want to
//!   schedule reads themselves.
//!
//! ## Features
//!
//! - `defmt`: Enables logging using the `defmt` framework.
//! - `log`: Enables logging using the `log` framework.
//!
//! ## Errors
//!
//! Every fallible call returns a [`Result`] with an [`Error`].  The driver also latches the
//! matching [`ErrorCode`] until it is collected with [`Sht2x::take_error`], so code that only
//! checks `is_ok()` can still find out what went wrong later.
//!
//! ## Heater
//!
//! Do not use the heater for long periods.  Heat for at most 3 minutes and let the device cool
//! down for at least 3 minutes.  [`Sht2x::heat_on`] refuses to switch the heater on during the
//! cooldown, and [`Sht2x::is_heater_on`] switches it off once the heat timeout has passed.
//!
//! ## Supported devices: SHT20, SHT21, SHT25, HTU20, HTU21, Si7013, Si7020, Si7021
//!
//! All parts share the SHT21 command set.  [`Variant`] only records which part the driver was
//! created for.
//!
//! To use this driver, import this crate and an `embedded_hal` implementation, then instantiate
//! the device with a millisecond clock.
//!
//! ## Example:
//!
//! ```
//! # use embedded_hal_mock::eh1::delay::NoopDelay;
//! # use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
//! use sht2x::{I2cAddr, Sht2x};
//!
//! # let i2c = I2cMock::new(&[
//! #     Transaction::write(0x40, vec![0xF3]),
//! #     Transaction::read(0x40, vec![0x63, 0x51, 0x37]),
//! #     Transaction::write(0x40, vec![0xF5]),
//! #     Transaction::read(0x40, vec![0x7C, 0x82, 0x97]),
//! # ]);
//! # let delay = NoopDelay::new();
//! // Platform-specific: a monotonic millisecond counter
//! let millis = || 0u32;
//!
//! let mut sht = Sht2x::new(i2c, delay, millis, I2cAddr::Default);
//!
//! sht.read().unwrap();
//! println!("{:.1} %RH, {:.1} °C", sht.humidity(), sht.temperature());
//! # sht.release().done();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![cfg_attr(not(test), no_std)]

#[cfg(all(feature = "defmt", feature = "log"))]
compile_error!("Features \"defmt\" and \"log\" are mutually exclusive and cannot be enabled together");

mod clock;
mod device_impl;
mod hw_def;
mod types;

pub use crate::{clock::Clock, hw_def::*, types::*};
