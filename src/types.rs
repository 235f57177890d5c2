use crate::hw_def::*;

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// SHT2x, HTU2x and Si70xx device driver
#[derive(Debug)]
pub struct Sht2x<I2C, Delay, Clk> {
    pub(crate) i2c: I2C,
    pub(crate) delay: Delay,
    pub(crate) clock: Clk,
    pub(crate) i2c_addr: I2cAddr,
    pub(crate) variant: Variant,
    pub(crate) heat_timeout: u8,
    pub(crate) last_read: u32,
    pub(crate) last_request: u32,
    pub(crate) heater_start: u32,
    pub(crate) heater_stop: Option<u32>,
    pub(crate) heater_on: bool,
    pub(crate) raw: RawMeasurement,
    pub(crate) status: Status,
    pub(crate) error: ErrorCode,
}

/// All possible errors in this crate
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Debug)]
pub enum Error<E> {
    /// Writing a command to the device failed
    WriteCmd(E),
    /// The device did not return data within the wait window; holds the last I²C error
    ReadBytes(E),
    /// The device did not acknowledge its address
    NotConnected,
    /// Checksum of the temperature word did not match
    CrcTemperature,
    /// Checksum of the relative humidity word did not match
    CrcHumidity,
    /// The heater was switched off too recently to be switched on again
    HeaterCooldown,
    /// The heater is already on
    HeaterAlreadyOn,
    /// The heater is already off
    HeaterAlreadyOff,
    /// Invalid input data provided
    InvalidInputData,
}
impl<E> Error<E> {
    /// Get the flat error code latched for this error, if it has one
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::WriteCmd(_) => Some(ErrorCode::WriteCmd),
            Self::ReadBytes(_) => Some(ErrorCode::ReadBytes),
            Self::NotConnected => Some(ErrorCode::NotConnected),
            Self::CrcTemperature => Some(ErrorCode::CrcTemperature),
            Self::CrcHumidity => Some(ErrorCode::CrcHumidity),
            Self::HeaterCooldown => Some(ErrorCode::HeaterCooldown),
            Self::HeaterAlreadyOn => Some(ErrorCode::HeaterOn),
            Self::HeaterAlreadyOff => Some(ErrorCode::HeaterOff),
            Self::InvalidInputData => None,
        }
    }
}
impl<E: fmt::Debug> fmt::Display for Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WriteCmd(e) => write!(f, "command write failed: {e:?}"),
            Self::ReadBytes(e) => write!(f, "no data within wait window: {e:?}"),
            Self::NotConnected => write!(f, "device not connected"),
            Self::CrcTemperature => write!(f, "temperature checksum mismatch"),
            Self::CrcHumidity => write!(f, "humidity checksum mismatch"),
            Self::HeaterCooldown => write!(f, "heater still cooling down"),
            Self::HeaterAlreadyOn => write!(f, "heater already on"),
            Self::HeaterAlreadyOff => write!(f, "heater already off"),
            Self::InvalidInputData => write!(f, "invalid input data"),
        }
    }
}

/// Flat error code, latched by the driver until read with
/// [`take_error`](Sht2x::take_error).  Values match the SHT3x family drivers.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum ErrorCode {
    /// no error since the last read
    #[default]
    Ok = 0x00,
    /// command write failed
    WriteCmd = 0x81,
    /// no data within wait window
    ReadBytes = 0x82,
    /// heater already off
    HeaterOff = 0x83,
    /// device not connected
    NotConnected = 0x84,
    /// temperature checksum mismatch
    CrcTemperature = 0x85,
    /// humidity checksum mismatch
    CrcHumidity = 0x86,
    /// status checksum mismatch, reserved
    CrcStatus = 0x87,
    /// heater still cooling down
    HeaterCooldown = 0x88,
    /// heater already on
    HeaterOn = 0x89,
}
impl ErrorCode {
    /// Get the numeric code
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}
impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} (0x{:02X})", self, self.as_u8())
    }
}

/// Device variant.  All variants share one command set; the tag only identifies the part.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Variant {
    /// Sensirion SHT20
    Sht20,
    /// Sensirion SHT21
    Sht21,
    /// Sensirion SHT25
    Sht25,
    /// TE Connectivity HTU20
    Htu20,
    /// TE Connectivity HTU21
    Htu21,
    /// Silicon Labs Si7013
    Si7013,
    /// Silicon Labs Si7020
    Si7020,
    /// Silicon Labs Si7021
    Si7021,
    /// any command-compatible part
    #[default]
    Generic,
}
impl Variant {
    /// Get the part name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sht20 => "SHT20",
            Self::Sht21 => "SHT21",
            Self::Sht25 => "SHT25",
            Self::Htu20 => "HTU20",
            Self::Htu21 => "HTU21",
            Self::Si7013 => "Si7013",
            Self::Si7020 => "Si7020",
            Self::Si7021 => "Si7021",
            Self::Generic => "SHT2x",
        }
    }
}
impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Raw (still in u16 format, status bits cleared) temperature and relative humidity
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RawMeasurement {
    /// unprocessed temperature
    pub temperature: u16,
    /// unprocessed relative humidity
    pub humidity: u16,
}
impl RawMeasurement {
    /// Get temperature in Fahrenheit
    pub fn fahrenheit(&self) -> f32 {
        raw_temp_to_fahrenheit(self.temperature)
    }
    /// Get temperature in Centigrade
    pub fn centigrade(&self) -> f32 {
        raw_temp_to_centigrade(self.temperature)
    }
    /// Get relative humidity in percent
    pub fn humidity_percent(&self) -> f32 {
        raw_rel_humid_to_percent(self.humidity)
    }
}

/// Temperature and relative humidity after conversion
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement {
    /// degrees centigrade
    pub centigrade: f32,
    /// degrees fahrenheit
    pub fahrenheit: f32,
    /// relative humidity in percent
    pub humidity_percent: f32,
}
impl From<&RawMeasurement> for Measurement {
    fn from(raw: &RawMeasurement) -> Self {
        Self {
            centigrade: raw.centigrade(),
            fahrenheit: raw.fahrenheit(),
            humidity_percent: raw.humidity_percent(),
        }
    }
}

/// Factory-programmed 64-bit electronic ID, first half in the upper 32 bits
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ElectronicId(pub u64);
impl ElectronicId {
    /// Build the ID from the two halves read from the device
    pub fn from_halves(eid_a: u32, eid_b: u32) -> Self {
        Self((eid_a as u64) << 32 | eid_b as u64)
    }
}
impl fmt::Display for ElectronicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016X}", self.0)
    }
}
