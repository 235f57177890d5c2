//! Hardware definitions from the SHT2x, HTU2x and Si70xx datasheets.

use core::fmt;

#[cfg(feature = "defmt")]
use defmt::Format;

/// I²C address of the device
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum I2cAddr {
    /// 0x40, the only address of the SHT2x and HTU2x parts
    #[default]
    Default,
    /// 0x41, selectable on the Si7013 through its AD0 pin
    Alternate,
    /// any other address, e.g. behind an address translator
    Custom(u8),
}
impl I2cAddr {
    /// Get the 7-bit bus address
    pub fn as_u8(&self) -> u8 {
        match self {
            Self::Default => 0x40,
            Self::Alternate => 0x41,
            Self::Custom(addr) => *addr,
        }
    }
}

/// Command bytes.  Commands that take an argument byte are listed with the first byte only.
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum Command {
    /// trigger temperature measurement, no hold master
    TriggerTempNoHold = 0xF3,
    /// trigger relative humidity measurement, no hold master
    TriggerRelHumidNoHold = 0xF5,
    /// write user register, followed by the register value
    WriteUserRegister = 0xE6,
    /// read user register
    ReadUserRegister = 0xE7,
    /// soft reset
    SoftReset = 0xFE,
    /// write heater control register (Si70xx), followed by the register value
    WriteHeaterRegister = 0x51,
    /// read heater control register (Si70xx)
    ReadHeaterRegister = 0x11,
    /// read electronic ID first half, followed by [`EID_A_ARG`]
    ReadEidA = 0xFA,
    /// read electronic ID second half, followed by [`EID_B_ARG`]
    ReadEidB = 0xFC,
    /// read firmware revision, followed by [`FIRMWARE_VERSION_ARG`]
    ReadFirmwareVersion = 0x84,
}
impl Command {
    /// Get the command byte
    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// second byte of the [`Command::ReadEidA`] sequence
pub const EID_A_ARG: u8 = 0x0F;
/// second byte of the [`Command::ReadEidB`] sequence
pub const EID_B_ARG: u8 = 0xC9;
/// second byte of the [`Command::ReadFirmwareVersion`] sequence
pub const FIRMWARE_VERSION_ARG: u8 = 0xB8;

/// firmware revision 1.0 as reported by the Si70xx
pub const FIRMWARE_VERSION_1_0: u8 = 0xFF;
/// firmware revision 2.0 as reported by the Si70xx
pub const FIRMWARE_VERSION_2_0: u8 = 0x20;

/// user register: end of battery, set when VDD drops below 2.25 V
pub const USER_REG_END_OF_BATTERY: u8 = 0x40;
/// user register: on-chip heater enable
pub const USER_REG_HEATER_ENABLE: u8 = 0x04;
/// user register: measurement resolution, split over bits 7 and 0
pub const USER_REG_RESOLUTION_MASK: u8 = 0x81;

/// heater register: heater current level
pub const HEATER_REG_LEVEL_MASK: u8 = 0x0F;
/// highest accepted heater level
pub const HEATER_LEVEL_MAX: u8 = 15;

/// low bits of every measurement word that carry the [`Status`] field rather than data
pub const STATUS_MASK: u16 = 0x0003;

/// worst-case temperature conversion time, 14 bit
pub const TEMPERATURE_MAX_WAIT_MS: u32 = 90;
/// worst-case relative humidity conversion time, 12 bit
pub const HUMIDITY_MAX_WAIT_MS: u32 = 30;
/// wait window for register and identification reads
pub const REGISTER_MAX_WAIT_MS: u32 = 10;
/// time the device needs after a soft reset before it accepts commands
pub const SOFT_RESET_MS: u32 = 15;

/// minimum time the heater has to stay off after being switched off
pub const HEATER_COOLDOWN_MS: u32 = 180_000;
/// heater timeout applied until the caller sets another one
pub const DEFAULT_HEAT_TIMEOUT_S: u8 = 30;

/// CRC-8 used by the sensor: x^8 + x^5 + x^4 + 1, init 0x00, not reflected
pub const CRC_8_SHT2X: crc::Algorithm<u8> = crc::Algorithm {
    width: 8,
    poly: 0x31,
    init: 0x00,
    refin: false,
    refout: false,
    xorout: 0x00,
    check: 0xA2,
    residue: 0x00,
};

/// Status field carried in the two low bits of a measurement word
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[repr(u8)]
pub enum Status {
    /// open circuit
    #[default]
    OpenCircuit = 0b00,
    /// temperature reading
    Temperature = 0b01,
    /// humidity reading
    Humidity = 0b10,
    /// closed circuit
    ClosedCircuit = 0b11,
}
impl From<u16> for Status {
    fn from(word: u16) -> Self {
        match word & STATUS_MASK {
            0b00 => Self::OpenCircuit,
            0b01 => Self::Temperature,
            0b10 => Self::Humidity,
            _ => Self::ClosedCircuit,
        }
    }
}
impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OpenCircuit => write!(f, "open circuit"),
            Self::Temperature => write!(f, "temperature"),
            Self::Humidity => write!(f, "humidity"),
            Self::ClosedCircuit => write!(f, "closed circuit"),
        }
    }
}

/// Measurement resolution, user register bits 7 and 0
#[cfg_attr(feature = "defmt", derive(Format))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Resolution {
    /// 12 bit relative humidity, 14 bit temperature
    #[default]
    Rh12T14,
    /// 8 bit relative humidity, 12 bit temperature
    Rh8T12,
    /// 10 bit relative humidity, 13 bit temperature
    Rh10T13,
    /// 11 bit relative humidity, 11 bit temperature
    Rh11T11,
}
impl Resolution {
    /// Get the user register bits for this resolution
    pub fn user_reg_bits(self) -> u8 {
        match self {
            Self::Rh12T14 => 0x00,
            Self::Rh8T12 => 0x01,
            Self::Rh10T13 => 0x80,
            Self::Rh11T11 => 0x81,
        }
    }
}
impl From<u8> for Resolution {
    fn from(user_reg: u8) -> Self {
        match user_reg & USER_REG_RESOLUTION_MASK {
            0x00 => Self::Rh12T14,
            0x01 => Self::Rh8T12,
            0x80 => Self::Rh10T13,
            _ => Self::Rh11T11,
        }
    }
}

pub(crate) fn raw_temp_to_centigrade(raw: u16) -> f32 {
    -46.85 + 175.72 * (raw as f32) / 65536.0
}

pub(crate) fn raw_temp_to_fahrenheit(raw: u16) -> f32 {
    raw_temp_to_centigrade(raw) * 1.8 + 32.0
}

pub(crate) fn raw_rel_humid_to_percent(raw: u16) -> f32 {
    -6.0 + 125.0 * (raw as f32) / 65536.0
}
