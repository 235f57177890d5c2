use crate::clock::Clock;
use crate::hw_def::*;
use crate::types::*;

use crc::Crc;
use embedded_hal::{delay::DelayNs, i2c::I2c};

cfg_if::cfg_if! {
    if #[cfg(feature = "defmt")] {
        use defmt::{debug, trace, warn};
    } else if #[cfg(feature = "log")] {
        use log::{debug, trace, warn};
    }
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! trace {
    ($($arg:tt)*) => {};
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! debug {
    ($($arg:tt)*) => {};
}
#[cfg(not(any(feature = "defmt", feature = "log")))]
macro_rules! warn {
    ($($arg:tt)*) => {};
}

const CRC: Crc<u8> = Crc::<u8>::new(&CRC_8_SHT2X);

impl<I2C, Delay, Clk, E> Sht2x<I2C, Delay, Clk>
where
    I2C: I2c<Error = E>,
    Delay: DelayNs,
    Clk: Clock,
{
    /// Create a new driver instance.  Nothing is sent to the device until [`begin`](Self::begin)
    /// or another command is called.
    ///
    /// `i2c` may be a borrowed bus (`&mut bus`), in which case the caller keeps ownership.
    pub fn new(i2c: I2C, delay: Delay, clock: Clk, i2c_addr: I2cAddr) -> Self {
        Self {
            i2c,
            delay,
            clock,
            i2c_addr,
            variant: Variant::Generic,
            heat_timeout: DEFAULT_HEAT_TIMEOUT_S,
            last_read: 0,
            last_request: 0,
            heater_start: 0,
            heater_stop: None,
            heater_on: false,
            raw: RawMeasurement::default(),
            status: Status::default(),
            error: ErrorCode::Ok,
        }
    }

    /// Create a driver instance for a specific part at the default address
    pub fn new_variant(i2c: I2C, delay: Delay, clock: Clk, variant: Variant) -> Self {
        Self {
            variant,
            ..Self::new(i2c, delay, clock, I2cAddr::Default)
        }
    }

    /// Destroy the driver and return the bus
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Part this driver was created for
    pub fn variant(&self) -> Variant {
        self.variant
    }

    /// 7-bit bus address of the device
    pub fn address(&self) -> u8 {
        self.i2c_addr.as_u8()
    }

    /// Check the device is reachable, then soft reset it.  Blocks for the reset time.
    pub fn begin(&mut self) -> Result<(), Error<E>> {
        if !self.is_connected() {
            warn!("sht2x::begin(): no device at address {}", self.i2c_addr.as_u8());
            return self.fail(Error::NotConnected);
        }
        self.reset()
    }

    /// Probe the device address with an empty write.  Does not touch the latched error code.
    pub fn is_connected(&mut self) -> bool {
        self.i2c.write(self.i2c_addr.as_u8(), &[]).is_ok()
    }

    fn fail<T>(&mut self, err: Error<E>) -> Result<T, Error<E>> {
        if let Some(code) = err.code() {
            self.error = code;
        }
        Err(err)
    }

    fn write_cmd(&mut self, cmd: Command) -> Result<(), Error<E>> {
        self.write_bytes(&[cmd.as_u8()])
    }

    fn write_cmd_value(&mut self, cmd: Command, value: u8) -> Result<(), Error<E>> {
        self.write_bytes(&[cmd.as_u8(), value])
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Result<(), Error<E>> {
        trace!("sht2x::write_bytes(): {:?}", bytes);
        if let Err(i2c_err) = self.i2c.write(self.i2c_addr.as_u8(), bytes) {
            warn!("sht2x::write_bytes(): write of {:?} failed", bytes);
            return self.fail(Error::WriteCmd(i2c_err));
        }
        Ok(())
    }

    /// The device NACKs reads until a no-hold conversion is done, so keep asking until
    /// `max_wait_ms` has passed.  Every retry is spaced by at least 1 ms, which also bounds the
    /// attempt count when the clock does not move.
    fn read_bytes(&mut self, buf: &mut [u8], max_wait_ms: u32) -> Result<(), Error<E>> {
        let start = self.clock.now_ms();
        let mut attempts: u32 = 0;
        loop {
            match self.i2c.read(self.i2c_addr.as_u8(), buf) {
                Ok(()) => {
                    trace!("sht2x::read_bytes(): {:?} after {} retries", buf, attempts);
                    return Ok(());
                }
                Err(i2c_err) => {
                    attempts += 1;
                    let elapsed = self.clock.now_ms().wrapping_sub(start);
                    if elapsed >= max_wait_ms || attempts > max_wait_ms {
                        warn!("sht2x::read_bytes(): no data after {} ms, {} attempts", elapsed, attempts);
                        return self.fail(Error::ReadBytes(i2c_err));
                    }
                    self.delay.delay_ms(1);
                }
            }
        }
    }

    fn read_register(&mut self, cmd: Command) -> Result<u8, Error<E>> {
        self.write_cmd(cmd)?;
        let mut read_buf = [0u8; 1];
        self.read_bytes(&mut read_buf, REGISTER_MAX_WAIT_MS)?;
        Ok(read_buf[0])
    }

    /// Trigger one conversion and return the checked word, status bits included
    fn measure(&mut self, cmd: Command, max_wait_ms: u32, crc_err: Error<E>) -> Result<u16, Error<E>> {
        self.write_cmd(cmd)?;
        self.last_request = self.clock.now_ms();

        let mut read_buf = [0u8; 3];
        self.read_bytes(&mut read_buf, max_wait_ms)?;
        let crc_expect = CRC.checksum(&read_buf[..2]);
        if read_buf[2] != crc_expect {
            warn!("sht2x::measure(): crc mismatch: read_buf={:?}, crc_expect={}", read_buf, crc_expect);
            return self.fail(crc_err);
        }
        Ok(u16::from_be_bytes([read_buf[0], read_buf[1]]))
    }

    /// Measure temperature, then relative humidity.
    ///
    /// Stops at the first failing step; the humidity conversion is not triggered after a
    /// temperature failure.  The stored raw values, status and [`last_read`](Self::last_read)
    /// only change when both measurements pass their checksum.
    pub fn read(&mut self) -> Result<(), Error<E>> {
        let temperature = self.measure(Command::TriggerTempNoHold, TEMPERATURE_MAX_WAIT_MS, Error::CrcTemperature)?;
        let humidity = self.measure(Command::TriggerRelHumidNoHold, HUMIDITY_MAX_WAIT_MS, Error::CrcHumidity)?;

        self.raw = RawMeasurement {
            temperature: temperature & !STATUS_MASK,
            humidity: humidity & !STATUS_MASK,
        };
        self.status = Status::from(humidity);
        self.last_read = self.clock.now_ms();
        trace!("sht2x::read(): {:?}", self.raw);
        Ok(())
    }

    /// Temperature in Centigrade from the last successful [`read`](Self::read)
    pub fn temperature(&self) -> f32 {
        self.raw.centigrade()
    }

    /// Temperature in Fahrenheit from the last successful [`read`](Self::read)
    pub fn fahrenheit(&self) -> f32 {
        self.raw.fahrenheit()
    }

    /// Relative humidity in percent from the last successful [`read`](Self::read)
    pub fn humidity(&self) -> f32 {
        self.raw.humidity_percent()
    }

    /// Raw temperature code, status bits cleared
    pub fn raw_temperature(&self) -> u16 {
        self.raw.temperature
    }

    /// Raw relative humidity code, status bits cleared
    pub fn raw_humidity(&self) -> u16 {
        self.raw.humidity
    }

    /// Both raw codes from the last successful [`read`](Self::read)
    pub fn raw_measurement(&self) -> RawMeasurement {
        self.raw
    }

    /// Both values from the last successful [`read`](Self::read), converted
    pub fn measurement(&self) -> Measurement {
        Measurement::from(&self.raw)
    }

    /// Status field of the last successful [`read`](Self::read)
    pub fn status(&self) -> Status {
        self.status
    }

    /// Clock time of the last successful [`read`](Self::read), in milliseconds
    pub fn last_read(&self) -> u32 {
        self.last_read
    }

    /// Clock time the last conversion was triggered, in milliseconds
    pub fn last_request(&self) -> u32 {
        self.last_request
    }

    /// Soft reset.  Blocks for the 15 ms the device needs before it accepts the next command.
    pub fn reset(&mut self) -> Result<(), Error<E>> {
        self.write_cmd(Command::SoftReset)?;
        self.delay.delay_ms(SOFT_RESET_MS);
        Ok(())
    }

    /// Return the latched error code and reset it to [`ErrorCode::Ok`]
    pub fn take_error(&mut self) -> ErrorCode {
        core::mem::take(&mut self.error)
    }

    /// Set how long the heater may stay on, in seconds
    pub fn set_heat_timeout(&mut self, seconds: u8) {
        self.heat_timeout = seconds;
    }

    /// How long the heater may stay on, in seconds
    pub fn heat_timeout(&self) -> u8 {
        self.heat_timeout
    }

    /// Switch the on-chip heater on.
    ///
    /// Fails without bus traffic if the heater is already on, or if it was switched off less
    /// than three minutes ago.  If the heater has passed its heat timeout and switching it off
    /// fails, that bus error is returned instead.
    pub fn heat_on(&mut self) -> Result<(), Error<E>> {
        if self.heater_state()? {
            warn!("sht2x::heat_on(): heater already on");
            return self.fail(Error::HeaterAlreadyOn);
        }
        if let Some(heater_stop) = self.heater_stop {
            let idle = self.clock.now_ms().wrapping_sub(heater_stop);
            if idle < HEATER_COOLDOWN_MS {
                warn!("sht2x::heat_on(): heater off for {} ms, needs {} ms", idle, HEATER_COOLDOWN_MS);
                return self.fail(Error::HeaterCooldown);
            }
        }

        let user_reg = self.read_register(Command::ReadUserRegister)?;
        self.write_cmd_value(Command::WriteUserRegister, user_reg | USER_REG_HEATER_ENABLE)?;
        self.heater_start = self.clock.now_ms();
        self.heater_on = true;
        debug!("sht2x::heat_on(): heater on at {} ms", self.heater_start);
        Ok(())
    }

    /// Switch the on-chip heater off, which starts the cooldown period
    pub fn heat_off(&mut self) -> Result<(), Error<E>> {
        if !self.heater_on {
            warn!("sht2x::heat_off(): heater already off");
            return self.fail(Error::HeaterAlreadyOff);
        }

        let user_reg = self.read_register(Command::ReadUserRegister)?;
        self.write_cmd_value(Command::WriteUserRegister, user_reg & !USER_REG_HEATER_ENABLE)?;
        let heater_stop = self.clock.now_ms();
        self.heater_stop = Some(heater_stop);
        self.heater_on = false;
        debug!("sht2x::heat_off(): heater off at {} ms", heater_stop);
        Ok(())
    }

    /// Whether the heater is on.
    ///
    /// Once the heater has been on for the [heat timeout](Self::set_heat_timeout) this switches
    /// it off and returns `false`.  If switching off fails the error is latched and `true` is
    /// returned.
    pub fn is_heater_on(&mut self) -> bool {
        // failure is latched by heat_off() and leaves the flag set
        self.heater_state().unwrap_or(self.heater_on)
    }

    fn heater_state(&mut self) -> Result<bool, Error<E>> {
        if !self.heater_on {
            return Ok(false);
        }
        let elapsed = self.clock.now_ms().wrapping_sub(self.heater_start);
        if elapsed < u32::from(self.heat_timeout) * 1000 {
            return Ok(true);
        }
        debug!("sht2x::heater_state(): heat timeout after {} ms", elapsed);
        self.heat_off()?;
        Ok(false)
    }

    /// Set the heater current level, 0..=15 (Si70xx)
    pub fn set_heater_level(&mut self, level: u8) -> Result<(), Error<E>> {
        if level > HEATER_LEVEL_MAX {
            return Err(Error::InvalidInputData);
        }
        let heater_reg = self.read_register(Command::ReadHeaterRegister)?;
        self.write_cmd_value(Command::WriteHeaterRegister, (heater_reg & !HEATER_REG_LEVEL_MASK) | level)
    }

    /// Read the heater current level, 0..=15 (Si70xx)
    pub fn heater_level(&mut self) -> Result<u8, Error<E>> {
        Ok(self.read_register(Command::ReadHeaterRegister)? & HEATER_REG_LEVEL_MASK)
    }

    /// Set the measurement resolution, leaving the other user register bits alone
    pub fn set_resolution(&mut self, resolution: Resolution) -> Result<(), Error<E>> {
        let user_reg = self.read_register(Command::ReadUserRegister)?;
        self.write_cmd_value(
            Command::WriteUserRegister,
            (user_reg & !USER_REG_RESOLUTION_MASK) | resolution.user_reg_bits(),
        )
    }

    /// Read the measurement resolution
    pub fn resolution(&mut self) -> Result<Resolution, Error<E>> {
        Ok(Resolution::from(self.read_register(Command::ReadUserRegister)?))
    }

    /// `false` once the supply has dropped below 2.25 V
    pub fn battery_ok(&mut self) -> Result<bool, Error<E>> {
        Ok(self.read_register(Command::ReadUserRegister)? & USER_REG_END_OF_BATTERY == 0)
    }

    /// Read the first half of the electronic ID (Si70xx, HTU2x)
    pub fn electronic_id_a(&mut self) -> Result<u32, Error<E>> {
        self.write_cmd_value(Command::ReadEidA, EID_A_ARG)?;
        // SNA_3, crc, SNA_2, crc, SNA_1, crc, SNA_0, crc
        let mut read_buf = [0u8; 8];
        self.read_bytes(&mut read_buf, REGISTER_MAX_WAIT_MS)?;
        Ok(u32::from_be_bytes([read_buf[0], read_buf[2], read_buf[4], read_buf[6]]))
    }

    /// Read the second half of the electronic ID (Si70xx, HTU2x)
    pub fn electronic_id_b(&mut self) -> Result<u32, Error<E>> {
        self.write_cmd_value(Command::ReadEidB, EID_B_ARG)?;
        // SNB_3, SNB_2, crc, SNB_1, SNB_0, crc
        let mut read_buf = [0u8; 6];
        self.read_bytes(&mut read_buf, REGISTER_MAX_WAIT_MS)?;
        Ok(u32::from_be_bytes([read_buf[0], read_buf[1], read_buf[3], read_buf[4]]))
    }

    /// Read the full 64-bit electronic ID
    pub fn electronic_id(&mut self) -> Result<ElectronicId, Error<E>> {
        let eid_a = self.electronic_id_a()?;
        let eid_b = self.electronic_id_b()?;
        Ok(ElectronicId::from_halves(eid_a, eid_b))
    }

    /// Read the firmware revision, see [`FIRMWARE_VERSION_1_0`] and [`FIRMWARE_VERSION_2_0`]
    pub fn firmware_version(&mut self) -> Result<u8, Error<E>> {
        self.write_cmd_value(Command::ReadFirmwareVersion, FIRMWARE_VERSION_ARG)?;
        let mut read_buf = [0u8; 1];
        self.read_bytes(&mut read_buf, REGISTER_MAX_WAIT_MS)?;
        Ok(read_buf[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use embedded_hal::i2c::{ErrorKind, NoAcknowledgeSource};
    use embedded_hal_mock::eh1::delay::NoopDelay;
    use embedded_hal_mock::eh1::i2c::{Mock as I2cMock, Transaction};
    use std::cell::Cell;
    use std::rc::Rc;

    const ADDR: u8 = 0x40;

    type TestClock = Box<dyn FnMut() -> u32>;

    /// Device whose clock reads whatever the returned cell holds
    fn device(expectations: &[Transaction]) -> (Sht2x<I2cMock, NoopDelay, TestClock>, Rc<Cell<u32>>) {
        let now = Rc::new(Cell::new(0));
        let clock_now = now.clone();
        let clock: TestClock = Box::new(move || clock_now.get());
        let sht = Sht2x::new(I2cMock::new(expectations), NoopDelay::new(), clock, I2cAddr::Default);
        (sht, now)
    }

    /// Device whose clock moves forward `step_ms` every time it is read
    fn device_with_ticking_clock(
        expectations: &[Transaction],
        step_ms: u32,
    ) -> Sht2x<I2cMock, NoopDelay, TestClock> {
        let mut now = 0u32;
        let clock: TestClock = Box::new(move || {
            let t = now;
            now += step_ms;
            t
        });
        Sht2x::new(I2cMock::new(expectations), NoopDelay::new(), clock, I2cAddr::Default)
    }

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 0.001
    }

    // temperature 0x6351 -> 21.32 °C, humidity 0x7C82 -> 54.79 %
    fn good_read() -> [Transaction; 4] {
        [
            Transaction::write(ADDR, vec![0xF3]),
            Transaction::read(ADDR, vec![0x63, 0x51, 0x37]),
            Transaction::write(ADDR, vec![0xF5]),
            Transaction::read(ADDR, vec![0x7C, 0x82, 0x97]),
        ]
    }

    fn not_ready(len: usize) -> Transaction {
        Transaction::read(ADDR, vec![0; len]).with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))
    }

    fn heater_on_traffic() -> [Transaction; 3] {
        [
            Transaction::write(ADDR, vec![0xE7]),
            Transaction::read(ADDR, vec![0x3A]),
            Transaction::write(ADDR, vec![0xE6, 0x3E]),
        ]
    }

    fn heater_off_traffic() -> [Transaction; 3] {
        [
            Transaction::write(ADDR, vec![0xE7]),
            Transaction::read(ADDR, vec![0x3E]),
            Transaction::write(ADDR, vec![0xE6, 0x3A]),
        ]
    }

    #[test]
    fn read_converts_and_latches() {
        let (mut sht, clock) = device(&good_read());
        clock.set(1234);
        sht.read().unwrap();

        assert_eq!(sht.raw_temperature(), 0x6350);
        assert_eq!(sht.raw_humidity(), 0x7C80);
        assert!(close(sht.temperature(), 21.3187));
        assert!(close(sht.humidity(), 54.7910));
        assert!(close(sht.fahrenheit(), 21.3187 * 1.8 + 32.0));
        assert_eq!(sht.measurement(), Measurement::from(&sht.raw_measurement()));
        assert_eq!(sht.status(), Status::Humidity);
        assert_eq!(sht.last_read(), 1234);
        assert_eq!(sht.last_request(), 1234);
        assert_eq!(sht.take_error(), ErrorCode::Ok);
        sht.release().done();
    }

    #[test]
    fn getters_before_first_read() {
        let (sht, _clock) = device(&[]);
        assert_eq!(sht.raw_temperature(), 0);
        assert!(close(sht.temperature(), -46.85));
        assert!(close(sht.humidity(), -6.0));
        assert_eq!(sht.last_read(), 0);
        sht.release().done();
    }

    #[test]
    fn read_polls_until_conversion_done() {
        let mut expectations = vec![Transaction::write(ADDR, vec![0xF3])];
        expectations.extend((0..3).map(|_| not_ready(3)));
        expectations.push(Transaction::read(ADDR, vec![0x63, 0x51, 0x37]));
        expectations.push(Transaction::write(ADDR, vec![0xF5]));
        expectations.push(not_ready(3));
        expectations.push(Transaction::read(ADDR, vec![0x7C, 0x82, 0x97]));

        let (mut sht, _clock) = device(&expectations);
        sht.read().unwrap();
        assert_eq!(sht.raw_temperature(), 0x6350);
        sht.release().done();
    }

    #[test]
    fn temperature_crc_failure_keeps_previous_values() {
        let mut expectations = good_read().to_vec();
        expectations.push(Transaction::write(ADDR, vec![0xF3]));
        expectations.push(Transaction::read(ADDR, vec![0x66, 0x39, 0x43]));

        let (mut sht, clock) = device(&expectations);
        clock.set(10);
        sht.read().unwrap();
        clock.set(20);
        assert!(matches!(sht.read(), Err(Error::CrcTemperature)));

        assert_eq!(sht.raw_temperature(), 0x6350);
        assert_eq!(sht.raw_humidity(), 0x7C80);
        assert_eq!(sht.last_read(), 10);
        assert_eq!(sht.take_error(), ErrorCode::CrcTemperature);
        assert_eq!(sht.take_error(), ErrorCode::Ok);
        sht.release().done();
    }

    #[test]
    fn humidity_crc_failure_commits_nothing() {
        let (mut sht, _clock) = device(&[
            Transaction::write(ADDR, vec![0xF3]),
            Transaction::read(ADDR, vec![0x66, 0x39, 0x42]),
            Transaction::write(ADDR, vec![0xF5]),
            Transaction::read(ADDR, vec![0x5E, 0xB6, 0x00]),
        ]);
        assert!(matches!(sht.read(), Err(Error::CrcHumidity)));
        assert_eq!(sht.raw_temperature(), 0);
        assert_eq!(sht.raw_humidity(), 0);
        assert_eq!(sht.status(), Status::OpenCircuit);
        assert_eq!(sht.take_error(), ErrorCode::CrcHumidity);
        sht.release().done();
    }

    #[test]
    fn read_times_out() {
        let mut expectations = vec![Transaction::write(ADDR, vec![0xF3])];
        expectations.extend((0..=TEMPERATURE_MAX_WAIT_MS).map(|_| not_ready(3)));

        let (mut sht, _clock) = device(&expectations);
        assert!(matches!(sht.read(), Err(Error::ReadBytes(_))));
        assert_eq!(sht.take_error(), ErrorCode::ReadBytes);
        sht.release().done();
    }

    #[test]
    fn humidity_uses_shorter_wait_window() {
        let mut expectations = good_read().to_vec();
        expectations.extend(good_read()[..3].iter().cloned());
        expectations.extend((0..=HUMIDITY_MAX_WAIT_MS).map(|_| not_ready(3)));

        let (mut sht, clock) = device(&expectations);
        clock.set(10);
        sht.read().unwrap();
        clock.set(20);
        assert!(matches!(sht.read(), Err(Error::ReadBytes(_))));

        assert_eq!(sht.raw_temperature(), 0x6350);
        assert_eq!(sht.raw_humidity(), 0x7C80);
        assert_eq!(sht.last_read(), 10);
        assert_eq!(sht.take_error(), ErrorCode::ReadBytes);
        sht.release().done();
    }

    #[test]
    fn read_wait_ends_on_elapsed_time() {
        // 20 ms per clock reading: the humidity wait starts at 60 ms and gives up at 100 ms,
        // after two attempts
        let mut expectations = good_read()[..3].to_vec();
        expectations.extend((0..2).map(|_| not_ready(3)));

        let mut sht = device_with_ticking_clock(&expectations, 20);
        assert!(matches!(sht.read(), Err(Error::ReadBytes(_))));
        assert_eq!(sht.raw_temperature(), 0);
        assert_eq!(sht.raw_humidity(), 0);
        assert_eq!(sht.take_error(), ErrorCode::ReadBytes);
        sht.release().done();
    }

    #[test]
    fn write_failure_aborts_read() {
        let (mut sht, _clock) =
            device(&[Transaction::write(ADDR, vec![0xF3]).with_error(ErrorKind::Other)]);
        assert!(matches!(sht.read(), Err(Error::WriteCmd(ErrorKind::Other))));
        assert_eq!(sht.take_error(), ErrorCode::WriteCmd);
        sht.release().done();
    }

    #[test]
    fn is_connected_leaves_error_alone() {
        let (mut sht, _clock) = device(&[
            Transaction::write(ADDR, vec![]),
            Transaction::write(ADDR, vec![])
                .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address)),
        ]);
        assert!(sht.is_connected());
        assert!(!sht.is_connected());
        assert_eq!(sht.take_error(), ErrorCode::Ok);
        sht.release().done();
    }

    #[test]
    fn begin_probes_and_resets() {
        let (mut sht, _clock) = device(&[
            Transaction::write(ADDR, vec![]),
            Transaction::write(ADDR, vec![0xFE]),
        ]);
        sht.begin().unwrap();
        sht.release().done();

        let (mut sht, _clock) = device(&[Transaction::write(ADDR, vec![])
            .with_error(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address))]);
        assert!(matches!(sht.begin(), Err(Error::NotConnected)));
        assert_eq!(sht.take_error(), ErrorCode::NotConnected);
        sht.release().done();
    }

    #[test]
    fn heat_on_twice() {
        let (mut sht, _clock) = device(&heater_on_traffic());
        sht.heat_on().unwrap();
        assert!(matches!(sht.heat_on(), Err(Error::HeaterAlreadyOn)));
        assert!(sht.is_heater_on());
        assert_eq!(sht.take_error(), ErrorCode::HeaterOn);
        sht.release().done();
    }

    #[test]
    fn heat_off_when_off() {
        let (mut sht, _clock) = device(&[]);
        assert!(matches!(sht.heat_off(), Err(Error::HeaterAlreadyOff)));
        assert_eq!(sht.take_error(), ErrorCode::HeaterOff);
        assert!(!sht.is_heater_on());
        sht.release().done();
    }

    #[test]
    fn heat_on_respects_cooldown() {
        let mut expectations = heater_on_traffic().to_vec();
        expectations.extend(heater_off_traffic());
        expectations.extend(heater_on_traffic());

        let (mut sht, clock) = device(&expectations);
        clock.set(500);
        sht.heat_on().unwrap();
        clock.set(1_000);
        sht.heat_off().unwrap();

        clock.set(1_000 + HEATER_COOLDOWN_MS - 1);
        assert!(matches!(sht.heat_on(), Err(Error::HeaterCooldown)));
        assert_eq!(sht.take_error(), ErrorCode::HeaterCooldown);
        assert!(!sht.is_heater_on());

        clock.set(1_000 + HEATER_COOLDOWN_MS);
        sht.heat_on().unwrap();
        assert!(sht.is_heater_on());
        sht.release().done();
    }

    #[test]
    fn heater_switches_off_after_timeout() {
        let mut expectations = heater_on_traffic().to_vec();
        expectations.extend(heater_off_traffic());

        let (mut sht, clock) = device(&expectations);
        sht.set_heat_timeout(5);
        assert_eq!(sht.heat_timeout(), 5);
        sht.heat_on().unwrap();

        clock.set(4_999);
        assert!(sht.is_heater_on());
        clock.set(5_000);
        assert!(!sht.is_heater_on());

        // the timeout counts as a switch-off
        assert!(matches!(sht.heat_on(), Err(Error::HeaterCooldown)));
        sht.release().done();
    }

    #[test]
    fn failed_timeout_switch_off_keeps_heater_on() {
        let mut expectations = heater_on_traffic().to_vec();
        expectations.push(Transaction::write(ADDR, vec![0xE7]).with_error(ErrorKind::Other));

        let (mut sht, clock) = device(&expectations);
        sht.heat_on().unwrap();
        clock.set(u32::from(DEFAULT_HEAT_TIMEOUT_S) * 1000);
        assert!(sht.is_heater_on());
        assert_eq!(sht.take_error(), ErrorCode::WriteCmd);
        sht.release().done();
    }

    #[test]
    fn heat_on_reports_failed_timeout_switch_off() {
        let mut expectations = heater_on_traffic().to_vec();
        expectations.push(Transaction::write(ADDR, vec![0xE7]).with_error(ErrorKind::Other));

        let (mut sht, clock) = device(&expectations);
        sht.heat_on().unwrap();
        clock.set(u32::from(DEFAULT_HEAT_TIMEOUT_S) * 1000);
        assert!(matches!(sht.heat_on(), Err(Error::WriteCmd(ErrorKind::Other))));
        assert_eq!(sht.take_error(), ErrorCode::WriteCmd);
        sht.release().done();
    }

    #[test]
    fn heater_level() {
        let (mut sht, _clock) = device(&[
            Transaction::write(ADDR, vec![0x11]),
            Transaction::read(ADDR, vec![0xA3]),
            Transaction::write(ADDR, vec![0x51, 0xA9]),
            Transaction::write(ADDR, vec![0x11]),
            Transaction::read(ADDR, vec![0xA9]),
        ]);
        assert!(matches!(sht.set_heater_level(16), Err(Error::InvalidInputData)));
        assert_eq!(sht.take_error(), ErrorCode::Ok);
        sht.set_heater_level(9).unwrap();
        assert_eq!(sht.heater_level().unwrap(), 9);
        sht.release().done();
    }

    #[test]
    fn resolution_and_battery() {
        let (mut sht, _clock) = device(&[
            Transaction::write(ADDR, vec![0xE7]),
            Transaction::read(ADDR, vec![0x3A]),
            Transaction::write(ADDR, vec![0xE6, 0xBB]),
            Transaction::write(ADDR, vec![0xE7]),
            Transaction::read(ADDR, vec![0xBB]),
            Transaction::write(ADDR, vec![0xE7]),
            Transaction::read(ADDR, vec![0x7A]),
        ]);
        sht.set_resolution(Resolution::Rh11T11).unwrap();
        assert_eq!(sht.resolution().unwrap(), Resolution::Rh11T11);
        assert!(!sht.battery_ok().unwrap());
        sht.release().done();
    }

    #[test]
    fn electronic_id_and_firmware() {
        let (mut sht, _clock) = device(&[
            Transaction::write(ADDR, vec![0xFA, 0x0F]),
            Transaction::read(ADDR, vec![0x12, 0x00, 0x34, 0x00, 0x56, 0x00, 0x78, 0x00]),
            Transaction::write(ADDR, vec![0xFC, 0xC9]),
            Transaction::read(ADDR, vec![0x15, 0xFF, 0x00, 0xB5, 0xFF, 0x00]),
            Transaction::write(ADDR, vec![0x84, 0xB8]),
            Transaction::read(ADDR, vec![FIRMWARE_VERSION_2_0]),
        ]);
        let eid = sht.electronic_id().unwrap();
        assert_eq!(eid, ElectronicId(0x1234_5678_15FF_B5FF));
        assert_eq!(std::format!("{eid}"), "1234567815FFB5FF");
        assert_eq!(sht.firmware_version().unwrap(), FIRMWARE_VERSION_2_0);
        sht.release().done();
    }

    #[test]
    fn variant_construction() {
        let sht = Sht2x::new_variant(I2cMock::new(&[]), NoopDelay::new(), Box::new(|| 0u32) as TestClock, Variant::Si7021);
        assert_eq!(sht.variant().name(), "Si7021");
        assert_eq!(sht.address(), 0x40);
        assert_eq!(sht.heat_timeout(), DEFAULT_HEAT_TIMEOUT_S);
        sht.release().done();

        let sht = Sht2x::new(I2cMock::new(&[]), NoopDelay::new(), Box::new(|| 0u32) as TestClock, I2cAddr::Alternate);
        assert_eq!(sht.variant(), Variant::Generic);
        assert_eq!(sht.address(), 0x41);
        sht.release().done();
    }
}
