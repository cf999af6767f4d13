#![no_std]
#![deny(unsafe_code)]

//! # BME280 Environmental Sensor Driver
//!
//! A type-safe, `no_std` driver for the Bosch BME280 over I²C, built on the
//! `embedded-hal` 1.0 traits.
//! This driver uses the typestate pattern to ensure the sensor is correctly
//! initialized and its calibration data loaded before measurements are taken.
//!
//! ## Features
//! - **Continuous Conversion**: The sensor is put into normal mode with
//!   16x oversampling on every channel; each read returns the latest sample.
//! - **Vendor Compensation**: Bosch's double-precision formulas.
//! - **Typestate Pattern**: Prevents measuring before initialization.
//! - **Pure Core**: [`CalibData`] compensation can be used without a bus.
//!
//! ## Units
//! - **Temperature**: Degrees Celsius (°C)
//! - **Pressure**: Pascal (Pa) -> 101325.0 = 1013.25 hPa
//! - **Humidity**: Relative humidity in percent, clamped to 0..=100
//!
//! ## Example
//! ```
//! # use embedded_hal_mock::eh1::{delay::NoopDelay, i2c::{Mock, Transaction}};
//! # let expectations = vec![
//! #     Transaction::write_read(0x76, vec![0xD0], vec![0x60]),
//! #     Transaction::write(0x76, vec![0xE0, 0xB6]),
//! #     Transaction::write_read(0x76, vec![0x88], vec![0; 24]),
//! #     Transaction::write_read(0x76, vec![0xA1], vec![0]),
//! #     Transaction::write_read(0x76, vec![0xE1], vec![0; 7]),
//! #     Transaction::write(0x76, vec![0xF2, 0b101]),
//! #     Transaction::write(0x76, vec![0xF5, 0b0100_0000]),
//! #     Transaction::write(0x76, vec![0xF4, 0b1011_0111]),
//! #     Transaction::write_read(0x76, vec![0xF7], vec![0x80, 0, 0, 0x80, 0, 0, 0x80, 0]),
//! # ];
//! # let i2c = Mock::new(&expectations);
//! # let mut delay = NoopDelay::new();
//! use bme280_driver::{Bme280, ADDR_PRIMARY};
//!
//! let bme280 = Bme280::new(i2c, ADDR_PRIMARY);
//! let mut bme280 = bme280.init(&mut delay)?;
//!
//! let data = bme280.read_new_data()?;
//! let _celsius = data.temp.0;
//! let _hpa = data.pres.as_hpa();
//! let _percent = data.hum.0;
//! # bme280.release().done();
//! # Ok::<(), bme280_driver::error::Bme280Error<embedded_hal::i2c::ErrorKind>>(())
//! ```

#[macro_use]
mod fmt;

mod calc;
mod calibration;
mod settings;

use core::marker::PhantomData;
use embedded_hal::{delay::DelayNs, i2c};

pub use calibration::{
    build_s16, build_s8, build_u16, CalibBlock, CalibData, MalformedCalibrationData, BLOCK_A_LEN,
    BLOCK_B_LEN,
};
pub use settings::{IIRFilter, Mode, Oversampling, Settings, Standby};

/// I²C address with SDO connected to GND.
pub const ADDR_PRIMARY: u8 = 0x76;
/// I²C address with SDO connected to VDDIO.
pub const ADDR_SECONDARY: u8 = 0x77;

/// Value of the `id` register of every BME280.
pub const CHIP_ID: u8 = 0x60;

/// Register addresses (datasheet Table 18: Memory map).
mod regs {
    pub const ADDR_CALIB_00: u8 = 0x88;
    pub const ADDR_CALIB_25: u8 = 0xA1;
    pub const ADDR_CALIB_26: u8 = 0xE1;
    pub const ADDR_ID: u8 = 0xD0;
    pub const ADDR_RESET: u8 = 0xE0;
    pub const ADDR_CTRL_HUM: u8 = 0xF2;
    pub const ADDR_STATUS: u8 = 0xF3;
    pub const ADDR_CTRL_MEAS: u8 = 0xF4;
    pub const ADDR_CONFIG: u8 = 0xF5;
    pub const ADDR_PRESS_MSB: u8 = 0xF7;

    pub const RESET_CMD: u8 = 0xB6;
}

/// Memory address and size for the measurement data registers.
mod raw_data_mem {
    pub const SIZE: usize = 8;
}

// --- Typestates ---

/// Sensor has been created but not yet initialized with calibration data.
#[derive(Debug)]
pub struct Uninitialized;
/// Sensor is initialized, configured, and converting continuously.
#[derive(Debug)]
pub struct Ready;

/// Error types for the BME280 driver.
pub mod error {
    use core::fmt;

    use crate::MalformedCalibrationData;

    /// Errors that can occur during communication or initialization.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum Bme280Error<E> {
        /// I2C bus error.
        I2CError(E),
        /// Calibration blocks were too short to decode all coefficients.
        MalformedCalibrationData(MalformedCalibrationData),
        /// The device answered with a chip id other than `0x60`.
        UnexpectedChipId(u8),
    }

    impl<E> From<MalformedCalibrationData> for Bme280Error<E> {
        fn from(e: MalformedCalibrationData) -> Self {
            Bme280Error::MalformedCalibrationData(e)
        }
    }

    impl<E: fmt::Debug> fmt::Display for Bme280Error<E> {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Bme280Error::I2CError(e) => write!(f, "I2C bus error: {:?}", e),
                Bme280Error::MalformedCalibrationData(e) => write!(f, "{}", e),
                Bme280Error::UnexpectedChipId(id) => {
                    write!(f, "unexpected chip id {:#04x}, expected 0x60", id)
                }
            }
        }
    }

    impl<E: fmt::Debug> core::error::Error for Bme280Error<E> {}

    impl core::error::Error for MalformedCalibrationData {}

    /// Result type alias for BME280 operations.
    pub type Result<T, E> = core::result::Result<T, Bme280Error<E>>;
}

/// Raw ADC output read directly from the sensor registers.
///
/// This struct holds the uncompensated data of one conversion.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawData {
    /// 20-bit pressure reading.
    pub press_adc: u32,
    /// 20-bit temperature reading.
    pub temp_adc: u32,
    /// 16-bit humidity reading.
    pub hum_adc: u16,
}

impl RawData {
    /// Reconstructs the ADC values from the burst read of `press_msb..hum_lsb`.
    pub fn from_registers(buffer: &[u8; raw_data_mem::SIZE]) -> Self {
        // 20-bit values are left aligned in 3 registers, the low nibble of xlsb is unused
        RawData {
            press_adc: u32::from_be_bytes([0, buffer[0], buffer[1], buffer[2]]) >> 4,
            temp_adc: u32::from_be_bytes([0, buffer[3], buffer[4], buffer[5]]) >> 4,
            hum_adc: u16::from_be_bytes([buffer[6], buffer[7]]),
        }
    }
}

/// Intermediate temperature value (`t_fine`) produced by temperature compensation.
///
/// Pressure and humidity compensation of the *same* conversion require it.
/// It is passed explicitly; the driver never keeps it between cycles.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FineTemperature(pub i32);

/// Temperature in degrees Celsius.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Temperature(pub f64);

/// Relative humidity in percent, always within `0.0..=100.0`.
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Humidity(pub f64);

/// Atmospheric pressure in Pascal (Pa).
///
/// `Pressure(0.0)` signals a degenerate calibration, never a real reading.
///
/// # Example
/// ```rust
/// use bme280_driver::Pressure;
/// let press = Pressure(101325.0);
/// assert_eq!(press.as_hpa(), 1013.25);
/// ```
#[derive(Debug, Copy, Clone, Default, PartialEq, PartialOrd)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pressure(pub f64);

impl Pressure {
    /// Converts to hectopascal (1 hPa = 100 Pa).
    pub fn as_hpa(&self) -> f64 {
        self.0 / 100.0
    }

    /// Converts to kilopascal (1 kPa = 1000 Pa).
    pub fn as_kpa(&self) -> f64 {
        self.0 / 1000.0
    }
}

/// Compensated measurement result in physical units.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Measurement {
    /// Temperature data.
    pub temp: Temperature,
    /// Atmospheric pressure data.
    pub pres: Pressure,
    /// Humidity data.
    pub hum: Humidity,
}

/// Contents of the `status` register.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// A conversion is running.
    pub measuring: bool,
    /// NVM data is being copied to the image registers.
    pub im_update: bool,
}

/// The main BME280 driver structure.
///
/// Use `Bme280::new(...)` to start. The `STATE` generic uses the Typestate pattern
/// to track initialization status at compile time.
#[derive(Debug)]
pub struct Bme280<I2C, STATE> {
    i2c: I2C,
    address: u8,
    calib_data: CalibData,
    _state: PhantomData<STATE>,
}

impl<I2C, E> Bme280<I2C, Uninitialized>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Creates a new driver instance in the `Uninitialized` state.
    ///
    /// This does not communicate with the sensor yet.
    ///
    /// # Arguments
    /// * `i2c` - The I2C bus object.
    /// * `address` - [`ADDR_PRIMARY`] (`0x76`) or [`ADDR_SECONDARY`] (`0x77`).
    pub fn new(i2c: I2C, address: u8) -> Self {
        Bme280 {
            i2c,
            address,
            calib_data: CalibData::default(),
            _state: PhantomData,
        }
    }

    /// Initializes the sensor: verifies the chip id, performs a soft-reset,
    /// loads the factory calibration data and starts continuous conversion
    /// with [`Settings::DEFAULT`].
    ///
    /// This transitions the driver state from `Uninitialized` to `Ready`.
    ///
    /// # Errors
    /// Returns an error if the I2C communication fails, if the device is not a
    /// BME280, or if the calibration data cannot be decoded.
    pub fn init(mut self, delay: &mut impl DelayNs) -> error::Result<Bme280<I2C, Ready>, E> {
        // Start-up time after power-on
        delay.delay_ms(2);

        let chip_id = self.read_reg_byte(regs::ADDR_ID)?;
        if chip_id != CHIP_ID {
            warn!("unexpected chip id {=u8:#x}", chip_id);
            return Err(error::Bme280Error::UnexpectedChipId(chip_id));
        }
        debug!("found BME280 at {=u8:#x}", self.address);

        self.reset(delay)?;

        let calib_data = self.get_calib_data()?;
        trace!("calibration: {}", calib_data);

        let mut bme280 = Bme280 {
            i2c: self.i2c,
            address: self.address,
            calib_data,
            _state: PhantomData,
        };
        bme280.apply_settings(&Settings::DEFAULT)?;

        Ok(bme280)
    }

    /// Reads the two calibration blocks and decodes them.
    ///
    /// `dig_H1` sits at 0xA1, one reserved register after `calib23`, so block
    /// A is assembled from two reads.
    fn get_calib_data(&mut self) -> error::Result<CalibData, E> {
        let mut block_a = [0u8; BLOCK_A_LEN];
        let mut block_b = [0u8; BLOCK_B_LEN];

        // 0x88..0x9F
        self.read_into(regs::ADDR_CALIB_00, &mut block_a[..BLOCK_A_LEN - 1])?;
        // 0xA1
        self.read_into(regs::ADDR_CALIB_25, &mut block_a[BLOCK_A_LEN - 1..])?;
        // 0xE1..0xE7
        self.read_into(regs::ADDR_CALIB_26, &mut block_b)?;

        Ok(CalibData::decode(&block_a, &block_b)?)
    }
}

impl<I2C, STATE, E> Bme280<I2C, STATE>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Performs a soft-reset of the sensor.
    ///
    /// Resets all registers to their defaults (sleep mode) and reloads the NVM.
    /// A delay of at least 2ms is required after the reset command.
    fn reset(&mut self, delay: &mut impl DelayNs) -> error::Result<(), E> {
        self.write_reg(&[regs::ADDR_RESET, regs::RESET_CMD])?;
        delay.delay_ms(2);

        Ok(())
    }

    /// Reads data from a starting register address into a provided buffer.
    fn read_into(&mut self, reg_address: u8, buffer: &mut [u8]) -> error::Result<(), E> {
        self.i2c
            .write_read(self.address, &[reg_address], buffer)
            .map_err(error::Bme280Error::I2CError)
    }

    /// Reads a single byte from a specific register address.
    fn read_reg_byte(&mut self, reg_address: u8) -> error::Result<u8, E> {
        let mut buffer = [0];
        self.read_into(reg_address, &mut buffer)?;

        Ok(buffer[0])
    }

    /// Writes a byte slice (typically `[Register, Value]`) to the sensor.
    fn write_reg(&mut self, data: &[u8]) -> error::Result<(), E> {
        self.i2c
            .write(self.address, data)
            .map_err(error::Bme280Error::I2CError)
    }
}

impl<I2C, STATE> Bme280<I2C, STATE> {
    /// Destroys the driver and returns the I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C, E> Bme280<I2C, Ready>
where
    I2C: i2c::I2c<Error = E>,
{
    /// Reads the latest conversion and returns compensated data.
    pub fn read_new_data(&mut self) -> error::Result<Measurement, E> {
        let raw_data = self.read_raw_data()?;
        trace!("raw data: {}", raw_data);

        Ok(self.calib_data.compensate(&raw_data))
    }

    /// Burst-reads the ADC registers (0xF7..0xFE) of the latest conversion.
    ///
    /// A single burst read guarantees that all three values belong to the same
    /// conversion (shadowing is blocked until the read ends).
    pub fn read_raw_data(&mut self) -> error::Result<RawData, E> {
        let mut buffer = [0u8; raw_data_mem::SIZE];
        self.read_into(regs::ADDR_PRESS_MSB, &mut buffer)?;

        Ok(RawData::from_registers(&buffer))
    }

    /// Reads the `status` register.
    pub fn read_status(&mut self) -> error::Result<Status, E> {
        let status = self.read_reg_byte(regs::ADDR_STATUS)?;

        Ok(Status {
            measuring: status & 0b1000 != 0,
            im_update: status & 0b0001 != 0,
        })
    }

    /// Reads the Chip ID from the sensor (expected value: 0x60).
    pub fn read_chip_id(&mut self) -> error::Result<u8, E> {
        self.read_reg_byte(regs::ADDR_ID)
    }

    /// Calibration coefficients loaded during `init`.
    pub fn calib_data(&self) -> &CalibData {
        &self.calib_data
    }

    /// Writes the measurement profile.
    ///
    /// `ctrl_hum` only takes effect after a write to `ctrl_meas`, and `config`
    /// writes may be ignored outside sleep mode, so `ctrl_meas` (which sets the
    /// mode) goes last.
    fn apply_settings(&mut self, settings: &Settings) -> error::Result<(), E> {
        debug!("settings: {}", settings);

        self.write_reg(&[regs::ADDR_CTRL_HUM, settings.ctrl_hum()])?;
        self.write_reg(&[regs::ADDR_CONFIG, settings.config()])?;
        self.write_reg(&[regs::ADDR_CTRL_MEAS, settings.ctrl_meas()])?;

        Ok(())
    }
}
